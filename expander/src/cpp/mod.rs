mod assets;
mod expander;

pub use expander::*;
