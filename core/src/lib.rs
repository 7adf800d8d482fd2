pub mod action;
pub mod assets;
pub mod config;
pub mod style;
pub mod task;
pub mod testing;

pub use crate::config::Config;
pub use crate::task::TaskMeta;
