pub mod cpp;
pub mod errors;

use std::path::{Path, PathBuf};

pub use errors::{ExpanderError, Result};

/// Expands the source file at `filepath` into a single self-contained source,
/// inlining every header found under `library_dirs`.
pub fn expand_file(filepath: impl AsRef<Path>, library_dirs: &[PathBuf]) -> Result<String> {
    let filepath = filepath.as_ref();
    match filepath.extension().and_then(|ext| ext.to_str()) {
        Some("cpp" | "cc" | "cxx" | "c" | "hpp" | "h") => (),
        _ => return Err(ExpanderError::UnsupportedLang(filepath.to_owned())),
    }

    let source_code = fsutil::read_to_string(filepath)?;
    let source_dir = match filepath.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    cpp::Expander::new()
        .library_dirs(library_dirs)
        .expand(source_dir, source_code)
}
