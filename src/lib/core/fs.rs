use std::ffi::OsStr;
use std::path::Path;

/// Detect whether a path uses a gzip-compatible extension.
pub fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "gz" || ext == "gzip" || ext == "bgz" || ext == "bgzf"
    )
}
