use std::path::{Path, PathBuf};

/// Resolve `path` against `base` unless it is already absolute.
///
/// The result is canonicalized when it exists, so Windows callers get a
/// plain path instead of a `\\?\` UNC path.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
  let joined = if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  };
  dunce::canonicalize(&joined).unwrap_or(joined)
}

/// Render a path for use inside a command line.
pub fn display(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}
