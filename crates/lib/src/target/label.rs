//! Target labels.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::consts::{BUILD_COMMAND_LABEL_PREFIX, COMMAND_JOINER};

/// Qualified name of a target declared in `package`.
pub fn qualified_name(package: &str, name: &str) -> String {
  format!("//{package}:{name}")
}

/// Make a dependency label absolute.
///
/// `:name` refers to a target in the same package. Absolute `//pkg:name`
/// labels and anything else are returned unchanged.
pub fn normalize_label(package: &str, label: &str) -> String {
  match label.strip_prefix(':') {
    Some(name) => qualified_name(package, name),
    None => label.to_string(),
  }
}

/// True when `value` looks like a target reference rather than a literal.
pub fn is_label(value: &str) -> bool {
  value.starts_with("//") || value.starts_with(':')
}

/// Label identifying a build command, `cmd:<base64 of the joined commands>`.
///
/// Returns `None` for an empty build command.
pub fn build_command_label(build: &[String]) -> Option<String> {
  if build.is_empty() {
    return None;
  }
  let joined = build.join(COMMAND_JOINER);
  Some(format!("{BUILD_COMMAND_LABEL_PREFIX}{}", STANDARD.encode(joined)))
}
