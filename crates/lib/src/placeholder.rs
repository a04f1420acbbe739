//! Placeholder parsing and substitution for target-scoped values.
//!
//! Script commands reference values that are only known once a target is
//! constructed: its working directory, sources, outputs, environment, tools
//! and the outputs of its dependencies. This module parses placeholder
//! strings and substitutes resolved values.
//!
//! # Placeholder Formats
//!
//! - `$${cwd}` - the target's working directory
//! - `$${name}` - the target's qualified name
//! - `$${srcs}` / `$${srcs:<group>}` - all sources, or one mapped group
//! - `$${outs}` - the target's declared outputs
//! - `$${env:<NAME>}` - a variable from the environment the command runs with
//! - `$${tool:<name>}` - a tool declared on the target
//! - `$${dep:<label>}` - outputs of a dependency
//!
//! # Shell Variables
//!
//! Single `$` characters pass through unchanged, so shell variables like
//! `$HOME` and `${PATH}` work naturally without any escaping.
//!
//! # Escaping
//!
//! Use `$$$` before `{` to produce a literal `$${` sequence.
//!
//! # Example
//!
//! ```
//! use stagehand_lib::placeholder::{parse, Segment, Placeholder};
//!
//! let segments = parse("$${cwd}/bin:$HOME").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Placeholder(Placeholder::Cwd),
//!     Segment::Literal("/bin:$HOME".to_string()),
//! ]);
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  /// `$${cwd}` - working directory of the target
  Cwd,

  /// `$${name}` - qualified name of the target
  Name,

  /// `$${srcs}` or `$${srcs:<group>}`
  Srcs(Option<String>),

  /// `$${outs}` - declared outputs
  Outs,

  /// `$${env:<NAME>}` - base environment variable
  Env(String),

  /// `$${tool:<name>}` - declared tool
  Tool(String),

  /// `$${dep:<label>}` - outputs of a dependency
  Dep(String),
}

impl Placeholder {
  /// The placeholder kind as written between `$${` and the first `:`.
  pub fn kind(&self) -> &'static str {
    match self {
      Placeholder::Cwd => "cwd",
      Placeholder::Name => "name",
      Placeholder::Srcs(_) => "srcs",
      Placeholder::Outs => "outs",
      Placeholder::Env(_) => "env",
      Placeholder::Tool(_) => "tool",
      Placeholder::Dep(_) => "dep",
    }
  }
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A placeholder to be resolved
  Placeholder(Placeholder),
}

/// Errors that can occur during placeholder parsing or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("unknown placeholder type: {0}")]
  UnknownType(String),

  #[error("malformed placeholder: {0}")]
  Malformed(String),

  #[error("unresolved environment variable: {0}")]
  UnresolvedEnv(String),

  #[error("unresolved source group: {0}")]
  UnresolvedSrcs(String),

  #[error("unresolved tool: {0}")]
  UnresolvedTool(String),

  #[error("unresolved dependency: {0}")]
  UnresolvedDep(String),

  #[error("placeholder '{0}' is not available in this context")]
  Unsupported(&'static str),
}

/// Trait for resolving placeholder values.
///
/// Every method has a default that reports the placeholder as unsupported,
/// so a resolver only implements what its context can answer.
pub trait Resolver {
  fn resolve_cwd(&self) -> Result<String, PlaceholderError> {
    Err(PlaceholderError::Unsupported("cwd"))
  }

  fn resolve_name(&self) -> Result<String, PlaceholderError> {
    Err(PlaceholderError::Unsupported("name"))
  }

  /// Resolve sources; `None` selects every group.
  fn resolve_srcs(&self, _group: Option<&str>) -> Result<String, PlaceholderError> {
    Err(PlaceholderError::Unsupported("srcs"))
  }

  fn resolve_outs(&self) -> Result<String, PlaceholderError> {
    Err(PlaceholderError::Unsupported("outs"))
  }

  fn resolve_env(&self, _name: &str) -> Result<String, PlaceholderError> {
    Err(PlaceholderError::Unsupported("env"))
  }

  fn resolve_tool(&self, _name: &str) -> Result<String, PlaceholderError> {
    Err(PlaceholderError::Unsupported("tool"))
  }

  fn resolve_dep(&self, _label: &str) -> Result<String, PlaceholderError> {
    Err(PlaceholderError::Unsupported("dep"))
  }
}

/// The interpolation contract consumed by script execution.
///
/// Anything that can turn a raw command string into a concrete one can
/// drive the phase executor; [`substitute`] over a [`Resolver`] is the
/// default implementation.
pub trait Interpolate {
  fn interpolate(&self, raw: &str) -> Result<String, PlaceholderError>;

  /// Interpolate with `env` answering `$${env:...}`.
  ///
  /// Script phases pass their merged environment here so variables from a
  /// script overlay are visible. The default ignores `env`.
  fn interpolate_in(&self, raw: &str, _env: &BTreeMap<String, String>) -> Result<String, PlaceholderError> {
    self.interpolate(raw)
  }
}

/// A [`Resolver`] whose environment lookups go to `env`.
///
/// Every other placeholder is answered by `inner`.
pub struct EnvOverlay<'a, R> {
  inner: &'a R,
  env: &'a BTreeMap<String, String>,
}

impl<'a, R: Resolver> EnvOverlay<'a, R> {
  pub fn new(inner: &'a R, env: &'a BTreeMap<String, String>) -> Self {
    Self { inner, env }
  }
}

impl<R: Resolver> Resolver for EnvOverlay<'_, R> {
  fn resolve_cwd(&self) -> Result<String, PlaceholderError> {
    self.inner.resolve_cwd()
  }

  fn resolve_name(&self) -> Result<String, PlaceholderError> {
    self.inner.resolve_name()
  }

  fn resolve_srcs(&self, group: Option<&str>) -> Result<String, PlaceholderError> {
    self.inner.resolve_srcs(group)
  }

  fn resolve_outs(&self) -> Result<String, PlaceholderError> {
    self.inner.resolve_outs()
  }

  fn resolve_env(&self, name: &str) -> Result<String, PlaceholderError> {
    self
      .env
      .get(name)
      .cloned()
      .ok_or_else(|| PlaceholderError::UnresolvedEnv(name.to_string()))
  }

  fn resolve_tool(&self, name: &str) -> Result<String, PlaceholderError> {
    self.inner.resolve_tool(name)
  }

  fn resolve_dep(&self, label: &str) -> Result<String, PlaceholderError> {
    self.inner.resolve_dep(label)
  }
}

/// Parse a string containing placeholders into segments.
///
/// # Errors
///
/// Returns an error if a placeholder is malformed (unclosed, unknown type, etc.)
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    match chars.peek() {
      Some((_, '$')) => {
        chars.next();

        match chars.peek() {
          Some((_, '$')) => {
            chars.next();

            match chars.peek() {
              Some((_, '{')) => {
                // $$${ -> literal $${
                literal.push_str("$${");
                chars.next();
              }
              _ => literal.push_str("$$$"),
            }
          }
          Some((_, '{')) => {
            chars.next();

            if !literal.is_empty() {
              segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let mut content = String::new();
            let mut found_close = false;

            for (_, c) in chars.by_ref() {
              if c == '}' {
                found_close = true;
                break;
              }
              content.push(c);
            }

            if !found_close {
              return Err(PlaceholderError::Unclosed(pos));
            }

            segments.push(Segment::Placeholder(parse_placeholder_content(&content)?));
          }
          _ => literal.push_str("$$"),
        }
      }
      // a lone $ is a shell variable
      _ => literal.push('$'),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Parse the content inside a placeholder (everything between `$${` and `}`).
fn parse_placeholder_content(content: &str) -> Result<Placeholder, PlaceholderError> {
  let (kind, arg) = match content.split_once(':') {
    Some((kind, arg)) => (kind, Some(arg)),
    None => (content, None),
  };

  let required = |arg: Option<&str>| -> Result<String, PlaceholderError> {
    match arg {
      Some(a) if !a.is_empty() => Ok(a.to_string()),
      _ => Err(PlaceholderError::Malformed(format!("{kind} placeholder requires an argument: '{content}'"))),
    }
  };

  let no_arg = |arg: Option<&str>, placeholder: Placeholder| -> Result<Placeholder, PlaceholderError> {
    match arg {
      None => Ok(placeholder),
      Some(_) => Err(PlaceholderError::Malformed(format!("{kind} placeholder takes no argument: '{content}'"))),
    }
  };

  match kind {
    "cwd" => no_arg(arg, Placeholder::Cwd),
    "name" => no_arg(arg, Placeholder::Name),
    "outs" => no_arg(arg, Placeholder::Outs),
    "srcs" => match arg {
      None => Ok(Placeholder::Srcs(None)),
      Some(_) => Ok(Placeholder::Srcs(Some(required(arg)?))),
    },
    "env" => Ok(Placeholder::Env(required(arg)?)),
    "tool" => Ok(Placeholder::Tool(required(arg)?)),
    "dep" => Ok(Placeholder::Dep(required(arg)?)),
    "" => Err(PlaceholderError::Malformed(format!("empty placeholder: '{content}'"))),
    _ => Err(PlaceholderError::UnknownType(kind.to_string())),
  }
}

/// Substitute all placeholders in a string using the provided resolver.
///
/// # Errors
///
/// Returns an error if parsing fails or if any placeholder cannot be resolved.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let segments = parse(input)?;
  substitute_segments(&segments, resolver)
}

/// Substitute placeholders in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Placeholder(p) => {
        let value = match p {
          Placeholder::Cwd => resolver.resolve_cwd()?,
          Placeholder::Name => resolver.resolve_name()?,
          Placeholder::Srcs(group) => resolver.resolve_srcs(group.as_deref())?,
          Placeholder::Outs => resolver.resolve_outs()?,
          Placeholder::Env(name) => resolver.resolve_env(name)?,
          Placeholder::Tool(name) => resolver.resolve_tool(name)?,
          Placeholder::Dep(label) => resolver.resolve_dep(label)?,
        };
        result.push_str(&value);
      }
    }
  }

  Ok(result)
}
