//! Shared utilities.
//!
//! Path helpers used while constructing targets, plus test helpers.

pub mod path;

#[cfg(test)]
pub mod testutil;
