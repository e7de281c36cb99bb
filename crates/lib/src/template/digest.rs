//! Digest of a managed section's body.
//!
//! The digest is recorded in the `DO NOT EDIT` line when a file is written. On
//! the next run a body that no longer hashes to its recorded digest has been
//! edited by hand.

use std::fmt;

use sha2::{Digest as _, Sha256};

/// SHA-256 over the body lines joined with `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Digest(Vec<u8>);

impl Digest {
  /// Hash `lines` joined by newlines.
  pub fn stamp<S: AsRef<str>>(lines: &[S]) -> Self {
    let mut hasher = Sha256::new();
    for (i, line) in lines.iter().enumerate() {
      if i > 0 {
        hasher.update(b"\n");
      }
      hasher.update(line.as_ref().as_bytes());
    }
    Digest(hasher.finalize().to_vec())
  }

  /// Whether `lines` still hash to this digest.
  pub fn validate<S: AsRef<str>>(&self, lines: &[S]) -> bool {
    *self == Self::stamp(lines)
  }

  pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
    hex::decode(hex).map(Digest)
  }

  pub fn to_hex(&self) -> String {
    hex::encode(&self.0)
  }
}

impl fmt::Display for Digest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_hex())
  }
}
