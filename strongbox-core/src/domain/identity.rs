//! Caller identity

use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// An authenticated caller or destination address
///
/// Identities are opaque strings supplied by the outer system. They are
/// trimmed on construction and must be non-empty with no inner whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(Error::validation("identity cannot be empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(Error::validation(format!(
                "identity cannot contain whitespace: {:?}",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Identity::new(s)
    }
}
