//! Identifier of an account or group inside the remote identity graph.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`RemoteId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteIdValidationError {
    /// The identifier was empty.
    #[error("remote identifier must not be empty")]
    Empty,
    /// The identifier carried surrounding whitespace.
    #[error("remote identifier must not contain surrounding whitespace")]
    Padded,
}

/// Opaque identifier assigned by the remote identity graph.
///
/// The bridge never invents these; it only echoes values the remote returned
/// or the identity provider sent back in a resource path.
///
/// # Examples
/// ```
/// use scim_bridge::domain::RemoteId;
///
/// let id = RemoteId::new("u-42").expect("valid id");
/// assert_eq!(id.as_ref(), "u-42");
/// assert!(RemoteId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Validate and construct a [`RemoteId`].
    pub fn new(id: impl Into<String>) -> Result<Self, RemoteIdValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RemoteIdValidationError::Empty);
        }
        if id.trim() != id {
            return Err(RemoteIdValidationError::Padded);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for RemoteId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RemoteId> for String {
    fn from(value: RemoteId) -> Self {
        value.0
    }
}

impl TryFrom<String> for RemoteId {
    type Error = RemoteIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", RemoteIdValidationError::Empty)]
    #[case(" u-1", RemoteIdValidationError::Padded)]
    #[case("u-1\n", RemoteIdValidationError::Padded)]
    fn rejects_malformed_identifiers(#[case] raw: &str, #[case] expected: RemoteIdValidationError) {
        assert_eq!(RemoteId::new(raw), Err(expected));
    }

    #[test]
    fn deserialising_validates_content() {
        let parsed: Result<RemoteId, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
        let parsed: RemoteId = serde_json::from_str("\"g-7\"").expect("valid id");
        assert_eq!(parsed.to_string(), "g-7");
    }
}
