//! Validated group resource pushed by the identity provider.

/// Validation errors returned by [`IncomingGroupResource::try_new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupValidationError {
    /// `displayName` was empty or whitespace.
    #[error("displayName must not be empty")]
    EmptyDisplayName,
}

/// Group resource after boundary validation.
///
/// The provider's `externalId` becomes the remote group's lookup name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingGroupResource {
    display_name: String,
    external_id: Option<String>,
}

impl IncomingGroupResource {
    pub fn try_new(
        display_name: impl Into<String>,
        external_id: Option<String>,
    ) -> Result<Self, GroupValidationError> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(GroupValidationError::EmptyDisplayName);
        }
        Ok(Self {
            display_name,
            external_id: external_id.filter(|value| !value.trim().is_empty()),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_display_name_is_rejected() {
        assert_eq!(
            IncomingGroupResource::try_new("  ", None),
            Err(GroupValidationError::EmptyDisplayName)
        );
    }

    #[test]
    fn blank_external_id_is_dropped() {
        let group = IncomingGroupResource::try_new("Engineering", Some(String::new()))
            .expect("valid group");
        assert_eq!(group.external_id(), None);
    }
}
