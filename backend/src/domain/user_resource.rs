//! Validated user resource pushed by the identity provider.

/// Structured personal name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    /// Full name as the provider wants it displayed.
    pub formatted: Option<String>,
    /// Family name.
    pub family_name: Option<String>,
    /// Given name.
    pub given_name: Option<String>,
}

/// One email address entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    /// Address text.
    pub value: String,
    /// Whether the provider marked this address as primary.
    pub primary: bool,
}

/// Validation errors returned by [`IncomingUserResource::try_new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// `userName` was empty or whitespace.
    #[error("userName must not be empty")]
    EmptyUserName,
    /// No email entry was flagged primary.
    #[error("exactly one primary email is required")]
    MissingPrimaryEmail,
    /// More than one email entry was flagged primary.
    #[error("exactly one primary email is required, found {count}")]
    MultiplePrimaryEmails {
        /// Number of primary entries received.
        count: usize,
    },
    /// The primary email entry had no address.
    #[error("primary email must not be empty")]
    EmptyPrimaryEmail,
}

/// User resource after boundary validation.
///
/// ## Invariants
/// - `user_name` is non-empty.
/// - Exactly one email is primary and its address is non-empty.
///
/// # Examples
/// ```
/// use scim_bridge::domain::{EmailAddress, IncomingUserResource};
///
/// let user = IncomingUserResource::try_new(
///     "ada",
///     vec![EmailAddress { value: "ada@example.com".into(), primary: true }],
/// )
/// .expect("valid user");
/// assert_eq!(user.primary_email(), "ada@example.com");
/// assert_eq!(user.full_name(), "ada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingUserResource {
    user_name: String,
    primary_email: String,
    emails: Vec<EmailAddress>,
    name: PersonName,
    display_name: Option<String>,
    external_id: Option<String>,
}

impl IncomingUserResource {
    /// Validate the mandatory parts of a user resource.
    pub fn try_new(
        user_name: impl Into<String>,
        emails: Vec<EmailAddress>,
    ) -> Result<Self, UserValidationError> {
        let user_name = user_name.into();
        if user_name.trim().is_empty() {
            return Err(UserValidationError::EmptyUserName);
        }

        let mut primaries = emails.iter().filter(|email| email.primary);
        let primary = primaries
            .next()
            .ok_or(UserValidationError::MissingPrimaryEmail)?;
        let extra = primaries.count();
        if extra > 0 {
            return Err(UserValidationError::MultiplePrimaryEmails { count: extra + 1 });
        }
        if primary.value.trim().is_empty() {
            return Err(UserValidationError::EmptyPrimaryEmail);
        }
        let primary_email = primary.value.clone();

        Ok(Self {
            user_name,
            primary_email,
            emails,
            name: PersonName::default(),
            display_name: None,
            external_id: None,
        })
    }

    /// Attach the structured name.
    pub fn with_name(mut self, name: PersonName) -> Self {
        self.name = name;
        self
    }

    /// Attach the provider's display name.
    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name.filter(|value| !value.trim().is_empty());
        self
    }

    /// Attach the provider's own identifier for the user.
    pub fn with_external_id(mut self, external_id: Option<String>) -> Self {
        self.external_id = external_id.filter(|value| !value.trim().is_empty());
        self
    }

    /// Login name, never blank.
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Address of the single primary email entry.
    pub fn primary_email(&self) -> &str {
        &self.primary_email
    }

    /// Every email entry in request order, primary included.
    pub fn emails(&self) -> &[EmailAddress] {
        &self.emails
    }

    pub fn name(&self) -> &PersonName {
        &self.name
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Provider-side identifier; `None` when absent or blank.
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    /// Name written to the remote account.
    ///
    /// Prefers `name.formatted`, then `displayName`, then given and family
    /// names joined with a space, then `userName`.
    pub fn full_name(&self) -> String {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_owned)
        };
        if let Some(formatted) = non_blank(&self.name.formatted) {
            return formatted;
        }
        if let Some(display) = non_blank(&self.display_name) {
            return display;
        }
        let parts: Vec<String> = [&self.name.given_name, &self.name.family_name]
            .into_iter()
            .filter_map(non_blank)
            .collect();
        if parts.is_empty() {
            self.user_name.clone()
        } else {
            parts.join(" ")
        }
    }
}
