use serde::{Deserialize, Serialize};

/// Authenticated caller as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    subject: String,
    email: Option<String>,
    is_admin: bool,
}

impl Principal {
    /// Creates a principal from identity provider data.
    #[must_use]
    pub fn new(subject: impl Into<String>, email: Option<String>, is_admin: bool) -> Self {
        Self {
            subject: subject.into(),
            email,
            is_admin,
        }
    }

    /// Returns the stable user identifier issued by the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns whether the profile carries the administrator flag.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}
