//! Login credential pair.

use std::fmt;

use super::error::AuthError;

/// Account identifier and secret used for the login POST.
///
/// The password is redacted in Debug output.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair, rejecting blank values.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredential`] if either value is empty after trimming.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self, AuthError> {
        let email = email.into().trim().to_string();
        let password = password.into();
        if email.is_empty() {
            return Err(AuthError::MissingCredential { field: "email" });
        }
        if password.trim().is_empty() {
            return Err(AuthError::MissingCredential { field: "password" });
        }
        Ok(Self { email, password })
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the secret. Never log the return value.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
