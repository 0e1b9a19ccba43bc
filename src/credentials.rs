//! API credentials.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

/// Environment variable read by [`Credentials::from_env`].
pub const API_KEY_ENV: &str = "VULTR_API_KEY";

/// A Vultr API key, sent as a bearer token.
///
/// The key is held in a [`SecretString`] and never printed by `Debug`.
///
/// # Examples
///
/// ```
/// use vultr_rest::Credentials;
///
/// let credentials = Credentials::new("my-api-key");
/// assert_eq!(credentials.authorization(), "Bearer my-api-key");
/// assert!(!format!("{:?}", credentials).contains("my-api-key"));
/// ```
#[derive(Clone)]
pub struct Credentials {
    api_key: SecretString,
}

impl Credentials {
    /// Wraps an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
        }
    }

    /// Reads the API key from `VULTR_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] if the variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_var(API_KEY_ENV)
    }

    /// Reads the API key from the named environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] if the variable is unset or empty.
    pub fn from_var(name: &str) -> Result<Self> {
        match std::env::var(name) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            Ok(_) => Err(Error::MissingCredentials(format!("{} is empty", name))),
            Err(e) => Err(Error::MissingCredentials(format!("{}: {}", name, e))),
        }
    }

    /// The `Authorization` header value.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
