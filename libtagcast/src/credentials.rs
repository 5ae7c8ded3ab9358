//! OAuth 1.0a credentials for the downstream posting API
//!
//! The consumer pair identifies the application and the access pair the
//! account it posts as. Secrets are held in [`SecretString`] so they are
//! zeroed on drop and never show up in `Debug` output.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, Result};

pub struct Credentials {
    pub consumer_key: String,
    consumer_secret: SecretString,
    pub access_token: String,
    access_token_secret: SecretString,
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: SecretString::from(consumer_secret.into()),
            access_token: access_token.into(),
            access_token_secret: SecretString::from(access_token_secret.into()),
        }
    }

    /// Check that the consumer pair is present
    ///
    /// The access pair is allowed to be empty, matching the startup check of
    /// the bot: without a consumer key and secret nothing can be signed at all.
    pub fn validate(&self) -> Result<()> {
        if self.consumer_key.trim().is_empty() {
            return Err(ConfigError::MissingField("consumer key".to_string()).into());
        }
        if self.consumer_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::MissingField("consumer secret".to_string()).into());
        }
        Ok(())
    }

    pub fn consumer_secret(&self) -> &str {
        self.consumer_secret.expose_secret()
    }

    pub fn access_token_secret(&self) -> &str {
        self.access_token_secret.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"[REDACTED]")
            .finish()
    }
}
