//! Exchange API credentials.
//!
//! Credentials are never stored in the config file itself. The config names a
//! backend and where to find each field:
//!
//! ```toml
//! [balance.credentials]
//! backend = "env"
//! key = "COINCHECK_API_KEY"
//! secret = "COINCHECK_SECRET_KEY"
//! ```
//!
//! or, for password-store users:
//!
//! ```toml
//! [balance.credentials]
//! backend = "pass"
//! path = "finance/coincheck"
//! ```

mod config;
mod env;
mod pass;

pub use config::CredentialConfig;
pub use env::EnvCredentialStore;
pub use pass::{PassConfig, PassCredentialStore};

use anyhow::Result;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

/// Logical key for the API access key.
pub const KEY_FIELD: &str = "key";
/// Logical key for the API signing secret.
pub const SECRET_FIELD: &str = "secret";

/// Read-only lookup of credential fields by logical key.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns `Ok(None)` if the field is not set.
    async fn get(&self, key: &str) -> Result<Option<SecretString>>;
}

/// Access key and signing secret for an exchange account.
#[derive(Clone)]
pub struct ApiCredentials {
    pub key: String,
    pub secret: SecretString,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl ApiCredentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Loads both fields from a store. Returns `None` when either is missing
    /// or empty, so an unconfigured account is not an error.
    pub async fn load(store: &dyn CredentialStore) -> Result<Option<Self>> {
        let key = store.get(KEY_FIELD).await?;
        let secret = store.get(SECRET_FIELD).await?;

        match (key, secret) {
            (Some(key), Some(secret))
                if !key.expose_secret().is_empty() && !secret.expose_secret().is_empty() =>
            {
                Ok(Some(Self {
                    key: key.expose_secret().to_string(),
                    secret,
                }))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStore(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl CredentialStore for MapStore {
        async fn get(&self, key: &str) -> Result<Option<SecretString>> {
            Ok(self.0.get(key).map(|v| SecretString::from(v.to_string())))
        }
    }

    #[tokio::test]
    async fn load_requires_both_fields() -> Result<()> {
        let full = MapStore(HashMap::from([(KEY_FIELD, "k"), (SECRET_FIELD, "s")]));
        let creds = ApiCredentials::load(&full).await?.expect("credentials");
        assert_eq!(creds.key, "k");
        assert_eq!(creds.secret.expose_secret(), "s");

        let partial = MapStore(HashMap::from([(KEY_FIELD, "k")]));
        assert!(ApiCredentials::load(&partial).await?.is_none());

        let empty = MapStore(HashMap::from([(KEY_FIELD, "k"), (SECRET_FIELD, "")]));
        assert!(ApiCredentials::load(&empty).await?.is_none());
        Ok(())
    }

    #[test]
    fn debug_output_redacts_secret() {
        let creds = ApiCredentials::new("visible", "hidden");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("visible"));
        assert!(!rendered.contains("hidden"));
    }
}
