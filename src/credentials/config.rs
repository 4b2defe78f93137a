use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::pass::{PassConfig, PassCredentialStore};
use super::{CredentialStore, EnvCredentialStore, KEY_FIELD, SECRET_FIELD};

fn default_key_var() -> String {
    "COINCHECK_API_KEY".to_string()
}

fn default_secret_var() -> String {
    "COINCHECK_SECRET_KEY".to_string()
}

/// Which backend supplies the exchange credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CredentialConfig {
    /// Environment variables holding the key and the secret.
    Env {
        #[serde(default = "default_key_var")]
        key: String,
        #[serde(default = "default_secret_var")]
        secret: String,
    },
    /// Password-store (pass) entry.
    Pass {
        #[serde(flatten)]
        config: PassConfig,
    },
}

impl Default for CredentialConfig {
    fn default() -> Self {
        CredentialConfig::Env {
            key: default_key_var(),
            secret: default_secret_var(),
        }
    }
}

impl CredentialConfig {
    pub fn build(&self) -> Box<dyn CredentialStore> {
        match self {
            CredentialConfig::Env { key, secret } => Box::new(
                EnvCredentialStore::new(HashMap::new())
                    .with_var(KEY_FIELD, key)
                    .with_var(SECRET_FIELD, secret),
            ),
            CredentialConfig::Pass { config } => {
                Box::new(PassCredentialStore::new(config.clone()))
            }
        }
    }

    /// Short description for display, without any secret values.
    pub fn describe(&self) -> String {
        match self {
            CredentialConfig::Env { key, secret } => format!("env ({key}, {secret})"),
            CredentialConfig::Pass { config } => format!("pass ({})", config.path),
        }
    }
}
