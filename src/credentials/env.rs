use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;

use super::CredentialStore;

/// Credential store backed by environment variables.
///
/// Each logical key maps to the name of the variable holding its value.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    vars: HashMap<String, String>,
}

impl EnvCredentialStore {
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn with_var(mut self, key: impl Into<String>, var: impl Into<String>) -> Self {
        self.vars.insert(key.into(), var.into());
        self
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<SecretString>> {
        let Some(var) = self.vars.get(key) else {
            return Ok(None);
        };
        Ok(std::env::var(var).ok().map(SecretString::from))
    }
}
