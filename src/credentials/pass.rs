//! Password-store (pass) credential backend.
//!
//! An entry's first line is exposed as the `password` field; following lines
//! of the form `field-name: value` are exposed under their field name.

use std::collections::HashMap;
use std::process::Command;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::CredentialStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassConfig {
    /// The pass entry path (e.g., "finance/coincheck").
    pub path: String,

    /// Mapping from logical key names to field names in the entry.
    /// Unmapped keys are looked up as-is.
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

pub struct PassCredentialStore {
    config: PassConfig,
}

impl PassCredentialStore {
    pub fn new(config: PassConfig) -> Self {
        Self { config }
    }

    fn field_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.config.fields.get(key).map(String::as_str).unwrap_or(key)
    }

    fn read_entry(&self) -> Result<HashMap<String, String>> {
        let output = Command::new("pass")
            .arg("show")
            .arg(&self.config.path)
            .output()
            .context("Failed to run pass command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("pass show {} failed: {}", self.config.path, stderr.trim());
        }

        let content = String::from_utf8(output.stdout).context("Invalid UTF-8 in pass output")?;
        Ok(parse_entry(&content))
    }
}

fn parse_entry(content: &str) -> HashMap<String, String> {
    let mut lines = content.lines();
    let mut fields = HashMap::new();
    if let Some(first) = lines.next() {
        fields.insert("password".to_string(), first.to_string());
    }
    for line in lines {
        if let Some((name, value)) = line.split_once(": ") {
            fields.insert(name.trim().to_string(), value.to_string());
        }
    }
    fields
}

#[async_trait]
impl CredentialStore for PassCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<SecretString>> {
        let field = self.field_name(key).to_string();
        let mut entry = self.read_entry()?;
        Ok(entry.remove(&field).map(SecretString::from))
    }
}
