//! Service-account credential loading
//!
//! Deployed builds receive the credential as a Base64 secret in the
//! environment; local runs fall back to a JSON key file next to the binary.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Environment variable holding Base64(JSON credential)
pub const DEFAULT_SECRET_VAR: &str = "GOOGLE_SHEETS_CREDENTIALS_B64";
/// Local fallback credential file
pub const DEFAULT_KEY_FILE: &str = "sheets-key.json";
/// OAuth scopes requested for the spreadsheet connection
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no credentials found: set {secret_var} or provide {}", .path.display())]
    Missing { secret_var: String, path: PathBuf },
    #[error("malformed credential: {0}")]
    Format(String),
    #[error("cannot read credential file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Decoded service-account key
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Where to look for a credential
#[derive(Debug, Clone)]
pub struct CredentialSource {
    pub secret_var: String,
    pub key_file: PathBuf,
}

impl Default for CredentialSource {
    fn default() -> Self {
        Self {
            secret_var: DEFAULT_SECRET_VAR.to_string(),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
        }
    }
}

impl CredentialSource {
    /// Whether either source is present (says nothing about validity)
    pub fn is_available(&self) -> bool {
        std::env::var_os(&self.secret_var).is_some() || self.key_file.exists()
    }

    pub fn load(&self) -> Result<ServiceAccount, CredentialError> {
        load_from(
            std::env::var(&self.secret_var).ok(),
            &self.secret_var,
            &self.key_file,
        )
    }
}

/// Secret first, then the key file
pub fn load_from(
    secret: Option<String>,
    secret_var: &str,
    key_file: &Path,
) -> Result<ServiceAccount, CredentialError> {
    if let Some(encoded) = secret {
        let account = decode_credential(&encoded)?;
        info!(source = secret_var, client = %account.client_email, "credential decoded");
        return Ok(account);
    }

    if key_file.exists() {
        let json = std::fs::read_to_string(key_file).map_err(|source| CredentialError::Io {
            path: key_file.to_path_buf(),
            source,
        })?;
        let account = parse_credential_json(&json)?;
        info!(source = %key_file.display(), client = %account.client_email, "credential loaded");
        return Ok(account);
    }

    Err(CredentialError::Missing {
        secret_var: secret_var.to_string(),
        path: key_file.to_path_buf(),
    })
}

/// Pad a Base64 string with `=` up to a multiple of 4 characters.
///
/// Secret stores often trim trailing padding.
pub fn fix_padding(encoded: &str) -> String {
    let missing = encoded.len() % 4;
    if missing == 0 {
        return encoded.to_string();
    }
    let mut padded = String::with_capacity(encoded.len() + 4 - missing);
    padded.push_str(encoded);
    padded.extend(std::iter::repeat('=').take(4 - missing));
    padded
}

/// Base64 secret -> credential
///
/// Line breaks and other whitespace are dropped first, so output wrapped by
/// `base64` at 76 columns decodes too.
pub fn decode_credential(encoded: &str) -> Result<ServiceAccount, CredentialError> {
    let cleaned: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let padded = fix_padding(&cleaned);
    let bytes = BASE64
        .decode(padded.as_bytes())
        .map_err(|e| CredentialError::Format(format!("base64: {}", e)))?;
    let json = String::from_utf8(bytes)
        .map_err(|e| CredentialError::Format(format!("utf-8: {}", e)))?;
    parse_credential_json(&json)
}

/// Parse the key JSON, turning literal `\n` in the private key back into newlines
pub fn parse_credential_json(json: &str) -> Result<ServiceAccount, CredentialError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| CredentialError::Format(format!("json: {}", e)))?;

    let serde_json::Value::Object(mut map) = value else {
        return Err(CredentialError::Format("json: expected an object".into()));
    };

    if let Some(serde_json::Value::String(key)) = map.get_mut("private_key") {
        *key = key.replace("\\n", "\n");
    }

    serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|e| CredentialError::Format(format!("json: {}", e)))
}
