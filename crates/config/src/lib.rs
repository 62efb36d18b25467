use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "et-payverify";
const KEYCHAIN_SERVICE: &str = "et.payverify.credentials";

pub const GEMINI_KEY_NAME: &str = "gemini_api_key";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub banks: BankEndpoints,
    /// Cap on the number of `0`/`O` positions the retry orchestrator will
    /// substitute over; k positions mean up to 2^k lookups.
    #[serde(default = "default_max_ambiguous_positions")]
    pub max_ambiguous_positions: usize,
    /// Sled directory for the verification history.
    #[serde(default = "default_history_path")]
    pub history_path: String,
    /// Append-only JSONL audit trail.
    #[serde(default = "default_audit_path")]
    pub audit_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            banks: BankEndpoints::default(),
            max_ambiguous_positions: default_max_ambiguous_positions(),
            history_path: default_history_path(),
            audit_path: default_audit_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// "live" talks to the real bank endpoints; "mock" uses in-process
    /// stand-ins, for development without network access.
    #[serde(default = "default_provider_kind")]
    pub kind: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankEndpoints {
    #[serde(default = "default_cbe_base_url")]
    pub cbe_base_url: String,
    #[serde(default = "default_boa_api_url")]
    pub boa_api_url: String,
    #[serde(default = "default_boa_slip_url")]
    pub boa_slip_url: String,
    #[serde(default = "default_telebirr_base_url")]
    pub telebirr_base_url: String,
}

impl Default for BankEndpoints {
    fn default() -> Self {
        Self {
            cbe_base_url: default_cbe_base_url(),
            boa_api_url: default_boa_api_url(),
            boa_slip_url: default_boa_slip_url(),
            telebirr_base_url: default_telebirr_base_url(),
        }
    }
}

fn default_provider_kind() -> String {
    "live".to_string()
}

fn default_max_ambiguous_positions() -> usize {
    10
}

fn default_history_path() -> String {
    ".payverify_history".to_string()
}

fn default_audit_path() -> String {
    "audit.jsonl".to_string()
}

fn default_cbe_base_url() -> String {
    "https://apps.cbe.com.et:100/".to_string()
}

fn default_boa_api_url() -> String {
    "https://cs.bankofabyssinia.com/api/onlineSlip/getDetails/".to_string()
}

fn default_boa_slip_url() -> String {
    "https://cs.bankofabyssinia.com/slip/".to_string()
}

fn default_telebirr_base_url() -> String {
    "https://transactioninfo.ethiotelecom.et/receipt/".to_string()
}

pub fn load() -> Result<AppConfig> {
    let cfg: AppConfig = confy::load(APP_NAME, None).context("Failed to load app config")?;
    Ok(cfg)
}

pub fn store(cfg: &AppConfig) -> Result<()> {
    confy::store(APP_NAME, None, cfg).context("Failed to store app config")?;
    Ok(())
}

/// Store a secret in the OS keychain
pub fn store_secret(key: &str, value: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    entry.set_password(value)?;
    Ok(())
}

/// Retrieve a secret from the OS keychain
pub fn get_secret(key: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    let password = entry.get_password()?;
    Ok(password)
}

/// Delete a secret from the OS keychain
pub fn delete_secret(key: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    entry.delete_password()?;
    Ok(())
}

/// Resolve the Gemini API key: environment first, then the keychain. A
/// missing key is not an error; the AI-assisted strategy is simply skipped.
pub fn gemini_api_key() -> Option<String> {
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            return Some(key);
        }
    }
    match get_secret(GEMINI_KEY_NAME) {
        Ok(key) if !key.is_empty() => Some(key),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(error = %err, "no Gemini API key in keychain");
            None
        }
    }
}
