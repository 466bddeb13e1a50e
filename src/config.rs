//! Configuration lookup: process environment, an optional env file, or a
//! static map in tests.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::ReportError;

pub const ORG_ID_KEY: &str = "UMBRELLA_ORG_ID";
pub const CREDENTIALS_KEY: &str = "UMBRELLA_CREDENTIALS";
pub const API_KEY_KEY: &str = "UMBRELLA_API_KEY";
pub const API_SECRET_KEY: &str = "UMBRELLA_API_SECRET";
pub const REPORT_URL_KEY: &str = "UMBRELLA_REPORT_URL";
pub const TIMEOUT_KEY: &str = "UMBRELLA_TIMEOUT_SECS";
pub const TOKEN_URL_KEY: &str = "UMBRELLA_TOKEN_URL";

pub const DEFAULT_REPORT_URL: &str = "https://reports.api.umbrella.com/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of string configuration values keyed by variable name.
pub trait ConfigProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the live process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl ConfigProvider for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed key/value pairs, e.g. parsed from an env file or built in tests.
#[derive(Debug, Default, Clone)]
pub struct StaticConfig {
    values: HashMap<String, String>,
}

impl StaticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    /// Loads a dotenv-style file without touching the process environment.
    ///
    /// # Errors
    /// Fails if the file cannot be read or contains a malformed line.
    pub fn from_env_file(path: &Path) -> Result<Self, ReportError> {
        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            ReportError::Configuration(format!("cannot read env file {}: {e}", path.display()))
        })?;
        let mut values = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| {
                ReportError::Configuration(format!("malformed env file {}: {e}", path.display()))
            })?;
            values.insert(key, value);
        }
        Ok(StaticConfig { values })
    }
}

impl ConfigProvider for StaticConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Consults providers in order; the first one holding a key wins.
#[derive(Default)]
pub struct Layered {
    layers: Vec<Box<dyn ConfigProvider>>,
}

impl Layered {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn push(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.layers.push(Box::new(provider));
        self
    }
}

impl ConfigProvider for Layered {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|p| p.get(key))
    }
}

/// Everything the report query needs besides the time range.
#[derive(Clone)]
pub struct Settings {
    pub org_id: String,
    /// Base64 of `key:secret`, sent verbatim in the Basic auth header.
    pub credential: String,
    pub report_url: String,
    /// When set, the credential is exchanged here for a Bearer token.
    pub token_url: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("org_id", &self.org_id)
            .field("credential", &"<redacted>")
            .field("report_url", &self.report_url)
            .field("token_url", &self.token_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    /// Assembles settings from `provider`.
    ///
    /// The credential comes from `UMBRELLA_CREDENTIALS`, or is encoded from
    /// `UMBRELLA_API_KEY` and `UMBRELLA_API_SECRET` when that is absent.
    ///
    /// # Errors
    /// [`ReportError::Configuration`] when the org ID or credential is missing
    /// or the timeout is not a number.
    pub fn load(provider: &dyn ConfigProvider) -> Result<Self, ReportError> {
        let org_id = non_empty(provider, ORG_ID_KEY)
            .ok_or_else(|| ReportError::Configuration(format!("{ORG_ID_KEY} is not set")))?;

        let credential = match non_empty(provider, CREDENTIALS_KEY) {
            Some(c) => c,
            None => match (non_empty(provider, API_KEY_KEY), non_empty(provider, API_SECRET_KEY)) {
                (Some(key), Some(secret)) => encode_credential(&key, &secret),
                _ => {
                    return Err(ReportError::Configuration(format!(
                        "{CREDENTIALS_KEY} is not set (or set both {API_KEY_KEY} and {API_SECRET_KEY})"
                    )));
                }
            },
        };

        let report_url = non_empty(provider, REPORT_URL_KEY)
            .unwrap_or_else(|| DEFAULT_REPORT_URL.to_string());
        let token_url = non_empty(provider, TOKEN_URL_KEY);

        let timeout_secs = match non_empty(provider, TIMEOUT_KEY) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ReportError::Configuration(format!(
                        "{TIMEOUT_KEY} must be a positive whole number of seconds, got '{raw}'"
                    ))
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Settings {
            org_id,
            credential,
            report_url,
            token_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Base64-encodes `key:secret` for HTTP Basic authentication.
pub fn encode_credential(key: &str, secret: &str) -> String {
    STANDARD.encode(format!("{key}:{secret}"))
}

fn non_empty(provider: &dyn ConfigProvider, key: &str) -> Option<String> {
    provider
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_required_values_and_defaults() {
        let cfg = StaticConfig::new()
            .with(ORG_ID_KEY, "1234567")
            .with(CREDENTIALS_KEY, "a2V5OnNlY3JldA==");
        let s = Settings::load(&cfg).unwrap();
        assert_eq!(s.org_id, "1234567");
        assert_eq!(s.credential, "a2V5OnNlY3JldA==");
        assert_eq!(s.report_url, DEFAULT_REPORT_URL);
        assert_eq!(s.token_url, None);
        assert_eq!(s.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn missing_org_id_is_a_configuration_error() {
        let cfg = StaticConfig::new().with(CREDENTIALS_KEY, "abc");
        let err = Settings::load(&cfg).unwrap_err();
        assert!(matches!(err, ReportError::Configuration(ref m) if m.contains(ORG_ID_KEY)));
    }

    #[test]
    fn blank_credential_is_a_configuration_error() {
        let cfg = StaticConfig::new()
            .with(ORG_ID_KEY, "42")
            .with(CREDENTIALS_KEY, "   ");
        assert!(matches!(
            Settings::load(&cfg),
            Err(ReportError::Configuration(_))
        ));
    }

    #[test]
    fn key_and_secret_are_encoded_when_credential_absent() {
        let cfg = StaticConfig::new()
            .with(ORG_ID_KEY, "42")
            .with(API_KEY_KEY, "key")
            .with(API_SECRET_KEY, "secret");
        let s = Settings::load(&cfg).unwrap();
        assert_eq!(s.credential, "a2V5OnNlY3JldA==");
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let cfg = StaticConfig::new()
            .with(ORG_ID_KEY, "42")
            .with(CREDENTIALS_KEY, "abc")
            .with(TIMEOUT_KEY, "soon");
        assert!(matches!(
            Settings::load(&cfg),
            Err(ReportError::Configuration(_))
        ));
    }

    #[test]
    fn token_url_enables_token_exchange() {
        let cfg = StaticConfig::new()
            .with(ORG_ID_KEY, "42")
            .with(API_KEY_KEY, "key")
            .with(API_SECRET_KEY, "secret")
            .with(TOKEN_URL_KEY, "https://api.umbrella.com/auth/v2/token");
        let s = Settings::load(&cfg).unwrap();
        assert_eq!(
            s.token_url.as_deref(),
            Some("https://api.umbrella.com/auth/v2/token")
        );
        assert_eq!(s.credential, "a2V5OnNlY3JldA==");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = StaticConfig::new()
            .with(ORG_ID_KEY, "42")
            .with(CREDENTIALS_KEY, "abc")
            .with(TIMEOUT_KEY, "0");
        let err = Settings::load(&cfg).unwrap_err();
        assert!(matches!(err, ReportError::Configuration(ref m) if m.contains(TIMEOUT_KEY)));
    }

    #[test]
    fn earlier_layers_win() {
        let cfg = Layered::new()
            .push(StaticConfig::new().with(ORG_ID_KEY, "from-env"))
            .push(
                StaticConfig::new()
                    .with(ORG_ID_KEY, "from-file")
                    .with(CREDENTIALS_KEY, "file-cred"),
            );
        assert_eq!(cfg.get(ORG_ID_KEY).as_deref(), Some("from-env"));
        assert_eq!(cfg.get(CREDENTIALS_KEY).as_deref(), Some("file-cred"));
        assert_eq!(cfg.get(REPORT_URL_KEY), None);
    }

    #[test]
    fn env_file_is_parsed_without_touching_process_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# umbrella\nDEPLOY_STATUS_TEST_ORG=777\nUMBRELLA_CREDENTIALS=\"Zm9vOmJhcg==\"\n",
        )
        .unwrap();
        let cfg = StaticConfig::from_env_file(&path).unwrap();
        assert_eq!(cfg.get("DEPLOY_STATUS_TEST_ORG").as_deref(), Some("777"));
        assert_eq!(cfg.get(CREDENTIALS_KEY).as_deref(), Some("Zm9vOmJhcg=="));
        assert!(std::env::var("DEPLOY_STATUS_TEST_ORG").is_err());
    }

    #[test]
    fn debug_output_redacts_credential() {
        let cfg = StaticConfig::new()
            .with(ORG_ID_KEY, "42")
            .with(CREDENTIALS_KEY, "c2VjcmV0");
        let s = Settings::load(&cfg).unwrap();
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("c2VjcmV0"));
        assert!(dbg.contains("<redacted>"));
    }
}
