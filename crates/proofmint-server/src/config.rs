use proofmint_core::{StageTimeouts, TemplatePreset, YOUTUBE_API_BASE};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Google OAuth client and YouTube API settings
    #[serde(default)]
    pub google: GoogleConfig,
    /// External proof service
    #[serde(default)]
    pub proof: ProofConfig,
    /// Metadata publication backend
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upper bound for each external call, in milliseconds
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub token_store: TokenStoreConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

impl AppConfig {
    /// Validates the configuration, reporting every missing required key at once.
    pub fn validate(&self) -> Result<(), String> {
        let mut missing = Vec::new();
        let required = [
            ("google.client_id", &self.google.client_id),
            ("google.client_secret", &self.google.client_secret),
            ("google.redirect_uri", &self.google.redirect_uri),
            ("proof.app_id", &self.proof.app_id),
            ("proof.app_secret", &self.proof.app_secret),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                missing.push(key);
            }
        }
        if self.storage.backend == StorageBackend::Http {
            if self.storage.api_key.trim().is_empty() {
                missing.push("storage.api_key");
            }
            if self.storage.upload_url.trim().is_empty() {
                missing.push("storage.upload_url");
            }
        }
        if !missing.is_empty() {
            return Err(format!(
                "missing required configuration: {}",
                missing.join(", ")
            ));
        }

        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.proof.endpoint.trim().is_empty() {
            return Err("proof.endpoint must not be empty".into());
        }
        self.timeouts.validate()?;
        if self.token_store.ttl_secs == 0 || self.token_store.purge_interval_secs == 0 {
            return Err("token_store.ttl_secs and token_store.purge_interval_secs must be > 0".into());
        }
        if self.google.consent_ttl_secs == 0 {
            return Err("google.consent_ttl_secs must be > 0".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Origins allowed to call the API with credentials
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    64 * 1024
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default = "default_auth_endpoint")]
    pub auth_endpoint: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_youtube_api_base")]
    pub youtube_api_base: String,
    /// Lifetime of an issued consent `state`
    #[serde(default = "default_consent_ttl_secs")]
    pub consent_ttl_secs: u64,
}

fn default_auth_endpoint() -> String {
    proofmint_auth::GOOGLE_AUTH_ENDPOINT.into()
}
fn default_token_endpoint() -> String {
    proofmint_auth::GOOGLE_TOKEN_ENDPOINT.into()
}
fn default_scope() -> String {
    proofmint_auth::YOUTUBE_READONLY_SCOPE.into()
}
fn default_youtube_api_base() -> String {
    YOUTUBE_API_BASE.into()
}
fn default_consent_ttl_secs() -> u64 {
    proofmint_auth::DEFAULT_CONSENT_TTL.as_secs()
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            auth_endpoint: default_auth_endpoint(),
            token_endpoint: default_token_endpoint(),
            scope: default_scope(),
            youtube_api_base: default_youtube_api_base(),
            consent_ttl_secs: default_consent_ttl_secs(),
        }
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_endpoint", &self.auth_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("scope", &self.scope)
            .field("youtube_api_base", &self.youtube_api_base)
            .field("consent_ttl_secs", &self.consent_ttl_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProofConfig {
    /// Base URL of the proof service (`/zkfetch` and `/verify` live under it)
    #[serde(default = "default_proof_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_secret: String,
}

fn default_proof_endpoint() -> String {
    "http://127.0.0.1:8001".into()
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            endpoint: default_proof_endpoint(),
            app_id: String::new(),
            app_secret: String::new(),
        }
    }
}

impl std::fmt::Debug for ProofConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofConfig")
            .field("endpoint", &self.endpoint)
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Pinning service reached over HTTP
    #[default]
    Http,
    /// Process-local content-addressed store
    Memory,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    #[serde(default)]
    pub api_key: String,
    /// HTTP gateway for token URIs; `ipfs://` URIs are returned when unset
    #[serde(default)]
    pub gateway: Option<String>,
}

fn default_upload_url() -> String {
    "https://api.nft.storage/upload".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            upload_url: default_upload_url(),
            api_key: String::new(),
            gateway: None,
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("upload_url", &self.upload_url)
            .field("api_key", &"[REDACTED]")
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_token_exchange_ms")]
    pub token_exchange_ms: u64,
    #[serde(default = "default_resource_fetch_ms")]
    pub resource_fetch_ms: u64,
    #[serde(default = "default_proof_generation_ms")]
    pub proof_generation_ms: u64,
    #[serde(default = "default_proof_verification_ms")]
    pub proof_verification_ms: u64,
    #[serde(default = "default_publish_ms")]
    pub publish_ms: u64,
}

fn default_token_exchange_ms() -> u64 {
    10_000
}
fn default_resource_fetch_ms() -> u64 {
    15_000
}
fn default_proof_generation_ms() -> u64 {
    120_000
}
fn default_proof_verification_ms() -> u64 {
    30_000
}
fn default_publish_ms() -> u64 {
    60_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            token_exchange_ms: default_token_exchange_ms(),
            resource_fetch_ms: default_resource_fetch_ms(),
            proof_generation_ms: default_proof_generation_ms(),
            proof_verification_ms: default_proof_verification_ms(),
            publish_ms: default_publish_ms(),
        }
    }
}

impl TimeoutConfig {
    fn validate(&self) -> Result<(), String> {
        let all = [
            self.token_exchange_ms,
            self.resource_fetch_ms,
            self.proof_generation_ms,
            self.proof_verification_ms,
            self.publish_ms,
        ];
        if all.contains(&0) {
            return Err("timeouts must be > 0".into());
        }
        Ok(())
    }

    pub fn stage_timeouts(&self) -> StageTimeouts {
        StageTimeouts {
            token_exchange: Duration::from_millis(self.token_exchange_ms),
            resource_fetch: Duration::from_millis(self.resource_fetch_ms),
            proof_generation: Duration::from_millis(self.proof_generation_ms),
            proof_verification: Duration::from_millis(self.proof_verification_ms),
            publish: Duration::from_millis(self.publish_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStoreConfig {
    #[serde(default = "default_token_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

fn default_token_ttl_secs() -> u64 {
    3600
}
fn default_purge_interval_secs() -> u64 {
    60
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_token_ttl_secs(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

impl TokenStoreConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetadataConfig {
    #[serde(default)]
    pub template: TemplatePreset,
    /// When set, every successfully built document is also written here
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
    use std::path::PathBuf;

    /// Flat variable names accepted as fallbacks for required credentials.
    /// The first variable that is set wins.
    const LEGACY_ENV: &[(&str, &[&str])] = &[
        ("google.client_id", &["GOOGLE_CLIENT_ID"]),
        ("google.client_secret", &["GOOGLE_CLIENT_SECRET"]),
        ("google.redirect_uri", &["GOOGLE_REDIRECT_URI"]),
        ("proof.app_id", &["APP_ID"]),
        ("proof.app_secret", &["APP_SECRET"]),
        (
            "storage.api_key",
            &[
                "STORAGE_API_KEY",
                "THIRDWEB_API_KEY",
                "NFT_STORAGE_API_KEY",
                "WEB3_STORAGE_API_KEY",
            ],
        ),
    ];

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = legacy_defaults(Config::builder())
            .map_err(|e| format!("config build error: {e}"))?;
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("proofmint.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., PROOFMINT__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("PROOFMINT")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    // Lowest precedence: the file and PROOFMINT__ variables both win.
    fn legacy_defaults(
        mut builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        for (key, names) in LEGACY_ENV {
            let value = names
                .iter()
                .filter_map(|name| std::env::var(name).ok())
                .find(|v| !v.is_empty());
            if let Some(value) = value {
                builder = builder.set_default(*key, value)?;
            }
        }
        Ok(builder)
    }
}
