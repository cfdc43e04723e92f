use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Longest accepted session lifetime (one year).
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Command-line interface of the `pharmacoach` binary.
///
/// Every option can also be provided through the environment, and every
/// option overrides the matching value of the configuration file.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use pharmacoach::configuration::config::{CliArgs, Config};
///
/// let args = CliArgs::parse();
/// let config = Config::load(&args).expect("invalid configuration");
/// println!("Listening on {}:{}", config.server.bind_address, config.server.port);
/// ```
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pharmacoach")]
#[command(version)]
#[command(about = "Role-play coaching backend for pharmaceutical sales teams")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    ///
    /// When omitted, built-in defaults are used and only the flags below apply.
    pub config_file: Option<PathBuf>,

    /// Network address to bind the HTTP server to
    ///
    /// # Command Line
    /// Use `--bind-address <ADDRESS>` or `PHARMACOACH_BIND_ADDRESS`
    #[arg(long, env = "PHARMACOACH_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Port of the HTTP server
    ///
    /// # Command Line
    /// Use `--port <PORT>` or `PHARMACOACH_PORT`
    #[arg(long, env = "PHARMACOACH_PORT")]
    pub port: Option<u16>,

    /// API key sent as a bearer token to the LLM provider
    ///
    /// # Command Line
    /// Use `--api-key <KEY>` or `OPENAI_API_KEY`
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// URL of a Cloudflare worker proxying the LLM
    ///
    /// Setting it switches the provider to `cloudflare_worker`.
    ///
    /// # Command Line
    /// Use `--worker-url <URL>` or `PHARMACOACH_WORKER_URL`
    #[arg(long, env = "PHARMACOACH_WORKER_URL")]
    pub worker_url: Option<String>,

    /// Directory for file-backed session storage
    ///
    /// Setting it switches session storage to the file backend.
    #[arg(long)]
    pub storage_path: Option<PathBuf>,
}

/// Application configuration.
///
/// Loaded from TOML; every section and field is optional and defaulted.
///
/// ```toml
/// [server]
/// bind_address = "0.0.0.0"
/// port = 8787
///
/// [sessions]
/// storage = "memory"      # or "file"
/// ttl_secs = 86400
/// max_sessions = 1000
///
/// [llm]
/// provider = "openai"     # "cloudflare_worker" or "disabled"
/// model = "gpt-4o-mini"
/// timeout_secs = 12
///
/// [analysis]
/// enabled = true
/// min_messages = 4
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sessions: SessionConfig,
    pub llm: LlmConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            error!("Unable to read configuration file {}: {}", path.display(), e);
            ConfigError::IoError(e)
        })?;
        Self::from_toml_str(&content)
    }

    /// File (or defaults), then command-line overrides, then validation.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config_file {
            Some(path) => {
                info!("Reading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                info!("No configuration file given, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, args: &CliArgs) {
        if let Some(address) = &args.bind_address {
            self.server.bind_address = address.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(key) = &args.api_key {
            self.llm.api_key = Some(key.clone());
        }
        if let Some(url) = &args.worker_url {
            self.llm.provider = LlmProvider::CloudflareWorker;
            self.llm.endpoint = Some(url.clone());
        }
        if let Some(path) = &args.storage_path {
            self.sessions.storage = StorageBackend::File;
            self.sessions.storage_path = Some(path.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind_address
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::BadIPFormatting(self.server.bind_address.clone()))?;

        if !(1..=120).contains(&self.llm.timeout_secs) {
            return Err(ConfigError::NotInRange(format!(
                "llm.timeout_secs must be between 1 and 120, got {}",
                self.llm.timeout_secs
            )));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::NotInRange(format!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.provider == LlmProvider::CloudflareWorker && self.llm.endpoint.is_none() {
            return Err(ConfigError::MissingValue(
                "llm.endpoint is required for the cloudflare_worker provider".to_string(),
            ));
        }
        if self.sessions.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::NotInRange(format!(
                "sessions.ttl_secs must be at most {}, got {}",
                MAX_SESSION_TTL_SECS, self.sessions.ttl_secs
            )));
        }
        if self.analysis.min_messages < 2 {
            return Err(ConfigError::NotInRange(format!(
                "analysis.min_messages must be at least 2, got {}",
                self.analysis.min_messages
            )));
        }
        Ok(())
    }

    /// Session lifetime as a chrono duration. Zero disables expiry.
    pub fn session_ttl(&self) -> Result<chrono::TimeDelta, ConfigError> {
        i64::try_from(self.sessions.ttl_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .ok_or_else(|| {
                ConfigError::NotInRange(format!(
                    "sessions.ttl_secs is out of range: {}",
                    self.sessions.ttl_secs
                ))
            })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .server
            .bind_address
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::BadIPFormatting(self.server.bind_address.clone()))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.sessions.storage, StorageBackend::Memory);
        assert_eq!(config.llm.timeout_secs, 12);
        assert_eq!(config.analysis.min_messages, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 9000

            [llm]
            provider = "cloudflare_worker"
            endpoint = "https://coach.example.workers.dev"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.llm.provider, LlmProvider::CloudflareWorker);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.sessions.ttl_secs, 86_400);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[server]\nport = \"high\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
        let err = Config::from_toml_str("[llm]\nprovider = \"gemini\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[sessions]\nstorage = \"file\"\nttl_secs = 60").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.sessions.storage, StorageBackend::File);
        assert_eq!(config.sessions.ttl_secs, 60);

        let missing = Config::from_file(Path::new("/nonexistent/pharmacoach.toml"));
        assert!(matches!(missing, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.server.bind_address = "localhost:80".into();
        assert!(matches!(config.validate(), Err(ConfigError::BadIPFormatting(_))));

        let mut config = Config::default();
        config.llm.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NotInRange(_))));

        let mut config = Config::default();
        config.llm.provider = LlmProvider::CloudflareWorker;
        assert!(matches!(config.validate(), Err(ConfigError::MissingValue(_))));

        let mut config = Config::default();
        config.analysis.min_messages = 1;
        assert!(matches!(config.validate(), Err(ConfigError::NotInRange(_))));
    }

    #[test]
    fn test_session_ttl_bounds() {
        let config = Config::from_toml_str("[sessions]\nttl_secs = 10000000000000000").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NotInRange(_))));
        assert!(matches!(config.session_ttl(), Err(ConfigError::NotInRange(_))));

        let mut config = Config::default();
        config.sessions.ttl_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::NotInRange(_))));
        assert!(matches!(config.session_ttl(), Err(ConfigError::NotInRange(_))));

        let mut config = Config::default();
        config.sessions.ttl_secs = MAX_SESSION_TTL_SECS;
        assert!(config.validate().is_ok());
        assert_eq!(
            config.session_ttl().unwrap(),
            chrono::TimeDelta::seconds(MAX_SESSION_TTL_SECS as i64)
        );

        config.sessions.ttl_secs = 0;
        assert_eq!(config.session_ttl().unwrap(), chrono::TimeDelta::zero());
    }

    #[test]
    #[serial]
    fn test_cli_overrides() {
        let args = CliArgs::try_parse_from([
            "pharmacoach",
            "--bind-address",
            "0.0.0.0",
            "--port",
            "3000",
            "--worker-url",
            "https://coach.example.workers.dev",
            "--storage-path",
            "/tmp/sessions",
        ])
        .unwrap_or_else(|e| panic!("{}", e));

        let config = Config::load(&args).unwrap();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");
        assert_eq!(config.llm.provider, LlmProvider::CloudflareWorker);
        assert_eq!(
            config.llm.endpoint.as_deref(),
            Some("https://coach.example.workers.dev")
        );
        assert_eq!(config.sessions.storage, StorageBackend::File);
        assert_eq!(config.sessions.storage_path, Some(PathBuf::from("/tmp/sessions")));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("PHARMACOACH_PORT", "4100");
        std::env::set_var("OPENAI_API_KEY", "sk-from-env");
        let args = CliArgs::try_parse_from(["pharmacoach"]);
        std::env::remove_var("PHARMACOACH_PORT");
        std::env::remove_var("OPENAI_API_KEY");

        let config = Config::load(&args.unwrap()).unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-from-env"));
    }
}
