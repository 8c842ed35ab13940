//! Configuration management for the Raft/Badge indexer.
//!
//! Configuration is loaded from a TOML file. `${VAR_NAME}` placeholders are
//! replaced with environment variables before parsing, except inside
//! comments. Omitted optional settings fall back to defaults.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network configuration
    pub network: NetworkConfig,

    /// Contract addresses
    pub contracts: ContractsConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Sync configuration
    #[serde(default)]
    pub sync: SyncConfig,

    /// IPFS gateway configuration
    #[serde(default)]
    pub ipfs: IpfsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Ethereum RPC URL
    pub rpc_url: String,

    /// Chain ID (e.g., 10 for Optimism)
    pub chain_id: u64,
}

/// Contract addresses configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Raft contract (Transfer, MetadataUpdate)
    pub raft: Address,

    /// Badges contract (Transfer, SpecCreated, RefreshMetadata)
    pub badges: Address,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://raftbadge.db")
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Block number to start syncing from (0 = from genesis)
    #[serde(default)]
    pub start_block: u64,

    /// Polling interval in seconds for new blocks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Batch size for historical sync (number of blocks per batch)
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Number of confirmations to wait before processing blocks
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            start_block: 0,
            poll_interval_secs: default_poll_interval_secs(),
            batch_size: default_batch_size(),
            confirmations: default_confirmations(),
        }
    }
}

/// IPFS gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpfsConfig {
    /// Path gateway base URL; keys are appended to it
    #[serde(default = "default_ipfs_gateway")]
    pub gateway: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_ipfs_timeout_secs")]
    pub timeout_secs: u64,

    /// Largest metadata document accepted, in bytes
    #[serde(default = "default_ipfs_max_bytes")]
    pub max_bytes: usize,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            gateway: default_ipfs_gateway(),
            timeout_secs: default_ipfs_timeout_secs(),
            max_bytes: default_ipfs_max_bytes(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_poll_interval_secs() -> u64 {
    12
}

fn default_batch_size() -> u64 {
    1000
}

fn default_confirmations() -> u64 {
    6
}

fn default_ipfs_gateway() -> String {
    "https://ipfs.io/ipfs/".to_string()
}

fn default_ipfs_timeout_secs() -> u64 {
    10
}

fn default_ipfs_max_bytes() -> usize {
    1_000_000 // 1 MB
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables can be referenced using `${VAR_NAME}` syntax,
    /// e.g. `rpc_url = "${RPC_URL}"`.
    ///
    /// # Example
    /// ```no_run
    /// # use raftbadge_indexer::config::Config;
    /// let config = Config::from_file("indexer.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let expanded = expand_env_vars(&contents)?;

        let config: Config = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML string (no env expansion).
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml).context("Failed to parse TOML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.network.rpc_url.is_empty() {
            anyhow::bail!("Network RPC URL cannot be empty");
        }
        if self.network.chain_id == 0 {
            anyhow::bail!("Chain ID must be non-zero");
        }

        if self.contracts.raft.is_zero() {
            anyhow::bail!("Contracts raft must be a non-zero address");
        }
        if self.contracts.badges.is_zero() {
            anyhow::bail!("Contracts badges must be a non-zero address");
        }
        if self.contracts.raft == self.contracts.badges {
            anyhow::bail!("Contracts raft and badges must be different addresses");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be > 0");
        }
        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot exceed max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.sync.poll_interval_secs == 0 {
            anyhow::bail!("Sync poll_interval_secs must be > 0");
        }
        if self.sync.batch_size == 0 {
            anyhow::bail!("Sync batch_size must be > 0");
        }

        let gateway = self.ipfs.gateway.trim();
        if !(gateway.starts_with("http://") || gateway.starts_with("https://")) {
            anyhow::bail!(
                "IPFS gateway must be an http(s) URL (got '{}')",
                self.ipfs.gateway
            );
        }
        if self.ipfs.timeout_secs == 0 {
            anyhow::bail!("IPFS timeout_secs must be > 0");
        }
        if self.ipfs.max_bytes == 0 {
            anyhow::bail!("IPFS max_bytes must be > 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Logging level must be one of: {} (got '{}')",
                valid_levels.join(", "),
                self.logging.level
            );
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "Logging format must be one of: {} (got '{}')",
                valid_formats.join(", "),
                self.logging.format
            );
        }

        Ok(())
    }
}

/// Expand `${VAR_NAME}` placeholders, leaving comments untouched.
///
/// A `#` starts a comment only outside quoted strings. Multi-line strings
/// are not tracked, so a `#` at the start of a line inside `"""` is treated
/// as a comment.
pub fn expand_env_vars(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());

    for (line_no, line) in input.split_inclusive('\n').enumerate() {
        let (code, comment) = split_comment(line);
        let mut rest = code;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                anyhow::bail!(
                    "Unclosed environment variable placeholder on line {}",
                    line_no + 1
                );
            };

            let name = &after[..end];
            if name.is_empty() {
                anyhow::bail!("Empty environment variable name on line {}", line_no + 1);
            }

            let value = std::env::var(name).with_context(|| {
                format!(
                    "Environment variable '{}' is not set (referenced on line {})",
                    name,
                    line_no + 1
                )
            })?;
            out.push_str(&value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        out.push_str(comment);
    }

    Ok(out)
}

/// Split a line into its code part and trailing comment (including `#`).
fn split_comment(line: &str) -> (&str, &str) {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some('"'), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '#') => return line.split_at(idx),
            _ => {}
        }
    }

    (line, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
[network]
rpc_url = "https://mainnet.optimism.io"
chain_id = 10

[contracts]
raft = "0x1111111111111111111111111111111111111111"
badges = "0x2222222222222222222222222222222222222222"

[database]
url = "sqlite://raftbadge.db"
"#;

    #[test]
    fn test_load_minimal_config_with_defaults() {
        let config = Config::from_toml_str(BASE).unwrap();
        assert_eq!(config.network.chain_id, 10);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.sync.start_block, 0);
        assert_eq!(config.sync.poll_interval_secs, 12);
        assert_eq!(config.sync.batch_size, 1000);
        assert_eq!(config.sync.confirmations, 6);
        assert_eq!(config.ipfs.gateway, "https://ipfs.io/ipfs/");
        assert_eq!(config.ipfs.timeout_secs, 10);
        assert_eq!(config.ipfs.max_bytes, 1_000_000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_full_config() {
        let toml = format!(
            "{BASE}
[sync]
start_block = 71000000
poll_interval_secs = 4
batch_size = 500
confirmations = 2

[ipfs]
gateway = \"https://gateway.example.com/ipfs\"
timeout_secs = 30
max_bytes = 2048

[logging]
level = \"debug\"
format = \"json\"
"
        );

        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(config.sync.start_block, 71_000_000);
        assert_eq!(config.sync.confirmations, 2);
        assert_eq!(config.ipfs.max_bytes, 2048);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_validation_empty_rpc_url() {
        let toml = BASE.replace("https://mainnet.optimism.io", "");
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("RPC URL"));
    }

    #[test]
    fn test_validation_zero_badges_address() {
        let toml = BASE.replace(
            "0x2222222222222222222222222222222222222222",
            "0x0000000000000000000000000000000000000000",
        );
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("badges"));
    }

    #[test]
    fn test_validation_same_contract_addresses() {
        let toml = BASE.replace(
            "0x2222222222222222222222222222222222222222",
            "0x1111111111111111111111111111111111111111",
        );
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("different"));
    }

    #[test]
    fn test_validation_bad_gateway_scheme() {
        let toml = format!("{BASE}\n[ipfs]\ngateway = \"ipfs://local\"\n");
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("IPFS gateway"));
    }

    #[test]
    fn test_validation_bad_log_format() {
        let toml = format!("{BASE}\n[logging]\nformat = \"xml\"\n");
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("Logging format"));
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("RAFTBADGE_TEST_RPC", "https://rpc.example.com");
        let out = expand_env_vars("rpc_url = \"${RAFTBADGE_TEST_RPC}\"\n").unwrap();
        assert_eq!(out, "rpc_url = \"https://rpc.example.com\"\n");
        std::env::remove_var("RAFTBADGE_TEST_RPC");
    }

    #[test]
    fn test_expand_env_vars_undefined() {
        let err = expand_env_vars("x = \"${RAFTBADGE_DEFINITELY_UNSET}\"").unwrap_err();
        assert!(err.to_string().contains("RAFTBADGE_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_expand_env_vars_empty_and_unclosed() {
        assert!(expand_env_vars("x = \"${}\"").is_err());
        assert!(expand_env_vars("x = \"${OPEN\"").is_err());
    }

    #[test]
    fn test_expand_env_vars_skips_comments() {
        std::env::set_var("RAFTBADGE_TEST_GATEWAY", "https://gw.example.com/ipfs/");
        let input = "# gateway = \"${UNSET_IN_COMMENT}\"\ngateway = \"${RAFTBADGE_TEST_GATEWAY}\" # ${ALSO_UNSET}\n";
        let out = expand_env_vars(input).unwrap();
        assert!(out.contains("${UNSET_IN_COMMENT}"));
        assert!(out.contains("${ALSO_UNSET}"));
        assert!(out.contains("https://gw.example.com/ipfs/"));
        std::env::remove_var("RAFTBADGE_TEST_GATEWAY");
    }

    #[test]
    fn test_expand_env_vars_hash_inside_string() {
        std::env::set_var("RAFTBADGE_TEST_SUFFIX", "token");
        let out = expand_env_vars(r#"rpc_url = "https://example.com/#${RAFTBADGE_TEST_SUFFIX}""#)
            .unwrap();
        assert_eq!(out, r#"rpc_url = "https://example.com/#token""#);
        std::env::remove_var("RAFTBADGE_TEST_SUFFIX");
    }

    #[test]
    fn test_split_comment_respects_escapes() {
        let (code, comment) = split_comment(r#"k = "a \" # b" # real"#);
        assert_eq!(code, r#"k = "a \" # b" "#);
        assert_eq!(comment, "# real");
    }
}
