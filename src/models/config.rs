//! Configuration data model and validation

use crate::models::metrics::Thresholds;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Host key policy for the remote server session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnownHostsPolicy {
    /// Refuse unknown or changed host keys
    Strict,
    /// Accept and record unknown host keys, refuse changed ones
    Add,
    /// Accept any host key
    Accept,
}

impl Default for KnownHostsPolicy {
    fn default() -> Self {
        Self::Strict
    }
}

impl FromStr for KnownHostsPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "add" => Ok(Self::Add),
            "accept" | "no" | "off" => Ok(Self::Accept),
            other => Err(AppError::config(format!(
                "Invalid known hosts policy '{}': expected strict, add or accept",
                other
            ))),
        }
    }
}

impl fmt::Display for KnownHostsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Strict => "strict",
            Self::Add => "add",
            Self::Accept => "accept",
        };
        f.write_str(name)
    }
}

/// Remote shell settings for starting and stopping the iperf3 server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshConfig {
    /// Login user on the server host
    pub user: String,

    #[serde(default = "default_ssh_port")]
    pub port: u16,

    /// Private key to authenticate with, otherwise the agent and ssh config are used
    #[serde(default)]
    pub identity_file: Option<PathBuf>,

    #[serde(default)]
    pub known_hosts: KnownHostsPolicy,

    #[serde(default = "default_ssh_connect_timeout_secs")]
    pub connect_timeout_seconds: u64,

    /// Pause after killing stale servers and after launching the new one
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
}

impl SshConfig {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            port: default_ssh_port(),
            identity_file: None,
            known_hosts: KnownHostsPolicy::default(),
            connect_timeout_seconds: default_ssh_connect_timeout_secs(),
            startup_delay_ms: default_startup_delay_ms(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

/// How results are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Table
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" | "text" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(AppError::config(format!("Invalid output format '{}': expected table or json", other))),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host running the iperf3 server
    #[serde(default)]
    pub server_host: Option<String>,

    /// iperf3 server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Echo requests sent by the reachability check
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    /// Per-reply wait for the reachability check
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_seconds: u64,

    /// Seconds between iperf3 interval reports
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_seconds: u32,

    /// Length of each benchmark pass, iperf3's own default when unset
    #[serde(default)]
    pub test_duration_seconds: Option<u32>,

    /// Upper bound on a single iperf3 invocation
    #[serde(default = "default_client_timeout_secs")]
    pub client_timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub run_tcp: bool,

    #[serde(default = "default_true")]
    pub run_udp: bool,

    /// Host with no server behind it, used to confirm that client errors surface
    #[serde(default)]
    pub unreachable_host: Option<String>,

    #[serde(default = "default_min_transfer_mb")]
    pub min_transfer_mb: f64,

    #[serde(default = "default_min_bitrate_mbps")]
    pub min_bitrate_mbps: f64,

    #[serde(default = "default_iperf3_path")]
    pub iperf3_path: String,

    #[serde(default = "default_ping_path")]
    pub ping_path: String,

    /// Remote server management, skipped when unset
    #[serde(default)]
    pub ssh: Option<SshConfig>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: None,
            port: default_port(),
            ping_count: default_ping_count(),
            ping_timeout_seconds: default_ping_timeout_secs(),
            report_interval_seconds: default_report_interval_secs(),
            test_duration_seconds: None,
            client_timeout_seconds: default_client_timeout_secs(),
            run_tcp: true,
            run_udp: true,
            unreachable_host: None,
            min_transfer_mb: default_min_transfer_mb(),
            min_bitrate_mbps: default_min_bitrate_mbps(),
            iperf3_path: default_iperf3_path(),
            ping_path: default_ping_path(),
            ssh: None,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.min_transfer_mb, self.min_bitrate_mbps)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_seconds)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_seconds)
    }

    /// The configured server host, required for live runs
    pub fn require_server_host(&self) -> Result<&str> {
        match self.server_host.as_deref() {
            Some(host) if !host.trim().is_empty() => Ok(host),
            _ => Err(AppError::config(
                "Server host is required: pass --server or set SERVER_HOST",
            )),
        }
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if let Some(host) = &self.server_host {
            validate_host("Server host", host)?;
        }

        if let Some(host) = &self.unreachable_host {
            validate_host("Unreachable host", host)?;
        }

        if self.port == 0 {
            return Err(AppError::config("Server port must be greater than 0"));
        }

        if self.ping_count == 0 {
            return Err(AppError::config("Ping count must be greater than 0"));
        }

        if self.ping_count > 100 {
            return Err(AppError::config("Ping count cannot exceed 100"));
        }

        if self.ping_timeout_seconds == 0 {
            return Err(AppError::config("Ping timeout must be greater than 0"));
        }

        if self.report_interval_seconds == 0 {
            return Err(AppError::config("Report interval must be greater than 0"));
        }

        if let Some(duration) = self.test_duration_seconds {
            if duration == 0 {
                return Err(AppError::config("Test duration must be greater than 0"));
            }
            if duration > 3600 {
                return Err(AppError::config("Test duration cannot exceed 3600 seconds"));
            }
            if u64::from(duration) >= self.client_timeout_seconds {
                return Err(AppError::config(format!(
                    "Client timeout ({}s) must be longer than the test duration ({}s)",
                    self.client_timeout_seconds, duration
                )));
            }
        }

        if self.client_timeout_seconds == 0 {
            return Err(AppError::config("Client timeout must be greater than 0"));
        }

        if !self.run_tcp && !self.run_udp {
            return Err(AppError::config("At least one of TCP or UDP must be enabled"));
        }

        for (name, value) in [
            ("Minimum transfer", self.min_transfer_mb),
            ("Minimum bitrate", self.min_bitrate_mbps),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.iperf3_path.trim().is_empty() {
            return Err(AppError::config("iperf3 path cannot be empty"));
        }

        if self.ping_path.trim().is_empty() {
            return Err(AppError::config("ping path cannot be empty"));
        }

        if let Some(ssh) = &self.ssh {
            if ssh.user.trim().is_empty() {
                return Err(AppError::config("SSH user cannot be empty"));
            }
            if ssh.port == 0 {
                return Err(AppError::config("SSH port must be greater than 0"));
            }
            if ssh.connect_timeout_seconds == 0 {
                return Err(AppError::config("SSH connect timeout must be greater than 0"));
            }
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            let host = host.trim();
            if !host.is_empty() {
                self.server_host = Some(host.to_string());
            }
        }

        if let Some(port) = parse_env("SERVER_PORT")? {
            self.port = port;
        }

        if let Some(count) = parse_env("PING_COUNT")? {
            self.ping_count = count;
        }

        if let Some(timeout) = parse_env("PING_TIMEOUT_SECONDS")? {
            self.ping_timeout_seconds = timeout;
        }

        if let Some(duration) = parse_env("TEST_DURATION_SECONDS")? {
            self.test_duration_seconds = Some(duration);
        }

        if let Some(timeout) = parse_env("CLIENT_TIMEOUT_SECONDS")? {
            self.client_timeout_seconds = timeout;
        }

        if let Some(min) = parse_env("MIN_TRANSFER_MB")? {
            self.min_transfer_mb = min;
        }

        if let Some(min) = parse_env("MIN_BITRATE_MBPS")? {
            self.min_bitrate_mbps = min;
        }

        if let Ok(user) = std::env::var("SSH_USER") {
            let user = user.trim();
            if !user.is_empty() {
                match &mut self.ssh {
                    Some(ssh) => ssh.user = user.to_string(),
                    None => self.ssh = Some(SshConfig::new(user)),
                }
            }
        }

        // the remaining SSH settings only apply once a user is known
        if let Some(ssh) = &mut self.ssh {
            if let Some(port) = parse_env("SSH_PORT")? {
                ssh.port = port;
            }

            if let Ok(identity) = std::env::var("SSH_IDENTITY_FILE") {
                if !identity.trim().is_empty() {
                    ssh.identity_file = Some(PathBuf::from(identity.trim()));
                }
            }

            if let Some(policy) = parse_env("SSH_KNOWN_HOSTS")? {
                ssh.known_hosts = policy;
            }
        }

        if let Some(enable_color) = parse_env("ENABLE_COLOR")? {
            self.enable_color = enable_color;
        }

        Ok(())
    }
}

fn validate_host(label: &str, host: &str) -> Result<()> {
    let host = host.trim();
    if host.is_empty() {
        return Err(AppError::config(format!("{} cannot be empty", label)));
    }
    if host.chars().any(|c| c.is_whitespace() || c == '/') || host.starts_with('-') {
        return Err(AppError::config(format!("{} '{}' is not a valid host name or address", label, host)));
    }
    Ok(())
}

fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}

// Default value functions for serde
fn default_port() -> u16 {
    crate::defaults::DEFAULT_PORT
}

fn default_ping_count() -> u32 {
    crate::defaults::DEFAULT_PING_COUNT
}

fn default_ping_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_PING_TIMEOUT.as_secs()
}

fn default_report_interval_secs() -> u32 {
    crate::defaults::DEFAULT_REPORT_INTERVAL_SECS
}

fn default_client_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_CLIENT_TIMEOUT.as_secs()
}

fn default_true() -> bool {
    true
}

fn default_min_transfer_mb() -> f64 {
    crate::defaults::DEFAULT_MIN_TRANSFER_MB
}

fn default_min_bitrate_mbps() -> f64 {
    crate::defaults::DEFAULT_MIN_BITRATE_MBPS
}

fn default_iperf3_path() -> String {
    crate::defaults::DEFAULT_IPERF3_PATH.to_string()
}

fn default_ping_path() -> String {
    crate::defaults::DEFAULT_PING_PATH.to_string()
}

fn default_ssh_port() -> u16 {
    crate::defaults::DEFAULT_SSH_PORT
}

fn default_ssh_connect_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_SSH_CONNECT_TIMEOUT.as_secs()
}

fn default_startup_delay_ms() -> u64 {
    crate::defaults::DEFAULT_SERVER_STARTUP_DELAY.as_millis() as u64
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
