//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::models::config::{KnownHostsPolicy, OutputFormat};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load a .env file if it exists
    ///
    /// Variables already present in the process environment are not
    /// overwritten, so real environment values take precedence over the file.
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Network Throughput Validator Configuration
#
# Values here are used as defaults. Environment variables and command-line
# arguments override them.

# Host running the iperf3 server (required for live runs)
# SERVER_HOST=192.168.1.100

# iperf3 server port
# SERVER_PORT=5201

# Reachability check: echo requests and per-reply timeout
# PING_COUNT=4
# PING_TIMEOUT_SECONDS=2

# Length of each benchmark pass, and the hard limit on one iperf3 run
# TEST_DURATION_SECONDS=10
# CLIENT_TIMEOUT_SECONDS=60

# Per-interval minimums a run must exceed in at least one interval
# MIN_TRANSFER_MB=2.0
# MIN_BITRATE_MBPS=20.0

# Remote server management over SSH (skipped when SSH_USER is unset)
# SSH_USER=root
# SSH_PORT=22
# SSH_IDENTITY_FILE=~/.ssh/id_ed25519
# SSH_KNOWN_HOSTS=strict

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "SERVER_HOST" => {
                if value.is_empty() || value.contains(char::is_whitespace) {
                    return Err(AppError::config(format!("Invalid SERVER_HOST value '{}'", value)));
                }
            }
            "SERVER_PORT" | "SSH_PORT" => {
                let port: u16 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if port == 0 {
                    return Err(AppError::config(format!("{} must be between 1 and 65535", key)));
                }
            }
            "PING_COUNT" => {
                let count: u32 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid PING_COUNT value '{}': {}", value, e)))?;
                if count == 0 || count > 100 {
                    return Err(AppError::config(format!("PING_COUNT must be between 1 and 100, got: {}", count)));
                }
            }
            "PING_TIMEOUT_SECONDS" | "TEST_DURATION_SECONDS" | "CLIENT_TIMEOUT_SECONDS" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if secs == 0 {
                    return Err(AppError::config(format!("{} must be greater than 0", key)));
                }
            }
            "MIN_TRANSFER_MB" | "MIN_BITRATE_MBPS" => {
                let min: f64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if !min.is_finite() || min < 0.0 {
                    return Err(AppError::config(format!("{} must be a non-negative number, got: {}", key, value)));
                }
            }
            "SSH_USER" | "SSH_IDENTITY_FILE" => {
                if value.is_empty() {
                    return Err(AppError::config(format!("{} cannot be empty", key)));
                }
            }
            "SSH_KNOWN_HOSTS" => {
                value.parse::<KnownHostsPolicy>()?;
            }
            "OUTPUT_FORMAT" => {
                value.parse::<OutputFormat>()?;
            }
            "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SERVER_HOST", "Host running the iperf3 server", "192.168.1.100"),
            ("SERVER_PORT", "iperf3 server port", "5201"),
            ("PING_COUNT", "Echo requests for the reachability check (1-100)", "4"),
            ("PING_TIMEOUT_SECONDS", "Per-reply ping timeout in seconds", "2"),
            ("TEST_DURATION_SECONDS", "Length of each benchmark pass", "10"),
            ("CLIENT_TIMEOUT_SECONDS", "Hard limit on one iperf3 run", "60"),
            ("MIN_TRANSFER_MB", "Minimum transfer per interval in MB", "2.0"),
            ("MIN_BITRATE_MBPS", "Minimum bitrate per interval in Mbit/s", "20.0"),
            ("SSH_USER", "Login user for remote server management", "root"),
            ("SSH_PORT", "SSH port on the server host", "22"),
            ("SSH_IDENTITY_FILE", "Private key for the SSH session", "~/.ssh/id_ed25519"),
            ("SSH_KNOWN_HOSTS", "Host key policy: strict, add or accept", "strict"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<24} {}\n", var, description));
            help.push_str(&format!("  {:<24} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                if let Err(e) = Self::validate_env_var(var_name, &value) {
                    warnings.push(format!("Warning: {}", e));
                }
            }
        }

        Ok(warnings)
    }

    /// Check a .env file and validate its contents
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut warnings = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"');
                if let Err(e) = Self::validate_env_var(key.trim(), value) {
                    warnings.push(format!("Line '{}': {}", line, e));
                }
            }
        }

        Ok(Some(warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_content_lists_every_variable() {
        let content = EnvManager::create_example_env_content();

        for (name, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("{}=", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_validate_env_var() {
        assert!(EnvManager::validate_env_var("SERVER_HOST", "10.0.0.2").is_ok());
        assert!(EnvManager::validate_env_var("SERVER_PORT", "5201").is_ok());
        assert!(EnvManager::validate_env_var("PING_COUNT", "4").is_ok());
        assert!(EnvManager::validate_env_var("MIN_TRANSFER_MB", "2.5").is_ok());
        assert!(EnvManager::validate_env_var("SSH_KNOWN_HOSTS", "add").is_ok());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "false").is_ok());
        assert!(EnvManager::validate_env_var("SOMETHING_ELSE", "anything").is_ok());

        assert!(EnvManager::validate_env_var("SERVER_HOST", "two words").is_err());
        assert!(EnvManager::validate_env_var("SERVER_PORT", "0").is_err());
        assert!(EnvManager::validate_env_var("SERVER_PORT", "70000").is_err());
        assert!(EnvManager::validate_env_var("PING_COUNT", "101").is_err());
        assert!(EnvManager::validate_env_var("CLIENT_TIMEOUT_SECONDS", "0").is_err());
        assert!(EnvManager::validate_env_var("MIN_BITRATE_MBPS", "-3").is_err());
        assert!(EnvManager::validate_env_var("MIN_BITRATE_MBPS", "fast").is_err());
        assert!(EnvManager::validate_env_var("SSH_KNOWN_HOSTS", "sometimes").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "maybe").is_err());
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();

        assert!(help.contains("Supported Environment Variables:"));
        assert!(help.contains("SERVER_HOST"));
        assert!(help.contains("MIN_BITRATE_MBPS"));
        assert!(help.contains("Configuration Priority"));
    }

    #[test]
    fn test_check_env_file_reports_bad_lines() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            "# comment\nSERVER_HOST=10.0.0.2\nPING_COUNT=zero\nMIN_TRANSFER_MB=\"3.0\"\n",
        )
        .unwrap();

        let warnings = EnvManager::check_env_file(temp_file.path()).unwrap().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("PING_COUNT"));
    }

    #[test]
    fn test_check_missing_env_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EnvManager::check_env_file(&dir.path().join(".env")).unwrap().is_none());
    }
}
