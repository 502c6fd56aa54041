//! Configuration validation utilities and rules

use crate::{
    error::Result,
    models::{config::KnownHostsPolicy, Config},
};
use colored::Colorize;

/// iperf3 sends UDP at this rate unless told otherwise
const IPERF3_DEFAULT_UDP_MBPS: f64 = 1.0;

/// Configuration validator with advisory rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration and collect non-fatal warnings
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        // Hard errors come from Config::validate
        config.validate()?;

        warnings.extend(Self::validate_thresholds(config));
        warnings.extend(Self::validate_timing(config));
        warnings.extend(Self::validate_remote_settings(config));
        warnings.extend(Self::validate_unreachable_host(config));

        Ok(warnings)
    }

    fn validate_thresholds(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.min_transfer_mb == 0.0 && config.min_bitrate_mbps == 0.0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "Both thresholds are zero, any interval with traffic will pass".to_string(),
            ));
        }

        if config.run_udp && config.min_bitrate_mbps >= IPERF3_DEFAULT_UDP_MBPS {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "UDP runs at iperf3's default {} Mbit/s, which cannot exceed the {} Mbit/s minimum",
                    IPERF3_DEFAULT_UDP_MBPS, config.min_bitrate_mbps
                ),
            ));
        }

        warnings
    }

    fn validate_timing(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.ping_count < 2 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "A single echo request makes the reachability check sensitive to packet loss".to_string(),
            ));
        }

        if let Some(duration) = config.test_duration_seconds {
            if duration < 3 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("Test duration of {}s yields very few intervals to evaluate", duration),
                ));
            }

            if duration < config.report_interval_seconds {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!(
                        "Report interval ({}s) is longer than the test duration ({}s)",
                        config.report_interval_seconds, duration
                    ),
                ));
            }

            if config.run_udp && duration > 60 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("UDP test of {}s will take a long time", duration),
                ));
            }
        }

        warnings
    }

    fn validate_remote_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        match &config.ssh {
            None => warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "No SSH user configured, an iperf3 server must already be running on the target".to_string(),
            )),
            Some(ssh) => {
                if ssh.known_hosts == KnownHostsPolicy::Accept {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Warning,
                        "SSH host key checking is disabled".to_string(),
                    ));
                }

                if let Some(identity) = &ssh.identity_file {
                    if !identity.exists() {
                        warnings.push(ValidationWarning::new(
                            ValidationLevel::Warning,
                            format!("SSH identity file {} does not exist", identity.display()),
                        ));
                    }
                }

                if ssh.startup_delay_ms < 200 {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Info,
                        format!("Server startup delay of {}ms may be too short", ssh.startup_delay_ms),
                    ));
                }
            }
        }

        warnings
    }

    fn validate_unreachable_host(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if let (Some(host), Some(server)) = (&config.unreachable_host, &config.server_host) {
            if host.trim() == server.trim() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("Unreachable host {} is the server itself, the check will not fail", host),
                ));
            }
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// Get color for terminal display
    pub fn color(&self) -> &'static str {
        match self {
            Self::Info => "blue",
            Self::Warning => "yellow",
            Self::Error => "red",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        if use_color {
            format!("{} {}", tag.color(self.level.color()).bold(), self.message)
        } else {
            format!("{} {}", tag, self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
