//! Additional comprehensive tests for configuration parsing and validation

use super::{ConfigParser, EnvManager};
use crate::{cli::Cli, models::Config};
use clap::Parser;
use std::env;

/// Test edge cases in configuration values
mod config_edge_cases {
    use super::*;

    #[test]
    fn test_config_with_boundary_values() {
        let mut config = Config {
            server_host: Some("10.0.0.2".to_string()),
            ..Config::default()
        };

        config.ping_count = 100;
        config.test_duration_seconds = Some(3600);
        config.client_timeout_seconds = 3601;
        assert!(config.validate().is_ok());

        config.ping_count = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_with_ipv6_and_names() {
        for host in ["fe80::1", "2001:db8::10", "iperf.lab.internal", "10.1.2.3"] {
            let config = Config {
                server_host: Some(host.to_string()),
                ..Config::default()
            };
            assert!(config.validate().is_ok(), "{} should be accepted", host);
        }
    }

    #[test]
    fn test_zero_thresholds_are_valid() {
        let config = Config {
            min_transfer_mb: 0.0,
            min_bitrate_mbps: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}

/// Test environment variable parsing edge cases
mod env_parsing_tests {
    use super::*;

    #[test]
    fn test_env_var_boundary_values() {
        assert!(EnvManager::validate_env_var("PING_COUNT", "1").is_ok());
        assert!(EnvManager::validate_env_var("PING_COUNT", "100").is_ok());
        assert!(EnvManager::validate_env_var("SERVER_PORT", "65535").is_ok());
        assert!(EnvManager::validate_env_var("MIN_TRANSFER_MB", "0").is_ok());

        assert!(EnvManager::validate_env_var("PING_COUNT", "0").is_err());
        assert!(EnvManager::validate_env_var("SERVER_PORT", "65536").is_err());
    }

    #[test]
    fn test_env_var_boolean_validation() {
        // Boolean values are case sensitive
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "true").is_ok());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "false").is_ok());

        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "TRUE").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "yes").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "1").is_err());
    }

    #[test]
    fn test_env_var_float_forms() {
        assert!(EnvManager::validate_env_var("MIN_BITRATE_MBPS", "20").is_ok());
        assert!(EnvManager::validate_env_var("MIN_BITRATE_MBPS", "20.5").is_ok());
        assert!(EnvManager::validate_env_var("MIN_BITRATE_MBPS", "2e1").is_ok());

        assert!(EnvManager::validate_env_var("MIN_BITRATE_MBPS", "NaN").is_err());
        assert!(EnvManager::validate_env_var("MIN_BITRATE_MBPS", "inf").is_err());
    }
}

/// Test configuration merging priorities
mod config_priority_tests {
    use super::*;
    use std::sync::Mutex;

    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 4] = ["MIN_TRANSFER_MB", "MIN_BITRATE_MBPS", "PING_COUNT", "SERVER_PORT"];

    fn clear_vars() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_priority_order() {
        let _guard = TEST_MUTEX.lock().unwrap();
        clear_vars();

        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(
            &env_file,
            "MIN_TRANSFER_MB=3.0\nMIN_BITRATE_MBPS=30.0\nPING_COUNT=6\n",
        )
        .unwrap();

        // the environment beats the .env file
        env::set_var("MIN_BITRATE_MBPS", "40.0");
        env::set_var("PING_COUNT", "8");

        // the command line beats both
        let cli = Cli::parse_from(["ntv", "--server", "10.0.0.2", "--min-bitrate", "50"]);
        let result = ConfigParser::new(cli).with_env_file(&env_file).parse();
        clear_vars();

        let config = result.unwrap();
        assert_eq!(config.min_transfer_mb, 3.0);
        assert_eq!(config.ping_count, 8);
        assert_eq!(config.min_bitrate_mbps, 50.0);
        assert_eq!(config.port, 5201);
    }

    #[test]
    fn test_invalid_env_value_is_config_error() {
        let _guard = TEST_MUTEX.lock().unwrap();
        clear_vars();

        env::set_var("SERVER_PORT", "not-a-port");
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["ntv", "--server", "10.0.0.2"]);
        let result = ConfigParser::new(cli).with_env_file(dir.path().join(".env")).parse();
        clear_vars();

        match result {
            Err(crate::error::AppError::Config(message)) => assert!(message.contains("SERVER_PORT")),
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }
}

/// Test error message quality and helpfulness
mod error_message_tests {
    use super::*;

    #[test]
    fn test_error_messages_are_helpful() {
        let err = EnvManager::validate_env_var("PING_COUNT", "0").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("PING_COUNT"));
        assert!(message.contains("between 1 and 100"));

        let err = EnvManager::validate_env_var("SSH_KNOWN_HOSTS", "sometimes").unwrap_err();
        assert!(err.to_string().contains("strict, add or accept"));
    }
}

/// Test concurrent configuration operations
mod concurrency_tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_validation() {
        let handles: Vec<_> = (0..10)
            .map(|i| {
                thread::spawn(move || {
                    let config = Config {
                        server_host: Some(format!("10.0.0.{}", i + 1)),
                        ping_count: (i % 50 + 1) as u32,
                        min_bitrate_mbps: i as f64 * 10.0,
                        ..Config::default()
                    };
                    assert!(config.validate().is_ok());
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
