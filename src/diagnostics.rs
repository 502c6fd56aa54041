//! Reachability pre-check for the benchmark target
//!
//! A run only starts when the server host answers ICMP echo requests. The
//! check shells out to the system `ping` so it needs no raw-socket privileges.

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Outcome of a reachability check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReachabilityReport {
    pub host: String,
    pub reachable: bool,
    /// Combined ping output, or the launch error when ping could not run
    pub output: String,
    /// Packet loss from ping's summary line, when present
    pub packet_loss_percent: Option<f64>,
    pub duration_ms: f64,
}

impl ReachabilityReport {
    pub fn unreachable(host: &str, output: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            host: host.to_string(),
            reachable: false,
            output: output.into(),
            packet_loss_percent: None,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }
}

/// Decides whether a host can be reached before any benchmark runs
#[async_trait]
pub trait ReachabilityChecker: Send + Sync {
    async fn check(&self, host: &str) -> Result<ReachabilityReport>;
}

/// Reachability through the system `ping` command
#[derive(Debug, Clone)]
pub struct PingChecker {
    ping_path: String,
    count: u32,
    per_packet_timeout: Duration,
}

impl PingChecker {
    pub fn new(ping_path: impl Into<String>, count: u32, per_packet_timeout: Duration) -> Self {
        Self {
            ping_path: ping_path.into(),
            count,
            per_packet_timeout,
        }
    }

    pub fn from_config(config: &crate::models::Config) -> Self {
        Self::new(config.ping_path.clone(), config.ping_count, config.ping_timeout())
    }

    /// Arguments passed to ping for `host`
    pub fn args(&self, host: &str) -> Vec<String> {
        vec![
            "-c".to_string(),
            self.count.to_string(),
            "-W".to_string(),
            self.per_packet_timeout.as_secs().max(1).to_string(),
            host.to_string(),
        ]
    }

    /// Upper bound on the whole ping run
    ///
    /// ping waits up to one second between requests plus the reply timeout
    /// for the last one, so the limit leaves room for both.
    pub fn overall_timeout(&self) -> Duration {
        let per_packet = self.per_packet_timeout.max(Duration::from_secs(1));
        per_packet * (self.count + 1) + Duration::from_secs(self.count as u64) + Duration::from_secs(2)
    }
}

#[async_trait]
impl ReachabilityChecker for PingChecker {
    async fn check(&self, host: &str) -> Result<ReachabilityReport> {
        let started = Instant::now();
        let child = Command::new(&self.ping_path)
            .args(self.args(host))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.overall_timeout(), child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Ok(ReachabilityReport::unreachable(
                    host,
                    format!("Failed to run {}: {}", self.ping_path, e),
                    started.elapsed(),
                ));
            }
            Err(_) => {
                return Ok(ReachabilityReport::unreachable(
                    host,
                    format!("{} did not finish within {:?}", self.ping_path, self.overall_timeout()),
                    started.elapsed(),
                ));
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }

        Ok(ReachabilityReport {
            host: host.to_string(),
            reachable: output.status.success(),
            packet_loss_percent: parse_packet_loss(&text),
            output: text,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

static PACKET_LOSS: OnceLock<Option<Regex>> = OnceLock::new();

/// Compiled once and shared by every check
fn packet_loss_pattern() -> Option<&'static Regex> {
    PACKET_LOSS
        .get_or_init(|| Regex::new(r"([\d.]+)% packet loss").ok())
        .as_ref()
}

/// Extract the loss percentage from ping's statistics line
pub fn parse_packet_loss(output: &str) -> Option<f64> {
    packet_loss_pattern()?
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX_PING: &str = "\
PING 192.168.1.100 (192.168.1.100) 56(84) bytes of data.
64 bytes from 192.168.1.100: icmp_seq=1 ttl=64 time=0.412 ms
64 bytes from 192.168.1.100: icmp_seq=2 ttl=64 time=0.388 ms

--- 192.168.1.100 ping statistics ---
4 packets transmitted, 4 received, 0% packet loss, time 3055ms
rtt min/avg/max/mdev = 0.351/0.390/0.412/0.022 ms
";

    #[test]
    fn test_args_match_ping_conventions() {
        let checker = PingChecker::new("ping", 4, Duration::from_secs(2));
        assert_eq!(checker.args("10.0.0.2"), vec!["-c", "4", "-W", "2", "10.0.0.2"]);
    }

    #[test]
    fn test_sub_second_timeout_rounds_up() {
        let checker = PingChecker::new("ping", 1, Duration::from_millis(300));
        assert_eq!(checker.args("h")[3], "1");
    }

    #[test]
    fn test_overall_timeout_covers_all_requests() {
        let checker = PingChecker::new("ping", 4, Duration::from_secs(2));
        assert!(checker.overall_timeout() >= Duration::from_secs(4 * 2 + 4));
    }

    #[test]
    fn test_parse_packet_loss() {
        assert_eq!(parse_packet_loss(LINUX_PING), Some(0.0));
        assert_eq!(
            parse_packet_loss("4 packets transmitted, 1 packets received, 75.0% packet loss"),
            Some(75.0)
        );
        assert_eq!(parse_packet_loss("ping: unknown host nowhere"), None);
    }

    #[test]
    fn test_packet_loss_pattern_is_compiled_once() {
        let first = packet_loss_pattern().unwrap();
        assert_eq!(parse_packet_loss(LINUX_PING), Some(0.0));
        let second = packet_loss_pattern().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_unreachable() {
        let checker = PingChecker::new("/nonexistent/ping-binary", 1, Duration::from_secs(1));
        let report = checker.check("127.0.0.1").await.unwrap();

        assert!(!report.reachable);
        assert!(report.output.contains("Failed to run"));
        assert_eq!(report.host, "127.0.0.1");
    }
}
