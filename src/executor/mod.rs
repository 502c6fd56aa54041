//! Test execution engine
//!
//! The runner sequences one validation run:
//! - reachability check, aborting the run when the host does not answer
//! - remote server scope, when SSH is configured
//! - TCP pass, then the optional unreachable-host check, then the optional UDP pass
//!
//! Each pass feeds the client's output through the parse, evaluate and
//! summarize pipeline.

use crate::{
    client::{BenchmarkClient, BenchmarkOutput, BenchmarkRequest},
    diagnostics::{ReachabilityChecker, ReachabilityReport},
    error::{AppError, Result},
    evaluation::ThresholdEvaluator,
    logging::RunLogger,
    models::{Config, EvaluationResult, IntervalRecord, Summary, Thresholds},
    parser::OutputParser,
    remote::{with_server, RemoteServerController},
    stats::SummaryAggregator,
    types::{TestStatus, Transport},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};

/// How one transport pass ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransportOutcome {
    /// The client reported an error, its output was not parsed
    InvocationError { stderr: String },
    Completed {
        records: Vec<IntervalRecord>,
        evaluation: EvaluationResult,
        summary: Summary,
    },
}

impl TransportOutcome {
    pub fn status(&self) -> TestStatus {
        match self {
            Self::InvocationError { .. } => TestStatus::Errored,
            Self::Completed { evaluation, .. } if evaluation.passed => TestStatus::Passed,
            Self::Completed { .. } => TestStatus::Failed,
        }
    }

    pub fn evaluation(&self) -> Option<&EvaluationResult> {
        match self {
            Self::Completed { evaluation, .. } => Some(evaluation),
            Self::InvocationError { .. } => None,
        }
    }
}

/// Result of one TCP or UDP pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportReport {
    pub transport: Transport,
    #[serde(flatten)]
    pub outcome: TransportOutcome,
}

impl TransportReport {
    pub fn status(&self) -> TestStatus {
        self.outcome.status()
    }

    pub fn evaluation(&self) -> Option<&EvaluationResult> {
        self.outcome.evaluation()
    }
}

/// Client run against a host that should not answer
///
/// Checks that a failed connection is noticed at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreachableHostReport {
    pub host: String,
    pub detected_error: bool,
    pub stderr: String,
}

/// Everything one validation run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub target: String,
    pub port: u16,
    pub reachability: ReachabilityReport,
    pub transports: Vec<TransportReport>,
    pub unreachable_check: Option<UnreachableHostReport>,
    /// Error text from starting the remote server, or from connecting to it
    pub server_startup_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub session_id: String,
}

impl RunReport {
    /// True when every transport passed, the server started cleanly and the
    /// unreachable-host check, if any, saw its error
    pub fn passed(&self) -> bool {
        !self.transports.is_empty()
            && self.transports.iter().all(|t| t.status().is_success())
            && self.server_startup_error.is_none()
            && self.unreachable_check.as_ref().map_or(true, |check| check.detected_error)
    }

    pub fn transport(&self, transport: Transport) -> Option<&TransportReport> {
        self.transports.iter().find(|t| t.transport == transport)
    }

    /// One line per failed check, empty when the run passed
    pub fn failures(&self) -> Vec<String> {
        let mut failures = Vec::new();

        if let Some(ref error) = self.server_startup_error {
            failures.push(format!("server startup: {}", error));
        }

        for report in &self.transports {
            match report.status() {
                TestStatus::Passed => {}
                TestStatus::Failed => failures.push(format!(
                    "{}: no interval above the thresholds",
                    report.transport
                )),
                TestStatus::Errored => failures.push(format!("{}: client reported an error", report.transport)),
            }
        }

        if let Some(ref check) = self.unreachable_check {
            if !check.detected_error {
                failures.push(format!("unreachable host: no error reported for {}", check.host));
            }
        }

        failures
    }

    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }
}

/// Runs the core pipeline over captured client output
#[derive(Debug, Clone)]
pub struct Pipeline {
    parser: OutputParser,
    evaluator: ThresholdEvaluator,
    aggregator: SummaryAggregator,
}

impl Pipeline {
    pub fn new(thresholds: Thresholds) -> Result<Self> {
        Ok(Self {
            parser: OutputParser::new()?,
            evaluator: ThresholdEvaluator::new(thresholds),
            aggregator: SummaryAggregator::new(),
        })
    }

    /// Parse, evaluate and summarize one block of iperf3 output
    pub fn process(&self, text: &str) -> TransportOutcome {
        let records = self.parser.parse_intervals(text);
        let evaluation = self.evaluator.evaluate(&records);
        let summary = self.aggregator.summarize(&records);

        TransportOutcome::Completed {
            records,
            evaluation,
            summary,
        }
    }

    /// Outcome for a client invocation, skipping the parse when it errored
    pub fn process_output(&self, output: &BenchmarkOutput) -> TransportOutcome {
        if output.has_error() {
            TransportOutcome::InvocationError {
                stderr: output.stderr.trim().to_string(),
            }
        } else {
            self.process(&output.stdout)
        }
    }
}

/// Evaluate saved iperf3 output without running anything
pub fn evaluate_text(text: &str, thresholds: Thresholds) -> Result<TransportOutcome> {
    Ok(Pipeline::new(thresholds)?.process(text))
}

/// Verdict over client output read from a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineReport {
    /// Where the output came from
    pub source: String,
    #[serde(flatten)]
    pub outcome: TransportOutcome,
}

impl OfflineReport {
    pub fn from_text(source: impl Into<String>, text: &str, thresholds: Thresholds) -> Result<Self> {
        Ok(Self {
            source: source.into(),
            outcome: evaluate_text(text, thresholds)?,
        })
    }

    pub fn status(&self) -> TestStatus {
        self.outcome.status()
    }

    pub fn passed(&self) -> bool {
        self.status().is_success()
    }
}

/// Sequences a full validation run against one server
pub struct TestRunner {
    config: Config,
    checker: Arc<dyn ReachabilityChecker>,
    client: Arc<dyn BenchmarkClient>,
    remote: Option<Arc<dyn RemoteServerController>>,
    pipeline: Pipeline,
    logger: Arc<RunLogger>,
    session_id: String,
}

impl TestRunner {
    pub fn new(
        config: Config,
        checker: Arc<dyn ReachabilityChecker>,
        client: Arc<dyn BenchmarkClient>,
        logger: Arc<RunLogger>,
    ) -> Result<Self> {
        let pipeline = Pipeline::new(config.thresholds())?;
        Ok(Self {
            config,
            checker,
            client,
            remote: None,
            pipeline,
            logger,
            session_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Start and stop the server through `remote` around the passes
    pub fn with_remote(mut self, remote: Arc<dyn RemoteServerController>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the run
    ///
    /// Only an unreachable host is an error here. Client and server failures
    /// end up in the report.
    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        let target = self.config.require_server_host()?.to_string();
        self.logger
            .logger()
            .add_context_field("target".to_string(), &target)
            .await;

        let phase = Instant::now();
        let reachability = self.checker.check(&target).await?;
        self.logger
            .log_reachability(&target, reachability.reachable, phase.elapsed())
            .await;

        if !reachability.reachable {
            let error = AppError::reachability(format!(
                "{} did not answer ping: {}",
                target,
                reachability.output.trim()
            ));
            self.logger.log_error(&error, Some("reachability check")).await;
            return Err(error);
        }

        let host = target.as_str();
        let (server_startup_error, transports, unreachable_check) = match self.remote {
            Some(ref remote) => {
                with_server(remote.as_ref(), |started| async move {
                    let startup_error = match started {
                        Ok(text) => text,
                        Err(e) => Some(e.to_string()),
                    };
                    let (transports, check) = self.run_passes(host).await;
                    (startup_error, transports, check)
                })
                .await?
            }
            None => {
                let (transports, check) = self.run_passes(host).await;
                (None, transports, check)
            }
        };

        Ok(RunReport {
            port: self.config.port,
            target,
            reachability,
            transports,
            unreachable_check,
            server_startup_error,
            started_at,
            completed_at: Utc::now(),
            session_id: self.session_id.clone(),
        })
    }

    async fn run_passes(&self, target: &str) -> (Vec<TransportReport>, Option<UnreachableHostReport>) {
        let mut transports = Vec::new();

        if self.config.run_tcp {
            transports.push(self.run_transport(target, Transport::Tcp).await);
        }

        let check = match self.config.unreachable_host {
            Some(ref host) => Some(self.run_unreachable_check(host).await),
            None => None,
        };

        if self.config.run_udp {
            transports.push(self.run_transport(target, Transport::Udp).await);
        }

        (transports, check)
    }

    /// Run one client pass and push its output through the pipeline
    pub async fn run_transport(&self, target: &str, transport: Transport) -> TransportReport {
        let operation = format!("{}_pass", transport.name().to_lowercase());
        let correlation_id = self.logger.logger().start_operation(&operation).await;
        let started = Instant::now();

        let request = BenchmarkRequest::from_config(&self.config, target, transport);
        let output = self.invoke(&request).await;
        let report = TransportReport {
            transport,
            outcome: self.pipeline.process_output(&output),
        };

        self.logger.log_phase(&operation, started.elapsed()).await;
        self.logger
            .logger()
            .end_operation(&correlation_id, &operation, report.status().is_success())
            .await;

        let (passing, evaluated) = report
            .evaluation()
            .map_or((0, 0), |e| (e.passing.len(), e.evaluated_count));
        self.logger
            .log_verdict(transport, report.status(), passing, evaluated)
            .await;

        report
    }

    async fn run_unreachable_check(&self, host: &str) -> UnreachableHostReport {
        let request = BenchmarkRequest::from_config(&self.config, host, Transport::Tcp);
        let output = self.invoke(&request).await;

        UnreachableHostReport {
            host: host.to_string(),
            detected_error: output.has_error(),
            stderr: output.stderr.trim().to_string(),
        }
    }

    async fn invoke(&self, request: &BenchmarkRequest) -> BenchmarkOutput {
        let started = Instant::now();
        let output = self.client.run(request).await;
        self.logger
            .log_process(&self.config.iperf3_path, &request.args(), output.exit_code, started.elapsed())
            .await;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    const GOOD_TCP: &str = "\
[ ID] Interval           Transfer     Bitrate         Retr  Cwnd
[  5]   0.00-1.00   sec  11.4 MBytes  95.4 Mbits/sec    0    409 KBytes
[  5]   1.00-2.00   sec  11.2 MBytes  94.4 Mbits/sec    0    409 KBytes
- - - - - - - - - - - - - - - - - - - - - - - - -
[  5]   0.00-2.00   sec  22.6 MBytes  94.9 Mbits/sec    0             sender
[  5]   0.00-2.00   sec  22.4 MBytes  94.1 Mbits/sec                  receiver
";

    const SLOW_UDP: &str = "\
[  5]   0.00-1.00   sec   129 KBytes  1.05 Mbits/sec  91
[  5]   1.00-2.00   sec   127 KBytes  1.04 Mbits/sec  90
";

    const REFUSED: &str = "iperf3: error - unable to connect to server: Connection refused";

    struct MockChecker {
        reachable: bool,
    }

    #[async_trait]
    impl ReachabilityChecker for MockChecker {
        async fn check(&self, host: &str) -> Result<ReachabilityReport> {
            Ok(ReachabilityReport {
                host: host.to_string(),
                reachable: self.reachable,
                output: if self.reachable {
                    "4 packets transmitted, 4 received, 0% packet loss".to_string()
                } else {
                    "4 packets transmitted, 0 received, 100% packet loss".to_string()
                },
                packet_loss_percent: Some(if self.reachable { 0.0 } else { 100.0 }),
                duration_ms: 1.0,
            })
        }
    }

    #[derive(Default)]
    struct MockClient {
        tcp: BenchmarkOutput,
        udp: BenchmarkOutput,
        unreachable: BenchmarkOutput,
        requests: Mutex<Vec<BenchmarkRequest>>,
    }

    impl MockClient {
        fn with_stdout(tcp: &str, udp: &str) -> Self {
            Self {
                tcp: stdout(tcp),
                udp: stdout(udp),
                unreachable: stderr(REFUSED),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BenchmarkClient for MockClient {
        async fn run(&self, request: &BenchmarkRequest) -> BenchmarkOutput {
            self.requests.lock().unwrap().push(request.clone());
            match request.transport {
                _ if request.host == "192.168.1.200" => self.unreachable.clone(),
                Transport::Tcp => self.tcp.clone(),
                Transport::Udp => self.udp.clone(),
            }
        }
    }

    #[derive(Default)]
    struct MockRemote {
        stops: AtomicUsize,
        startup_error: Option<String>,
    }

    #[async_trait]
    impl RemoteServerController for MockRemote {
        async fn start(&self) -> Result<Option<String>> {
            Ok(self.startup_error.clone())
        }

        async fn stop(&self) -> Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn stdout(text: &str) -> BenchmarkOutput {
        BenchmarkOutput {
            stdout: text.to_string(),
            exit_code: Some(0),
            ..Default::default()
        }
    }

    fn stderr(text: &str) -> BenchmarkOutput {
        BenchmarkOutput {
            stderr: text.to_string(),
            exit_code: Some(1),
            ..Default::default()
        }
    }

    fn config() -> Config {
        Config {
            server_host: Some("10.0.0.2".to_string()),
            ..Config::default()
        }
    }

    fn runner(config: Config, reachable: bool, client: Arc<MockClient>) -> TestRunner {
        let logger = Arc::new(RunLogger::new(&config));
        TestRunner::new(config, Arc::new(MockChecker { reachable }), client, logger).unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_host_aborts_before_client() {
        let client = Arc::new(MockClient::with_stdout(GOOD_TCP, GOOD_TCP));
        let result = runner(config(), false, client.clone()).run().await;

        assert!(matches!(result, Err(AppError::Reachability(_))));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_tcp_passes_and_slow_udp_fails() {
        let client = Arc::new(MockClient::with_stdout(GOOD_TCP, SLOW_UDP));
        let report = runner(config(), true, client.clone()).run().await.unwrap();

        assert_eq!(report.transports.len(), 2);
        assert_eq!(report.transport(Transport::Tcp).unwrap().status(), TestStatus::Passed);
        assert_eq!(report.transport(Transport::Udp).unwrap().status(), TestStatus::Failed);
        assert!(!report.passed());
        assert_eq!(report.failures(), vec!["UDP: no interval above the thresholds"]);

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].transport, Transport::Tcp);
        assert_eq!(requests[1].transport, Transport::Udp);
    }

    #[tokio::test]
    async fn test_totals_are_not_counted_as_intervals() {
        let client = Arc::new(MockClient::with_stdout(GOOD_TCP, GOOD_TCP));
        let report = runner(config(), true, client).run().await.unwrap();

        let TransportOutcome::Completed { records, summary, .. } =
            &report.transport(Transport::Tcp).unwrap().outcome
        else {
            panic!("expected a completed pass");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(summary.statistics().unwrap().interval_count, 2);
    }

    #[tokio::test]
    async fn test_invocation_error_skips_parsing() {
        let client = Arc::new(MockClient {
            tcp: BenchmarkOutput {
                // would pass if it were parsed
                stdout: GOOD_TCP.to_string(),
                stderr: REFUSED.to_string(),
                exit_code: Some(1),
                duration_ms: 0.0,
            },
            ..MockClient::with_stdout(GOOD_TCP, GOOD_TCP)
        });
        let report = runner(config(), true, client).run().await.unwrap();

        let tcp = report.transport(Transport::Tcp).unwrap();
        assert_eq!(tcp.status(), TestStatus::Errored);
        assert_eq!(
            tcp.outcome,
            TransportOutcome::InvocationError {
                stderr: REFUSED.to_string()
            }
        );
        assert_eq!(report.transport(Transport::Udp).unwrap().status(), TestStatus::Passed);
    }

    #[tokio::test]
    async fn test_unreachable_check_runs_between_transports() {
        let config = Config {
            unreachable_host: Some("192.168.1.200".to_string()),
            ..config()
        };
        let client = Arc::new(MockClient::with_stdout(GOOD_TCP, GOOD_TCP));
        let report = runner(config, true, client.clone()).run().await.unwrap();

        let check = report.unreachable_check.as_ref().unwrap();
        assert!(check.detected_error);
        assert!(report.passed());

        let hosts: Vec<String> = client.requests.lock().unwrap().iter().map(|r| r.host.clone()).collect();
        assert_eq!(hosts, vec!["10.0.0.2", "192.168.1.200", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_silent_unreachable_host_fails_run() {
        let config = Config {
            unreachable_host: Some("192.168.1.200".to_string()),
            ..config()
        };
        let client = Arc::new(MockClient {
            unreachable: BenchmarkOutput::default(),
            ..MockClient::with_stdout(GOOD_TCP, GOOD_TCP)
        });
        let report = runner(config, true, client).run().await.unwrap();

        assert!(!report.unreachable_check.as_ref().unwrap().detected_error);
        assert!(!report.passed());
    }

    #[tokio::test]
    async fn test_server_is_stopped_when_a_transport_fails() {
        let remote = Arc::new(MockRemote::default());
        let client = Arc::new(MockClient::with_stdout(SLOW_UDP, SLOW_UDP));
        let report = runner(config(), true, client)
            .with_remote(remote.clone())
            .run()
            .await
            .unwrap();

        assert!(!report.passed());
        assert_eq!(remote.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_startup_error_is_reported() {
        let remote = Arc::new(MockRemote {
            startup_error: Some("iperf3: error - unable to start listener for connections".to_string()),
            ..Default::default()
        });
        let client = Arc::new(MockClient::with_stdout(GOOD_TCP, GOOD_TCP));
        let report = runner(config(), true, client)
            .with_remote(remote.clone())
            .run()
            .await
            .unwrap();

        assert!(report.server_startup_error.is_some());
        assert!(!report.passed());
        assert_eq!(remote.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_transport_is_skipped() {
        let config = Config {
            run_udp: false,
            ..config()
        };
        let client = Arc::new(MockClient::with_stdout(GOOD_TCP, GOOD_TCP));
        let report = runner(config, true, client.clone()).run().await.unwrap();

        assert_eq!(report.transports.len(), 1);
        assert_eq!(client.calls(), 1);
        assert!(report.passed());
    }

    #[tokio::test]
    async fn test_missing_server_host_is_config_error() {
        let client = Arc::new(MockClient::default());
        let result = runner(Config::default(), true, client).run().await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_evaluate_text_offline() {
        let outcome = evaluate_text(GOOD_TCP, Thresholds::default()).unwrap();
        let TransportOutcome::Completed { evaluation, .. } = outcome else {
            panic!("expected a completed pass");
        };
        assert!(evaluation.passed);
        assert_eq!(evaluation.passing.len(), 2);

        let outcome = evaluate_text("", Thresholds::default()).unwrap();
        let TransportOutcome::Completed { summary, evaluation, .. } = outcome else {
            panic!("expected a completed pass");
        };
        assert!(summary.is_no_data());
        assert!(!evaluation.passed);
    }

    #[test]
    fn test_offline_report_status() {
        let report = OfflineReport::from_text("tcp.txt", GOOD_TCP, Thresholds::default()).unwrap();
        assert!(report.passed());

        let report = OfflineReport::from_text("udp.txt", SLOW_UDP, Thresholds::default()).unwrap();
        assert_eq!(report.status(), TestStatus::Failed);

        // a lower bar lets the same UDP run through
        let report = OfflineReport::from_text("udp.txt", SLOW_UDP, Thresholds::new(0.1, 1.0)).unwrap();
        assert!(report.passed());
    }

    #[test]
    fn test_report_serializes_with_outcome_tag() {
        let report = TransportReport {
            transport: Transport::Udp,
            outcome: TransportOutcome::InvocationError {
                stderr: REFUSED.to_string(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["transport"], "udp");
        assert_eq!(json["outcome"], "invocation_error");
        assert_eq!(json["stderr"], REFUSED);
    }
}
