// crates/logforward-cli/src/main.rs
// ============================================================================
// Module: Log Forwarder CLI Entry Point
// Description: Command dispatcher wiring AWS-backed providers into the
//              broker's orchestrator and running one of its front ends.
// Purpose: The binary operators actually deploy; everything upstream of
//          this file is backend-agnostic.
// Dependencies: clap, logforward-broker, logforward-config,
//               logforward-core, logforward-providers, tokio,
//               tracing-subscriber
// ============================================================================

//! ## Overview
//! `run` loads a [`logforward_config::ProcessorConfig`], builds every
//! AWS SDK client it names, and dispatches to the poller or scanner
//! front end according to `mode`. `manual` processes a single object
//! once and exits, independent of `mode`, for operator-triggered
//! replays. The handler front end is exposed as a library function
//! ([`logforward_broker::handle_batch`]) for embedding in a serverless
//! runtime rather than invoked from this binary.
//!
//! The tenant-configuration store is an external collaborator this
//! workspace only defines the trait for (see `logforward-core`); this
//! binary wires an in-memory store until an operator supplies a real
//! one, which is recorded as a known limitation rather than a silent gap.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use logforward_broker::run_poller;
use logforward_broker::run_scan;
use logforward_broker::DelivererRegistry;
use logforward_broker::Orchestrator;
use logforward_broker::TenantResolver;
use logforward_config::ConfigError;
use logforward_config::ExecutionMode;
use logforward_config::ProcessorConfig;
use logforward_providers::CloudWatchMetricsPublisher;
use logforward_providers::metrics_publisher::DEFAULT_NAMESPACE;
use logforward_providers::InMemoryTenantConfigStore;
use logforward_providers::S3Fetcher;
use logforward_providers::S3ObjectLister;
use logforward_providers::SqsQueueClient;
use logforward_providers::StsCredentialBroker;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "logforward", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the long-lived front end named by the loaded config's `mode`
    /// (poller or scan).
    Run(RunCommand),
    /// Processes a single object once and exits, independent of `mode`.
    Manual(ManualCommand),
}

#[derive(Args, Debug)]
struct RunCommand {
    /// Optional config file path; falls back to `LOGFORWARD__*` env vars.
    #[arg(long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,
}

#[derive(Args, Debug)]
struct ManualCommand {
    #[arg(long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,
    /// Source bucket of the object to process.
    #[arg(long)]
    bucket: String,
    /// Source key of the object to process.
    #[arg(long)]
    key: String,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Message(String),
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(command) => run_front_end(command).await,
        Commands::Manual(command) => run_manual(command).await,
    }
}

async fn run_front_end(command: RunCommand) -> Result<(), CliError> {
    let config = ProcessorConfig::load(command.config.as_deref())?;
    let orchestrator = Arc::new(build_orchestrator(&config).await?);

    match config.mode {
        ExecutionMode::Poller => {
            let sdk_config = aws_config::load_from_env().await;
            let queue = Arc::new(SqsQueueClient::new(
                aws_sdk_sqs::Client::new(&sdk_config),
                config.queue_url.clone(),
            ));
            let metrics = Arc::new(CloudWatchMetricsPublisher::new(aws_sdk_cloudwatch::Client::new(&sdk_config), DEFAULT_NAMESPACE));
            info!(queue_url = %config.queue_url, "starting poller");
            run_poller(orchestrator, queue, metrics, shutdown_signal()).await;
            Ok(())
        }
        ExecutionMode::Scan => {
            let bucket = config
                .scan_source_bucket
                .clone()
                .ok_or_else(|| CliError::Message("scan mode requires scan_source_bucket".to_owned()))?;
            let interval = Duration::from_secs(
                config.scan_interval_seconds.ok_or_else(|| CliError::Message("scan mode requires scan_interval_seconds".to_owned()))?,
            );
            let sdk_config = aws_config::load_from_env().await;
            let lister = Arc::new(S3ObjectLister::new(aws_sdk_s3::Client::new(&sdk_config)));
            info!(bucket, "starting scan loop");
            run_scan(orchestrator, lister, bucket, interval, shutdown_signal()).await;
            Ok(())
        }
        ExecutionMode::Handler | ExecutionMode::Manual => Err(CliError::Message(
            "this binary's `run` command only drives the poller and scan front ends; handler invocations are embedded via logforward_broker::handle_batch, and single-object replays use the `manual` subcommand".to_owned(),
        )),
    }
}

async fn run_manual(command: ManualCommand) -> Result<(), CliError> {
    let config = ProcessorConfig::load(command.config.as_deref())?;
    let orchestrator = build_orchestrator(&config).await?;

    let inner = serde_json::json!({
        "Records": [{"s3": {"bucket": {"name": command.bucket}, "object": {"key": command.key}}}],
    });
    let body = serde_json::json!({"Message": inner.to_string()}).to_string();

    let outcome = outcome_label(orchestrator.process(&body, "manual-invocation").await);
    info!(outcome, bucket = %command.bucket, key = %command.key, "manual run complete");
    Ok(())
}

async fn build_orchestrator(config: &ProcessorConfig) -> Result<Orchestrator, CliError> {
    let sdk_config = aws_config::load_from_env().await;

    let credential_provider: Arc<dyn logforward_core::CredentialProvider> =
        Arc::new(StsCredentialBroker::new(aws_sdk_sts::Client::new(&sdk_config)));
    let central_account_id = account_id_from_role_arn(&config.central_distribution_role_id)
        .ok_or_else(|| CliError::Message("central_distribution_role_id must be a full role ARN".to_owned()))?;

    let registry = DelivererRegistry::new(
        credential_provider,
        config.central_distribution_role_id.clone(),
        central_account_id,
        config.region.clone(),
        config.max_batch_size,
        config.retry_attempts,
    );

    let tenant_resolver = TenantResolver::new(Arc::new(InMemoryTenantConfigStore::new()));
    let fetcher = Arc::new(S3Fetcher::new(aws_sdk_s3::Client::new(&sdk_config)));
    let metrics = Arc::new(CloudWatchMetricsPublisher::new(aws_sdk_cloudwatch::Client::new(&sdk_config), DEFAULT_NAMESPACE));
    let queue = Arc::new(SqsQueueClient::new(aws_sdk_sqs::Client::new(&sdk_config), config.queue_url.clone()));

    Ok(Orchestrator::new(
        tenant_resolver,
        Arc::new(registry),
        fetcher,
        metrics,
        queue,
        Duration::from_secs(900),
    ))
}

fn outcome_label(outcome: logforward_broker::MessageOutcome) -> &'static str {
    use logforward_broker::MessageOutcome;
    match outcome {
        MessageOutcome::Delivered => "delivered",
        MessageOutcome::Continued => "continued",
        MessageOutcome::NonRecoverable => "non_recoverable",
        MessageOutcome::Recoverable => "recoverable",
    }
}

/// Extracts the account id from a role ARN of the form
/// `arn:aws:iam::<account>:role/<name>`.
fn account_id_from_role_arn(role_arn: &str) -> Option<String> {
    role_arn.split(':').nth(4).filter(|segment| !segment.is_empty()).map(ToOwned::to_owned)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
