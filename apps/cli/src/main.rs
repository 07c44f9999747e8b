use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use bcast_audit::AuditSinkConfig;
use bcast_core::{DelayPolicy, MessageSender};
use bcast_dispatch::{
    DispatchConfig, DispatchController, DispatchError, DispatchRegistry, DispatchReport,
};
use bcast_gateway::{GatewayConfig, GatewaySender};
use bcast_media::MediaConfig;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

mod job_file;
mod operator;

use job_file::JobFile;

#[derive(Parser, Debug)]
#[command(author, version, about = "Broadcast a WhatsApp message to resolved group members")]
struct Cli {
    /// Emit JSON output
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a job file without sending anything
    Validate {
        #[arg()]
        job: PathBuf,
    },
    /// Preview the resolved recipient list
    Resolve {
        #[arg()]
        job: PathBuf,
    },
    /// Dispatch a job; type pause / resume / cancel / status on stdin
    Run {
        #[arg()]
        job: PathBuf,
        /// Fixed gap between sends, overriding the job file
        #[arg(long, conflicts_with = "pacing")]
        delay_ms: Option<u64>,
        /// Randomized anti-detection band, overriding the job file
        #[arg(long, value_enum)]
        pacing: Option<Pacing>,
        /// Keep transient carousel images out of durable storage
        #[arg(long)]
        no_materialize: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Pacing {
    Short,
    Long,
}

impl Pacing {
    fn policy(self) -> DelayPolicy {
        match self {
            Pacing::Short => DelayPolicy::ANTI_DETECTION_SHORT,
            Pacing::Long => DelayPolicy::ANTI_DETECTION_LONG,
        }
    }
}

#[derive(Serialize)]
struct RunSummary<'a> {
    job_id: &'a str,
    status: &'a str,
    total: usize,
    attempted: usize,
    success: usize,
    failure: usize,
    summary: String,
    results: &'a [bcast_core::DispatchResult],
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    bcast_telemetry::install("bcast-cli")?;

    let outcome = match cli.command {
        Commands::Validate { job } => validate(&job, cli.json),
        Commands::Resolve { job } => resolve(&job, cli.json),
        Commands::Run {
            job,
            delay_ms,
            pacing,
            no_materialize,
        } => {
            let mut config = DispatchConfig::from_env();
            if no_materialize {
                config.materialize_carousel = false;
            }
            let delay = delay_ms
                .map(DelayPolicy::fixed)
                .or_else(|| pacing.map(Pacing::policy));
            run(&job, delay, config, cli.json).await
        }
    };

    bcast_telemetry::shutdown();
    outcome
}

fn validate(path: &Path, json: bool) -> Result<()> {
    let file = JobFile::load(path)?;
    let job = file.build_job(DispatchConfig::from_env().default_delay)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "valid": true,
                "payload_kind": job.payload().kind(),
                "recipients": job.total(),
                "delay": job.delay_policy(),
            }))?
        );
    } else {
        println!(
            "ok: {} message to {} recipients, delay {:?}",
            job.payload().kind().as_str(),
            job.total(),
            job.delay_policy()
        );
    }
    Ok(())
}

fn resolve(path: &Path, json: bool) -> Result<()> {
    let file = JobFile::load(path)?;
    let recipients = file.resolve();
    if json {
        println!("{}", serde_json::to_string_pretty(&recipients)?);
        return Ok(());
    }
    if recipients.is_empty() {
        println!("No recipients resolved");
        return Ok(());
    }
    println!("{:<4} {:<24} {:<24} origin", "#", "identifier", "name");
    for (idx, recipient) in recipients.iter().enumerate() {
        println!(
            "{:<4} {:<24} {:<24} {}",
            idx + 1,
            recipient.identifier,
            recipient.display_name.as_deref().unwrap_or("-"),
            recipient.origin_label.as_deref().unwrap_or("-")
        );
    }
    println!("{} recipients", recipients.len());
    Ok(())
}

async fn run(
    path: &Path,
    delay: Option<DelayPolicy>,
    config: DispatchConfig,
    json: bool,
) -> Result<()> {
    let mut file = JobFile::load(path)?;
    if delay.is_some() {
        file.delay = delay;
    }
    let job = file.build_job(config.default_delay)?;

    let gateway = GatewayConfig::from_env();
    let sender: Arc<dyn MessageSender> =
        Arc::new(GatewaySender::new(gateway.http_client()?, &gateway));
    let audit = AuditSinkConfig::from_env()?.connect().await?;
    let store = Arc::new(MediaConfig::from_env().build());
    info!(gateway = ?gateway, recipients = job.total(), "starting broadcast");

    let registry = DispatchRegistry::new();
    let controller = DispatchController::new(job, sender, audit)
        .with_store(store)
        .with_config(config);
    let running = registry.launch(controller)?;
    let handle = running.handle().clone();

    let commands = tokio::spawn(operator::read_commands(handle.clone()));
    let progress = tokio::spawn(operator::follow_progress(handle.subscribe()));

    let mut finished = Box::pin(running.wait());
    let outcome = tokio::select! {
        outcome = &mut finished => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received, cancelling broadcast");
            handle.cancel();
            finished.await
        }
    };
    commands.abort();
    let _ = progress.await;

    match outcome {
        Ok(report) => print_report(&report, json),
        Err(DispatchError::Fatal { message, report }) => {
            print_report(&report, json)?;
            bail!("broadcast aborted: {message}")
        }
        Err(err) => Err(err.into()),
    }
}

fn print_report(report: &DispatchReport, json: bool) -> Result<()> {
    if json {
        let summary = RunSummary {
            job_id: &report.job_id,
            status: report.status.as_str(),
            total: report.total,
            attempted: report.attempted(),
            success: report.success,
            failure: report.failure,
            summary: report.summary(),
            results: &report.results,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("{}", report.summary());
    for result in report.results.iter().filter(|result| !result.success) {
        println!(
            "  failed {}: {}",
            result.identifier,
            result.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
