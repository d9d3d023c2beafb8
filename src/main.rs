use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::Parser;
use tokio::sync::Notify;
use tracing::info;
use tracing_subscriber::EnvFilter;

use heatwatch::analytics::{SessionContext, SessionReporter};
use heatwatch::api::{AnalyticsApi, ApiError};
use heatwatch::config::Config;
use heatwatch::delivery::{Beacon, DeliveryAttempt, DeliveryStrategy, QueuedBeacon, ReportSink};
use heatwatch::models::{LeaveTarget, SessionId, TerminationReport};
use heatwatch::player::{MediaElement, media_accessor};
use heatwatch::workers::{BeaconDispatcher, BeaconDispatcherHandle};

mod replay;

use replay::{ReplayClock, SimulatedMedia, Trace};

/// Replay a recorded playback trace and print the leave report it produces
#[derive(Debug, Parser)]
#[command(name = "heatwatch", version, about)]
struct Cli {
    /// JSON trace of timed playback steps
    trace: PathBuf,

    /// Config file (default: the user config directory)
    #[arg(long, env = "HEATWATCH_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, default_value = "demo")]
    org: String,

    #[arg(long, default_value = "video")]
    video: String,

    /// Session id (default: a random UUID)
    #[arg(long)]
    session: Option<String>,

    /// Nominal duration in seconds, overriding the trace
    #[arg(long)]
    whole_time: Option<f64>,

    /// Deliver the report to the configured backend
    #[arg(long)]
    send: bool,
}

/// Accepts every report without sending it anywhere
struct DryRunBeacon;

impl Beacon for DryRunBeacon {
    fn send_beacon(&self, url: &str, body: &[u8]) -> bool {
        info!("Dry run, not sending {} bytes to {}", body.len(), url);
        true
    }
}

/// Fallback tier that lets `main` wait for the spawned request
struct NotifyingSink {
    api: AnalyticsApi,
    done: Notify,
}

#[async_trait]
impl ReportSink for NotifyingSink {
    async fn send_report(
        &self,
        target: &LeaveTarget,
        report: &TerminationReport,
    ) -> Result<(), ApiError> {
        let result = self.api.send_report(target, report).await;
        self.done.notify_one();
        result
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("heatwatch=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let policy = config.policy()?;

    let contents = std::fs::read_to_string(&cli.trace)
        .with_context(|| format!("Failed to read trace {}", cli.trace.display()))?;
    let trace = Trace::from_json(&contents)?;

    let Some(whole_time) = cli.whole_time.or(trace.whole_time) else {
        bail!("No duration: pass --whole-time or set whole_time in the trace");
    };
    let session_id = cli
        .session
        .clone()
        .map(SessionId::new)
        .unwrap_or_else(SessionId::generate);
    let mount_path = trace
        .mount_path
        .clone()
        .unwrap_or_else(|| format!("/{}/videos/{}", cli.org, cli.video));

    let api = AnalyticsApi::new(&config.server.base_url, config.request_timeout())
        .context("Invalid analytics base URL")?;
    let sink = Arc::new(NotifyingSink {
        api: api.clone(),
        done: Notify::new(),
    });

    let mut dispatcher: Option<BeaconDispatcherHandle> = None;
    let beacon: Option<Arc<dyn Beacon>> = if !cli.send {
        Some(Arc::new(DryRunBeacon))
    } else if config.delivery.beacon_enabled {
        let (beacon, receiver) = QueuedBeacon::channel(config.delivery.beacon_queue_capacity);
        dispatcher = Some(BeaconDispatcher::spawn(api.clone(), receiver));
        Some(Arc::new(beacon))
    } else {
        None
    };
    let delivery = DeliveryStrategy::new(api.base_url().clone(), beacon, sink.clone());

    info!(
        session_id = %session_id,
        steps = trace.steps.len(),
        "Replaying trace {}",
        cli.trace.display()
    );

    let media = Arc::new(SimulatedMedia::new(whole_time));
    let clock = Arc::new(ReplayClock::new());
    let mut reporter = SessionReporter::mount(
        SessionContext::new(session_id, cli.org.as_str(), cli.video.as_str(), mount_path),
        whole_time,
        policy,
        media_accessor(media.clone() as Arc<dyn MediaElement>),
        delivery,
        clock.clone(),
    );

    let outcome = replay::replay(&trace, &mut reporter, &media, &clock)
        .context("Session produced no report")?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    match outcome.delivery {
        DeliveryAttempt::Fallback => {
            let wait = config.request_timeout() + Duration::from_secs(1);
            if tokio::time::timeout(wait, sink.done.notified()).await.is_err() {
                bail!("Timed out waiting for leave report delivery");
            }
        }
        DeliveryAttempt::Dropped => bail!("Leave report was dropped"),
        DeliveryAttempt::Beacon => {}
    }

    if let Some(dispatcher) = dispatcher {
        let stats = dispatcher.shutdown().await?;
        if stats.failed > 0 {
            bail!("Failed to deliver {} leave report(s)", stats.failed);
        }
        info!("Delivered {} leave report(s)", stats.delivered);
    }

    Ok(())
}
