use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use xrinput::config::{default_config_path, RouterConfig};
use xrinput::dispatch::ReceiverRegistry;
use xrinput::module::InputRouter;
use xrinput::replay::{FrameOutcome, ReplayRunner, SessionScript};

const USAGE: &str = "usage: xrinput <session.toml> [config.toml]";

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let mut args = std::env::args().skip(1);
    let script_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| eyre!("{}", USAGE))?;
    let config_path = args.next().map(PathBuf::from).unwrap_or_else(default_config_path);

    info!("Loading config from {}", config_path.display());
    let config = RouterConfig::load_or_default(&config_path).await?;
    let script = SessionScript::load(&script_path).await?;

    let router = InputRouter::from_config(&config, ReceiverRegistry::new())
        .map_err(|e| eyre!("Failed to build input router: {}", e))?;

    let (outcome_tx, outcome_rx) = mpsc::channel(1000);
    let runner = ReplayRunner::new(router, script, config.router.clone(), outcome_tx)
        .map_err(|e| eyre!("Failed to prepare replay: {}", e))?;

    let report_handle = tokio::spawn(log_outcomes(outcome_rx));

    let summary = runner
        .run()
        .await
        .map_err(|e| eyre!("Replay failed: {}", e))?;

    if let Err(e) = report_handle.await {
        warn!("Report task ended abnormally: {}", e);
    }

    info!(
        "Replayed {} frames, {} dispatches",
        summary.frames, summary.dispatches
    );
    for (name, (position, grabbed)) in &summary.grabbables {
        info!(
            "{} ends at {:?}{}",
            name,
            position,
            if *grabbed { " (still grabbed)" } else { "" }
        );
    }
    for (name, (position, held)) in &summary.holdables {
        info!(
            "{} ends at {:?}{}",
            name,
            position,
            if *held { " (still held)" } else { "" }
        );
    }

    Ok(())
}

async fn log_outcomes(mut outcome_rx: mpsc::Receiver<FrameOutcome>) {
    while let Some(outcome) = outcome_rx.recv().await {
        for report in &outcome.forced {
            for record in &report.records {
                info!(
                    "[frame {}] forced {} -> {} receivers",
                    outcome.frame,
                    record.capability,
                    record.delivered()
                );
            }
        }
        for report in &outcome.reports {
            for edge in &report.edges {
                debug!(
                    "[frame {}] {} {} {} {:?}",
                    outcome.frame, report.module, edge.button, edge.channel, edge.edge
                );
            }
        }
    }
    debug!("Outcome channel closed");
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
