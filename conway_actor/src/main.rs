// main.rs - Terminal front end: CLI, Ctrl-C and text frames

use std::io::{self, BufWriter};

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use conway_actor::{
    ActorSystem, Args, Driver, DriverReport, EngineKind, Grid, Sequential, SimConfig,
    TerminalRenderer, TickObserver, WorkerPool,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = SimConfig::try_from(Args::parse())?;
    let initial = config.initial_grid()?;
    info!(
        rows = config.rows,
        cols = config.cols,
        engine = %config.engine,
        alive = initial.live_count(),
        "starting simulation"
    );

    let token = CancellationToken::new();
    spawn_interrupt_listener(token.clone());

    let driver = Driver::new(config.interval, token)
        .with_max_generations(config.max_generations)
        .with_stop_on_cycle(config.stop_on_cycle)
        .with_round_timeout(config.round_timeout);
    let mut renderer = TerminalRenderer::new(BufWriter::new(io::stdout()), config.markers)
        .clear_screen(config.clear_screen)
        .show_duration(config.show_duration);

    let report = run_engine(&config, &initial, &driver, &mut renderer).await?;
    info!(
        generations = report.generations,
        stop = ?report.stop,
        render_failures = report.render_failures,
        "done"
    );
    Ok(())
}

fn init_tracing() {
    // frames go to stdout, logs to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn spawn_interrupt_listener(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received; stopping after the current round");
                token.cancel();
            }
            Err(err) => warn!(error = %err, "cannot listen for interrupts"),
        }
    });
}

async fn run_engine<O: TickObserver>(
    config: &SimConfig,
    initial: &Grid,
    driver: &Driver,
    observer: &mut O,
) -> Result<DriverReport> {
    let report = match config.engine {
        EngineKind::Actor => driver.run(ActorSystem::launch(initial).await?, observer).await?,
        EngineKind::Pool => {
            driver.run(WorkerPool::launch(initial, config.workers)?, observer).await?
        }
        EngineKind::Sequential => driver.run(Sequential::new(initial.clone()), observer).await?,
    };
    Ok(report)
}
