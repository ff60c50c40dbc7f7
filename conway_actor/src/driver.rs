// driver.rs - Fixed-cadence tick loop around a Simulation

use std::time::Duration;

use tokio::time::{Instant, sleep_until, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::engine::Simulation;
use crate::error::{RenderError, SimError};
use crate::grid::{CycleDetector, Grid};

/// One completed generation, handed to the observer after each round.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub generation: u64,
    pub grid: &'a Grid,
    /// Wall-clock time of the round that produced this generation.
    pub elapsed: Duration,
}

/// Receives every completed generation. Errors are logged by the driver and
/// never reach the simulation.
pub trait TickObserver {
    fn tick_completed(&mut self, frame: &Frame<'_>) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    GenerationLimit,
    Cycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverReport {
    pub generations: u64,
    pub stop: StopReason,
    pub tasks_joined: usize,
    pub render_failures: u64,
}

#[derive(Debug, Clone)]
pub struct Driver {
    pub interval: Duration,
    pub max_generations: Option<u64>,
    pub stop_on_cycle: bool,
    pub round_timeout: Option<Duration>,
    token: CancellationToken,
}

impl Driver {
    pub fn new(interval: Duration, token: CancellationToken) -> Self {
        Self {
            interval,
            max_generations: None,
            stop_on_cycle: false,
            round_timeout: None,
            token,
        }
    }

    pub fn with_max_generations(mut self, limit: Option<u64>) -> Self {
        self.max_generations = limit;
        self
    }

    pub fn with_stop_on_cycle(mut self, stop: bool) -> Self {
        self.stop_on_cycle = stop;
        self
    }

    pub fn with_round_timeout(mut self, limit: Option<Duration>) -> Self {
        self.round_timeout = limit;
        self
    }

    /// Tick `sim` until cancelled or a stop condition hits, then shut it down.
    pub async fn run<S, O>(&self, sim: S, observer: &mut O) -> Result<DriverReport, SimError>
    where
        S: Simulation,
        O: TickObserver + ?Sized,
    {
        let span = info_span!("simulation", interval_ms = self.interval.as_millis() as u64);
        async {
            let started = Instant::now();
            let result = self.tick_loop(sim, observer).await;
            match &result {
                Ok(report) => info!(
                    generations = report.generations,
                    stop = ?report.stop,
                    tasks_joined = report.tasks_joined,
                    total = ?started.elapsed(),
                    "simulation finished"
                ),
                Err(err) => warn!(error = %err, total = ?started.elapsed(), "simulation aborted"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn tick_loop<S, O>(&self, mut sim: S, observer: &mut O) -> Result<DriverReport, SimError>
    where
        S: Simulation,
        O: TickObserver + ?Sized,
    {
        let mut cycles = CycleDetector::new();
        let mut render_failures = 0u64;
        let mut run = 0u64;

        let initial = Frame {
            generation: sim.generation(),
            grid: sim.snapshot(),
            elapsed: Duration::ZERO,
        };
        notify(observer, &initial, &mut render_failures);
        cycles.observe(sim.snapshot());

        let stop = loop {
            if self.token.is_cancelled() {
                break StopReason::Cancelled;
            }
            if self.max_generations.is_some_and(|limit| run >= limit) {
                break StopReason::GenerationLimit;
            }

            let tick = Instant::now();
            let generation = match self.round_timeout {
                Some(limit) => match timeout(limit, sim.step()).await {
                    Ok(stepped) => stepped?,
                    Err(_) => {
                        return Err(SimError::Stalled {
                            round: sim.generation() + 1,
                            timeout: limit,
                        });
                    }
                },
                None => sim.step().await?,
            };
            let elapsed = tick.elapsed();
            run += 1;
            debug!(generation, elapsed = ?elapsed, "round complete");

            let frame = Frame {
                generation,
                grid: sim.snapshot(),
                elapsed,
            };
            notify(observer, &frame, &mut render_failures);

            if cycles.observe(sim.snapshot()) && self.stop_on_cycle {
                info!(generation, "generation repeats a recent one");
                break StopReason::Cycle;
            }

            // only the gap between rounds is interruptible
            tokio::select! {
                _ = self.token.cancelled() => {}
                _ = sleep_until(tick + self.interval) => {}
            }
        };

        let shutdown = sim.shutdown().await;
        Ok(DriverReport {
            generations: run,
            stop,
            tasks_joined: shutdown.joined,
            render_failures,
        })
    }
}

fn notify<O: TickObserver + ?Sized>(observer: &mut O, frame: &Frame<'_>, failures: &mut u64) {
    if let Err(err) = observer.tick_completed(frame) {
        *failures += 1;
        warn!(generation = frame.generation, error = %err, "frame not rendered");
    }
}
