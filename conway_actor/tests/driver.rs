use std::time::Duration;

use conway_actor::reference;
use conway_actor::{
    ActorSystem, Driver, Frame, Grid, RenderError, Sequential, SimError, Simulation, StopReason,
    TickObserver, WorkerPool,
};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Recorder {
    frames: Vec<(u64, Grid)>,
}

impl TickObserver for Recorder {
    fn tick_completed(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        self.frames.push((frame.generation, frame.grid.clone()));
        Ok(())
    }
}

/// Fails every other frame, like a flaky terminal.
#[derive(Default)]
struct Flaky {
    calls: u64,
    delivered: Vec<u64>,
}

impl TickObserver for Flaky {
    fn tick_completed(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            return Err(RenderError::Io(std::io::Error::other("sink unplugged")));
        }
        self.delivered.push(frame.generation);
        Ok(())
    }
}

/// Cancels the token once a given generation has been rendered.
struct CancelAt {
    generation: u64,
    token: CancellationToken,
    seen: u64,
}

impl TickObserver for CancelAt {
    fn tick_completed(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        self.seen = frame.generation;
        if frame.generation == self.generation {
            self.token.cancel();
        }
        Ok(())
    }
}

/// Never finishes a round.
struct Wedged {
    grid: Grid,
}

impl Simulation for Wedged {
    async fn step(&mut self) -> Result<u64, SimError> {
        std::future::pending().await
    }

    fn snapshot(&self) -> &Grid {
        &self.grid
    }

    fn generation(&self) -> u64 {
        0
    }

    async fn shutdown(self) -> conway_actor::ShutdownReport {
        conway_actor::ShutdownReport::default()
    }
}

fn glider_field() -> Grid {
    Grid::parse(&[
        ".#......",
        "..#.....",
        "###.....",
        "........",
        "........",
        "........",
    ])
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn generation_limit_publishes_every_frame() {
    let initial = glider_field();
    let driver = Driver::new(Duration::ZERO, CancellationToken::new()).with_max_generations(Some(5));
    let mut recorder = Recorder::default();

    let system = ActorSystem::launch(&initial).await.unwrap();
    let report = driver.run(system, &mut recorder).await.unwrap();

    assert_eq!(report.stop, StopReason::GenerationLimit);
    assert_eq!(report.generations, 5);
    assert_eq!(report.tasks_joined, initial.len());

    let generations: Vec<u64> = recorder.frames.iter().map(|(g, _)| *g).collect();
    assert_eq!(generations, vec![0, 1, 2, 3, 4, 5]);
    for (generation, grid) in &recorder.frames {
        assert_eq!(grid, &reference::step_n(&initial, *generation));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_stops_between_rounds() {
    let token = CancellationToken::new();
    let driver = Driver::new(Duration::from_millis(1), token.clone());
    let mut observer = CancelAt {
        generation: 3,
        token,
        seen: 0,
    };

    let initial = glider_field();
    let system = ActorSystem::launch(&initial).await.unwrap();
    let report = tokio::time::timeout(Duration::from_secs(5), driver.run(system, &mut observer))
        .await
        .expect("driver did not stop")
        .unwrap();

    assert_eq!(report.stop, StopReason::Cancelled);
    assert_eq!(report.generations, 3);
    assert_eq!(observer.seen, 3);
    assert_eq!(report.tasks_joined, initial.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_before_start_runs_nothing() {
    let token = CancellationToken::new();
    token.cancel();
    let driver = Driver::new(Duration::from_millis(1), token);
    let mut recorder = Recorder::default();

    let report = driver
        .run(Sequential::new(glider_field()), &mut recorder)
        .await
        .unwrap();
    assert_eq!(report.generations, 0);
    assert_eq!(recorder.frames.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn render_failures_do_not_stop_the_run() {
    let initial = glider_field();
    let driver = Driver::new(Duration::ZERO, CancellationToken::new()).with_max_generations(Some(6));
    let mut flaky = Flaky::default();

    let pool = WorkerPool::launch(&initial, 2).unwrap();
    let report = driver.run(pool, &mut flaky).await.unwrap();

    assert_eq!(report.generations, 6);
    assert_eq!(report.render_failures, 3);
    assert_eq!(flaky.delivered, vec![0, 2, 4, 6]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_on_cycle_detects_blinker() {
    let blinker = Grid::parse(&[".....", ".....", ".###.", ".....", "....."]).unwrap();
    let driver = Driver::new(Duration::ZERO, CancellationToken::new())
        .with_max_generations(Some(50))
        .with_stop_on_cycle(true);
    let mut recorder = Recorder::default();

    let system = ActorSystem::launch(&blinker).await.unwrap();
    let report = driver.run(system, &mut recorder).await.unwrap();

    assert_eq!(report.stop, StopReason::Cycle);
    assert_eq!(report.generations, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interval_paces_the_rounds() {
    let driver = Driver::new(Duration::from_millis(20), CancellationToken::new())
        .with_max_generations(Some(3));
    let mut recorder = Recorder::default();

    let started = tokio::time::Instant::now();
    driver
        .run(Sequential::new(glider_field()), &mut recorder)
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn watchdog_reports_a_stalled_round() {
    let driver = Driver::new(Duration::ZERO, CancellationToken::new())
        .with_round_timeout(Some(Duration::from_millis(20)));
    let mut recorder = Recorder::default();

    let err = driver
        .run(Wedged { grid: glider_field() }, &mut recorder)
        .await
        .unwrap_err();
    assert!(matches!(err, SimError::Stalled { round: 1, .. }));
}
