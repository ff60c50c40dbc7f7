use std::time::Duration;

use conway_actor::reference;
use conway_actor::{ActorSystem, Coord, Grid, Simulation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_grid(rows: usize, cols: usize, density: f64, seed: u64) -> Grid {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = Grid::new(rows, cols).unwrap();
    for x in 0..rows {
        for y in 0..cols {
            grid.set(Coord::new(x, y), rng.gen_bool(density));
        }
    }
    grid
}

async fn run_generations(initial: &Grid, generations: u64) -> Vec<Grid> {
    let mut system = ActorSystem::launch(initial).await.unwrap();
    let mut out = vec![system.snapshot().clone()];
    for _ in 0..generations {
        system.step().await.unwrap();
        out.push(system.snapshot().clone());
    }
    system.shutdown().await;
    out
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bootstrap_publishes_initial_state() {
    let initial = random_grid(7, 9, 0.4, 0x11);
    let system = ActorSystem::launch(&initial).await.unwrap();
    assert_eq!(system.snapshot(), &initial);
    assert_eq!(system.generation(), 0);
    assert_eq!(system.controller().rounds(), 1);
    system.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_round_matches_reference() {
    for (rows, cols, seed) in [(1, 1, 1), (1, 6, 2), (6, 1, 3), (2, 2, 4), (3, 3, 5), (8, 13, 6), (17, 11, 7)] {
        for density in [0.2, 0.5, 0.8] {
            let initial = random_grid(rows, cols, density, seed);
            let mut system = ActorSystem::launch(&initial).await.unwrap();
            let generation = system.step().await.unwrap();
            assert_eq!(generation, 1);
            assert_eq!(
                system.snapshot(),
                &reference::step(&initial),
                "mismatch on {rows}x{cols} density {density} seed {seed}"
            );
            system.shutdown().await;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_rounds_track_reference() {
    let initial = random_grid(24, 32, 0.35, 0xC0FFEE);
    let actor = run_generations(&initial, 12).await;
    let mut expected = initial.clone();
    for (generation, grid) in actor.iter().enumerate() {
        assert_eq!(grid, &expected, "diverged at generation {generation}");
        expected = reference::step(&expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repeated_runs_are_identical() {
    let initial = random_grid(12, 12, 0.45, 99);
    let first = run_generations(&initial, 8).await;
    let second = run_generations(&initial, 8).await;
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_phase_sees_exactly_one_message_per_cell() {
    let (rows, cols) = (9, 7);
    let mut system = ActorSystem::launch(&random_grid(rows, cols, 0.5, 3)).await.unwrap();
    for round in 2..8 {
        let stats = system.transit().await.unwrap();
        assert_eq!(stats.round, round);
        assert_eq!(stats.ready, rows * cols);
        assert_eq!(stats.commits, rows * cols);
        assert_eq!(stats.reports, rows * cols);
    }
    system.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn block_is_a_still_life() {
    let initial = Grid::parse(&[
        "......",
        "......",
        "..##..",
        "..##..",
        "......",
        "......",
    ])
    .unwrap();
    for grid in run_generations(&initial, 6).await {
        assert_eq!(grid, initial);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_cell_dies_alone() {
    let initial = Grid::parse(&["#"]).unwrap();
    let mut system = ActorSystem::launch(&initial).await.unwrap();
    system.step().await.unwrap();
    assert!(!system.snapshot().get(Coord::new(0, 0)));
    system.step().await.unwrap();
    assert!(!system.snapshot().get(Coord::new(0, 0)));
    system.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn blinker_oscillates_with_period_two() {
    let horizontal = Grid::parse(&[".....", ".....", ".###.", ".....", "....."]).unwrap();
    let vertical = Grid::parse(&[".....", "..#..", "..#..", "..#..", "....."]).unwrap();
    let frames = run_generations(&horizontal, 6).await;
    for (generation, grid) in frames.iter().enumerate() {
        let expected = if generation % 2 == 0 { &horizontal } else { &vertical };
        assert_eq!(grid, expected, "generation {generation}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_reaps_every_cell() {
    let (rows, cols) = (10, 12);
    let mut system = ActorSystem::launch(&random_grid(rows, cols, 0.5, 8)).await.unwrap();
    system.step().await.unwrap();
    system.step().await.unwrap();
    assert_eq!(system.live_tasks(), rows * cols);

    let report = tokio::time::timeout(Duration::from_secs(5), system.shutdown())
        .await
        .expect("cells did not stop");
    assert_eq!(report.joined, rows * cols);
    assert_eq!(report.failed, 0);
}

#[tokio::test(flavor = "current_thread")]
async fn runs_on_a_single_thread_runtime() {
    let initial = random_grid(6, 6, 0.5, 21);
    let frames = run_generations(&initial, 4).await;
    assert_eq!(frames[4], reference::step_n(&initial, 4));
}
