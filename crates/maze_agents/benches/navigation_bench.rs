//! Benchmarks for Maze Agents
//!
//! Run with: cargo bench -p maze_agents

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use maze_agents::{
    Location, OccupancyGrid, QLearningAgent, QLearningConfig, SearchSession, StepResult,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A bordered grid with every other interior column walled, leaving a gap
/// that alternates between the top and bottom rows.
fn serpentine(size: i32) -> OccupancyGrid {
    let mut grid = OccupancyGrid::bordered(size, size);
    for x in (2..size - 2).step_by(2) {
        let gap = if (x / 2) % 2 == 0 { size - 2 } else { 1 };
        for z in 1..size - 1 {
            if z != gap {
                grid.set_wall(Location::new(x, z), true);
            }
        }
    }
    grid
}

/// Benchmark full A* searches
fn bench_astar(c: &mut Criterion) {
    let mut group = c.benchmark_group("AStar");

    for size in [16, 32, 64] {
        let open = OccupancyGrid::bordered(size, size);
        group.bench_with_input(BenchmarkId::new("open", size), &open, |b, grid| {
            b.iter(|| {
                let mut session = SearchSession::begin(
                    grid,
                    Location::new(1, 1),
                    Location::new(size - 2, size - 2),
                )
                .unwrap();
                black_box(session.run_to_completion().unwrap())
            });
        });

        let maze = serpentine(size);
        group.bench_with_input(BenchmarkId::new("serpentine", size), &maze, |b, grid| {
            b.iter(|| {
                let mut session = SearchSession::begin(
                    grid,
                    Location::new(1, 1),
                    Location::new(size - 2, size - 2),
                )
                .unwrap();
                black_box(session.run_to_completion())
            });
        });
    }

    group.finish();
}

/// Benchmark single A* steps
fn bench_astar_step(c: &mut Criterion) {
    let grid = OccupancyGrid::bordered(64, 64);

    c.bench_function("astar_step_64", |b| {
        b.iter(|| {
            let mut session =
                SearchSession::begin(&grid, Location::new(1, 1), Location::new(62, 62)).unwrap();
            for _ in 0..100 {
                if session.step().unwrap() == StepResult::Found {
                    break;
                }
            }
            black_box(session.open_len())
        });
    });
}

/// Benchmark Q-learning episodes
fn bench_train_once(c: &mut Criterion) {
    let mut group = c.benchmark_group("QLearning");

    for size in [8, 16] {
        group.bench_function(BenchmarkId::new("train_once", size), |b| {
            let mut agent = QLearningAgent::with_rng(
                OccupancyGrid::bordered(size, size),
                QLearningConfig::default(),
                StdRng::seed_from_u64(42),
            );
            agent
                .set_endpoints(Location::new(1, 1), Location::new(size - 2, size - 2))
                .unwrap();
            b.iter(|| black_box(agent.train_once().unwrap()));
        });
    }

    group.bench_function("auto_train_serpentine_12", |b| {
        b.iter(|| {
            let mut agent = QLearningAgent::with_rng(
                serpentine(12),
                QLearningConfig::default(),
                StdRng::seed_from_u64(7),
            );
            agent
                .set_endpoints(Location::new(1, 1), Location::new(10, 10))
                .unwrap();
            black_box(agent.start_auto_train().unwrap().finish())
        });
    });

    group.finish();
}

/// Benchmark greedy rollouts on a trained table
fn bench_best_path(c: &mut Criterion) {
    let mut agent = QLearningAgent::with_rng(
        OccupancyGrid::bordered(12, 12),
        QLearningConfig::default(),
        StdRng::seed_from_u64(3),
    );
    agent
        .set_endpoints(Location::new(1, 1), Location::new(10, 10))
        .unwrap();
    for _ in 0..200 {
        agent.train_once().unwrap();
    }

    c.bench_function("best_path_12", |b| {
        b.iter(|| black_box(agent.best_path()));
    });
}

criterion_group!(
    benches,
    bench_astar,
    bench_astar_step,
    bench_train_once,
    bench_best_path
);
criterion_main!(benches);
