//! Maze Agents Comparison Demo
//!
//! This example runs both engines on one maze:
//! - Step-by-step A* search
//! - Single training episodes and their outcomes
//! - Auto-training until the greedy route reaches the goal
//! - Table persistence to a JSON file
//!
//! Run with: cargo run --example compare_demo

use maze_agents::*;

const MAZE: &str = "
    ###########
    #.....#...#
    #.###.#.#.#
    #.#...#.#.#
    #.#.###.#.#
    #...#...#.#
    ###.#.###.#
    #.....#...#
    ###########
";

fn main() {
    println!("=== Maze Agents Demo ===\n");

    let grid = OccupancyGrid::from_ascii(MAZE);
    let start = Location::new(1, 1);
    let goal = Location::new(9, 7);

    demo_astar(&grid, start, goal);
    demo_episodes(&grid, start, goal);
    demo_comparison(&grid, start, goal);
    demo_persistence(&grid, start, goal);

    println!("\n=== Demo Complete ===");
}

fn render(grid: &OccupancyGrid, path: &[Location]) {
    for z in 0..grid.depth() {
        let row: String = (0..grid.width())
            .map(|x| {
                let cell = Location::new(x, z);
                if grid.is_wall(x, z) {
                    '#'
                } else if path.first() == Some(&cell) {
                    'S'
                } else if path.last() == Some(&cell) {
                    'G'
                } else if path.contains(&cell) {
                    '*'
                } else {
                    '.'
                }
            })
            .collect();
        println!("    {}", row);
    }
}

/// Drive A* one expansion at a time
fn demo_astar(grid: &OccupancyGrid, start: Location, goal: Location) {
    println!("--- 1. A* Search ---");

    let mut session = SearchSession::begin(grid, start, goal).expect("valid endpoints");
    loop {
        match session.step() {
            Ok(StepResult::Continue) => {}
            Ok(StepResult::Found) => break,
            Err(e) => {
                println!("  search failed: {}", e);
                return;
            }
        }
    }

    let mut route = session.reconstruct_path();
    route.reverse();
    println!(
        "  {} steps, {} expansions, {} still open",
        route.len() - 1,
        session.expansions(),
        session.open_len()
    );
    render(grid, &route);
    println!();
}

/// Run a handful of single episodes
fn demo_episodes(grid: &OccupancyGrid, start: Location, goal: Location) {
    println!("--- 2. Training Episodes ---");

    let mut agent = create_agent(grid.clone());
    agent.set_endpoints(start, goal).expect("valid endpoints");

    for _ in 0..10 {
        let report = agent.train_once().expect("endpoints set");
        println!(
            "  episode {:>2}: {:<28} path {:>2} cells, alpha {:.3}",
            agent.total_training_count(),
            format!("{:?}", report.outcome),
            report.path.len(),
            report.learning_rate
        );
    }
    println!();
}

/// Auto-train and compare against A*
fn demo_comparison(grid: &OccupancyGrid, start: Location, goal: Location) {
    println!("--- 3. A* vs Q-Learning ---");

    let mut comparator = Comparator::new(grid.clone(), NavConfig::default());
    comparator.set_endpoints(start, goal).expect("valid endpoints");

    match comparator.compare() {
        Ok(report) => {
            println!(
                "  A*:         {} steps in {:?}",
                report.astar_steps(),
                report.astar.elapsed
            );
            match report.qlearning_steps() {
                Some(steps) => println!(
                    "  Q-learning: {} steps in {:?} after {} attempts",
                    steps, report.qlearning.elapsed, report.qlearning.summary.attempts
                ),
                None => println!(
                    "  Q-learning: no route after {} attempts",
                    report.qlearning.summary.attempts
                ),
            }
            if let Some(path) = report.qlearning.path() {
                render(grid, path);
            }
        }
        Err(e) => println!("  comparison failed: {}", e),
    }
    println!();
}

/// Save the learned table and load it into a fresh agent
fn demo_persistence(grid: &OccupancyGrid, start: Location, goal: Location) {
    println!("--- 4. Persistence ---");

    let path = std::env::temp_dir().join("maze_agents_demo.json");
    let mut agent =
        create_agent(grid.clone()).with_store(Box::new(JsonFileStore::new(&path)));
    agent.set_endpoints(start, goal).expect("valid endpoints");
    let summary = agent.start_auto_train().expect("endpoints set").finish();
    println!(
        "  trained: success={} attempts={} states={}",
        summary.success,
        summary.attempts,
        agent.table().len()
    );

    let mut restored =
        create_agent(grid.clone()).with_store(Box::new(JsonFileStore::new(&path)));
    restored.set_endpoints(start, goal).expect("valid endpoints");
    println!("  restored {} states from {:?}", restored.table().len(), path);
    match restored.best_path() {
        Ok(route) => println!("  restored agent walks {} steps", route.len() - 1),
        Err(e) => println!("  restored agent has no route: {}", e),
    }

    if let Err(e) = restored.reset_table() {
        println!("  cleanup failed: {}", e);
    }
}
