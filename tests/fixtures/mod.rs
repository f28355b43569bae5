//! Shared topologies and task tables for the planner tests.
//!
//! - the three-city scenario with a single lucrative task out of A
//! - a two-city network where no task ever appears
//! - seeded random small networks

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use reactive_planner::distribution::TaskTable;
use reactive_planner::topology::RoadNetwork;

/// A, B, C fully connected: A-B = 1, B-C = 1, A-C = 2.
pub fn triangle() -> RoadNetwork<&'static str> {
    RoadNetwork::builder()
        .city("A")
        .city("B")
        .city("C")
        .road("A", "B", 1.0)
        .road("B", "C", 1.0)
        .road("A", "C", 2.0)
        .build()
        .expect("triangle network")
}

/// A task A -> B paying 50 is always on offer at A; nothing elsewhere.
pub fn lucrative_a_to_b() -> TaskTable<&'static str> {
    TaskTable::builder()
        .task("A", "B", 1.0, 50.0)
        .build()
        .expect("task table")
}

pub fn two_cities(length: f64) -> RoadNetwork<&'static str> {
    RoadNetwork::builder()
        .city("A")
        .city("B")
        .road("A", "B", length)
        .build()
        .expect("two city network")
}

pub fn no_tasks() -> TaskTable<&'static str> {
    TaskTable::builder().build().expect("empty task table")
}

/// A connected network of 2 to 6 cities with a random task table.
pub fn random_instance(seed: u64) -> (RoadNetwork<usize>, TaskTable<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n: usize = rng.gen_range(2..=6);

    let mut network = RoadNetwork::builder();
    for city in 0..n {
        network = network.city(city);
    }
    // A chain keeps the network connected; extra roads add shortcuts.
    for city in 1..n {
        network = network.road(city - 1, city, rng.gen_range(1.0..10.0));
    }
    for a in 0..n {
        for b in a + 2..n {
            if rng.gen_bool(0.3) {
                network = network.road(a, b, rng.gen_range(1.0..10.0));
            }
        }
    }

    let mut tasks = TaskTable::builder();
    for origin in 0..n {
        let task_mass = rng.gen_range(0.0..0.95);
        let weights: Vec<f64> = (0..n).map(|_| rng.gen_range(0.01..1.0)).collect();
        let total: f64 = weights
            .iter()
            .enumerate()
            .filter(|(dest, _)| *dest != origin)
            .map(|(_, w)| w)
            .sum();
        for (dest, weight) in weights.iter().enumerate() {
            if dest != origin {
                tasks = tasks.task(origin, dest, task_mass * weight / total, rng.gen_range(0.0..100.0));
            }
        }
    }

    (
        network.build().expect("random network"),
        tasks.build().expect("random task table"),
    )
}
