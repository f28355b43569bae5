//! Road network topology.
//!
//! Cities connected by undirected roads. Adjacency follows the roads; the
//! distance between any two cities is the shortest path over the roads.

use std::collections::HashMap;

use crate::error::{PlannerError, PlannerResult};
use crate::haversine::GeoPoint;
use crate::traits::{Id, Topology};

#[derive(Debug, Clone)]
pub struct RoadNetwork<L: Id> {
    cities: Vec<L>,
    index: HashMap<L, usize>,
    adjacent: Vec<Vec<bool>>,
    distances: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
enum RoadLength {
    Fixed(f64),
    Straight,
}

#[derive(Debug, Clone)]
pub struct RoadNetworkBuilder<L: Id> {
    cities: Vec<L>,
    positions: HashMap<L, GeoPoint>,
    roads: Vec<(L, L, RoadLength)>,
}

impl<L: Id> Default for RoadNetworkBuilder<L> {
    fn default() -> Self {
        Self {
            cities: Vec::new(),
            positions: HashMap::new(),
            roads: Vec::new(),
        }
    }
}

impl<L: Id> RoadNetworkBuilder<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city(mut self, city: L) -> Self {
        self.cities.push(city);
        self
    }

    /// Add a city with a map position, for use with [`Self::straight_road`].
    pub fn city_at(mut self, city: L, position: GeoPoint) -> Self {
        self.positions.insert(city.clone(), position);
        self.cities.push(city);
        self
    }

    pub fn road(mut self, from: L, to: L, length: f64) -> Self {
        self.roads.push((from, to, RoadLength::Fixed(length)));
        self
    }

    /// A road whose length is the great-circle distance between two cities
    /// added with [`Self::city_at`].
    pub fn straight_road(mut self, from: L, to: L) -> Self {
        self.roads.push((from, to, RoadLength::Straight));
        self
    }

    pub fn build(self) -> PlannerResult<RoadNetwork<L>> {
        let cities = dedupe_cities(self.cities);
        if cities.is_empty() {
            return Err(PlannerError::EmptyTopology);
        }

        let index: HashMap<L, usize> = cities
            .iter()
            .enumerate()
            .map(|(i, city)| (city.clone(), i))
            .collect();

        let n = cities.len();
        let mut adjacent = vec![vec![false; n]; n];
        let mut distances = vec![vec![f64::INFINITY; n]; n];
        for (i, row) in distances.iter_mut().enumerate() {
            row[i] = 0.0;
        }

        for (from, to, length) in &self.roads {
            let i = lookup(&index, from)?;
            let j = lookup(&index, to)?;
            if i == j {
                continue;
            }

            let length = match length {
                RoadLength::Fixed(length) => *length,
                RoadLength::Straight => {
                    let a = self.positions.get(from).ok_or_else(|| unknown(from))?;
                    let b = self.positions.get(to).ok_or_else(|| unknown(to))?;
                    a.distance_km(b)
                }
            };
            if !length.is_finite() || length < 0.0 {
                return Err(PlannerError::InvalidDistance {
                    from: format!("{:?}", from),
                    to: format!("{:?}", to),
                    distance: length,
                });
            }

            adjacent[i][j] = true;
            adjacent[j][i] = true;
            // Parallel roads: keep the shortest.
            let shortest = distances[i][j].min(length);
            distances[i][j] = shortest;
            distances[j][i] = shortest;
        }

        shortest_paths(&mut distances);

        for (i, row) in distances.iter().enumerate() {
            if let Some(j) = row.iter().position(|d| d.is_infinite()) {
                return Err(PlannerError::DisconnectedTopology {
                    from: format!("{:?}", cities[i]),
                    to: format!("{:?}", cities[j]),
                });
            }
        }

        Ok(RoadNetwork {
            cities,
            index,
            adjacent,
            distances,
        })
    }
}

impl<L: Id> RoadNetwork<L> {
    pub fn builder() -> RoadNetworkBuilder<L> {
        RoadNetworkBuilder::new()
    }

    pub fn cities(&self) -> &[L] {
        &self.cities
    }

    pub fn neighbours(&self, city: &L) -> Vec<&L> {
        match self.index.get(city) {
            Some(&i) => self
                .cities
                .iter()
                .enumerate()
                .filter(|(j, _)| self.adjacent[i][*j])
                .map(|(_, neighbour)| neighbour)
                .collect(),
            None => Vec::new(),
        }
    }
}

impl<L: Id> Topology for RoadNetwork<L> {
    type Location = L;

    fn locations(&self) -> Vec<L> {
        self.cities.clone()
    }

    fn is_adjacent(&self, from: &L, to: &L) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&i), Some(&j)) => self.adjacent[i][j],
            _ => false,
        }
    }

    fn distance(&self, from: &L, to: &L) -> f64 {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&i), Some(&j)) => self.distances[i][j],
            _ => f64::INFINITY,
        }
    }
}

/// Floyd-Warshall over the road lengths, in place.
fn shortest_paths(distances: &mut [Vec<f64>]) {
    let n = distances.len();
    for k in 0..n {
        for i in 0..n {
            if distances[i][k].is_infinite() {
                continue;
            }
            for j in 0..n {
                let via = distances[i][k] + distances[k][j];
                if via < distances[i][j] {
                    distances[i][j] = via;
                }
            }
        }
    }
}

fn dedupe_cities<L: Id>(cities: Vec<L>) -> Vec<L> {
    let mut unique: Vec<L> = Vec::with_capacity(cities.len());
    for city in cities {
        if !unique.contains(&city) {
            unique.push(city);
        }
    }
    unique
}

fn lookup<L: Id>(index: &HashMap<L, usize>, city: &L) -> PlannerResult<usize> {
    index.get(city).copied().ok_or_else(|| unknown(city))
}

fn unknown<L: Id>(city: &L) -> PlannerError {
    PlannerError::UnknownLocation {
        location: format!("{:?}", city),
    }
}
