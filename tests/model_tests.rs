//! Model construction tests
//!
//! State/action enumeration, reward feasibility and the transition row
//! invariant.

mod fixtures;

use reactive_planner::builder::{build_transitions, verify, MdpModel, ROW_SUM_TOLERANCE};
use reactive_planner::error::PlannerError;
use reactive_planner::model::{Action, State, StateSpace};
use reactive_planner::topology::RoadNetwork;
use reactive_planner::traits::{TaskDistribution, Topology};

use fixtures::{lucrative_a_to_b, random_instance, triangle};

// ============================================================================
// Test Oracles
// ============================================================================

/// Loses half of the probability mass of every origin.
struct LeakyOracle;

impl TaskDistribution for LeakyOracle {
    type Location = &'static str;

    fn probability(&self, _origin: &Self::Location, destination: Option<&Self::Location>) -> f64 {
        match destination {
            Some(_) => 0.0,
            None => 0.5,
        }
    }

    fn expected_reward(&self, _origin: &Self::Location, _destination: &Self::Location) -> f64 {
        0.0
    }
}

/// Two cities that never connect to anything.
struct Islands;

impl Topology for Islands {
    type Location = &'static str;

    fn locations(&self) -> Vec<Self::Location> {
        vec!["north", "south"]
    }

    fn is_adjacent(&self, _from: &Self::Location, _to: &Self::Location) -> bool {
        false
    }

    fn distance(&self, _from: &Self::Location, _to: &Self::Location) -> f64 {
        1.0
    }
}

/// A - B - C chain whose A-C pair has no finite route.
struct UnroutedChain;

impl Topology for UnroutedChain {
    type Location = &'static str;

    fn locations(&self) -> Vec<Self::Location> {
        vec!["A", "B", "C"]
    }

    fn is_adjacent(&self, from: &Self::Location, to: &Self::Location) -> bool {
        matches!((*from, *to), ("A", "B") | ("B", "A") | ("B", "C") | ("C", "B"))
    }

    fn distance(&self, from: &Self::Location, to: &Self::Location) -> f64 {
        match (*from, *to) {
            ("A", "C") | ("C", "A") => f64::INFINITY,
            _ => 1.0,
        }
    }
}

// ============================================================================
// Enumeration
// ============================================================================

#[test]
fn state_and_action_counts_follow_location_count() {
    for seed in 0..20 {
        let (network, _) = random_instance(seed);
        let n = network.cities().len();
        let space = StateSpace::enumerate(&network).unwrap();
        assert_eq!(space.state_count(), n * n);
        assert_eq!(space.action_count(), n + 1);
    }
}

#[test]
fn every_location_has_one_idle_state() {
    let space = StateSpace::enumerate(&triangle()).unwrap();
    let idle: Vec<_> = space
        .states()
        .iter()
        .filter(|state| state.task().is_none())
        .map(|state| *state.location())
        .collect();
    assert_eq!(idle, vec!["A", "B", "C"]);
}

// ============================================================================
// Rewards
// ============================================================================

#[test]
fn take_reward_is_payoff_minus_travel_cost() {
    let model = MdpModel::build(&triangle(), &lucrative_a_to_b(), 5.0).unwrap();

    let offer = State::Carrying { from: "A", to: "B" };
    assert_eq!(model.reward(&offer, &Action::Take), Some(50.0 - 5.0));

    // No listed task C -> A: zero payoff, still pays for the 2 km.
    let unpaid = State::Carrying { from: "C", to: "A" };
    assert_eq!(model.reward(&unpaid, &Action::Take), Some(-10.0));
}

#[test]
fn move_reward_only_depends_on_distance() {
    let model = MdpModel::build(&triangle(), &lucrative_a_to_b(), 5.0).unwrap();

    let offer = State::Carrying { from: "A", to: "B" };
    let idle = State::Idle { from: "A" };
    assert_eq!(model.reward(&offer, &Action::Move("C")), Some(-10.0));
    assert_eq!(model.reward(&idle, &Action::Move("C")), Some(-10.0));
    assert_eq!(model.reward(&idle, &Action::Move("B")), Some(-5.0));
}

#[test]
fn infeasible_pairs_have_no_reward() {
    let network = RoadNetwork::builder()
        .city("A")
        .city("B")
        .city("C")
        .road("A", "B", 1.0)
        .road("B", "C", 1.0)
        .build()
        .unwrap();
    let model = MdpModel::build(&network, &lucrative_a_to_b(), 1.0).unwrap();

    let idle = State::Idle { from: "A" };
    assert_eq!(model.reward(&idle, &Action::Take), None);
    assert_eq!(model.reward(&idle, &Action::Move("A")), None);
    // A and C are not neighbours.
    assert_eq!(model.reward(&idle, &Action::Move("C")), None);

    // Taking a task is allowed to a non-neighbour and pays the full path.
    let far = State::Carrying { from: "A", to: "C" };
    assert_eq!(model.reward(&far, &Action::Take), Some(-2.0));
}

// ============================================================================
// Transitions
// ============================================================================

#[test]
fn transitions_only_lead_to_the_reached_city() {
    let model = MdpModel::build(&triangle(), &lucrative_a_to_b(), 5.0).unwrap();
    let space = model.space();

    for s in 0..space.state_count() {
        for a in 0..space.action_count() {
            let row = model.transitions().row(s, a);
            if !model.rewards().is_feasible(s, a) {
                assert!(row.is_empty());
                continue;
            }
            let reached = space.actions()[a].reached(&space.states()[s]).unwrap();
            assert_eq!(row.len(), space.locations().len());
            for (next, _) in row {
                assert_eq!(space.states()[*next].location(), reached);
            }
        }
    }
}

#[test]
fn delivering_to_b_always_finds_b_idle() {
    let model = MdpModel::build(&triangle(), &lucrative_a_to_b(), 5.0).unwrap();
    let space = model.space();

    let offer = space.state_index(&State::Carrying { from: "A", to: "B" }).unwrap();
    let take = space.action_index(&Action::Take).unwrap();
    let idle_b = space.state_index(&State::Idle { from: "B" }).unwrap();
    let b_to_a = space.state_index(&State::Carrying { from: "B", to: "A" }).unwrap();

    assert_eq!(model.transitions().probability(offer, take, idle_b), 1.0);
    assert_eq!(model.transitions().probability(offer, take, b_to_a), 0.0);
}

#[test]
fn rows_sum_to_one_on_random_topologies() {
    for seed in 0..50 {
        let (network, tasks) = random_instance(seed);
        let model = MdpModel::build(&network, &tasks, 1.0).unwrap();

        let mut rows = 0;
        for (_, _, sum) in model.transitions().row_sums() {
            assert!(
                (sum - 1.0).abs() < ROW_SUM_TOLERANCE,
                "seed {}: row sums to {}",
                seed,
                sum
            );
            rows += 1;
        }
        assert_eq!(rows, model.rewards().feasible_count());
        assert!(verify(model.transitions()));
    }
}

// ============================================================================
// Rejections
// ============================================================================

#[test]
fn leaky_oracle_fails_verification() {
    let network = fixtures::two_cities(1.0);
    let space = StateSpace::enumerate(&network).unwrap();
    let transitions = build_transitions(&space, &network, &LeakyOracle);
    assert!(!verify(&transitions));

    let err = MdpModel::build(&network, &LeakyOracle, 1.0).unwrap_err();
    match err {
        PlannerError::InconsistentModel { sum, .. } => assert!((sum - 1.0).abs() > 0.4),
        other => panic!("expected InconsistentModel, got {:?}", other),
    }
}

#[test]
fn isolated_locations_are_rejected() {
    let err = MdpModel::build(&Islands, &LeakyOracle, 1.0).unwrap_err();
    assert!(matches!(err, PlannerError::IsolatedLocation { .. }));

    let single = RoadNetwork::builder().city("A").build().unwrap();
    let err = MdpModel::build(&single, &fixtures::no_tasks(), 1.0).unwrap_err();
    assert!(matches!(err, PlannerError::IsolatedLocation { .. }));
}

#[test]
fn negative_cost_is_rejected() {
    let err = MdpModel::build(&triangle(), &lucrative_a_to_b(), -1.0).unwrap_err();
    assert!(matches!(err, PlannerError::InvalidConfig { .. }));
}

#[test]
fn unroutable_task_reward_is_rejected() {
    let err = MdpModel::build(&UnroutedChain, &fixtures::no_tasks(), 1.0).unwrap_err();
    match err {
        PlannerError::NonFiniteReward { state, action, reward } => {
            assert!(reward.is_infinite() && reward < 0.0);
            assert_eq!(action, Action::<&str>::Take.to_string());
            assert_eq!(state, State::Carrying { from: "A", to: "C" }.to_string());
        }
        other => panic!("expected NonFiniteReward, got {:?}", other),
    }
}
