//! States, actions and their enumeration.
//!
//! States and actions are enumerated once into dense indices so the tables
//! and the solver work on plain vectors.

use std::collections::HashMap;
use std::fmt;

use crate::error::{PlannerError, PlannerResult};
use crate::traits::{Id, Topology};

/// Situation of the vehicle when a decision is due.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum State<L> {
    /// At `from` with no task on offer.
    Idle { from: L },
    /// At `from` with a task on offer to `to` (`from != to`).
    Carrying { from: L, to: L },
}

impl<L> State<L> {
    pub fn location(&self) -> &L {
        match self {
            State::Idle { from } | State::Carrying { from, .. } => from,
        }
    }

    /// Destination of the offered task, if any.
    pub fn task(&self) -> Option<&L> {
        match self {
            State::Idle { .. } => None,
            State::Carrying { to, .. } => Some(to),
        }
    }
}

impl<L: fmt::Debug> fmt::Display for State<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Idle { from } => write!(f, "State[{:?}, idle]", from),
            State::Carrying { from, to } => write!(f, "State[{:?} -> {:?}]", from, to),
        }
    }
}

/// What the vehicle does next.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action<L> {
    /// Pick up the offered task and deliver it.
    Take,
    /// Drive empty to a neighbouring city.
    Move(L),
}

impl<L: fmt::Debug> fmt::Display for Action<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Take => write!(f, "Action[take]"),
            Action::Move(dest) => write!(f, "Action[move {:?}]", dest),
        }
    }
}

impl<L: PartialEq> Action<L> {
    /// City the vehicle ends up in after performing this action in `state`,
    /// or `None` when the action is structurally impossible there.
    pub fn reached<'a>(&'a self, state: &'a State<L>) -> Option<&'a L> {
        match (self, state) {
            (Action::Take, State::Idle { .. }) => None,
            (Action::Take, State::Carrying { to, .. }) => Some(to),
            (Action::Move(dest), state) if dest == state.location() => None,
            (Action::Move(dest), _) => Some(dest),
        }
    }
}

/// The enumerated state and action sets of a topology.
///
/// For `n` locations, states departing from location `i` occupy indices
/// `i * n .. (i + 1) * n`: the `n - 1` carrying states in location order,
/// then the idle state. Actions are `Take` followed by one `Move` per
/// location.
#[derive(Debug, Clone)]
pub struct StateSpace<L: Id> {
    locations: Vec<L>,
    location_index: HashMap<L, usize>,
    states: Vec<State<L>>,
    state_index: HashMap<State<L>, usize>,
    actions: Vec<Action<L>>,
}

impl<L: Id> StateSpace<L> {
    pub fn enumerate<T>(topology: &T) -> PlannerResult<Self>
    where
        T: Topology<Location = L>,
    {
        let mut locations: Vec<L> = Vec::new();
        for location in topology.locations() {
            if !locations.contains(&location) {
                locations.push(location);
            }
        }
        if locations.is_empty() {
            return Err(PlannerError::EmptyTopology);
        }

        let n = locations.len();
        let mut states = Vec::with_capacity(n * n);
        for from in &locations {
            for to in &locations {
                if from != to {
                    states.push(State::Carrying {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
            }
            states.push(State::Idle { from: from.clone() });
        }

        let mut actions = Vec::with_capacity(n + 1);
        actions.push(Action::Take);
        actions.extend(locations.iter().cloned().map(Action::Move));

        let location_index = locations
            .iter()
            .enumerate()
            .map(|(i, location)| (location.clone(), i))
            .collect();
        let state_index = states
            .iter()
            .enumerate()
            .map(|(i, state)| (state.clone(), i))
            .collect();

        Ok(Self {
            locations,
            location_index,
            states,
            state_index,
            actions,
        })
    }

    pub fn locations(&self) -> &[L] {
        &self.locations
    }

    pub fn states(&self) -> &[State<L>] {
        &self.states
    }

    pub fn actions(&self) -> &[Action<L>] {
        &self.actions
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn state_index(&self, state: &State<L>) -> Option<usize> {
        self.state_index.get(state).copied()
    }

    pub fn action_index(&self, action: &Action<L>) -> Option<usize> {
        match action {
            Action::Take => Some(0),
            Action::Move(dest) => self.location_index.get(dest).map(|i| i + 1),
        }
    }

    /// Indices of every state whose vehicle is at `location`.
    pub fn states_at(&self, location: &L) -> std::ops::Range<usize> {
        match self.location_index.get(location) {
            Some(&i) => {
                let n = self.locations.len();
                i * n..(i + 1) * n
            }
            None => 0..0,
        }
    }
}
