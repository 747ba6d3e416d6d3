/// Task registry and pool resolver.
///
/// Registration is additive with last-writer-wins overwrite; pools replace
/// wholesale. Both are written at content-pack load time and only read
/// during play.
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

use crate::core::rng::SessionRng;
use crate::core::sequencer::TaskContext;
use crate::schema::task::{TaskArgs, TaskOutcome, WeightedTask};

/// Meta ids excluded from the random-selection fallback.
pub const META_TASK_IDS: [&str; 2] = ["random", "checksum"];

/// An interactive challenge. The engine blocks step progression until the
/// returned future resolves.
#[async_trait]
pub trait TaskRoutine: Send + Sync {
    async fn run(&self, ctx: &mut TaskContext<'_>, args: &TaskArgs) -> TaskOutcome;
}

/// Outcome of a random pool resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Picked(String),
    /// No candidates anywhere; surfaced as a narrative placeholder, never
    /// an error.
    PoolEmpty,
}

/// Process-wide mapping from task id to routine, plus the named weighted
/// pools used for randomized selection.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: FxHashMap<String, Arc<dyn TaskRoutine>>,
    pools: FxHashMap<String, Vec<WeightedTask>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge routine entries into the registry. Later registrations for
    /// the same id silently overwrite earlier ones.
    pub fn register(
        &mut self,
        entries: impl IntoIterator<Item = (String, Arc<dyn TaskRoutine>)>,
    ) {
        for (id, routine) in entries {
            if self.tasks.insert(id.clone(), routine).is_some() {
                debug!(id = id.as_str(), "task routine overwritten");
            }
        }
    }

    /// Register a single routine.
    pub fn register_one(&mut self, id: impl Into<String>, routine: Arc<dyn TaskRoutine>) {
        self.register([(id.into(), routine)]);
    }

    /// Replace the named pool.
    pub fn register_pool(&mut self, name: impl Into<String>, entries: Vec<WeightedTask>) {
        self.pools.insert(name.into(), entries);
    }

    /// Look up a routine. A missing id is the caller's "procedure missing"
    /// path, not an error.
    pub fn get(&self, id: &str) -> Option<Arc<dyn TaskRoutine>> {
        self.tasks.get(id).cloned()
    }

    pub fn pool(&self, name: &str) -> Option<&[WeightedTask]> {
        self.pools.get(name).map(Vec::as_slice)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Pick a candidate from the union of the named pools, in pool order,
    /// duplicates allowed. An empty union falls back to every registered id
    /// except the meta ids; an empty fallback yields `PoolEmpty`.
    pub fn resolve_random(&self, pool_names: &[String], rng: &mut SessionRng) -> Resolution {
        let mut candidates: Vec<&str> = Vec::new();
        for name in pool_names {
            if let Some(entries) = self.pools.get(name) {
                candidates.extend(entries.iter().map(|w| w.id.as_str()));
            }
        }
        if candidates.is_empty() {
            candidates = self
                .tasks
                .keys()
                .map(String::as_str)
                .filter(|id| !META_TASK_IDS.contains(id))
                .collect();
            candidates.sort_unstable();
        }
        if candidates.is_empty() {
            return Resolution::PoolEmpty;
        }
        // TODO: honor pool weights during selection; every candidate is
        // currently equal-weight.
        let picked = candidates[rng.pick_index(candidates.len())];
        Resolution::Picked(picked.to_string())
    }
}
