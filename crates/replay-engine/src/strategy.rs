//! Strategy interface and registry.
//!
//! The replay engine depends only on this narrow capability interface, never
//! on concrete strategy types. Implementations live outside this crate;
//! signal logic (indicators, models) is a collaborator concern.

use backtest_core::types::{MarketObservation, OpenPosition, Signal};
use backtest_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// A trading strategy consulted once per time step.
///
/// Implementations must not fail for recoverable conditions; a returned
/// error is treated by the replay engine as "no signal this step" and logged,
/// isolated per strategy so one faulty strategy cannot abort a run.
///
/// Strategies are shared read-only across parallel walk-forward windows,
/// hence `Send + Sync`.
pub trait Strategy: Send + Sync {
    /// Name used for config resolution and trade attribution.
    fn name(&self) -> &str;

    /// Produce signals for the observations of the current time step.
    fn generate_signals(&self, observations: &[MarketObservation]) -> anyhow::Result<Vec<Signal>>;

    /// Whether an open position owned by this strategy should be closed.
    fn should_exit(
        &self,
        position: &OpenPosition,
        observations: &[MarketObservation],
    ) -> anyhow::Result<bool> {
        let _ = (position, observations);
        Ok(false)
    }
}

/// Explicit strategy registry, constructed by the caller and handed to the
/// coordinator. No ambient statics.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under its own name. Re-registering a name
    /// replaces the previous entry.
    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies
            .insert(strategy.name().to_string(), strategy);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(name).cloned()
    }

    /// Resolve a list of configured names into strategy handles. Unknown
    /// names are a configuration-level failure.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<Arc<dyn Strategy>>> {
        names
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| Error::UnknownStrategy(name.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
