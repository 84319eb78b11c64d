use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Forced scan outcome for exercising the rejection path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SimulationMode {
    /// Scans go to the engine.
    Off,
    /// Every scan reports an infection.
    Always,
    /// The next `count` scans report an infection, then the mode reverts to off.
    Next { count: u64 },
}

#[derive(Debug, Default)]
struct SimulationState {
    always: AtomicBool,
    remaining: AtomicU64,
}

/// Per-instance simulation flag, shared by clones.
#[derive(Debug, Clone, Default)]
pub struct ScanSimulation {
    state: Arc<SimulationState>,
}

impl ScanSimulation {
    pub fn new(mode: SimulationMode) -> Self {
        let simulation = Self::default();
        simulation.set(mode);
        simulation
    }

    pub fn set(&self, mode: SimulationMode) {
        let (always, remaining) = match mode {
            SimulationMode::Off => (false, 0),
            SimulationMode::Always => (true, 0),
            SimulationMode::Next { count } => (false, count),
        };
        self.state.remaining.store(remaining, Ordering::SeqCst);
        self.state.always.store(always, Ordering::SeqCst);
    }

    pub fn mode(&self) -> SimulationMode {
        if self.state.always.load(Ordering::SeqCst) {
            return SimulationMode::Always;
        }
        match self.state.remaining.load(Ordering::SeqCst) {
            0 => SimulationMode::Off,
            count => SimulationMode::Next { count },
        }
    }

    /// Consume one simulated infection if the mode calls for it.
    pub fn take(&self) -> bool {
        if self.state.always.load(Ordering::SeqCst) {
            return true;
        }
        self.state
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_by_default() {
        let sim = ScanSimulation::default();
        assert_eq!(sim.mode(), SimulationMode::Off);
        assert!(!sim.take());
    }

    #[test]
    fn next_counts_down() {
        let sim = ScanSimulation::new(SimulationMode::Next { count: 2 });
        assert!(sim.take());
        assert_eq!(sim.mode(), SimulationMode::Next { count: 1 });
        assert!(sim.take());
        assert!(!sim.take());
        assert_eq!(sim.mode(), SimulationMode::Off);
    }

    #[test]
    fn always_until_switched_off() {
        let sim = ScanSimulation::new(SimulationMode::Always);
        let shared = sim.clone();
        assert!(sim.take());
        assert!(sim.take());
        shared.set(SimulationMode::Off);
        assert!(!sim.take());
    }

    #[test]
    fn wire_format() {
        let mode: SimulationMode =
            serde_json::from_str(r#"{"mode":"next","count":3}"#).unwrap();
        assert_eq!(mode, SimulationMode::Next { count: 3 });
        assert_eq!(
            serde_json::to_value(SimulationMode::Always).unwrap(),
            serde_json::json!({"mode": "always"})
        );
    }
}
