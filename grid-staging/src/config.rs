use serde::{Deserialize, Serialize};

/// Engine settings. Hosts usually embed this in their own config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on concurrently dispatched operations within one commit
    /// stage. `1` dispatches strictly in plan order.
    pub max_in_flight: usize,
    pub enforce_representative: bool,
    pub enforce_unique_business_key: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 1,
            enforce_representative: true,
            enforce_unique_business_key: true,
        }
    }
}

impl EngineConfig {
    pub fn in_flight_limit(&self) -> usize {
        self.max_in_flight.max(1)
    }
}
