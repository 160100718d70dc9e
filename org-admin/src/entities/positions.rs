use crate::http_client::Resource;
use grid_staging::entity::is_blank;
use grid_staging::Entity;
use serde::{Deserialize, Serialize};

/// A position inside a concurrent-status group. Each group names exactly
/// one representative position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub concurrent_status_code: String,
    pub position_code: String,
    #[serde(default)]
    pub position_name: String,
    #[serde(default)]
    pub is_representative: bool,
    #[serde(default)]
    pub sequence: u32,
}

impl Position {
    pub fn new(status: &str, code: &str, representative: bool, sequence: u32) -> Self {
        Position {
            concurrent_status_code: status.to_string(),
            position_code: code.to_string(),
            position_name: String::new(),
            is_representative: representative,
            sequence,
        }
    }
}

impl Entity for Position {
    type GroupKey = String;

    const KIND: &'static str = "position";
    const REPRESENTATIVE_FIELD: &'static str = "isRepresentative";
    const BUSINESS_KEY_FIELD: &'static str = "positionCode";

    fn group_key(&self) -> Option<String> {
        Some(self.concurrent_status_code.clone())
    }

    fn is_representative(&self) -> Option<bool> {
        Some(self.is_representative)
    }

    fn set_representative(&mut self, representative: bool) {
        self.is_representative = representative;
    }

    fn sequence(&self) -> u32 {
        self.sequence
    }

    fn place_in_group(&mut self, key: String, sequence: u32) {
        self.concurrent_status_code = key;
        self.sequence = sequence;
    }

    fn business_key(&self) -> Option<String> {
        if is_blank(&self.position_code) {
            return None;
        }
        Some(format!("{}/{}", self.concurrent_status_code, self.position_code))
    }

    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.concurrent_status_code) {
            missing.push("concurrentStatusCode");
        }
        if is_blank(&self.position_code) {
            missing.push("positionCode");
        }
        missing
    }
}

impl Resource for Position {
    const PATH: &'static str = "positions";
}
