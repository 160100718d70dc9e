use crate::identity::Identity;
use std::fmt;

/// Domain payload carried by a row.
///
/// Grouping, representative handling and business-key checks are all opt-in:
/// the defaults describe an ungrouped entity without a representative flag
/// or a business key.
pub trait Entity: Clone + fmt::Debug + Send + Sync {
    type GroupKey: Ord + Clone + fmt::Debug + Send + Sync;

    /// Name used in logs and violation messages, e.g. `"role"`.
    const KIND: &'static str;
    const REPRESENTATIVE_FIELD: &'static str = "is_representative";
    const BUSINESS_KEY_FIELD: &'static str = "code";

    fn group_key(&self) -> Option<Self::GroupKey> {
        None
    }

    /// `None` when the entity has no representative concept.
    fn is_representative(&self) -> Option<bool> {
        None
    }

    fn set_representative(&mut self, _representative: bool) {}

    fn sequence(&self) -> u32 {
        0
    }

    /// Seeds a freshly added row with its group and position in that group.
    fn place_in_group(&mut self, _key: Self::GroupKey, _sequence: u32) {}

    fn is_protected(&self) -> bool {
        false
    }

    fn business_key(&self) -> Option<String> {
        None
    }

    /// Names of required fields that are currently blank.
    fn missing_required(&self) -> Vec<&'static str>;
}

/// Entity of a detail collection whose rows reference a master row.
pub trait DetailEntity: Entity {
    fn master(&self) -> &Identity;

    fn bind_master(&mut self, master: Identity);
}

/// Blank-string check shared by `missing_required` implementations.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
