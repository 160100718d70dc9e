use crate::entity::{is_blank, DetailEntity, Entity};
use crate::identity::Identity;

/// Grouped entity with a representative flag, keyed by `code`.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub group: String,
    pub code: String,
    pub name: String,
    pub representative: bool,
    pub sequence: u32,
    pub protected: bool,
}

impl Item {
    pub fn new(group: &str, code: &str, representative: bool, sequence: u32) -> Self {
        Self {
            group: group.to_string(),
            code: code.to_string(),
            name: format!("{code} name"),
            representative,
            sequence,
            protected: false,
        }
    }

    pub fn blank() -> Self {
        Self {
            name: String::new(),
            ..Self::new("", "", false, 0)
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }
}

impl Entity for Item {
    type GroupKey = String;

    const KIND: &'static str = "item";

    fn group_key(&self) -> Option<String> {
        Some(self.group.clone())
    }

    fn is_representative(&self) -> Option<bool> {
        Some(self.representative)
    }

    fn set_representative(&mut self, representative: bool) {
        self.representative = representative;
    }

    fn sequence(&self) -> u32 {
        self.sequence
    }

    fn place_in_group(&mut self, key: String, sequence: u32) {
        self.group = key;
        self.sequence = sequence;
    }

    fn is_protected(&self) -> bool {
        self.protected
    }

    fn business_key(&self) -> Option<String> {
        Some(self.code.clone())
    }

    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.code) {
            missing.push("code");
        }
        if is_blank(&self.name) {
            missing.push("name");
        }
        missing
    }
}

/// Ungrouped master entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Parent {
    pub code: String,
    pub name: String,
}

impl Parent {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

impl Entity for Parent {
    type GroupKey = ();

    const KIND: &'static str = "parent";

    fn business_key(&self) -> Option<String> {
        Some(self.code.clone())
    }

    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.code) {
            missing.push("code");
        }
        if is_blank(&self.name) {
            missing.push("name");
        }
        missing
    }
}

/// Detail entity grouped by the master it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub master: Identity,
    pub permission: String,
}

impl Child {
    pub fn new(master: Identity, permission: &str) -> Self {
        Self {
            master,
            permission: permission.to_string(),
        }
    }
}

impl Entity for Child {
    type GroupKey = Identity;

    const KIND: &'static str = "child";
    const BUSINESS_KEY_FIELD: &'static str = "permission";

    fn group_key(&self) -> Option<Identity> {
        Some(self.master.clone())
    }

    fn business_key(&self) -> Option<String> {
        Some(format!("{}/{}", self.master.row_key(), self.permission))
    }

    fn missing_required(&self) -> Vec<&'static str> {
        if is_blank(&self.permission) {
            vec!["permission"]
        } else {
            Vec::new()
        }
    }
}

impl DetailEntity for Child {
    fn master(&self) -> &Identity {
        &self.master
    }

    fn bind_master(&mut self, master: Identity) {
        self.master = master;
    }
}
