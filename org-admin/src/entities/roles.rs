use crate::http_client::Resource;
use grid_staging::entity::is_blank;
use grid_staging::identity::as_server_id;
use grid_staging::{DetailEntity, Entity, Identity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_code: String,
    pub role_name: String,
    #[serde(default)]
    pub description: String,
    /// Built-in roles cannot be deleted from the console.
    #[serde(default)]
    pub is_system: bool,
}

impl Role {
    pub fn new(code: &str, name: &str) -> Self {
        Role {
            role_code: code.to_string(),
            role_name: name.to_string(),
            ..Role::default()
        }
    }

    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }
}

impl Entity for Role {
    type GroupKey = ();

    const KIND: &'static str = "role";
    const BUSINESS_KEY_FIELD: &'static str = "roleCode";

    fn is_protected(&self) -> bool {
        self.is_system
    }

    fn business_key(&self) -> Option<String> {
        Some(self.role_code.trim().to_uppercase())
    }

    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.role_code) {
            missing.push("roleCode");
        }
        if is_blank(&self.role_name) {
            missing.push("roleName");
        }
        missing
    }
}

impl Resource for Role {
    const PATH: &'static str = "roles";
}

/// Menu access granted to one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(rename = "roleId", with = "as_server_id")]
    pub role: Identity,
    pub menu_code: String,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
}

impl Permission {
    pub fn new(role: Identity, menu_code: &str) -> Self {
        Permission {
            role,
            menu_code: menu_code.to_string(),
            can_read: true,
            can_write: false,
        }
    }

    pub fn writable(mut self) -> Self {
        self.can_write = true;
        self
    }
}

impl Entity for Permission {
    type GroupKey = Identity;

    const KIND: &'static str = "permission";
    const BUSINESS_KEY_FIELD: &'static str = "menuCode";

    fn group_key(&self) -> Option<Identity> {
        Some(self.role.clone())
    }

    // A menu may be granted to many roles, but only once per role.
    fn business_key(&self) -> Option<String> {
        if is_blank(&self.menu_code) {
            return None;
        }
        Some(format!("{}/{}", self.role.row_key(), self.menu_code.trim().to_uppercase()))
    }

    fn missing_required(&self) -> Vec<&'static str> {
        if is_blank(&self.menu_code) {
            vec!["menuCode"]
        } else {
            Vec::new()
        }
    }
}

impl DetailEntity for Permission {
    fn master(&self) -> &Identity {
        &self.role
    }

    fn bind_master(&mut self, master: Identity) {
        self.role = master;
    }
}

impl Resource for Permission {
    const PATH: &'static str = "permissions";
    const SCOPE_PARAM: Option<&'static str> = Some("roleId");
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_staging::ServerId;

    #[test]
    fn permission_wire_form_uses_the_role_server_id() {
        let permission = Permission::new(Identity::Server(ServerId::new("R1")), "USERS").writable();
        let json = serde_json::to_value(&permission).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"roleId": "R1", "menuCode": "USERS", "canRead": true, "canWrite": true})
        );

        let back: Permission = serde_json::from_value(json).unwrap();
        assert_eq!(back, permission);
    }

    #[test]
    fn role_codes_compare_case_insensitively() {
        assert_eq!(Role::new(" adm ", "Admin").business_key(), Role::new("ADM", "Other").business_key());
        assert!(Role::new("ADM", "Admin").system().is_protected());
        assert_eq!(Role::default().missing_required(), vec!["roleCode", "roleName"]);
    }
}
