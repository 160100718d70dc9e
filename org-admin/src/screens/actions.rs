use super::GridEvent;
use crate::entities::{Permission, Position, Role};

#[derive(Debug, Clone)]
pub enum RoleAction {
    Load,
    SelectRole { row: Option<String> },
    AddRole,
    AddPermission { menu_code: String },
    RemoveSelectedRoles,
    RemoveSelectedPermissions,
    RoleGrid(GridEvent<Role>),
    PermissionGrid(GridEvent<Permission>),
    Commit,
    Cancel,
}

impl RoleAction {
    pub fn description(&self) -> &'static str {
        match self {
            RoleAction::Load => "Loading roles",
            RoleAction::SelectRole { .. } => "Selecting role",
            RoleAction::AddRole => "Adding role",
            RoleAction::AddPermission { .. } => "Assigning permission",
            RoleAction::RemoveSelectedRoles => "Removing selected roles",
            RoleAction::RemoveSelectedPermissions => "Removing selected permissions",
            RoleAction::RoleGrid(event) => event.description(),
            RoleAction::PermissionGrid(event) => event.description(),
            RoleAction::Commit => "Saving roles and permissions",
            RoleAction::Cancel => "Discarding changes",
        }
    }
}

#[derive(Debug, Clone)]
pub enum PositionAction {
    Load,
    AddPosition { concurrent_status_code: String },
    SetRepresentative { row: String },
    RemoveSelected,
    Grid(GridEvent<Position>),
    Commit,
    Cancel,
}

impl PositionAction {
    pub fn description(&self) -> &'static str {
        match self {
            PositionAction::Load => "Loading positions",
            PositionAction::AddPosition { .. } => "Adding position",
            PositionAction::SetRepresentative { .. } => "Setting representative position",
            PositionAction::RemoveSelected => "Removing selected positions",
            PositionAction::Grid(event) => event.description(),
            PositionAction::Commit => "Saving positions",
            PositionAction::Cancel => "Discarding changes",
        }
    }
}
