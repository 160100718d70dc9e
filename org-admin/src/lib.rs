//! Organisation admin console: role, permission and position grids on top
//! of the `grid-staging` engine, talking to the admin REST API.

pub mod config;
pub mod entities;
pub mod http_client;
pub mod notify;
pub mod screens;

pub use config::{ApiConfig, ConfigFormat, ConsoleConfig};
pub use entities::{Permission, Position, Role};
pub use http_client::{ApiClient, Resource, RestCollection};
pub use notify::{LogNotifier, Notification, NotificationQueue, NotificationSink, Severity};
pub use screens::{GridEvent, PositionAction, PositionLayout, PositionScreen, RoleAction, RolePermissionScreen};
