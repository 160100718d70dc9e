pub mod positions;
pub mod roles;

pub use positions::Position;
pub use roles::{Permission, Role};
