//! # Permissions Feature
//!
//! Per-user command permissions persisted as JSON, plus per-guild role
//! requirements for actions.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: true

pub mod manager;

pub use manager::{Permission, PermissionManager, RoleId, NO_PERMISSION, PERMISSIONS_FILE};
