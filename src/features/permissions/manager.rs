//! # Permission Manager
//!
//! File format: user id → action → allowed, pretty-printed.

use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::commands::{precondition, Precondition, PreconditionResult};
use crate::transport::{GuildId, UserId};

pub type RoleId = u64;

pub const PERMISSIONS_FILE: &str = "permissions.json";
pub const NO_PERMISSION: &str = "No Permission";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Permission {
    pub action: String,
    pub allow: bool,
}

type UserPermissions = BTreeMap<UserId, BTreeMap<String, bool>>;

pub struct PermissionManager {
    path: PathBuf,
    users: DashMap<UserId, HashMap<String, bool>>,
    guilds: DashMap<GuildId, HashMap<String, RoleId>>,
}

impl PermissionManager {
    /// In-memory manager saving to `path`; nothing is read or written yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            users: DashMap::new(),
            guilds: DashMap::new(),
        }
    }

    /// Load `path` if it exists, otherwise create it empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let manager = Self::new(path);
        if manager.path.exists() {
            manager.load()?;
        } else {
            manager.save()?;
        }
        Ok(manager)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_user_permission(&self, action: &str, user: UserId, allow: bool) {
        self.users
            .entry(user)
            .or_default()
            .insert(action.to_lowercase(), allow);
    }

    /// Unknown users and actions are denied
    pub fn user_permission(&self, user: UserId, action: &str) -> Permission {
        let allow = self
            .users
            .get(&user)
            .and_then(|actions| actions.get(&action.to_lowercase()).copied())
            .unwrap_or(false);
        Permission {
            action: action.to_lowercase(),
            allow,
        }
    }

    pub fn user_permissions(&self, user: UserId) -> Vec<Permission> {
        let mut permissions: Vec<Permission> = self
            .users
            .get(&user)
            .map(|actions| {
                actions
                    .iter()
                    .map(|(action, allow)| Permission {
                        action: action.clone(),
                        allow: *allow,
                    })
                    .collect()
            })
            .unwrap_or_default();
        permissions.sort();
        permissions
    }

    pub fn clear_all(&self) {
        self.users.clear();
    }

    pub fn save(&self) -> Result<()> {
        let snapshot: UserPermissions = self
            .users
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone().into_iter().collect()))
            .collect();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!("Saved permissions for {} users", snapshot.len());
        Ok(())
    }

    /// Merge the file into memory; entries absent from the file are kept
    pub fn load(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let loaded: UserPermissions = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed permissions file {}", self.path.display()))?;

        info!("🔐 Loaded permissions for {} users", loaded.len());
        for (user, actions) in loaded {
            self.users.entry(user).or_default().extend(actions);
        }
        Ok(())
    }

    /// Precondition allowing the invocation only when the author holds
    /// permission for the invoked command name
    pub fn produce_precondition(self: &Arc<Self>) -> Precondition {
        let manager = Arc::clone(self);
        precondition(move |event| {
            if manager.user_permission(event.author().id, event.command_name()).allow {
                PreconditionResult::Pass
            } else {
                PreconditionResult::fail(NO_PERMISSION)
            }
        })
    }

    /// Require `role` for `action` in `guild`
    pub fn set_guild_permission(&self, role: RoleId, action: &str, guild: GuildId) {
        self.guilds
            .entry(guild)
            .or_default()
            .insert(action.to_lowercase(), role);
    }

    pub fn remove_guild_permission(&self, action: &str, guild: GuildId) -> Option<RoleId> {
        self.guilds
            .get_mut(&guild)
            .and_then(|mut actions| actions.remove(&action.to_lowercase()))
    }

    pub fn guild_permission(&self, action: &str, guild: GuildId) -> Option<RoleId> {
        self.guilds
            .get(&guild)
            .and_then(|actions| actions.get(&action.to_lowercase()).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandEvent, CommandStruct, CommandsContainer};
    use crate::testing::{message, RecordingTransport, AUTHOR, GUILD, OTHER_USER};

    fn event(content: &str) -> CommandEvent {
        let command_struct = crate::commands::clean_command_message(content, "+");
        CommandEvent {
            command_struct,
            command: None,
            message: message(1, content, None),
            args: Vec::new(),
            container: Arc::new(CommandsContainer::new()),
            stealth_invocation: false,
            transport: RecordingTransport::new(),
        }
    }

    #[test]
    fn test_unknown_permissions_are_denied() {
        let manager = PermissionManager::new("unused.json");
        assert!(!manager.user_permission(AUTHOR, "ban").allow);
        assert!(manager.user_permissions(AUTHOR).is_empty());
    }

    #[test]
    fn test_set_and_list() {
        let manager = PermissionManager::new("unused.json");
        manager.set_user_permission("Kick", AUTHOR, true);
        manager.set_user_permission("ban", AUTHOR, false);

        assert!(manager.user_permission(AUTHOR, "kick").allow);
        assert_eq!(
            manager.user_permissions(AUTHOR),
            vec![
                Permission { action: "ban".into(), allow: false },
                Permission { action: "kick".into(), allow: true },
            ]
        );

        manager.clear_all();
        assert!(!manager.user_permission(AUTHOR, "kick").allow);
    }

    #[test]
    fn test_save_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PERMISSIONS_FILE);
        let manager = PermissionManager::new(&path);
        manager.set_user_permission("ping", AUTHOR, true);
        manager.save().unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed[AUTHOR.to_string()]["ping"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_load_merges_without_removing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PERMISSIONS_FILE);
        fs::write(&path, format!(r#"{{ "{AUTHOR}": {{ "ping": true }} }}"#)).unwrap();

        let manager = PermissionManager::new(&path);
        manager.set_user_permission("echo", AUTHOR, true);
        manager.set_user_permission("ban", OTHER_USER, true);
        manager.load().unwrap();

        assert!(manager.user_permission(AUTHOR, "ping").allow);
        assert!(manager.user_permission(AUTHOR, "echo").allow);
        assert!(manager.user_permission(OTHER_USER, "ban").allow);
    }

    #[test]
    fn test_open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(PERMISSIONS_FILE);
        PermissionManager::open(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PERMISSIONS_FILE);
        fs::write(&path, "[1, 2").unwrap();
        assert!(PermissionManager::open(&path).is_err());
    }

    #[test]
    fn test_precondition_checks_invoked_command() {
        let manager = Arc::new(PermissionManager::new("unused.json"));
        manager.set_user_permission("ping", AUTHOR, true);
        let check = manager.produce_precondition();

        assert!(check(&event("+ping")).is_pass());
        assert_eq!(check(&event("+ban someone")).visible_reason(), Some(NO_PERMISSION));
    }

    #[test]
    fn test_guild_role_permissions() {
        let manager = PermissionManager::new("unused.json");
        manager.set_guild_permission(77, "Ban", GUILD);

        assert_eq!(manager.guild_permission("ban", GUILD), Some(77));
        assert_eq!(manager.guild_permission("ban", GUILD + 1), None);
        assert_eq!(manager.remove_guild_permission("ban", GUILD), Some(77));
        assert_eq!(manager.guild_permission("ban", GUILD), None);
    }

    #[test]
    fn test_command_struct_default_denied() {
        let manager = Arc::new(PermissionManager::new("unused.json"));
        let check = manager.produce_precondition();
        let mut blank = event("+ping");
        blank.command_struct = CommandStruct::default();
        assert!(!check(&blank).is_pass());
    }
}
