//! User identity management.
//!
//! Each install gets a persistent opaque user identifier stored in
//! `identity.json`. It is attached to every delivered visit.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dwell_core::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identity stored in `identity.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: UserId,
    /// When the identifier was provisioned.
    pub created_at: DateTime<Utc>,
}

/// Loads the identity from `path`.
///
/// Returns `None` if the file doesn't exist.
/// Returns an error if the file exists but is unreadable/unparseable.
pub fn load_from(path: &Path) -> Result<Option<UserIdentity>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let identity: UserIdentity =
                serde_json::from_str(&content).context("failed to parse identity.json")?;
            Ok(Some(identity))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context("failed to read identity.json"),
    }
}

/// Provisions an identity at `path` unless one already exists.
///
/// Repeated calls return the stored identity unchanged.
pub fn init_at(path: &Path) -> Result<UserIdentity> {
    if let Some(existing) = load_from(path)? {
        return Ok(existing);
    }

    let user_id = UserId::new(format!("user-{}", Uuid::new_v4().simple()))
        .context("generated an invalid user ID")?;
    let identity = UserIdentity {
        user_id,
        created_at: Utc::now(),
    };
    save_to(path, &identity)?;
    tracing::info!(user_id = %identity.user_id, "provisioned user identity");
    Ok(identity)
}

/// Resolves the identifier to stamp on visits.
///
/// An explicit override wins; otherwise the stored identity is used.
pub fn resolve(path: &Path, explicit: Option<&str>) -> Result<Option<UserId>> {
    if let Some(raw) = explicit {
        let user_id = UserId::new(raw).context("invalid --user-id")?;
        return Ok(Some(user_id));
    }

    let stored = load_from(path)?.map(|identity| identity.user_id);
    if stored.is_none() {
        tracing::warn!(
            path = %path.display(),
            "no user identity found; visits will not be sent. Run 'dwell init' first."
        );
    }
    Ok(stored)
}

/// Writes the identity to `path`.
fn save_to(path: &Path, identity: &UserIdentity) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create data directory")?;
    }
    let json = serde_json::to_string_pretty(identity).context("failed to serialize identity")?;
    std::fs::write(path, json).context("failed to write identity.json")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_new_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("identity.json");

        let identity = init_at(&path).unwrap();
        assert!(identity.user_id.as_str().starts_with("user-"));
        assert!(path.exists());
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");

        let first = init_at(&path).unwrap();
        let second = init_at(&path).unwrap();
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(first.created_at, second.created_at);
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        assert!(load_from(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_from(&path).is_err());
    }

    #[test]
    fn test_resolve_prefers_explicit_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        init_at(&path).unwrap();

        let resolved = resolve(&path, Some("user-override")).unwrap();
        assert_eq!(resolved.unwrap().as_str(), "user-override");
    }

    #[test]
    fn test_resolve_rejects_blank_explicit_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        assert!(resolve(&path, Some("  ")).is_err());
    }

    #[test]
    fn test_resolve_without_identity_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        assert!(resolve(&path, None).unwrap().is_none());
    }
}
