//! Static credential directory.
//!
//! Users live in a JSON file of the form
//! `{ "users": [ { "username", "password", "email", ... } ] }`.
//! Login is a plain equality check; no tokens are issued.

use std::path::Path;

use fonteval_core::error::CoreError;
use fonteval_db::StoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
    /// Any other profile fields, returned to the client untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A user as returned by login: everything but the password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl From<&UserAccount> for UserProfile {
    fn from(account: &UserAccount) -> Self {
        Self {
            username: account.username.clone(),
            email: account.email.clone(),
            extra: account.extra.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserDirectory {
    #[serde(default)]
    users: Vec<UserAccount>,
}

impl UserDirectory {
    pub fn new(users: Vec<UserAccount>) -> Self {
        Self { users }
    }

    /// Read the credential file at `path`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let directory: Self = serde_json::from_str(&text)?;
        tracing::info!(
            path = %path.as_ref().display(),
            users = directory.users.len(),
            "Loaded user directory",
        );
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Check `username`/`password` against the directory.
    ///
    /// Blank fields are a validation error; any mismatch is unauthorized
    /// without saying which field was wrong.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<UserProfile, CoreError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(CoreError::Validation(
                "Username and password are required".into(),
            ));
        }

        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .map(UserProfile::from)
            .ok_or_else(|| CoreError::Unauthorized("Invalid username or password".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn directory() -> UserDirectory {
        serde_json::from_value(serde_json::json!({
            "users": [
                { "username": "alice", "password": "s3cret", "email": "alice@example.com", "team": "type" },
                { "username": "bob", "password": "hunter2" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_authenticate_returns_profile_without_password() {
        let profile = directory().authenticate("alice", "s3cret").unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.email, "alice@example.com");

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["team"], "type");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_authenticate_rejects_wrong_password() {
        assert_matches!(
            directory().authenticate("alice", "wrong"),
            Err(CoreError::Unauthorized(_))
        );
        assert_matches!(
            directory().authenticate("carol", "s3cret"),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn test_authenticate_requires_both_fields() {
        assert_matches!(
            directory().authenticate("", "s3cret"),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            directory().authenticate("alice", ""),
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn test_load_reads_users_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");
        tokio::fs::write(&path, r#"{"users":[{"username":"alice","password":"pw"}]}"#)
            .await
            .unwrap();

        let directory = UserDirectory::load(&path).await.unwrap();
        assert_eq!(directory.len(), 1);
        assert!(directory.authenticate("alice", "pw").is_ok());
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            UserDirectory::load(dir.path().join("absent.json")).await,
            Err(StoreError::Io(_))
        );
    }
}
