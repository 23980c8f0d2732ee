//! In-memory [`UserStore`] backed by Argon2id hashes.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use sso_core::result::AppResult;
use sso_core::traits::{CreateUserOutcome, UserStore};
use sso_core::types::{UserId, UserInfo};

use crate::password::{PasswordDigest, PasswordHasher};

#[derive(Debug, Clone)]
struct StoredUser {
    info: UserInfo,
    password: PasswordDigest,
}

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<UserId, StoredUser>,
    by_email: HashMap<String, UserId>,
    by_username: HashMap<String, UserId>,
}

/// Process-local user store.
///
/// Emails are matched case-insensitively; usernames exactly.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Users>,
    hasher: PasswordHasher,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.by_id.len()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn verify_password(&self, email: &str, password: &str) -> AppResult<Option<UserInfo>> {
        let stored = {
            let users = self.users.read().await;
            users
                .by_email
                .get(&normalize_email(email))
                .and_then(|id| users.by_id.get(id))
                .cloned()
        };

        let Some(stored) = stored else {
            self.hasher.check_decoy(password);
            return Ok(None);
        };

        if self.hasher.matches(password, &stored.password)? {
            Ok(Some(stored.info))
        } else {
            Ok(None)
        }
    }

    async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AppResult<CreateUserOutcome> {
        let username = username.trim();
        let email = normalize_email(email);

        {
            let users = self.users.read().await;
            if users.by_email.contains_key(&email) || users.by_username.contains_key(username) {
                return Ok(CreateUserOutcome::Exists);
            }
        }

        // Hash outside the lock; the write below re-checks for a racing insert.
        let digest = self.hasher.digest(password)?;

        let mut users = self.users.write().await;
        if users.by_email.contains_key(&email) || users.by_username.contains_key(username) {
            return Ok(CreateUserOutcome::Exists);
        }

        let info = UserInfo {
            id: UserId::new(),
            username: username.to_string(),
            email: email.clone(),
        };
        users.by_email.insert(email, info.id);
        users.by_username.insert(info.username.clone(), info.id);
        users.by_id.insert(
            info.id,
            StoredUser {
                info: info.clone(),
                password: digest,
            },
        );

        Ok(CreateUserOutcome::Created(info))
    }

    async fn find(&self, id: UserId) -> AppResult<Option<UserInfo>> {
        Ok(self
            .users
            .read()
            .await
            .by_id
            .get(&id)
            .map(|stored| stored.info.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_verify() {
        let store = InMemoryUserStore::new();
        let CreateUserOutcome::Created(alice) =
            store.create("alice", "A@X.com", "secret1").await.unwrap()
        else {
            panic!("expected created");
        };
        assert_eq!(alice.email, "a@x.com");

        let found = store.verify_password("a@x.com ", "secret1").await.unwrap();
        assert_eq!(found, Some(alice.clone()));
        assert!(store.verify_password("a@x.com", "wrong").await.unwrap().is_none());
        assert!(store.verify_password("z@x.com", "secret1").await.unwrap().is_none());
        assert_eq!(store.find(alice.id).await.unwrap(), Some(alice));
        assert!(store.find(UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email() {
        let store = InMemoryUserStore::new();
        store.create("alice", "a@x.com", "secret1").await.unwrap();

        assert_eq!(
            store.create("alice", "new@x.com", "secret1").await.unwrap(),
            CreateUserOutcome::Exists
        );
        assert_eq!(
            store.create("alicia", "a@x.com", "secret1").await.unwrap(),
            CreateUserOutcome::Exists
        );
        assert_eq!(store.user_count().await, 1);
    }
}
