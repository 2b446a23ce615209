//! Shared application state.
//!
//! The domain is an in-memory stand-in for the persistence layer: users with
//! roles and their comments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub author_id: u64,
    pub contents: String,
}

#[derive(Clone, Default)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Default)]
struct AppStateInner {
    users: RwLock<BTreeMap<u64, User>>,
    comments: RwLock<BTreeMap<u64, Comment>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State preloaded with a couple of users and comments.
    pub fn seeded() -> Self {
        let users = [
            User {
                id: 1,
                email: "admin@example.com".to_string(),
                role: UserRole::Admin,
            },
            User {
                id: 2,
                email: "member@example.com".to_string(),
                role: UserRole::User,
            },
        ];
        let comments = [Comment {
            id: 1,
            author_id: 2,
            contents: "first!".to_string(),
        }];

        Self {
            inner: Arc::new(AppStateInner {
                users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
                comments: RwLock::new(comments.into_iter().map(|c| (c.id, c)).collect()),
            }),
        }
    }

    pub async fn users(&self) -> Vec<User> {
        self.inner.users.read().await.values().cloned().collect()
    }

    pub async fn user(&self, id: u64) -> Option<User> {
        self.inner.users.read().await.get(&id).cloned()
    }

    /// Change a user's role, returning the updated user.
    pub async fn set_role(&self, id: u64, role: UserRole) -> Option<User> {
        let mut users = self.inner.users.write().await;
        let user = users.get_mut(&id)?;
        user.role = role;
        Some(user.clone())
    }

    pub async fn delete_comment(&self, id: u64) -> Option<Comment> {
        self.inner.comments.write().await.remove(&id)
    }
}
