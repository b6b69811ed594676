use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::users::repo_types::User;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("username already exists")]
    UsernameTaken,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage for user records. `create` must be atomic with respect to the
/// username uniqueness check.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, username, password_hash, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, RepoError> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            let unique = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if unique {
                RepoError::UsernameTaken
            } else {
                RepoError::Database(e)
            }
        })?;

        inserted.ok_or(RepoError::UsernameTaken)
    }
}

/// Process-local store, selected with `DATABASE_URL=memory://`. Ids start at 1.
#[derive(Default)]
pub struct InMemoryUserRepo {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == username) {
            return Err(RepoError::UsernameTaken);
        }
        let user = User {
            id: users.len() as i64 + 1,
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let repo = InMemoryUserRepo::new();
        let alice = repo.create("alice", "h1").await.expect("create alice");
        let bob = repo.create("bob", "h2").await.expect("create bob");
        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
    }

    #[tokio::test]
    async fn find_by_username_and_id() {
        let repo = InMemoryUserRepo::new();
        let created = repo.create("alice", "hash").await.expect("create");

        let by_name = repo.find_by_username("alice").await.expect("lookup");
        assert_eq!(by_name.map(|u| u.id), Some(created.id));

        let by_id = repo.find_by_id(created.id).await.expect("lookup");
        assert_eq!(by_id.map(|u| u.username), Some("alice".to_string()));

        assert!(repo.find_by_username("nobody").await.expect("lookup").is_none());
        assert!(repo.find_by_id(42).await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let repo = InMemoryUserRepo::new();
        repo.create("alice", "h1").await.expect("first create");
        let err = repo.create("alice", "h2").await.unwrap_err();
        assert!(matches!(err, RepoError::UsernameTaken));

        let stored = repo.find_by_username("alice").await.expect("lookup").expect("present");
        assert_eq!(stored.password_hash, "h1");
    }

    #[tokio::test]
    async fn concurrent_registrations_have_one_winner() {
        let repo: Arc<dyn UserRepo> = Arc::new(InMemoryUserRepo::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.create("racer", &format!("hash-{i}")).await
            }));
        }

        let mut wins = 0;
        let mut conflicts = 0;
        for h in handles {
            match h.await.expect("task should not panic") {
                Ok(_) => wins += 1,
                Err(RepoError::UsernameTaken) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 15);
    }
}
