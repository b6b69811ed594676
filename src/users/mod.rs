pub mod repo;
pub mod repo_types;

pub use repo::{InMemoryUserRepo, PgUserRepo, RepoError, UserRepo};
pub use repo_types::{PublicUser, User};
