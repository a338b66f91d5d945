use async_trait::async_trait;
use sqlx::PgPool;

use paddla_core::{AdminUser, AdminUserRepository, RepoResult};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    pw_hash: String,
}

impl From<UserRow> for AdminUser {
    fn from(row: UserRow) -> Self {
        AdminUser {
            id: row.id,
            username: row.username,
            pw_hash: row.pw_hash,
        }
    }
}

#[async_trait]
impl AdminUserRepository for PgUserStore {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<AdminUser>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT id, username, pw_hash FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AdminUser::from))
    }

    async fn create_user(&self, username: &str, pw_hash: &str) -> RepoResult<AdminUser> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (username, pw_hash) VALUES ($1, $2) RETURNING id, username, pw_hash",
        )
        .bind(username)
        .bind(pw_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}
