use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use paddla_core::{RepoResult, SessionStore};

/// Visitor sessions in Redis, one string key per session value.
///
/// Keys expire after `ttl_seconds`, so an abandoned checkout leaves nothing
/// behind on this side.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(connection_string: &str, ttl_seconds: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client, ttl_seconds })
    }

    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await
    }
}

fn session_key(session_id: &str, key: &str) -> String {
    format!("session:{}:{}", session_id, key)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session_id: &str, key: &str) -> RepoResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(session_key(session_id, key)).await?;
        Ok(value)
    }

    async fn set(&self, session_id: &str, key: &str, value: &str) -> RepoResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(session_key(session_id, key), value, self.ttl_seconds).await?;
        debug!("Session value set: {} -> {}", session_id, key);
        Ok(())
    }

    async fn pop(&self, session_id: &str, key: &str) -> RepoResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        // GETDEL reads and removes in one command, so two concurrent pops
        // cannot both see the value.
        let value: Option<String> = conn.get_del(session_key(session_id, key)).await?;
        Ok(value)
    }
}
