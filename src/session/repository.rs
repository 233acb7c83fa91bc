use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use super::models::SessionData;
use crate::shared::AppError;

/// Prefix of every session key written to the key-value backend
pub const SESSION_KEY_PREFIX: &str = "session_";

/// Trait for session backend operations
///
/// Backends own expiry: a session saved with a TTL must read back as absent
/// once the TTL has elapsed.
#[async_trait]
pub trait SessionRepository {
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>, AppError>;
    async fn save(&self, session_id: &str, data: &SessionData, ttl: Duration)
        -> Result<(), AppError>;
    async fn delete(&self, session_id: &str) -> Result<(), AppError>;
}

struct StoredSession {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// In-memory implementation of SessionRepository for development and testing
///
/// Data is lost when the application restarts.
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, StoredSession>>,
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the number of stored sessions, expired ones included
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredSession>>, AppError> {
        self.sessions.lock().map_err(|_| {
            error!("In-memory session map lock poisoned");
            AppError::Internal
        })
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self))]
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>, AppError> {
        let mut sessions = self.lock()?;

        let expired = match sessions.get(session_id) {
            Some(stored) if stored.expires_at > Utc::now() => {
                debug!(session_id = %session_id, "Session found in memory");
                return Ok(Some(stored.data.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!(session_id = %session_id, "Session expired in memory");
            sessions.remove(session_id);
        } else {
            debug!(session_id = %session_id, "Session not found in memory");
        }
        Ok(None)
    }

    #[instrument(skip(self, data))]
    async fn save(
        &self,
        session_id: &str,
        data: &SessionData,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| {
            warn!(session_id = %session_id, "Session TTL out of range");
            AppError::Internal
        })?;

        self.lock()?.insert(
            session_id.to_string(),
            StoredSession {
                data: data.clone(),
                expires_at: Utc::now() + ttl,
            },
        );

        debug!(session_id = %session_id, "Session saved in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, session_id: &str) -> Result<(), AppError> {
        if self.lock()?.remove(session_id).is_none() {
            debug!(session_id = %session_id, "Deleted session was not in memory");
        }
        Ok(())
    }
}

/// Redis implementation of session repository
///
/// Holds a fixed set of multiplexed connections and hands them out
/// round-robin.
pub struct RedisSessionRepository {
    connections: Vec<ConnectionManager>,
    next: AtomicUsize,
}

impl RedisSessionRepository {
    /// Opens `pool_size` connections (at least one) to the Redis server at `address`
    ///
    /// `address` is either a bare `host:port` or a full `redis://` / `rediss://` URL.
    pub async fn connect(address: &str, pool_size: usize) -> Result<Self, RedisError> {
        let client = open_client(address)?;

        let mut connections = Vec::with_capacity(pool_size.max(1));
        for _ in 0..pool_size.max(1) {
            connections.push(ConnectionManager::new(client.clone()).await?);
        }

        tracing::info!(pool_size = connections.len(), "Redis session store connected");

        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    fn connection(&self) -> ConnectionManager {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.connections[index].clone()
    }
}

fn open_client(address: &str) -> Result<Client, RedisError> {
    if address.contains("://") {
        Client::open(address)
    } else {
        Client::open(format!("redis://{}", address))
    }
}

fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, session_id)
}

fn redis_error(e: RedisError) -> AppError {
    warn!(error = %e, "Session backend request failed");
    AppError::SessionStore(e.to_string())
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    #[instrument(skip(self))]
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>, AppError> {
        let mut conn = self.connection();
        let value: Option<String> = conn
            .get(session_key(session_id))
            .await
            .map_err(redis_error)?;

        let Some(json) = value else {
            debug!(session_id = %session_id, "Session not found in Redis");
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                // Unreadable payloads are treated like a missing session.
                warn!(session_id = %session_id, error = %e, "Discarding undecodable session");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, data))]
    async fn save(
        &self,
        session_id: &str,
        data: &SessionData,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let json = serde_json::to_string(data).map_err(|e| {
            AppError::SessionStore(format!("Failed to encode session: {}", e))
        })?;

        let mut conn = self.connection();
        conn.set_ex::<_, _, ()>(session_key(session_id), json, ttl.as_secs().max(1))
            .await
            .map_err(redis_error)?;

        debug!(session_id = %session_id, ttl_seconds = ttl.as_secs(), "Session saved in Redis");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, session_id: &str) -> Result<(), AppError> {
        let mut conn = self.connection();
        let _: () = conn
            .del(session_key(session_id))
            .await
            .map_err(redis_error)?;

        debug!(session_id = %session_id, "Session deleted from Redis");
        Ok(())
    }
}
