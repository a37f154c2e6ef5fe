//! Redis backend for the order store.
//!
//! This crate implements [`OrderBackend`] over Redis using a
//! [`ConnectionManager`] (a multiplexed connection that reconnects on
//! failure and is safe to share across tasks).
//!
//! # Command mapping
//!
//! | Backend call     | Redis                                   |
//! |------------------|-----------------------------------------|
//! | `ping`           | `PING`                                  |
//! | `get`            | `GET key`                               |
//! | `get_many`       | `MGET key...`                           |
//! | `replace`        | `SET key value XX`                      |
//! | `insert_indexed` | Lua: `SET key value NX` + `SADD index`  |
//! | `remove_indexed` | Lua: `DEL key` + `SREM index`           |
//! | `scan_index`     | `SSCAN index cursor COUNT n`            |
//!
//! # Atomicity
//!
//! The record write and the index update run inside one Lua script, which
//! Redis executes without interleaving any other client's commands. `MULTI`
//! cannot express "add to the index only if the conditional write took
//! effect", so a script is used instead. Redis does not roll back a script
//! that fails half way, so the scripts check the index key's type before
//! writing anything; the only command that could fail after the first write
//! is ruled out up front.
//!
//! # Example
//!
//! ```no_run
//! use order_api_redis::RedisBackend;
//! use order_api_core::OrderStore;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = RedisBackend::connect("redis://127.0.0.1:6379", Duration::from_secs(5)).await?;
//! let store = OrderStore::new(Arc::new(backend));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use order_api_core::backend::{BackendError, BackendFuture, OrderBackend, ScanPage};
use redis::aio::ConnectionManager;
use redis::{Client, ErrorKind, RedisError, Script};
use std::time::Duration;

/// Write the record if absent, then index it. Returns 1 if written, 0 if the key existed.
const INSERT_INDEXED_SCRIPT: &str = r"
    local key = KEYS[1]
    local index_key = KEYS[2]

    local index_type = redis.call('TYPE', index_key)['ok']
    if index_type ~= 'set' and index_type ~= 'none' then
        return redis.error_reply('WRONGTYPE order index is not a set')
    end

    if redis.call('SET', key, ARGV[1], 'NX') then
        redis.call('SADD', index_key, key)
        return 1
    end
    return 0
";

/// Delete the record, then unindex it. Returns 1 if deleted, 0 if the key was absent.
const REMOVE_INDEXED_SCRIPT: &str = r"
    local key = KEYS[1]
    local index_key = KEYS[2]

    local index_type = redis.call('TYPE', index_key)['ok']
    if index_type ~= 'set' and index_type ~= 'none' then
        return redis.error_reply('WRONGTYPE order index is not a set')
    end

    if redis.call('DEL', key) == 1 then
        redis.call('SREM', index_key, key)
        return 1
    end
    return 0
";

/// Redis-backed [`OrderBackend`].
///
/// Cloning is cheap; clones share the underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisBackend {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
    insert_script: Script,
    remove_script: Script,
}

impl RedisBackend {
    /// Connect to Redis and verify it answers `PING`.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `connect_timeout` - Upper bound on connecting plus the initial `PING`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Connection`] if the URL is invalid, the server
    /// is unreachable, or it does not answer within `connect_timeout`.
    pub async fn connect(redis_url: &str, connect_timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::open(redis_url).map_err(|e| {
            BackendError::Connection(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                BackendError::Connection(format!(
                    "Timed out connecting to Redis after {connect_timeout:?}"
                ))
            })?
            .map_err(|e| {
                BackendError::Connection(format!("Failed to create Redis connection manager: {e}"))
            })?;

        let backend = Self {
            conn_manager,
            insert_script: Script::new(INSERT_INDEXED_SCRIPT),
            remove_script: Script::new(REMOVE_INDEXED_SCRIPT),
        };

        tokio::time::timeout(connect_timeout, backend.ping())
            .await
            .map_err(|_| {
                BackendError::Connection(format!(
                    "Redis did not answer PING within {connect_timeout:?}"
                ))
            })??;

        tracing::info!("Connected to Redis");
        Ok(backend)
    }
}

/// Classify a Redis error.
fn map_err(context: &str, err: &RedisError) -> BackendError {
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
    {
        BackendError::Connection(format!("{context}: {err}"))
    } else if err.kind() == ErrorKind::ExecAbortError {
        BackendError::Aborted(format!("{context}: {err}"))
    } else {
        BackendError::Command(format!("{context}: {err}"))
    }
}

impl OrderBackend for RedisBackend {
    fn ping(&self) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            let _: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .map_err(|e| map_err("Failed to ping Redis", &e))?;
            Ok(())
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Option<String>> {
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            let value: Option<String> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut conn)
                .await
                .map_err(|e| map_err("Failed to get order", &e))?;
            Ok(value)
        })
    }

    fn get_many<'a>(&'a self, keys: &'a [String]) -> BackendFuture<'a, Vec<Option<String>>> {
        Box::pin(async move {
            if keys.is_empty() {
                return Ok(Vec::new());
            }
            let mut conn = self.conn_manager.clone();
            let values: Vec<Option<String>> = redis::cmd("MGET")
                .arg(keys)
                .query_async(&mut conn)
                .await
                .map_err(|e| map_err("Failed to get orders", &e))?;

            if values.len() != keys.len() {
                return Err(BackendError::Command(format!(
                    "MGET returned {} values for {} keys",
                    values.len(),
                    keys.len()
                )));
            }
            Ok(values)
        })
    }

    fn replace<'a>(&'a self, key: &'a str, value: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            // Nil reply means the key was absent and nothing was written.
            let reply: Option<String> = redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("XX")
                .query_async(&mut conn)
                .await
                .map_err(|e| map_err("Failed to update order", &e))?;
            Ok(reply.is_some())
        })
    }

    fn insert_indexed<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        index: &'a str,
    ) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            let inserted: i64 = self
                .insert_script
                .key(key)
                .key(index)
                .arg(value)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| map_err("Failed to execute atomic order insert", &e))?;
            Ok(inserted == 1)
        })
    }

    fn remove_indexed<'a>(&'a self, key: &'a str, index: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            let removed: i64 = self
                .remove_script
                .key(key)
                .key(index)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| map_err("Failed to execute atomic order delete", &e))?;
            Ok(removed == 1)
        })
    }

    fn scan_index<'a>(
        &'a self,
        index: &'a str,
        cursor: u64,
        count: usize,
    ) -> BackendFuture<'a, ScanPage> {
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            let (cursor, keys): (u64, Vec<String>) = redis::cmd("SSCAN")
                .arg(index)
                .arg(cursor)
                .arg("COUNT")
                .arg(count)
                .query_async(&mut conn)
                .await
                .map_err(|e| map_err("Failed to scan order index", &e))?;
            Ok(ScanPage { cursor, keys })
        })
    }
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_check_index_type_before_writing() {
        for script in [INSERT_INDEXED_SCRIPT, REMOVE_INDEXED_SCRIPT] {
            let type_check = script.find("'TYPE'");
            let first_write = script
                .find("'SET'")
                .or_else(|| script.find("'DEL'"));
            assert!(type_check.is_some());
            assert!(type_check < first_write);
        }
    }

    #[test]
    fn test_command_error_classification() {
        let err = RedisError::from((ErrorKind::TypeError, "wrong type"));
        assert!(matches!(map_err("ctx", &err), BackendError::Command(_)));

        let err = RedisError::from((ErrorKind::ExecAbortError, "aborted"));
        assert!(matches!(map_err("ctx", &err), BackendError::Aborted(_)));

        let err = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(map_err("ctx", &err), BackendError::Connection(_)));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let err = RedisBackend::connect("not-a-url", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Connection(_)));
    }
}
