//! Process-wide lifecycle of the tool-server connection.

use super::connection::Connection;
use super::error::TransportError;
use super::interface::ToolServerInterface;
use crate::config::{ServerConfig, TransportConfig};
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use utoipa::ToSchema;

type ConnectAttempt = Shared<BoxFuture<'static, Result<Arc<Connection>, TransportError>>>;

enum SessionState {
    Idle,
    Connecting {
        generation: u64,
        attempt: ConnectAttempt,
    },
    Ready(Arc<Connection>),
    Failed(TransportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Ready,
    Failed,
}

/// Owns at most one [`Connection`] and serialises its establishment.
///
/// Concurrent `connect` calls while an attempt is in flight join that
/// attempt and observe its outcome. `disconnect` bumps a generation counter
/// so an attempt that completes afterwards is torn down instead of being
/// installed.
pub struct McpSession {
    server: ServerConfig,
    transport: TransportConfig,
    state: Mutex<SessionState>,
    generation: AtomicU64,
    attempts: AtomicU64,
}

impl McpSession {
    pub fn new(server: ServerConfig, transport: TransportConfig) -> Self {
        Self {
            server,
            transport,
            state: Mutex::new(SessionState::Idle),
            generation: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    /// Return the live connection, starting or joining an attempt if needed.
    pub async fn connect(
        &self,
        endpoint: &str,
        credential: &str,
    ) -> Result<Arc<Connection>, TransportError> {
        if credential.trim().is_empty() {
            return Err(TransportError::CredentialMissing);
        }

        let mut dead = None;
        let (generation, attempt) = {
            let mut state = self.lock_state();
            match &*state {
                SessionState::Ready(connection) if connection.is_alive() => {
                    return Ok(Arc::clone(connection));
                }
                SessionState::Connecting {
                    generation,
                    attempt,
                } => {
                    debug!(server = %self.server.name, "joining in-flight connect attempt");
                    (*generation, attempt.clone())
                }
                _ => {
                    let generation = self.generation.load(Ordering::SeqCst);
                    let attempt = self.start_attempt(endpoint, credential);
                    let previous = std::mem::replace(
                        &mut *state,
                        SessionState::Connecting {
                            generation,
                            attempt: attempt.clone(),
                        },
                    );
                    if let SessionState::Ready(connection) = previous {
                        dead = Some(connection);
                    }
                    (generation, attempt)
                }
            }
        };

        if let Some(connection) = dead {
            connection.shutdown().await;
        }

        let outcome = attempt.await;
        self.settle(generation, outcome).await
    }

    fn start_attempt(&self, endpoint: &str, credential: &str) -> ConnectAttempt {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!(server = %self.server.name, attempt, "connecting to tool server");
        let server = self.server.clone();
        let transport = self.transport;
        let endpoint = endpoint.to_string();
        let credential = credential.to_string();
        async move { Connection::establish(&server, &endpoint, &credential, transport).await }
            .boxed()
            .shared()
    }

    async fn settle(
        &self,
        generation: u64,
        outcome: Result<Arc<Connection>, TransportError>,
    ) -> Result<Arc<Connection>, TransportError> {
        let mut stale = None;
        let settled = {
            let mut state = self.lock_state();
            if self.generation.load(Ordering::SeqCst) != generation {
                stale = outcome.ok();
                Err(TransportError::Superseded)
            } else {
                let current = matches!(
                    &*state,
                    SessionState::Connecting { generation: g, .. } if *g == generation
                );
                match outcome {
                    Ok(connection) => {
                        if current {
                            *state = SessionState::Ready(Arc::clone(&connection));
                        }
                        Ok(connection)
                    }
                    Err(err) => {
                        if current {
                            *state = SessionState::Failed(err.clone());
                        }
                        Err(err)
                    }
                }
            }
        };

        if let Some(connection) = stale {
            debug!(server = %self.server.name, "discarding connection from superseded attempt");
            connection.shutdown().await;
        }
        settled
    }

    /// Tear down the connection and forget any in-flight attempt. Idempotent.
    pub async fn disconnect(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let previous = std::mem::replace(&mut *self.lock_state(), SessionState::Idle);
        match previous {
            SessionState::Ready(connection) => {
                info!(server = %self.server.name, "disconnecting tool server");
                connection.shutdown().await;
            }
            SessionState::Connecting { .. } => {
                info!(server = %self.server.name, "abandoning in-flight connect attempt");
            }
            SessionState::Idle | SessionState::Failed(_) => {}
        }
    }

    fn ready_connection(&self) -> Option<Arc<Connection>> {
        match &*self.lock_state() {
            SessionState::Ready(connection) if connection.is_alive() => {
                Some(Arc::clone(connection))
            }
            _ => None,
        }
    }

    pub async fn send_request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let connection = self
            .ready_connection()
            .ok_or(TransportError::NotConnected)?;
        connection.send_request(method, params).await
    }

    pub fn status(&self) -> ConnectionStatus {
        match &*self.lock_state() {
            SessionState::Idle => ConnectionStatus::Idle,
            SessionState::Connecting { .. } => ConnectionStatus::Connecting,
            SessionState::Ready(connection) if connection.is_alive() => ConnectionStatus::Ready,
            SessionState::Ready(_) | SessionState::Failed(_) => ConnectionStatus::Failed,
        }
    }

    /// The error of the most recent failed attempt, if that is the current state.
    pub fn last_error(&self) -> Option<TransportError> {
        match &*self.lock_state() {
            SessionState::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Ready
    }

    /// Number of subprocess launches attempted so far.
    pub fn connect_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolServerInterface for McpSession {
    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, TransportError> {
        let connection = self
            .ready_connection()
            .ok_or(TransportError::NotConnected)?;
        connection.call_tool(tool, arguments).await
    }
}
