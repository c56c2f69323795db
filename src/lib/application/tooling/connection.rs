//! One live tool-server subprocess and the request/response contract over
//! its stdio.

use super::correlator::Correlator;
use super::error::TransportError;
use super::framing::{Inbound, LineFramer, OutboundRequest, is_fatal_diagnostic};
use crate::config::{ServerConfig, TransportConfig};
use crate::constants::{
    CLIENT_NAME, CLIENT_VERSION, ENV_DIRECTUS_TOKEN, ENV_DIRECTUS_URL, PROTOCOL_VERSION,
};
use serde_json::{Value, json};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::{debug, info, warn};

/// Settles the handshake with a failure at most once.
#[derive(Clone)]
struct FatalSignal {
    sender: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

impl FatalSignal {
    fn new() -> (Self, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        let signal = Self {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (signal, rx)
    }

    fn raise(&self, reason: impl Into<String>) -> bool {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => tx.send(reason.into()).is_ok(),
            None => false,
        }
    }
}

pub struct Connection {
    server: String,
    correlator: Correlator,
    writer: AsyncMutex<Option<BufWriter<ChildStdin>>>,
    alive: AtomicBool,
    initialized: AtomicBool,
    kill: Mutex<Option<oneshot::Sender<()>>>,
    request_timeout: Duration,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("server", &self.server)
            .field("alive", &self.is_alive())
            .field("initialized", &self.is_initialized())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Spawn the tool server and run the `initialize` handshake.
    ///
    /// A blank credential fails before anything is spawned. Every other
    /// failure kills the subprocess before returning.
    pub async fn establish(
        server: &ServerConfig,
        endpoint: &str,
        credential: &str,
        transport: TransportConfig,
    ) -> Result<Arc<Self>, TransportError> {
        if credential.trim().is_empty() {
            return Err(TransportError::CredentialMissing);
        }

        let mut command = Command::new(&server.command);
        command
            .args(&server.args)
            .envs(&server.env)
            .env(ENV_DIRECTUS_URL, endpoint)
            .env(ENV_DIRECTUS_TOKEN, credential)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &server.workdir {
            command.current_dir(dir);
        }

        let spawn_failure = |message: String| TransportError::SpawnFailure {
            server: server.name.clone(),
            message,
        };
        let mut child = command
            .spawn()
            .map_err(|source| spawn_failure(source.to_string()))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_failure("failed to capture server stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_failure("failed to capture server stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| spawn_failure("failed to capture server stderr".into()))?;

        info!(
            server = %server.name,
            pid = child.id().unwrap_or_default(),
            endpoint,
            "spawned tool server"
        );

        let (kill_tx, kill_rx) = oneshot::channel();
        let connection = Arc::new(Self {
            server: server.name.clone(),
            correlator: Correlator::new(),
            writer: AsyncMutex::new(Some(BufWriter::new(stdin))),
            alive: AtomicBool::new(true),
            initialized: AtomicBool::new(false),
            kill: Mutex::new(Some(kill_tx)),
            request_timeout: transport.request_timeout,
        });

        let (fatal, fatal_rx) = FatalSignal::new();
        tokio::spawn(read_stdout(Arc::downgrade(&connection), stdout));
        tokio::spawn(read_stderr(
            Arc::downgrade(&connection),
            server.name.clone(),
            stderr,
            fatal.clone(),
        ));
        tokio::spawn(supervise(
            Arc::downgrade(&connection),
            server.name.clone(),
            child,
            kill_rx,
            fatal,
        ));

        let handshake = connection.handshake(fatal_rx, transport.handshake_delay);
        match tokio::time::timeout(transport.connect_timeout, handshake).await {
            Ok(Ok(())) => {
                info!(server = %connection.server, "tool server initialised");
                Ok(connection)
            }
            Ok(Err(err)) => {
                warn!(server = %connection.server, %err, "tool server handshake failed");
                connection.shutdown().await;
                Err(err)
            }
            Err(_) => {
                warn!(server = %connection.server, "tool server handshake timed out");
                connection.shutdown().await;
                Err(TransportError::ConnectTimeout {
                    server: connection.server.clone(),
                    timeout_ms: transport.connect_timeout.as_millis(),
                })
            }
        }
    }

    async fn handshake(
        &self,
        fatal: oneshot::Receiver<String>,
        delay: Duration,
    ) -> Result<(), TransportError> {
        let fatal = async move {
            match fatal.await {
                Ok(reason) => reason,
                Err(_) => std::future::pending().await,
            }
        };
        tokio::pin!(fatal);

        tokio::select! {
            reason = &mut fatal => return Err(self.handshake_fatal(reason)),
            _ = tokio::time::sleep(delay) => {}
        }

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": CLIENT_VERSION,
            }
        });
        debug!(server = %self.server, "sending initialize");

        let result = tokio::select! {
            reason = &mut fatal => return Err(self.handshake_fatal(reason)),
            result = self.request("initialize", params, None) => result,
        };
        match result {
            Ok(Value::Null) => Err(self.handshake_fatal("initialize returned no result")),
            Ok(_) => {
                self.initialized.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(TransportError::ToolProtocol { message, .. }) => {
                Err(self.handshake_fatal(message))
            }
            Err(TransportError::StreamClosed) => {
                Err(self.handshake_fatal("server closed its output before initialising"))
            }
            Err(other) => Err(other),
        }
    }

    fn handshake_fatal(&self, reason: impl Into<String>) -> TransportError {
        TransportError::HandshakeFatal {
            server: self.server.clone(),
            reason: reason.into(),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Outstanding requests awaiting a response.
    pub async fn pending_requests(&self) -> usize {
        self.correlator.len().await
    }

    /// Issue a request bounded by the per-request timeout.
    pub async fn send_request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        if !self.is_alive() {
            return Err(TransportError::NotConnected);
        }
        self.request(method, params, Some(self.request_timeout))
            .await
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, TransportError> {
        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        debug!(server = %self.server, tool = name, "calling tool");
        self.send_request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }

    async fn request(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, TransportError> {
        let (id, rx) = self.correlator.register(method).await;
        let _pending = self.correlator.track(id);
        let line = OutboundRequest::new(id, method, &params)
            .encode_line()
            .map_err(|source| TransportError::Write {
                message: source.to_string(),
            });
        match line {
            Ok(line) => self.write_line(&line).await?,
            Err(err) => return Err(err),
        }
        self.correlator.await_response(id, method, rx, timeout).await
    }

    async fn write_line(&self, line: &str) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        let stream = writer.as_mut().ok_or(TransportError::NotConnected)?;
        let to_error = |source: std::io::Error| TransportError::Write {
            message: source.to_string(),
        };
        stream.write_all(line.as_bytes()).await.map_err(to_error)?;
        stream.flush().await.map_err(to_error)?;
        Ok(())
    }

    async fn dispatch(&self, line: &str) {
        match Inbound::parse(line) {
            Some(Inbound::Response { id, outcome }) => {
                self.correlator.complete(id, outcome).await;
            }
            Some(Inbound::Notification { method }) => {
                debug!(server = %self.server, method = %method, "ignoring notification");
            }
            Some(Inbound::Request { method, .. }) => {
                debug!(server = %self.server, method = %method, "ignoring server request");
            }
            Some(Inbound::Unrecognised(_)) => {
                debug!(server = %self.server, line, "ignoring unrecognised message");
            }
            None => {
                debug!(server = %self.server, line, "tool server output");
            }
        }
    }

    fn mark_dead(&self) -> bool {
        self.alive.swap(false, Ordering::SeqCst)
    }

    fn take_kill(&self) -> Option<oneshot::Sender<()>> {
        match self.kill.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Kill the subprocess and discard every pending request. Idempotent.
    pub async fn shutdown(&self) {
        let was_alive = self.mark_dead();
        self.initialized.store(false, Ordering::SeqCst);
        if let Some(kill) = self.take_kill() {
            let _ = kill.send(());
        }
        self.writer.lock().await.take();
        let discarded = self.correlator.discard_all().await;
        if was_alive {
            info!(server = %self.server, discarded, "tool server connection closed");
        }
    }
}

async fn read_stdout(connection: Weak<Connection>, mut stdout: ChildStdout) {
    let mut framer = LineFramer::default();
    let mut chunk = vec![0u8; 8 * 1024];
    loop {
        let read = stdout.read(&mut chunk).await;
        let Some(conn) = connection.upgrade() else {
            return;
        };
        match read {
            Ok(0) => {
                if let Some(rest) = framer.finish() {
                    conn.dispatch(&rest).await;
                }
                break;
            }
            Ok(n) => {
                for line in framer.push(&chunk[..n]) {
                    conn.dispatch(&line).await;
                }
            }
            Err(err) => {
                warn!(server = %conn.server, %err, "failed to read tool server output");
                break;
            }
        }
    }

    if let Some(conn) = connection.upgrade() {
        conn.mark_dead();
        conn.correlator.fail_all(TransportError::StreamClosed).await;
        debug!(server = %conn.server, "tool server output closed");
    }
}

async fn read_stderr(
    connection: Weak<Connection>,
    server: String,
    stderr: ChildStderr,
    fatal: FatalSignal,
) {
    // Keep draining until EOF; a closed pipe would kill the server on its
    // next diagnostic write.
    let mut reader = BufReader::new(stderr);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(server = %server, %err, "failed to read tool server stderr");
                break;
            }
        }
        let line = String::from_utf8_lossy(&raw);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        warn!(server = %server, line = trimmed, "tool server stderr");
        let initialized = connection
            .upgrade()
            .is_some_and(|conn| conn.is_initialized());
        if !initialized && is_fatal_diagnostic(trimmed) {
            fatal.raise(trimmed);
        }
    }
}

async fn supervise(
    connection: Weak<Connection>,
    server: String,
    mut child: Child,
    kill: oneshot::Receiver<()>,
    fatal: FatalSignal,
) {
    tokio::select! {
        status = child.wait() => {
            let initialized = connection
                .upgrade()
                .is_some_and(|conn| conn.is_initialized());
            match status {
                Ok(status) if status.success() => {
                    info!(server = %server, "tool server exited");
                }
                Ok(status) => {
                    warn!(server = %server, %status, "tool server exited");
                    if !initialized {
                        fatal.raise(format!("process exited with {status}"));
                    }
                }
                Err(err) => {
                    warn!(server = %server, %err, "failed to wait for tool server");
                    if !initialized {
                        fatal.raise(err.to_string());
                    }
                }
            }
            if let Some(conn) = connection.upgrade() {
                conn.mark_dead();
            }
        }
        // Either an explicit kill or the connection being dropped.
        _ = kill => {
            if let Err(err) = child.kill().await {
                debug!(server = %server, %err, "failed to kill tool server (may have already exited)");
            }
        }
    }
}
