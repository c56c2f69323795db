// Shared fixtures for integration tests: fake tool servers written as small
// shell scripts, a scripted model provider and a recording tool server.

#![allow(dead_code)]

use async_trait::async_trait;
use directus_mcp_agent::config::{ServerConfig, TransportConfig};
use directus_mcp_agent::model::{CompletionRequest, ModelError, ModelProvider};
use directus_mcp_agent::tooling::{ToolServerInterface, TransportError};
use directus_mcp_agent::types::{ChatMessage, ToolCall};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

pub const DIRECTUS_URL: &str = "http://directus.test:8055";
pub const TOKEN: &str = "static-admin-token";

// ============================================================================
// Fake tool servers
// ============================================================================

/// Answers `initialize` and `tools/call`, logging every stdin line to $LOG
/// and every launch to $COUNTER.
pub const ECHO_SERVER: &str = r#"
echo spawn >> "$COUNTER"
echo "fake content server starting"
while IFS= read -r line; do
  printf '%s\n' "$line" >> "$LOG"
  id=$(printf '%s' "$line" | sed -n 's/^{"jsonrpc":"2.0","id":\([0-9]*\),.*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{},"serverInfo":{"name":"fake","version":"0.0.0"}}}\n' "$id"
      ;;
    *'"name":"read-items"'*)
      printf '{"jsonrpc":"2.0",'
      sleep 0.05
      printf '"id":%s,"result":{"content":[{"type":"text","text":"<data>[{\\"id\\":7,\\"title\\":\\"hello\\"}]</data>"}]}}\n' "$id"
      ;;
    *'"name":"users-me"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"url":"%s","token":"%s"}}\n' "$id" "$DIRECTUS_URL" "$DIRECTUS_TOKEN"
      ;;
    *'"name":"broken"'*)
      printf '{"jsonrpc":"2.0","id":%s,"error":{"code":-32602,"message":"unknown tool: broken"}}\n' "$id"
      ;;
    *'"name":"silent"'*)
      ;;
    *'"method":"tools/call"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"ok"}]}}\n' "$id"
      ;;
  esac
done
"#;

/// Holds the first `tools/call` and answers it after the second.
pub const REORDERING_SERVER: &str = r#"
held=""
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/^{"jsonrpc":"2.0","id":\([0-9]*\),.*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"capabilities":{}}}\n' "$id"
      ;;
    *'"method":"tools/call"'*)
      if [ -z "$held" ]; then
        held=$id
      else
        printf '{"jsonrpc":"2.0","id":%s,"result":{"echo":%s}}\n' "$id" "$id"
        printf '{"jsonrpc":"2.0","id":%s,"result":{"echo":%s}}\n' "$held" "$held"
        held=""
      fi
      ;;
  esac
done
"#;

/// Writes invalid UTF-8 to stderr at startup and a large stderr burst
/// before every tool reply.
pub const NOISY_STDERR_SERVER: &str = r#"
printf '\377\376 startup banner\n' >&2
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/^{"jsonrpc":"2.0","id":\([0-9]*\),.*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"capabilities":{}}}\n' "$id"
      ;;
    *'"method":"tools/call"'*)
      head -c 262144 /dev/zero | tr '\000' 'x' >&2
      printf '\n' >&2
      printf '{"jsonrpc":"2.0","id":%s,"result":{"ok":true}}\n' "$id"
      ;;
  esac
done
"#;

pub const FATAL_STDERR_SERVER: &str = r#"
echo "ZodError: DIRECTUS_URL must be a valid url" >&2
exec sleep 5
"#;

pub const CRASHING_SERVER: &str = "exit 3\n";

pub const MUTE_SERVER: &str = "exec sleep 5\n";

pub const INIT_ERROR_SERVER: &str = r#"
while IFS= read -r line; do
  printf '{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"invalid token"}}\n'
done
"#;

pub struct FakeServer {
    pub dir: tempfile::TempDir,
    pub config: ServerConfig,
}

impl FakeServer {
    pub fn new(script: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("server.sh");
        std::fs::write(&path, script).expect("write script");

        let mut env = HashMap::new();
        env.insert(
            "COUNTER".to_string(),
            dir.path().join("spawns").display().to_string(),
        );
        env.insert(
            "LOG".to_string(),
            dir.path().join("stdin.log").display().to_string(),
        );

        let config = ServerConfig {
            name: "fake".to_string(),
            command: PathBuf::from("sh"),
            args: vec![path.display().to_string()],
            env,
            workdir: Some(dir.path().to_path_buf()),
        };
        Self { dir, config }
    }

    pub fn spawn_count(&self) -> usize {
        read_lines(&self.dir.path().join("spawns")).len()
    }

    pub fn stdin_lines(&self) -> Vec<Value> {
        read_lines(&self.dir.path().join("stdin.log"))
            .iter()
            .map(|line| serde_json::from_str(line).expect("client wrote JSON"))
            .collect()
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

pub fn fast_transport() -> TransportConfig {
    TransportConfig {
        handshake_delay: Duration::from_millis(50),
        connect_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(2),
    }
}

// ============================================================================
// Scripted model provider
// ============================================================================

/// Replays queued assistant turns and records every request it receives.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<ChatMessage, ModelError>>>,
    /// Returned once the queue is exhausted.
    repeat: Mutex<Option<ChatMessage>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<ChatMessage, ModelError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn repeating(message: ChatMessage) -> Self {
        Self {
            repeat: Mutex::new(Some(message)),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("requests").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests").len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, ModelError> {
        self.requests.lock().expect("requests").push(request);
        if let Some(reply) = self.replies.lock().expect("replies").pop_front() {
            return reply;
        }
        match self.repeat.lock().expect("repeat").clone() {
            Some(message) => Ok(message),
            None => Ok(ChatMessage::assistant("script exhausted")),
        }
    }
}

pub fn tool_turn(calls: Vec<ToolCall>) -> ChatMessage {
    ChatMessage {
        content: None,
        tool_calls: calls,
        ..ChatMessage::assistant("")
    }
}

// ============================================================================
// Recording tool server
// ============================================================================

#[derive(Default)]
pub struct StubTools {
    results: Mutex<HashMap<String, Result<Value, TransportError>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl StubTools {
    pub fn with(self, tool: &str, result: Result<Value, TransportError>) -> Self {
        self.results
            .lock()
            .expect("results")
            .insert(tool.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("calls").clone()
    }
}

#[async_trait]
impl ToolServerInterface for StubTools {
    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .expect("calls")
            .push((tool.to_string(), arguments));
        self.results
            .lock()
            .expect("results")
            .get(tool)
            .cloned()
            .unwrap_or_else(|| Ok(serde_json::json!({"content": []})))
    }
}
