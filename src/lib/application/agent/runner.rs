use super::errors::AgentError;
use super::fallback;
use super::instructions::{
    CAP_RESPONSE, EMPTY_RESPONSE, SYSTEM_INSTRUCTIONS, TEXT_ONLY_NOTE, extracted_id_notice,
    manual_result_notice,
};
use super::models::{AgentOptions, AgentOutcome, AgentStep};
use crate::application::tooling::{
    KnownTool, ToolArguments, ToolResult, ToolServerInterface, normalize, tool_catalog,
};
use crate::model::{CompletionRequest, ModelProvider};
use crate::types::{ChatMessage, ToolCall};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Bounded multi-turn tool-calling loop over one conversation.
pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<dyn ToolServerInterface>,
    catalog: Vec<Value>,
}

/// Conversation state owned by a single run.
struct Run {
    conversation: Vec<ChatMessage>,
    steps: Vec<AgentStep>,
}

impl Agent {
    pub fn new(provider: Arc<dyn ModelProvider>, tools: Arc<dyn ToolServerInterface>) -> Self {
        Self {
            provider,
            tools,
            catalog: tool_catalog().to_vec(),
        }
    }

    /// Replace the advertised tool schemas.
    pub fn with_catalog(mut self, catalog: Vec<Value>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Drive one conversation to a final answer, an empty turn or the cap.
    pub async fn run(
        &self,
        prompt: impl Into<String>,
        options: &AgentOptions,
    ) -> Result<AgentOutcome, AgentError> {
        let span = info_span!("agent_run", run_id = %Uuid::new_v4());
        self.drive(prompt.into(), options).instrument(span).await
    }

    async fn drive(
        &self,
        prompt: String,
        options: &AgentOptions,
    ) -> Result<AgentOutcome, AgentError> {
        info!(
            model = options.model.as_str(),
            max_iterations = options.max_iterations,
            "Agent run started"
        );
        let mut run = Run {
            conversation: vec![
                ChatMessage::system(SYSTEM_INSTRUCTIONS),
                ChatMessage::user(prompt),
            ],
            steps: Vec::new(),
        };

        for iteration in 0..options.max_iterations {
            let turn = iteration + 1;
            debug!(iteration = turn, turns = run.conversation.len(), "Submitting turn to model");

            let request = CompletionRequest::new(
                options.model.clone(),
                run.conversation.clone(),
                options.temperature,
                options.max_tokens,
            )
            .with_tools(self.catalog.clone());

            let message = match self.provider.complete(request).await {
                Ok(message) => message,
                Err(source) if source.suggests_tool_rejection() => {
                    warn!(iteration = turn, %source, "Endpoint rejected tools, retrying text-only");
                    return self.text_only(run, options, turn).await;
                }
                Err(source) => {
                    warn!(iteration = turn, %source, "Model call failed");
                    return Err(AgentError::Model {
                        iterations: turn,
                        source,
                    });
                }
            };
            run.conversation.push(message.clone());

            if message.has_tool_calls() {
                info!(
                    iteration = turn,
                    calls = message.tool_calls.len(),
                    "Model requested tool calls"
                );
                for call in &message.tool_calls {
                    self.dispatch(&mut run, call, turn).await;
                }
                continue;
            }

            let Some(text) = message.text() else {
                info!(iteration = turn, "Model returned an empty turn");
                return Ok(Self::finish(run, EMPTY_RESPONSE.to_string(), turn, None, false));
            };

            if fallback::mentions_tool(text) {
                if let Some(result) = self.manual_read(&mut run, text, turn).await {
                    run.conversation
                        .push(ChatMessage::system(manual_result_notice(&result)));
                    continue;
                }
            }

            info!(iteration = turn, "Model returned final answer");
            let text = text.to_string();
            return Ok(Self::finish(run, text, turn, None, false));
        }

        warn!(max_iterations = options.max_iterations, "Agent reached the iteration cap");
        Ok(Self::finish(
            run,
            CAP_RESPONSE.to_string(),
            options.max_iterations,
            None,
            true,
        ))
    }

    fn finish(
        run: Run,
        response: String,
        iterations: usize,
        note: Option<String>,
        cap_reached: bool,
    ) -> AgentOutcome {
        AgentOutcome {
            response,
            iterations,
            note,
            cap_reached,
            steps: run.steps,
        }
    }

    /// Run one structured tool call; failures become the tool turn's content.
    async fn dispatch(&self, run: &mut Run, call: &ToolCall, iteration: usize) {
        let name = call.function.name.as_str();
        let arguments = match ToolArguments::parse(name, &call.function.arguments) {
            Ok(arguments) => arguments.into_value(),
            Err(err) => {
                warn!(tool = name, %err, "Tool call carried malformed arguments");
                run.steps.push(AgentStep {
                    iteration,
                    tool: name.to_string(),
                    arguments: Value::String(call.function.arguments.clone()),
                    success: false,
                    extracted_id: None,
                    error: Some(err.to_string()),
                    manual: false,
                });
                Self::push_tool_error(run, call, &err.to_string());
                return;
            }
        };

        info!(tool = name, "Calling tool");
        match self.tools.call_tool(name, arguments.clone()).await {
            Ok(raw) => {
                let result = normalize(&raw);
                debug!(tool = name, success = result.success, "Tool finished");
                if let Some(id) = result.extracted_id_text() {
                    run.conversation
                        .push(ChatMessage::system(extracted_id_notice(&id)));
                }
                run.steps.push(Self::step(iteration, name, arguments, &result, false));
                run.conversation
                    .push(ChatMessage::tool(call.id.clone(), result.to_value().to_string()));
            }
            Err(err) => {
                warn!(tool = name, %err, "Tool call failed");
                run.steps.push(AgentStep {
                    iteration,
                    tool: name.to_string(),
                    arguments,
                    success: false,
                    extracted_id: None,
                    error: Some(err.to_string()),
                    manual: false,
                });
                Self::push_tool_error(run, call, &err.to_string());
            }
        }
    }

    fn push_tool_error(run: &mut Run, call: &ToolCall, message: &str) {
        let content = json!({ "error": message }).to_string();
        run.conversation
            .push(ChatMessage::tool(call.id.clone(), content));
    }

    fn step(
        iteration: usize,
        tool: &str,
        arguments: Value,
        result: &ToolResult,
        manual: bool,
    ) -> AgentStep {
        AgentStep {
            iteration,
            tool: tool.to_string(),
            arguments,
            success: result.success,
            extracted_id: result.extracted_id.clone(),
            error: result.error.clone(),
            manual,
        }
    }

    /// Execute a `read-items` described in prose. `None` ends the run with the text.
    async fn manual_read(&self, run: &mut Run, text: &str, iteration: usize) -> Option<String> {
        let collection = fallback::manual_read_collection(text)?;
        let tool = KnownTool::ReadItems.as_str();
        let arguments = ToolArguments::latest_item(&collection).into_value();
        info!(tool, collection = collection.as_str(), "Executing tool call described in text");

        match self.tools.call_tool(tool, arguments.clone()).await {
            Ok(raw) => {
                let result = normalize(&raw);
                run.steps.push(Self::step(iteration, tool, arguments, &result, true));
                Some(result.to_value().to_string())
            }
            Err(err) => {
                warn!(tool, %err, "Manual tool execution failed");
                None
            }
        }
    }

    /// One completion without tool schemas; its text is the final answer.
    async fn text_only(
        &self,
        run: Run,
        options: &AgentOptions,
        iteration: usize,
    ) -> Result<AgentOutcome, AgentError> {
        let request = CompletionRequest::new(
            options.model.clone(),
            run.conversation.clone(),
            options.temperature,
            options.max_tokens,
        );
        match self.provider.complete(request).await {
            Ok(message) => {
                let response = message.content.unwrap_or_default();
                Ok(Self::finish(
                    run,
                    response,
                    iteration,
                    Some(TEXT_ONLY_NOTE.to_string()),
                    false,
                ))
            }
            Err(source) => Err(AgentError::Fallback {
                iterations: iteration,
                source,
            }),
        }
    }
}
