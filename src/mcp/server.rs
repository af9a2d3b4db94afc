/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin, one per line
/// 2. Dispatches tool calls to the habit tools
/// 3. Writes JSON-RPC responses to stdout

use chrono::{Local, Utc};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::tools;
use crate::{HabitFlowServer, ServerError};

/// MCP server that handles communication with the client
pub struct McpServer {
    habit_flow: HabitFlowServer,
    initialized: bool,
}

fn tool_definition<P: JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    let schema = schemars::schema_for!(P);
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::to_value(schema).unwrap_or_else(|_| json!({"type": "object"})),
    }
}

/// Every tool this server offers
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool_definition::<tools::CreateHabitParams>("habit_create", "Create a new habit to track"),
        tool_definition::<tools::ListHabitsParams>(
            "habit_list",
            "List all habits with today's status, current streak and lifetime completion rate",
        ),
        tool_definition::<tools::UpdateHabitParams>("habit_update", "Rename a habit or change its description"),
        tool_definition::<tools::DeleteHabitParams>(
            "habit_delete",
            "Delete a habit together with its completion history",
        ),
        tool_definition::<tools::ToggleHabitParams>(
            "habit_toggle",
            "Mark a habit done for a day, or unmark it if it was already done",
        ),
        tool_definition::<tools::StatsParams>(
            "habit_stats",
            "Statistics dashboard: streaks, today's progress, monthly and rolling completion rates, top habits",
        ),
        tool_definition::<tools::CalendarParams>(
            "habit_calendar",
            "Month heat map showing which days all, some or none of the habits were done",
        ),
        tool_definition::<tools::ExportParams>("data_export", "Export all habits and completions as a backup document"),
        tool_definition::<tools::ImportParams>(
            "data_import",
            "Replace all habits and completions with a previously exported backup document",
        ),
    ]
}

/// Deserialize tool arguments, treating missing arguments as `{}`
fn parse_args<P: DeserializeOwned>(args: Value) -> Result<P, String> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))
}

impl McpServer {
    pub fn new(habit_flow: HabitFlowServer) -> Self {
        Self {
            habit_flow,
            initialized: false,
        }
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    pub async fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        self.handle_request(request).await
    }

    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            self.handle_notification(&request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(id, Value::Null)
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        };
        Some(response)
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" | "initialized" => {
                self.initialized = true;
                info!("MCP client initialized");
            }
            other => debug!("Ignoring notification: {}", other),
        }
    }

    fn handle_initialize(&mut self, id: Value) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "HabitFlow".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::from_serializable(id, &result)
    }

    fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        if !self.initialized {
            debug!("tools/call before initialized notification");
        }

        let tool_params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid parameters: {}", e),
                    None,
                );
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        let storage = self.habit_flow.storage();
        let analytics = self.habit_flow.analytics();
        let today = Local::now().date_naive();
        let args = tool_params.arguments;

        macro_rules! call {
            ($params:ty, |$p:ident| $body:expr, |$r:ident| $result:expr) => {
                match parse_args::<$params>(args) {
                    Err(message) => {
                        return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, message, None)
                    }
                    Ok($p) => match $body {
                        Ok($r) => $result,
                        Err(e) => {
                            warn!("Tool {} failed: {}", tool_params.name, e);
                            return JsonRpcResponse::storage_error(id, &e);
                        }
                    },
                }
            };
        }

        let result = match tool_params.name.as_str() {
            "habit_create" => call!(
                tools::CreateHabitParams,
                |p| tools::create_habit(storage, p),
                |r| ToolCallResult::success(format!(
                    "{}\nHabit ID: {}",
                    r.message,
                    r.habit_id.clone().unwrap_or_default()
                ))
                .with_json(&r)
            ),
            "habit_list" => call!(
                tools::ListHabitsParams,
                |p| tools::list_habits(storage, p, today),
                |r| ToolCallResult::success(r.to_text()).with_json(&r)
            ),
            "habit_update" => call!(
                tools::UpdateHabitParams,
                |p| tools::update_habit(storage, p),
                |r| ToolCallResult::success(r.message)
            ),
            "habit_delete" => call!(
                tools::DeleteHabitParams,
                |p| tools::delete_habit(storage, p),
                |r| ToolCallResult::success(r.message)
            ),
            "habit_toggle" => call!(
                tools::ToggleHabitParams,
                |p| tools::toggle_habit(storage, p, today),
                |r| ToolCallResult::success(r.message.clone()).with_json(&r)
            ),
            "habit_stats" => call!(
                tools::StatsParams,
                |p| tools::habit_stats(storage, analytics, p, today),
                |r| match &r.error {
                    // Figures are still returned, but the call is flagged
                    Some(e) => ToolCallResult::error(format!("{}\n\n{}", e, r.message)).with_json(&r),
                    None => ToolCallResult::success(r.message.clone()).with_json(&r),
                }
            ),
            "habit_calendar" => call!(
                tools::CalendarParams,
                |p| tools::habit_calendar(storage, analytics, p, today),
                |r| ToolCallResult::success(r.message.clone()).with_json(&r.calendar)
            ),
            "data_export" => call!(
                tools::ExportParams,
                |p| tools::export_data(storage, p, Utc::now()),
                |r| ToolCallResult::success(r.message.clone()).with_json(&r.snapshot)
            ),
            "data_import" => call!(
                tools::ImportParams,
                |p| tools::import_data(storage, p),
                |r| ToolCallResult::success(r.message)
            ),
            _ => ToolCallResult::error(format!("Unknown tool: {}", tool_params.name)),
        };

        JsonRpcResponse::from_serializable(id, &result)
    }
}
