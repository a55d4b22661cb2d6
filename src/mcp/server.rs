/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin
/// 2. Routes tool calls to the habit repository and estimator
/// 3. Sends JSON-RPC responses to stdout

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::mcp::protocol::*;
use crate::tools::{self, ToolError};
use crate::{HabitTrackerServer, ServerError};

/// MCP server that handles communication with the client
pub struct McpServer {
    habit_tracker: HabitTrackerServer,
    initialized: bool,
}

impl McpServer {
    pub fn new(habit_tracker: HabitTrackerServer) -> Self {
        Self {
            habit_tracker,
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
                    if let Some(response) = self.process_line(&line) {
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

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Process a single line of JSON-RPC input
    pub(crate) fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
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

        self.handle_request(request)
    }

    fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Notifications carry no id and get no reply
        let Some(id) = request.id else {
            if request.method.ends_with("initialized") {
                self.initialized = true;
            }
            debug!("Received notification '{}'", request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(id, Value::Null)
            }
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

    fn handle_initialize(&mut self, id: Value) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Group Habit Tracker".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(id, &result)
    }

    fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        if !self.is_initialized() {
            debug!("tools/call received before the client sent 'initialized'");
        }
        let Some(params) = params else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "Missing parameters".to_string(),
                None,
            );
        };
        let tool_params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid parameters: {}", e),
                    None,
                );
            }
        };

        let result = match self.call_tool(&tool_params.name, tool_params.arguments) {
            Ok(text) => ToolCallResult::success(text),
            Err(message) => {
                debug!("Tool '{}' failed: {}", tool_params.name, message);
                ToolCallResult::error(message)
            }
        };

        to_response(id, &result)
    }

    fn call_tool(&mut self, name: &str, args: Map<String, Value>) -> Result<String, String> {
        let repository = self.habit_tracker.repository_mut();
        repository.roll_over();

        match name {
            "habit_create" => invoke(args, |p| tools::create_habit(repository, p)).map(|r| {
                let mut text = r.message;
                if let Some(habit_id) = r.habit_id {
                    text.push_str(&format!("\nHabit ID: {}", habit_id));
                }
                if let Some(code) = r.group_code {
                    text.push_str(&format!("\nGroup code: {}", code));
                }
                text
            }),
            "habit_complete" => {
                invoke(args, |p| tools::complete_habit(repository, p)).map(|r| r.message)
            }
            "group_join" => invoke(args, |p| tools::join_group(repository, p)).map(|r| r.message),
            "group_checkin" => invoke(args, |p| tools::check_in(repository, p)).map(|r| r.message),
            "group_member" => {
                invoke(args, |p| tools::change_member(repository, p)).map(|r| r.message)
            }
            "group_finalize" => {
                invoke(args, |p| tools::finalize_groups(repository, p)).map(|r| r.message)
            }
            "habit_update" => invoke(args, |p| tools::update_habit(repository, p)).map(|r| r.message),
            "habit_delete" => invoke(args, |p| tools::delete_habit(repository, p)).map(|r| r.message),
            "habit_status" => {
                invoke(args, |p| tools::get_habit_status(repository, p)).and_then(|r| pretty(&r))
            }
            "habit_estimate" => invoke(args, tools::estimate_duration).and_then(|r| pretty(&r)),
            _ => Err(format!("Unknown tool: {}", name)),
        }
    }
}

/// Deserialize the tool's params and run it
fn invoke<P, R>(
    args: Map<String, Value>,
    tool: impl FnOnce(P) -> Result<R, ToolError>,
) -> Result<R, String>
where
    P: DeserializeOwned,
{
    let params: P = serde_json::from_value(Value::Object(args))
        .map_err(|e| format!("Invalid arguments: {}", e))?;
    tool(params).map_err(|e| e.to_string())
}

fn pretty<R: Serialize>(response: &R) -> Result<String, String> {
    serde_json::to_string_pretty(response).map_err(|e| e.to_string())
}

fn to_response<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None),
    }
}

fn definition<P: JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    let schema = schemars::schema_for!(P);
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::to_value(schema).unwrap_or_else(|_| json!({ "type": "object" })),
    }
}

/// Every tool the server exposes
pub(crate) fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        definition::<tools::CreateHabitParams>(
            "habit_create",
            "Create a solo habit, or a group habit when members are given (max 3 active)",
        ),
        definition::<tools::CompleteHabitParams>(
            "habit_complete",
            "Mark today complete on a solo habit, or undo it",
        ),
        definition::<tools::JoinGroupParams>("group_join", "Join a group habit with its invite code"),
        definition::<tools::CheckInParams>(
            "group_checkin",
            "Check a member in for a day; the day counts once every member has checked in",
        ),
        definition::<tools::MemberChangeParams>(
            "group_member",
            "Add or remove a member of a group habit",
        ),
        definition::<tools::FinalizeParams>(
            "group_finalize",
            "Close a past day on every active group habit, failing groups that did not all check in",
        ),
        definition::<tools::UpdateHabitParams>("habit_update", "Change a habit's action or goal"),
        definition::<tools::DeleteHabitParams>(
            "habit_delete",
            "Deactivate a habit, or delete it permanently",
        ),
        definition::<tools::StatusParams>(
            "habit_status",
            "Check streaks, weekly progress and group check-ins",
        ),
        definition::<tools::EstimateParams>(
            "habit_estimate",
            "Estimate how many days a habit takes to become automatic",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryConfig;
    use tempfile::TempDir;

    fn server() -> (McpServer, TempDir) {
        let dir = TempDir::new().unwrap();
        let tracker =
            HabitTrackerServer::new(dir.path().join("habits.db"), RepositoryConfig::default())
                .unwrap();
        (McpServer::new(tracker), dir)
    }

    fn call(server: &mut McpServer, name: &str, arguments: Value) -> Value {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        });
        let response = server.process_line(&request.to_string()).unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn test_initialize_and_list_tools() {
        let (mut server, _dir) = server();

        let init = server
            .process_line(r#"{"jsonrpc":"2.0","id":0,"method":"initialize","params":{}}"#)
            .unwrap();
        let init = serde_json::to_value(init).unwrap();
        assert_eq!(init["result"]["protocolVersion"], MCP_VERSION);

        assert!(server
            .process_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .is_none());
        assert!(server.is_initialized());

        let list = server
            .process_line(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .unwrap();
        let list = serde_json::to_value(list).unwrap();
        let tools = list["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), tool_definitions().len());
        assert!(tools.iter().any(|t| t["name"] == "group_checkin"));
        assert!(tools[0]["inputSchema"]["properties"]["action"].is_object());
    }

    #[test]
    fn test_create_and_status_through_tools() {
        let (mut server, _dir) = server();

        let created = call(&mut server, "habit_create", json!({ "action": "Read", "goal_days": 21 }));
        assert_eq!(created["result"]["isError"], false);

        let status = call(&mut server, "habit_status", json!({}));
        let text = status["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"action\": \"Read\""));
    }

    #[test]
    fn test_bad_arguments_are_tool_errors() {
        let (mut server, _dir) = server();

        let response = call(&mut server, "habit_create", json!({ "goal_days": "many" }));
        assert_eq!(response["result"]["isError"], true);

        let unknown = call(&mut server, "habit_teleport", json!({}));
        assert_eq!(unknown["result"]["isError"], true);
    }

    #[test]
    fn test_parse_error_and_unknown_method() {
        let (mut server, _dir) = server();

        let parse = serde_json::to_value(server.process_line("{not json").unwrap()).unwrap();
        assert_eq!(parse["error"]["code"], error_codes::PARSE_ERROR);

        let unknown = server
            .process_line(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
            .unwrap();
        let unknown = serde_json::to_value(unknown).unwrap();
        assert_eq!(unknown["error"]["code"], error_codes::METHOD_NOT_FOUND);
    }
}
