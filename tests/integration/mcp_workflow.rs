/// End-to-end JSON-RPC conversations with the MCP server
use habitflow::mcp::McpServer;
use habitflow::*;
use serde_json::{json, Value};
use tempfile::TempDir;

async fn server(dir: &TempDir) -> McpServer {
    let server = HabitFlowServer::new(dir.path().join("habits.db"), AnalyticsConfig::default())
        .await
        .expect("Failed to create server");
    McpServer::new(server)
}

async fn send(server: &mut McpServer, request: Value) -> Value {
    let response = server
        .process_line(&request.to_string())
        .await
        .expect("request should get a response");
    serde_json::to_value(response).unwrap()
}

async fn call(server: &mut McpServer, id: u64, tool: &str, arguments: Value) -> Value {
    send(
        server,
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": tool, "arguments": arguments}
        }),
    )
    .await
}

/// The JSON block the tools append after their text summary
fn structured(response: &Value) -> Value {
    let text = response["result"]["content"][1]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[cfg(test)]
mod mcp_workflow_tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let dir = TempDir::new().unwrap();
        let mut server = server(&dir).await;

        let init = send(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await;
        assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(init["result"]["serverInfo"]["name"], "HabitFlow");

        let notification = server
            .process_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(notification.is_none());

        let tools = send(&mut server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let names: Vec<&str> = tools["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "habit_create", "habit_list", "habit_update", "habit_delete", "habit_toggle",
                "habit_stats", "habit_calendar", "data_export", "data_import",
            ]
        );
        assert!(tools["result"]["tools"][0]["inputSchema"]["properties"]["name"].is_object());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let dir = TempDir::new().unwrap();
        let mut server = server(&dir).await;

        let parse = server.process_line("{not json").await.unwrap();
        assert_eq!(parse.error.unwrap().code, -32700);

        let unknown = send(&mut server, json!({"jsonrpc": "2.0", "id": 1, "method": "nope"})).await;
        assert_eq!(unknown["error"]["code"], -32601);

        let missing = call(&mut server, 2, "habit_toggle", json!({})).await;
        assert_eq!(missing["error"]["code"], -32602);

        let not_found = call(&mut server, 3, "habit_toggle", json!({"habit_id": "ghost"})).await;
        assert_eq!(not_found["error"]["code"], -32001);

        let unknown_tool = call(&mut server, 4, "habit_log", json!({})).await;
        assert_eq!(unknown_tool["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_habit_lifecycle_over_mcp() {
        let dir = TempDir::new().unwrap();
        let mut server = server(&dir).await;

        let created = call(&mut server, 1, "habit_create", json!({"name": "Stretch", "icon": "🧘"})).await;
        let habit_id = structured(&created)["habit_id"].as_str().unwrap().to_string();

        let toggled = call(&mut server, 2, "habit_toggle", json!({"habit_id": habit_id})).await;
        assert_eq!(structured(&toggled)["completed"], true);

        let yesterday_ms = (chrono::Local::now() - chrono::Duration::days(1)).timestamp_millis();
        call(&mut server, 3, "habit_toggle", json!({"habit_id": habit_id, "date": yesterday_ms})).await;

        let list = call(&mut server, 4, "habit_list", json!({})).await;
        let listed = structured(&list);
        assert_eq!(listed["habits"][0]["completed_today"], true);
        assert_eq!(listed["habits"][0]["current_streak"], 1);
        assert_eq!(listed["habits"][0]["total_completions"], 2);

        let stats = call(&mut server, 5, "habit_stats", json!({})).await;
        assert_eq!(stats["result"]["isError"], false);
        let dashboard = &structured(&stats)["dashboard"];
        assert_eq!(dashboard["total_habits"], 1);
        assert_eq!(dashboard["today"]["percent"], 100);

        let calendar = call(&mut server, 6, "habit_calendar", json!({})).await;
        assert!(calendar["result"]["content"][0]["text"].as_str().unwrap().contains("Su Mo"));

        let updated = call(&mut server, 7, "habit_update", json!({"habit_id": habit_id, "name": "Yoga"})).await;
        assert_eq!(updated["result"]["isError"], false);

        let deleted = call(&mut server, 8, "habit_delete", json!({"habit_id": habit_id})).await;
        assert_eq!(deleted["result"]["isError"], false);

        let list = call(&mut server, 9, "habit_list", json!({})).await;
        assert_eq!(structured(&list)["habits"], json!([]));
    }

    #[tokio::test]
    async fn test_export_import_over_mcp() {
        let dir = TempDir::new().unwrap();
        let mut server = server(&dir).await;

        call(&mut server, 1, "habit_create", json!({"name": "Read"})).await;
        let exported = call(&mut server, 2, "data_export", json!({})).await;
        let document = structured(&exported);
        assert_eq!(document["version"], "1.0");

        let other_dir = TempDir::new().unwrap();
        let mut other = super::server(&other_dir).await;
        let imported = call(&mut other, 1, "data_import", json!({"data": document})).await;
        assert_eq!(imported["result"]["isError"], false);

        let list = call(&mut other, 2, "habit_list", json!({})).await;
        assert_eq!(structured(&list)["habits"][0]["name"], "Read");

        let invalid = call(&mut other, 3, "data_import", json!({"data": {"habits": "nope"}})).await;
        assert_eq!(invalid["error"]["code"], -32003);
    }

    #[tokio::test]
    async fn test_unreadable_habit_row_keeps_server_usable() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("habits.db");
        {
            let storage = SqliteStorage::new(db_path.clone()).unwrap();
            storage
                .create_habit(&Habit::new("Broken".to_string(), None, None, None, None).unwrap())
                .unwrap();
        }
        rusqlite::Connection::open(&db_path)
            .unwrap()
            .execute("UPDATE habits SET created_at = 'garbage'", [])
            .unwrap();

        let habit_flow = HabitFlowServer::new(db_path, AnalyticsConfig::default())
            .await
            .expect("startup should not depend on readable habits");
        assert_eq!(habit_flow.existing_habits(), None);
        let mut server = McpServer::new(habit_flow);

        let init = send(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await;
        assert_eq!(init["result"]["serverInfo"]["name"], "HabitFlow");

        let stats = call(&mut server, 2, "habit_stats", json!({})).await;
        assert_eq!(stats["result"]["isError"], true);
        let degraded = structured(&stats);
        assert_eq!(degraded["success"], false);
        assert_eq!(degraded["dashboard"]["total_habits"], 0);

        let created = call(&mut server, 3, "habit_create", json!({"name": "Fresh"})).await;
        assert_eq!(created["result"]["isError"], false);
    }
}
