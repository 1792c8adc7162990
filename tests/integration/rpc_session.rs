/// A scripted JSON-RPC session through the line-delimited server loop
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{json, Value};
use zenith_habits::*;

fn server() -> RpcServer<SqliteStorage, LocalAuthGateway<SqliteStorage>, FixedClock> {
    let storage = Arc::new(SqliteStorage::in_memory().unwrap());
    let auth = LocalAuthGateway::new(storage.clone());
    let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
    RpcServer::new(HabitTrackerApp::new(storage, auth, Arc::new(clock)))
}

async fn run_session(server: &mut RpcServer<SqliteStorage, LocalAuthGateway<SqliteStorage>, FixedClock>, requests: &[Value]) -> Vec<Value> {
    let input: String = requests.iter().map(|r| format!("{}\n", r)).collect();
    let mut output = Vec::new();

    server.serve(input.as_bytes(), &mut output).await.unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_sign_up_add_complete_delete() {
    let mut server = server();

    let responses = run_session(
        &mut server,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "auth/signUp",
                   "params": {"email": "ada@example.com", "password": "secret1"}}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "habits/add", "params": {"name": "  Walk  "}}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "habits/add", "params": {"name": "Read"}}),
        ],
    )
    .await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["result"]["notices"][1]["message"], "Loaded 0 habits.");
    let habits = responses[2]["result"]["habits"].as_array().unwrap();
    assert_eq!(habits[0]["name"], "Read");
    assert_eq!(habits[1]["name"], "Walk");
    let walk = habits[1]["id"].clone();

    let responses = run_session(
        &mut server,
        &[
            json!({"jsonrpc": "2.0", "id": 4, "method": "habits/complete", "params": {"id": walk}}),
            json!({"jsonrpc": "2.0", "id": 5, "method": "habits/delete", "params": {"id": walk}}),
            json!({"jsonrpc": "2.0", "id": 6, "method": "habits/list"}),
        ],
    )
    .await;

    assert_eq!(responses[0]["id"], 4);
    assert_eq!(responses[0]["result"]["notices"][0]["kind"], "first_completion");
    assert_eq!(responses[1]["result"]["notices"][0]["message"], "Habit removed.");
    let habits = responses[2]["result"]["habits"].as_array().unwrap();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0]["name"], "Read");
}

#[tokio::test]
async fn test_sign_out_ends_access() {
    let mut server = server();

    let responses = run_session(
        &mut server,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "auth/signUp",
                   "params": {"email": "ada@example.com", "password": "secret1"}}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "auth/signOut"}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "habits/add", "params": {"name": "Read"}}),
            json!({"jsonrpc": "2.0", "id": 4, "method": "auth/session"}),
        ],
    )
    .await;

    assert_eq!(responses[1]["result"]["notices"][0]["kind"], "signed_out");
    assert_eq!(responses[2]["error"]["code"], -32001);
    assert_eq!(responses[3]["result"]["session"], Value::Null);
}

#[tokio::test]
async fn test_blank_lines_are_skipped_and_bad_json_reported() {
    let mut server = server();
    let mut output = Vec::new();
    let input = "\n   \n{oops\n";

    server.serve(input.as_bytes(), &mut output).await.unwrap();

    let text = String::from_utf8(output).unwrap();
    assert_eq!(text.lines().count(), 1);
    let response: Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(response["error"]["code"], -32700);
    assert_eq!(response["id"], Value::Null);
}
