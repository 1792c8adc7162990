/// JSON-RPC message structures for the habit tracker interface
///
/// Requests and responses are single-line JSON-RPC 2.0 messages. Each
/// successful call returns the notices produced by the operation together
/// with a snapshot of the session and the current habit list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::AppError;
use crate::auth::{AuthError, Session};
use crate::domain::{Habit, Notice};

/// JSON-RPC 2.0 request message
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,
    /// Request identifier echoed back in the response
    #[serde(default)]
    pub id: Value,
    /// Method name (e.g., "habits/complete")
    pub method: String,
    /// Parameters for the method call
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response message
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error information
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    /// For application errors, the error notice to show
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC error codes
pub mod error_codes {
    /// Invalid JSON was received
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// The requested method doesn't exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Method exists but parameters are wrong
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;

    // Application-specific codes, in the -32000 to -32099 range
    /// A habit method was called without a signed-in user
    pub const NOT_AUTHENTICATED: i32 = -32001;
    /// Sign-in, sign-up or password change was rejected
    pub const AUTH_FAILED: i32 = -32002;
    /// Only a password update is allowed in a recovery session
    pub const RECOVERY_PENDING: i32 = -32003;
    /// The account store failed
    pub const STORAGE_ERROR: i32 = -32004;
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data,
            }),
        }
    }
}

/// Map an application error to its JSON-RPC error code
pub fn app_error_code(error: &AppError) -> i32 {
    match error {
        AppError::NotAuthenticated => error_codes::NOT_AUTHENTICATED,
        AppError::RecoveryPending => error_codes::RECOVERY_PENDING,
        AppError::Auth(AuthError::NotAuthenticated) => error_codes::NOT_AUTHENTICATED,
        AppError::Auth(AuthError::Storage(_)) => error_codes::STORAGE_ERROR,
        AppError::Auth(AuthError::Hashing(_)) => error_codes::INTERNAL_ERROR,
        AppError::Auth(_) => error_codes::AUTH_FAILED,
    }
}

/// `auth/signIn` and `auth/signUp`
#[derive(Debug, Deserialize)]
pub struct CredentialsParams {
    pub email: String,
    pub password: String,
}

/// `auth/requestPasswordReset`
#[derive(Debug, Deserialize)]
pub struct EmailParams {
    pub email: String,
}

/// `auth/recover`
#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub token: String,
}

/// `auth/updatePassword`
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordParams {
    pub password: String,
    pub confirmation: String,
}

/// `habits/add`
#[derive(Debug, Deserialize)]
pub struct AddHabitParams {
    pub name: String,
}

/// `habits/complete` and `habits/delete`
#[derive(Debug, Deserialize)]
pub struct HabitIdParams {
    pub id: String,
}

/// The signed-in user as reported to clients
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub user_id: String,
    pub email: String,
    pub recovery: bool,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id.to_string(),
            email: session.email.clone(),
            recovery: session.recovery,
        }
    }
}

/// One row of the habit list
#[derive(Debug, Serialize)]
pub struct HabitView {
    pub id: String,
    pub name: String,
    pub streak: u32,
    pub last_completed_date: Option<NaiveDate>,
    /// Lets the client disable the completion control
    pub completed_today: bool,
}

impl HabitView {
    pub fn new(habit: &Habit, completed_today: bool) -> Self {
        Self {
            id: habit.id.to_string(),
            name: habit.name.clone(),
            streak: habit.streak,
            last_completed_date: habit.last_completed_date,
            completed_today,
        }
    }
}

/// Result payload of every successful call
#[derive(Debug, Serialize)]
pub struct CallResult {
    pub notices: Vec<Notice>,
    pub session: Option<SessionView>,
    pub habits: Vec<HabitView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_id_defaults_to_null() {
        let request: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "habits/list"})).unwrap();
        assert_eq!(request.id, Value::Null);
        assert!(request.params.is_none());
    }

    #[test]
    fn test_error_response_shape() {
        let response = JsonRpcResponse::error(json!(7), error_codes::METHOD_NOT_FOUND, "nope".to_string(), None);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn test_app_error_codes() {
        assert_eq!(app_error_code(&AppError::NotAuthenticated), error_codes::NOT_AUTHENTICATED);
        assert_eq!(
            app_error_code(&AppError::Auth(AuthError::InvalidCredentials)),
            error_codes::AUTH_FAILED
        );
        assert_eq!(app_error_code(&AppError::RecoveryPending), error_codes::RECOVERY_PENDING);
    }
}
