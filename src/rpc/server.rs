/// JSON-RPC server loop
///
/// This module implements the server that:
/// 1. Reads one JSON-RPC request per line
/// 2. Routes it to the habit tracker application
/// 3. Writes one JSON-RPC response per line

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::app::{AppError, HabitTrackerApp};
use crate::auth::AuthGateway;
use crate::domain::{Clock, HabitId, Notice};
use crate::rpc::protocol::*;
use crate::storage::HabitStore;
use crate::ServerError;

/// Why a call did not produce a result
enum CallError {
    MethodNotFound(String),
    InvalidParams(String),
    App(AppError),
}

impl From<AppError> for CallError {
    fn from(e: AppError) -> Self {
        CallError::App(e)
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, CallError> {
    let params = params.ok_or_else(|| CallError::InvalidParams("Missing parameters".to_string()))?;
    serde_json::from_value(params)
        .map_err(|e| CallError::InvalidParams(format!("Invalid parameters: {}", e)))
}

fn parse_habit_id(params: Option<Value>) -> Result<HabitId, CallError> {
    let params: HabitIdParams = parse_params(params)?;
    HabitId::from_string(&params.id)
        .map_err(|_| CallError::InvalidParams(format!("Invalid habit id '{}'", params.id)))
}

/// JSON-RPC front end for a [`HabitTrackerApp`]
pub struct RpcServer<S: HabitStore, A: AuthGateway, C: Clock> {
    app: HabitTrackerApp<S, A, C>,
}

impl<S: HabitStore, A: AuthGateway, C: Clock> RpcServer<S, A, C> {
    pub fn new(app: HabitTrackerApp<S, A, C>) -> Self {
        Self { app }
    }

    pub fn app(&self) -> &HabitTrackerApp<S, A, C> {
        &self.app
    }

    /// Serve requests from stdin, writing responses to stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting JSON-RPC server, waiting for requests...");
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Serve requests until the reader reaches end of input
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("JSON-RPC server shutting down (input closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        writer.write_all(response_str.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read request: {}", e);
                    return Err(e.into());
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
                warn!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    json!(null),
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        Some(self.handle_request(request).await)
    }

    async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::error(
                request.id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported JSON-RPC version '{}'", request.jsonrpc),
                None,
            );
        }

        match self.call(&request.method, request.params).await {
            Ok(notices) => match serde_json::to_value(self.snapshot(notices)) {
                Ok(result) => JsonRpcResponse::success(request.id, result),
                Err(e) => JsonRpcResponse::error(
                    request.id,
                    error_codes::INTERNAL_ERROR,
                    format!("Failed to encode result: {}", e),
                    None,
                ),
            },
            Err(CallError::MethodNotFound(method)) => JsonRpcResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", method),
                None,
            ),
            Err(CallError::InvalidParams(message)) => {
                JsonRpcResponse::error(request.id, error_codes::INVALID_PARAMS, message, None)
            }
            Err(CallError::App(e)) => {
                debug!("Request {} failed: {}", request.method, e);
                let notice = serde_json::to_value(Notice::error(e.to_string())).ok();
                JsonRpcResponse::error(request.id, app_error_code(&e), e.to_string(), notice)
            }
        }
    }

    async fn call(&mut self, method: &str, params: Option<Value>) -> Result<Vec<Notice>, CallError> {
        let notices = match method {
            "auth/signIn" => {
                let p: CredentialsParams = parse_params(params)?;
                self.app.sign_in(&p.email, &p.password).await?
            }
            "auth/signUp" => {
                let p: CredentialsParams = parse_params(params)?;
                self.app.sign_up(&p.email, &p.password).await?
            }
            "auth/requestPasswordReset" => {
                let p: EmailParams = parse_params(params)?;
                vec![self.app.request_password_reset(&p.email).await?]
            }
            "auth/recover" => {
                let p: TokenParams = parse_params(params)?;
                vec![self.app.recover(&p.token).await?]
            }
            "auth/updatePassword" => {
                let p: UpdatePasswordParams = parse_params(params)?;
                self.app.update_password(&p.password, &p.confirmation).await?
            }
            "auth/signOut" => vec![self.app.sign_out().await],
            "auth/session" => Vec::new(),
            "habits/list" => {
                self.app.habits()?;
                Vec::new()
            }
            "habits/reload" => self.app.reload().await?.into_iter().collect(),
            "habits/add" => {
                let p: AddHabitParams = parse_params(params)?;
                self.app.add(&p.name).await?.into_iter().collect()
            }
            "habits/complete" => {
                let id = parse_habit_id(params)?;
                self.app.complete(&id).await?.into_iter().collect()
            }
            "habits/delete" => {
                let id = parse_habit_id(params)?;
                self.app.delete(&id).await?.into_iter().collect()
            }
            other => return Err(CallError::MethodNotFound(other.to_string())),
        };

        Ok(notices)
    }

    /// Notices plus the current session and habit list
    fn snapshot(&self, notices: Vec<Notice>) -> CallResult {
        let habits = match self.app.collection() {
            Ok(collection) => collection
                .habits()
                .iter()
                .map(|h| HabitView::new(h, collection.is_completed_today(&h.id)))
                .collect(),
            Err(_) => Vec::new(),
        };

        CallResult {
            notices,
            session: self.app.session().map(SessionView::from),
            habits,
        }
    }
}
