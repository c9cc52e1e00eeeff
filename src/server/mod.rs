//! HTTP trigger for remote runs. Each `POST /run` spawns a fresh runner process, so
//! concurrent requests never share results or chain state.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::process::Command;
use tracing::{error, info, instrument};

use crate::errors::{Result, SuiteError};

pub const DEFAULT_PORT: u16 = 10000;
const STDOUT_TAIL_LINES: usize = 50;

#[derive(Debug, Clone)]
pub struct ServerState {
    /// Runner executable spawned per request.
    pub runner: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunParams {
    pub module: Option<String>,
    pub smoke: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timestamp: String,
}

/// `--port`, then `PORT`, then the default.
pub fn resolve_port(flag: Option<u16>, env: Option<String>) -> Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match env.filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SuiteError::Config(format!("PORT must be a port number, got '{raw}'"))),
        None => Ok(DEFAULT_PORT),
    }
}

/// Child arguments: always persist a report, then the selection flags.
pub fn runner_args(params: &RunParams) -> Vec<String> {
    let mut args = vec!["--report".to_string()];
    if let Some(module) = params.module.as_deref().filter(|m| !m.is_empty()) {
        args.push("--module".into());
        args.push(module.into());
    }
    if params.smoke.as_deref() == Some("true") {
        args.push("--smoke".into());
    }
    args
}

pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/run", post(run).fallback(not_found))
        .fallback(not_found)
        .layer(middleware::map_response(allow_any_origin))
        .with_state(Arc::new(state))
}

async fn allow_any_origin(mut res: Response) -> Response {
    res.headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    res
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "timestamp": now_iso() }))
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Audience Research API Test Suite",
        "endpoints": {
            "GET /health": "Health check",
            "POST /run": "Run all tests",
            "POST /run?module=health": "Run specific module",
            "POST /run?smoke=true": "Run smoke tests",
        },
    }))
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

#[instrument(skip_all, fields(module = ?params.module, smoke = ?params.smoke))]
async fn run(State(state): State<Arc<ServerState>>, Query(params): Query<RunParams>) -> Response {
    let args = runner_args(&params);
    info!(?args, runner = %state.runner.display(), "spawning test run");

    let output = match Command::new(&state.runner).args(&args).output().await {
        Ok(output) => output,
        Err(e) => {
            error!("failed to spawn runner: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let body = RunResponse {
        exit_code: output.status.code(),
        stdout: tail_lines(&String::from_utf8_lossy(&output.stdout), STDOUT_TAIL_LINES),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        timestamp: now_iso(),
    };
    info!(exit_code = ?body.exit_code, "test run finished");
    (StatusCode::OK, Json(body)).into_response()
}

/// Serve until the process is stopped, spawning the current executable for each run.
pub async fn serve(port: u16) -> Result<()> {
    let runner = std::env::current_exe()?;
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "Test server running on port {port}");

    axum::serve(listener, router(ServerState { runner }))
        .await
        .map_err(|e| SuiteError::Server(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn spawn_server(runner: &str) -> String {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(ServerState {
            runner: PathBuf::from(runner),
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_resolve_port_precedence() {
        assert_eq!(resolve_port(Some(8080), Some("9000".into())).unwrap(), 8080);
        assert_eq!(resolve_port(None, Some("9000".into())).unwrap(), 9000);
        assert_eq!(resolve_port(None, None).unwrap(), DEFAULT_PORT);
        assert_eq!(resolve_port(None, Some("".into())).unwrap(), DEFAULT_PORT);
        assert!(resolve_port(None, Some("http".into())).is_err());
    }

    #[test]
    fn test_runner_args() {
        let all = RunParams::default();
        assert_eq!(runner_args(&all), ["--report"]);

        let p = RunParams {
            module: Some("health".into()),
            smoke: Some("true".into()),
        };
        assert_eq!(runner_args(&p), ["--report", "--module", "health", "--smoke"]);

        let p = RunParams {
            module: Some(String::new()),
            smoke: Some("yes".into()),
        };
        assert_eq!(runner_args(&p), ["--report"]);
    }

    #[test]
    fn test_tail_lines() {
        let text: String = (1..=60).map(|i| format!("line{i}\n")).collect();
        let tail = tail_lines(&text, 50);
        // trailing newline leaves an empty last element
        assert!(tail.starts_with("line12\n"));
        assert!(tail.ends_with("line60\n"));
        assert_eq!(tail_lines("a\nb", 50), "a\nb");
    }

    #[tokio::test]
    async fn test_health_index_and_not_found() {
        let base = spawn_server("/nonexistent/runner").await;
        let client = reqwest::Client::new();

        let res = client.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["status"], "ok");

        let res = client.get(format!("{base}/")).send().await.unwrap();
        let body: Value = res.json().await.unwrap();
        assert!(body["endpoints"].get("POST /run").is_some());

        let res = client.get(format!("{base}/nope")).send().await.unwrap();
        assert_eq!(res.status(), 404);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Not found");

        let res = client.get(format!("{base}/run")).send().await.unwrap();
        assert_eq!(res.status(), 404);
    }

    #[tokio::test]
    async fn test_run_spawn_failure_is_500() {
        let base = spawn_server("/nonexistent/runner").await;
        let res = reqwest::Client::new()
            .post(format!("{base}/run?module=health"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 500);
        let body: Value = res.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_child_output() {
        let base = spawn_server("/bin/echo").await;
        let res = reqwest::Client::new()
            .post(format!("{base}/run?smoke=true"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: RunResponse = res.json().await.unwrap();
        assert_eq!(body.exit_code, Some(0));
        assert_eq!(body.stdout, "--report --smoke\n");
    }
}
