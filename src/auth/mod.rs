use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::{Result, SuiteError};
use crate::http::{API_KEY_HEADER, ApiClient};

pub const LOGIN_PATH: &str = "/api/auth/login";

/// Credentials obtained from a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    pub token: String,
    pub account_id: Option<i64>,
    pub user: Option<Value>,
}

impl ApiClient {
    /// Form-encoded login. On success the token is used for every later request.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthState> {
        let url = format!("{}{}", self.base_url(), LOGIN_PATH);
        let request = self
            .raw()
            .post(&url)
            .header(API_KEY_HEADER, self.api_key())
            .form(&[("username", email), ("password", password)]);

        let round_trip = async {
            let resp = request.send().await?;
            let ok = resp.status().is_success();
            let data: Value = resp.json().await.unwrap_or(Value::Null);
            Ok::<_, SuiteError>((ok, data))
        };
        let (ok, data) = tokio::time::timeout(self.default_timeout(), round_trip)
            .await
            .map_err(|_| SuiteError::Auth("Request timeout".into()))??;

        let token = data.get("access_token").and_then(Value::as_str);
        let token = match (ok, token) {
            (true, Some(t)) => t.to_string(),
            _ => {
                let reason = data
                    .get("detail")
                    .or_else(|| data.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error");
                return Err(SuiteError::Auth(reason.to_string()));
            }
        };

        let user = data.get("user").cloned().filter(|u| !u.is_null());
        let account_id = user.as_ref().and_then(|u| u.get("id")).and_then(Value::as_i64);
        let state = AuthState {
            token,
            account_id,
            user,
        };

        let shown = state
            .user
            .as_ref()
            .and_then(|u| u.get("email"))
            .and_then(|e| e.as_str())
            .unwrap_or(email);
        info!(email = shown, account_id = ?state.account_id, "logged in");

        self.set_auth(state.clone());
        Ok(state)
    }
}
