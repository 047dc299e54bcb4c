//! HTTP client for the FocusFlow backend.
//!
//! Covers the three endpoints the agent talks to:
//! - `login.php`: exchanges credentials for a user identity and per-user overrides
//! - `api/get_settings.php`: server-wide default tracking settings
//! - `api/track.php`: accepts one activity or idle report per request

use std::fmt;

use ff_core::{DefaultSettings, Report, SettingsOverride, User, UserId};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod telemetry;
#[cfg(test)]
mod test_server;

pub use telemetry::HttpTelemetry;

const USER_AGENT: &str = concat!("focusflow/", env!("CARGO_PKG_VERSION"));

/// Shown when the login service rejects credentials without saying why.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

/// Backend client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A configured URL could not be parsed or joined.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// The login service refused the credentials. Carries its message verbatim.
    #[error("{message}")]
    Rejected { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Background dispatch was requested outside a tokio runtime.
    #[error("no tokio runtime available for background telemetry")]
    NoRuntime,
}

/// Resolved backend URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: Url,
    pub settings: Url,
    pub track: Url,
}

impl Endpoints {
    /// Joins each path onto `server_url`, which is treated as a directory
    /// whether or not it ends in `/`.
    pub fn new(
        server_url: &str,
        login_path: &str,
        settings_path: &str,
        track_path: &str,
    ) -> Result<Self, ApiError> {
        let invalid = |url: &str, err: &dyn fmt::Display| ApiError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        };

        let mut base = server_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|err| invalid(server_url, &err))?;
        let join = |path: &str| {
            base.join(path.trim_start_matches('/'))
                .map_err(|err| invalid(path, &err))
        };

        Ok(Self {
            login: join(login_path)?,
            settings: join(settings_path)?,
            track: join(track_path)?,
        })
    }
}

/// Login form fields.
#[derive(Clone, Serialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSuccess {
    pub user: User,
    pub overrides: SettingsOverride,
}

/// FocusFlow backend client.
///
/// Cheap to clone; clones share the underlying connection pool. Requests
/// carry no timeout, so a hung server leaves the request pending.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl Client {
    pub fn new(endpoints: Endpoints) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ApiError::ClientBuild)?;
        Ok(Self { http, endpoints })
    }

    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Posts the login form.
    ///
    /// The body is parsed regardless of HTTP status: the login service
    /// reports failures as `{"status": "...", "message": "..."}`.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AuthSuccess, ApiError> {
        let response = self
            .http
            .post(self.endpoints.login.clone())
            .form(credentials)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_login(status, &body, credentials.username())
    }

    /// Fetches the server-wide default settings.
    pub async fn fetch_settings(&self) -> Result<DefaultSettings, ApiError> {
        let response = self.http.get(self.endpoints.settings.clone()).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }

    /// Posts one report and returns the raw response body.
    pub async fn send_report(&self, report: &Report) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.endpoints.track.clone())
            .form(&report.form())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user_id: Option<serde_json::Value>,
    #[serde(default)]
    username: Option<String>,
    #[serde(flatten)]
    overrides: SettingsOverride,
}

fn parse_login(status: StatusCode, body: &str, submitted: &str) -> Result<AuthSuccess, ApiError> {
    let payload: LoginPayload = serde_json::from_str(body)
        .map_err(|err| ApiError::InvalidResponse(format!("status {status}: {err}")))?;

    if payload.status != "success" {
        let message = payload
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
        return Err(ApiError::Rejected { message });
    }

    let id = match payload.user_id {
        Some(serde_json::Value::Number(id)) => id.to_string(),
        Some(serde_json::Value::String(id)) => id,
        _ => {
            return Err(ApiError::InvalidResponse(
                "login response is missing user_id".to_string(),
            ));
        }
    };
    let id = UserId::new(id).map_err(|err| ApiError::InvalidResponse(err.to_string()))?;
    let username = payload
        .username
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| submitted.to_string());

    Ok(AuthSuccess {
        user: User { id, username },
        overrides: payload.overrides,
    })
}

#[cfg(test)]
mod tests {
    use ff_core::ActiveWindow;

    use super::test_server::{closed_port, serve};
    use super::*;

    fn client(base: &str) -> Client {
        let endpoints =
            Endpoints::new(base, "login.php", "api/get_settings.php", "api/track.php").unwrap();
        Client::new(endpoints).unwrap()
    }

    #[test]
    fn endpoints_join_onto_base_directory() {
        let endpoints = Endpoints::new(
            "http://localhost/FocusFlow/public",
            "login.php",
            "/api/get_settings.php",
            "api/track.php",
        )
        .unwrap();
        assert_eq!(
            endpoints.login.as_str(),
            "http://localhost/FocusFlow/public/login.php"
        );
        assert_eq!(
            endpoints.settings.as_str(),
            "http://localhost/FocusFlow/public/api/get_settings.php"
        );
        assert_eq!(
            endpoints.track.as_str(),
            "http://localhost/FocusFlow/public/api/track.php"
        );
    }

    #[test]
    fn endpoints_reject_relative_base() {
        let err = Endpoints::new("FocusFlow/public", "a", "b", "c").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { .. }));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = Credentials::new("ana", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("ana"));
    }

    #[test]
    fn parse_login_accepts_string_user_id_and_falls_back_to_submitted_name() {
        let parsed = parse_login(
            StatusCode::OK,
            r#"{"status":"success","user_id":"u-19"}"#,
            "ana",
        )
        .unwrap();
        assert_eq!(parsed.user.id.as_str(), "u-19");
        assert_eq!(parsed.user.username, "ana");
        assert_eq!(parsed.overrides, SettingsOverride::default());
    }

    #[test]
    fn parse_login_requires_user_id() {
        let err = parse_login(StatusCode::OK, r#"{"status":"success"}"#, "ana").unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn parse_login_rejects_non_json() {
        let err = parse_login(StatusCode::BAD_GATEWAY, "<html>", "ana").unwrap_err();
        let ApiError::InvalidResponse(message) = err else {
            panic!("expected InvalidResponse");
        };
        assert!(message.starts_with("status 502 Bad Gateway"));
    }

    #[tokio::test]
    async fn authenticate_posts_form_and_reads_overrides() {
        let (base, server) = serve(vec![(
            200,
            r#"{"status":"success","user_id":7,"username":"ana","tracking_interval":"10","idle_timeout":null}"#,
        )])
        .await;

        let auth = client(&base)
            .authenticate(&Credentials::new("ana", "s3cret!"))
            .await
            .unwrap();

        assert_eq!(auth.user.id.as_str(), "7");
        assert_eq!(auth.user.username, "ana");
        assert_eq!(auth.overrides.tracking_interval_secs, Some(10));
        assert_eq!(auth.overrides.idle_timeout_secs, None);

        let requests = server.await.unwrap();
        assert_eq!(
            requests[0].request_line,
            "POST /FocusFlow/public/login.php HTTP/1.1"
        );
        assert!(
            requests[0]
                .header("content-type")
                .is_some_and(|value| value.contains("application/x-www-form-urlencoded"))
        );
        assert_eq!(requests[0].body, "username=ana&password=s3cret%21");
    }

    #[tokio::test]
    async fn authenticate_surfaces_rejection_message_verbatim() {
        let (base, _server) = serve(vec![(
            200,
            r#"{"status":"error","message":"Invalid username or password."}"#,
        )])
        .await;

        let err = client(&base)
            .authenticate(&Credentials::new("ana", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Rejected { .. }));
        assert_eq!(err.to_string(), "Invalid username or password.");
    }

    #[tokio::test]
    async fn authenticate_rejection_without_message_uses_default() {
        let (base, _server) = serve(vec![(401, r#"{"status":"error"}"#)]).await;

        let err = client(&base)
            .authenticate(&Credentials::new("ana", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), LOGIN_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn fetch_settings_parses_defaults() {
        let (base, server) = serve(vec![(
            200,
            r#"{"tracking_interval_seconds":"30","idle_timeout_seconds":120}"#,
        )])
        .await;

        let settings = client(&base).fetch_settings().await.unwrap();

        assert_eq!(
            settings,
            DefaultSettings {
                tracking_interval_seconds: 30,
                idle_timeout_seconds: 120,
            }
        );
        let requests = server.await.unwrap();
        assert_eq!(
            requests[0].request_line,
            "GET /FocusFlow/public/api/get_settings.php HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn fetch_settings_reports_server_errors() {
        let (base, _server) = serve(vec![(500, "database is down")]).await;

        let err = client(&base).fetch_settings().await.unwrap_err();

        let ApiError::Status { status, body } = err else {
            panic!("expected a status error");
        };
        assert_eq!(status, 500);
        assert_eq!(body, "database is down");
    }

    #[tokio::test]
    async fn send_report_posts_form_fields_in_order() {
        let (base, server) = serve(vec![(200, r#"{"status":"ok"}"#)]).await;
        let report = Report::activity(
            UserId::new("7").unwrap(),
            ActiveWindow {
                app_name: "Code".to_string(),
                window_title: "main.rs - focusflow".to_string(),
            },
        );

        let body = client(&base).send_report(&report).await.unwrap();

        assert_eq!(body, r#"{"status":"ok"}"#);
        let requests = server.await.unwrap();
        assert_eq!(
            requests[0].request_line,
            "POST /FocusFlow/public/api/track.php HTTP/1.1"
        );
        assert_eq!(
            requests[0].body,
            "user_id=7&application_name=Code&window_title=main.rs+-+focusflow&is_idle=0"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_request_error() {
        let base = format!("http://127.0.0.1:{}/", closed_port().await);

        let err = client(&base).fetch_settings().await.unwrap_err();

        assert!(matches!(err, ApiError::Request(_)));
    }
}
