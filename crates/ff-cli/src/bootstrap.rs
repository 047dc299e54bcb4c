//! Login followed by settings resolution.
//!
//! Each stage either hands its result to the next or stops the whole
//! pipeline with a [`BootstrapError`]. Nothing is tracked until a
//! [`Session`] comes out the other end.

use std::future::Future;

use ff_api::{ApiError, AuthSuccess, Client, Credentials};
use ff_core::{DefaultSettings, Session, SettingsOverride, TrackingConfig, ValidationError};
use thiserror::Error;

/// The backend calls session setup depends on.
pub trait SessionBackend: Sync {
    fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthSuccess, ApiError>> + Send;

    fn fetch_settings(&self) -> impl Future<Output = Result<DefaultSettings, ApiError>> + Send;
}

impl SessionBackend for Client {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthSuccess, ApiError> {
        Self::authenticate(self, credentials).await
    }

    async fn fetch_settings(&self) -> Result<DefaultSettings, ApiError> {
        Self::fetch_settings(self).await
    }
}

/// Session setup errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The login service refused the credentials.
    #[error("{0}")]
    Auth(String),
    /// The login request itself failed.
    #[error("login request failed: {0}")]
    Login(#[source] ApiError),
    /// Defaults were needed but could not be fetched.
    #[error("failed to fetch default settings: {0}")]
    Settings(#[source] ApiError),
    /// The merged settings are unusable.
    #[error("invalid tracking settings: {0}")]
    Config(#[from] ValidationError),
}

/// Authenticates, fetches defaults, and merges them under the per-user
/// overrides.
pub async fn establish_session<B: SessionBackend>(
    backend: &B,
    credentials: &Credentials,
) -> Result<Session, BootstrapError> {
    let auth = authenticate(backend, credentials).await?;
    let defaults = fetch_defaults(backend, &auth.overrides).await?;
    let config = TrackingConfig::merge(auth.overrides, defaults.as_ref())?;

    tracing::info!(
        user_id = %auth.user.id,
        sample_interval_ms = config.sample_interval_ms(),
        idle_threshold_ms = config.idle_threshold_ms(),
        "session settings resolved"
    );
    Ok(Session::new(auth.user, config))
}

async fn authenticate<B: SessionBackend>(
    backend: &B,
    credentials: &Credentials,
) -> Result<AuthSuccess, BootstrapError> {
    match backend.authenticate(credentials).await {
        Ok(auth) => {
            tracing::info!(user_id = %auth.user.id, username = %auth.user.username, "login successful");
            Ok(auth)
        }
        Err(ApiError::Rejected { message }) => Err(BootstrapError::Auth(message)),
        Err(err) => Err(BootstrapError::Login(err)),
    }
}

async fn fetch_defaults<B: SessionBackend>(
    backend: &B,
    overrides: &SettingsOverride,
) -> Result<Option<DefaultSettings>, BootstrapError> {
    match backend.fetch_settings().await {
        Ok(defaults) => Ok(Some(defaults)),
        Err(err) if overrides.is_complete() => {
            tracing::warn!(error = %err, "default settings unavailable, using login overrides");
            Ok(None)
        }
        Err(err) => Err(BootstrapError::Settings(err)),
    }
}
