//! Implementation of the `focusflow login` command.

use std::io::Write;

use anyhow::{Result, bail};
use ff_api::Credentials;

use crate::bootstrap::{self, SessionBackend};
use crate::{Config, LoginArgs};

/// Builds credentials, taking the username from the config file when the
/// flag is absent.
pub fn credentials(args: &LoginArgs, config: &Config) -> Result<Credentials> {
    let username = args
        .username
        .as_deref()
        .or(config.username.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let Some(username) = username else {
        bail!("no username given: pass --username or set `username` in the config file");
    };
    Ok(Credentials::new(username, args.password.as_str()))
}

/// Logs in and prints the settings the session would track with.
pub async fn run<W: Write, B: SessionBackend>(
    writer: &mut W,
    backend: &B,
    credentials: &Credentials,
) -> Result<()> {
    let session = bootstrap::establish_session(backend, credentials).await?;

    writeln!(
        writer,
        "Logged in as {} (user {})",
        session.user.username, session.user.id
    )?;
    writeln!(
        writer,
        "Tracking interval: {} ms",
        session.config.sample_interval_ms()
    )?;
    writeln!(
        writer,
        "Idle timeout:      {} ms",
        session.config.idle_threshold_ms()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use ff_api::ApiError;
    use ff_core::SettingsOverride;
    use insta::assert_snapshot;

    use super::*;
    use crate::bootstrap::tests::{FakeBackend, ana, defaults};

    fn args(username: Option<&str>) -> LoginArgs {
        LoginArgs {
            username: username.map(str::to_string),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_credentials_prefer_flag() {
        let config = Config {
            username: Some("from-config".to_string()),
            ..Config::default()
        };

        let credentials = credentials(&args(Some("ana")), &config).unwrap();

        assert_eq!(credentials.username(), "ana");
    }

    #[test]
    fn test_credentials_fall_back_to_config() {
        let config = Config {
            username: Some("ana".to_string()),
            ..Config::default()
        };

        let credentials = credentials(&args(None), &config).unwrap();

        assert_eq!(credentials.username(), "ana");
    }

    #[test]
    fn test_credentials_require_a_username() {
        let err = credentials(&args(Some("  ")), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("no username given"));
    }

    #[tokio::test]
    async fn test_login_prints_merged_settings() {
        let backend = FakeBackend::new(
            || {
                Ok(ana(SettingsOverride {
                    tracking_interval_secs: Some(10),
                    idle_timeout_secs: None,
                }))
            },
            defaults,
        );
        let mut output = Vec::new();

        run(&mut output, &backend, &Credentials::new("ana", "secret"))
            .await
            .unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Logged in as ana (user 7)
        Tracking interval: 10000 ms
        Idle timeout:      120000 ms
        ");
    }

    #[tokio::test]
    async fn test_login_rejection_prints_nothing() {
        let backend = FakeBackend::new(
            || {
                Err(ApiError::Rejected {
                    message: "Invalid username or password.".to_string(),
                })
            },
            defaults,
        );
        let mut output = Vec::new();

        let err = run(&mut output, &backend, &Credentials::new("ana", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid username or password.");
        assert!(output.is_empty());
    }
}
