use clap::Args;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/boardlink_cli.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub identity: String,
    pub invite_base: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            identity: "boardlink_identity.json".to_string(),
            invite_base: "https://boardlink.app".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Override the store server URL (e.g. http://127.0.0.1:8080).
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// Override where this device remembers its seat.
    #[arg(long, global = true)]
    identity: Option<String>,
    /// Override the base of invite links.
    #[arg(long, global = true)]
    invite_base: Option<String>,
}

pub fn load(args: &GlobalArgs) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("BOARDLINK_CLI"));
    let settings: AppConfig = builder.build()?.try_deserialize()?;

    let settings = apply_overrides(settings, args);
    settings.validate()?;
    Ok(settings)
}

fn apply_overrides(mut settings: AppConfig, args: &GlobalArgs) -> AppConfig {
    if let Some(server_url) = &args.server_url {
        settings.server_url = server_url.clone();
    }
    if let Some(identity) = &args.identity {
        settings.identity = identity.clone();
    }
    if let Some(invite_base) = &args.invite_base {
        settings.invite_base = invite_base.clone();
    }
    settings
}

impl AppConfig {
    /// Refuses to run against a missing or non-HTTP store address.
    pub fn validate(&self) -> Result<()> {
        let url = self.server_url.trim();
        if url.is_empty() {
            return Err(AppError::Setup("no store server configured".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Setup(format!(
                "store server '{url}' is not an http(s) URL"
            )));
        }
        if self.identity.trim().is_empty() {
            return Err(AppError::Setup("identity file path is empty".to_string()));
        }
        Ok(())
    }
}

/// Printed instead of running a command when the client cannot work.
pub fn setup_guide(reason: &str) -> String {
    format!(
        "Boardlink is not set up: {reason}.

Start a store server (`boardlink`, see config/boardlink.toml) and point the
client at it in one of these ways:

  boardlink_cli --server-url http://127.0.0.1:8080 status
  BOARDLINK_CLI_SERVER_URL=http://127.0.0.1:8080 boardlink_cli status
  server_url = \"http://127.0.0.1:8080\" in {DEFAULT_CONFIG_PATH}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_and_env() {
        let args = GlobalArgs {
            server_url: Some("http://10.0.0.2:9000".to_string()),
            identity: Some("bob.json".to_string()),
            ..GlobalArgs::default()
        };
        let settings = apply_overrides(AppConfig::default(), &args);
        assert_eq!(settings.server_url, "http://10.0.0.2:9000");
        assert_eq!(settings.identity, "bob.json");
        assert_eq!(settings.invite_base, "https://boardlink.app");
    }

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn non_http_server_requires_setup() {
        for url in ["", "   ", "ftp://host", "127.0.0.1:8080"] {
            let settings = AppConfig {
                server_url: url.to_string(),
                ..AppConfig::default()
            };
            assert!(
                matches!(settings.validate(), Err(AppError::Setup(_))),
                "{url:?}"
            );
        }
    }

    #[test]
    fn guide_mentions_every_way_to_configure() {
        let guide = setup_guide("no store server configured");
        assert!(guide.contains("--server-url"));
        assert!(guide.contains("BOARDLINK_CLI_SERVER_URL"));
        assert!(guide.contains(DEFAULT_CONFIG_PATH));
    }
}
