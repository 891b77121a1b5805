use crate::cli::Cli;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};
use syncwire_core::{HeaderSet, ProtocolMode, TransportConfig, transport::config::DEFAULT_TIMEOUT};

/// Connection settings loaded from a JSON file.
///
/// ```json
/// {
///   "token": "",
///   "device_id": "55",
///   "user_id": "555",
///   "read_timeout_secs": 600,
///   "protocol_mode": "http2_prior_knowledge"
/// }
/// ```
#[derive(Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub token: Option<String>,
    pub device_id: Option<String>,
    pub user_id: Option<String>,
    pub read_timeout_secs: Option<u64>,
    pub write_timeout_secs: Option<u64>,
    pub call_timeout_secs: Option<u64>,
    pub protocol_mode: ProtocolMode,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read settings file '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file '{}'", path.display()))
    }

    /// Builds the transport configuration, letting command-line flags override the file.
    pub fn into_config(self, cli: &Cli) -> Result<TransportConfig> {
        let token = cli.token.clone().or(self.token).unwrap_or_default();
        let Some(device_id) = cli.device_id.clone().or(self.device_id) else {
            bail!("A device id is required (--device-id or \"device_id\" in the settings file)");
        };
        let Some(user_id) = cli.user_id.clone().or(self.user_id) else {
            bail!("A user id is required (--user-id or \"user_id\" in the settings file)");
        };

        let timeout = |flag: Option<u64>, file: Option<u64>| {
            flag.or(file).map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT)
        };

        let mut config = TransportConfig::new(cli.url.clone())
            .with_headers(HeaderSet::sync_defaults(token, device_id, user_id));
        config.read_timeout = timeout(cli.read_timeout_secs, self.read_timeout_secs);
        config.write_timeout = timeout(cli.write_timeout_secs, self.write_timeout_secs);
        config.call_timeout = timeout(cli.call_timeout_secs, self.call_timeout_secs);
        config.protocol_mode = self.protocol_mode;

        Ok(config)
    }
}
