use serde::Deserialize;
use std::time::Duration;

/// Timeout applied to reads, writes and whole calls unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub const HEADER_AUTH_TOKEN: &str = "token";
pub const HEADER_DEVICE_ID: &str = "deviceid";
pub const HEADER_USER_ID: &str = "userid";

/// How the channel negotiates its HTTP/2 connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolMode {
    /// Cleartext HTTP/2 without an upgrade handshake (`h2c` with prior knowledge).
    #[default]
    Http2PriorKnowledge,
}

/// Ordered list of headers attached to every outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet(Vec<(String, String)>);

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three headers every sync request carries.
    ///
    /// The auth token may be empty.
    pub fn sync_defaults(
        token: impl Into<String>,
        device_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self::new()
            .with(HEADER_AUTH_TOKEN, token)
            .with(HEADER_DEVICE_ID, device_id)
            .with(HEADER_USER_ID, user_id)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Everything the transport factory needs to build a [`super::SyncStub`].
///
/// A zero duration on any of the timeouts disables that timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Server URI, e.g. `http://10.0.2.2:5005`.
    pub base_url: String,
    /// Maximum idle time between two inbound messages.
    pub read_timeout: Duration,
    /// Maximum time a single send may wait for the transport to accept a message.
    pub write_timeout: Duration,
    /// Deadline for a whole call, from opening the stream until it ends.
    pub call_timeout: Duration,
    pub protocol_mode: ProtocolMode,
    pub headers: HeaderSet,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            call_timeout: DEFAULT_TIMEOUT,
            protocol_mode: ProtocolMode::default(),
            headers: HeaderSet::default(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderSet) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the read, write and call timeouts at once.
    pub fn with_timeouts(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self.write_timeout = timeout;
        self.call_timeout = timeout;
        self
    }
}

/// Per-stream deadlines derived from a [`TransportConfig`].
///
/// `None` means no deadline is imposed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamTimeouts {
    pub read: Option<Duration>,
    pub write: Option<Duration>,
    pub call: Option<Duration>,
}

impl From<&TransportConfig> for StreamTimeouts {
    fn from(config: &TransportConfig) -> Self {
        Self {
            read: non_zero(config.read_timeout),
            write: non_zero(config.write_timeout),
            call: non_zero(config.call_timeout),
        }
    }
}

fn non_zero(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_durations_disable_every_deadline() {
        let config = TransportConfig::new("http://localhost:5005").with_timeouts(Duration::ZERO);

        assert_eq!(StreamTimeouts::from(&config), StreamTimeouts::default());
    }

    #[test]
    fn defaults_keep_ten_minute_deadlines() {
        let timeouts = StreamTimeouts::from(&TransportConfig::new("http://localhost:5005"));

        assert_eq!(timeouts.read, Some(DEFAULT_TIMEOUT));
        assert_eq!(timeouts.write, Some(DEFAULT_TIMEOUT));
        assert_eq!(timeouts.call, Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn sync_defaults_keep_header_order() {
        let headers = HeaderSet::sync_defaults("", "55", "555");
        let collected: Vec<_> = headers.iter().collect();

        assert_eq!(
            collected,
            vec![("token", ""), ("deviceid", "55"), ("userid", "555")]
        );
    }
}
