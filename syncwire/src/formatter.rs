use colored::*;
use syncwire_core::{
    ServerEvent, SessionError, SyncPayload,
    sync_protocol::{Counter, CreateCounter},
};

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

fn payload_line(payload: &SyncPayload) -> String {
    match payload {
        SyncPayload::CreateCounter(CreateCounter { id, name, value }) => format!(
            "{} id={} name={:?} value={}",
            "CreateCounter".cyan(),
            id,
            name,
            value
        ),
        SyncPayload::Counter(Counter { id, name, value }) => format!(
            "{} id={} name={:?} value={}",
            "Counter".cyan(),
            id,
            name,
            value
        ),
    }
}

impl From<ServerEvent> for FormattedString {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::Snapshot(entities) => {
                let mut out = format!("{} ({} entities)", "Snapshot".green().bold(), entities.len());
                for entity in &entities {
                    out.push_str("\n  ");
                    out.push_str(&payload_line(entity));
                }
                FormattedString(out)
            }
            ServerEvent::ActionResult {
                correlation_id,
                payload,
            } => {
                let detail = payload
                    .as_ref()
                    .map(payload_line)
                    .unwrap_or_else(|| "(no payload)".dimmed().to_string());
                FormattedString(format!(
                    "{} [{}]\n  {}",
                    "Action result".green().bold(),
                    correlation_id,
                    detail
                ))
            }
        }
    }
}

impl From<SessionError> for FormattedString {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Transport(status) => FormattedString(format!(
                "{} code={:?} message={:?}",
                "gRPC Failed:".red().bold(),
                status.code(),
                status.message()
            )),
            err => FormattedString(format!("{}\n\n'{}'", "Session Error:".red().bold(), err)),
        }
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        FormattedString(format!("{}\n\n'{:#}'", "Error:".red().bold(), err))
    }
}
