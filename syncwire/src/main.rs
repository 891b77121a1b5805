//! # Syncwire CLI Entry Point
//!
//! The main executable drives one sync session from start to end:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`], merges the optional
//!    settings file and installs the `tracing` subscriber.
//! 2. **Transport**: Builds the lazily connected stub with `syncwire_core`.
//! 3. **Session**: Opens a session bound to the process lifecycle and sends the requested action.
//! 4. **Presentation**: Prints every server message until the stream ends. Ctrl-C ends the
//!    lifecycle, which releases the stream before the process exits.

mod cli;
mod formatter;
mod settings;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use formatter::FormattedString;
use futures_util::StreamExt;
use settings::Settings;
use std::process;
use syncwire_core::{
    Envelope, InboundStream, Lifecycle, Session, SessionError, sync_protocol::CreateCounter,
    transport::build_client,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(args).await {
        eprintln!("{}", FormattedString::from(err));
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "info,syncwire=debug,syncwire_core=debug"
        } else {
            "warn"
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Cli) -> Result<()> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let config = settings.into_config(&args)?;
    let stub = build_client(&config).context("Invalid transport configuration")?;

    let lifecycle = Lifecycle::new();
    let mut session = Session::open(&stub, &lifecycle);
    let mut inbound = session.observe()?;

    if let Commands::SendCounter {
        correlation_id,
        id,
        name,
        value,
    } = args.command
    {
        let action = CreateCounter { id, name, value };
        inbound = send_action(&session, inbound, Envelope::pack(correlation_id, &action))
            .await
            .context("Failed to send CreateCounter")?;
    }

    let outcome = tokio::select! {
        outcome = print_events(inbound) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, closing the session");
            Ok(())
        }
    };

    lifecycle.end();
    session.closed().await;

    outcome.map_err(Into::into)
}

/// Sends `envelope`, handing back the inbound stream for printing.
///
/// When the session has already closed, the stream holds the error that closed it, which
/// is reported instead of the bare `Closed`.
async fn send_action(
    session: &Session,
    inbound: InboundStream,
    envelope: Envelope,
) -> Result<InboundStream> {
    match session.send(envelope).await {
        Ok(()) => Ok(inbound),
        Err(SessionError::Closed) => {
            print_events(inbound)
                .await
                .context("The sync stream ended before the action was sent")?;
            bail!(SessionError::Closed)
        }
        Err(err) => Err(err.into()),
    }
}

/// Prints inbound events until the stream ends, returning the error that ended it, if any.
async fn print_events(mut inbound: InboundStream) -> Result<(), SessionError> {
    let mut last_error = None;

    while let Some(item) = inbound.next().await {
        match item {
            Ok(event) => println!("{}", FormattedString::from(event)),
            Err(SessionError::Envelope(err)) => {
                eprintln!("{}", FormattedString::from(SessionError::Envelope(err)))
            }
            Err(err) => last_error = Some(err),
        }
    }

    match last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
