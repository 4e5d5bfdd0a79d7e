//! `flowstream` tail command.
//!
//! Subscribes to the requested event types (or everything), prints each
//! event as one JSON line on stdout and logs connection state changes.

use std::io::Write;

use color_eyre::Result;
use tracing::info;

use crate::cli::args::TailOptions;
use crate::client::{ConnectionState, FlowEventClient};
use crate::dispatch::{handler, EventHandler};
use crate::error::{HandlerError, StreamError};

/// Handler that writes each event as a JSON line to stdout.
pub fn print_handler() -> EventHandler {
    handler(|event| {
        let line = serde_json::to_string(event).map_err(|e| HandlerError::failed(e.to_string()))?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line).map_err(|e| HandlerError::failed(e.to_string()))
    })
}

/// Register the print handler according to `options`.
pub fn install_subscriptions(client: &FlowEventClient, options: &TailOptions) {
    let printer = print_handler();
    if options.event_types.is_empty() {
        client.subscribe_any(printer);
    } else {
        for event_type in &options.event_types {
            client.subscribe(event_type, printer.clone());
        }
    }
}

/// Tail the stream until Ctrl-C.
pub async fn run_tail(client: &FlowEventClient, options: &TailOptions) -> Result<()> {
    install_subscriptions(client, options);

    let mut states = client.state_receiver();
    let mut last_attempt = 0;
    client.connect(options.flow_id.as_deref());

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                log_state(&state);
                if let Some(notice) = retry_notice(&state, &mut last_attempt) {
                    eprintln!("{}", notice);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Interrupted, closing event stream");
                break;
            }
        }
    }

    client.disconnect();
    Ok(())
}

/// Message for the user when automatic reconnection has given up.
///
/// `last_attempt` tracks the most recent pending attempt and is cleared by
/// a successful connection.
fn retry_notice(state: &ConnectionState, last_attempt: &mut u32) -> Option<String> {
    match state {
        ConnectionState::ReconnectPending { attempt, .. } => {
            *last_attempt = *attempt;
            None
        }
        ConnectionState::Connected { .. } => {
            *last_attempt = 0;
            None
        }
        ConnectionState::Disconnected if *last_attempt > 0 => {
            let attempts = std::mem::take(last_attempt);
            Some(StreamError::RetryExhausted { attempts }.user_message())
        }
        _ => None,
    }
}

fn log_state(state: &ConnectionState) {
    match state {
        ConnectionState::Disconnected => info!("Event stream disconnected"),
        ConnectionState::Connecting { scope } => info!(flow_id = ?scope, "Connecting"),
        ConnectionState::Connected { scope } => info!(flow_id = ?scope, "Connected"),
        ConnectionState::ReconnectPending {
            attempt, delay, ..
        } => info!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Waiting to reconnect"
        ),
    }
}
