//! Message channel between the host and the view side.
//!
//! Two independent FIFO queues, one per direction. Sending never blocks and
//! never waits for a reply; ordering holds within a direction only. The
//! same messages can be framed as newline-delimited JSON when they have to
//! cross a real process boundary.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::types::errors::ChannelError;
use crate::types::messages::{ViewCommand, ViewEvent};

pub type CommandReceiver = UnboundedReceiver<ViewCommand>;
pub type EventReceiver = UnboundedReceiver<ViewEvent>;

/// Host → view sending half.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: UnboundedSender<ViewCommand>,
}

impl CommandSender {
    /// Enqueue a command. A closed peer drops the message and is reported,
    /// the caller decides whether that matters.
    pub fn send(&self, command: ViewCommand) -> Result<(), ChannelError> {
        self.tx.send(command).map_err(|e| {
            warn!(instance_id = %e.0.instance_id(), "view side gone, command dropped");
            ChannelError::Closed
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// View → host sending half.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<ViewEvent>,
}

impl EventSender {
    pub fn send(&self, event: ViewEvent) -> Result<(), ChannelError> {
        self.tx.send(event).map_err(|e| {
            warn!(tab_id = %e.0.tab_id(), "host side gone, event dropped");
            ChannelError::Closed
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Host end: sends commands, receives events.
pub struct HostEndpoint {
    pub commands: CommandSender,
    pub events: EventReceiver,
}

/// View end: receives commands, sends events.
pub struct ViewEndpoint {
    pub commands: CommandReceiver,
    pub events: EventSender,
}

/// Create a connected host/view endpoint pair.
pub fn pair() -> (HostEndpoint, ViewEndpoint) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    (
        HostEndpoint {
            commands: CommandSender { tx: command_tx },
            events: event_rx,
        },
        ViewEndpoint {
            commands: command_rx,
            events: EventSender { tx: event_tx },
        },
    )
}

/// Encode one message as a single JSON line (no trailing newline).
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, ChannelError> {
    serde_json::to_string(message).map_err(|e| ChannelError::Encode(e.to_string()))
}

/// Decode one newline-delimited JSON line.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, ChannelError> {
    serde_json::from_str(line.trim_end_matches(['\r', '\n']))
        .map_err(|e| ChannelError::Decode(e.to_string()))
}
