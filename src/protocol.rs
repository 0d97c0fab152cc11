//! Inbound events and outbound actions exchanged with the chat gateway.
//!
//! The gateway is responsible for classifying raw transport messages into
//! [`Event`]s filtered to the configured channel, and for rendering
//! [`Action`]s back onto the wire. The engine never talks to the transport
//! directly.

use crate::types::Nick;
use serde::{Deserialize, Serialize};

/// An abstract chat event delivered to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Event {
    /// Someone asked to join the game (e.g. a `!play` command).
    Join { nick: Nick },
    /// A player left the channel or quit the game.
    Leave { nick: Nick },
    /// A player's connection to the network dropped.
    Disconnect { nick: Nick },
    /// A sender changed their nick.
    Rename { old_nick: Nick, new_nick: Nick },
    /// Free-form channel text, commands included.
    Message { nick: Nick, text: String },
}

/// Direction of a privilege change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeDelta {
    Grant,
    Revoke,
}

/// A fire-and-forget emission towards the chat gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Action {
    /// Public announcement to the game channel, one line per element.
    Announce { lines: Vec<String> },
    /// Private message to a single recipient.
    Notify { recipient: Nick, lines: Vec<String> },
    /// Request a privilege change. Without a nick the delta targets the
    /// channel-wide moderation flag; with a nick it targets that player's
    /// voice.
    Privilege {
        channel: String,
        delta: PrivilegeDelta,
        nick: Option<Nick>,
    },
}
