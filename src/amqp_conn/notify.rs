// MIT License
//
// Copyright (c) 2025 Takatoshi Kondo
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Outbound notifications to the application-facing component.

use std::fmt;

use tokio::sync::mpsc;

use crate::amqp_conn::handle::{CallbackId, ComponentId};

/// Why a pending send was flushed without confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeCause {
    /// The connection was closed on request or by the peer
    Closed,
    /// The connection failed
    Failed,
}

/// How a tracked send finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// QoS 0: all of the message bytes were handed to the transport
    Written,
    /// QoS 1: the peer settled the delivery
    Settled,
    /// The connection went away before the send could be confirmed
    Purged(PurgeCause),
}

impl SendOutcome {
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, SendOutcome::Purged(_))
    }
}

/// Reason reported alongside a disconnect notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The application asked for the connection to be closed
    Requested,
    /// The peer closed the connection, optionally with an error description
    Remote(Option<String>),
    /// The network channel reported an error
    Channel(String),
    /// The engine reported an unrecoverable protocol error
    Protocol(String),
    /// The connection did not open within the configured timeout
    OpenTimeout,
    /// The endpoint handle was dropped while the connection was still live
    HandleDropped,
}

impl DisconnectReason {
    pub fn purge_cause(&self) -> PurgeCause {
        match self {
            DisconnectReason::Requested | DisconnectReason::Remote(None) => PurgeCause::Closed,
            _ => PurgeCause::Failed,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::Requested => write!(f, "closed on request"),
            DisconnectReason::Remote(None) => write!(f, "closed by peer"),
            DisconnectReason::Remote(Some(e)) => write!(f, "closed by peer: {e}"),
            DisconnectReason::Channel(e) => write!(f, "network channel error: {e}"),
            DisconnectReason::Protocol(e) => write!(f, "protocol error: {e}"),
            DisconnectReason::OpenTimeout => write!(f, "open timed out"),
            DisconnectReason::HandleDropped => write!(f, "endpoint handle dropped"),
        }
    }
}

/// A notification addressed to the application-facing component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SendComplete {
        callback: CallbackId,
        owner: ComponentId,
        outcome: SendOutcome,
    },
    Disconnected {
        owner: ComponentId,
        reason: DisconnectReason,
    },
    CreditLow {
        subscriber: ComponentId,
        link: String,
    },
    CreditExceeded {
        subscriber: ComponentId,
        link: String,
    },
    Drained {
        owner: ComponentId,
    },
}

/// Sink for outbound notifications
///
/// Implementations must not call back into the connection state; notifications are
/// delivered while the state is mid-update.
pub trait Notify {
    fn send_complete(&mut self, callback: CallbackId, owner: ComponentId, outcome: SendOutcome);

    fn disconnected(&mut self, owner: ComponentId, reason: &DisconnectReason);

    fn credit_low(&mut self, subscriber: ComponentId, link: &str);

    /// The peer delivered beyond the credit granted on `link`
    fn credit_exceeded(&mut self, subscriber: ComponentId, link: &str);

    /// Output that backed up behind earlier sends has all been written
    fn drained(&mut self, owner: ComponentId);
}

/// Collects notifications in memory, in the order they were raised.
impl Notify for Vec<Notification> {
    fn send_complete(&mut self, callback: CallbackId, owner: ComponentId, outcome: SendOutcome) {
        self.push(Notification::SendComplete {
            callback,
            owner,
            outcome,
        });
    }

    fn disconnected(&mut self, owner: ComponentId, reason: &DisconnectReason) {
        self.push(Notification::Disconnected {
            owner,
            reason: reason.clone(),
        });
    }

    fn credit_low(&mut self, subscriber: ComponentId, link: &str) {
        self.push(Notification::CreditLow {
            subscriber,
            link: link.to_string(),
        });
    }

    fn credit_exceeded(&mut self, subscriber: ComponentId, link: &str) {
        self.push(Notification::CreditExceeded {
            subscriber,
            link: link.to_string(),
        });
    }

    fn drained(&mut self, owner: ComponentId) {
        self.push(Notification::Drained { owner });
    }
}

/// Forwards notifications to a routing task.
///
/// A closed receiver means nobody is left to route to, so send errors are dropped.
impl Notify for mpsc::UnboundedSender<Notification> {
    fn send_complete(&mut self, callback: CallbackId, owner: ComponentId, outcome: SendOutcome) {
        let _ = self.send(Notification::SendComplete {
            callback,
            owner,
            outcome,
        });
    }

    fn disconnected(&mut self, owner: ComponentId, reason: &DisconnectReason) {
        let _ = self.send(Notification::Disconnected {
            owner,
            reason: reason.clone(),
        });
    }

    fn credit_low(&mut self, subscriber: ComponentId, link: &str) {
        let _ = self.send(Notification::CreditLow {
            subscriber,
            link: link.to_string(),
        });
    }

    fn credit_exceeded(&mut self, subscriber: ComponentId, link: &str) {
        let _ = self.send(Notification::CreditExceeded {
            subscriber,
            link: link.to_string(),
        });
    }

    fn drained(&mut self, owner: ComponentId) {
        let _ = self.send(Notification::Drained { owner });
    }
}
