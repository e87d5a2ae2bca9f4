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

use crate::amqp_conn::channel::ChannelError;
use crate::amqp_conn::handle::DeliveryId;
use crate::amqp_conn::notify::DisconnectReason;

/// Tracker-level failures
///
/// Apart from [`TrackerError::CreditExhausted`], every variant means the engine and the
/// trackers disagree about what is outstanding. The connection state logs these and
/// drops the offending event; they are only returned directly by the trackers
/// themselves and by application requests that name an unknown link.
///
/// ```text
/// TrackerError
/// ├── ZeroByteDelta               - QoS 0 send registered with no bytes
/// ├── DuplicateDelivery(id)       - delivery id already tracked
/// ├── UnknownDelivery(id)         - settlement for an untracked delivery
/// ├── CreditExhausted             - peer sent beyond granted link credit
/// ├── SettleExceedsUnsettled      - more settlements than unsettled messages
/// ├── UnknownLink(name)           - no subscription with that name
/// └── DuplicateLink(name)         - subscription name already in use
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    ZeroByteDelta,
    DuplicateDelivery(DeliveryId),
    UnknownDelivery(DeliveryId),
    CreditExhausted {
        link: String,
        max_credit: u32,
        unsettled: u32,
        settled: u32,
    },
    SettleExceedsUnsettled {
        link: String,
        requested: u32,
        unsettled: u32,
    },
    UnknownLink(String),
    DuplicateLink(String),
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerError::ZeroByteDelta => write!(f, "QoS 0 send must write at least one byte"),
            TrackerError::DuplicateDelivery(id) => write!(f, "{id} is already tracked"),
            TrackerError::UnknownDelivery(id) => write!(f, "{id} is not tracked"),
            TrackerError::CreditExhausted {
                link,
                max_credit,
                unsettled,
                settled,
            } => write!(
                f,
                "link '{link}' exceeded credit {max_credit} (unsettled {unsettled}, settled {settled})"
            ),
            TrackerError::SettleExceedsUnsettled {
                link,
                requested,
                unsettled,
            } => write!(
                f,
                "link '{link}' cannot settle {requested} messages with only {unsettled} unsettled"
            ),
            TrackerError::UnknownLink(link) => write!(f, "no subscription on link '{link}'"),
            TrackerError::DuplicateLink(link) => {
                write!(f, "subscription on link '{link}' already exists")
            }
        }
    }
}

impl std::error::Error for TrackerError {}

/// Error returned by connection-level operations
///
/// ```text
/// ConnectionError
/// ├── Channel(ChannelError)         - network channel write or shutdown failure
/// ├── Tracker(TrackerError)         - request rejected by a tracker
/// ├── ChannelClosed                 - endpoint event loop is gone
/// ├── NotOpen                       - connection is closing, closed or failed
/// ├── RequestPending                - an open or close request is already waiting
/// └── Disconnected(DisconnectReason) - connection went away before the request resolved
/// ```
#[derive(Debug)]
pub enum ConnectionError {
    Channel(ChannelError),
    Tracker(TrackerError),
    ChannelClosed,
    NotOpen,
    RequestPending,
    Disconnected(DisconnectReason),
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::Channel(e) => write!(f, "Channel error: {e}"),
            ConnectionError::Tracker(e) => write!(f, "Tracker error: {e}"),
            ConnectionError::ChannelClosed => write!(f, "Internal channel closed"),
            ConnectionError::NotOpen => write!(f, "Connection not open"),
            ConnectionError::RequestPending => write!(f, "Request already pending"),
            ConnectionError::Disconnected(reason) => write!(f, "Disconnected: {reason}"),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::Channel(e) => Some(e),
            ConnectionError::Tracker(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChannelError> for ConnectionError {
    fn from(e: ChannelError) -> Self {
        ConnectionError::Channel(e)
    }
}

impl From<TrackerError> for ConnectionError {
    fn from(e: TrackerError) -> Self {
        ConnectionError::Tracker(e)
    }
}
