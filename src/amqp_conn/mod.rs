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

pub mod byte_progress;
pub mod channel;
pub mod connection_error;
pub mod connection_option;
pub mod connection_state;
pub mod endpoint;
pub mod handle;
pub mod notify;
pub mod outbound_delivery;
pub mod qos0_completion;
mod request_response;
pub mod subscription_flow;

pub use byte_progress::ByteProgressCounter;
pub use channel::{ChannelError, NetworkChannel};
pub use connection_error::{ConnectionError, TrackerError};
pub use connection_option::{ConnectionOption, ConnectionOptionBuilder};
pub use connection_state::{ConnectionState, ConnectionStats, Phase};
pub use endpoint::Endpoint;
pub use handle::{CallbackId, ComponentId, ConnectionHandle, DeliveryId, SessionHandle};
pub use notify::{DisconnectReason, Notification, Notify, PurgeCause, SendOutcome};
pub use outbound_delivery::{OutboundDeliveryTracker, PendingDelivery};
pub use qos0_completion::{PendingCompletion, Qos0CompletionTracker};
pub use subscription_flow::{SubscriptionFlowTracker, SubscriptionSnapshot};
