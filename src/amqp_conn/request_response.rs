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

use tokio::sync::oneshot;

use crate::amqp_conn::connection_error::ConnectionError;
use crate::amqp_conn::connection_state::ConnectionStats;
use crate::amqp_conn::handle::{CallbackId, ComponentId, DeliveryId};
use crate::amqp_conn::subscription_flow::SubscriptionSnapshot;

/// Messages processed in order by the endpoint event loop
pub(crate) enum RequestResponse {
    // Application requests
    Open {
        response_tx: oneshot::Sender<Result<(), ConnectionError>>,
    },
    SendQos0 {
        frame: Vec<u8>,
        callback: CallbackId,
        owner: ComponentId,
        response_tx: oneshot::Sender<Result<u64, ConnectionError>>,
    },
    AllocateDeliveryId {
        response_tx: oneshot::Sender<Result<DeliveryId, ConnectionError>>,
    },
    SendQos1 {
        delivery_id: DeliveryId,
        frame: Vec<u8>,
        callback: CallbackId,
        owner: ComponentId,
        response_tx: oneshot::Sender<Result<(), ConnectionError>>,
    },
    Write {
        frame: Vec<u8>,
        response_tx: oneshot::Sender<Result<(), ConnectionError>>,
    },
    Subscribe {
        link: String,
        subscriber: ComponentId,
        credit: Option<u32>,
        response_tx: oneshot::Sender<Result<(), ConnectionError>>,
    },
    Unsubscribe {
        link: String,
        response_tx: oneshot::Sender<Result<SubscriptionSnapshot, ConnectionError>>,
    },
    SettleMessages {
        link: String,
        count: u32,
        response_tx: oneshot::Sender<Result<(), ConnectionError>>,
    },
    ReplenishCredit {
        link: String,
        response_tx: oneshot::Sender<Result<u32, ConnectionError>>,
    },
    GetStats {
        response_tx: oneshot::Sender<Result<ConnectionStats, ConnectionError>>,
    },
    Close {
        response_tx: oneshot::Sender<Result<(), ConnectionError>>,
    },

    // Engine events
    ConnectionOpened,
    ConnectionClosed {
        error: Option<String>,
    },
    ProtocolError {
        description: String,
    },
    DeliverySettled {
        delivery_id: DeliveryId,
    },
    CreditGranted {
        link: String,
        amount: u32,
    },
    MessageArrived {
        link: String,
    },
}
