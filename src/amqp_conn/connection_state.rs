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

//! Per-connection aggregate of send, settlement and credit tracking.
//!
//! A [`ConnectionState`] is owned by exactly one task. Every inbound engine event and
//! every application request is applied to it in sequence, so none of the trackers it
//! holds need locking.
//!
//! ```text
//! Opening ──opened──▶ Open ──close / remote close──▶ Closing ──released──▶ Closed
//!    │                  │                               │
//!    └──────────────────┴────────── fail ───────────────┴──▶ Failed
//! ```
//!
//! Entering `Closing` or `Failed` tears the connection down once: every pending send
//! is flushed with a purged outcome, subscriptions are dropped and the owner is told
//! about the disconnect. A later teardown finds nothing left to do.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::amqp_conn::byte_progress::ByteProgressCounter;
use crate::amqp_conn::channel::NetworkChannel;
use crate::amqp_conn::connection_error::{ConnectionError, TrackerError};
use crate::amqp_conn::handle::{CallbackId, ComponentId, ConnectionHandle, DeliveryId, SessionHandle};
use crate::amqp_conn::notify::{DisconnectReason, Notify, SendOutcome};
use crate::amqp_conn::outbound_delivery::OutboundDeliveryTracker;
use crate::amqp_conn::qos0_completion::Qos0CompletionTracker;
use crate::amqp_conn::subscription_flow::{SubscriptionFlowTracker, SubscriptionSnapshot};

/// Responder for a pending open or close request
pub type Responder = oneshot::Sender<Result<(), ConnectionError>>;

/// Boxed network channel as held by the connection state
pub type BoxedChannel = Box<dyn NetworkChannel + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Opening,
    Open,
    Closing,
    Closed,
    Failed,
}

/// Counters reported by [`ConnectionState::stats`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    pub phase: Phase,
    pub bytes_written: u64,
    pub pending_qos0: usize,
    pub pending_qos1: usize,
    pub drained: bool,
    pub subscriptions: Vec<SubscriptionSnapshot>,
}

pub struct ConnectionState {
    connection: ConnectionHandle,
    session: SessionHandle,
    owner: ComponentId,
    channel: Option<BoxedChannel>,
    phase: Phase,
    progress: ByteProgressCounter,
    qos0: Qos0CompletionTracker,
    qos1: OutboundDeliveryTracker,
    subscriptions: HashMap<String, SubscriptionFlowTracker>,
    open_request: Option<Responder>,
    close_request: Option<Responder>,
    timer: Option<JoinHandle<()>>,
    closed: bool,
    disconnect_reason: Option<DisconnectReason>,
    next_delivery_id: u64,
    credit_low_percent: u8,
    drained: bool,
}

impl ConnectionState {
    pub fn new(
        connection: ConnectionHandle,
        session: SessionHandle,
        owner: ComponentId,
        channel: BoxedChannel,
        credit_low_percent: u8,
    ) -> Self {
        Self {
            connection,
            session,
            owner,
            channel: Some(channel),
            phase: Phase::Opening,
            progress: ByteProgressCounter::new(),
            qos0: Qos0CompletionTracker::new(),
            qos1: OutboundDeliveryTracker::new(),
            subscriptions: HashMap::new(),
            open_request: None,
            close_request: None,
            timer: None,
            closed: false,
            disconnect_reason: None,
            next_delivery_id: 0,
            credit_low_percent: credit_low_percent.min(100),
            drained: true,
        }
    }

    pub fn connection(&self) -> ConnectionHandle {
        self.connection
    }

    pub fn session(&self) -> SessionHandle {
        self.session
    }

    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once teardown has run; no tracker accepts new entries after that.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn bytes_written(&self) -> u64 {
        self.progress.written()
    }

    pub fn disconnect_reason(&self) -> Option<&DisconnectReason> {
        self.disconnect_reason.as_ref()
    }

    /// False while QoS 0 output is queued behind earlier unwritten sends
    pub fn is_drained(&self) -> bool {
        self.drained
    }

    /// Channel to write engine output through, while the connection is live
    pub fn channel_mut(&mut self) -> Option<&mut BoxedChannel> {
        if self.closed {
            return None;
        }
        self.channel.as_mut()
    }

    /// Register the request waiting for the connection to open.
    ///
    /// An already open connection answers immediately; a torn down one answers with the
    /// reason it went away.
    pub fn request_open(&mut self, response_tx: Responder) {
        match self.phase {
            Phase::Opening if self.open_request.is_some() => {
                let _ = response_tx.send(Err(ConnectionError::RequestPending));
            }
            Phase::Opening => self.open_request = Some(response_tx),
            Phase::Open => {
                let _ = response_tx.send(Ok(()));
            }
            Phase::Closing | Phase::Closed | Phase::Failed => {
                let _ = response_tx.send(Err(self.gone_error()));
            }
        }
    }

    /// Install the timer guarding this connection, aborting any previous one.
    pub fn set_timer(&mut self, timer: JoinHandle<()>) {
        if let Some(previous) = self.timer.replace(timer) {
            previous.abort();
        }
    }

    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Engine reports the connection and session are both active.
    pub fn on_connection_opened(&mut self) {
        if self.phase != Phase::Opening {
            warn!(connection = %self.connection, phase = ?self.phase, "open reported outside opening phase");
            return;
        }
        debug!(connection = %self.connection, "connection open");
        self.phase = Phase::Open;
        self.cancel_timer();
        if let Some(tx) = self.open_request.take() {
            let _ = tx.send(Ok(()));
        }
    }

    /// Advance the byte counter and complete every QoS 0 send it now covers.
    ///
    /// Notifies the owner once backed-up output has been fully written.
    pub fn on_bytes_written<N: Notify>(&mut self, delta: u64, notify: &mut N) -> usize {
        let written = self.progress.advance(delta);
        let fired = self.qos0.drain(written, None, notify);
        if !self.drained && self.qos0.is_empty() {
            self.drained = true;
            debug!(connection = %self.connection, written, "output drained");
            notify.drained(self.owner);
        }
        fired
    }

    /// Track a QoS 0 send of `byte_delta` bytes about to be written.
    ///
    /// Returns the byte threshold at which its callback fires. A send queued behind one
    /// that is still unwritten marks the connection as not drained.
    pub fn register_qos0(
        &mut self,
        byte_delta: u64,
        callback: CallbackId,
        owner: ComponentId,
    ) -> Result<u64, ConnectionError> {
        self.ensure_accepting()?;
        let backed_up = !self.qos0.is_empty();
        let threshold = self
            .qos0
            .register(self.progress.written(), byte_delta, callback, owner)?;
        if backed_up {
            self.drained = false;
        }
        Ok(threshold)
    }

    /// Allocate the next outbound delivery id; ids increase monotonically per connection.
    pub fn allocate_delivery_id(&mut self) -> DeliveryId {
        let id = DeliveryId(self.next_delivery_id);
        self.next_delivery_id = self.next_delivery_id.saturating_add(1);
        id
    }

    /// Track an at-least-once send until the peer settles `delivery_id`.
    ///
    /// The id comes from the caller, so a duplicate is a caller error and is returned as
    /// `Tracker(DuplicateDelivery)` rather than discarded. Ids from
    /// [`allocate_delivery_id`](Self::allocate_delivery_id) never collide.
    pub fn track_qos1(
        &mut self,
        delivery_id: DeliveryId,
        callback: CallbackId,
        owner: ComponentId,
    ) -> Result<(), ConnectionError> {
        self.ensure_accepting()?;
        if let Err(e) = self.qos1.track(delivery_id, callback, owner) {
            warn!(connection = %self.connection, %delivery_id, "delivery id tracked twice");
            return Err(e.into());
        }
        Ok(())
    }

    /// Engine reports the peer settled `delivery_id`.
    ///
    /// An unknown id means engine and tracker are out of step; it is logged and ignored.
    pub fn on_delivery_settled<N: Notify>(&mut self, delivery_id: DeliveryId, notify: &mut N) {
        match self.qos1.settle(delivery_id) {
            Ok(entry) => notify.send_complete(entry.callback, entry.owner, SendOutcome::Settled),
            Err(e) => warn!(connection = %self.connection, error = %e, "settlement discarded"),
        }
    }

    pub fn subscribe(
        &mut self,
        link: &str,
        subscriber: ComponentId,
        initial_credit: u32,
    ) -> Result<(), ConnectionError> {
        self.ensure_accepting()?;
        if self.subscriptions.contains_key(link) {
            return Err(TrackerError::DuplicateLink(link.to_string()).into());
        }
        self.subscriptions.insert(
            link.to_string(),
            SubscriptionFlowTracker::new(link, subscriber, initial_credit),
        );
        Ok(())
    }

    pub fn unsubscribe(&mut self, link: &str) -> Result<SubscriptionSnapshot, ConnectionError> {
        self.subscriptions
            .remove(link)
            .map(|s| s.snapshot())
            .ok_or_else(|| TrackerError::UnknownLink(link.to_string()).into())
    }

    pub fn on_credit_granted(&mut self, link: &str, amount: u32) {
        match self.subscriptions.get_mut(link) {
            Some(sub) => sub.grant_credit(amount),
            None => warn!(connection = %self.connection, link, "credit granted on unknown link"),
        }
    }

    /// Count a message delivered on `link`.
    ///
    /// A delivery beyond credit is reported to the subscriber but does not fail the
    /// connection.
    pub fn on_message_arrived<N: Notify>(&mut self, link: &str, notify: &mut N) {
        let Some(sub) = self.subscriptions.get_mut(link) else {
            warn!(connection = %self.connection, link, "message on unknown link");
            return;
        };
        if let Err(TrackerError::CreditExhausted { .. }) = sub.on_message_received() {
            notify.credit_exceeded(sub.subscriber(), link);
        }
    }

    /// Application settled `count` messages received on `link`.
    ///
    /// Settling more than is outstanding is logged and discarded. Crossing the
    /// credit-low threshold notifies the subscriber.
    pub fn settle_messages<N: Notify>(
        &mut self,
        link: &str,
        count: u32,
        notify: &mut N,
    ) -> Result<(), ConnectionError> {
        let percent = self.credit_low_percent;
        let sub = self
            .subscriptions
            .get_mut(link)
            .ok_or_else(|| TrackerError::UnknownLink(link.to_string()))?;
        if let Err(e) = sub.on_settled(count) {
            warn!(connection = %self.connection, error = %e, "settlement discarded");
            return Ok(());
        }
        if sub.take_credit_low(percent) {
            notify.credit_low(sub.subscriber(), link);
        }
        Ok(())
    }

    /// Take the settled count of `link` so it can be re-granted to the peer.
    pub fn replenish_credit(&mut self, link: &str) -> Result<u32, ConnectionError> {
        self.subscriptions
            .get_mut(link)
            .map(|s| s.replenish())
            .ok_or_else(|| TrackerError::UnknownLink(link.to_string()).into())
    }

    /// Start closing on application request.
    ///
    /// Returns the network channel when the caller must release it and then call
    /// [`on_channel_released`](Self::on_channel_released).
    pub fn begin_close<N: Notify>(
        &mut self,
        response_tx: Responder,
        notify: &mut N,
    ) -> Option<BoxedChannel> {
        match self.phase {
            Phase::Closed | Phase::Failed if self.channel.is_none() => {
                let _ = response_tx.send(Ok(()));
                None
            }
            Phase::Closing | Phase::Closed | Phase::Failed => {
                if self.close_request.is_some() {
                    let _ = response_tx.send(Err(ConnectionError::RequestPending));
                } else {
                    self.close_request = Some(response_tx);
                }
                None
            }
            Phase::Opening | Phase::Open => {
                self.close_request = Some(response_tx);
                self.phase = Phase::Closing;
                self.teardown(DisconnectReason::Requested, notify);
                self.channel.take()
            }
        }
    }

    /// Engine reports the peer closed the connection.
    pub fn on_connection_closed<N: Notify>(
        &mut self,
        error: Option<String>,
        notify: &mut N,
    ) -> Option<BoxedChannel> {
        match self.phase {
            Phase::Opening | Phase::Open => {
                self.phase = Phase::Closing;
                self.teardown(DisconnectReason::Remote(error), notify);
                self.channel.take()
            }
            _ => {
                debug!(connection = %self.connection, phase = ?self.phase, "remote close after teardown");
                None
            }
        }
    }

    /// Fail the connection. A no-op once the connection is closed or already failed.
    pub fn fail<N: Notify>(
        &mut self,
        reason: DisconnectReason,
        notify: &mut N,
    ) -> Option<BoxedChannel> {
        if matches!(self.phase, Phase::Closed | Phase::Failed) {
            return None;
        }
        warn!(connection = %self.connection, %reason, "connection failed");
        self.phase = Phase::Failed;
        self.teardown(reason, notify);
        self.channel.take()
    }

    /// The network channel has been released.
    pub fn on_channel_released(&mut self) {
        if self.phase == Phase::Closing {
            debug!(connection = %self.connection, "connection closed");
            self.phase = Phase::Closed;
        }
        if let Some(tx) = self.close_request.take() {
            let _ = tx.send(Ok(()));
        }
    }

    pub fn stats(&self) -> ConnectionStats {
        let mut subscriptions: Vec<_> = self.subscriptions.values().map(|s| s.snapshot()).collect();
        subscriptions.sort_by(|a, b| a.link.cmp(&b.link));
        ConnectionStats {
            phase: self.phase,
            bytes_written: self.progress.written(),
            pending_qos0: self.qos0.len(),
            pending_qos1: self.qos1.len(),
            drained: self.drained,
            subscriptions,
        }
    }

    fn teardown<N: Notify>(&mut self, reason: DisconnectReason, notify: &mut N) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel_timer();
        self.drained = true;

        let cause = reason.purge_cause();
        let qos0 = self.qos0.drain(self.progress.written(), Some(cause), notify);
        let qos1 = self.qos1.purge_all(cause, notify);
        self.subscriptions.clear();
        debug!(connection = %self.connection, %reason, qos0, qos1, "pending sends purged");

        notify.disconnected(self.owner, &reason);
        if let Some(tx) = self.open_request.take() {
            let _ = tx.send(Err(ConnectionError::Disconnected(reason.clone())));
        }
        self.disconnect_reason = Some(reason);
    }

    fn ensure_accepting(&self) -> Result<(), ConnectionError> {
        if self.closed {
            return Err(ConnectionError::NotOpen);
        }
        Ok(())
    }

    fn gone_error(&self) -> ConnectionError {
        match &self.disconnect_reason {
            Some(reason) => ConnectionError::Disconnected(reason.clone()),
            None => ConnectionError::NotOpen,
        }
    }
}

impl Drop for ConnectionState {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
