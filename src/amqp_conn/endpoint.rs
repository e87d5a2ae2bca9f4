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

use std::io::IoSlice;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::amqp_conn::channel::NetworkChannel;
use crate::amqp_conn::connection_error::ConnectionError;
use crate::amqp_conn::connection_option::ConnectionOption;
use crate::amqp_conn::connection_state::{BoxedChannel, ConnectionState, ConnectionStats, Phase};
use crate::amqp_conn::handle::{
    CallbackId, ComponentId, ConnectionHandle, DeliveryId, SessionHandle,
};
use crate::amqp_conn::notify::{DisconnectReason, Notify};
use crate::amqp_conn::request_response::RequestResponse;
use crate::amqp_conn::subscription_flow::SubscriptionSnapshot;

/// Handle to the task that owns one connection's tracking state
///
/// The endpoint spawns an event loop that exclusively owns a [`ConnectionState`] and its
/// network channel. Application requests and engine events are queued to that loop and
/// applied strictly in the order they were issued, which is what keeps QoS 0
/// completions in submission order without any locking.
///
/// Application requests (`open`, `send_qos0`, `close`, ...) are `async` and resolve when
/// the loop has processed them. Engine events (`connection_opened`, `delivery_settled`,
/// ...) are fire-and-forget; their effects surface through the [`Notify`] sink given at
/// construction.
///
/// Dropping the endpoint fails the connection with
/// [`DisconnectReason::HandleDropped`] so no pending send is left without a callback.
pub struct Endpoint {
    tx_send: mpsc::UnboundedSender<RequestResponse>,
    event_loop_handle: tokio::task::JoinHandle<()>,
}

impl Endpoint {
    /// Create an endpoint with default options for a freshly established connection
    ///
    /// Must be called from within a tokio runtime; the event loop is spawned immediately.
    ///
    /// # Arguments
    ///
    /// * `connection` - Engine handle of the AMQP connection
    /// * `session` - Engine handle of the session opened on it
    /// * `owner` - Component that receives disconnect notifications
    /// * `channel` - Network channel the connection writes through; owned by the endpoint
    /// * `notifier` - Sink for send completions, disconnects and credit signals
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use amqp_connection_tokio::amqp_conn;
    ///
    /// let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    /// let endpoint = amqp_conn::Endpoint::new(
    ///     amqp_conn::ConnectionHandle(1),
    ///     amqp_conn::SessionHandle(1),
    ///     amqp_conn::ComponentId(7),
    ///     channel,
    ///     tx,
    /// );
    /// endpoint.connection_opened()?;
    /// endpoint.open().await?;
    /// ```
    pub fn new<C, N>(
        connection: ConnectionHandle,
        session: SessionHandle,
        owner: ComponentId,
        channel: C,
        notifier: N,
    ) -> Self
    where
        C: NetworkChannel + Send + 'static,
        N: Notify + Send + 'static,
    {
        Self::with_options(
            connection,
            session,
            owner,
            channel,
            notifier,
            ConnectionOption::default(),
        )
    }

    /// Create an endpoint with specific connection options
    ///
    /// When `open_timeout_ms` is non-zero, the connection is failed with
    /// [`DisconnectReason::OpenTimeout`] unless the engine reports it open in time.
    pub fn with_options<C, N>(
        connection: ConnectionHandle,
        session: SessionHandle,
        owner: ComponentId,
        channel: C,
        notifier: N,
        options: ConnectionOption,
    ) -> Self
    where
        C: NetworkChannel + Send + 'static,
        N: Notify + Send + 'static,
    {
        let state = ConnectionState::new(
            connection,
            session,
            owner,
            Box::new(channel),
            options.clamped_credit_low_percent(),
        );
        let (tx_send, rx_send) = mpsc::unbounded_channel();
        let event_loop_handle =
            tokio::spawn(Self::request_event_loop(state, rx_send, notifier, options));

        Self {
            tx_send,
            event_loop_handle,
        }
    }

    /// Wait until the engine reports the connection open
    ///
    /// Resolves immediately if it already is. Only one open request may wait at a time.
    ///
    /// # Errors
    ///
    /// - `RequestPending` if another open request is waiting
    /// - `Disconnected(reason)` if the connection closed or failed before opening,
    ///   including the open timeout expiring
    pub async fn open(&self) -> Result<(), ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::Open { response_tx })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    /// Write an at-most-once transfer and track its completion
    ///
    /// The callback fires with [`SendOutcome::Written`](crate::amqp_conn::SendOutcome) once
    /// every byte of `frame` has been handed to the network channel. Callbacks of QoS 0
    /// sends fire in the order the sends were issued.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - The byte total at which this send counted as written
    /// * `Err(ConnectionError)` - The connection is torn down, `frame` is empty, or the
    ///   channel write failed (the connection is failed in that case)
    pub async fn send_qos0(
        &self,
        frame: Vec<u8>,
        callback: CallbackId,
        owner: ComponentId,
    ) -> Result<u64, ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::SendQos0 {
            frame,
            callback,
            owner,
            response_tx,
        })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    /// Allocate a delivery id for an outbound transfer
    ///
    /// Ids increase monotonically for the life of the connection.
    pub async fn allocate_delivery_id(&self) -> Result<DeliveryId, ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::AllocateDeliveryId { response_tx })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    /// Write an at-least-once transfer and track it until the peer settles it
    ///
    /// The callback fires with `Settled` when [`delivery_settled`](Self::delivery_settled)
    /// reports `delivery_id`, or with `Purged` if the connection goes away first.
    ///
    /// `delivery_id` is chosen by the caller, normally through
    /// [`allocate_delivery_id`](Self::allocate_delivery_id); reusing an outstanding id is
    /// rejected rather than silently dropped.
    ///
    /// # Errors
    ///
    /// - `Tracker(DuplicateDelivery)` if `delivery_id` is already outstanding
    /// - `NotOpen` once the connection is torn down
    /// - `Channel(_)` if the write failed; the connection is failed as well
    pub async fn send_qos1(
        &self,
        delivery_id: DeliveryId,
        frame: Vec<u8>,
        callback: CallbackId,
        owner: ComponentId,
    ) -> Result<(), ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::SendQos1 {
            delivery_id,
            frame,
            callback,
            owner,
            response_tx,
        })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    /// Write an untracked engine frame (flow, disposition, ...)
    ///
    /// The bytes still count toward write progress and may complete earlier QoS 0 sends.
    pub async fn write(&self, frame: Vec<u8>) -> Result<(), ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::Write { frame, response_tx })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    /// Start tracking credit for a receiving link
    ///
    /// # Arguments
    ///
    /// * `link` - Subscription name, unique per connection
    /// * `subscriber` - Component notified about credit on this link
    /// * `credit` - Initial link credit; `None` uses `default_link_credit`
    pub async fn subscribe(
        &self,
        link: impl Into<String>,
        subscriber: ComponentId,
        credit: Option<u32>,
    ) -> Result<(), ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::Subscribe {
            link: link.into(),
            subscriber,
            credit,
            response_tx,
        })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    /// Stop tracking a link, returning its final counters
    pub async fn unsubscribe(
        &self,
        link: impl Into<String>,
    ) -> Result<SubscriptionSnapshot, ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::Unsubscribe {
            link: link.into(),
            response_tx,
        })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    /// Record that the application settled `count` messages received on `link`
    pub async fn settle_messages(
        &self,
        link: impl Into<String>,
        count: u32,
    ) -> Result<(), ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::SettleMessages {
            link: link.into(),
            count,
            response_tx,
        })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    /// Take the settled count of `link` to re-grant to the peer as credit
    pub async fn replenish_credit(&self, link: impl Into<String>) -> Result<u32, ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::ReplenishCredit {
            link: link.into(),
            response_tx,
        })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    pub async fn stats(&self) -> Result<ConnectionStats, ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::GetStats { response_tx })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    /// Close the connection
    ///
    /// Pending sends are purged, the owner is notified, and the network channel is shut
    /// down within `shutdown_timeout_ms`. Resolves once the channel is released. Closing
    /// an already closed or failed connection succeeds immediately.
    pub async fn close(&self) -> Result<(), ConnectionError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(RequestResponse::Close { response_tx })?;
        response_rx
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?
    }

    /// Engine reports the connection and session are active
    pub fn connection_opened(&self) -> Result<(), ConnectionError> {
        self.request(RequestResponse::ConnectionOpened)
    }

    /// Engine reports the peer closed the connection, with its error if any
    pub fn connection_closed(&self, error: Option<String>) -> Result<(), ConnectionError> {
        self.request(RequestResponse::ConnectionClosed { error })
    }

    /// Engine reports an unrecoverable protocol error
    pub fn protocol_error(&self, description: impl Into<String>) -> Result<(), ConnectionError> {
        self.request(RequestResponse::ProtocolError {
            description: description.into(),
        })
    }

    /// Engine reports the peer settled an outbound delivery
    pub fn delivery_settled(&self, delivery_id: DeliveryId) -> Result<(), ConnectionError> {
        self.request(RequestResponse::DeliverySettled { delivery_id })
    }

    /// Engine reports credit granted on a receiving link
    pub fn credit_granted(&self, link: impl Into<String>, amount: u32) -> Result<(), ConnectionError> {
        self.request(RequestResponse::CreditGranted {
            link: link.into(),
            amount,
        })
    }

    /// Engine reports a message delivered on a receiving link
    pub fn message_arrived(&self, link: impl Into<String>) -> Result<(), ConnectionError> {
        self.request(RequestResponse::MessageArrived { link: link.into() })
    }

    /// Drop the handle and wait for the event loop to finish tearing the connection down
    pub async fn join(self) {
        let Endpoint {
            tx_send,
            event_loop_handle,
        } = self;
        drop(tx_send);
        let _ = event_loop_handle.await;
    }

    fn request(&self, request: RequestResponse) -> Result<(), ConnectionError> {
        self.tx_send
            .send(request)
            .map_err(|_| ConnectionError::ChannelClosed)
    }

    /// Event loop owning the connection state
    async fn request_event_loop<N>(
        mut state: ConnectionState,
        mut rx_send: mpsc::UnboundedReceiver<RequestResponse>,
        mut notifier: N,
        options: ConnectionOption,
    ) where
        N: Notify + Send,
    {
        let shutdown_timeout = Duration::from_millis(*options.shutdown_timeout_ms());
        let default_link_credit = *options.default_link_credit();
        let (open_timeout_tx, mut open_timeout_rx) = mpsc::unbounded_channel::<()>();

        let open_timeout_ms = *options.open_timeout_ms();
        if open_timeout_ms > 0 {
            let tx = open_timeout_tx.clone();
            state.set_timer(tokio::spawn(async move {
                sleep(Duration::from_millis(open_timeout_ms)).await;
                let _ = tx.send(());
            }));
        }

        loop {
            tokio::select! {
                request = rx_send.recv() => {
                    match request {
                        Some(request) => {
                            Self::handle_request(
                                &mut state,
                                request,
                                &mut notifier,
                                shutdown_timeout,
                                default_link_credit,
                            )
                            .await;
                        }
                        None => break, // Endpoint handle dropped
                    }
                }

                Some(()) = open_timeout_rx.recv() => {
                    if state.phase() == Phase::Opening {
                        if let Some(channel) = state.fail(DisconnectReason::OpenTimeout, &mut notifier) {
                            Self::release_channel(&mut state, channel, shutdown_timeout).await;
                        }
                    }
                }
            }
        }

        if let Some(channel) = state.fail(DisconnectReason::HandleDropped, &mut notifier) {
            Self::release_channel(&mut state, channel, shutdown_timeout).await;
        }
        debug!(connection = %state.connection(), "event loop finished");
    }

    async fn handle_request<N>(
        state: &mut ConnectionState,
        request: RequestResponse,
        notifier: &mut N,
        shutdown_timeout: Duration,
        default_link_credit: u32,
    ) where
        N: Notify + Send,
    {
        match request {
            RequestResponse::Open { response_tx } => state.request_open(response_tx),
            RequestResponse::SendQos0 {
                frame,
                callback,
                owner,
                response_tx,
            } => {
                let result = match state.register_qos0(frame.len() as u64, callback, owner) {
                    Ok(threshold) => {
                        Self::write_frame(state, &frame, notifier, shutdown_timeout)
                            .await
                            .map(|()| threshold)
                    }
                    Err(e) => Err(e),
                };
                let _ = response_tx.send(result);
            }
            RequestResponse::AllocateDeliveryId { response_tx } => {
                let _ = response_tx.send(Ok(state.allocate_delivery_id()));
            }
            RequestResponse::SendQos1 {
                delivery_id,
                frame,
                callback,
                owner,
                response_tx,
            } => {
                let result = match state.track_qos1(delivery_id, callback, owner) {
                    Ok(()) => Self::write_frame(state, &frame, notifier, shutdown_timeout).await,
                    Err(e) => Err(e),
                };
                let _ = response_tx.send(result);
            }
            RequestResponse::Write { frame, response_tx } => {
                let result = Self::write_frame(state, &frame, notifier, shutdown_timeout).await;
                let _ = response_tx.send(result);
            }
            RequestResponse::Subscribe {
                link,
                subscriber,
                credit,
                response_tx,
            } => {
                let credit = credit.unwrap_or(default_link_credit);
                let _ = response_tx.send(state.subscribe(&link, subscriber, credit));
            }
            RequestResponse::Unsubscribe { link, response_tx } => {
                let _ = response_tx.send(state.unsubscribe(&link));
            }
            RequestResponse::SettleMessages {
                link,
                count,
                response_tx,
            } => {
                let _ = response_tx.send(state.settle_messages(&link, count, notifier));
            }
            RequestResponse::ReplenishCredit { link, response_tx } => {
                let _ = response_tx.send(state.replenish_credit(&link));
            }
            RequestResponse::GetStats { response_tx } => {
                let _ = response_tx.send(Ok(state.stats()));
            }
            RequestResponse::Close { response_tx } => {
                if let Some(channel) = state.begin_close(response_tx, notifier) {
                    Self::release_channel(state, channel, shutdown_timeout).await;
                }
            }
            RequestResponse::ConnectionOpened => state.on_connection_opened(),
            RequestResponse::ConnectionClosed { error } => {
                if let Some(channel) = state.on_connection_closed(error, notifier) {
                    Self::release_channel(state, channel, shutdown_timeout).await;
                }
            }
            RequestResponse::ProtocolError { description } => {
                if let Some(channel) = state.fail(DisconnectReason::Protocol(description), notifier)
                {
                    Self::release_channel(state, channel, shutdown_timeout).await;
                }
            }
            RequestResponse::DeliverySettled { delivery_id } => {
                state.on_delivery_settled(delivery_id, notifier);
            }
            RequestResponse::CreditGranted { link, amount } => {
                state.on_credit_granted(&link, amount);
            }
            RequestResponse::MessageArrived { link } => {
                state.on_message_arrived(&link, notifier);
            }
        }
    }

    /// Write `frame` through the channel and count it as written.
    ///
    /// A write failure fails the connection, which purges everything still pending.
    async fn write_frame<N>(
        state: &mut ConnectionState,
        frame: &[u8],
        notifier: &mut N,
        shutdown_timeout: Duration,
    ) -> Result<(), ConnectionError>
    where
        N: Notify + Send,
    {
        let result = match state.channel_mut() {
            Some(channel) => {
                let buffers = [IoSlice::new(frame)];
                channel.send(&buffers).await
            }
            None => return Err(ConnectionError::NotOpen),
        };

        match result {
            Ok(()) => {
                let fired = state.on_bytes_written(frame.len() as u64, notifier);
                trace!(len = frame.len(), fired, "frame written");
                Ok(())
            }
            Err(e) => {
                let reason = DisconnectReason::Channel(e.to_string());
                if let Some(channel) = state.fail(reason, notifier) {
                    Self::release_channel(state, channel, shutdown_timeout).await;
                }
                Err(ConnectionError::Channel(e))
            }
        }
    }

    async fn release_channel(
        state: &mut ConnectionState,
        mut channel: BoxedChannel,
        shutdown_timeout: Duration,
    ) {
        channel.shutdown(shutdown_timeout).await;
        state.on_channel_released();
    }
}
