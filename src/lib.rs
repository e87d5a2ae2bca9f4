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

//! # AMQP Connection Tokio
//!
//! Per-connection acknowledgment and flow-control tracking for AMQP messaging clients.
//!
//! The protocol engine and the network transport are external to this crate. It only
//! consumes their progress reports (bytes written, deliveries settled, link credit and
//! message arrivals, open/close events) and turns them into application notifications:
//! completed sends, disconnects, and credit signals.
//!
//! ## Main Components
//!
//! - [`amqp_conn::qos0_completion`]: ordered completion queue for at-most-once sends
//! - [`amqp_conn::outbound_delivery`]: settlement correlation for at-least-once sends
//! - [`amqp_conn::subscription_flow`]: credit and settlement counters per receiving link
//! - [`amqp_conn::connection_state`]: the aggregate and its open/close state machine
//! - [`amqp_conn::endpoint`]: tokio task owning one connection state
//! - [`amqp_conn::connection_option`]: configuration for a tracked connection
//!
//! ## Quick Start
//!
//! ```ignore
//! use amqp_connection_tokio::amqp_conn;
//!
//! let (notify_tx, mut notify_rx) = tokio::sync::mpsc::unbounded_channel();
//! let endpoint = amqp_conn::Endpoint::new(
//!     amqp_conn::ConnectionHandle(1),
//!     amqp_conn::SessionHandle(1),
//!     amqp_conn::ComponentId(1),
//!     channel,
//!     notify_tx,
//! );
//!
//! // Engine reports the handshake completed
//! endpoint.connection_opened()?;
//! endpoint.open().await?;
//!
//! // QoS 0: completes once the frame is written
//! endpoint.send_qos0(frame, amqp_conn::CallbackId(1), amqp_conn::ComponentId(1)).await?;
//! let completion = notify_rx.recv().await;
//! ```

pub mod amqp_conn;
