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

use amqp_connection_tokio::amqp_conn;
use amqp_connection_tokio::amqp_conn::{
    CallbackId, ComponentId, DisconnectReason, Notification, PurgeCause, SendOutcome,
};
use tokio::sync::mpsc;

mod common;
mod stub_channel;

use stub_channel::StubChannel;

const OWNER: ComponentId = ComponentId(3);
const APP: ComponentId = ComponentId(4);

fn endpoint_with_timeout(
    stub: &StubChannel,
    open_timeout_ms: u64,
) -> (amqp_conn::Endpoint, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let options = amqp_conn::ConnectionOption::builder()
        .open_timeout_ms(open_timeout_ms)
        .build()
        .unwrap();
    let endpoint = amqp_conn::Endpoint::with_options(
        amqp_conn::ConnectionHandle(2),
        amqp_conn::SessionHandle(2),
        OWNER,
        stub.clone(),
        tx,
        options,
    );
    (endpoint, rx)
}

#[tokio::test]
async fn test_open_resolves_when_engine_reports_open() {
    common::init_tracing();
    let stub = StubChannel::new();
    let (endpoint, _rx) = endpoint_with_timeout(&stub, 0);

    endpoint.connection_opened().unwrap();
    endpoint.open().await.unwrap();
    // Already open
    endpoint.open().await.unwrap();

    let stats = endpoint.stats().await.unwrap();
    assert_eq!(stats.phase, amqp_conn::Phase::Open);
}

#[tokio::test(start_paused = true)]
async fn test_open_timeout_fails_connection() {
    common::init_tracing();
    let stub = StubChannel::new();
    let (endpoint, mut rx) = endpoint_with_timeout(&stub, 1_000);

    // Sends are accepted while opening and purged by the timeout
    endpoint
        .send_qos1(amqp_conn::DeliveryId(1), b"early".to_vec(), CallbackId(1), APP)
        .await
        .unwrap();

    let result = endpoint.open().await;
    assert!(matches!(
        result,
        Err(amqp_conn::ConnectionError::Disconnected(
            DisconnectReason::OpenTimeout
        ))
    ));

    let stats = endpoint.stats().await.unwrap();
    assert_eq!(stats.phase, amqp_conn::Phase::Failed);
    assert_eq!(stub.shutdown_count(), 1);

    assert_eq!(
        rx.recv().await,
        Some(Notification::SendComplete {
            callback: CallbackId(1),
            owner: APP,
            outcome: SendOutcome::Purged(PurgeCause::Failed),
        })
    );
    assert_eq!(
        rx.recv().await,
        Some(Notification::Disconnected {
            owner: OWNER,
            reason: DisconnectReason::OpenTimeout,
        })
    );

    // A late open report does not revive the connection
    endpoint.connection_opened().unwrap();
    let stats = endpoint.stats().await.unwrap();
    assert_eq!(stats.phase, amqp_conn::Phase::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_open_before_timeout_cancels_timer() {
    common::init_tracing();
    let stub = StubChannel::new();
    let (endpoint, mut rx) = endpoint_with_timeout(&stub, 1_000);

    endpoint.connection_opened().unwrap();
    endpoint.open().await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(2_000)).await;

    let stats = endpoint.stats().await.unwrap();
    assert_eq!(stats.phase, amqp_conn::Phase::Open);
    assert!(rx.try_recv().is_err());
    assert_eq!(stub.shutdown_count(), 0);
}

#[tokio::test]
async fn test_remote_close_while_opening_rejects_open() {
    common::init_tracing();
    let stub = StubChannel::new();
    let (endpoint, _rx) = endpoint_with_timeout(&stub, 0);

    endpoint
        .connection_closed(Some("amqp:unauthorized-access".to_string()))
        .unwrap();
    let result = endpoint.open().await;
    assert!(matches!(
        result,
        Err(amqp_conn::ConnectionError::Disconnected(
            DisconnectReason::Remote(Some(_))
        ))
    ));
}
