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

use amqp_connection_tokio::amqp_conn::{
    CallbackId, ComponentId, DeliveryId, Notification, OutboundDeliveryTracker, PendingDelivery,
    PurgeCause, SendOutcome, TrackerError,
};

mod common;

#[test]
fn test_track_then_settle_returns_same_entry() {
    common::init_tracing();
    let mut tracker = OutboundDeliveryTracker::new();
    tracker
        .track(DeliveryId(7), CallbackId(70), ComponentId(1))
        .unwrap();

    let entry = tracker.settle(DeliveryId(7)).unwrap();
    assert_eq!(
        entry,
        PendingDelivery {
            delivery_id: DeliveryId(7),
            callback: CallbackId(70),
            owner: ComponentId(1),
        }
    );
    assert!(!tracker.contains(DeliveryId(7)));
    assert!(tracker.is_empty());
}

#[test]
fn test_track_duplicate_is_rejected() {
    common::init_tracing();
    let mut tracker = OutboundDeliveryTracker::new();
    tracker
        .track(DeliveryId(1), CallbackId(1), ComponentId(1))
        .unwrap();

    let result = tracker.track(DeliveryId(1), CallbackId(2), ComponentId(1));
    assert_eq!(result, Err(TrackerError::DuplicateDelivery(DeliveryId(1))));

    // Original entry is untouched
    assert_eq!(tracker.settle(DeliveryId(1)).unwrap().callback, CallbackId(1));
}

#[test]
fn test_settle_unknown_is_not_found() {
    common::init_tracing();
    let mut tracker = OutboundDeliveryTracker::new();
    assert_eq!(
        tracker.settle(DeliveryId(3)),
        Err(TrackerError::UnknownDelivery(DeliveryId(3)))
    );
}

#[test]
fn test_settlements_in_any_order() {
    common::init_tracing();
    let mut tracker = OutboundDeliveryTracker::new();
    for id in 0..4 {
        tracker
            .track(DeliveryId(id), CallbackId(id), ComponentId(1))
            .unwrap();
    }

    for id in [2, 0, 3, 1] {
        assert_eq!(tracker.settle(DeliveryId(id)).unwrap().callback, CallbackId(id));
    }
    assert!(tracker.is_empty());
}

#[test]
fn test_purge_all_fires_once_and_later_settle_is_inert() {
    common::init_tracing();
    let mut tracker = OutboundDeliveryTracker::new();
    tracker
        .track(DeliveryId(1), CallbackId(11), ComponentId(5))
        .unwrap();

    let mut notes = Vec::new();
    assert_eq!(tracker.purge_all(PurgeCause::Closed, &mut notes), 1);
    assert_eq!(
        notes,
        vec![Notification::SendComplete {
            callback: CallbackId(11),
            owner: ComponentId(5),
            outcome: SendOutcome::Purged(PurgeCause::Closed),
        }]
    );

    assert!(tracker.settle(DeliveryId(1)).is_err());
    assert_eq!(tracker.purge_all(PurgeCause::Closed, &mut notes), 0);
    assert_eq!(notes.len(), 1);
}
