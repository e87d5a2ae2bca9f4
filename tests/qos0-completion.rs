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
    CallbackId, ComponentId, Notification, PurgeCause, Qos0CompletionTracker, SendOutcome,
    TrackerError,
};

mod common;

const OWNER: ComponentId = ComponentId(1);

fn completed(notes: &[Notification]) -> Vec<(u64, SendOutcome)> {
    notes
        .iter()
        .map(|n| match n {
            Notification::SendComplete {
                callback, outcome, ..
            } => (callback.0, *outcome),
            other => panic!("unexpected notification: {other:?}"),
        })
        .collect()
}

#[test]
fn test_drain_fires_only_reached_thresholds_in_order() {
    common::init_tracing();
    let mut tracker = Qos0CompletionTracker::new();

    assert_eq!(tracker.register(0, 10, CallbackId(1), OWNER), Ok(10));
    assert_eq!(tracker.register(10, 20, CallbackId(2), OWNER), Ok(30));
    assert_eq!(tracker.register(30, 5, CallbackId(3), OWNER), Ok(35));

    let mut notes = Vec::new();
    assert_eq!(tracker.drain(15, None, &mut notes), 1);
    assert_eq!(completed(&notes), vec![(1, SendOutcome::Written)]);
    assert_eq!(tracker.len(), 2);
    assert_eq!(tracker.next_threshold(), Some(30));

    notes.clear();
    assert_eq!(tracker.drain(35, None, &mut notes), 2);
    assert_eq!(
        completed(&notes),
        vec![(2, SendOutcome::Written), (3, SendOutcome::Written)]
    );
    assert!(tracker.is_empty());
}

#[test]
fn test_drain_below_head_threshold_fires_nothing() {
    common::init_tracing();
    let mut tracker = Qos0CompletionTracker::new();
    tracker.register(100, 1, CallbackId(1), OWNER).unwrap();

    let mut notes = Vec::new();
    assert_eq!(tracker.drain(100, None, &mut notes), 0);
    assert!(notes.is_empty());
    assert_eq!(tracker.len(), 1);
}

#[test]
fn test_drain_stops_at_first_unmet_threshold() {
    common::init_tracing();
    let mut tracker = Qos0CompletionTracker::new();
    // Equal thresholds are allowed and fire together
    tracker.register(0, 4, CallbackId(1), OWNER).unwrap();
    tracker.register(0, 4, CallbackId(2), OWNER).unwrap();
    tracker.register(4, 4, CallbackId(3), OWNER).unwrap();

    let mut notes = Vec::new();
    tracker.drain(7, None, &mut notes);
    assert_eq!(
        completed(&notes),
        vec![(1, SendOutcome::Written), (2, SendOutcome::Written)]
    );
    assert_eq!(tracker.next_threshold(), Some(8));
}

#[test]
fn test_purge_empties_queue_in_registration_order() {
    common::init_tracing();
    let mut tracker = Qos0CompletionTracker::new();
    for (i, delta) in [10u64, 20, 5].into_iter().enumerate() {
        let written = i as u64 * 100;
        tracker
            .register(written, delta, CallbackId(i as u64), OWNER)
            .unwrap();
    }

    let mut notes = Vec::new();
    assert_eq!(tracker.drain(0, Some(PurgeCause::Failed), &mut notes), 3);
    let purged = SendOutcome::Purged(PurgeCause::Failed);
    assert_eq!(completed(&notes), vec![(0, purged), (1, purged), (2, purged)]);
    assert!(tracker.is_empty());

    // Second purge has nothing left to notify
    notes.clear();
    assert_eq!(tracker.drain(0, Some(PurgeCause::Failed), &mut notes), 0);
    assert!(notes.is_empty());
}

#[test]
fn test_register_rejects_zero_byte_delta() {
    common::init_tracing();
    let mut tracker = Qos0CompletionTracker::new();
    assert_eq!(
        tracker.register(0, 0, CallbackId(1), OWNER),
        Err(TrackerError::ZeroByteDelta)
    );
    assert!(tracker.is_empty());
}

#[test]
fn test_owner_is_passed_back_with_callback() {
    common::init_tracing();
    let mut tracker = Qos0CompletionTracker::new();
    tracker.register(0, 3, CallbackId(9), ComponentId(42)).unwrap();

    let mut notes = Vec::new();
    tracker.drain(3, None, &mut notes);
    assert_eq!(
        notes,
        vec![Notification::SendComplete {
            callback: CallbackId(9),
            owner: ComponentId(42),
            outcome: SendOutcome::Written,
        }]
    );
}
