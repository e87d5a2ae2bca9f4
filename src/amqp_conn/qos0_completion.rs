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

//! Completion tracking for at-most-once sends.
//!
//! QoS 0 transfers get no settlement from the peer, so a send counts as complete once
//! every byte of it has been handed to the transport. Each registered send records the
//! byte total the connection must reach; because sends are written in registration
//! order, thresholds are non-decreasing and only the head of the queue ever needs to be
//! inspected.

use std::collections::VecDeque;

use tracing::trace;

use crate::amqp_conn::connection_error::TrackerError;
use crate::amqp_conn::handle::{CallbackId, ComponentId};
use crate::amqp_conn::notify::{Notify, PurgeCause, SendOutcome};

/// A QoS 0 send waiting for its bytes to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCompletion {
    pub threshold: u64,
    pub callback: CallbackId,
    pub owner: ComponentId,
}

#[derive(Debug, Default)]
pub struct Qos0CompletionTracker {
    queue: VecDeque<PendingCompletion>,
}

impl Qos0CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a send of `byte_delta` bytes issued when `bytes_written` bytes were already out.
    ///
    /// Returns the byte threshold at which the send completes.
    pub fn register(
        &mut self,
        bytes_written: u64,
        byte_delta: u64,
        callback: CallbackId,
        owner: ComponentId,
    ) -> Result<u64, TrackerError> {
        if byte_delta == 0 {
            return Err(TrackerError::ZeroByteDelta);
        }
        let threshold = bytes_written.saturating_add(byte_delta);
        debug_assert!(
            self.queue.back().map_or(true, |last| last.threshold <= threshold),
            "QoS 0 thresholds must not decrease"
        );
        self.queue.push_back(PendingCompletion {
            threshold,
            callback,
            owner,
        });
        Ok(threshold)
    }

    /// Fire every send whose threshold has been reached, oldest first.
    ///
    /// With `purge` set, the whole queue is flushed regardless of `bytes_written` and each
    /// callback is told the send was purged. Returns how many callbacks fired.
    pub fn drain<N: Notify>(
        &mut self,
        bytes_written: u64,
        purge: Option<PurgeCause>,
        notify: &mut N,
    ) -> usize {
        let mut fired = 0;
        while let Some(head) = self.queue.front() {
            let outcome = match purge {
                Some(cause) => SendOutcome::Purged(cause),
                None if head.threshold <= bytes_written => SendOutcome::Written,
                None => break,
            };
            if let Some(entry) = self.queue.pop_front() {
                trace!(threshold = entry.threshold, ?outcome, "qos0 send complete");
                notify.send_complete(entry.callback, entry.owner, outcome);
                fired += 1;
            }
        }
        fired
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Threshold of the oldest pending send
    pub fn next_threshold(&self) -> Option<u64> {
        self.queue.front().map(|p| p.threshold)
    }
}
