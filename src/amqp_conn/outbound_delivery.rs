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

//! Correlation table for at-least-once sends awaiting peer settlement.

use std::collections::HashMap;

use tracing::trace;

use crate::amqp_conn::connection_error::TrackerError;
use crate::amqp_conn::handle::{CallbackId, ComponentId, DeliveryId};
use crate::amqp_conn::notify::{Notify, PurgeCause, SendOutcome};

/// A QoS 1 send handed to the engine and not yet settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDelivery {
    pub delivery_id: DeliveryId,
    pub callback: CallbackId,
    pub owner: ComponentId,
}

/// Settlements arrive keyed by delivery id in any order, so this is a plain map.
#[derive(Debug, Default)]
pub struct OutboundDeliveryTracker {
    deliveries: HashMap<DeliveryId, PendingDelivery>,
}

impl OutboundDeliveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(
        &mut self,
        delivery_id: DeliveryId,
        callback: CallbackId,
        owner: ComponentId,
    ) -> Result<(), TrackerError> {
        if self.deliveries.contains_key(&delivery_id) {
            return Err(TrackerError::DuplicateDelivery(delivery_id));
        }
        self.deliveries.insert(
            delivery_id,
            PendingDelivery {
                delivery_id,
                callback,
                owner,
            },
        );
        Ok(())
    }

    /// Remove and return the entry for `delivery_id`.
    ///
    /// The caller is responsible for firing the callback; this keeps the tracker free of
    /// side effects on the settlement path.
    pub fn settle(&mut self, delivery_id: DeliveryId) -> Result<PendingDelivery, TrackerError> {
        self.deliveries
            .remove(&delivery_id)
            .ok_or(TrackerError::UnknownDelivery(delivery_id))
    }

    /// Remove every entry, telling each callback its send was purged.
    pub fn purge_all<N: Notify>(&mut self, cause: PurgeCause, notify: &mut N) -> usize {
        let purged = self.deliveries.len();
        for (id, entry) in self.deliveries.drain() {
            trace!(delivery_id = %id, "qos1 send purged");
            notify.send_complete(entry.callback, entry.owner, SendOutcome::Purged(cause));
        }
        purged
    }

    pub fn contains(&self, delivery_id: DeliveryId) -> bool {
        self.deliveries.contains_key(&delivery_id)
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }
}
