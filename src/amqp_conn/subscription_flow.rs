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

//! Credit and settlement counters for one receiving link.
//!
//! Credit bounds how many messages the peer may deliver before the client settles
//! them. Settled messages keep consuming credit until the client replenishes the link,
//! at which point their count is handed back to the engine as fresh credit. Credit only
//! grows through an engine-reported grant, so a replenished count is never counted twice.

use tracing::warn;

use crate::amqp_conn::connection_error::TrackerError;
use crate::amqp_conn::handle::ComponentId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionFlowTracker {
    link: String,
    subscriber: ComponentId,
    max_credit: u32,
    unsettled: u32,
    settled: u32,
    credit_low_signalled: bool,
}

/// Point-in-time copy of a link's counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub link: String,
    pub subscriber: ComponentId,
    pub max_credit: u32,
    pub unsettled: u32,
    pub settled: u32,
}

impl SubscriptionFlowTracker {
    pub fn new(link: impl Into<String>, subscriber: ComponentId, initial_credit: u32) -> Self {
        Self {
            link: link.into(),
            subscriber,
            max_credit: initial_credit,
            unsettled: 0,
            settled: 0,
            credit_low_signalled: false,
        }
    }

    pub fn grant_credit(&mut self, amount: u32) {
        self.max_credit = self.max_credit.saturating_add(amount);
    }

    /// Count a message delivered on the link.
    ///
    /// A delivery beyond the granted credit is a peer protocol violation. The message is
    /// still counted as unsettled, since the application holds it and will settle it, and
    /// `CreditExhausted` is returned for the caller to report.
    pub fn on_message_received(&mut self) -> Result<(), TrackerError> {
        let in_use = self.unsettled.saturating_add(self.settled);
        self.unsettled = self.unsettled.saturating_add(1);
        if in_use >= self.max_credit {
            warn!(
                link = %self.link,
                max_credit = self.max_credit,
                unsettled = self.unsettled,
                settled = self.settled,
                "peer delivered beyond link credit"
            );
            return Err(TrackerError::CreditExhausted {
                link: self.link.clone(),
                max_credit: self.max_credit,
                unsettled: self.unsettled,
                settled: self.settled,
            });
        }
        Ok(())
    }

    pub fn on_settled(&mut self, count: u32) -> Result<(), TrackerError> {
        if count > self.unsettled {
            return Err(TrackerError::SettleExceedsUnsettled {
                link: self.link.clone(),
                requested: count,
                unsettled: self.unsettled,
            });
        }
        self.unsettled -= count;
        self.settled = self.settled.saturating_add(count);
        Ok(())
    }

    /// Hand back the settled count as credit to re-grant and reset it.
    ///
    /// The returned credit leaves the link's allowance until the engine reports it granted
    /// again through [`grant_credit`](Self::grant_credit).
    pub fn replenish(&mut self) -> u32 {
        let settled = self.settled;
        self.settled = 0;
        self.max_credit = self.max_credit.saturating_sub(settled);
        self.credit_low_signalled = false;
        settled
    }

    /// True exactly once each time settled messages reach `percent` of the credit.
    ///
    /// Re-armed by [`replenish`](Self::replenish).
    pub fn take_credit_low(&mut self, percent: u8) -> bool {
        if self.credit_low_signalled || self.settled == 0 {
            return false;
        }
        let reached = u64::from(self.settled) * 100 >= u64::from(self.max_credit) * u64::from(percent);
        if reached {
            self.credit_low_signalled = true;
        }
        reached
    }

    pub fn remaining_credit(&self) -> u32 {
        self.max_credit
            .saturating_sub(self.unsettled.saturating_add(self.settled))
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn subscriber(&self) -> ComponentId {
        self.subscriber
    }

    pub fn max_credit(&self) -> u32 {
        self.max_credit
    }

    pub fn unsettled(&self) -> u32 {
        self.unsettled
    }

    pub fn settled(&self) -> u32 {
        self.settled
    }

    pub fn snapshot(&self) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            link: self.link.clone(),
            subscriber: self.subscriber,
            max_credit: self.max_credit,
            unsettled: self.unsettled,
            settled: self.settled,
        }
    }
}
