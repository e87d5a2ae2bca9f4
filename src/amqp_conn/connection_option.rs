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

use derive_builder::Builder;
use getset::Getters;

/// Connection Options - Configuration for a tracked AMQP connection
///
/// These options are supplied when an endpoint is created for a freshly established
/// connection. They control the open handshake deadline, how long teardown may wait for
/// the network channel, and how receiving links are credited.
///
/// # Usage
///
/// ```ignore
/// use amqp_connection_tokio::amqp_conn::ConnectionOption;
///
/// let options = ConnectionOption::builder()
///     .open_timeout_ms(10_000u64)
///     .default_link_credit(50u32)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Builder, Getters)]
#[builder(derive(Debug), pattern = "owned", setter(into))]
pub struct ConnectionOption {
    /// Open handshake timeout in milliseconds
    ///
    /// Maximum time the connection may stay in the opening phase before it is failed.
    /// A value of 0 disables the timeout.
    ///
    /// # Default
    /// 0 (disabled)
    #[builder(default = "0")]
    #[getset(get = "pub")]
    open_timeout_ms: u64,

    /// Network channel shutdown timeout in milliseconds
    ///
    /// Maximum time to wait for the channel to release the transport on close.
    ///
    /// # Default
    /// 5000 (5 seconds)
    #[builder(default = "5000")]
    #[getset(get = "pub")]
    shutdown_timeout_ms: u64,

    /// Link credit granted to a subscription when none is given explicitly
    ///
    /// # Default
    /// 10
    #[builder(default = "10")]
    #[getset(get = "pub")]
    default_link_credit: u32,

    /// Percentage of a link's credit that must be settled before credit-low is signalled
    ///
    /// Values above 100 are clamped to 100.
    ///
    /// # Default
    /// 50
    #[builder(default = "50")]
    #[getset(get = "pub")]
    credit_low_percent: u8,
}

impl Default for ConnectionOption {
    fn default() -> Self {
        Self {
            open_timeout_ms: 0,
            shutdown_timeout_ms: 5000,
            default_link_credit: 10,
            credit_low_percent: 50,
        }
    }
}

impl ConnectionOption {
    /// Create a new builder for ConnectionOption
    pub fn builder() -> ConnectionOptionBuilder {
        ConnectionOptionBuilder::default()
    }

    pub(crate) fn clamped_credit_low_percent(&self) -> u8 {
        self.credit_low_percent.min(100)
    }
}
