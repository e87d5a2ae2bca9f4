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

//! Network channel abstraction owned by a connection.
//!
//! The connection state never performs socket I/O itself. It holds a single
//! [`NetworkChannel`] and the endpoint event loop writes engine output through it,
//! advancing the byte counter only after the channel accepted the bytes. Sockets,
//! TLS and framing live behind implementations of this trait.

use std::future::Future;
use std::io::IoSlice;
use std::pin::Pin;
use tokio::time::Duration;

/// Errors reported by a network channel
#[derive(Debug)]
pub enum ChannelError {
    Io(std::io::Error),
    Timeout,
    NotConnected,
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelError::Io(e) => write!(f, "IO error: {e}"),
            ChannelError::Timeout => write!(f, "Operation timed out"),
            ChannelError::NotConnected => write!(f, "Channel not connected"),
        }
    }
}

impl std::error::Error for ChannelError {}

impl From<std::io::Error> for ChannelError {
    fn from(e: std::io::Error) -> Self {
        ChannelError::Io(e)
    }
}

/// Write side of the transport beneath an AMQP connection.
///
/// # Examples
///
/// ```rust
/// use amqp_connection_tokio::amqp_conn::channel::{ChannelError, NetworkChannel};
/// use std::future::Future;
/// use std::io::IoSlice;
/// use std::pin::Pin;
/// use tokio::time::Duration;
///
/// struct Discard;
///
/// impl NetworkChannel for Discard {
///     fn send<'a>(
///         &'a mut self,
///         _buffers: &'a [IoSlice<'a>],
///     ) -> Pin<Box<dyn Future<Output = Result<(), ChannelError>> + Send + 'a>> {
///         Box::pin(async move { Ok(()) })
///     }
///
///     fn shutdown<'a>(
///         &'a mut self,
///         _timeout: Duration,
///     ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
///         Box::pin(async move {})
///     }
/// }
/// ```
pub trait NetworkChannel {
    /// Writes all of `buffers` to the transport.
    ///
    /// `Ok(())` means every byte was accepted; the caller counts them as written.
    fn send<'a>(
        &'a mut self,
        buffers: &'a [IoSlice<'a>],
    ) -> Pin<Box<dyn Future<Output = Result<(), ChannelError>> + Send + 'a>>;

    /// Releases the underlying transport, waiting at most `timeout`.
    fn shutdown<'a>(
        &'a mut self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

impl NetworkChannel for Box<dyn NetworkChannel + Send> {
    fn send<'a>(
        &'a mut self,
        buffers: &'a [IoSlice<'a>],
    ) -> Pin<Box<dyn Future<Output = Result<(), ChannelError>> + Send + 'a>> {
        (**self).send(buffers)
    }

    fn shutdown<'a>(
        &'a mut self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        (**self).shutdown(timeout)
    }
}
