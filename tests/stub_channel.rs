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

use std::collections::VecDeque;
use std::future::Future;
use std::io::IoSlice;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use amqp_connection_tokio::amqp_conn::{ChannelError, NetworkChannel};

/// Call record for tracking method invocations
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelCall {
    Send { data: Vec<u8> },
    Shutdown { timeout: Duration },
}

/// Response configuration for controlling stub behavior
#[derive(Debug)]
#[allow(dead_code)]
pub enum ChannelResponse {
    SendOk,
    SendErr(ChannelError),
}

/// Stub network channel for testing
///
/// Sends consume queued responses in order; once the queue is empty every send succeeds.
#[derive(Clone)]
pub struct StubChannel {
    /// Record of method calls made to this channel
    pub calls: Arc<Mutex<Vec<ChannelCall>>>,
    /// Queue of responses to return for send calls
    responses: Arc<Mutex<VecDeque<ChannelResponse>>>,
}

#[allow(dead_code)]
impl StubChannel {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Add a response to the queue
    pub fn add_response(&self, response: ChannelResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<ChannelCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Bytes of every recorded send, in order
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.get_calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Send { data } => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn shutdown_count(&self) -> usize {
        self.get_calls()
            .iter()
            .filter(|call| matches!(call, ChannelCall::Shutdown { .. }))
            .count()
    }

    fn get_next_response(&self) -> ChannelResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ChannelResponse::SendOk)
    }
}

impl Default for StubChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkChannel for StubChannel {
    fn send<'a>(
        &'a mut self,
        buffers: &'a [IoSlice<'a>],
    ) -> Pin<Box<dyn Future<Output = Result<(), ChannelError>> + Send + 'a>> {
        Box::pin(async move {
            let mut data = Vec::new();
            for buffer in buffers {
                data.extend_from_slice(buffer);
            }

            self.calls.lock().unwrap().push(ChannelCall::Send { data });

            match self.get_next_response() {
                ChannelResponse::SendOk => Ok(()),
                ChannelResponse::SendErr(err) => Err(err),
            }
        })
    }

    fn shutdown<'a>(
        &'a mut self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push(ChannelCall::Shutdown { timeout });
        })
    }
}
