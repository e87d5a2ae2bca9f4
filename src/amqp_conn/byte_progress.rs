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

/// Running total of bytes handed to the transport for one connection
///
/// The counter only moves forward. Deltas are accumulated with saturation so a
/// misbehaving caller can stall progress but never wrap it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ByteProgressCounter {
    written: u64,
}

impl ByteProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Record `delta` more bytes and return the new total
    pub fn advance(&mut self, delta: u64) -> u64 {
        self.written = self.written.saturating_add(delta);
        self.written
    }
}
