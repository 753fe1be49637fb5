//! Point-to-point transport between ring neighbours
//!
//! Every direction of every ring link gets its own bounded channel, so
//! messages between a pair of workers stay ordered. Two interchangeable
//! backends are available; both keep cache-line aligned counters.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache line size for padding (typically 64 bytes on x86-64)
const CACHE_LINE_SIZE: usize = 64;

/// Channel implementation backing the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// `flume` bounded channels
    #[default]
    Flume,

    /// `crossbeam-channel` bounded channels
    Crossbeam,
}

/// Statistics for channel traffic
#[repr(align(64))] // Align to cache line
#[derive(Debug)]
pub struct ChannelStats {
    /// Number of messages sent
    pub messages_sent: AtomicU64,

    /// Number of messages received
    pub messages_received: AtomicU64,

    /// Number of send errors
    pub send_errors: AtomicU64,

    /// Number of receive errors
    pub recv_errors: AtomicU64,

    _padding: [u8; CACHE_LINE_SIZE - 32], // Pad to cache line
}

impl Default for ChannelStats {
    fn default() -> Self {
        Self {
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            send_errors: AtomicU64::new(0),
            recv_errors: AtomicU64::new(0),
            _padding: [0; CACHE_LINE_SIZE - 32],
        }
    }
}

impl ChannelStats {
    /// Get the number of messages sent
    pub fn sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Get the number of messages received
    pub fn received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Get the number of send errors
    pub fn send_errors(&self) -> u64 {
        self.send_errors.load(Ordering::Relaxed)
    }

    /// Get the number of receive errors
    pub fn recv_errors(&self) -> u64 {
        self.recv_errors.load(Ordering::Relaxed)
    }
}

/// Sender half of a channel
pub struct Sender<T> {
    inner: SenderInner<T>,
    stats: Arc<ChannelStats>,
}

enum SenderInner<T> {
    Flume(flume::Sender<T>),
    Crossbeam(crossbeam::channel::Sender<T>),
}

impl<T> Sender<T> {
    fn record<R>(&self, result: Result<R>) -> Result<R> {
        match result {
            Ok(value) => {
                self.stats.messages_sent.fetch_add(1, Ordering::Relaxed);
                Ok(value)
            }
            Err(e) => {
                self.stats.send_errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Send a message without blocking; a full channel is an error
    pub fn try_send(&self, msg: T) -> Result<()> {
        let result = match &self.inner {
            SenderInner::Flume(s) => s.try_send(msg).map_err(|e| match e {
                flume::TrySendError::Full(_) => Error::ChannelFull,
                flume::TrySendError::Disconnected(_) => {
                    Error::SendError("Channel disconnected".to_string())
                }
            }),
            SenderInner::Crossbeam(s) => s.try_send(msg).map_err(|e| match e {
                crossbeam::channel::TrySendError::Full(_) => Error::ChannelFull,
                crossbeam::channel::TrySendError::Disconnected(_) => {
                    Error::SendError("Channel disconnected".to_string())
                }
            }),
        };
        self.record(result)
    }

    /// Get channel statistics
    pub fn stats(&self) -> Arc<ChannelStats> {
        Arc::clone(&self.stats)
    }
}

/// Receiver half of a channel
pub struct Receiver<T> {
    inner: ReceiverInner<T>,
    stats: Arc<ChannelStats>,
}

enum ReceiverInner<T> {
    Flume(flume::Receiver<T>),
    Crossbeam(crossbeam::channel::Receiver<T>),
}

impl<T> Receiver<T> {
    fn record(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(msg) => {
                self.stats.messages_received.fetch_add(1, Ordering::Relaxed);
                Ok(msg)
            }
            Err(e) => {
                self.stats.recv_errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Receive a message, blocking until one arrives or every sender is gone
    pub fn recv(&self) -> Result<T> {
        let result = match &self.inner {
            ReceiverInner::Flume(r) => r.recv().map_err(Error::from),
            ReceiverInner::Crossbeam(r) => r.recv().map_err(Error::from),
        };
        self.record(result)
    }
}
