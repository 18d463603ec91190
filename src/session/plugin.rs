//! Login plugin message request/response exchange.
//!
//! Requests created before the login phase completes are held back and sent as
//! one batch when [`LoginPluginExchange::signal_phase_complete`] runs. Once every
//! outstanding request is answered, the completion callback fires exactly once.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicI32, Ordering},
    },
};

use bytes::Bytes;
use tokio::sync::oneshot;

use super::transport::Transport;
use crate::{
    logging::SessionLogger,
    metrics::PluginMetrics,
    proto::{Component, Key, LoginDisconnect, LoginPluginMessage, Packet, ProtocolVersion},
    telemetry::get_meter,
};

pub type ResponseConsumer = Box<dyn FnOnce(Option<Bytes>) + Send>;
pub type CompletionCallback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("invalid plugin channel '{0}'")]
    InvalidChannel(String),
    #[error("login plugin messages require 1.13 or newer, client is on {0}")]
    UnsupportedVersion(ProtocolVersion),
    #[error("exchange already cleaned up")]
    Closed,
}

#[derive(Default)]
struct ExchangeInner {
    pending: HashMap<i32, ResponseConsumer>,
    queue: VecDeque<LoginPluginMessage>,
    on_all_handled: Option<CompletionCallback>,
    completion_fired: bool,
    closed: bool,
}

pub struct LoginPluginExchange {
    transport: Arc<dyn Transport>,
    version: ProtocolVersion,
    sequence: AtomicI32,
    inner: Mutex<ExchangeInner>,
    metrics: PluginMetrics,
}

/// Runs the completion check when a response handler returns or unwinds.
struct CompletionCheck<'a>(&'a LoginPluginExchange);

impl Drop for CompletionCheck<'_> {
    fn drop(&mut self) {
        self.0.complete_if_drained();
    }
}

impl LoginPluginExchange {
    pub fn new(transport: Arc<dyn Transport>, version: ProtocolVersion) -> Self {
        Self {
            transport,
            version,
            sequence: AtomicI32::new(0),
            inner: Mutex::new(ExchangeInner::default()),
            metrics: PluginMetrics::new(&get_meter()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ExchangeInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_id(&self) -> i32 {
        self.sequence.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Sends a login plugin request and registers `consumer` for its answer.
    ///
    /// The consumer receives the payload on success and `None` when the client
    /// does not understand the channel. Returns the request id.
    pub fn send<F>(&self, channel: &str, payload: Bytes, consumer: F) -> Result<i32, ExchangeError>
    where
        F: FnOnce(Option<Bytes>) + Send + 'static,
    {
        if self.version < ProtocolVersion::MINECRAFT_1_13 {
            return Err(ExchangeError::UnsupportedVersion(self.version));
        }
        let channel =
            Key::parse(channel).map_err(|_| ExchangeError::InvalidChannel(channel.to_string()))?;

        let mut inner = self.lock();
        if inner.closed {
            return Err(ExchangeError::Closed);
        }
        let id = self.next_id();
        inner.pending.insert(id, Box::new(consumer));
        let message = LoginPluginMessage {
            id,
            channel: channel.to_string(),
            data: payload,
        };
        if inner.completion_fired {
            self.transport.write(Packet::LoginPluginMessage(message));
        } else {
            inner.queue.push_back(message);
        }
        self.metrics.record_request(channel.namespace());
        Ok(id)
    }

    /// Like [`send`](Self::send), with the answer delivered through a channel.
    /// The receiver errors if the exchange is cleaned up first.
    pub fn send_awaiting(
        &self,
        channel: &str,
        payload: Bytes,
    ) -> Result<oneshot::Receiver<Option<Bytes>>, ExchangeError> {
        let (tx, rx) = oneshot::channel();
        self.send(channel, payload, move |response| {
            let _ = tx.send(response);
        })?;
        Ok(rx)
    }

    /// Delivers a client response to its consumer. Unknown ids are ignored.
    pub fn on_response(&self, id: i32, success: bool, data: Bytes) {
        let consumer = self.lock().pending.remove(&id);
        let Some(consumer) = consumer else {
            SessionLogger::unmatched_plugin_response(&self.transport.remote_address(), id);
            return;
        };
        self.metrics.record_response(success);

        let _check = CompletionCheck(self);
        consumer(success.then_some(data));
    }

    pub fn handle_response(&self, response: crate::proto::LoginPluginResponse) {
        self.on_response(response.id, response.success, response.data);
    }

    /// Marks the login phase as complete and releases every held-back request.
    ///
    /// `on_all_handled` runs once no request is outstanding: immediately when
    /// nothing is pending, otherwise after the last response. Only the first
    /// call counts; later ones are ignored along with their callback.
    pub fn signal_phase_complete<F>(&self, on_all_handled: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let callback = {
            let mut inner = self.lock();
            if inner.closed || inner.completion_fired {
                return;
            }
            inner.completion_fired = true;
            inner.on_all_handled = Some(Box::new(on_all_handled));
            if !inner.queue.is_empty() {
                while let Some(message) = inner.queue.pop_front() {
                    self.transport
                        .delayed_write(Packet::LoginPluginMessage(message));
                }
                self.transport.flush();
            }
            if inner.pending.is_empty() {
                inner.on_all_handled.take()
            } else {
                None
            }
        };
        if let Some(callback) = callback {
            callback();
        }
    }

    fn complete_if_drained(&self) {
        let callback = {
            let mut inner = self.lock();
            if inner.completion_fired && inner.pending.is_empty() {
                inner.on_all_handled.take()
            } else {
                None
            }
        };
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Drops queued requests, outstanding consumers and the completion callback.
    pub fn cleanup(&self) {
        let dropped = {
            let mut inner = self.lock();
            inner.closed = true;
            inner.queue.clear();
            inner.on_all_handled = None;
            std::mem::take(&mut inner.pending)
        };
        // consumers are dropped outside the lock, uninvoked
        drop(dropped);
    }

    /// Sends a login disconnect and releases all exchange state.
    pub fn disconnect(&self, reason: Component) {
        self.transport
            .write(Packet::LoginDisconnect(LoginDisconnect { reason }));
        self.cleanup();
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn queued_count(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }
}
