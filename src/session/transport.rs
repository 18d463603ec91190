use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::{
    io::{AsyncWrite, AsyncWriteExt, BufWriter},
    sync::mpsc,
    task::JoinHandle,
};

use super::state::ConnectionState;
use crate::{
    logging::SessionLogger,
    proto::{Packet, PacketFrame, encode_raw_packet},
};

/// Outbound side of a connection as seen by the session core.
///
/// Every call is fire-and-forget; a dead transport silently drops writes.
pub trait Transport: Send + Sync {
    /// Queues a packet and flushes.
    fn write(&self, packet: Packet);

    /// Queues a packet without flushing.
    fn delayed_write(&self, packet: Packet);

    fn flush(&self);

    fn is_active(&self) -> bool;

    fn remote_address(&self) -> SocketAddr;
}

enum WriterCommand {
    Frame { bytes: Vec<u8>, flush: bool },
    Flush,
    Close,
}

/// Transport writing length-prefixed frames to a socket from a dedicated task.
///
/// Packets are encoded on the caller's thread with the phase and version the
/// connection has at that moment, so queued writes keep their wire format
/// across later phase changes.
pub struct FramedTransport {
    state: Arc<ConnectionState>,
    tx: mpsc::UnboundedSender<WriterCommand>,
    active: Arc<AtomicBool>,
}

impl FramedTransport {
    pub fn spawn<W>(state: Arc<ConnectionState>, writer: W) -> (Self, JoinHandle<io::Result<()>>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));
        let addr = state.remote_address();
        let task = tokio::spawn(run_writer(writer, rx, active.clone(), addr));
        (Self { state, tx, active }, task)
    }

    pub fn state(&self) -> &Arc<ConnectionState> {
        &self.state
    }

    /// Writes an already encoded frame, e.g. one forwarded without decoding.
    pub fn write_frame(&self, frame: &PacketFrame, flush: bool) {
        if !self.is_active() {
            return;
        }
        let mut bytes = Vec::with_capacity(frame.body.len() + 8);
        if let Err(err) = encode_raw_packet(&mut bytes, frame.id, &frame.body) {
            SessionLogger::encode_failure(&self.remote_address(), "raw frame", &err);
            return;
        }
        self.command(WriterCommand::Frame { bytes, flush });
    }

    /// Flushes what is queued and shuts the socket down.
    pub fn close(&self) {
        self.state.close();
        self.command(WriterCommand::Close);
    }

    fn send_packet(&self, packet: Packet, flush: bool) {
        if !self.is_active() {
            return;
        }
        match self.state.encode_outbound(&packet) {
            Ok(frame) => self.write_frame(&frame, flush),
            Err(err) => {
                SessionLogger::encode_failure(&self.remote_address(), packet.kind().name(), &err)
            }
        }
    }

    fn command(&self, command: WriterCommand) {
        if self.tx.send(command).is_err() {
            self.active.store(false, Ordering::Release);
        }
    }
}

impl Transport for FramedTransport {
    fn write(&self, packet: Packet) {
        self.send_packet(packet, true);
    }

    fn delayed_write(&self, packet: Packet) {
        self.send_packet(packet, false);
    }

    fn flush(&self) {
        self.command(WriterCommand::Flush);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) && !self.state.is_closed()
    }

    fn remote_address(&self) -> SocketAddr {
        self.state.remote_address()
    }
}

async fn run_writer<W>(
    writer: W,
    mut rx: mpsc::UnboundedReceiver<WriterCommand>,
    active: Arc<AtomicBool>,
    addr: SocketAddr,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(writer);
    let result: io::Result<()> = async {
        while let Some(command) = rx.recv().await {
            match command {
                WriterCommand::Frame { bytes, flush } => {
                    writer.write_all(&bytes).await?;
                    if flush {
                        writer.flush().await?;
                    }
                }
                WriterCommand::Flush => writer.flush().await?,
                WriterCommand::Close => {
                    writer.flush().await?;
                    writer.shutdown().await?;
                    break;
                }
            }
        }
        Ok(())
    }
    .await;

    active.store(false, Ordering::Release);
    rx.close();
    if let Err(err) = &result {
        SessionLogger::writer_failed(&addr, err);
    }
    result
}

/// What a [`MemoryTransport`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Write(Packet),
    DelayedWrite(Packet),
    Flush,
}

/// Transport that records calls instead of writing them anywhere.
#[derive(Debug)]
pub struct MemoryTransport {
    remote: SocketAddr,
    active: AtomicBool,
    events: Mutex<Vec<TransportEvent>>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 25565)))
    }
}

impl MemoryTransport {
    pub fn new(remote: SocketAddr) -> Self {
        Self {
            remote,
            active: AtomicBool::new(true),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub fn events(&self) -> Vec<TransportEvent> {
        self.lock().clone()
    }

    pub fn take_events(&self) -> Vec<TransportEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Packets in the order they were handed over, flushed or not.
    pub fn packets(&self) -> Vec<Packet> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                TransportEvent::Write(packet) | TransportEvent::DelayedWrite(packet) => {
                    Some(packet.clone())
                }
                TransportEvent::Flush => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TransportEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: TransportEvent) {
        if self.is_active() {
            self.lock().push(event);
        }
    }
}

impl Transport for MemoryTransport {
    fn write(&self, packet: Packet) {
        self.record(TransportEvent::Write(packet));
    }

    fn delayed_write(&self, packet: Packet) {
        self.record(TransportEvent::DelayedWrite(packet));
    }

    fn flush(&self) {
        self.record(TransportEvent::Flush);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn remote_address(&self) -> SocketAddr {
        self.remote
    }
}
