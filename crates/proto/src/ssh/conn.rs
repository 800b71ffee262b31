//! Per-connection handshake state machine.
//!
//! Each connection is driven entirely from the outside: the event loop
//! delivers readable and writable notifications, and the machine performs at
//! most one receive and one send attempt per notification. Partial reads and
//! short writes are normal; buffered bytes and the send cursor persist
//! across event loop passes.
//!
//! A connection never unwinds an error past itself. Every failure — protocol
//! violation, I/O error, peer close — resolves to [`Disposition::Close`],
//! and the pool reclaims the slot. Losing one probe connection must never
//! abort the run.

use std::io::{self, Read, Write};

use mio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::ssh::buffer::RecvBuffer;
use crate::ssh::codec::{self, Decode};
use crate::ssh::message::MessageType;

/// Handshake stage of one connection.
///
/// A freed slot holds no connection at all, so there is no `Closed` variant;
/// an existing connection is always in one of these stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for the peer's identification line. The server speaks first;
    /// nothing is sent in this stage.
    VersionExchange,
    /// Peer banner validated; our banner goes out on the next writable.
    BannerSend,
    /// Banner sent; the fixed KEXINIT is (re)sent on writable and inbound
    /// packets are framed and discarded on readable.
    KexInit,
}

/// What the event loop should do with the connection after a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep the connection in its slot.
    Keep,
    /// Release the slot; the connection is finished, cleanly or otherwise.
    Close,
}

/// Outcome of one send attempt.
enum SendStep {
    /// The current message is fully on the wire.
    Done,
    /// Short write or would-block; resume from the cursor next time.
    Partial,
    /// Write error; the connection is unusable.
    Failed,
}

/// One probed connection: transport, receive buffer, stage, send cursor.
#[derive(Debug)]
pub struct Connection {
    index: usize,
    stream: TcpStream,
    stage: Stage,
    buf: RecvBuffer,
    sent: usize,
}

impl Connection {
    /// Wraps a freshly connected non-blocking stream.
    pub(crate) fn new(index: usize, stream: TcpStream, recv_capacity: usize) -> Self {
        Self {
            index,
            stream,
            stage: Stage::VersionExchange,
            buf: RecvBuffer::with_capacity(recv_capacity),
            sent: 0,
        }
    }

    /// Returns the current handshake stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the slot index this connection occupies.
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Handles a readable notification: one receive, then as much framing as
    /// the buffered bytes allow.
    pub fn on_readable(&mut self) -> Disposition {
        if self.buf.is_full() {
            warn!("[{:02}] buffer full before a complete frame", self.index);
            return Disposition::Close;
        }
        match self.stream.read(self.buf.unfilled_mut()) {
            // zero-length read is peer half-close; the server must send its
            // banner before we ever transmit, so nothing useful can follow
            Ok(0) => {
                info!("[{:02}] connection closed by peer", self.index);
                Disposition::Close
            }
            Ok(n) => {
                debug!("[{:02}] read {} bytes", self.index, n);
                self.buf.advance(n);
                self.parse_buffered()
            }
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                Disposition::Keep
            }
            Err(e) => {
                warn!("[{:02}] read error: {}", self.index, e);
                Disposition::Close
            }
        }
    }

    /// Runs the codec over the buffered bytes for the current stage.
    fn parse_buffered(&mut self) -> Disposition {
        match self.stage {
            Stage::VersionExchange => self.parse_banner(),
            // our own banner is still going out; let inbound bytes accumulate
            Stage::BannerSend => Disposition::Keep,
            Stage::KexInit => self.parse_packets(),
        }
    }

    fn parse_banner(&mut self) -> Disposition {
        let (banner, consumed) = match codec::decode_banner(self.buf.filled()) {
            Ok(Decode::NeedMoreData) => return Disposition::Keep,
            Ok(Decode::Complete { frame, consumed }) => {
                (String::from_utf8_lossy(frame).into_owned(), consumed)
            }
            Err(e) => {
                warn!("[{:02}] invalid banner: {}", self.index, e);
                return Disposition::Close;
            }
        };
        info!("[{:02}] got banner: {}", self.index, banner);
        self.buf.consume(consumed);
        self.stage = Stage::BannerSend;
        Disposition::Keep
    }

    /// Frames packets repeatedly until the buffer runs dry mid-frame.
    fn parse_packets(&mut self) -> Disposition {
        loop {
            let (head, consumed) =
                match codec::decode_packet(self.buf.filled(), self.buf.capacity()) {
                    Ok(Decode::NeedMoreData) => return Disposition::Keep,
                    Ok(Decode::Complete { frame, consumed }) => (frame, consumed),
                    Err(e) => {
                        warn!("[{:02}] {}", self.index, e);
                        return Disposition::Close;
                    }
                };
            match head.msg_type.and_then(MessageType::from_u8) {
                Some(MessageType::Disconnect) => {
                    info!("[{:02}] received disconnect", self.index);
                    return Disposition::Close;
                }
                Some(MessageType::KexInit) => {
                    info!("[{:02}] received kexinit ({} bytes)", self.index, head.length);
                }
                Some(m) => {
                    debug!(
                        "[{:02}] received {} packet ({} bytes)",
                        self.index, m, head.length
                    );
                }
                None => match head.msg_type {
                    Some(t) => debug!(
                        "[{:02}] received type {} packet ({} bytes)",
                        self.index, t, head.length
                    ),
                    None => debug!(
                        "[{:02}] received {}-byte packet without a type byte",
                        self.index, head.length
                    ),
                },
            }
            self.buf.consume(consumed);
        }
    }

    /// Handles a writable notification: at most one send attempt for the
    /// message the current stage owes the peer.
    pub fn on_writable(&mut self, banner: &[u8], kexinit: &[u8]) -> Disposition {
        match self.stage {
            Stage::VersionExchange => Disposition::Keep,
            Stage::BannerSend => {
                if self.sent == 0 {
                    info!("[{:02}] sending banner", self.index);
                }
                match self.send_step(banner) {
                    SendStep::Done => {
                        self.stage = Stage::KexInit;
                        Disposition::Keep
                    }
                    SendStep::Partial => Disposition::Keep,
                    SendStep::Failed => Disposition::Close,
                }
            }
            Stage::KexInit => {
                if self.sent == 0 {
                    info!("[{:02}] sending kexinit", self.index);
                }
                // deliberately resent on every writable while the stage lasts
                match self.send_step(kexinit) {
                    SendStep::Done | SendStep::Partial => Disposition::Keep,
                    SendStep::Failed => Disposition::Close,
                }
            }
        }
    }

    /// Writes from the send cursor; resets it once the message is complete.
    fn send_step(&mut self, data: &[u8]) -> SendStep {
        match self.stream.write(&data[self.sent..]) {
            Ok(n) => {
                debug!("[{:02}] wrote {} bytes", self.index, n);
                self.sent += n;
                if self.sent == data.len() {
                    self.sent = 0;
                    SendStep::Done
                } else {
                    SendStep::Partial
                }
            }
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                SendStep::Partial
            }
            Err(e) => {
                warn!("[{:02}] write error: {}", self.index, e);
                SendStep::Failed
            }
        }
    }
}
