//! Fixed-capacity connection pool.
//!
//! A slot is free exactly when it holds no connection; there is no separate
//! free-list. Slot indices double as poller tokens, so a readiness event
//! maps straight back to the connection it belongs to. All slot mutation
//! happens here, driven by the single-threaded engine.

use std::net::{self, SocketAddr};

use mio::net::TcpStream;
use mio::{Interest, Registry, Token};
use tracing::{debug, warn};

use crate::ssh::conn::Connection;

/// Readable, writable, and (implicitly) error conditions for every slot.
const INTERESTS: Interest = Interest::READABLE.add(Interest::WRITABLE);

/// Fixed table of probe connections.
#[derive(Debug)]
pub struct Pool {
    slots: Vec<Option<Connection>>,
    recv_capacity: usize,
}

impl Pool {
    /// Creates a pool with `capacity` slots, all free.
    pub fn new(capacity: usize, recv_capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            recv_capacity,
        }
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    pub fn active(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns whether the slot holds no connection.
    pub fn is_free(&self, index: usize) -> bool {
        self.slots[index].is_none()
    }

    /// Returns the connection occupying `index`, if any.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Connection> {
        self.slots[index].as_mut()
    }

    /// Opens a new transport to `target` into the free slot `index`.
    ///
    /// The connect itself is blocking, so a success here is a connection the
    /// target really accepted; the stream then switches to non-blocking for
    /// the event loop. Every failure is contained: the slot stays free and
    /// will be retried on a later pass.
    pub fn occupy(&mut self, index: usize, target: SocketAddr, registry: &Registry) -> bool {
        debug_assert!(self.is_free(index));
        let stream = match net::TcpStream::connect(target) {
            Ok(stream) => stream,
            Err(e) => {
                debug!("connect to {} failed: {}", target, e);
                return false;
            }
        };
        if let Err(e) = stream.set_nonblocking(true) {
            warn!("[{:02}] set_nonblocking failed: {}", index, e);
            return false;
        }
        let mut stream = TcpStream::from_std(stream);
        if let Err(e) = registry.register(&mut stream, Token(index), INTERESTS) {
            warn!("[{:02}] register failed: {}", index, e);
            return false;
        }
        debug!("[{:02}] connected to {}", index, target);
        self.slots[index] = Some(Connection::new(index, stream, self.recv_capacity));
        true
    }

    /// Releases slot `index`, deregistering and dropping its stream.
    ///
    /// Releasing a free slot is a no-op.
    pub fn release(&mut self, index: usize, registry: &Registry) {
        if let Some(mut conn) = self.slots[index].take() {
            let _ = registry.deregister(conn.stream_mut());
            debug!("[{:02}] released", index);
        }
    }

    /// Re-arms readiness interest for every occupied slot and returns how
    /// many there are. Run once per pass, before the blocking wait.
    pub fn rearm(&mut self, registry: &Registry) -> usize {
        let mut active = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(conn) = slot {
                match registry.reregister(conn.stream_mut(), Token(index), INTERESTS) {
                    Ok(()) => active += 1,
                    Err(e) => {
                        warn!("[{:02}] reregister failed: {}", index, e);
                        *slot = None;
                    }
                }
            }
        }
        active
    }
}
