//! Event loop driving all probe connections over one thread.
//!
//! One pass: top up free slots with fresh connections, rebuild the readiness
//! interest set, block on the poller until something fires, then dispatch
//! hang-ups, reads, and writes into the per-connection state machines. The
//! loop ends when no connection is active — which, against a live target,
//! only happens once it stops accepting new ones.
//!
//! The blocking wait is the only place the engine parks; every stream
//! operation is non-blocking, so one slow peer never stalls the rest. There
//! are no per-connection timeouts: a peer that goes quiet keeps its slot,
//! and keeping the target's handshake slots occupied is exactly the point.
//!
//! # Example
//!
//! ```rust,no_run
//! use kexhold_proto::ssh::engine::{Engine, ProbeConfig};
//!
//! # fn main() -> kexhold_platform::KexholdResult<()> {
//! let mut engine = Engine::new(ProbeConfig::new().with_max_concurrency(64))?;
//! let opened = engine.run("192.0.2.1:22".parse().unwrap())?;
//! println!("opened {} connections", opened);
//! # Ok(())
//! # }
//! ```

use std::io;
use std::net::SocketAddr;

use kexhold_platform::KexholdResult;
use mio::{Events, Poll, Token};
use tracing::{debug, info};

use crate::ssh::conn::Disposition;
use crate::ssh::kex::KexInit;
use crate::ssh::pool::Pool;
use crate::ssh::version;

/// Default maximum number of simultaneous connections.
pub const DEFAULT_MAX_CONCURRENCY: usize = 128;

/// Default per-connection receive buffer capacity in bytes.
pub const DEFAULT_RECV_CAPACITY: usize = 2048;

/// Probe configuration.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Maximum number of simultaneous connections.
    pub max_concurrency: usize,
    /// Per-connection receive buffer capacity in bytes.
    pub recv_capacity: usize,
    /// Identification line sent to every peer, CRLF included.
    pub banner: String,
}

impl ProbeConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of simultaneous connections.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Sets the per-connection receive buffer capacity.
    pub fn with_recv_capacity(mut self, capacity: usize) -> Self {
        self.recv_capacity = capacity;
        self
    }

    /// Overrides the outbound identification line.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            recv_capacity: DEFAULT_RECV_CAPACITY,
            banner: version::BANNER.to_string(),
        }
    }
}

/// The probe engine: poller, event buffer, pool, and the two outbound
/// messages every connection replays.
#[derive(Debug)]
pub struct Engine {
    poll: Poll,
    events: Events,
    pool: Pool,
    banner: Vec<u8>,
    kexinit: Vec<u8>,
}

impl Engine {
    /// Creates an engine for the given configuration.
    ///
    /// The KEXINIT packet is built here, once; connections replay it
    /// verbatim for as long as the run lasts.
    ///
    /// # Errors
    ///
    /// Returns [`kexhold_platform::KexholdError::Io`] if the readiness
    /// poller cannot be created.
    pub fn new(config: ProbeConfig) -> KexholdResult<Self> {
        let poll = Poll::new()?;
        let events = Events::with_capacity(config.max_concurrency.max(1));
        let pool = Pool::new(config.max_concurrency, config.recv_capacity);
        Ok(Self {
            poll,
            events,
            pool,
            banner: config.banner.into_bytes(),
            kexinit: KexInit::new_default().to_packet(),
        })
    }

    /// Probes `target` until no connection remains active.
    ///
    /// Returns the number of connections successfully opened during the run;
    /// the caller uses it to decide whether to try an alternate resolved
    /// address.
    ///
    /// # Errors
    ///
    /// Only a poller failure other than an interrupted wait is fatal; every
    /// per-connection failure is contained by releasing its slot.
    pub fn run(&mut self, target: SocketAddr) -> KexholdResult<usize> {
        let mut opened = 0usize;
        loop {
            // top up free slots while the target keeps accepting
            for index in 0..self.pool.capacity() {
                if self.pool.is_free(index) && self.pool.occupy(index, target, self.poll.registry())
                {
                    opened += 1;
                }
            }

            let active = self.pool.rearm(self.poll.registry());
            if active == 0 {
                break;
            }
            debug!("polling {}/{} connections", active, opened);

            if let Err(e) = self.poll.poll(&mut self.events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            for event in self.events.iter() {
                let Token(index) = event.token();
                if self.pool.is_free(index) {
                    continue;
                }
                if event.is_error() || (event.is_read_closed() && event.is_write_closed()) {
                    info!("[{:02}] connection closed", index);
                    self.pool.release(index, self.poll.registry());
                    continue;
                }
                if event.is_readable() {
                    let disposition = self.pool.get_mut(index).map(|conn| conn.on_readable());
                    if disposition == Some(Disposition::Close) {
                        self.pool.release(index, self.poll.registry());
                        continue;
                    }
                }
                if event.is_writable() {
                    let disposition = self
                        .pool
                        .get_mut(index)
                        .map(|conn| conn.on_writable(&self.banner, &self.kexinit));
                    if disposition == Some(Disposition::Close) {
                        self.pool.release(index, self.poll.registry());
                    }
                }
            }
        }
        Ok(opened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert_eq!(config.recv_capacity, DEFAULT_RECV_CAPACITY);
        assert_eq!(config.banner, version::BANNER);
    }

    #[test]
    fn test_config_builder() {
        let config = ProbeConfig::new()
            .with_max_concurrency(3)
            .with_recv_capacity(512)
            .with_banner("SSH-2.0-test\r\n");
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.recv_capacity, 512);
        assert_eq!(config.banner, "SSH-2.0-test\r\n");
    }

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new(ProbeConfig::new().with_max_concurrency(2)).unwrap();
        assert_eq!(engine.kexinit[5], 20);
        assert!(engine.banner.starts_with(b"SSH-2.0-"));
    }
}
