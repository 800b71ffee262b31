//! SSH pre-authentication transport probing.
//!
//! The probe drives the first steps of RFC 4253 — identification exchange
//! and SSH_MSG_KEXINIT — and then deliberately stops, holding the
//! half-negotiated session open. The modules layer leaf-first:
//!
//! 1. **Constants and messages** ([`version`], [`message`], [`kex`]) - what
//!    goes on the wire
//! 2. **Buffering and framing** ([`buffer`], [`codec`]) - carving banner and
//!    packet frames out of an arbitrarily chunked inbound stream
//! 3. **Connection state machine** ([`conn`]) - one peer's handshake stage
//! 4. **Pool and engine** ([`pool`], [`engine`]) - the fixed connection
//!    table and the single-threaded readiness loop that drives it
//!
//! # Example
//!
//! ```rust,no_run
//! use kexhold_proto::ssh::engine::{Engine, ProbeConfig};
//!
//! # fn main() -> kexhold_platform::KexholdResult<()> {
//! let mut engine = Engine::new(ProbeConfig::new())?;
//! let opened = engine.run("192.0.2.1:22".parse().unwrap())?;
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - [RFC 4253](https://datatracker.ietf.org/doc/html/rfc4253) - SSH Transport Layer Protocol

pub mod buffer;
pub mod codec;
pub mod conn;
pub mod engine;
pub mod kex;
pub mod message;
pub mod pool;
pub mod version;

// Re-export main types
pub use buffer::RecvBuffer;
pub use codec::{decode_banner, decode_packet, Decode, PacketHead};
pub use conn::{Connection, Disposition, Stage};
pub use engine::{Engine, ProbeConfig};
pub use kex::KexInit;
pub use message::MessageType;
pub use pool::Pool;
