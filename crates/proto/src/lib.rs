//! Protocol engine for the kexhold probe.
//!
//! kexhold opens a bounded number of concurrent connections against an SSH
//! server and walks each one through the pre-authentication handshake just
//! far enough to exchange identification banners and a key-exchange
//! initialization message. No key exchange is ever completed; the probe's
//! job is to hold as many half-open handshakes as the target will allow,
//! exercising its handshake-state accounting.
//!
//! # Example
//!
//! ```rust,no_run
//! use kexhold_proto::ssh::engine::{Engine, ProbeConfig};
//!
//! # fn main() -> kexhold_platform::KexholdResult<()> {
//! let config = ProbeConfig::new().with_max_concurrency(64);
//! let mut engine = Engine::new(config)?;
//! let opened = engine.run("192.0.2.1:22".parse().unwrap())?;
//! println!("opened {} connections", opened);
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - [RFC 4253](https://datatracker.ietf.org/doc/html/rfc4253) - SSH Transport Layer Protocol

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod ssh;
