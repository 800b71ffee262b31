//! SSH identification banner constants (RFC 4253 Section 4.2).
//!
//! The SSH protocol begins with a version exchange where both client and server
//! send an identification string:
//!
//! ```text
//! SSH-protoversion-softwareversion SP comments CR LF
//! ```
//!
//! The probe only needs two things from this exchange: to validate that the
//! peer's line identifies protocol version 2.0, and to answer with a fixed
//! identification line of its own. The incremental recognition of the peer's
//! line lives in [`crate::ssh::codec`]; this module holds the constants.
//!
//! # Security
//!
//! - Maximum line length: 255 characters (DoS prevention)
//! - The peer's line must start with "SSH-2.0-"

/// Maximum length of the banner line before its CRLF terminator (RFC 4253
/// Section 4.2).
pub const MAX_BANNER_LEN: usize = 255;

/// Identification prefix required of the peer (protocol version 2.0).
pub const BANNER_PREFIX: &[u8; 8] = b"SSH-2.0-";

/// Our outbound identification line, CRLF included.
///
/// Transmitted in full exactly once per connection, immediately after the
/// peer's banner has been validated.
///
/// # Example
///
/// ```rust
/// use kexhold_proto::ssh::version::BANNER;
///
/// assert!(BANNER.starts_with("SSH-2.0-kexhold_"));
/// assert!(BANNER.ends_with("\r\n"));
/// ```
pub const BANNER: &str = concat!("SSH-2.0-kexhold_", env!("CARGO_PKG_VERSION"), "\r\n");
