//! # kexhold Platform
//!
//! Core platform types for the kexhold probe.
//!
//! This crate provides the unified error type (`KexholdError`, `KexholdResult`)
//! shared by the protocol engine and the command line interface.
//!
//! # Examples
//!
//! ```
//! use kexhold_platform::{KexholdError, KexholdResult};
//!
//! fn example_function() -> KexholdResult<String> {
//!     Ok("Hello, kexhold!".to_string())
//! }
//!
//! # fn main() -> KexholdResult<()> {
//! let result = example_function()?;
//! assert_eq!(result, "Hello, kexhold!");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod error;

pub use error::{KexholdError, KexholdResult};

/// Platform version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
