//! Logging bootstrap with automatic PII redaction for patient transcripts
//!
//! Spoken answers collected during intake can contain phone numbers, e-mail
//! addresses or national ID numbers. Anything the engine logs about a
//! transcript goes through [`redact_transcript`] first.
//!
//! # Detected Data Types
//!
//! - **Email Addresses**: `jane@example.com` → `EMAIL[hash]`
//! - **Phone Numbers**: `0712 345 678`, `+254712345678` → `PHONE[hash]`
//! - **National IDs**: seven or eight digit runs → `ID[hash]`
//! - **IP Addresses**: `192.168.1.1` → `IP[hash]`
//!
//! Hashes are the first eight bytes of a SHA-256 digest, base64 encoded, so
//! redacted values can still be correlated across log lines.
//!
//! # Example
//!
//! ```rust,no_run
//! use logger_redacted::{init_tracing, redact_transcript, LoggerConfig};
//!
//! init_tracing(&LoggerConfig::default().verbose(true))?;
//! tracing::info!(transcript = %redact_transcript("my number is 0712 345 678"), "heard");
//! # Ok::<(), logger_redacted::LoggerError>(())
//! ```

pub mod config;
pub mod init;
pub mod redactor;

pub use config::*;
pub use init::*;
pub use redactor::*;
