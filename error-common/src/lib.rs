//! Common error handling utilities for the symptom intake workspace
//!
//! Provides the stable error codes attached to every surfaced failure, the
//! [`ErrorContext`] carried alongside logged errors, and the top-level
//! [`AppError`] used by binaries.
//!
//! # Error Categories
//!
//! - **Validation**: unparseable ages, empty symptom submissions
//! - **Configuration**: bad config files, invalid vocabulary catalogs
//! - **Voice**: synthesis and recognition failures, timeouts, exhausted retries
//! - **Collaborator**: prediction and chatbot request failures
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, log_error, AppError, ErrorContext};
//!
//! let error = AppError::ValidationError("age must be a number".into());
//! let context = ErrorContext::new().with_session_id("session-1").with_step("age");
//! log_error(codes::validation::INVALID_INPUT, &error, &context);
//! assert_eq!(error.code(), codes::validation::INVALID_INPUT);
//! ```

pub mod types;
pub mod context;
pub mod codes;

pub use types::*;
pub use context::*;
