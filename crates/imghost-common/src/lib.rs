//! Imghost-Common: Shared types and utilities.
//!
//! This crate provides common functionality used across imghost:
//!
//! - **Typed IDs**: String newtypes for users and images
//! - **Tokens**: Random ID and API key generation
//! - **Clock**: Epoch-millisecond helpers used by the document model
//! - **Scheduling**: [`RecurringTask`], the timer loop behind flushing and sweeping
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use imghost_common::{Error, ImageId, Result};
//!
//! let id = ImageId::generate();
//! assert_eq!(id.as_str().len(), 12);
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("image", "abc"))
//! }
//! assert!(example().is_err());
//! ```

pub mod clock;
pub mod error;
pub mod ids;
pub mod schedule;
pub mod tokens;

pub use error::{Error, Result};
pub use ids::*;
pub use schedule::RecurringTask;
