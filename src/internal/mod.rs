//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`register`]: Register bus seam and per-block register definitions
//! - [`constants`]: Retry budgets and timing constants

pub(crate) mod constants;
pub(crate) mod register;
