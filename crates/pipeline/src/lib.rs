//! Editor-facing workflows on top of [`godbolt_client`].
//!
//! - [`CompilePipeline`]: debounced compile-as-you-type where the newest
//!   request always wins.
//! - [`ShortlinkFlow`]: bounded-time resolution of pasted shortlinks, with a
//!   [`ShortlinkHistory`] of recently resolved links.

mod error;
mod generation;
pub mod history;
pub mod pipeline;
pub mod shortlink;

pub use error::{Error, Result};
pub use history::{HISTORY_CAPACITY, ShortlinkHistory};
pub use pipeline::{CompilePipeline, DEFAULT_DEBOUNCE, PipelineConfig};
pub use shortlink::{DEFAULT_SHORTLINK_TIMEOUT, INVALID_SHORTLINK_MESSAGE, ShortlinkFlow};
