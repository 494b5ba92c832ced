//! The mention-processing pipeline.
//!
//! ## Module Structure
//!
//! - `extractor`: finds registration numbers and search commands in text
//! - `formatter`: renders lookup outcomes into reply text
//! - `source`: the `MentionSource` seam and the fixture replay source
//! - `watermark`: the processed-up-to timestamp
//! - `dispatcher`: the polling loop tying it all together

pub mod dispatcher;
pub mod extractor;
pub mod formatter;
pub mod source;
pub mod watermark;

pub use dispatcher::{DispatchSettings, Dispatcher};
pub use formatter::ReplyFormatter;
pub use source::{FixtureSource, MentionSource};
pub use watermark::Watermark;
