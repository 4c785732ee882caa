//! Encoding and delivery of points.
//!
//! - [`encode`]: line protocol and JSON object encoders
//! - [`uploader`]: the batching [`Uploader`]
//! - [`sink`]: the [`Sink`] seam and its blocking HTTP implementation

pub mod encode;
pub mod sink;
pub mod uploader;

pub use encode::{Encoded, encode, to_line_protocol, to_object};
pub use sink::{Batch, HttpSink, Sink};
pub use uploader::{UploadStats, Uploader};
