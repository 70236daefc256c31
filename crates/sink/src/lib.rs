//! Delivery of chunks to a remote knowledge base.
//!
//! This crate provides:
//! - `Sink` trait for anything that accepts one chunk submission at a time
//! - `DifySink`, an HTTP implementation for a create-by-text document API
//! - `Pusher`, which drains a chunk stream into a sink in order, with pacing
//!   and an explicit failure policy

pub mod dify;
pub mod pusher;
pub mod traits;

pub use dify::DifySink;
pub use pusher::{PushError, PushReport, Pusher};
pub use traits::{Sink, SinkError, SubmitReceipt};
