pub mod config;
pub mod error;
pub mod policy;
pub mod progress;
pub mod record;

pub use config::{Config, SinkConfig};
pub use error::*;
pub use policy::FailurePolicy;
pub use progress::{NullObserver, Observer, ProgressEvent, TracingObserver};
pub use record::*;
