pub use ahash;
pub use anyhow;
pub use color_eyre;
pub use once_cell;
pub use parking_lot;
pub use rand;
pub use serde;
pub use thiserror;
pub use tracing;
pub use tracing_subscriber;
pub use yaml_rust;
