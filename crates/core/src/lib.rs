pub mod error;
pub mod export;
pub mod format;
pub mod geometry;
pub mod hierarchy;
pub mod layout;
pub mod loader;
pub mod model;
pub mod tessellate;

pub use error::ChartError;
pub use hierarchy::*;
pub use layout::*;
pub use model::*;

/// Shared tracing setup for the binaries; RUST_LOG selects the level.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
