//! Core infrastructure module for gbcent-rust.
//!
//! - [`types`]: Fundamental data types and enumerations
//! - [`constants`]: Defaults and well-known parameter names
//! - [`error`]: Error type and result alias
//! - [`traits`]: Seams between the training engine and its collaborators
//! - [`utils`]: Random parameter initialization

// Public module declarations
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used items for convenience
pub use constants::*;
pub use error::{GBCentError, Result};
pub use traits::*;
pub use types::*;

/// Initialize the logging subsystem.
///
/// Defaults `RUST_LOG` to `info` when unset and ignores a logger that is
/// already installed, so calling this more than once is harmless.
pub fn initialize_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    let _ = env_logger::try_init();
}
