//! CLI command implementations.

mod ask;
mod build;
mod config;
mod init;
mod search;
mod serve;
mod status;

pub use ask::run_ask;
pub use build::run_build;
pub use config::run_config;
pub use init::run_init;
pub use search::run_search;
pub use serve::run_serve;
pub use status::run_status;
