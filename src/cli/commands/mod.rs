//! CLI command implementations.

mod ask;
mod cache;
mod config;
mod process;
mod search;
mod serve;
mod videos;

pub use ask::run_ask;
pub use cache::run_cache;
pub use config::run_config;
pub use process::run_process;
pub use search::run_search;
pub use serve::run_serve;
pub use videos::{run_delete, run_info, run_list};
