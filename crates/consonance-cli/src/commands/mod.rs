pub mod config;
pub mod index;
pub mod remap;
pub mod search;
pub mod status;

pub use config::{config_init, config_path, config_show};
pub use index::run_index;
pub use remap::{remap_set, remap_show, remap_try};
pub use search::run_search;
pub use status::show_status;
