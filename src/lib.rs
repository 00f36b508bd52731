pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::config::{load_settings, parse_settings};
pub use frameworks::runtime::{run, run_with_config};
