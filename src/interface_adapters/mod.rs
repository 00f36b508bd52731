// Interface adapters: DTOs, level files, input sources and presentation.

pub mod input;
pub mod level;
pub mod presenter;
pub mod protocol;
pub mod utils;
