// Frameworks layer: environment configuration and the runtime bootstrap.

pub mod config;
pub mod runtime;
