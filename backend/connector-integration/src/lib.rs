pub mod configs;
pub mod connectors;
mod default_implementations;
pub mod logger;
pub mod types;
pub mod utils;
