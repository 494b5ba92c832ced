//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

pub use parser::load_config_or_default;
pub use types::*;
pub use validate::validate_config;
