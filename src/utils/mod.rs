//! Utils Module
pub mod logging;
pub mod text;

pub use logging::init_logging;
