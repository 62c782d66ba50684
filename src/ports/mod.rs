//! Port traits the domain depends on; adapters implement them.

pub mod config_port;
pub mod indicator_port;
pub mod prediction_port;
pub mod price_port;
