pub mod configuration;
pub mod model;
pub mod runtime;
pub mod util;
pub mod views;
