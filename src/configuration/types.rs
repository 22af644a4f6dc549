pub mod config_time_zone;
pub mod feed_format;
