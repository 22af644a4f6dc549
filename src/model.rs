pub mod clock;
pub mod description;
pub mod event;
pub mod feed_source;
pub mod pages;
pub mod pipeline;
pub mod ranking;
pub mod rotation;
pub mod signage;
pub mod snapshot;
pub mod window;
