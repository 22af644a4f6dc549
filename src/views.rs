pub mod html_view;
pub mod page_view;
pub mod snapshot_view;
pub mod text_view;
