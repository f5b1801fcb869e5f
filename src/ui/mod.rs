pub mod app;
pub mod picture;
