//! Front-end building blocks shared by the controllers.

pub mod banner;
pub mod clipboard;

pub use banner::{BannerSink, StatusBanner, Tone};
pub use clipboard::Clipboard;
