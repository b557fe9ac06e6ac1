//! Helper functions shared by the loader, feed and templates

mod date;
mod html;

pub use date::*;
pub use html::*;
