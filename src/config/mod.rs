//! Configuration module

mod site;

pub use site::ConfigError;
pub use site::FeedConfig;
pub use site::HighlightConfig;
pub use site::KatexConfig;
pub use site::NavLink;
pub use site::SiteConfig;
