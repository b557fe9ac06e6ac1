//! Content module - handles posts, pages, and content processing

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::{parse_date_string, FrontMatter};
pub use loader::ContentLoader;
pub use markdown::{MarkdownRenderer, MORE_SEPARATOR};
pub use post::{sort_posts, BlogPost, Page, DEFAULT_TITLE};
