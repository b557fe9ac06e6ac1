//! Blog post and page models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::frontmatter::parse_date_string;
use crate::blog::Heading;

/// Title used when front-matter has none
pub const DEFAULT_TITLE: &str = "Untitled";

/// A blog post record
///
/// Serialized with camelCase keys; this is the shape of `posts.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    /// URL-safe identifier from the file stem or folder name
    pub slug: String,

    pub title: String,

    /// ISO date string as written in front-matter
    pub date: String,

    pub excerpt: String,

    pub author: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub labels: Vec<String>,

    /// Raw markdown body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Rendered HTML; `None` when rendering failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
}

impl BlogPost {
    /// Create a post with defaults for everything but slug and date
    pub fn new(slug: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: DEFAULT_TITLE.to_string(),
            date: date.into(),
            excerpt: String::new(),
            author: String::new(),
            tags: Vec::new(),
            categories: Vec::new(),
            labels: Vec::new(),
            content: None,
            content_html: None,
        }
    }

    /// Parsed publication date, if the date string is understood
    pub fn published(&self) -> Option<NaiveDateTime> {
        parse_date_string(&self.date)
    }

    /// Whether the post rendered to non-empty HTML
    pub fn has_content(&self) -> bool {
        self.content_html
            .as_deref()
            .is_some_and(|html| !html.trim().is_empty())
    }

    /// Whether the post has any tag, category or label
    pub fn has_taxonomy(&self) -> bool {
        !(self.tags.is_empty() && self.categories.is_empty() && self.labels.is_empty())
    }

    /// Site path of the post
    pub fn path(&self) -> String {
        format!("/blog/{}", self.slug)
    }

    /// Nearest newer post with content, in a list sorted newest first
    pub fn newer<'a>(&self, posts: &'a [BlogPost]) -> Option<&'a BlogPost> {
        let pos = posts.iter().position(|p| p.slug == self.slug)?;
        posts[..pos].iter().rev().find(|p| p.has_content())
    }

    /// Nearest older post with content, in a list sorted newest first
    pub fn older<'a>(&self, posts: &'a [BlogPost]) -> Option<&'a BlogPost> {
        let pos = posts.iter().position(|p| p.slug == self.slug)?;
        posts[pos + 1..].iter().find(|p| p.has_content())
    }
}

/// Sort posts newest first
///
/// Unparseable dates sort last; equal dates fall back to slug order.
pub fn sort_posts(posts: &mut [BlogPost]) {
    posts.sort_by(|a, b| {
        b.published()
            .cmp(&a.published())
            .then_with(|| a.slug.cmp(&b.slug))
    });
}

/// A standalone marketing page (home, projects, experience, contact, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub slug: String,
    pub title: String,
    pub description: String,
    /// Rendered HTML content
    pub content: String,
    pub headings: Vec<Heading>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str, date: &str) -> BlogPost {
        BlogPost::new(slug, date)
    }

    #[test]
    fn test_defaults() {
        let p = post("hello", "2024-01-01");
        assert_eq!(p.title, "Untitled");
        assert!(p.excerpt.is_empty());
        assert!(!p.has_taxonomy());
        assert_eq!(p.path(), "/blog/hello");
    }

    #[test]
    fn test_sort_descending_by_date() {
        let mut posts = vec![
            post("old", "2023-05-01"),
            post("new", "2025-10-14"),
            post("mid", "2024-03-15T08:00:00"),
            post("broken", "someday"),
        ];
        sort_posts(&mut posts);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "mid", "old", "broken"]);
    }

    #[test]
    fn test_sort_ties_by_slug() {
        let mut posts = vec![post("b", "2024-01-01"), post("a", "2024-01-01")];
        sort_posts(&mut posts);
        assert_eq!(posts[0].slug, "a");
    }

    fn rendered(slug: &str, date: &str) -> BlogPost {
        let mut p = post(slug, date);
        p.content_html = Some(format!("<p>{}</p>", slug));
        p
    }

    #[test]
    fn test_neighbours() {
        let posts = vec![
            rendered("c", "2024-03-01"),
            rendered("b", "2024-02-01"),
            rendered("a", "2024-01-01"),
        ];
        assert_eq!(posts[1].newer(&posts).map(|p| p.slug.as_str()), Some("c"));
        assert_eq!(posts[1].older(&posts).map(|p| p.slug.as_str()), Some("a"));
        assert!(posts[0].newer(&posts).is_none());
        assert!(posts[2].older(&posts).is_none());
    }

    #[test]
    fn test_neighbours_skip_posts_without_content() {
        let posts = vec![
            rendered("d", "2024-04-01"),
            post("c", "2024-03-01"),
            rendered("b", "2024-02-01"),
            post("a", "2024-01-01"),
        ];
        assert_eq!(posts[2].newer(&posts).map(|p| p.slug.as_str()), Some("d"));
        assert!(posts[2].older(&posts).is_none());
    }

    #[test]
    fn test_has_content() {
        let mut p = post("stub", "2024-01-01");
        assert!(!p.has_content());
        p.content_html = Some(" \n".to_string());
        assert!(!p.has_content());
        p.content_html = Some("<p>x</p>".to_string());
        assert!(p.has_content());
    }

    #[test]
    fn test_json_shape() {
        let mut p = post("hello", "2024-01-01");
        p.content_html = Some("<p>hi</p>".to_string());
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["contentHtml"], "<p>hi</p>");
        assert!(json.get("content").is_none());

        let back: BlogPost = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
