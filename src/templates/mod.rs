//! Built-in site templates using the Tera template engine
//!
//! Templates are embedded directly in the binary, so a site needs no theme
//! directory to render.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{BlogPost, Page};
use crate::helpers::{format_date, full_date, reading_minutes, short_date, truncate};

/// Template renderer with the embedded templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Values are escaped explicitly in the templates; rendered post HTML
        // and hrefs must pass through untouched.
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("folio/layout.html")),
            ("home.html", include_str!("folio/home.html")),
            ("blog_list.html", include_str!("folio/blog_list.html")),
            ("blog_post.html", include_str!("folio/blog_post.html")),
            ("page.html", include_str!("folio/page.html")),
            ("not_found.html", include_str!("folio/not_found.html")),
            // Partials
            ("partials/nav.html", include_str!("folio/partials/nav.html")),
            (
                "partials/footer.html",
                include_str!("folio/partials/footer.html"),
            ),
            (
                "partials/post_card.html",
                include_str!("folio/partials/post_card.html"),
            ),
            (
                "partials/badges.html",
                include_str!("folio/partials/badges.html"),
            ),
            ("partials/toc.html", include_str!("folio/partials/toc.html")),
            (
                "partials/pagination.html",
                include_str!("folio/partials/pagination.html"),
            ),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(truncate(&s, length, Some(&omission))))
}

/// Tera filter: format a post date
///
/// `format` is `long` ("March 15, 2024"), `short` ("Mar 15, 2024") or a
/// chrono format string. Unparseable dates pass through unchanged.
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "long".to_string(),
    };

    let formatted = match format.as_str() {
        "long" => full_date(&s),
        "short" => short_date(&s),
        other => format_date(&s, other),
    };
    Ok(tera::Value::String(formatted))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub feed_title: String,
    pub feed_href: String,
}

impl From<&SiteConfig> for ConfigData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            url: config.base_url().to_string(),
            feed_title: config.feed_title(),
            feed_href: format!("/{}", config.feed.path.trim_start_matches('/')),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub text: String,
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub path: String,
    pub excerpt: String,
    pub author: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub labels: Vec<String>,
    pub content: String,
    pub reading_minutes: usize,
}

impl From<&BlogPost> for PostData {
    fn from(post: &BlogPost) -> Self {
        let content = post.content_html.clone().unwrap_or_default();
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            date: post.date.clone(),
            path: post.path(),
            excerpt: post.excerpt.clone(),
            author: post.author.clone(),
            tags: post.tags.clone(),
            categories: post.categories.clone(),
            labels: post.labels.clone(),
            reading_minutes: reading_minutes(&content),
            content,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub content: String,
}

impl From<&Page> for PageData {
    fn from(page: &Page) -> Self {
        Self {
            slug: page.slug.clone(),
            title: page.title.clone(),
            description: page.description.clone(),
            content: page.content.clone(),
        }
    }
}

/// Newer / older neighbour link on a post page
#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub visible: bool,
    pub current: usize,
    pub total_pages: usize,
    pub total: usize,
    /// 1-based index of the first post shown
    pub first: usize,
    /// 1-based index of the last post shown
    pub last: usize,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub items: Vec<PageLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageLink {
    pub number: Option<usize>,
    pub href: Option<String>,
    pub current: bool,
    pub ellipsis: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterPanel {
    pub active: bool,
    pub clear_href: String,
    pub selected: Vec<FilterChip>,
    pub facets: Vec<FacetData>,
}

/// A selected filter value with a link that removes it
#[derive(Debug, Clone, Serialize)]
pub struct FilterChip {
    pub kind: &'static str,
    pub name: String,
    pub remove_href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FacetData {
    pub kind: &'static str,
    pub title: &'static str,
    pub options: Vec<FilterOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    pub name: String,
    pub count: usize,
    pub active: bool,
    /// Link that toggles this value
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogStats {
    pub total: usize,
    pub matching: usize,
    pub categories: usize,
    pub tags: usize,
    pub labels: usize,
}
