//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration problems that make the site unbuildable
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("per_page must be greater than zero")]
    ZeroPerPage,
    #[error("url must start with http:// or https://, got {0:?}")]
    InvalidUrl(String),
    #[error("feed path must not be empty")]
    EmptyFeedPath,
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    /// Fallback author for posts without one
    pub author: String,
    pub language: String,

    // URL
    pub url: String,

    // Directory
    pub content_dir: String,
    pub pages_dir: String,
    pub static_dir: String,
    pub public_dir: String,

    // Writing
    pub render_drafts: bool,

    // Blog list
    pub per_page: usize,
    /// Number of posts shown on the home page
    pub latest_posts: usize,

    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub katex: KatexConfig,

    // Chrome
    #[serde(default)]
    pub nav: Vec<NavLink>,
    #[serde(default)]
    pub social: Vec<NavLink>,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Portfolio".to_string(),
            subtitle: String::new(),
            description: "Thoughts on technology, development, and more.".to_string(),
            author: "Anonymous".to_string(),
            language: "en-us".to_string(),

            url: "http://example.com".to_string(),

            content_dir: "content/blog".to_string(),
            pages_dir: "content/pages".to_string(),
            static_dir: "static".to_string(),
            public_dir: "public".to_string(),

            render_drafts: false,

            per_page: 10,
            latest_posts: 2,

            feed: FeedConfig::default(),
            highlight: HighlightConfig::default(),
            katex: KatexConfig::default(),

            nav: default_nav(),
            social: Vec::new(),

            extra: HashMap::new(),
        }
    }
}

fn default_nav() -> Vec<NavLink> {
    [
        ("Home", "/"),
        ("Projects", "/projects"),
        ("Experience", "/experience"),
        ("Blog", "/blog"),
        ("Contact", "/contact"),
    ]
    .into_iter()
    .map(|(text, href)| NavLink::new(text, href))
    .collect()
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Check values the rest of the site relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_page == 0 {
            return Err(ConfigError::ZeroPerPage);
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.url.clone()));
        }
        if self.feed.path.trim().is_empty() {
            return Err(ConfigError::EmptyFeedPath);
        }
        Ok(())
    }

    /// Site URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Absolute URL for a site path
    pub fn full_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Feed title, defaulting to "<title> - Blog"
    pub fn feed_title(&self) -> String {
        self.feed
            .title
            .clone()
            .unwrap_or_else(|| format!("{} - Blog", self.title))
    }
}

/// A navigation or social link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NavLink {
    pub text: String,
    pub href: String,
}

impl NavLink {
    pub fn new(text: &str, href: &str) -> Self {
        Self {
            text: text.to_string(),
            href: href.to_string(),
        }
    }

    /// Whether this link points at `path` or one of its children
    pub fn is_active(&self, path: &str) -> bool {
        let href = self.href.trim_end_matches('/');
        let path = path.trim_end_matches('/');
        if href.is_empty() {
            return path.is_empty();
        }
        path == href || path.starts_with(&format!("{}/", href))
    }
}

/// RSS feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub path: String,
    pub title: Option<String>,
    /// Maximum number of items; all posts when unset
    pub limit: Option<usize>,
    /// Embed the rendered article as content:encoded
    pub full_content: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: "rss.xml".to_string(),
            title: None,
            limit: None,
            full_content: true,
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// KaTeX asset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KatexConfig {
    pub enable: bool,
    pub version: String,
    pub cdn: String,
}

impl Default for KatexConfig {
    fn default() -> Self {
        Self {
            enable: true,
            version: "0.16.25".to_string(),
            cdn: "https://cdn.jsdelivr.net/npm".to_string(),
        }
    }
}

impl KatexConfig {
    /// Base URL of the versioned KaTeX distribution
    pub fn dist_url(&self) -> String {
        format!(
            "{}/katex@{}/dist",
            self.cdn.trim_end_matches('/'),
            self.version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.per_page, 10);
        assert_eq!(config.content_dir, "content/blog");
        assert_eq!(config.feed.path, "rss.xml");
        assert_eq!(config.nav.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Jane Doe
author: Jane Doe
url: https://jane.example.com/
per_page: 8
feed:
  limit: 20
nav:
  - text: Home
    href: /
  - text: Blog
    href: /blog
social:
  - text: Github
    href: https://github.com/jane
github_username: jane
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Jane Doe");
        assert_eq!(config.per_page, 8);
        assert_eq!(config.feed.limit, Some(20));
        assert_eq!(config.feed.path, "rss.xml");
        assert_eq!(config.nav.len(), 2);
        assert_eq!(config.social[0].text, "Github");
        assert!(config.extra.contains_key("github_username"));
        assert_eq!(config.full_url("/blog/x"), "https://jane.example.com/blog/x");
        assert_eq!(config.feed_title(), "Jane Doe - Blog");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SiteConfig::default();
        config.per_page = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPerPage));

        let mut config = SiteConfig::default();
        config.url = "example.com".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl(_))
        ));

        let mut config = SiteConfig::default();
        config.feed.path = " ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyFeedPath));
    }

    #[test]
    fn test_nav_active() {
        let blog = NavLink::new("Blog", "/blog");
        assert!(blog.is_active("/blog"));
        assert!(blog.is_active("/blog/hello/"));
        assert!(!blog.is_active("/blogroll"));

        let home = NavLink::new("Home", "/");
        assert!(home.is_active("/"));
        assert!(!home.is_active("/blog"));
    }

    #[test]
    fn test_katex_dist_url() {
        let katex = KatexConfig::default();
        assert_eq!(
            katex.dist_url(),
            "https://cdn.jsdelivr.net/npm/katex@0.16.25/dist"
        );
    }
}
