//! Content loader - loads posts and pages from the content directories

use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{sort_posts, BlogPost, FrontMatter, MarkdownRenderer, Page, DEFAULT_TITLE};
use crate::blog::{add_heading_ids, extract_headings};
use crate::cache::fingerprint;
use crate::helpers::{date_prefix, strip_html, today};
use crate::Folio;

/// Loads content from the content directories
pub struct ContentLoader<'a> {
    folio: &'a Folio,
    renderer: MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(folio: &'a Folio) -> Self {
        let renderer = MarkdownRenderer::from_config(&folio.config.highlight);
        Self { folio, renderer }
    }

    /// Load all blog posts, newest first
    ///
    /// Never fails: unreadable files are logged and skipped, and a missing
    /// content directory yields no posts.
    pub fn load_posts(&self) -> Vec<BlogPost> {
        let sources = match content_sources(&self.folio.content_dir) {
            Ok(sources) => sources,
            Err(e) => {
                tracing::error!(
                    "Error reading blog posts from {:?}: {}",
                    self.folio.content_dir,
                    e
                );
                return Vec::new();
            }
        };

        let mut posts = Vec::new();
        for (slug, path) in sources {
            match self.load_post(&slug, &path) {
                Ok(Some(post)) => posts.push(post),
                Ok(None) => tracing::debug!("Skipping draft {:?}", path),
                Err(e) => tracing::warn!("Failed to load post {:?}: {}", path, e),
            }
        }

        sort_posts(&mut posts);
        warn_duplicate_slugs(&posts);

        posts
    }

    /// Load a single post; `None` for drafts that should not be rendered
    fn load_post(&self, slug: &str, path: &Path) -> Result<Option<BlogPost>> {
        let content = fs::read_to_string(path)?;
        let (fm, body) = FrontMatter::parse(&content)?;

        if fm.draft && !self.folio.config.render_drafts {
            return Ok(None);
        }

        let date = fm
            .date
            .clone()
            .or_else(|| date_prefix(slug))
            .unwrap_or_else(today);

        let (excerpt_md, full_md) = MarkdownRenderer::split_excerpt(body);

        let excerpt = match (fm.excerpt, excerpt_md) {
            (Some(excerpt), _) => excerpt,
            (None, Some(md)) => self
                .renderer
                .render(&md)
                .map(|html| strip_html(&html).trim().to_string())
                .unwrap_or_default(),
            (None, None) => String::new(),
        };

        let content_html = match self.renderer.render(&full_md) {
            Ok(html) if html.trim().is_empty() => None,
            Ok(html) => Some(add_heading_ids(&html)),
            Err(e) => {
                tracing::error!("Error processing content for {:?}: {}", path, e);
                None
            }
        };

        let mut post = BlogPost::new(slug, date);
        post.title = fm.title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
        post.excerpt = excerpt;
        post.author = fm
            .author
            .unwrap_or_else(|| self.folio.config.author.clone());
        post.tags = fm.tags;
        post.categories = fm.categories;
        post.labels = fm.labels;
        post.content = Some(body.to_string());
        post.content_html = content_html;

        Ok(Some(post))
    }

    /// Load the standalone marketing pages
    pub fn load_pages(&self) -> Vec<Page> {
        let sources = match content_sources(&self.folio.pages_dir) {
            Ok(sources) => sources,
            Err(e) => {
                tracing::debug!("No pages loaded from {:?}: {}", self.folio.pages_dir, e);
                return Vec::new();
            }
        };

        let mut pages = Vec::new();
        for (slug, path) in sources {
            match self.load_page(&slug, &path) {
                Ok(page) => pages.push(page),
                Err(e) => tracing::warn!("Failed to load page {:?}: {}", path, e),
            }
        }

        pages.sort_by(|a, b| a.slug.cmp(&b.slug));
        pages
    }

    /// Fingerprint of the post and page sources, for change detection
    pub fn fingerprint(&self) -> u64 {
        fingerprint(&[&self.folio.content_dir, &self.folio.pages_dir])
    }

    /// Load a single page from a file
    fn load_page(&self, slug: &str, path: &Path) -> Result<Page> {
        let content = fs::read_to_string(path)?;
        let (fm, body) = FrontMatter::parse(&content)?;

        let html = add_heading_ids(&self.renderer.render(body)?);
        let headings = extract_headings(&html);

        Ok(Page {
            slug: slug.to_string(),
            title: fm.title.unwrap_or_else(|| title_from_slug(slug)),
            description: fm.description.or(fm.excerpt).unwrap_or_default(),
            content: html,
            headings,
        })
    }
}

/// Find `(slug, path)` pairs one level below `dir`
///
/// Accepts `<slug>.md(x)` files and `<slug>/index.md(x)` folders. Names
/// starting with `_` or `.` are ignored.
pub fn content_sources(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {:?}", dir);
    }

    let mut sources = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            }
        };
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('_') || name.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            let index = ["index.mdx", "index.md"]
                .iter()
                .map(|f| path.join(f))
                .find(|p| p.is_file());
            if let Some(index) = index {
                sources.push((name.to_string(), index));
            }
        } else if is_markdown_file(path) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                sources.push((stem.to_string(), path.to_path_buf()));
            }
        }
    }

    Ok(sources)
}

/// Check if a file is a markdown or MDX file
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e, "md" | "mdx" | "markdown"))
        .unwrap_or(false)
}

fn warn_duplicate_slugs(posts: &[BlogPost]) {
    let mut seen = HashSet::new();
    for post in posts {
        if !seen.insert(post.slug.as_str()) {
            tracing::warn!("Duplicate post slug {:?}; lookups use the newest", post.slug);
        }
    }
}

fn title_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
