//! Generator module - writes the static site into the public directory

use anyhow::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use std::collections::HashSet;

use crate::blog::{all_filters, FilterSelection, Pagination};
use crate::cache::{PostCache, SNAPSHOT_FILE};
use crate::content::loader::is_markdown_file;
use crate::content::{BlogPost, Page};
use crate::feed::RssFeed;
use crate::site::{facet_dir, LinkStyle, SiteRenderer, HOME_PAGE};
use crate::Folio;

/// What a generation run wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub posts: usize,
    pub pages: usize,
    pub list_pages: usize,
    /// Listing pages for single tags, categories and labels
    pub facet_pages: usize,
    pub assets: usize,
}

/// Static site generator
pub struct Generator {
    folio: Folio,
    site: SiteRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(folio: &Folio) -> Result<Self> {
        let site = SiteRenderer::new(folio.config.clone(), LinkStyle::Static)?;
        Ok(Self {
            folio: folio.clone(),
            site,
        })
    }

    /// Generate the entire site from the store's current snapshot
    pub fn generate(&self, cache: &PostCache) -> Result<GenerateSummary> {
        let public_dir = &self.folio.public_dir;
        fs::create_dir_all(public_dir)?;

        let posts = cache.posts();
        let pages = cache.pages();

        let mut summary = GenerateSummary {
            assets: self.copy_assets()?,
            ..Default::default()
        };

        self.write_page("index.html", &self.site.home(&posts, &pages)?)?;
        summary.list_pages = self.generate_blog_list(&posts)?;
        summary.facet_pages = self.generate_facet_lists(&posts)?;
        summary.posts = self.generate_post_pages(&posts)?;
        summary.pages = self.generate_page_pages(&pages)?;
        self.write_page("404.html", &self.site.not_found("/404")?)?;

        self.generate_feed(&posts)?;
        cache.save_snapshot(&public_dir.join(SNAPSHOT_FILE))?;
        tracing::info!("Generated {}", SNAPSHOT_FILE);

        Ok(summary)
    }

    /// `blog/index.html` plus `blog/page/N/index.html` for later pages
    fn generate_blog_list(&self, posts: &[BlogPost]) -> Result<usize> {
        let count = self.write_list_pages(posts, &FilterSelection::new(), "blog/")?;
        tracing::debug!("Generated {} blog list pages", count);
        Ok(count)
    }

    /// One paginated listing per tag, category and label
    fn generate_facet_lists(&self, posts: &[BlogPost]) -> Result<usize> {
        let filters = all_filters(posts);
        let selections = filters
            .categories
            .iter()
            .map(|v| FilterSelection::new().with_category_toggled(v))
            .chain(filters.tags.iter().map(|v| FilterSelection::new().with_tag_toggled(v)))
            .chain(filters.labels.iter().map(|v| FilterSelection::new().with_label_toggled(v)));

        let mut written = HashSet::new();
        let mut count = 0;
        for selection in selections {
            let Some(dir) = facet_dir(&selection) else {
                tracing::warn!("No listing for {:?}: value has no usable slug", selection);
                continue;
            };
            if !written.insert(dir.clone()) {
                tracing::warn!("Listing {} already written, skipping {:?}", dir, selection);
                continue;
            }
            count += self.write_list_pages(posts, &selection, dir.trim_start_matches('/'))?;
        }

        tracing::debug!("Generated {} facet list pages", count);
        Ok(count)
    }

    /// `<dir>index.html` plus `<dir>page/N/index.html` for later pages
    fn write_list_pages(
        &self,
        posts: &[BlogPost],
        selection: &FilterSelection,
        dir: &str,
    ) -> Result<usize> {
        let matching = selection.apply(posts).len();
        let pagination = Pagination::new(matching, self.folio.config.per_page, 1);
        let total_pages = pagination.total_pages.max(1);

        for page in 1..=total_pages {
            let html = self.site.blog_list(posts, selection, page)?;
            let path = if page == 1 {
                format!("{}index.html", dir)
            } else {
                format!("{}page/{}/index.html", dir, page)
            };
            self.write_page(&path, &html)?;
        }

        Ok(total_pages)
    }

    fn generate_post_pages(&self, posts: &[BlogPost]) -> Result<usize> {
        let mut count = 0;
        for post in posts {
            match self.site.blog_post(posts, &post.slug)? {
                Some(html) => {
                    self.write_page(&format!("blog/{}/index.html", post.slug), &html)?;
                    count += 1;
                }
                None => tracing::warn!("Skipping post without content: {}", post.slug),
            }
        }
        Ok(count)
    }

    /// One `<slug>/index.html` per marketing page; `home` lives on the index
    fn generate_page_pages(&self, pages: &[Page]) -> Result<usize> {
        let mut count = 0;
        for page in pages {
            if page.slug == HOME_PAGE {
                continue;
            }
            if page.slug == "blog" {
                tracing::warn!("Page slug 'blog' collides with the blog list, skipping");
                continue;
            }
            if let Some(html) = self.site.page(pages, &page.slug)? {
                self.write_page(&format!("{}/index.html", page.slug), &html)?;
                count += 1;
            }
        }
        Ok(count)
    }

    fn generate_feed(&self, posts: &[BlogPost]) -> Result<()> {
        let with_content: Vec<BlogPost> = posts
            .iter()
            .filter(|p| p.has_content())
            .cloned()
            .collect();
        let feed = RssFeed::build(&self.folio.config, &with_content);

        let feed_path = self.folio.config.feed.path.trim_start_matches('/');
        self.write_page(feed_path, &feed)?;
        tracing::info!("Generated {}", feed_path);
        Ok(())
    }

    fn write_page(&self, relative: &str, content: &str) -> Result<()> {
        let output_path = self.folio.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, content)?;
        Ok(())
    }

    /// Copy `static/`, post folder assets and page assets
    fn copy_assets(&self) -> Result<usize> {
        let public_dir = &self.folio.public_dir;
        let mut copied = copy_tree(&self.folio.static_dir, public_dir)?;
        copied += copy_tree(&self.folio.content_dir, &public_dir.join("blog"))?;
        copied += copy_tree(&self.folio.pages_dir, public_dir)?;
        Ok(copied)
    }
}

/// Copy non-Markdown files from `src` into `dest`, keeping relative paths
///
/// Hidden entries and those starting with `_` are skipped.
fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    if !src.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || {
                let name = e.file_name().to_string_lossy();
                !(name.starts_with('.') || name.starts_with('_'))
            }
        })
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || is_markdown_file(path) {
            continue;
        }

        let relative = path.strip_prefix(src)?;
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &target)?;
        copied += 1;
    }

    Ok(copied)
}
