//! Route rendering shared by the generator and the server

use anyhow::Result;
use chrono::{Datelike, Local};
use tera::Context;

use crate::blog::{
    all_filters, extract_headings, filter_counts, number_headings, BlogQuery, FilterSelection,
    PageItem, Pagination,
};
use crate::config::SiteConfig;
use crate::content::{BlogPost, Page};
use crate::katex::inject_katex;
use crate::templates::{
    BlogStats, ConfigData, FacetData, FilterChip, FilterOption, FilterPanel, NavItem, NavPost,
    PageData, PageLink, PaginationData, PostData, TemplateRenderer,
};

/// Slug of the page whose content is shown on the home page
pub const HOME_PAGE: &str = "home";

/// How blog list links are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    /// `/blog?page=2`, understood by the server
    Query,
    /// `/blog/page/2/` for unfiltered pages, as written by the generator
    Static,
}

/// Renders every route of the site to HTML
pub struct SiteRenderer {
    config: SiteConfig,
    templates: TemplateRenderer,
    link_style: LinkStyle,
}

impl SiteRenderer {
    pub fn new(config: SiteConfig, link_style: LinkStyle) -> Result<Self> {
        Ok(Self {
            config,
            templates: TemplateRenderer::new()?,
            link_style,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Home page: hero, optional `home` page content and the latest posts
    pub fn home(&self, posts: &[BlogPost], pages: &[Page]) -> Result<String> {
        let mut context = self.base_context("/");

        let latest: Vec<PostData> = posts
            .iter()
            .take(self.config.latest_posts)
            .map(PostData::from)
            .collect();
        context.insert("posts", &latest);
        context.insert(
            "page",
            &pages
                .iter()
                .find(|p| p.slug == HOME_PAGE)
                .map(PageData::from),
        );

        self.render("home.html", &context)
    }

    /// Blog list filtered by `selection`, showing `page` (out of range → 1)
    pub fn blog_list(
        &self,
        posts: &[BlogPost],
        selection: &FilterSelection,
        page: usize,
    ) -> Result<String> {
        let mut context = self.base_context("/blog");

        let filtered = selection.apply(posts);
        let pagination = Pagination::new(filtered.len(), self.config.per_page, page).clamped();
        let shown: Vec<PostData> = pagination
            .slice(filtered.as_slice())
            .iter()
            .map(|post| PostData::from(*post))
            .collect();

        let filters = all_filters(posts);
        let stats = BlogStats {
            total: posts.len(),
            matching: filtered.len(),
            categories: filters.categories.len(),
            tags: filters.tags.len(),
            labels: filters.labels.len(),
        };

        context.insert("shown", &shown.len());
        context.insert("posts", &shown);
        context.insert("stats", &stats);
        context.insert("filters", &self.filter_panel(posts, selection));
        context.insert("pagination", &self.pagination_data(&pagination, selection));

        self.render("blog_list.html", &context)
    }

    /// A single post; `None` when no post with content has this slug
    pub fn blog_post(&self, posts: &[BlogPost], slug: &str) -> Result<Option<String>> {
        let Some(post) = posts
            .iter()
            .find(|p| p.slug == slug && p.has_content())
        else {
            return Ok(None);
        };

        let mut context = self.base_context(&post.path());
        let data = PostData::from(post);
        context.insert("toc", &number_headings(&extract_headings(&data.content)));
        context.insert("post", &data);
        context.insert("newer", &post.newer(posts).map(nav_post));
        context.insert("older", &post.older(posts).map(nav_post));

        self.render("blog_post.html", &context).map(Some)
    }

    /// A marketing page; `None` for an unknown slug
    pub fn page(&self, pages: &[Page], slug: &str) -> Result<Option<String>> {
        let Some(page) = pages.iter().find(|p| p.slug == slug) else {
            return Ok(None);
        };

        let mut context = self.base_context(&format!("/{}", page.slug));
        context.insert("page", &PageData::from(page));
        context.insert("toc", &number_headings(&page.headings));

        self.render("page.html", &context).map(Some)
    }

    /// 404 page
    pub fn not_found(&self, path: &str) -> Result<String> {
        let mut context = self.base_context(path);
        context.insert("path", path);
        self.render("not_found.html", &context)
    }

    /// Link to the blog list for a selection and page
    ///
    /// Static links point at the generated listing directories; a selection
    /// with several values has no directory and stays query based.
    pub fn blog_href(&self, selection: &FilterSelection, page: usize) -> String {
        if self.link_style == LinkStyle::Static {
            let dir = if selection.is_active() {
                facet_dir(selection)
            } else {
                Some("/blog/".to_string())
            };
            if let Some(dir) = dir {
                if page > 1 {
                    return format!("{}page/{}/", dir, page);
                }
                if selection.is_active() {
                    return dir;
                }
            }
        }
        BlogQuery::href(selection, page)
    }

    /// Link that toggles one value; static listings hold one value at a time
    fn toggle_href(&self, toggled: FilterSelection, only: FilterSelection) -> String {
        if self.link_style == LinkStyle::Static && facet_count(&toggled) > 1 {
            self.blog_href(&only, 1)
        } else {
            self.blog_href(&toggled, 1)
        }
    }

    fn render(&self, template: &str, context: &Context) -> Result<String> {
        let html = self.templates.render(template, context)?;
        Ok(inject_katex(&html, &self.config.katex))
    }

    fn base_context(&self, path: &str) -> Context {
        let nav: Vec<NavItem> = self
            .config
            .nav
            .iter()
            .map(|link| NavItem {
                text: link.text.clone(),
                href: link.href.clone(),
                active: link.is_active(path),
            })
            .collect();
        let social: Vec<NavItem> = self
            .config
            .social
            .iter()
            .map(|link| NavItem {
                text: link.text.clone(),
                href: link.href.clone(),
                active: false,
            })
            .collect();

        let mut context = Context::new();
        context.insert("config", &ConfigData::from(&self.config));
        context.insert("nav", &nav);
        context.insert("social", &social);
        context.insert("year", &Local::now().year());
        context.insert("current_path", path);
        context
    }

    fn filter_panel(&self, posts: &[BlogPost], selection: &FilterSelection) -> FilterPanel {
        let counts = filter_counts(posts);

        let mut selected = Vec::new();
        for category in &selection.categories {
            selected.push(FilterChip {
                kind: "category",
                name: category.clone(),
                remove_href: self.blog_href(&selection.with_category_toggled(category), 1),
            });
        }
        for tag in &selection.tags {
            selected.push(FilterChip {
                kind: "tag",
                name: tag.clone(),
                remove_href: self.blog_href(&selection.with_tag_toggled(tag), 1),
            });
        }
        for label in &selection.labels {
            selected.push(FilterChip {
                kind: "label",
                name: label.clone(),
                remove_href: self.blog_href(&selection.with_label_toggled(label), 1),
            });
        }

        let facets = vec![
            FacetData {
                kind: "category",
                title: "Categories",
                options: counts
                    .categories
                    .iter()
                    .map(|(name, count)| FilterOption {
                        name: name.clone(),
                        count: *count,
                        active: selection.categories.contains(name),
                        href: self.toggle_href(
                            selection.with_category_toggled(name),
                            FilterSelection::new().with_category_toggled(name),
                        ),
                    })
                    .collect(),
            },
            FacetData {
                kind: "tag",
                title: "Tags",
                options: counts
                    .tags
                    .iter()
                    .map(|(name, count)| FilterOption {
                        name: name.clone(),
                        count: *count,
                        active: selection.tags.contains(name),
                        href: self.toggle_href(
                            selection.with_tag_toggled(name),
                            FilterSelection::new().with_tag_toggled(name),
                        ),
                    })
                    .collect(),
            },
            FacetData {
                kind: "label",
                title: "Labels",
                options: counts
                    .labels
                    .iter()
                    .map(|(name, count)| FilterOption {
                        name: name.clone(),
                        count: *count,
                        active: selection.labels.contains(name),
                        href: self.toggle_href(
                            selection.with_label_toggled(name),
                            FilterSelection::new().with_label_toggled(name),
                        ),
                    })
                    .collect(),
            },
        ];

        FilterPanel {
            active: selection.is_active(),
            clear_href: self.blog_href(&FilterSelection::new(), 1),
            selected,
            facets,
        }
    }

    fn pagination_data(&self, pagination: &Pagination, selection: &FilterSelection) -> PaginationData {
        let (first, last) = pagination.showing();
        let items = pagination
            .page_numbers()
            .into_iter()
            .map(|item| match item {
                PageItem::Page(number) => PageLink {
                    number: Some(number),
                    href: Some(self.blog_href(selection, number)),
                    current: number == pagination.current,
                    ellipsis: false,
                },
                PageItem::Ellipsis => PageLink {
                    number: None,
                    href: None,
                    current: false,
                    ellipsis: true,
                },
            })
            .collect();

        PaginationData {
            visible: pagination.is_visible(),
            current: pagination.current,
            total_pages: pagination.total_pages,
            total: pagination.total,
            first,
            last,
            prev_href: pagination
                .has_prev()
                .then(|| self.blog_href(selection, pagination.current - 1)),
            next_href: pagination
                .has_next()
                .then(|| self.blog_href(selection, pagination.current + 1)),
            items,
        }
    }
}

/// Output directory of the static listing for a single-value selection
///
/// `/blog/tags/<slug>/`, `/blog/categories/<slug>/` or `/blog/labels/<slug>/`;
/// `None` unless exactly one value is selected and it slugifies.
pub fn facet_dir(selection: &FilterSelection) -> Option<String> {
    if facet_count(selection) != 1 {
        return None;
    }
    let (facet, value) = selection
        .categories
        .iter()
        .map(|v| ("categories", v))
        .chain(selection.tags.iter().map(|v| ("tags", v)))
        .chain(selection.labels.iter().map(|v| ("labels", v)))
        .next()?;

    let value_slug = slug::slugify(value);
    if value_slug.is_empty() {
        return None;
    }
    Some(format!("/blog/{}/{}/", facet, value_slug))
}

fn facet_count(selection: &FilterSelection) -> usize {
    selection.categories.len() + selection.tags.len() + selection.labels.len()
}

fn nav_post(post: &BlogPost) -> NavPost {
    NavPost {
        title: post.title.clone(),
        path: post.path(),
    }
}
