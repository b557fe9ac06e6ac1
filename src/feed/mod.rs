//! RSS 2.0 feed generation

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::content::BlogPost;
use crate::helpers::{full_date, rfc2822};

/// Content type served for the feed
pub const CONTENT_TYPE: &str = "application/xml";

/// Cache policy served for the feed
pub const CACHE_CONTROL: &str = "public, s-maxage=1200, stale-while-revalidate=600";

/// Escape XML special characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Reverse of `escape_xml`
pub fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Strip invalid XML control characters (except tab, newline, carriage return)
/// XML 1.0 only allows: #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

/// Wrap text in CDATA; an embedded `]]>` is split across two sections
fn cdata(s: &str) -> String {
    format!("<![CDATA[{}]]>", s.replace("]]>", "]]]]><![CDATA[>"))
}

/// Make root-relative href/src attributes absolute
fn absolute_urls(content: &str, base_url: &str) -> String {
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
        .replace("href='/", &format!("href='{}/", base_url))
        .replace("src='/", &format!("src='{}/", base_url))
}

/// RSS feed builder
pub struct RssFeed<'a> {
    config: &'a SiteConfig,
    posts: &'a [BlogPost],
}

impl<'a> RssFeed<'a> {
    pub fn new(config: &'a SiteConfig, posts: &'a [BlogPost]) -> Self {
        Self { config, posts }
    }

    /// Build the feed document stamped with the current time
    pub fn build(config: &SiteConfig, posts: &[BlogPost]) -> String {
        RssFeed::new(config, posts).render(Utc::now())
    }

    /// Render the feed with an explicit build time
    pub fn render(&self, built_at: DateTime<Utc>) -> String {
        let config = self.config;
        let base_url = config.base_url();

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="UTF-8" ?>"#);
        feed.push('\n');
        feed.push_str(r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:content="http://purl.org/rss/1.0/modules/content/">"#);
        feed.push('\n');
        feed.push_str("  <channel>\n");
        feed.push_str(&format!(
            "    <title>{}</title>\n",
            escape_xml(&config.feed_title())
        ));
        feed.push_str(&format!(
            "    <link>{}</link>\n",
            escape_xml(&config.full_url("blog"))
        ));
        feed.push_str(&format!(
            "    <description>{}</description>\n",
            escape_xml(&config.description)
        ));
        feed.push_str(&format!(
            "    <language>{}</language>\n",
            escape_xml(&config.language)
        ));
        feed.push_str(&format!(
            "    <lastBuildDate>{}</lastBuildDate>\n",
            built_at.to_rfc2822()
        ));
        feed.push_str(&format!(
            "    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\" />\n",
            escape_xml(&config.full_url(&config.feed.path))
        ));

        let limit = config.feed.limit.unwrap_or(usize::MAX);
        for post in self.posts.iter().take(limit) {
            feed.push_str(&self.render_item(post, base_url));
        }

        feed.push_str("  </channel>\n");
        feed.push_str("</rss>\n");

        strip_invalid_xml_chars(&feed)
    }

    fn render_item(&self, post: &BlogPost, base_url: &str) -> String {
        let link = format!("{}{}", base_url, post.path());

        let mut item = String::new();
        item.push_str("    <item>\n");
        item.push_str(&format!("      <title>{}</title>\n", escape_xml(&post.title)));
        item.push_str(&format!("      <link>{}</link>\n", escape_xml(&link)));
        item.push_str(&format!(
            "      <description>{}</description>\n",
            escape_xml(&post.excerpt)
        ));
        if self.config.feed.full_content {
            item.push_str(&format!(
                "      <content:encoded>{}</content:encoded>\n",
                cdata(&self.render_article(post, &link, base_url))
            ));
        }
        item.push_str(&format!("      <guid>{}</guid>\n", escape_xml(&link)));
        if let Some(pub_date) = rfc2822(&post.date) {
            item.push_str(&format!("      <pubDate>{}</pubDate>\n", pub_date));
        }
        item.push_str(&format!("      <author>{}</author>\n", escape_xml(&post.author)));
        for category in post.categories.iter().chain(post.tags.iter()) {
            item.push_str(&format!("      <category>{}</category>\n", escape_xml(category)));
        }
        item.push_str("    </item>\n");
        item
    }

    /// Standalone article markup embedded as `content:encoded`
    fn render_article(&self, post: &BlogPost, link: &str, base_url: &str) -> String {
        let mut html = String::new();
        html.push_str("<article><header>");
        html.push_str(&format!("<h1>{}</h1>", escape_xml(&post.title)));
        html.push_str(&format!(
            "<div class=\"post-meta\"><strong>Published:</strong> {} | <strong>Author:</strong> {}</div>",
            full_date(&post.date),
            escape_xml(&post.author)
        ));

        if post.has_taxonomy() {
            html.push_str("<div class=\"taxonomy\">");
            for category in &post.categories {
                html.push_str(&format!(
                    "<span class=\"badge badge-category\">{}</span>",
                    escape_xml(category)
                ));
            }
            for tag in &post.tags {
                html.push_str(&format!(
                    "<span class=\"badge badge-tag\">{}</span>",
                    escape_xml(tag)
                ));
            }
            for label in &post.labels {
                html.push_str(&format!(
                    "<span class=\"badge badge-label\">{}</span>",
                    escape_xml(label)
                ));
            }
            html.push_str("</div>");
        }
        html.push_str("</header>");

        let content = post.content_html.as_deref().unwrap_or_default();
        html.push_str(&format!(
            "<div class=\"post-content\">{}</div>",
            absolute_urls(content, base_url)
        ));
        html.push_str(&format!(
            "<footer class=\"read-more\"><p><em>Read the full post online: <a href=\"{0}\">{0}</a></em></p></footer>",
            escape_xml(link)
        ));
        html.push_str("</article>");
        html
    }
}
