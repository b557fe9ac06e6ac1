//! List site content

use anyhow::Result;
use std::collections::BTreeMap;

use crate::blog::filter_counts;
use crate::content::ContentLoader;
use crate::Folio;

/// List site content by type
pub fn run(folio: &Folio, content_type: &str) -> Result<()> {
    for line in lines(folio, content_type)? {
        println!("{}", line);
    }
    Ok(())
}

/// Listing output, one entry per line
pub fn lines(folio: &Folio, content_type: &str) -> Result<Vec<String>> {
    let loader = ContentLoader::new(folio);
    let mut out = Vec::new();

    match content_type {
        "post" | "posts" => {
            let posts = loader.load_posts();
            out.push(format!("Posts ({}):", posts.len()));
            for post in posts {
                out.push(format!("  {} - {} [{}]", post.date, post.title, post.slug));
            }
        }
        "page" | "pages" => {
            let pages = loader.load_pages();
            out.push(format!("Pages ({}):", pages.len()));
            for page in pages {
                out.push(format!("  {} [{}]", page.title, page.slug));
            }
        }
        "tag" | "tags" => {
            let counts = filter_counts(&loader.load_posts());
            push_counts(&mut out, "Tags", counts.tags);
        }
        "category" | "categories" => {
            let counts = filter_counts(&loader.load_posts());
            push_counts(&mut out, "Categories", counts.categories);
        }
        "label" | "labels" => {
            let counts = filter_counts(&loader.load_posts());
            push_counts(&mut out, "Labels", counts.labels);
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, page, tag, category, label",
                content_type
            );
        }
    }

    Ok(out)
}

/// Most used first, then alphabetical
fn push_counts(out: &mut Vec<String>, heading: &str, counts: BTreeMap<String, usize>) {
    out.push(format!("{} ({}):", heading, counts.len()));
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (name, count) in counts {
        out.push(format!("  {} ({})", name, count));
    }
}
