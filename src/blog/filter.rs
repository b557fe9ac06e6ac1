//! Tag / category / label filtering

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::content::BlogPost;

/// Characters escaped inside a query value; `,` separates values
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b',')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?');

/// Every distinct value of each facet, sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlogFilters {
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub labels: Vec<String>,
}

/// Number of posts carrying each facet value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub tags: BTreeMap<String, usize>,
    pub categories: BTreeMap<String, usize>,
    pub labels: BTreeMap<String, usize>,
}

/// Collect the sorted, de-duplicated values of every facet
pub fn all_filters(posts: &[BlogPost]) -> BlogFilters {
    let mut tags = BTreeSet::new();
    let mut categories = BTreeSet::new();
    let mut labels = BTreeSet::new();

    for post in posts {
        tags.extend(post.tags.iter().cloned());
        categories.extend(post.categories.iter().cloned());
        labels.extend(post.labels.iter().cloned());
    }

    BlogFilters {
        tags: tags.into_iter().collect(),
        categories: categories.into_iter().collect(),
        labels: labels.into_iter().collect(),
    }
}

/// Count posts per facet value
pub fn filter_counts(posts: &[BlogPost]) -> FilterCounts {
    let mut counts = FilterCounts::default();

    for post in posts {
        for tag in &post.tags {
            *counts.tags.entry(tag.clone()).or_insert(0) += 1;
        }
        for category in &post.categories {
            *counts.categories.entry(category.clone()).or_insert(0) += 1;
        }
        for label in &post.labels {
            *counts.labels.entry(label.clone()).or_insert(0) += 1;
        }
    }

    counts
}

/// The facet values a reader has selected
///
/// A post matches when, for every facet with a selection, it carries at least
/// one of the selected values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub labels: Vec<String>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        toggle(&mut self.tags, tag);
    }

    pub fn toggle_category(&mut self, category: &str) {
        toggle(&mut self.categories, category);
    }

    pub fn toggle_label(&mut self, label: &str) {
        toggle(&mut self.labels, label);
    }

    /// Drop every selection
    pub fn clear(&mut self) {
        self.tags.clear();
        self.categories.clear();
        self.labels.clear();
    }

    pub fn is_active(&self) -> bool {
        !(self.tags.is_empty() && self.categories.is_empty() && self.labels.is_empty())
    }

    pub fn matches(&self, post: &BlogPost) -> bool {
        any_selected(&self.categories, &post.categories)
            && any_selected(&self.tags, &post.tags)
            && any_selected(&self.labels, &post.labels)
    }

    /// Keep matching posts, preserving their order
    pub fn apply<'a>(&self, posts: &'a [BlogPost]) -> Vec<&'a BlogPost> {
        posts.iter().filter(|post| self.matches(post)).collect()
    }

    /// Build a selection from comma-separated, percent-encoded query values
    pub fn from_query(
        tags: Option<&str>,
        categories: Option<&str>,
        labels: Option<&str>,
    ) -> Self {
        Self {
            tags: split_query_values(tags),
            categories: split_query_values(categories),
            labels: split_query_values(labels),
        }
    }

    /// Render as a query string (without the leading `?`)
    pub fn to_query(&self) -> String {
        [
            ("tags", &self.tags),
            ("categories", &self.categories),
            ("labels", &self.labels),
        ]
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(key, values)| {
            let encoded: Vec<String> = values
                .iter()
                .map(|v| utf8_percent_encode(v, QUERY_VALUE).to_string())
                .collect();
            format!("{}={}", key, encoded.join(","))
        })
        .collect::<Vec<_>>()
        .join("&")
    }

    /// A copy with one tag toggled, for building filter links
    pub fn with_tag_toggled(&self, tag: &str) -> Self {
        let mut next = self.clone();
        next.toggle_tag(tag);
        next
    }

    pub fn with_category_toggled(&self, category: &str) -> Self {
        let mut next = self.clone();
        next.toggle_category(category);
        next
    }

    pub fn with_label_toggled(&self, label: &str) -> Self {
        let mut next = self.clone();
        next.toggle_label(label);
        next
    }
}

fn toggle(values: &mut Vec<String>, value: &str) {
    if let Some(pos) = values.iter().position(|v| v == value) {
        values.remove(pos);
    } else {
        values.push(value.to_string());
    }
}

fn any_selected(selected: &[String], values: &[String]) -> bool {
    selected.is_empty() || selected.iter().any(|s| values.contains(s))
}

fn split_query_values(raw: Option<&str>) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for part in raw.unwrap_or_default().split(',') {
        // Form encoding writes spaces as `+`; a literal plus arrives as `%2B`
        let part = part.replace('+', " ");
        let decoded = percent_decode_str(&part).decode_utf8_lossy();
        let decoded = decoded.trim();
        if !decoded.is_empty() && !values.iter().any(|v| v == decoded) {
            values.push(decoded.to_string());
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str, tags: &[&str], categories: &[&str], labels: &[&str]) -> BlogPost {
        let mut post = BlogPost::new(slug, "2024-01-01");
        post.tags = tags.iter().map(|s| s.to_string()).collect();
        post.categories = categories.iter().map(|s| s.to_string()).collect();
        post.labels = labels.iter().map(|s| s.to_string()).collect();
        post
    }

    fn sample() -> Vec<BlogPost> {
        vec![
            post("iot", &["esp32", "lorawan"], &["hardware"], &["featured"]),
            post("regression", &["python", "esp32"], &["data"], &[]),
            post("flutter", &["dart"], &["mobile"], &["featured"]),
            post("physics", &[], &["science", "data"], &["long-read"]),
        ]
    }

    fn slugs(posts: Vec<&BlogPost>) -> Vec<&str> {
        posts.into_iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_all_filters_sorted_unique() {
        let filters = all_filters(&sample());
        assert_eq!(filters.tags, vec!["dart", "esp32", "lorawan", "python"]);
        assert_eq!(filters.categories, vec!["data", "hardware", "mobile", "science"]);
        assert_eq!(filters.labels, vec!["featured", "long-read"]);
    }

    #[test]
    fn test_filter_counts() {
        let counts = filter_counts(&sample());
        assert_eq!(counts.tags["esp32"], 2);
        assert_eq!(counts.categories["data"], 2);
        assert_eq!(counts.labels["featured"], 2);
        assert!(!counts.tags.contains_key("rust"));
    }

    #[test]
    fn test_empty_selection_matches_everything() {
        let posts = sample();
        let selection = FilterSelection::new();
        assert!(!selection.is_active());
        assert_eq!(selection.apply(&posts).len(), posts.len());
    }

    #[test]
    fn test_or_within_facet() {
        let posts = sample();
        let mut selection = FilterSelection::new();
        selection.toggle_tag("dart");
        selection.toggle_tag("python");
        assert_eq!(slugs(selection.apply(&posts)), vec!["regression", "flutter"]);
    }

    #[test]
    fn test_and_across_facets() {
        let posts = sample();
        let mut selection = FilterSelection::new();
        selection.toggle_tag("esp32");
        selection.toggle_label("featured");
        assert_eq!(slugs(selection.apply(&posts)), vec!["iot"]);

        selection.toggle_category("mobile");
        assert!(selection.apply(&posts).is_empty());
    }

    #[test]
    fn test_toggle_and_clear() {
        let mut selection = FilterSelection::new();
        selection.toggle_category("data");
        assert!(selection.is_active());
        selection.toggle_category("data");
        assert!(!selection.is_active());

        selection.toggle_tag("a");
        selection.toggle_label("b");
        selection.clear();
        assert_eq!(selection, FilterSelection::default());
    }

    #[test]
    fn test_query_string() {
        let mut selection = FilterSelection::new();
        selection.toggle_tag("c++");
        selection.toggle_tag("rust");
        selection.toggle_label("long read");
        let query = selection.to_query();
        assert_eq!(query, "tags=c%2B%2B,rust&labels=long%20read");

        let parsed = FilterSelection::from_query(Some("c%2B%2B,rust"), None, Some("long%20read"));
        assert_eq!(parsed, selection);
    }

    #[test]
    fn test_query_plus_is_a_space() {
        let parsed = FilterSelection::from_query(Some("c%2B%2B"), None, Some("long+read"));
        assert_eq!(parsed.tags, vec!["c++"]);
        assert_eq!(parsed.labels, vec!["long read"]);
    }

    #[test]
    fn test_query_parsing_ignores_blanks_and_duplicates() {
        let parsed = FilterSelection::from_query(Some("a,,a, b "), Some(""), None);
        assert_eq!(parsed.tags, vec!["a", "b"]);
        assert!(parsed.categories.is_empty());
    }
}
