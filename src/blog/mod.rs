//! Blog list logic: filtering, pagination and table of contents

mod filter;
mod pagination;
mod toc;

pub use filter::{all_filters, filter_counts, BlogFilters, FilterCounts, FilterSelection};
pub use pagination::{PageItem, Pagination};
pub use toc::{
    add_heading_ids, extract_headings, heading_id, number_headings, Heading, NumberedHeading,
};

/// Filter selection and page requested for the blog list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogQuery {
    pub selection: FilterSelection,
    pub page: usize,
}

impl BlogQuery {
    /// Parse a raw (still percent-encoded) query string
    ///
    /// Values stay encoded until split on `,`, so an encoded comma survives
    /// inside a single value.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut tags = None;
        let mut categories = None;
        let mut labels = None;
        let mut page = 1;

        for pair in raw.unwrap_or_default().split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "tags" | "tag" => tags = Some(value),
                "categories" | "category" => categories = Some(value),
                "labels" | "label" => labels = Some(value),
                "page" => page = value.parse().unwrap_or(1),
                _ => {}
            }
        }

        Self {
            selection: FilterSelection::from_query(tags, categories, labels),
            page,
        }
    }

    /// Link to the blog list with this selection on `page`
    pub fn href(selection: &FilterSelection, page: usize) -> String {
        let mut query = selection.to_query();
        if page > 1 {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(&format!("page={}", page));
        }
        if query.is_empty() {
            "/blog".to_string()
        } else {
            format!("/blog?{}", query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let query = BlogQuery::parse(Some("tags=rust,a%2Cb&label=featured&page=3&utm=x"));
        assert_eq!(query.selection.tags, vec!["rust", "a,b"]);
        assert_eq!(query.selection.labels, vec!["featured"]);
        assert_eq!(query.page, 3);
    }

    #[test]
    fn test_parse_empty_query() {
        let query = BlogQuery::parse(None);
        assert!(!query.selection.is_active());
        assert_eq!(query.page, 1);

        assert_eq!(BlogQuery::parse(Some("page=abc")).page, 1);
    }

    #[test]
    fn test_href() {
        let mut selection = FilterSelection::new();
        assert_eq!(BlogQuery::href(&selection, 1), "/blog");
        assert_eq!(BlogQuery::href(&selection, 2), "/blog?page=2");
        selection.toggle_category("data");
        assert_eq!(BlogQuery::href(&selection, 2), "/blog?categories=data&page=2");
    }
}
