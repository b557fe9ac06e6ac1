//! Table of contents: heading extraction, numbering and anchor ids

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref HEADING_RE: Regex =
        Regex::new(r"(?s)<h([23])(?:\s[^>]*)?>(.*?)</h[23]>").expect("valid heading regex");
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").expect("valid tag regex");
    static ref NON_ID_RE: Regex = Regex::new(r"[^a-z0-9]+").expect("valid id regex");
}

/// An h2/h3 heading found in rendered HTML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: String,
}

/// A heading with its table-of-contents number ("1.", "1.2" or "")
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberedHeading {
    #[serde(flatten)]
    pub heading: Heading,
    pub number: String,
}

/// Anchor id for heading text: lowercase, non-alphanumeric runs become `-`
pub fn heading_id(text: &str) -> String {
    NON_ID_RE
        .replace_all(&text.to_lowercase(), "-")
        .into_owned()
}

fn heading_text(inner_html: &str) -> String {
    TAG_RE.replace_all(inner_html, "").into_owned()
}

/// Collect h2 and h3 headings in document order
pub fn extract_headings(html: &str) -> Vec<Heading> {
    HEADING_RE
        .captures_iter(html)
        .map(|caps| {
            let level = if &caps[1] == "2" { 2 } else { 3 };
            let text = heading_text(&caps[2]);
            let id = heading_id(&text);
            Heading { level, text, id }
        })
        .collect()
}

/// Number headings: h2 by position among h2s, h3 within its h2
pub fn number_headings(headings: &[Heading]) -> Vec<NumberedHeading> {
    let mut section = 0;
    let mut subsection = 0;

    headings
        .iter()
        .map(|heading| {
            let number = if heading.level == 2 {
                section += 1;
                subsection = 0;
                format!("{}.", section)
            } else if section > 0 {
                subsection += 1;
                format!("{}.{}", section, subsection)
            } else {
                String::new()
            };
            NumberedHeading {
                heading: heading.clone(),
                number,
            }
        })
        .collect()
}

/// Rewrite h2/h3 elements so they carry the ids `extract_headings` produces
pub fn add_heading_ids(html: &str) -> String {
    HEADING_RE
        .replace_all(html, |caps: &Captures| {
            let level = &caps[1];
            let inner = &caps[2];
            let id = heading_id(&heading_text(inner));
            format!(r#"<h{level} id="{id}">{inner}</h{level}>"#)
        })
        .into_owned()
}
