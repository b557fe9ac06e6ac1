//! KaTeX asset injection for pages containing math

use crate::config::KatexConfig;

/// Whether rendered HTML carries math spans from the markdown renderer
pub fn contains_math(html: &str) -> bool {
    html.contains("class=\"math math-inline\"") || html.contains("class=\"math math-display\"")
}

fn script_tag(config: &KatexConfig) -> String {
    format!(
        r#"<script defer src="{}/katex.min.js" crossorigin="anonymous"></script>"#,
        config.dist_url()
    )
}

/// Stylesheet and scripts that render `$…$` and `$$…$$` on the client
pub fn katex_assets(config: &KatexConfig) -> String {
    let dist = config.dist_url();
    let script = script_tag(config);
    format!(
        r#"<link rel="stylesheet" href="{dist}/katex.min.css" crossorigin="anonymous">
{script}
<script defer src="{dist}/contrib/auto-render.min.js" crossorigin="anonymous"></script>
<script>
document.addEventListener("DOMContentLoaded", function() {{
    renderMathInElement(document.body, {{
        delimiters: [
            {{ left: "$$", right: "$$", display: true }},
            {{ left: "$", right: "$", display: false }},
            {{ left: "\\(", right: "\\)", display: false }},
            {{ left: "\\[", right: "\\]", display: true }}
        ]
    }});
}});
</script>
"#
    )
}

/// Insert KaTeX assets before `</body>`
///
/// Leaves the page untouched when KaTeX is disabled, the page has no math,
/// or the assets are already present.
pub fn inject_katex(html: &str, config: &KatexConfig) -> String {
    if !config.enable || !contains_math(html) || html.contains(&script_tag(config)) {
        return html.to_string();
    }

    let assets = katex_assets(config);
    match html.rfind("</body>") {
        Some(pos) => format!("{}{}{}", &html[..pos], assets, &html[pos..]),
        None => format!("{}{}", html, assets),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATH_PAGE: &str =
        r#"<html><body><p><span class="math math-inline">$x^2$</span></p></body></html>"#;

    #[test]
    fn test_contains_math() {
        assert!(contains_math(MATH_PAGE));
        assert!(!contains_math("<p>Price: $5</p>"));
    }

    #[test]
    fn test_inject_before_body_end() {
        let html = inject_katex(MATH_PAGE, &KatexConfig::default());
        let css = html
            .find("https://cdn.jsdelivr.net/npm/katex@0.16.25/dist/katex.min.css")
            .unwrap();
        assert!(css < html.find("</body>").unwrap());
        assert!(html.contains("/dist/contrib/auto-render.min.js"));
        assert!(html.contains(r#"{ left: "$$", right: "$$", display: true }"#));
        assert!(html.contains(r#"{ left: "$", right: "$", display: false }"#));
        assert_eq!(inject_katex(&html, &KatexConfig::default()), html);
    }

    #[test]
    fn test_mentioning_the_script_still_injects() {
        let page = r#"<html><body><p>Load <code>katex.min.js</code> first.</p><span class="math math-inline">$y$</span></body></html>"#;
        let html = inject_katex(page, &KatexConfig::default());
        assert!(html.contains("renderMathInElement"));
        assert_eq!(html.matches("/dist/katex.min.js").count(), 1);
    }

    #[test]
    fn test_noop_without_math_or_when_disabled() {
        let plain = "<html><body><p>hi</p></body></html>";
        assert_eq!(inject_katex(plain, &KatexConfig::default()), plain);

        let config = KatexConfig {
            enable: false,
            ..KatexConfig::default()
        };
        assert_eq!(inject_katex(MATH_PAGE, &config), MATH_PAGE);
    }
}
