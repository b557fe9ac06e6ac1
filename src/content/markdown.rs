//! Markdown rendering with syntax highlighting and math passthrough

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::config::HighlightConfig;

/// Excerpt separator recognised in post bodies
pub const MORE_SEPARATOR: &str = "<!-- more -->";

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::from_config(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn from_config(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            highlight: config.enable,
            line_numbers: config.line_number,
        }
    }

    /// Render markdown (or MDX) to HTML
    pub fn render(&self, markdown: &str) -> Result<String> {
        let source = strip_mdx_module_lines(markdown);

        // Front-matter is handled separately in FrontMatter::parse()
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_MATH
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(&source, options);

        let mut events: Vec<Event> = Vec::new();
        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) => {
                            // Info strings may carry extra attributes: ```rust title="x"
                            let lang = lang.split_whitespace().next().unwrap_or("").to_string();
                            if lang.is_empty() {
                                None
                            } else {
                                Some(lang)
                            }
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let highlighted =
                        self.highlight_code(&code_block_content, code_block_lang.as_deref());
                    events.push(Event::Html(CowStr::from(highlighted)));
                    in_code_block = false;
                    code_block_lang = None;
                }
                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }
                Event::InlineMath(math) => {
                    events.push(Event::InlineHtml(CowStr::from(format!(
                        r#"<span class="math math-inline">${}$</span>"#,
                        html_escape(&math)
                    ))));
                }
                Event::DisplayMath(math) => {
                    events.push(Event::InlineHtml(CowStr::from(format!(
                        r#"<span class="math math-display">$${}$$</span>"#,
                        html_escape(&math)
                    ))));
                }
                _ => {
                    if !in_code_block {
                        events.push(event);
                    }
                }
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        if !self.highlight {
            return plain_code_block(code, lang);
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        let Some(theme) = theme else {
            return plain_code_block(code, lang);
        };

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(highlighted) => {
                if self.line_numbers {
                    self.add_line_numbers(&highlighted, lang)
                } else {
                    format!(
                        r#"<figure class="highlight {}">{}</figure>"#,
                        lang, highlighted
                    )
                }
            }
            Err(e) => {
                tracing::debug!("Highlighting {} failed: {}", lang, e);
                plain_code_block(code, lang)
            }
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, code: &str, lang: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();

        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");
        let code_lines = lines.join("\n");

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
            lang, gutter, code_lines
        )
    }

    /// Split a body at the excerpt separator
    ///
    /// Returns the excerpt (if any) and the body with the separator removed.
    pub fn split_excerpt(content: &str) -> (Option<String>, String) {
        if let Some(pos) = content.find(MORE_SEPARATOR) {
            let excerpt = content[..pos].trim().to_string();
            let remaining = content[pos + MORE_SEPARATOR.len()..].trim().to_string();
            let full = format!("{}\n\n{}", excerpt, remaining);
            (Some(excerpt), full)
        } else {
            (None, content.to_string())
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop MDX `import`/`export` statements that sit outside code fences
fn strip_mdx_module_lines(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_fence = false;

    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }
        let is_module_line = !in_fence
            && !line.starts_with(char::is_whitespace)
            && (trimmed.starts_with("import ") || trimmed.starts_with("export "));
        if !is_module_line {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

fn plain_code_block(code: &str, lang: &str) -> String {
    format!(
        r#"<pre><code class="language-{}">{}</code></pre>"#,
        lang,
        html_escape(code)
    )
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("## Hello World\n\nThis is a test.").unwrap();
        assert!(html.contains("<h2>Hello World</h2>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains("highlight rust"));
        assert!(!html.contains("<code>fn main"));
    }

    #[test]
    fn test_render_unlabelled_code_block_without_highlighting() {
        let renderer = MarkdownRenderer::from_config(&HighlightConfig {
            enable: false,
            ..Default::default()
        });
        let html = renderer.render("```\na < b\n```").unwrap();
        assert!(html.contains(r#"<pre><code class="language-text">a &lt; b"#));
    }

    #[test]
    fn test_math_keeps_delimiters() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("Energy $E = mc^2$ and\n\n$$\\sum_{i} x_i < n$$\n")
            .unwrap();
        assert!(html.contains(r#"<span class="math math-inline">$E = mc^2$</span>"#));
        assert!(html.contains(r#"<span class="math math-display">$$\sum_{i} x_i &lt; n$$</span>"#));
    }

    #[test]
    fn test_mdx_module_lines_are_stripped() {
        let renderer = MarkdownRenderer::new();
        let source = "import Chart from './chart'\nexport const meta = {}\n\nHello\n\n```js\nimport x from 'y'\n```\n";
        let html = renderer.render(source).unwrap();
        assert!(!html.contains("Chart from"));
        assert!(!html.contains("export const"));
        assert!(html.contains("<p>Hello</p>"));
        // Code fences keep their imports
        assert!(html.contains("import"));
    }

    #[test]
    fn test_split_excerpt() {
        let content = "This is excerpt.\n<!-- more -->\nThis is more content.";
        let (excerpt, full) = MarkdownRenderer::split_excerpt(content);
        assert_eq!(excerpt, Some("This is excerpt.".to_string()));
        assert!(full.contains("This is excerpt."));
        assert!(full.contains("This is more content."));
        assert!(!full.contains(MORE_SEPARATOR));
    }
}
