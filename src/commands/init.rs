//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::{Folio, CONFIG_FILE};

const CONFIG_TEMPLATE: &str = r#"# Site
title: My Portfolio
subtitle: Software Developer
description: Thoughts on technology, development, and more.
author: Your Name
language: en-us

# URL
url: http://example.com

# Directory
content_dir: content/blog
pages_dir: content/pages
static_dir: static
public_dir: public

# Writing
render_drafts: false

# Blog list
per_page: 10
latest_posts: 2

# RSS feed
feed:
  path: rss.xml
  full_content: true

# Code highlighting
highlight:
  enable: true
  theme: base16-ocean.dark
  line_number: false

# Math
katex:
  enable: true
  version: 0.16.25
  cdn: https://cdn.jsdelivr.net/npm

# Navigation
nav:
  - text: Home
    href: /
  - text: Projects
    href: /projects
  - text: Experience
    href: /experience
  - text: Blog
    href: /blog
  - text: Contact
    href: /contact

social:
  - text: GitHub
    href: https://github.com/
  - text: RSS
    href: /rss.xml
"#;

const HOME_PAGE: &str = r#"---
title: Home
---

Hi there, and welcome to my corner of the web! I build things where
hardware and software meet.
"#;

const PROJECTS_PAGE: &str = r#"---
title: Projects
description: Things I have built.
---

## Featured

Describe a project you are proud of.

## Other Work

A list of smaller experiments.
"#;

const EXPERIENCE_PAGE: &str = r#"---
title: Experience
description: Where I have worked.
---

## Work

Your roles and what you did there.

## Education

Schools and courses.
"#;

const CONTACT_PAGE: &str = r#"---
title: Contact
description: Get in touch.
---

Send an email to <you@example.com>.
"#;

const STYLESHEET: &str = "/* Site styles */\n";

fn sample_post(date: &str) -> String {
    format!(
        r#"---
title: Hello World
date: {date}
excerpt: The first post on this site.
categories: [General]
tags: [welcome]
labels: [featured]
---

Welcome! This post lives in its own folder, so images can sit next to it.

## Writing Posts

Create a post with:

```bash
$ folio new "My New Post"
```

## Math

Inline math like $e^{{i\pi}} + 1 = 0$ and display math:

$$
\int_0^1 x^2 \, dx = \frac{{1}}{{3}}
$$

## Publishing

```bash
$ folio generate
```
"#
    )
}

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("A site already exists in {:?}", target_dir);
    }

    fs::create_dir_all(target_dir.join("content/blog/hello-world"))?;
    fs::create_dir_all(target_dir.join("content/pages"))?;
    fs::create_dir_all(target_dir.join("static/css"))?;

    fs::write(&config_path, CONFIG_TEMPLATE)?;

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    fs::write(
        target_dir.join("content/blog/hello-world/index.mdx"),
        sample_post(&today),
    )?;

    let pages = [
        ("home.md", HOME_PAGE),
        ("projects.md", PROJECTS_PAGE),
        ("experience.md", EXPERIENCE_PAGE),
        ("contact.md", CONTACT_PAGE),
    ];
    for (name, content) in pages {
        fs::write(target_dir.join("content/pages").join(name), content)?;
    }

    fs::write(target_dir.join("static/css/style.css"), STYLESHEET)?;

    tracing::debug!("Scaffolded site in {:?}", target_dir);
    Ok(())
}

/// Run the init command with an existing instance
pub fn run(folio: &Folio) -> Result<()> {
    init_site(&folio.base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{PostCache, Source};

    #[test]
    fn test_init_creates_loadable_site() {
        let dir = tempfile::TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        let folio = Folio::new(dir.path()).unwrap();
        assert_eq!(folio.config.title, "My Portfolio");
        assert_eq!(folio.config.nav.len(), 5);

        let cache = PostCache::new(folio, Source::Filesystem);
        let posts = cache.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "hello-world");
        assert_eq!(posts[0].labels, vec!["featured"]);
        let html = posts[0].content_html.as_deref().unwrap();
        assert!(html.contains("math math-inline"));
        assert!(html.contains("math math-display"));

        let slugs: Vec<_> = cache.pages().iter().map(|p| p.slug.clone()).collect();
        assert_eq!(slugs, vec!["contact", "experience", "home", "projects"]);
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let dir = tempfile::TempDir::new().unwrap();
        init_site(dir.path()).unwrap();
        assert!(init_site(dir.path()).is_err());
    }
}
