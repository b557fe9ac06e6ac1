//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Folio;

/// Create a post scaffold for `title`
///
/// Writes `<slug>.mdx`, or `<slug>/index.mdx` when `folder` is set so the
/// post can keep images next to it.
pub fn run(folio: &Folio, title: &str, folder: bool) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a slug from title {:?}", title);
    }

    let file_path = if folder {
        folio.content_dir.join(&slug).join("index.mdx")
    } else {
        folio.content_dir.join(format!("{}.mdx", slug))
    };

    // Either layout claims the slug
    let taken = [
        folio.content_dir.join(format!("{}.mdx", slug)),
        folio.content_dir.join(format!("{}.md", slug)),
        folio.content_dir.join(&slug),
    ];
    if let Some(existing) = taken.iter().find(|p| p.exists()) {
        anyhow::bail!("Post already exists: {:?}", existing);
    }

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let now = chrono::Local::now();
    let content = format!(
        r#"---
title: "{}"
date: {}
excerpt: ""
author: "{}"
categories: []
tags: []
labels: []
draft: false
---

Write your post here.

<!-- more -->
"#,
        title.replace('"', "\\\""),
        now.format("%Y-%m-%d"),
        folio.config.author.replace('"', "\\\"")
    );

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
