//! Generate static files

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::cache::{PostCache, Source};
use crate::generator::{GenerateSummary, Generator};
use crate::{Folio, CONFIG_FILE};

/// Generate the static site from the content directories
pub fn run(folio: &Folio) -> Result<()> {
    run_with_summary(folio).map(|_| ())
}

/// Generate and report what was written
pub fn run_with_summary(folio: &Folio) -> Result<GenerateSummary> {
    let start = Instant::now();

    let cache = PostCache::new(folio.clone(), Source::Filesystem);
    let generator = Generator::new(folio)?;
    let summary = generator.generate(&cache)?;

    tracing::info!(
        "Generated {} posts, {} pages, {} list pages, {} filter pages and copied {} assets in {:.2}s",
        summary.posts,
        summary.pages,
        summary.list_pages,
        summary.facet_pages,
        summary.assets,
        start.elapsed().as_secs_f64()
    );

    Ok(summary)
}

/// Directories and files whose changes trigger a rebuild
pub fn watch_paths(folio: &Folio) -> Vec<PathBuf> {
    [
        folio.content_dir.clone(),
        folio.pages_dir.clone(),
        folio.static_dir.clone(),
        folio.base_dir.join(CONFIG_FILE),
    ]
    .into_iter()
    .filter(|p| p.exists())
    .collect()
}

/// Whether a changed path should trigger a rebuild
pub fn is_relevant_change(path: &Path, public_dir: &Path) -> bool {
    let path_str = path.to_string_lossy();
    !path.starts_with(public_dir)
        && !path_str.contains(".git")
        && !path_str.contains(".DS_Store")
        && !path_str.contains("node_modules")
        && !path_str.ends_with('~')
}

/// Watch for file changes and regenerate
pub fn watch(folio: &Folio) -> Result<()> {
    let (tx, rx) = channel();

    // Debounce to avoid several rebuilds for one save
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    for path in watch_paths(folio) {
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        debouncer.watcher().watch(&path, mode)?;
        tracing::debug!("Watching: {:?}", path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|e| is_relevant_change(&e.path, &folio.public_dir))
                    .collect();
                if changed.is_empty() {
                    continue;
                }
                for event in &changed {
                    tracing::info!("File changed: {}", event.path.display());
                }

                // Config edits need a fresh instance
                let current = match Folio::new(&folio.base_dir) {
                    Ok(current) => current,
                    Err(e) => {
                        tracing::error!("Invalid configuration, keeping previous: {}", e);
                        folio.clone()
                    }
                };
                if let Err(e) = run(&current) {
                    tracing::error!("Generation failed: {}", e);
                }
            }
            Ok(Err(e)) => tracing::error!("Watch error: {:?}", e),
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_generates_site() {
        let dir = TempDir::new().unwrap();
        let blog = dir.path().join("content/blog");
        fs::create_dir_all(&blog).unwrap();
        fs::write(blog.join("hello.mdx"), "---\ntitle: Hello\ndate: 2024-01-01\n---\nHi\n").unwrap();

        let folio = Folio::with_config(dir.path(), SiteConfig::default());
        let summary = run_with_summary(&folio).unwrap();
        assert_eq!(summary.posts, 1);
        assert!(dir.path().join("public/blog/hello/index.html").is_file());
    }

    #[test]
    fn test_watch_paths_and_relevance() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("content/blog")).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "title: x\n").unwrap();
        let folio = Folio::with_config(dir.path(), SiteConfig::default());

        let paths = watch_paths(&folio);
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&dir.path().join(CONFIG_FILE)));

        let public = &folio.public_dir;
        assert!(is_relevant_change(&folio.content_dir.join("a.md"), public));
        assert!(!is_relevant_change(&public.join("index.html"), public));
        assert!(!is_relevant_change(&folio.content_dir.join("a.md~"), public));
    }
}
