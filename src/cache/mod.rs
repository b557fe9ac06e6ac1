//! Blog data store
//!
//! Holds the loaded posts as an immutable snapshot that pages, the feed and
//! the server read from. In filesystem mode a snapshot is reloaded whenever
//! the content tree's fingerprint changes; in snapshot mode it comes from the
//! `posts.json` blob written by `generate`.

use anyhow::{Context, Result};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::content::{BlogPost, ContentLoader, Page};
use crate::Folio;

/// File name of the serialized post blob
pub const SNAPSHOT_FILE: &str = "posts.json";

/// Where the store gets its posts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Load from the content directories, reloading on change
    Filesystem,
    /// Only what was installed with `set_posts` or `load_snapshot`
    Snapshot,
}

#[derive(Debug, Clone)]
struct Snapshot {
    posts: Arc<Vec<BlogPost>>,
    pages: Arc<Vec<Page>>,
    /// Content fingerprint at load time; 0 for installed snapshots
    fingerprint: u64,
}

/// Shared post store
pub struct PostCache {
    folio: Folio,
    source: Source,
    snapshot: RwLock<Option<Snapshot>>,
}

impl PostCache {
    pub fn new(folio: Folio, source: Source) -> Self {
        Self {
            folio,
            source,
            snapshot: RwLock::new(None),
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Install a snapshot of posts, replacing the current one
    pub fn set_posts(&self, posts: Vec<BlogPost>) {
        let pages = self
            .read()
            .as_ref()
            .map(|s| s.pages.clone())
            .unwrap_or_default();
        let fingerprint = match self.source {
            Source::Filesystem => self.fingerprint(),
            Source::Snapshot => 0,
        };
        *self.write() = Some(Snapshot {
            posts: Arc::new(posts),
            pages,
            fingerprint,
        });
    }

    /// All posts, newest first
    pub fn posts(&self) -> Arc<Vec<BlogPost>> {
        self.current().posts
    }

    /// Marketing pages
    pub fn pages(&self) -> Arc<Vec<Page>> {
        self.current().pages
    }

    /// Posts whose HTML rendered successfully
    pub fn posts_with_content(&self) -> Vec<BlogPost> {
        self.posts()
            .iter()
            .filter(|p| p.has_content())
            .cloned()
            .collect()
    }

    /// Look up a post with content by slug
    pub fn post_by_slug(&self, slug: &str) -> Option<BlogPost> {
        self.posts()
            .iter()
            .find(|p| p.slug == slug && p.has_content())
            .cloned()
    }

    /// Drop the snapshot; the next read reloads (filesystem mode)
    pub fn invalidate(&self) {
        *self.write() = None;
        tracing::debug!("Post cache invalidated");
    }

    /// Replace the snapshot with posts read from a JSON blob
    pub fn load_snapshot(&self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read post snapshot {:?}", path))?;
        let posts: Vec<BlogPost> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse post snapshot {:?}", path))?;
        let count = posts.len();

        // Pages are not part of the blob
        let pages = ContentLoader::new(&self.folio).load_pages();
        *self.write() = Some(Snapshot {
            posts: Arc::new(posts),
            pages: Arc::new(pages),
            fingerprint: 0,
        });
        tracing::info!("Loaded {} posts from {:?}", count, path);
        Ok(count)
    }

    /// Write the current posts as a JSON blob
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self.posts().as_slice())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Fingerprint of the content directories
    pub fn fingerprint(&self) -> u64 {
        ContentLoader::new(&self.folio).fingerprint()
    }

    fn current(&self) -> Snapshot {
        if self.source == Source::Filesystem {
            let fingerprint = self.fingerprint();
            let stale = match self.read().as_ref() {
                Some(snapshot) => snapshot.fingerprint != fingerprint,
                None => true,
            };
            if stale {
                return self.reload(fingerprint);
            }
        }

        self.read().clone().unwrap_or_else(|| Snapshot {
            posts: Arc::default(),
            pages: Arc::default(),
            fingerprint: 0,
        })
    }

    fn reload(&self, fingerprint: u64) -> Snapshot {
        let loader = ContentLoader::new(&self.folio);
        let snapshot = Snapshot {
            posts: Arc::new(loader.load_posts()),
            pages: Arc::new(loader.load_pages()),
            fingerprint,
        };
        tracing::info!(
            "Loaded {} posts and {} pages",
            snapshot.posts.len(),
            snapshot.pages.len()
        );
        *self.write() = Some(snapshot.clone());
        snapshot
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Snapshot>> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Snapshot>> {
        self.snapshot.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Hash file paths, sizes and modification times under `dir`
///
/// A missing directory hashes to a fixed value, so creating it later counts
/// as a change.
pub fn hash_directory(dir: &Path, hasher: &mut DefaultHasher) {
    let mut paths: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();

    paths.sort();
    paths.len().hash(hasher);

    for path in paths {
        path.to_string_lossy().hash(hasher);
        if let Ok(metadata) = fs::metadata(&path) {
            metadata.len().hash(hasher);
            if let Ok(mtime) = metadata.modified() {
                mtime
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_nanos()
                    .hash(hasher);
            }
        }
    }
}

/// Combined fingerprint of several directories
pub fn fingerprint(dirs: &[&Path]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for dir in dirs {
        hash_directory(dir, &mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn site(dir: &TempDir) -> Folio {
        Folio::with_config(dir.path(), SiteConfig::default())
    }

    fn write_post(dir: &TempDir, slug: &str, date: &str) {
        let blog = dir.path().join("content/blog");
        fs::create_dir_all(&blog).unwrap();
        fs::write(
            blog.join(format!("{}.md", slug)),
            format!("---\ntitle: {}\ndate: {}\n---\nBody of {}\n", slug, date, slug),
        )
        .unwrap();
    }

    #[test]
    fn test_filesystem_mode_loads_lazily() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "first", "2024-01-01");
        let cache = PostCache::new(site(&dir), Source::Filesystem);
        assert_eq!(cache.posts().len(), 1);
        assert!(cache.post_by_slug("first").is_some());
        assert!(cache.post_by_slug("missing").is_none());
    }

    #[test]
    fn test_filesystem_mode_reloads_on_change() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "first", "2024-01-01");
        let cache = PostCache::new(site(&dir), Source::Filesystem);
        assert_eq!(cache.posts().len(), 1);

        write_post(&dir, "second", "2024-02-01");
        let posts = cache.posts();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].slug, "second");
    }

    #[test]
    fn test_snapshot_mode_round_trip() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "first", "2024-01-01");
        write_post(&dir, "second", "2024-02-01");
        let fs_cache = PostCache::new(site(&dir), Source::Filesystem);
        let blob = dir.path().join("public/posts.json");
        fs_cache.save_snapshot(&blob).unwrap();

        let json = fs::read_to_string(&blob).unwrap();
        assert!(json.contains("\"contentHtml\""));

        let cache = PostCache::new(site(&dir), Source::Snapshot);
        assert!(cache.posts().is_empty());
        let pages = dir.path().join("content/pages");
        fs::create_dir_all(&pages).unwrap();
        fs::write(pages.join("about.md"), "---\ntitle: About\n---\nMe\n").unwrap();

        assert_eq!(cache.load_snapshot(&blob).unwrap(), 2);
        assert_eq!(*cache.posts(), *fs_cache.posts());
        assert_eq!(cache.pages().len(), 1);
    }

    #[test]
    fn test_posts_with_content_skips_failed_renders() {
        let dir = TempDir::new().unwrap();
        let cache = PostCache::new(site(&dir), Source::Snapshot);
        let mut ok = BlogPost::new("ok", "2024-01-01");
        ok.content_html = Some("<p>ok</p>".to_string());
        let broken = BlogPost::new("broken", "2024-02-01");
        cache.set_posts(vec![broken, ok]);

        assert_eq!(cache.posts().len(), 2);
        let with_content = cache.posts_with_content();
        assert_eq!(with_content.len(), 1);
        assert_eq!(with_content[0].slug, "ok");
        assert!(cache.post_by_slug("broken").is_none());
    }

    #[test]
    fn test_empty_html_counts_as_no_content() {
        let dir = TempDir::new().unwrap();
        let blob = dir.path().join("posts.json");
        fs::write(
            &blob,
            r#"[{"slug":"stub","title":"Stub","date":"2024-01-01","excerpt":"","author":"","tags":[],"categories":[],"labels":[],"contentHtml":""}]"#,
        )
        .unwrap();

        let cache = PostCache::new(site(&dir), Source::Snapshot);
        assert_eq!(cache.load_snapshot(&blob).unwrap(), 1);
        assert!(cache.posts_with_content().is_empty());
        assert!(cache.post_by_slug("stub").is_none());
    }

    #[test]
    fn test_invalidate() {
        let dir = TempDir::new().unwrap();
        let cache = PostCache::new(site(&dir), Source::Snapshot);
        cache.set_posts(vec![BlogPost::new("a", "2024-01-01")]);
        cache.invalidate();
        assert!(cache.posts().is_empty());
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let dir = TempDir::new().unwrap();
        let before = fingerprint(&[dir.path()]);
        fs::write(dir.path().join("a.md"), "hello").unwrap();
        let after = fingerprint(&[dir.path()]);
        assert_ne!(before, after);
        assert_eq!(after, fingerprint(&[dir.path()]));
    }
}
