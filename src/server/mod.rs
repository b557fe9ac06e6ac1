//! HTTP server: renders routes on demand, with optional live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        Path as RoutePath, RawQuery, State, WebSocketUpgrade,
    },
    http::{header, Request, StatusCode, Uri},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::blog::BlogQuery;
use crate::cache::{PostCache, Source, SNAPSHOT_FILE};
use crate::commands::generate::{is_relevant_change, watch_paths};
use crate::content::loader::is_markdown_file;
use crate::feed::{self, RssFeed};
use crate::site::{LinkStyle, SiteRenderer};
use crate::Folio;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Server options from the command line
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub ip: String,
    pub port: u16,
    /// Serve the `posts.json` snapshot without watching the file system
    pub static_mode: bool,
}

/// Server state
pub struct ServerState {
    folio: Folio,
    cache: PostCache,
    site: SiteRenderer,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

impl ServerState {
    /// Build state; in static mode posts come from the generated snapshot
    pub fn new(folio: &Folio, static_mode: bool) -> Result<Self> {
        let snapshot = folio.public_dir.join(SNAPSHOT_FILE);
        let cache = if static_mode && snapshot.is_file() {
            let cache = PostCache::new(folio.clone(), Source::Snapshot);
            cache.load_snapshot(&snapshot)?;
            cache
        } else {
            if static_mode {
                tracing::warn!("No {:?}; loading posts from content", snapshot);
            }
            PostCache::new(folio.clone(), Source::Filesystem)
        };

        let (reload_tx, _) = broadcast::channel::<()>(16);

        Ok(Self {
            folio: folio.clone(),
            cache,
            site: SiteRenderer::new(folio.config.clone(), LinkStyle::Query)?,
            reload_tx,
            live_reload: !static_mode,
        })
    }
}

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    let feed_route = format!(
        "/{}",
        state.folio.config.feed.path.trim_start_matches('/')
    );

    Router::new()
        .route("/", get(home_handler))
        .route("/blog", get(blog_list_handler))
        .route("/blog/", get(blog_list_handler))
        .route("/blog/:slug", get(blog_post_handler))
        .route(&feed_route, get(feed_handler))
        .route(&format!("/{}", SNAPSHOT_FILE), get(posts_json_handler))
        .route("/__livereload", get(livereload_handler))
        .route("/:slug", get(page_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(folio: &Folio, options: ServerOptions) -> Result<()> {
    let state = Arc::new(ServerState::new(folio, options.static_mode)?);
    let app = router(state.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if options.ip == "localhost" {
        "127.0.0.1"
    } else {
        options.ip.as_str()
    };
    let addr: SocketAddr = format!("{}:{}", bind_ip, options.port).parse()?;

    tracing::info!("Server running at http://{}:{}", options.ip, options.port);
    if state.live_reload {
        tracing::info!("Live reload enabled. Watching for changes...");
        let watch_state = state.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(&watch_state) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch content for changes, drop the post cache and notify browsers
fn watch_and_reload(state: &ServerState) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid reloads
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    for path in watch_paths(&state.folio) {
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        debouncer.watcher().watch(&path, mode)?;
        tracing::debug!("Watching: {:?}", path);
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|e| is_relevant_change(&e.path, &state.folio.public_dir))
                    .collect();
                if changed.is_empty() {
                    continue;
                }
                for event in &changed {
                    tracing::info!("File changed: {}", event.path.display());
                }
                if changed.iter().any(|e| e.path.ends_with(crate::CONFIG_FILE)) {
                    tracing::warn!("Configuration changed; restart the server to apply it");
                }

                state.cache.invalidate();
                // No receivers just means no open browser tabs
                let _ = state.reload_tx.send(());
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

async fn home_handler(State(state): State<Arc<ServerState>>) -> Response {
    let posts = state.cache.posts();
    let pages = state.cache.pages();
    html_response(&state, state.site.home(&posts, &pages))
}

async fn blog_list_handler(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
) -> Response {
    // Raw query keeps encoded commas inside single values
    let query = BlogQuery::parse(query.as_deref());
    let posts = state.cache.posts();
    html_response(
        &state,
        state.site.blog_list(&posts, &query.selection, query.page),
    )
}

async fn blog_post_handler(
    State(state): State<Arc<ServerState>>,
    RoutePath(slug): RoutePath<String>,
    request: Request<Body>,
) -> Response {
    let posts = state.cache.posts();
    match state.site.blog_post(&posts, &slug) {
        Ok(Some(html)) => html_page(&state, html),
        Ok(None) => serve_file_or_not_found(&state, request).await,
        Err(e) => render_error(e),
    }
}

async fn page_handler(
    State(state): State<Arc<ServerState>>,
    RoutePath(slug): RoutePath<String>,
    request: Request<Body>,
) -> Response {
    let pages = state.cache.pages();
    match state.site.page(&pages, &slug) {
        Ok(Some(html)) => html_page(&state, html),
        Ok(None) => serve_file_or_not_found(&state, request).await,
        Err(e) => render_error(e),
    }
}

async fn feed_handler(State(state): State<Arc<ServerState>>) -> Response {
    let posts = state.cache.posts_with_content();
    let xml = RssFeed::build(&state.folio.config, &posts);
    (
        [
            (header::CONTENT_TYPE, feed::CONTENT_TYPE),
            (header::CACHE_CONTROL, feed::CACHE_CONTROL),
        ],
        xml,
    )
        .into_response()
}

async fn posts_json_handler(State(state): State<Arc<ServerState>>) -> Response {
    Json(state.cache.posts().as_ref().clone()).into_response()
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            // Wait for reload signal
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            // Handle incoming messages (ping/pong)
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    serve_file_or_not_found(&state, request).await
}

/// Serve a file from `static/`, the content tree or `public/`, else a 404 page
async fn serve_file_or_not_found(state: &ServerState, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();

    if let Some(response) = serve_file(state, request).await {
        return response;
    }

    tracing::debug!("Not found: {}", path);
    match state.site.not_found(&path) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(inject(state, html))).into_response(),
        Err(e) => render_error(e),
    }
}

async fn serve_file(state: &ServerState, request: Request<Body>) -> Option<Response> {
    let path = request.uri().path().to_string();
    let relative = path.trim_start_matches('/');

    // Markdown sources are never served raw
    if relative.is_empty() || is_markdown_file(Path::new(relative)) {
        return None;
    }

    let mut roots = vec![
        (state.folio.static_dir.clone(), path.clone()),
        (state.folio.pages_dir.clone(), path.clone()),
    ];
    if let Some(rest) = path.strip_prefix("/blog/") {
        roots.push((state.folio.content_dir.clone(), format!("/{}", rest)));
    }
    roots.push((state.folio.public_dir.clone(), path.clone()));

    for (root, file_path) in roots {
        if !root.join(file_path.trim_start_matches('/')).is_file() {
            continue;
        }
        let Ok(uri) = file_path.parse::<Uri>() else {
            continue;
        };
        let mut file_request = Request::new(Body::empty());
        *file_request.uri_mut() = uri;

        let mut service = ServeDir::new(&root);
        return Some(match service.try_call(file_request).await {
            Ok(response) => response.into_response(),
            Err(e) => {
                tracing::error!("Failed to serve {}: {}", path, e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
            }
        });
    }

    None
}

fn html_response(state: &ServerState, rendered: Result<String>) -> Response {
    match rendered {
        Ok(html) => html_page(state, html),
        Err(e) => render_error(e),
    }
}

fn html_page(state: &ServerState, html: String) -> Response {
    Html(inject(state, html)).into_response()
}

fn inject(state: &ServerState, html: String) -> String {
    if state.live_reload {
        inject_live_reload(&html)
    } else {
        html
    }
}

fn render_error(e: anyhow::Error) -> Response {
    tracing::error!("Render error: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!(
            "{}{}{}",
            &html[..pos],
            LIVE_RELOAD_SCRIPT,
            &html[pos + "</body>".len()..]
        ),
        // If no </body> tag, append to end
        None => format!("{}{}", html, LIVE_RELOAD_SCRIPT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn app(dir: &TempDir, static_mode: bool) -> Router {
        write(
            dir,
            "content/blog/hello/index.mdx",
            "---\ntitle: Hello\ndate: 2024-03-15\ntags: [a,b]\n---\n## Intro\n\nHi\n",
        );
        write(dir, "content/blog/hello/pic.png", "png");
        write(
            dir,
            "content/blog/second.md",
            "---\ntitle: Second\ndate: 2024-03-10\ntags: [\"a,b\"]\n---\nText\n",
        );
        write(dir, "content/pages/projects.md", "---\ntitle: Projects\n---\nStuff\n");
        write(dir, "static/robots.txt", "User-agent: *\n");

        let folio = Folio::with_config(dir.path(), SiteConfig::default());
        router(Arc::new(ServerState::new(&folio, static_mode).unwrap()))
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_blog_routes() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, false);

        let (status, _, body) = fetch(app.clone(), "/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Showing 2 of 2 posts"));
        assert!(body.contains("/__livereload"));

        let (status, _, body) = fetch(app.clone(), "/blog/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<h2 id="intro">Intro</h2>"#));

        let (status, _, body) = fetch(app, "/blog/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("could not be found"));
    }

    #[tokio::test]
    async fn test_encoded_comma_filter() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, false);

        let (_, _, body) = fetch(app.clone(), "/blog?tags=a%2Cb").await;
        assert!(body.contains("Showing 1 of 1 posts (filtered)"));
        assert!(body.contains(r#"<a href="/blog/second">Second</a>"#));
        assert!(!body.contains(r#"<a href="/blog/hello">Hello</a>"#));

        // A bare comma separates the tags `a` and `b`, which only `hello` has
        let (_, _, body) = fetch(app, "/blog?tags=a,b").await;
        assert!(body.contains("Showing 1 of 1 posts (filtered)"));
        assert!(body.contains(r#"<a href="/blog/hello">Hello</a>"#));
        assert!(!body.contains(r#"<a href="/blog/second">Second</a>"#));
    }

    #[tokio::test]
    async fn test_feed_headers() {
        let dir = TempDir::new().unwrap();
        let (status, headers, body) = fetch(app(&dir, false), "/rss.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/xml");
        assert_eq!(
            headers[header::CACHE_CONTROL],
            "public, s-maxage=1200, stale-while-revalidate=600"
        );
        assert_eq!(body.matches("<item>").count(), 2);
    }

    #[tokio::test]
    async fn test_pages_and_files() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, true);

        let (status, _, body) = fetch(app.clone(), "/projects").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Stuff"));
        assert!(!body.contains("/__livereload"));

        let (status, _, body) = fetch(app.clone(), "/robots.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("User-agent"));

        let (status, _, body) = fetch(app.clone(), "/blog/hello/pic.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "png");

        let (status, _, _) = fetch(app.clone(), "/blog/second.md").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = fetch(app, "/posts.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"slug\": \"hello\"") || body.contains("\"slug\":\"hello\""));
    }

    #[test]
    fn test_inject_live_reload() {
        let html = inject_live_reload("<html><body><p>x</p></body></html>");
        assert!(html.contains("/__livereload"));
        assert!(html.ends_with("</body>\n</html>"));
        assert_eq!(html.matches("</body>").count(), 1);

        let html = inject_live_reload("<p>fragment</p>");
        assert!(html.starts_with("<p>fragment</p>"));
        assert!(html.contains("location.reload()"));
    }
}
