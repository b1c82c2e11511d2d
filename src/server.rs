//! Development HTTP server for the `build/` tree.
//!
//! Static files are served with `Cache-Control: no-store`. HTML responses
//! get a small live-reload client injected before `</body>`; the client
//! long-polls `/__livereload?since=<version>` and either swaps stylesheets
//! (`css`) or reloads the page (`full`) when the version moves.
//!
//! Every request is answered on its own thread, so a parked long-poll never
//! blocks asset requests.

use crate::reload::{ReloadHub, ReloadState};
use maud::{DOCTYPE, Markup, html};
use std::fs;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Path the live-reload client polls.
pub const LIVERELOAD_PATH: &str = "/__livereload";

/// How long a poll is parked before answering with the unchanged version.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(25);

const LIVERELOAD_CLIENT: &str = r#"<script>
(function () {
  var version = null;
  function swapStyles() {
    document.querySelectorAll('link[rel="stylesheet"]').forEach(function (link) {
      var url = new URL(link.href);
      url.searchParams.set('livereload', Date.now());
      link.href = url.toString();
    });
  }
  function poll() {
    var url = '/__livereload' + (version === null ? '' : '?since=' + version);
    fetch(url, { cache: 'no-store' })
      .then(function (r) { return r.json(); })
      .then(function (state) {
        if (version !== null && state.version !== version) {
          if (state.kind !== 'css') { location.reload(); return; }
          swapStyles();
        }
        version = state.version;
        poll();
      })
      .catch(function () { setTimeout(poll, 1000); });
  }
  poll();
})();
</script>
"#;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },
}

/// A response before it is handed to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn html(status: u16, page: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body: inject_client(&page).into_bytes(),
        }
    }

    fn json(state: ReloadState) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: serde_json::to_vec(&state).unwrap_or_default(),
        }
    }
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" | "webmanifest" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "avif" => "image/avif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Insert the live-reload client before the last `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    match html.rfind("</body>") {
        Some(at) => format!("{}{}{}", &html[..at], LIVERELOAD_CLIENT, &html[at..]),
        None => format!("{html}{LIVERELOAD_CLIENT}"),
    }
}

fn not_found_page(path: &str) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "404 Not Found" }
            }
            body {
                h1 { "404 Not Found" }
                p { "Nothing in the build tree for " code { (path) } "." }
            }
        }
    }
}

/// Decode `%XX` escapes; malformed escapes are kept literally.
fn percent_decode(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = path.get(i + 1..i + 3)
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            out.push(byte);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Map a URL path onto the served tree. `None` for anything that tries to
/// leave it.
pub fn resolve_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode(url_path);
    let relative = Path::new(decoded.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if resolved.is_dir() {
        resolved.push("index.html");
    }
    Some(resolved)
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Answer one request URL.
pub fn respond(root: &Path, url: &str, hub: &ReloadHub, poll_timeout: Duration) -> Reply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    if path == LIVERELOAD_PATH {
        return match query_param(query, "since").and_then(|v| v.parse().ok()) {
            Some(since) => Reply::json(hub.wait_since(since, poll_timeout)),
            None => Reply::json(hub.current()),
        };
    }

    let Some(file) = resolve_path(root, path) else {
        return Reply {
            status: 403,
            content_type: "text/plain; charset=utf-8",
            body: b"Forbidden".to_vec(),
        };
    };
    match fs::read(&file) {
        Ok(body) => {
            let content_type = content_type(&file);
            if content_type.starts_with("text/html") {
                Reply::html(200, String::from_utf8_lossy(&body).into_owned())
            } else {
                Reply {
                    status: 200,
                    content_type,
                    body,
                }
            }
        }
        Err(_) => Reply::html(404, not_found_page(path).into_string()),
    }
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn handle(request: Request, root: &Path, hub: &ReloadHub) {
    let reply = respond(root, request.url(), hub, POLL_TIMEOUT);
    let mut response = Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    for h in [
        header("Content-Type", reply.content_type),
        header("Cache-Control", "no-store"),
    ]
    .into_iter()
    .flatten()
    {
        response.add_header(h);
    }
    // The browser may have gone away; nothing to do about it
    let _ = request.respond(response);
}

/// A bound server, not yet accepting.
pub struct DevServer {
    server: Arc<Server>,
    root: PathBuf,
    hub: Arc<ReloadHub>,
}

impl DevServer {
    pub fn bind(host: &str, port: u16, root: PathBuf, hub: Arc<ReloadHub>) -> Result<Self, ServeError> {
        let addr = format!("{host}:{port}");
        let server = Server::http(&addr).map_err(|e| ServeError::Bind {
            addr: addr.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            server: Arc::new(server),
            root,
            hub,
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Accept requests on a background thread until [`ServerHandle::shutdown`].
    pub fn spawn(self) -> ServerHandle {
        let server = Arc::clone(&self.server);
        let thread = thread::spawn(move || {
            for request in self.server.incoming_requests() {
                let root = self.root.clone();
                let hub = Arc::clone(&self.hub);
                thread::spawn(move || handle(request, &root, &hub));
            }
        });
        ServerHandle { server, thread }
    }
}

pub struct ServerHandle {
    server: Arc<Server>,
    thread: JoinHandle<()>,
}

impl ServerHandle {
    pub fn shutdown(self) {
        self.server.unblock();
        let _ = self.thread.join();
    }
}
