pub mod manager;

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;

use anyhow::{anyhow, Context as AnyhowContext, Result};
use serde_json::{json, Value};
use tiny_http::{Header, Response, StatusCode};
use url::Url;

use crate::endpoint::{error_body, to_wire, OptionsEndpoint};
use crate::logging::{log_error, log_info};
use crate::result::{FailureKind, JsonResult};
use crate::scope::ScopePath;

pub use manager::HttpHostControl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    pub host: String,
    pub port: u16,
    pub base_path: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_path: "/".to_string(),
        }
    }
}

fn normalize_segment(segment: &str) -> Option<String> {
    let trimmed = segment.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return None;
    }
    let stripped = trimmed.trim_matches('/');
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

fn join_paths(parts: &[&str]) -> String {
    let segments: Vec<String> = parts.iter().filter_map(|part| normalize_segment(part)).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Binds the host socket and serves the options routes until the returned
/// control is stopped. The accept loop runs on a background thread and each
/// request is handled on its own thread.
pub fn start_options_host(
    endpoint: OptionsEndpoint,
    settings: &HostSettings,
) -> Result<HttpHostControl> {
    let base_path = join_paths(&["/", &settings.base_path]);
    let listener = TcpListener::bind((settings.host.as_str(), settings.port))
        .with_context(|| format!("unable to bind options host on {}:{}", settings.host, settings.port))?;
    let actual_port = listener.local_addr()?.port();
    let server = Arc::new(
        tiny_http::Server::from_listener(listener, None)
            .map_err(|err| anyhow!("failed to create HTTP server: {err}"))?,
    );
    let running = Arc::new(AtomicBool::new(true));

    let public_host = match settings.host.as_str() {
        "0.0.0.0" | "::" => "127.0.0.1",
        other => other,
    };
    let url = if base_path != "/" {
        format!("http://{}:{}{}", public_host, actual_port, base_path)
    } else {
        format!("http://{}:{}", public_host, actual_port)
    };

    let server_for_thread = Arc::clone(&server);
    let running_flag = Arc::clone(&running);
    let base_for_thread = base_path.clone();
    let thread_handle = thread::spawn(move || {
        let mut incoming = server_for_thread.incoming_requests();
        while running_flag.load(Ordering::SeqCst) {
            match incoming.next() {
                Some(request) => {
                    // One thread per request: a slow remote fetch only stalls its own caller.
                    let endpoint = endpoint.clone();
                    let base_path = base_for_thread.clone();
                    thread::spawn(move || {
                        if let Err(err) = handle_http_request(&endpoint, &base_path, request) {
                            log_error(
                                "options host handler error",
                                Some(json!({ "error": err.to_string() })),
                                Some(json!({ "module": "http" })),
                            );
                        }
                    });
                }
                None => {
                    if !running_flag.load(Ordering::SeqCst) {
                        break;
                    }
                }
            }
        }
    });

    log_info(
        "options host listening",
        Some(json!({ "url": url, "basePath": base_path })),
        Some(json!({ "module": "http" })),
    );
    Ok(HttpHostControl::new(server, running, thread_handle, url))
}

fn handle_http_request(
    endpoint: &OptionsEndpoint,
    base_path: &str,
    request: tiny_http::Request,
) -> Result<()> {
    let method = request.method().as_str().to_uppercase();
    let (status, body) = route(endpoint, base_path, &method, request.url())?;
    let content_type = Header::from_bytes("content-type", "application/json")
        .map_err(|_| anyhow!("invalid content-type header"))?;
    let response = Response::from_string(body.to_string())
        .with_status_code(StatusCode(status))
        .with_header(content_type);
    request.respond(response)?;
    Ok(())
}

/// Dispatches one request to the options routes, returning status and JSON
/// body:
///
/// - `GET <base>/options?job=&param=&refValue=` refresh after a reference change
/// - `GET <base>/render?job=&param=` initial option list
/// - `GET <base>/documents?scope=` documents visible from a scope
pub fn route(
    endpoint: &OptionsEndpoint,
    base_path: &str,
    method: &str,
    raw_url: &str,
) -> Result<(u16, Value)> {
    let parsed = Url::parse(&format!("http://local.host{raw_url}"))?;
    let path = join_paths(&["/", parsed.path()]);
    let mut query: HashMap<String, String> = HashMap::new();
    for (key, value) in parsed.query_pairs() {
        query
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    let param = |name: &str| query.get(name).map(String::as_str).unwrap_or("");

    let options_route = join_paths(&[base_path, "options"]);
    let render_route = join_paths(&[base_path, "render"]);
    let documents_route = join_paths(&[base_path, "documents"]);

    if path != options_route && path != render_route && path != documents_route {
        return Ok((404, json!({ "error": "Not found" })));
    }
    if method != "GET" {
        return Ok((405, json!({ "error": "Method not allowed" })));
    }

    if path == documents_route {
        let scope = ScopePath::parse(param("scope"));
        let items = serde_json::to_value(endpoint.documents(&scope))?;
        return Ok((200, items));
    }

    let job = param("job");
    if job.trim().is_empty() {
        return Ok((
            400,
            json!({ "error": "query parameter 'job' is required", "code": FailureKind::NoJobContext.code() }),
        ));
    }
    let name = match query.get("param").or_else(|| query.get("name")) {
        Some(name) => name.as_str(),
        None => "",
    };

    let result = if path == options_route {
        endpoint.handle(job, name, param("refValue"))
    } else {
        endpoint.render(job, name)
    };

    match &result {
        JsonResult::Failure(failure) if failure.is_context_loss() => Ok((404, error_body(failure))),
        _ => Ok((200, to_wire(&result))),
    }
}
