use crate::api::{add_or_update_domain, get_all_domains};
use crate::navigation::{NavigationController, NavigationDecision, NavigationEvent};
use anyhow::bail;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};

const MAX_REQUEST_SIZE: usize = 64 * 1024;
const CONTROL_PREFIX: &str = "/_domains";
const READ_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn handle_http_connections(
    listener: TcpListener,
    controller: Arc<NavigationController>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let active_tasks: Arc<Mutex<Vec<tokio::task::JoinHandle<()>>>> =
        Arc::new(Mutex::new(Vec::new()));

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, client_addr) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!("Failed to accept connection: {}", err);
                        continue;
                    }
                };
                let active_tasks_clone = active_tasks.clone();
                let controller_clone = controller.clone();

                let task_handle = tokio::spawn(async move {
                    debug!("Connection from {}", client_addr);
                    if let Err(err) = serve_http(controller_clone, socket).await {
                        error!("Error handling HTTP connection from {}: {:?}", client_addr, err);
                    }

                    let mut tasks = active_tasks_clone.lock().await;
                    tasks.retain(|handle| !handle.is_finished());
                });

                active_tasks.lock().await.push(task_handle);
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("Shutdown signal received in HTTP handler. Stopping...");

                    let tasks = active_tasks.lock().await.drain(..).collect::<Vec<_>>();
                    for task in tasks {
                        task.abort();
                        let _ = task.await;
                    }
                    break;
                }
            }
        }
    }
}

pub async fn serve_http(controller: Arc<NavigationController>, mut socket: TcpStream) -> anyhow::Result<()> {
    let raw = read_request(&mut socket, READ_TIMEOUT).await?;
    let request = String::from_utf8_lossy(&raw);

    let response = match parse_request(&request) {
        Ok(request) => respond(&controller, &request),
        Err(err) => {
            warn!("Rejecting request: {}", err);
            Response::text(400, "Bad Request", err.to_string())
        }
    };

    socket.write_all(response.to_http().as_bytes()).await?;
    socket.shutdown().await?;

    Ok(())
}

/// Reads one request, giving up when it is not complete within `limit`.
async fn read_request(socket: &mut TcpStream, limit: Duration) -> anyhow::Result<Vec<u8>> {
    tokio::time::timeout(limit, read_until_complete(socket))
        .await
        .map_err(|_| anyhow::anyhow!("Timed out after {:?} waiting for request", limit))?
}

/// Reads until the end of the headers plus `Content-Length` bytes of body.
async fn read_until_complete(socket: &mut TcpStream) -> anyhow::Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(1024);
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = socket.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        raw.extend_from_slice(&buffer[..bytes_read]);

        if raw.len() > MAX_REQUEST_SIZE {
            bail!("Request exceeds {} bytes", MAX_REQUEST_SIZE);
        }
        if let Some(expected) = expected_len(&raw) {
            if raw.len() >= expected {
                break;
            }
        }
    }

    Ok(raw)
}

fn expected_len(raw: &[u8]) -> Option<usize> {
    let head_end = raw.windows(4).position(|w| w == b"\r\n\r\n")? + 4;
    let head = String::from_utf8_lossy(&raw[..head_end]);
    let content_length = header(&head, "content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    Some(head_end + content_length)
}

fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Request<'a> {
    method: &'a str,
    target: &'a str,
    host: Option<&'a str>,
    body: &'a str,
}

pub(crate) fn parse_request(request: &str) -> anyhow::Result<Request<'_>> {
    let (head, body) = request.split_once("\r\n\r\n").unwrap_or((request, ""));

    let parts: Vec<&str> = head
        .lines()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty request"))?
        .split_whitespace()
        .collect();

    if parts.len() != 3 || !parts[2].starts_with("HTTP/") {
        bail!("Invalid request line");
    }

    Ok(Request {
        method: parts[0],
        target: parts[1],
        host: header(head, "host"),
        body,
    })
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Response {
    status: u16,
    reason: &'static str,
    location: Option<String>,
    content_type: &'static str,
    body: String,
}

impl Response {
    fn text(status: u16, reason: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            location: None,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
        }
    }

    fn redirect(location: String) -> Self {
        Self {
            location: Some(location),
            ..Self::text(302, "Found", "")
        }
    }

    fn to_http(&self) -> String {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, self.reason);
        if let Some(location) = &self.location {
            head.push_str(&format!("Location: {}\r\n", location));
        }
        head.push_str(&format!(
            "Content-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.content_type,
            self.body.len()
        ));
        head + &self.body
    }
}

pub(crate) fn respond(controller: &NavigationController, request: &Request<'_>) -> Response {
    if request.method.eq_ignore_ascii_case("CONNECT") {
        error!("Received unsupported CONNECT request for {}", request.target);
        return Response::text(405, "Method Not Allowed", "CONNECT is not supported\n");
    }

    let url = if request.target.starts_with('/') {
        if request.target == CONTROL_PREFIX || request.target.starts_with("/_domains/") {
            return control(controller, request);
        }
        match request.host {
            Some(host) => format!("http://{}{}", host, request.target),
            None => return Response::text(400, "Bad Request", "Missing Host header\n"),
        }
    } else {
        request.target.to_string()
    };

    match controller.decide(&NavigationEvent::WillNavigate(url.clone())) {
        Ok(NavigationDecision::Redirect(location)) | Ok(NavigationDecision::Load(location)) => {
            info!("Redirecting {} to {}", url, location);
            Response::redirect(location)
        }
        Ok(NavigationDecision::Proceed) => {
            debug!("No mapping for {}", url);
            Response::text(502, "Bad Gateway", format!("No mapping for {}\n", url))
        }
        Err(err) => Response::text(400, "Bad Request", format!("{}\n", err)),
    }
}

fn control(controller: &NavigationController, request: &Request<'_>) -> Response {
    let resolver = controller.resolver();

    match (request.method, request.target.strip_prefix("/_domains/")) {
        ("GET", None) => match serde_yaml::to_string(&get_all_domains(resolver)) {
            Ok(body) => Response {
                content_type: "application/yaml",
                ..Response::text(200, "OK", body)
            },
            Err(err) => Response::text(500, "Internal Server Error", format!("{}\n", err)),
        },
        ("PUT", Some(hostname)) => {
            let update = add_or_update_domain(resolver, hostname, request.body);
            match update.error {
                None => Response::text(204, "No Content", ""),
                Some(err) => Response::text(400, "Bad Request", format!("{}\n", err)),
            }
        }
        _ => Response::text(405, "Method Not Allowed", ""),
    }
}
