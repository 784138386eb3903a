//! HTTP server for the web dashboard
//!
//! `engagedash serve` → prepares the data once, then answers each request
//! from the shared derived table with its own filter state.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::dashboard::{self, Snapshot};
use crate::filters::FilterState;
use crate::report::{self, FilterView};
use crate::table::Table;

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(error: String) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Serialize)]
struct FiltersBody<'a> {
    source: String,
    rows: usize,
    filters: Vec<FilterView<'a>>,
}

#[derive(Serialize)]
struct DashboardBody<'a> {
    filters: Vec<FilterView<'a>>,
    snapshot: &'a Snapshot,
}

/// Read-only state shared by every request
pub struct ServerContext {
    table: Arc<Table>,
    /// All options selected; cloned per request
    defaults: FilterState,
    config: DashboardConfig,
    source: PathBuf,
}

impl ServerContext {
    pub fn new(table: Arc<Table>, config: DashboardConfig, source: PathBuf) -> Self {
        let defaults = FilterState::from_table(&table);
        Self {
            table,
            defaults,
            config,
            source,
        }
    }
}

/// A response before it is bound to a request
#[derive(Debug, PartialEq)]
struct Reply {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => Self {
                status: 500,
                content_type: "text/plain",
                body: format!("serialization failed: {}", e),
            },
        }
    }
}

/// Start the dashboard server
pub fn start(port: u16, ctx: ServerContext) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);
    info!(%url, rows = ctx.table.len(), "dashboard server listening");

    eprintln!("\n\x1b[1;32mengagedash\x1b[0m");
    eprintln!("   Dashboard: {}", url);
    eprintln!("   Press Ctrl+C to stop\n");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &ctx) {
            warn!(error = %e, "failed to answer request");
        }
    }

    Ok(())
}

fn handle_request(request: Request, ctx: &ServerContext) -> std::io::Result<()> {
    let reply = route(request.method(), request.url(), ctx);
    debug!(method = %request.method(), url = request.url(), status = reply.status, "request");

    let header = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "bad content type"))?;
    let response = Response::from_string(reply.body)
        .with_status_code(reply.status)
        .with_header(header);
    request.respond(response)
}

fn route(method: &Method, url: &str, ctx: &ServerContext) -> Reply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Reply {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: report::html::live_page(),
        },

        // API: filter fields and their options
        (&Method::Get, "/api/filters") => Reply::json(
            200,
            &ApiResponse::success(FiltersBody {
                source: ctx.source.display().to_string(),
                rows: ctx.table.len(),
                filters: report::filter_views(&ctx.defaults),
            }),
        ),

        // API: one render pass for the selection in the query string
        (&Method::Get, "/api/dashboard") => dashboard_reply(query, ctx),

        _ => Reply {
            status: 404,
            content_type: "text/plain",
            body: "Not found".to_string(),
        },
    }
}

fn dashboard_reply(query: &str, ctx: &ServerContext) -> Reply {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
        Ok(pairs) => pairs,
        Err(e) => return Reply::json(400, &ApiResponse::<()>::failure(format!("Invalid query: {}", e))),
    };

    let mut filters = ctx.defaults.clone();
    if let Err(e) = filters.restrict(&pairs) {
        return Reply::json(400, &ApiResponse::<()>::failure(e.to_string()));
    }

    let snapshot = dashboard::build(&ctx.table, &filters, &ctx.config);
    Reply::json(
        200,
        &ApiResponse::success(DashboardBody {
            filters: report::filter_views(&filters),
            snapshot: &snapshot,
        }),
    )
}
