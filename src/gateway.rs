//! Query gateway: maps HTTP requests onto service operations.
//!
//! Transport-free: [`handle`] takes a parsed [`HttpRequest`] and returns
//! an [`HttpResponse`]; the [`HttpServer`](crate::adapters::http::HttpServer)
//! moves the bytes.
//!
//! | Path        | Response                                       |
//! |-------------|------------------------------------------------|
//! | `/`         | HTML live view                                 |
//! | `/download` | Raw CSV, as an attachment                      |
//! | `/data`     | `{"data":[...]}` projection                    |
//! | `/clear`    | Wipes the store, plain-text confirmation       |
//! | `/info`     | Store, filesystem and loop statistics as JSON  |

use core::fmt::Write as _;

use log::{info, warn};
use serde::Serialize;

use crate::app::ports::{EventSink, FileStore};
use crate::app::service::{LiveStatus, LoggerService};
use crate::diagnostics::RuntimeMetrics;

pub const CSV_FILENAME: &str = "sensor_data.csv";

/// Every path [`handle`] answers with GET.
pub const ROUTES: [&str; 5] = ["/", "/download", "/data", "/clear", "/info"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpRequest<'a> {
    pub method: Method,
    /// Path without query string.
    pub path: &'a str,
}

impl<'a> HttpRequest<'a> {
    pub fn get(path: &'a str) -> Self {
        Self {
            method: Method::Get,
            path,
        }
    }

    /// Parse an HTTP/1.x request line (`GET /data HTTP/1.1`).
    pub fn parse_request_line(line: &'a str) -> Option<Self> {
        let mut parts = line.split_ascii_whitespace();
        let method = match parts.next()? {
            "GET" => Method::Get,
            _ => Method::Other,
        };
        let target = parts.next()?;
        if !parts.next()?.starts_with("HTTP/") {
            return None;
        }
        let path = target.split_once('?').map_or(target, |(p, _)| p);
        Some(Self { method, path })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    /// Optional `Content-Disposition` value.
    pub disposition: Option<String>,
    pub body: String,
}

impl HttpResponse {
    fn new(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            content_type,
            disposition: None,
            body,
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self::new(status, "text/plain", body.to_owned())
    }

    pub fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            503 => "Service Unavailable",
            _ => "Internal Server Error",
        }
    }

    /// Full HTTP/1.1 wire form; the connection is closed after sending.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = String::with_capacity(160);
        let _ = write!(
            head,
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        );
        if let Some(d) = &self.disposition {
            let _ = write!(head, "Content-Disposition: {d}\r\n");
        }
        head.push_str("Connection: close\r\n\r\n");
        let mut out = head.into_bytes();
        out.extend_from_slice(self.body.as_bytes());
        out
    }

    pub fn bad_request() -> Self {
        Self::text(400, "Bad Request")
    }

    /// The control loop did not answer in time.
    pub fn unavailable() -> Self {
        Self::text(503, "Service Unavailable")
    }
}

#[derive(Serialize)]
struct InfoBody {
    record_count: u32,
    file_size_bytes: u64,
    fs_total_bytes: Option<u64>,
    fs_used_bytes: Option<u64>,
    uptime_secs: u64,
    heap_free_bytes: u32,
    loop_iterations: u32,
    requests_served: u32,
}

/// Dispatch one request.
pub fn handle<F: FileStore>(
    req: &HttpRequest<'_>,
    service: &mut LoggerService<F>,
    metrics: &RuntimeMetrics,
    sink: &mut impl EventSink,
) -> HttpResponse {
    if req.method != Method::Get {
        return HttpResponse::text(405, "Method Not Allowed");
    }
    match req.path {
        "/" => HttpResponse::new(
            200,
            "text/html; charset=utf-8",
            render_live(&service.live_status(), metrics),
        ),
        "/download" => match service.export_csv() {
            Ok(csv) => HttpResponse {
                disposition: Some(format!("attachment; filename={CSV_FILENAME}")),
                ..HttpResponse::new(200, "text/csv", csv)
            },
            Err(e) => {
                warn!("GET /download failed: {}", e);
                HttpResponse::text(500, "Failed to read data file")
            }
        },
        "/data" => match service.export_json() {
            Ok(json) => HttpResponse::new(200, "application/json", json),
            Err(e) => {
                warn!("GET /data failed: {}", e);
                HttpResponse::text(500, "Failed to read data file")
            }
        },
        "/clear" => match service.clear_store(sink) {
            Ok(()) => {
                info!("GET /clear: store wiped");
                HttpResponse::text(200, "Data cleared successfully")
            }
            Err(e) => {
                warn!("GET /clear failed: {}", e);
                HttpResponse::text(500, "Failed to clear data")
            }
        },
        "/info" => {
            let stats = service.store_stats();
            let capacity = service.capacity();
            let body = InfoBody {
                record_count: stats.record_count,
                file_size_bytes: stats.byte_size,
                fs_total_bytes: capacity.map(|c| c.total_bytes),
                fs_used_bytes: capacity.map(|c| c.used_bytes),
                uptime_secs: metrics.uptime_secs,
                heap_free_bytes: metrics.heap_free_bytes,
                loop_iterations: metrics.loop_iterations,
                requests_served: metrics.requests_served,
            };
            match serde_json::to_string(&body) {
                Ok(json) => HttpResponse::new(200, "application/json", json),
                Err(_) => HttpResponse::text(500, "Failed to encode info"),
            }
        }
        _ => HttpResponse::text(404, "Not Found"),
    }
}

fn render_live(status: &LiveStatus, metrics: &RuntimeMetrics) -> String {
    let mut html = String::with_capacity(1024);
    html.push_str(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"refresh\" content=\"10\">\
         <title>Room Logger</title></head><body><h1>Room Logger</h1><ul>",
    );
    match status.reading {
        Some(r) => {
            let _ = write!(
                html,
                "<li>Temperature: {:.2} &deg;C / {:.2} &deg;F</li><li>Humidity: {:.2} %</li>",
                r.temperature_c,
                r.temperature_f(),
                r.humidity_pct
            );
            if !r.is_valid() {
                html.push_str("<li>Sensor: degraded (last read failed)</li>");
            }
        }
        None => html.push_str("<li>Temperature: no reading yet</li>"),
    }
    let _ = write!(
        html,
        "<li>Motion now: {}</li><li>Motion this interval: {}</li>",
        yes_no(status.motion_active),
        yes_no(status.motion_this_interval)
    );
    if let Some(t) = status.last_motion_at {
        let _ = write!(html, "<li>Last motion (epoch): {t}</li>");
    }
    let _ = write!(
        html,
        "<li>Records: {}</li><li>Skipped intervals: {}</li>\
         <li>Interval: {} s</li><li>Uptime: {} s</li></ul>",
        status.record_count,
        status.skipped_intervals,
        status.log_interval_ms / 1000,
        metrics.uptime_secs
    );
    html.push_str(
        "<p><a href=\"/download\">Download CSV</a> | <a href=\"/data\">JSON</a> | \
         <a href=\"/info\">Info</a> | <a href=\"/clear\">Clear</a></p></body></html>",
    );
    html
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}
