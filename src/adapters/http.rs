//! HTTP transport for the query gateway.
//!
//! Both builds expose the same polled API: the control loop calls
//! [`HttpServer::poll`] once per iteration and answers at most one
//! request through [`gateway::handle`](crate::gateway::handle), so the
//! service is only ever touched from the loop.
//!
//! - **ESP32**: `EspHttpServer` registers a GET handler for each of
//!   [`ROUTES`](crate::gateway::ROUTES).  A handler runs on the httpd
//!   task; it queues the path to the loop and blocks until the loop
//!   replies (or times out with 503).  Unregistered paths and other
//!   methods are rejected by httpd itself.
//! - **Host**: a non-blocking `std::net::TcpListener`.  Only the request
//!   line is interpreted; headers are read and discarded and every
//!   response closes the connection.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    /// The listen socket (or httpd instance) could not be created.
    Bind,
    /// Socket or handler configuration failed.
    Io,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind => write!(f, "bind failed"),
            Self::Io => write!(f, "socket I/O error"),
        }
    }
}

#[cfg(target_os = "espidf")]
pub use device::HttpServer;
#[cfg(not(target_os = "espidf"))]
pub use host::HttpServer;

// ── ESP32: esp-idf httpd ──────────────────────────────────────

#[cfg(target_os = "espidf")]
mod device {
    use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
    use std::time::Duration;

    use esp_idf_svc::http::Method as EspMethod;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::{EspIOError, Write};
    use log::{debug, info, warn};

    use super::HttpError;
    use crate::gateway::{HttpRequest, HttpResponse, ROUTES};

    /// How long an httpd worker waits for the control loop's answer.
    /// Must cover one loop iteration including a sensor retry.
    const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

    /// A request handed from the httpd task to the control loop.
    struct Pending {
        path: &'static str,
        reply: SyncSender<HttpResponse>,
    }

    pub struct HttpServer {
        // Dropping the server stops httpd.
        _httpd: EspHttpServer<'static>,
        requests: Receiver<Pending>,
        served: u32,
    }

    impl HttpServer {
        pub fn bind(port: u16) -> Result<Self, HttpError> {
            let config = Configuration {
                http_port: port,
                ..Default::default()
            };
            let mut httpd = EspHttpServer::new(&config).map_err(|e| {
                warn!("HTTP: httpd start on :{} failed: {}", port, e);
                HttpError::Bind
            })?;

            let (queue, requests) = mpsc::channel::<Pending>();
            for path in ROUTES {
                let queue = queue.clone();
                httpd
                    .fn_handler(path, EspMethod::Get, move |req| -> Result<(), EspIOError> {
                        let (reply, answer) = mpsc::sync_channel(1);
                        let response = match queue.send(Pending { path, reply }) {
                            Ok(()) => answer
                                .recv_timeout(REPLY_TIMEOUT)
                                .unwrap_or_else(|_| HttpResponse::unavailable()),
                            Err(_) => HttpResponse::unavailable(),
                        };
                        let mut headers = vec![("Content-Type", response.content_type)];
                        if let Some(d) = response.disposition.as_deref() {
                            headers.push(("Content-Disposition", d));
                        }
                        let mut out =
                            req.into_response(response.status, Some(response.reason()), &headers)?;
                        out.write_all(response.body.as_bytes())?;
                        Ok(())
                    })
                    .map_err(|e| {
                        warn!("HTTP: register {} failed: {}", path, e);
                        HttpError::Io
                    })?;
            }

            info!("HTTP: httpd listening on :{} ({} routes)", port, ROUTES.len());
            Ok(Self {
                _httpd: httpd,
                requests,
                served: 0,
            })
        }

        /// Requests answered since bind.
        pub fn served(&self) -> u32 {
            self.served
        }

        /// Answer at most one queued request.  Returns `true` if one was
        /// handled.
        pub fn poll(&mut self, handler: impl FnOnce(&HttpRequest<'_>) -> HttpResponse) -> bool {
            let pending = match self.requests.try_recv() {
                Ok(p) => p,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return false,
            };
            debug!("HTTP: GET {}", pending.path);
            let response = handler(&HttpRequest::get(pending.path));
            if pending.reply.send(response).is_err() {
                warn!("HTTP: client for {} gave up before the reply", pending.path);
            }
            self.served = self.served.wrapping_add(1);
            true
        }
    }
}

// ── Host: polled TcpListener ──────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod host {
    use std::io::{ErrorKind, Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::time::Duration;

    use log::{debug, info, warn};

    use super::HttpError;
    use crate::gateway::{HttpRequest, HttpResponse};

    /// Upper bound on request head size.  Anything past it is ignored.
    const MAX_REQUEST_HEAD: usize = 2048;
    const IO_TIMEOUT: Duration = Duration::from_millis(500);

    pub struct HttpServer {
        listener: TcpListener,
        served: u32,
    }

    impl HttpServer {
        /// Listen on all interfaces.  Port 0 picks a free port.
        pub fn bind(port: u16) -> Result<Self, HttpError> {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = TcpListener::bind(addr).map_err(|e| {
                warn!("HTTP: bind :{} failed: {}", port, e);
                HttpError::Bind
            })?;
            listener.set_nonblocking(true).map_err(|_| HttpError::Io)?;
            info!("HTTP: listening on {:?}", listener.local_addr().ok());
            Ok(Self {
                listener,
                served: 0,
            })
        }

        pub fn local_addr(&self) -> Option<SocketAddr> {
            self.listener.local_addr().ok()
        }

        /// Requests answered since bind.
        pub fn served(&self) -> u32 {
            self.served
        }

        /// Serve at most one pending connection.
        ///
        /// Returns `true` if a client was handled.  `handler` only runs for a
        /// well-formed request line; anything else gets a 400.
        pub fn poll(&mut self, handler: impl FnOnce(&HttpRequest<'_>) -> HttpResponse) -> bool {
            let (mut stream, peer) = match self.listener.accept() {
                Ok(conn) => conn,
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => return false,
                Err(e) => {
                    warn!("HTTP: accept error: {}", e);
                    return false;
                }
            };
            if configure(&stream).is_err() {
                warn!("HTTP: could not configure client socket");
                return false;
            }

            let head = read_head(&mut stream);
            let request_line = head.lines().next().unwrap_or("");
            let response = match HttpRequest::parse_request_line(request_line) {
                Some(req) => {
                    debug!("HTTP: {} {:?} {}", peer, req.method, req.path);
                    handler(&req)
                }
                None => HttpResponse::bad_request(),
            };

            if let Err(e) = stream.write_all(&response.to_bytes()).and_then(|()| stream.flush()) {
                warn!("HTTP: write to {} failed: {}", peer, e);
            }
            self.served = self.served.wrapping_add(1);
            true
        }
    }

    fn configure(stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))
    }

    /// Read until the blank line ending the request head, EOF, timeout, or
    /// the size cap.  Whatever arrived is returned as (lossy) text.
    fn read_head(stream: &mut TcpStream) -> String {
        let mut buf = Vec::with_capacity(512);
        let mut chunk = [0u8; 256];
        while buf.len() < MAX_REQUEST_HEAD {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

}
