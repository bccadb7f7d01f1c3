//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Servidor TCP que maneja múltiples conexiones simultáneas usando threads.
//! Cada conexión se procesa en su propio thread y es un productor de la
//! cola de jobs; ninguna espera al hardware.

use crate::config::Config;
use crate::http::request::expected_body_len;
use crate::http::{Method, Request, Response, StatusCode};
use crate::jobs::{handlers as job_handlers, JobIntake};
use crate::metrics::MetricsCollector;
use crate::router::Router;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Tamaño máximo de un request (head + body)
pub const MAX_REQUEST_BYTES: usize = 16 * 1024;

/// Tiempo máximo esperando bytes de un cliente
const READ_TIMEOUT: Duration = Duration::from_secs(5);

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Servidor HTTP/1.0 concurrente con métricas
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    metrics: MetricsCollector,
}

impl Server {
    /// Hace bind en `config.address()` y registra las rutas
    pub fn bind(config: &Config, intake: JobIntake) -> io::Result<Self> {
        let listener = TcpListener::bind(config.address())?;
        let metrics = MetricsCollector::new();
        let router = routes(intake, metrics.clone());

        Ok(Self {
            listener,
            router: Arc::new(router),
            metrics,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Corre el accept loop en un thread llamado `http`
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new().name("http".to_string()).spawn(move || {
            if let Err(e) = self.run() {
                tracing::error!(error = %e, "HTTP server stopped");
            }
        })
    }

    /// Accept loop: un thread por conexión
    pub fn run(self) -> io::Result<()> {
        let address = self.local_addr()?;
        tracing::info!(%address, routes = ?self.router.describe(), "Server listening");

        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            };

            let peer = stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            tracing::debug!(%peer, "New connection");

            let router = Arc::clone(&self.router);
            let metrics = self.metrics.clone();
            metrics.connection_opened();

            let spawned = thread::Builder::new().name("conn".to_string()).spawn(move || {
                if let Err(e) = handle_connection(stream, &router, &metrics) {
                    tracing::warn!(%peer, error = %e, "Connection error");
                }
                metrics.connection_closed();
            });

            if let Err(e) = spawned {
                self.metrics.connection_closed();
                tracing::error!(error = %e, "Failed to spawn connection thread");
            }
        }

        Ok(())
    }
}

/// Rutas del servicio
///
/// - `POST /send`: encola un job
/// - `GET /status`: executor y cola
/// - `GET /metrics`: métricas HTTP
pub fn routes(intake: JobIntake, metrics: MetricsCollector) -> Router {
    let mut router = Router::new();

    let send_intake = intake.clone();
    router.register(Method::POST, "/send", move |req| {
        job_handlers::send_handler(req, &send_intake)
    });
    router.register(Method::GET, "/status", move |req| {
        job_handlers::status_handler(req, &intake)
    });
    router.register(Method::GET, "/metrics", move |_req| Response::json(&metrics.to_json()));

    router
}

/// ID único por request: contador del proceso mezclado con reloj y thread
fn next_request_id() -> String {
    let mut hasher = DefaultHasher::new();
    REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
        .hash(&mut hasher);
    thread::current().id().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Resultado de leer el request crudo
enum ReadOutcome {
    /// El cliente cerró sin mandar nada
    Closed,
    Complete(Vec<u8>),
    TooLarge,
}

/// Lee hasta tener el head completo más `Content-Length` bytes de body
fn read_request(stream: &mut TcpStream) -> io::Result<ReadOutcome> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(if buffer.is_empty() {
                ReadOutcome::Closed
            } else {
                ReadOutcome::Complete(buffer)
            });
        }
        buffer.extend_from_slice(&chunk[..n]);

        match expected_body_len(&buffer) {
            Ok(Some((body_start, body_len))) => {
                let end = match body_start.checked_add(body_len) {
                    Some(end) if end <= MAX_REQUEST_BYTES => end,
                    _ => return Ok(ReadOutcome::TooLarge),
                };
                if buffer.len() >= end {
                    return Ok(ReadOutcome::Complete(buffer));
                }
            }
            Ok(None) if buffer.len() > MAX_REQUEST_BYTES => return Ok(ReadOutcome::TooLarge),
            Ok(None) => {}
            // Que el parser completo produzca el error
            Err(_) => return Ok(ReadOutcome::Complete(buffer)),
        }
    }
}

/// Atiende una conexión: un request, una response
pub fn handle_connection(
    mut stream: TcpStream,
    router: &Router,
    metrics: &MetricsCollector,
) -> io::Result<()> {
    let start = Instant::now();
    let request_id = next_request_id();
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let (mut response, method, path) = match read_request(&mut stream)? {
        ReadOutcome::Closed => {
            tracing::debug!("Connection closed before sending a request");
            return Ok(());
        }
        ReadOutcome::TooLarge => (
            Response::error(
                StatusCode::PayloadTooLarge,
                &format!("Request exceeds {} bytes", MAX_REQUEST_BYTES),
            ),
            "-",
            "<too-large>".to_string(),
        ),
        ReadOutcome::Complete(buffer) => match Request::parse(&buffer) {
            Ok(request) => {
                // Solo las rutas registradas tienen contador propio
                let path = if router.has_path(request.path()) {
                    request.path().to_string()
                } else {
                    "<unknown>".to_string()
                };
                (router.route(&request), request.method().as_str(), path)
            }
            Err(e) => (
                Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e)),
                "-",
                "<invalid>".to_string(),
            ),
        },
    };

    response.add_header("X-Request-Id", &request_id);
    response.add_header("Server", concat!("rf_sender/", env!("CARGO_PKG_VERSION")));
    response.add_header("Connection", "close");

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    let latency = start.elapsed();
    let status = response.status();
    metrics.record_request(&path, status.as_u16(), latency);

    tracing::info!(
        request_id = %request_id,
        method,
        path = %path,
        status = status.as_u16(),
        latency_us = latency.as_micros() as u64,
        "Request handled"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{Backpressure, ExecutorStats, JobQueue, PinRange};
    use std::net::Shutdown;

    fn ephemeral_listener() -> TcpListener {
        TcpListener::bind("127.0.0.1:0").expect("bind")
    }

    fn intake() -> JobIntake {
        JobIntake::new(
            JobQueue::new(8, Backpressure::Reject),
            PinRange::default(),
            Arc::new(ExecutorStats::default()),
            5,
        )
    }

    /// Atiende una conexión en otro thread y ejecuta `client` contra ella
    fn exchange(intake: JobIntake, metrics: MetricsCollector, client: impl FnOnce(&mut TcpStream)) -> String {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let router = routes(intake, metrics.clone());

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &router, &metrics).unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        client(&mut stream);

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        server.join().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_send_ok_with_common_headers() {
        let intake = intake();
        let body = r#"{"gpioPin": 10, "code": 12345678}"#;
        let raw = format!("POST /send HTTP/1.0\r\nContent-Length: {}\r\n\r\n{}", body.len(), body);

        let text = exchange(intake.clone(), MetricsCollector::new(), |s| {
            s.write_all(raw.as_bytes()).unwrap();
        });

        assert!(text.starts_with("HTTP/1.0 200 OK"));
        assert!(text.contains("X-Request-Id: "));
        assert!(text.contains("Connection: close"));
        assert!(text.ends_with("\r\n\r\n{}"));
        assert_eq!(intake.queue().len(), 1);
    }

    #[test]
    fn test_body_arriving_after_head() {
        let intake = intake();
        let body = r#"{"gpioPin": 4, "code": 1}"#;
        let head = format!("POST /send HTTP/1.0\r\nContent-Length: {}\r\n\r\n", body.len());

        let text = exchange(intake.clone(), MetricsCollector::new(), |s| {
            s.write_all(head.as_bytes()).unwrap();
            s.flush().unwrap();
            thread::sleep(Duration::from_millis(50));
            s.write_all(body.as_bytes()).unwrap();
        });

        assert!(text.starts_with("HTTP/1.0 200 OK"));
        assert_eq!(intake.queue().dequeue().map(|j| j.code()), Some(1));
    }

    #[test]
    fn test_parse_error() {
        let text = exchange(intake(), MetricsCollector::new(), |s| {
            s.write_all(b"\x00\x01\x02\x03garbage").unwrap();
            s.shutdown(Shutdown::Write).unwrap();
        });

        assert!(text.contains("400 Bad Request"));
        assert!(text.contains("Invalid request"));
    }

    #[test]
    fn test_declared_body_too_large() {
        let text = exchange(intake(), MetricsCollector::new(), |s| {
            s.write_all(b"POST /send HTTP/1.0\r\nContent-Length: 1000000\r\n\r\n").unwrap();
        });

        assert!(text.contains("413 Payload Too Large"));
    }

    #[test]
    fn test_content_length_overflow_is_too_large() {
        let metrics = MetricsCollector::new();
        let text = exchange(intake(), metrics.clone(), |s| {
            s.write_all(b"POST /send HTTP/1.0\r\nContent-Length: 18446744073709551615\r\n\r\n").unwrap();
        });

        assert!(text.contains("413 Payload Too Large"));
        assert_eq!(metrics.snapshot().requests_per_path["<too-large>"], 1);
    }

    #[test]
    fn test_unknown_paths_share_one_counter() {
        let metrics = MetricsCollector::new();
        for path in ["/a1", "/a2", "/a3"] {
            let raw = format!("GET {} HTTP/1.0\r\n\r\n", path);
            let text = exchange(intake(), metrics.clone(), |s| s.write_all(raw.as_bytes()).unwrap());
            assert!(text.contains("404 Not Found"));
        }

        let per_path = metrics.snapshot().requests_per_path;
        assert_eq!(per_path.len(), 1);
        assert_eq!(per_path["<unknown>"], 3);
    }

    #[test]
    fn test_metrics_record_requests() {
        let metrics = MetricsCollector::new();

        exchange(intake(), metrics.clone(), |s| {
            s.write_all(b"GET /status HTTP/1.0\r\n\r\n").unwrap();
        });
        let text = exchange(intake(), metrics.clone(), |s| {
            s.write_all(b"GET /metrics HTTP/1.0\r\n\r\n").unwrap();
        });

        assert!(text.contains("\"total_requests\": 1"));
        assert_eq!(metrics.snapshot().total_requests, 2);
        assert_eq!(metrics.snapshot().requests_per_path["/status"], 1);
    }

    #[test]
    fn test_peer_closed_immediately() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let router = Router::new();
        let metrics = MetricsCollector::new();

        let server = thread::spawn({
            let metrics = metrics.clone();
            move || {
                let (stream, _) = listener.accept().unwrap();
                handle_connection(stream, &router, &metrics).unwrap();
            }
        });

        drop(TcpStream::connect(addr).unwrap());
        server.join().unwrap();
        assert_eq!(metrics.snapshot().total_requests, 0);
    }

    #[test]
    fn test_request_ids_differ() {
        assert_ne!(next_request_id(), next_request_id());
    }
}
