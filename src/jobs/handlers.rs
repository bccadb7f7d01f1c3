//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Implementa los endpoints del sistema de jobs:
//! - `POST /send`
//! - `GET /status`

use crate::error::EnqueueError;
use crate::http::{Request, Response, StatusCode};
use crate::jobs::executor::{ExecutorSnapshot, ExecutorStats};
use crate::jobs::job::{Job, PinRange};
use crate::jobs::queue::{JobQueue, QueueStats};
use serde::Serialize;
use std::sync::Arc;

/// Lo que necesitan los handlers: la cola, las reglas de validación
/// y los contadores del executor
#[derive(Clone)]
pub struct JobIntake {
    queue: JobQueue,
    pins: PinRange,
    executor: Arc<ExecutorStats>,
    retry_after_secs: u64,
}

impl JobIntake {
    pub fn new(queue: JobQueue, pins: PinRange, executor: Arc<ExecutorStats>, retry_after_secs: u64) -> Self {
        Self {
            queue,
            pins,
            executor,
            retry_after_secs,
        }
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }
}

/// Body de `/status`
#[derive(Debug, Serialize)]
struct StatusBody {
    executor: ExecutorSnapshot,
    queue: QueueStats,
}

/// Handler para `POST /send`
///
/// Valida el body, encola el job y responde apenas queda encolado,
/// sin esperar a que se transmita.
///
/// # Body
/// ```json
/// {"gpioPin": 10, "code": 12345678}
/// ```
///
/// # Response
/// `200 OK` con `{}`. El ack solo confirma que el job quedó en la cola.
pub fn send_handler(req: &Request, intake: &JobIntake) -> Response {
    let job = match Job::from_json(req.body(), &intake.pins) {
        Ok(job) => job,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected /send request");
            return Response::error(
                StatusCode::BadRequest,
                &format!("Request validation failed: {}", e),
            );
        }
    };

    let (pin, code) = (job.pin(), job.code());

    match intake.queue.enqueue(job) {
        Ok(()) => {
            tracing::info!(pin, code, depth = intake.queue.len(), "Enqueued code");
            Response::json("{}")
        }
        Err(e @ EnqueueError::Full { .. }) => {
            tracing::warn!(pin, code, error = %e, "Queue full, rejecting job");
            let mut response = Response::error(StatusCode::ServiceUnavailable, &e.to_string());
            response.add_header("Retry-After", &intake.retry_after_secs.to_string());
            response
        }
        Err(e @ EnqueueError::Closed) => Response::error(StatusCode::ServiceUnavailable, &e.to_string()),
    }
}

/// Handler para `GET /status`
///
/// # Ejemplo de response
/// ```json
/// {
///   "executor": {"state": "transmitting", "transmitted": 12, "failed": 0},
///   "queue": {"depth": 3, "capacity": 64, "closed": false, "policy": "block"}
/// }
/// ```
pub fn status_handler(_req: &Request, intake: &JobIntake) -> Response {
    let body = StatusBody {
        executor: intake.executor.snapshot(),
        queue: intake.queue.stats(),
    };

    match serde_json::to_string(&body) {
        Ok(json) => Response::json(&json),
        Err(e) => Response::error(StatusCode::InternalServerError, &e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::queue::Backpressure;

    fn intake(capacity: usize) -> JobIntake {
        JobIntake::new(
            JobQueue::new(capacity, Backpressure::Reject),
            PinRange::default(),
            Arc::new(ExecutorStats::default()),
            5,
        )
    }

    fn post(body: &str) -> Request {
        let raw = format!(
            "POST /send HTTP/1.0\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        Request::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_send_accepts_valid_job() {
        let intake = intake(4);
        let response = send_handler(&post(r#"{"gpioPin": 10, "code": 12345678}"#), &intake);

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body(), b"{}");

        let job = intake.queue().dequeue().unwrap();
        assert_eq!((job.pin(), job.code()), (10, 12345678));
    }

    #[test]
    fn test_send_rejects_negative_pin() {
        let intake = intake(4);
        let response = send_handler(&post(r#"{"gpioPin": -1, "code": 5}"#), &intake);

        assert_eq!(response.status(), StatusCode::BadRequest);
        assert!(String::from_utf8_lossy(response.body()).contains("Request validation failed"));
        assert!(intake.queue().is_empty());
    }

    #[test]
    fn test_send_rejects_missing_pin() {
        let intake = intake(4);
        let response = send_handler(&post(r#"{"code": 5}"#), &intake);

        assert_eq!(response.status(), StatusCode::BadRequest);
        assert!(String::from_utf8_lossy(response.body()).contains("gpioPin"));
        assert!(intake.queue().is_empty());
    }

    #[test]
    fn test_send_queue_full_returns_503() {
        let intake = intake(1);
        send_handler(&post(r#"{"gpioPin": 4, "code": 1}"#), &intake);
        let response = send_handler(&post(r#"{"gpioPin": 4, "code": 2}"#), &intake);

        assert_eq!(response.status(), StatusCode::ServiceUnavailable);
        assert_eq!(response.headers().get("Retry-After"), Some(&"5".to_string()));
        assert_eq!(intake.queue().len(), 1);
    }

    #[test]
    fn test_send_after_close_returns_503() {
        let intake = intake(4);
        intake.queue().close();

        let response = send_handler(&post(r#"{"gpioPin": 4, "code": 1}"#), &intake);
        assert_eq!(response.status(), StatusCode::ServiceUnavailable);
        assert!(String::from_utf8_lossy(response.body()).contains("closed"));
    }

    #[test]
    fn test_status_reports_queue_and_executor() {
        let intake = intake(4);
        send_handler(&post(r#"{"gpioPin": 4, "code": 1}"#), &intake);

        let raw = b"GET /status HTTP/1.0\r\n\r\n";
        let response = status_handler(&Request::parse(raw).unwrap(), &intake);
        assert_eq!(response.status(), StatusCode::Ok);

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["queue"]["depth"], 1);
        assert_eq!(body["queue"]["capacity"], 4);
        assert_eq!(body["queue"]["policy"], "reject");
        assert_eq!(body["executor"]["state"], "idle");
        assert_eq!(body["executor"]["transmitted"], 0);
    }
}
