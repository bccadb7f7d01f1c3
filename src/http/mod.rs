//! # Módulo HTTP
//!
//! HTTP/1.0 escrito a mano sobre `std::net`, suficiente para recibir
//! `POST /send` con un body JSON chico:
//!
//! - Parsing de requests (head + body por `Content-Length`)
//! - Construcción de responses
//! - Status codes
//!
//! Una petición por conexión; la respuesta siempre lleva `Connection: close`.

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
