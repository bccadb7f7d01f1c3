//! # Parsing de Requests HTTP/1.x
//! src/http/request.rs
//!
//! Parser mínimo para lo que recibe este servidor: requests cortos,
//! una sola petición por conexión.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /send HTTP/1.0\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 34\r\n
//! \r\n
//! {"gpioPin": 10, "code": 12345678}
//! ```

use std::collections::HashMap;
use thiserror::Error;

/// Separador entre headers y body
pub const HEADER_END: &[u8] = b"\r\n\r\n";

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    POST,
}

impl Method {
    fn parse(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty request")]
    EmptyRequest,

    #[error("Request head is not valid UTF-8")]
    InvalidEncoding,

    #[error("Invalid request line format")]
    InvalidRequestLine,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),
}

/// Un request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    /// Nombres en minúsculas
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Request {
    /// Parsea un request completo (head y body)
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use rf_sender::http::Request;
    ///
    /// let raw = b"GET /status HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/status");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::EmptyRequest);
        }

        let (head, body) = match find_subsequence(buffer, HEADER_END) {
            Some(pos) => (&buffer[..pos], &buffer[pos + HEADER_END.len()..]),
            None => (buffer, &[][..]),
        };

        let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidEncoding)?;
        let mut lines = head.split("\r\n");

        let request_line = lines.next().ok_or(ParseError::InvalidRequestLine)?;
        let (method, path) = Self::parse_request_line(request_line)?;
        let headers = Self::parse_headers(lines)?;

        let mut request = Request {
            method,
            path,
            headers,
            body: body.to_vec(),
        };

        // Ignorar bytes de más después del body declarado
        if let Some(len) = request.content_length()? {
            request.body.truncate(len);
        }

        Ok(request)
    }

    /// Formato: `METHOD /path HTTP/1.x`. Un query string se ignora.
    fn parse_request_line(line: &str) -> Result<(Method, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::parse(parts[0])?;
        let path = parts[1].split_once('?').map_or(parts[1], |(path, _)| path);

        let version = parts[2];
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version.to_string()));
        }

        Ok((method, path.to_string()))
    }

    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(headers)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Valor de `Content-Length`, si vino
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        content_length(&self.headers)
    }
}

fn content_length(headers: &HashMap<String, String>) -> Result<Option<usize>, ParseError> {
    headers
        .get("content-length")
        .map(|v| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength(v.clone())))
        .transpose()
}

/// Busca `needle` dentro de `haystack`
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Lee solo el head para saber cuántos bytes de body esperar
///
/// Retorna `None` si el head todavía no está completo.
pub fn expected_body_len(buffer: &[u8]) -> Result<Option<(usize, usize)>, ParseError> {
    let Some(pos) = find_subsequence(buffer, HEADER_END) else {
        return Ok(None);
    };

    let head = std::str::from_utf8(&buffer[..pos]).map_err(|_| ParseError::InvalidEncoding)?;
    let headers = Request::parse_headers(head.split("\r\n").skip(1))?;
    let body_len = content_length(&headers)?.unwrap_or(0);

    Ok(Some((pos + HEADER_END.len(), body_len)))
}
