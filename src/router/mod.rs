//! # Sistema de Routing
//! src/router/mod.rs
//!
//! ```text
//! Request → Router → Handler → Response
//! ```
//!
//! Cada ruta es (método, path). Si el path existe pero con otro método
//! se responde 405; si no existe, 404.

use crate::http::{Method, Request, Response, StatusCode};

/// Un handler recibe un Request y retorna una Response.
/// Puede capturar estado compartido (la cola, métricas, ...).
pub type Handler = Box<dyn Fn(&Request) -> Response + Send + Sync>;

/// Router que mapea (método, path) a handlers
pub struct Router {
    routes: Vec<(Method, String, Handler)>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta con su handler
    ///
    /// # Ejemplo
    /// ```
    /// use rf_sender::router::Router;
    /// use rf_sender::http::{Method, Response};
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/hello", |_req| Response::json(r#"{"message": "Hello"}"#));
    /// ```
    pub fn register<F>(&mut self, method: Method, path: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.routes.push((method, path.to_string(), Box::new(handler)));
    }

    /// Ejecuta el handler que corresponde al request
    pub fn route(&self, request: &Request) -> Response {
        let path = request.path();
        let mut path_known = false;

        for (method, route_path, handler) in &self.routes {
            if route_path != path {
                continue;
            }
            if *method == request.method() {
                return handler(request);
            }
            path_known = true;
        }

        if path_known {
            Response::error(
                StatusCode::MethodNotAllowed,
                &format!("Method {} not allowed on {}", request.method().as_str(), path),
            )
        } else {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", path))
        }
    }

    /// Si el path tiene al menos una ruta registrada
    pub fn has_path(&self, path: &str) -> bool {
        self.routes.iter().any(|(_, route_path, _)| route_path == path)
    }

    /// Paths registrados (para logs de arranque)
    pub fn describe(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|(method, path, _)| format!("{} {}", method.as_str(), path))
            .collect()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
