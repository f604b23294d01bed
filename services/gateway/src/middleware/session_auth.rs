use crate::errors::ApiError;
use crate::metrics;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error,
};
use futures_util::future::LocalBoxFuture;
use security::{SessionStore, SESSION_TOKEN_HEADER};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

/// Paths reachable without a session
const PUBLIC_PATHS: &[&str] = &["/", "/health", "/metrics"];
const PUBLIC_PREFIXES: &[&str] = &["/api/v1/sessions"];

/// Rejects requests that do not carry a live session token
pub struct SessionAuth {
    store: Arc<SessionStore>,
}

impl SessionAuth {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

fn is_public(method: &Method, path: &str) -> bool {
    // CORS preflight
    if *method == Method::OPTIONS {
        return true;
    }
    PUBLIC_PATHS.contains(&path)
        || PUBLIC_PREFIXES.iter().any(|prefix| {
            path.strip_prefix(prefix)
                .map_or(false, |rest| rest.is_empty() || rest.starts_with('/'))
        })
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
            store: self.store.clone(),
        }))
    }
}

pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
    store: Arc<SessionStore>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(req.method(), req.path()) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await });
        }

        let token = req
            .headers()
            .get(SESSION_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());

        match self.store.authorize(token) {
            Ok(()) => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await })
            }
            Err(e) => {
                tracing::warn!("Session rejected for path {}: {}", req.path(), e);
                metrics::SESSION_REJECTIONS
                    .with_label_values(&[e.as_str()])
                    .inc();
                // rejection may have dropped an expired record
                metrics::observe_sessions(&self.store);
                let err: Error = ApiError::from(e).into();
                Box::pin(async move { Err(err) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public(&Method::GET, "/"));
        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::GET, "/metrics"));
        assert!(is_public(&Method::POST, "/api/v1/sessions"));
        assert!(is_public(&Method::POST, "/api/v1/sessions/validate"));
        assert!(is_public(&Method::OPTIONS, "/api/v1/risk/evaluate"));

        assert!(!is_public(&Method::POST, "/api/v1/risk/evaluate"));
        assert!(!is_public(&Method::GET, "/healthz"));
        assert!(!is_public(&Method::POST, "/api/v1/sessions-admin"));
        assert!(!is_public(&Method::GET, "/api/v1/sessionsx/validate"));
    }
}
