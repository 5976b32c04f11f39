//! Gatekeeper middleware for the HTTP router.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{Method, Request, Response, StatusCode};
use futures::future::BoxFuture;
use http_body::Body as HttpBody;
use tower::{Layer, Service};

use super::Authenticator;

/// Gatekeeper layer.
#[derive(Clone)]
pub struct AuthLayer {
    authenticator: Arc<Authenticator>,
}

impl AuthLayer {
    pub fn new(authenticator: Authenticator) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            authenticator: self.authenticator.clone(),
        }
    }
}

/// Gatekeeper service.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    authenticator: Arc<Authenticator>,
}

fn unauthorized<B: Default>() -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AuthMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: HttpBody + Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let path = req.uri().path();
        let bypass = !self.authenticator.is_enabled()
            || req.method() == Method::OPTIONS
            || self.authenticator.is_public(path);

        if bypass {
            tracing::debug!(path = %path, "Public path, skipping token check");
        } else {
            let token = req
                .headers()
                .get(self.authenticator.header_name())
                .and_then(|v| v.to_str().ok());

            match self.authenticator.validate(token) {
                Ok(claims) => {
                    tracing::debug!(path = %path, user_id = ?claims.id, "Token accepted");
                    req.extensions_mut().insert(claims);
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Request rejected by gatekeeper");
                    return Box::pin(async move { Ok(unauthorized()) });
                }
            }
        }

        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);

        Box::pin(async move { inner.call(req).await })
    }
}
