// File: ./src/client/redirect.rs
//! Tower middleware following HTTP redirects up to a fixed number of hops.
use http::{Request, Response, StatusCode, Uri};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

#[derive(Clone, Debug)]
pub struct FollowRedirectLayer {
    max_redirects: usize,
}

impl FollowRedirectLayer {
    pub fn new(max_redirects: usize) -> Self {
        Self { max_redirects }
    }
}

impl<S> Layer<S> for FollowRedirectLayer {
    type Service = FollowRedirectService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FollowRedirectService {
            inner,
            max_redirects: self.max_redirects,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FollowRedirectService<S> {
    inner: S,
    max_redirects: usize,
}

fn is_followable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolves a `Location` value against the URI that produced it. Relative
/// locations inherit scheme and authority from `base`.
pub(crate) fn resolve_location(base: &Uri, location: &str) -> Option<Uri> {
    let parts = location.parse::<Uri>().ok()?.into_parts();
    let mut builder = Uri::builder();

    if let Some(scheme) = parts.scheme.or_else(|| base.scheme().cloned()) {
        builder = builder.scheme(scheme);
    }
    if let Some(authority) = parts.authority.or_else(|| base.authority().cloned()) {
        builder = builder.authority(authority);
    }
    let path = parts
        .path_and_query
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    builder = builder.path_and_query(path);

    builder.build().ok()
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for FollowRedirectService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
    ReqBody: Clone + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // The clone is ready to be called; keep the driven instance in place.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let max_redirects = self.max_redirects;

        Box::pin(async move {
            let mut next = req.clone();
            let mut response = inner.call(req).await?;

            for hop in 1..=max_redirects {
                let status = response.status();
                if !is_followable(status) {
                    return Ok(response);
                }
                let Some(target) = response
                    .headers()
                    .get(http::header::LOCATION)
                    .and_then(|loc| loc.to_str().ok())
                    .and_then(|loc| resolve_location(next.uri(), loc))
                else {
                    return Ok(response);
                };

                log::debug!("Redirect {} ({}) -> {}", hop, status, target);
                *next.uri_mut() = target;
                let request = next.clone();
                drop(response);
                response = inner.call(request).await?;
            }

            if is_followable(response.status()) {
                log::warn!("Gave up after {} redirects", max_redirects);
            }
            Ok(response)
        })
    }
}
