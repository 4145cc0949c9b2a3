use async_trait::async_trait;

use crate::error::Error;
use crate::http::connection::Exchange;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::pipeline::Stage;

/// Follows 3xx responses by rewriting the request target to `Location`.
///
/// A budget of `n` allows `n + 1` requests in total. When the last one is
/// still a redirect it is returned unfollowed. A 3xx without `Location`
/// (e.g. 304) is returned as is. An `Authorization` field is dropped when
/// the target moves to another origin.
pub struct RedirectStage {
    redirects: u32,
    next: Box<dyn Stage>,
}

impl RedirectStage {
    pub fn new(redirects: u32, next: Box<dyn Stage>) -> Self {
        Self { redirects, next }
    }

    pub fn redirects(&self) -> u32 {
        self.redirects
    }
}

#[async_trait]
impl Stage for RedirectStage {
    async fn process(&self, request: &mut Request, client: &dyn Exchange) -> Result<Response, Error> {
        let mut remaining = self.redirects.saturating_add(1);

        loop {
            remaining -= 1;
            let response = self.next.process(request, client).await?;

            if !response.is_redirect() || remaining == 0 {
                return Ok(response);
            }
            let Some(location) = response.header("Location") else {
                return Ok(response);
            };

            // Relative references resolve against the current target.
            let target = request
                .url
                .join(location.trim())
                .map_err(|_| Error::InvalidLocation(location.to_string()))?;

            tracing::info!(
                status = response.status().as_u16(),
                from = %request.url,
                to = %target,
                remaining,
                "Following redirect"
            );
            if target.origin() != request.url.origin() && request.headers.remove("Authorization") > 0 {
                tracing::debug!(to = %target, "Dropping credentials for another origin");
            }
            request.url = target;
        }
    }
}
