use async_trait::async_trait;

use crate::error::Error;
use crate::http::connection::Exchange;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::pipeline::Stage;

/// Re-runs the rest of the chain when it fails with a transient error.
///
/// A budget of `n` allows `n + 1` attempts. Once the budget is spent the
/// next failure reaches the caller. Non-transient errors are never retried.
pub struct RetryStage {
    retries: u32,
    next: Box<dyn Stage>,
}

impl RetryStage {
    pub fn new(retries: u32, next: Box<dyn Stage>) -> Self {
        Self { retries, next }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }
}

#[async_trait]
impl Stage for RetryStage {
    async fn process(&self, request: &mut Request, client: &dyn Exchange) -> Result<Response, Error> {
        let attempts = self.retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            match self.next.process(request, client).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < attempts => {
                    tracing::warn!(
                        attempt,
                        attempts,
                        error = %e,
                        url = %request.url,
                        "Retrying after transient failure"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
