use async_trait::async_trait;

use crate::auth::{derive_authorization_values, parse_challenge};
use crate::error::Error;
use crate::http::connection::Exchange;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::pipeline::Stage;

/// Answers 401 challenges.
///
/// Every `Authorization` value derivable from the challenges is tried in
/// turn until a response other than 401 comes back. If none works, the last
/// 401 is returned. A 401 without `WWW-Authenticate` is an error.
pub struct AuthenticateStage {
    next: Box<dyn Stage>,
}

impl AuthenticateStage {
    pub fn new(next: Box<dyn Stage>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl Stage for AuthenticateStage {
    async fn process(&self, request: &mut Request, client: &dyn Exchange) -> Result<Response, Error> {
        let mut response = self.next.process(request, client).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        if !response.headers().contains("WWW-Authenticate") {
            return Err(Error::MissingChallenge);
        }

        let challenges = response
            .headers()
            .get_all("WWW-Authenticate")
            .flat_map(parse_challenge)
            .collect();

        for authorization in derive_authorization_values(challenges, request) {
            tracing::debug!(url = %request.url, "Retrying with credentials");
            request.headers.insert("Authorization", authorization);

            response = self.next.process(request, client).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                break;
            }
        }

        Ok(response)
    }
}
