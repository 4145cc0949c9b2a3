use async_trait::async_trait;

use crate::error::Error;
use crate::http::connection::Exchange;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::pipeline::Stage;

/// Innermost stage: hands the request to the wire as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalStage;

#[async_trait]
impl Stage for TerminalStage {
    async fn process(&self, request: &mut Request, client: &dyn Exchange) -> Result<Response, Error> {
        client.send(request).await
    }
}
