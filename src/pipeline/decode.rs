use async_trait::async_trait;

use crate::error::Error;
use crate::http::connection::Exchange;
use crate::http::encoding::CodingRegistry;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::pipeline::Stage;

/// Header fields whose codings are undone, in this order.
const CODING_HEADERS: [&str; 2] = ["Transfer-Encoding", "Content-Encoding"];

/// Advertises the supported codings and decodes the response body.
///
/// Codings are listed in the order they were applied, so they are undone
/// from the last one back. `chunked` is framing and was already removed by
/// the response buffer. Header values are left untouched.
pub struct DecodeStage {
    codings: CodingRegistry,
    next: Box<dyn Stage>,
}

impl DecodeStage {
    pub fn new(next: Box<dyn Stage>) -> Self {
        Self::with_codings(CodingRegistry::default(), next)
    }

    pub fn with_codings(codings: CodingRegistry, next: Box<dyn Stage>) -> Self {
        Self { codings, next }
    }

    fn decode(&self, response: &mut Response) -> Result<(), Error> {
        for header in CODING_HEADERS {
            let tokens: Vec<String> = response
                .headers()
                .get_all(header)
                .flat_map(|value| value.split(','))
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty() && !token.eq_ignore_ascii_case("chunked"))
                .collect();

            for token in tokens.iter().rev() {
                let decoded = self.codings.decode(token, response.body())?;
                tracing::debug!(
                    coding = %token,
                    from = response.body().len(),
                    to = decoded.len(),
                    "Decoded response body"
                );
                response.set_body(decoded);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for DecodeStage {
    async fn process(&self, request: &mut Request, client: &dyn Exchange) -> Result<Response, Error> {
        if !request.headers.contains("Accept-Encoding") {
            request
                .headers
                .insert("Accept-Encoding", self.codings.accept_encoding());
        }

        let mut response = self.next.process(request, client).await?;
        self.decode(&mut response)?;
        Ok(response)
    }
}
