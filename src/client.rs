//! The client façade: default headers and credentials, the stage chain,
//! and the wire primitive it ends in.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Error;
use crate::http::connection::{Exchange, TcpExchange};
use crate::http::headers::Headers;
use crate::http::request::{Credentials, Method, Request, RequestBuilder};
use crate::http::response::Response;
use crate::pipeline::{Pipeline, StageRegistry};

/// An HTTP client.
///
/// Cheap to clone; clones share the pipeline and the exchange. Several
/// calls may run concurrently since neither holds per-call state.
#[derive(Clone)]
pub struct Client {
    pipeline: Arc<Pipeline>,
    exchange: Arc<dyn Exchange>,
    default_headers: Headers,
    default_auth: Option<Credentials>,
}

impl Client {
    /// Builds a client talking plain TCP, with the stages named in `config`.
    pub fn new(config: Config) -> Result<Self, Error> {
        let exchange = TcpExchange::new(config.connect_timeout(), config.request_timeout());
        Self::with_exchange(config, Arc::new(exchange))
    }

    /// Builds a client on top of another wire primitive.
    pub fn with_exchange(config: Config, exchange: Arc<dyn Exchange>) -> Result<Self, Error> {
        let pipeline = Pipeline::build(&config.stage_specs(), &StageRegistry::default())?;

        let mut default_headers = Headers::new();
        default_headers.insert("User-Agent", config.user_agent.clone());
        default_headers.insert("Accept", "*/*");
        for (name, value) in &config.headers {
            default_headers.insert(name.clone(), value.clone());
        }

        Ok(Self {
            pipeline: Arc::new(pipeline),
            exchange,
            default_headers,
            default_auth: config.auth.map(Credentials::from),
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Runs a request through the pipeline.
    pub async fn execute(&self, mut request: Request) -> Result<Response, Error> {
        for (name, value) in self.default_headers.iter() {
            if !request.headers.contains(name) {
                request.headers.append(name, value);
            }
        }
        if request.auth.is_none() {
            request.auth = self.default_auth.clone();
        }

        tracing::debug!(method = %request.method, url = %request.url, "Executing request");
        let response = self.pipeline.process(&mut request, self.exchange.as_ref()).await?;
        tracing::debug!(
            status = response.status().as_u16(),
            url = %request.url,
            "Request finished"
        );
        Ok(response)
    }

    /// Shorthand for a bodyless or bodied request to `url`.
    pub async fn send(&self, method: Method, url: &str, body: impl Into<Vec<u8>>) -> Result<Response, Error> {
        let request = RequestBuilder::new().method(method).url(url).body(body).build()?;
        self.execute(request).await
    }

    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.send(Method::GET, url, Vec::new()).await
    }

    pub async fn head(&self, url: &str) -> Result<Response, Error> {
        self.send(Method::HEAD, url, Vec::new()).await
    }

    pub async fn delete(&self, url: &str) -> Result<Response, Error> {
        self.send(Method::DELETE, url, Vec::new()).await
    }

    pub async fn options(&self, url: &str) -> Result<Response, Error> {
        self.send(Method::OPTIONS, url, Vec::new()).await
    }

    pub async fn post(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response, Error> {
        self.send(Method::POST, url, body).await
    }

    pub async fn put(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response, Error> {
        self.send(Method::PUT, url, body).await
    }

    pub async fn patch(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response, Error> {
        self.send(Method::PATCH, url, body).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("pipeline", &self.pipeline)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}
