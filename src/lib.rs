//! Herald - Asynchronous HTTP/1.1 Client
//!
//! Core library: incremental response framing and the request-processing
//! pipeline (retry, redirect, decode, authenticate) on top of a raw
//! send-one-request primitive.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;

pub use client::Client;
pub use config::Config;
pub use error::Error;
