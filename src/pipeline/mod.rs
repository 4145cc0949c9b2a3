//! Request-processing pipeline
//!
//! A pipeline is a chain of stages in front of the wire. Each stage gets the
//! request and the client's [`Exchange`] primitive, calls the next stage, and
//! may re-invoke it, mutate the request, or post-process the response.
//!
//! ```text
//!   execute ─► Retry ─► Redirect ─► Decode ─► Authenticate ─► Terminal ─► wire
//!   response ◄──────────────────────────────────────────────────────────┘
//! ```
//!
//! Chains are built once from an ordered list of [`StageSpec`]s through a
//! [`StageRegistry`] and never change afterwards. Budgets are plain values
//! in each stage; the counters consuming them live on the stack of a single
//! `process` call, so concurrent calls never share them.

pub mod authenticate;
pub mod decode;
pub mod redirect;
pub mod retry;
pub mod terminal;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Error;
use crate::http::connection::Exchange;
use crate::http::request::Request;
use crate::http::response::Response;

pub use authenticate::AuthenticateStage;
pub use decode::DecodeStage;
pub use redirect::RedirectStage;
pub use retry::RetryStage;
pub use terminal::TerminalStage;

pub const RETRY: &str = "RetryMiddleWare";
pub const REDIRECT: &str = "RedirectMiddleWare";
pub const DECODE: &str = "DecodeMiddleWare";
pub const AUTHENTICATION: &str = "AuthenticationMiddleWare";

/// Budget used by retry and redirect stages when none is configured.
pub const DEFAULT_BUDGET: u32 = 3;

/// One link of the chain.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn process(&self, request: &mut Request, client: &dyn Exchange) -> Result<Response, Error>;
}

/// Stage identifier plus its optional budget, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawStageSpec")]
pub struct StageSpec {
    pub name: String,
    pub budget: Option<u32>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            budget: None,
        }
    }

    pub fn with_budget(name: impl Into<String>, budget: u32) -> Self {
        Self {
            name: name.into(),
            budget: Some(budget),
        }
    }
}

/// Either `DecodeMiddleWare` or `{ RetryMiddleWare: 5 }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawStageSpec {
    Bare(String),
    WithBudget(BTreeMap<String, Option<u32>>),
}

impl TryFrom<RawStageSpec> for StageSpec {
    type Error = String;

    fn try_from(raw: RawStageSpec) -> Result<Self, Self::Error> {
        match raw {
            RawStageSpec::Bare(name) => Ok(StageSpec::new(name)),
            RawStageSpec::WithBudget(map) => {
                if map.len() != 1 {
                    let names: Vec<_> = map.keys().map(String::as_str).collect();
                    return Err(format!(
                        "a stage entry names exactly one stage, found [{}]",
                        names.join(", ")
                    ));
                }
                let (name, budget) = map.into_iter().next().unwrap_or_default();
                Ok(StageSpec { name, budget })
            }
        }
    }
}

/// The default chain: retry wraps everything and authentication sits
/// closest to the wire.
pub fn default_stages() -> Vec<StageSpec> {
    [RETRY, REDIRECT, DECODE, AUTHENTICATION]
        .into_iter()
        .map(StageSpec::new)
        .collect()
}

/// Builds a stage around the next one, given the configured budget.
pub type StageConstructor = fn(Option<u32>, Box<dyn Stage>) -> Box<dyn Stage>;

/// Maps stage identifiers to constructors. Consulted only while building.
#[derive(Clone)]
pub struct StageRegistry {
    constructors: HashMap<String, StageConstructor>,
}

impl StageRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: StageConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn get(&self, name: &str) -> Option<StageConstructor> {
        self.constructors.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(RETRY, |budget, next| {
            Box::new(RetryStage::new(budget.unwrap_or(DEFAULT_BUDGET), next))
        });
        registry.register(REDIRECT, |budget, next| {
            Box::new(RedirectStage::new(budget.unwrap_or(DEFAULT_BUDGET), next))
        });
        registry.register(DECODE, |_, next| Box::new(DecodeStage::new(next)));
        registry.register(AUTHENTICATION, |_, next| Box::new(AuthenticateStage::new(next)));
        registry
    }
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("StageRegistry").field("stages", &names).finish()
    }
}

/// An immutable, fully built stage chain.
pub struct Pipeline {
    entry: Box<dyn Stage>,
    stages: Vec<String>,
}

impl Pipeline {
    /// Builds a chain from the innermost stage outwards, so the first entry
    /// becomes the first stage a request meets.
    pub fn build(specs: &[StageSpec], registry: &StageRegistry) -> Result<Self, Error> {
        let mut entry: Box<dyn Stage> = Box::new(TerminalStage);

        for spec in specs.iter().rev() {
            let constructor = registry
                .get(&spec.name)
                .ok_or_else(|| Error::UnknownStage(spec.name.clone()))?;
            entry = constructor(spec.budget, entry);
        }

        let stages: Vec<String> = specs.iter().map(|s| s.name.clone()).collect();
        tracing::debug!(?stages, "Pipeline built");
        Ok(Self { entry, stages })
    }

    /// Runs one logical call through the chain.
    pub async fn process(&self, request: &mut Request, client: &dyn Exchange) -> Result<Response, Error> {
        self.entry.process(request, client).await
    }

    /// Stage identifiers, outermost first.
    pub fn stages(&self) -> &[String] {
        &self.stages
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            entry: Box::new(TerminalStage),
            stages: Vec::new(),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").field("stages", &self.stages).finish()
    }
}
