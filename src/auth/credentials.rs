//! Turns server challenges into `Authorization` header values.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::Md5;
use sha2::{Digest, Sha256};

use crate::auth::challenge::Challenge;
use crate::http::request::{Credentials, Method, Request};

/// Nonce count sent with the first (and only) digest answer per challenge.
const NONCE_COUNT: &str = "00000001";

/// Lazily yields one `Authorization` value per challenge the client can
/// answer, in challenge order.
///
/// Owns everything it needs, so the request stays free to be mutated
/// between items.
#[derive(Debug)]
pub struct AuthorizationValues {
    challenges: std::vec::IntoIter<Challenge>,
    credentials: Option<Credentials>,
    method: Method,
    uri: String,
}

impl Iterator for AuthorizationValues {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let credentials = self.credentials.as_ref()?;
        for challenge in self.challenges.by_ref() {
            if let Some(value) = answer(&challenge, credentials, self.method, &self.uri) {
                return Some(value);
            }
            tracing::debug!(scheme = %challenge.scheme, "Skipping unsupported challenge");
        }
        None
    }
}

/// Builds the candidate `Authorization` values for `request`.
///
/// Yields nothing when the request carries no credentials.
pub fn derive_authorization_values(
    challenges: Vec<Challenge>,
    request: &Request,
) -> AuthorizationValues {
    AuthorizationValues {
        challenges: challenges.into_iter(),
        credentials: request.auth.clone(),
        method: request.method,
        uri: request.target(),
    }
}

fn answer(challenge: &Challenge, credentials: &Credentials, method: Method, uri: &str) -> Option<String> {
    if challenge.is_scheme("Basic") {
        Some(basic(credentials))
    } else if challenge.is_scheme("Digest") {
        digest(challenge, credentials, method, uri)
    } else {
        None
    }
}

/// `Basic` credentials per RFC 7617.
pub fn basic(credentials: &Credentials) -> String {
    let pair = format!("{}:{}", credentials.username, credentials.password);
    format!("Basic {}", STANDARD.encode(pair))
}

/// Hash functions a `Digest` challenge may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DigestAlgorithm {
    Md5,
    Sha256,
}

impl DigestAlgorithm {
    /// Parses the `algorithm` parameter. Returns the hash and whether the
    /// `-sess` variant was requested. A missing parameter means MD5.
    fn from_param(param: Option<&str>) -> Option<(Self, bool)> {
        let Some(param) = param else {
            return Some((DigestAlgorithm::Md5, false));
        };
        let (name, session) = match param.len().checked_sub(5) {
            Some(split)
                if param.is_char_boundary(split) && param[split..].eq_ignore_ascii_case("-sess") =>
            {
                (&param[..split], true)
            }
            _ => (param, false),
        };
        if name.eq_ignore_ascii_case("MD5") {
            Some((DigestAlgorithm::Md5, session))
        } else if name.eq_ignore_ascii_case("SHA-256") {
            Some((DigestAlgorithm::Sha256, session))
        } else {
            None
        }
    }

    fn hash(self, input: &str) -> String {
        match self {
            DigestAlgorithm::Md5 => hex_digest::<Md5>(input),
            DigestAlgorithm::Sha256 => hex_digest::<Sha256>(input),
        }
    }
}

/// `Digest` credentials per RFC 7616, for MD5 and SHA-256 and their
/// `-sess` variants. Other algorithms yield `None`.
fn digest(challenge: &Challenge, credentials: &Credentials, method: Method, uri: &str) -> Option<String> {
    let cnonce = format!("{:016x}", rand::random::<u64>());
    digest_with_cnonce(challenge, credentials, method, uri, &cnonce)
}

/// Same as the digest answer built for a challenge, with the client nonce
/// supplied by the caller. The cnonce is only sent when `qop=auth` or a
/// `-sess` algorithm needs it.
pub fn digest_with_cnonce(
    challenge: &Challenge,
    credentials: &Credentials,
    method: Method,
    uri: &str,
    cnonce: &str,
) -> Option<String> {
    let (algorithm, session) = DigestAlgorithm::from_param(challenge.param("algorithm"))?;
    let realm = challenge.param("realm")?;
    let nonce = challenge.param("nonce")?;

    let mut ha1 = algorithm.hash(&format!("{}:{}:{}", credentials.username, realm, credentials.password));
    if session {
        ha1 = algorithm.hash(&format!("{}:{}:{}", ha1, nonce, cnonce));
    }
    let ha2 = algorithm.hash(&format!("{}:{}", method, uri));

    let offers_auth = challenge
        .param("qop")
        .is_some_and(|qop| qop.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")));

    let mut value = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\"",
        credentials.username, realm, nonce, uri
    );
    if let Some(algorithm) = challenge.param("algorithm") {
        value.push_str(&format!(", algorithm={}", algorithm));
    }

    if offers_auth {
        let response = algorithm.hash(&format!(
            "{}:{}:{}:{}:auth:{}",
            ha1, nonce, NONCE_COUNT, cnonce, ha2
        ));
        value.push_str(&format!(
            ", response=\"{}\", qop=auth, nc={}, cnonce=\"{}\"",
            response, NONCE_COUNT, cnonce
        ));
    } else {
        let response = algorithm.hash(&format!("{}:{}:{}", ha1, nonce, ha2));
        value.push_str(&format!(", response=\"{}\"", response));
        if session {
            value.push_str(&format!(", cnonce=\"{}\"", cnonce));
        }
    }

    if let Some(opaque) = challenge.param("opaque") {
        value.push_str(&format!(", opaque=\"{}\"", opaque));
    }

    Some(value)
}

fn hex_digest<D: Digest>(input: &str) -> String {
    D::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
