//! `WWW-Authenticate` challenge parsing.
//!
//! Accepts the `scheme param=value, param="quoted value"` form, with several
//! challenges in one field value (`Basic realm="a", Digest realm="b"`).
//! Bare token68 credentials are ignored.

/// One authentication challenge offered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub scheme: String,
    pub params: Vec<(String, String)>,
}

impl Challenge {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            params: Vec::new(),
        }
    }

    /// Looks up a parameter case-insensitively.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_scheme(&self, scheme: &str) -> bool {
        self.scheme.eq_ignore_ascii_case(scheme)
    }
}

/// Parses every challenge in one `WWW-Authenticate` field value.
pub fn parse_challenge(value: &str) -> Vec<Challenge> {
    let mut cursor = Cursor { rest: value };
    let mut challenges: Vec<Challenge> = Vec::new();

    loop {
        cursor.skip_separators();
        let Some(token) = cursor.token() else {
            if cursor.rest.is_empty() {
                break;
            }
            // Unparsable byte; drop it and carry on.
            cursor.bump();
            continue;
        };

        cursor.skip_whitespace();
        if cursor.eat('=') {
            cursor.skip_whitespace();
            let value = cursor.value();
            match challenges.last_mut() {
                Some(challenge) => challenge.params.push((token.to_string(), value)),
                None => tracing::debug!(param = token, "Auth parameter before any scheme"),
            }
        } else {
            challenges.push(Challenge::new(token));
        }
    }

    challenges
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn skip_separators(&mut self) {
        self.rest = self.rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    }

    fn bump(&mut self) {
        let mut chars = self.rest.chars();
        chars.next();
        self.rest = chars.as_str();
    }

    fn eat(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn token(&mut self) -> Option<&'a str> {
        let end = self
            .rest
            .find(|c: char| !is_token_char(c))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(token)
    }

    fn value(&mut self) -> String {
        if !self.eat('"') {
            return self.token().unwrap_or_default().to_string();
        }

        let mut out = String::new();
        let mut chars = self.rest.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.rest = &self.rest[i + 1..];
                    return out;
                }
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                    }
                }
                _ => out.push(c),
            }
        }
        // Unterminated quote: take the remainder.
        self.rest = "";
        out
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}
