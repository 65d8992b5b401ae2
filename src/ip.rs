use std::net::Ipv4Addr;

use thiserror::Error;

use crate::http::{Error as HttpError, Request};

#[derive(Debug, Error, Clone)]
pub enum ResolveError {
    #[error("address-echo service returned HTTP {0}: {1}")]
    Status(u16, Box<str>),

    #[error("HTTP transport error: {0}")]
    Transport(Box<str>),

    #[error("cannot parse {0:?} as an IPv4 address")]
    Parse(Box<str>),
}

/// Looks up our current public IPv4 address by asking an external echo
/// service. Every call is a fresh lookup; nothing is cached here, the
/// provider's records are the source of truth.
pub struct Resolver {
    url: Box<str>,
}

impl Resolver {
    pub fn new(url: Box<str>) -> Self {
        Self { url }
    }

    pub fn fetch(&self) -> Result<Ipv4Addr, ResolveError> {
        let response = match Request::get(&self.url).call() {
            Ok(r) => r,
            Err(HttpError::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(ResolveError::Status(code, body.trim().into()));
            }
            Err(HttpError::Transport(tp)) => return Err(ResolveError::Transport(tp)),
        };

        let body = response
            .into_string()
            .map_err(|e| ResolveError::Transport(e.to_string().into()))?;

        parse_echo_body(&body)
    }
}

fn parse_echo_body(body: &str) -> Result<Ipv4Addr, ResolveError> {
    let trimmed = body.trim();

    trimmed
        .parse::<Ipv4Addr>()
        .map_err(|_| ResolveError::Parse(trimmed.into()))
}
