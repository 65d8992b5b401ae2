use std::io::{self, Read};
use std::sync::OnceLock;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::GENERAL_CONFIG;

/// Responses larger than this are truncated; none of the APIs we talk to
/// come anywhere near it.
const BODY_LIMIT: u64 = 2 * 1024 * 1024;

/// The agent is shared so connections are reused across ticks. It is built
/// lazily because the timeout and user agent come from the config file.
static AGENT: OnceLock<ureq::Agent> = OnceLock::new();

fn agent() -> &'static ureq::Agent {
    AGENT.get_or_init(|| {
        let general = GENERAL_CONFIG.get().unwrap();

        ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(general.http_timeout))
            .user_agent(&general.user_agent)
            .build()
    })
}

pub struct Request {
    inner: ureq::Request,
}

pub struct Response {
    reader: Box<dyn Read>,
}

pub enum Error {
    Status(u16, Response),
    Transport(Box<str>),
}

impl Request {
    pub fn get(url: &str) -> Self {
        Self {
            inner: agent().get(url),
        }
    }

    pub fn post(url: &str) -> Self {
        Self {
            inner: agent().post(url),
        }
    }

    pub fn call(self) -> Result<Response, Error> {
        Self::convert(self.inner.call())
    }

    pub fn send_json(self, data: impl Serialize) -> Result<Response, Error> {
        Self::convert(self.inner.send_json(data))
    }

    fn convert(result: Result<ureq::Response, ureq::Error>) -> Result<Response, Error> {
        match result {
            Ok(resp) => Ok(Response {
                reader: resp.into_reader(),
            }),
            Err(ureq::Error::Status(code, resp)) => Err(Error::Status(
                code,
                Response {
                    reader: resp.into_reader(),
                },
            )),
            Err(ureq::Error::Transport(tp)) => Err(Error::Transport(tp.to_string().into())),
        }
    }
}

impl Response {
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, io::Error> {
        serde_json::from_reader(self.reader.take(BODY_LIMIT))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn into_string(self) -> Result<String, io::Error> {
        let mut buf = String::new();
        self.reader.take(BODY_LIMIT).read_to_string(&mut buf)?;
        Ok(buf)
    }
}
