use crate::config;
use crate::http::{Error, Request};

const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Best-effort push notifications through Pushover. Delivery failures are
/// logged and swallowed; reconciliation never depends on this path.
pub struct Notifier {
    token: Box<str>,
    user: Box<str>,
}

impl Notifier {
    pub fn from_config(config: &config::Notify) -> Self {
        Self {
            token: config.token.clone(),
            user: config.user.clone(),
        }
    }

    pub fn send(&self, message: &str) {
        let response = Request::post(PUSHOVER_URL).send_json(serde_json::json!({
            "token": self.token.as_ref(),
            "user": self.user.as_ref(),
            "message": message,
        }));

        match response {
            Ok(_) => (),
            Err(Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                log::warn!("notification rejected with HTTP {}: {}", code, body.trim());
            }
            Err(Error::Transport(tp)) => {
                log::warn!("notification could not be delivered: {}", tp);
            }
        }
    }
}
