use std::num::NonZeroU32;

use serde_derive::Deserialize;

use crate::util::{one_or_more_string, parse_number_into_optional_nonzero};

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct General {
    /// Seconds between reconciliation ticks. Zero or absent makes this a
    /// fire-once program.
    #[serde(default, deserialize_with = "parse_number_into_optional_nonzero")]
    pub update_rate: Option<NonZeroU32>,

    #[serde(default = "default_user_agent")]
    pub user_agent: Box<str>,

    /// Upper bound, in seconds, on every network call. A hung call must not
    /// stall the schedule.
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    /// Address-echo endpoint that replies with our public IP as plain text.
    #[serde(default = "default_echo_url")]
    pub echo_url: Box<str>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Provider {
    pub api_key: Box<str>,
    pub secret_api_key: Box<str>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Notify {
    pub token: Box<str>,
    pub user: Box<str>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Zone {
    pub domain: Box<str>,

    /// One or more subdomains to keep pointed at our address. "@" stands
    /// for the root of the domain.
    #[serde(deserialize_with = "one_or_more_string")]
    pub subdomains: Vec<Box<str>>,

    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub general: General,
    pub provider: Provider,

    #[serde(default)]
    pub notify: Option<Notify>,

    #[serde(rename = "zone")]
    pub zones: Vec<Zone>,
}

fn default_user_agent() -> Box<str> {
    concat!("github.com/zonemend/zonemend ", env!("CARGO_PKG_VERSION")).into()
}

fn default_http_timeout() -> u64 {
    10
}

fn default_echo_url() -> Box<str> {
    "https://api.ipify.org".into()
}

fn default_ttl() -> u32 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document() {
        let config = toml::from_str::<Config>(
            r#"
            [general]
            update_rate = 300
            http_timeout = 5

            [provider]
            api_key = "pk1_0123"
            secret_api_key = "sk1_4567"

            [notify]
            token = "azGDORePK8gMaC0QOYAMyEEuzJnyUi"
            user = "uQiRzpo4DXghDmr9QzzfQu27cmVRsG"

            [[zone]]
            domain = "example.com"
            subdomains = ["@", "www"]
            ttl = 600

            [[zone]]
            domain = "example.org"
            subdomains = "vpn"
            "#,
        )
        .unwrap();

        assert_eq!(config.general.update_rate, NonZeroU32::new(300));
        assert_eq!(config.general.http_timeout, 5);
        assert_eq!(config.general.echo_url.as_ref(), "https://api.ipify.org");
        assert!(config.notify.is_some());

        assert_eq!(config.zones.len(), 2);
        assert_eq!(config.zones[0].subdomains.len(), 2);
        assert_eq!(config.zones[0].ttl, 600);

        // A single string is promoted to a one-element array, and the TTL
        // falls back to its default.
        assert_eq!(config.zones[1].subdomains.len(), 1);
        assert_eq!(config.zones[1].subdomains[0].as_ref(), "vpn");
        assert_eq!(config.zones[1].ttl, 300);
    }

    #[test]
    fn zero_update_rate_means_fire_once() {
        let config = toml::from_str::<Config>(
            r#"
            [general]
            update_rate = 0

            [provider]
            api_key = "pk1_0123"
            secret_api_key = "sk1_4567"

            [[zone]]
            domain = "example.com"
            subdomains = "@"
            "#,
        )
        .unwrap();

        assert_eq!(config.general.update_rate, None);
        assert!(config.notify.is_none());
    }

    #[test]
    fn absent_update_rate_means_fire_once() {
        let config = toml::from_str::<Config>(
            r#"
            [general]

            [provider]
            api_key = "pk1_0123"
            secret_api_key = "sk1_4567"

            [[zone]]
            domain = "example.com"
            subdomains = "@"
            "#,
        )
        .unwrap();

        assert_eq!(config.general.update_rate, None);
        assert!(config.general.user_agent.starts_with("github.com/zonemend"));
    }
}
