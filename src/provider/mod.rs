pub mod porkbun;

use std::fmt;

use thiserror::Error;

pub type RecordId = u64;

/// Subdomain value standing for the root of the domain.
pub const ROOT_SUBDOMAIN: &str = "@";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    A,

    /// Anything else living under the same name (TXT, MX, CNAME, ...).
    /// These pass through listing so callers can see them, but they are
    /// never created, updated or deleted by us.
    Other(Box<str>),
}

/// A record that exists at the provider. The id is assigned by the provider
/// and is the record's identity; the rdata is the field under
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRecord {
    pub id: RecordId,
    pub kind: RecordKind,
    pub rdata: Box<str>,
    pub ttl: u32,

    /// Provider-specific and opaque to us; preserved verbatim on update.
    pub priority: Box<str>,
}

/// A record that does not exist yet. No id; the provider assigns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub rdata: Box<str>,
    pub ttl: u32,
    pub priority: Box<str>,
}

/// One hostname under reconciliation. Built from the config file and
/// immutable for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneTarget {
    pub domain: Box<str>,
    pub subdomain: Box<str>,
    pub ttl: u32,
}

impl ZoneTarget {
    pub fn is_root(&self) -> bool {
        self.subdomain.as_ref() == ROOT_SUBDOMAIN
    }

    pub fn fqdn(&self) -> String {
        if self.is_root() {
            String::from(self.domain.as_ref())
        } else {
            format!("{}.{}", self.subdomain, self.domain)
        }
    }
}

impl fmt::Display for ZoneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fqdn())
    }
}

#[derive(Clone, Error, Debug)]
pub enum ProviderError {
    #[error("the provider rejected our credentials: {0}")]
    Auth(Box<str>),

    #[error("the provider does not know this domain: {0}")]
    NotFound(Box<str>),

    #[error("HTTP transport error: {0}")]
    Transport(Box<str>),

    // used when the provider says it succeeded, but the returned JSON
    // is nonsense
    #[error("received erroneous JSON: {0}")]
    Json(Box<str>),

    #[error("provider returned error: {0}")]
    Api(Box<str>),
}

impl ProviderError {
    /// Fatal errors point at the configuration (bad credentials, a domain
    /// the account does not hold). Retrying cannot fix those; the target
    /// must be halted until an operator intervenes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderError::Auth(_) | ProviderError::NotFound(_))
    }
}

/// Record CRUD as exposed by the DNS provider. None of the four operations
/// is transactional with any other; the reconciler is written to tolerate
/// partial completion.
pub trait RecordApi {
    /// Every record the provider holds under the target's name, in whatever
    /// order the provider returns them.
    fn list_records(&self, zone: &ZoneTarget) -> Result<Vec<ZoneRecord>, ProviderError>;

    fn create_record(&self, zone: &ZoneTarget, record: &NewRecord) -> Result<(), ProviderError>;

    /// Rewrites the record with `record.id` in place.
    fn update_record(&self, zone: &ZoneTarget, record: &ZoneRecord) -> Result<(), ProviderError>;

    fn delete_record(&self, zone: &ZoneTarget, id: RecordId) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqdn_of_root_is_the_bare_domain() {
        let root = ZoneTarget {
            domain: "example.com".into(),
            subdomain: "@".into(),
            ttl: 300,
        };
        let www = ZoneTarget {
            domain: "example.com".into(),
            subdomain: "www".into(),
            ttl: 300,
        };

        assert_eq!(root.fqdn(), "example.com");
        assert_eq!(www.fqdn(), "www.example.com");
        assert_eq!(format!("{}", www), "www.example.com");
    }

    #[test]
    fn only_config_errors_are_fatal() {
        assert!(ProviderError::Auth("bad key".into()).is_fatal());
        assert!(ProviderError::NotFound("no such domain".into()).is_fatal());
        assert!(!ProviderError::Transport("timed out".into()).is_fatal());
        assert!(!ProviderError::Api("rate limited".into()).is_fatal());
        assert!(!ProviderError::Json("expected array".into()).is_fatal());
    }
}
