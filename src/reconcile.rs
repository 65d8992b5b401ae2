use std::fmt;
use std::net::Ipv4Addr;

use crate::provider::{NewRecord, ProviderError, RecordApi, RecordKind, ZoneTarget};

/// What a reconciliation run did. Only used for logging and notification;
/// nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,

    /// Excess A records were deleted. The count is the number of deletions;
    /// the surviving record was additionally updated if its value was stale.
    PrunedAndUpdated(usize),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => write!(f, "created a new A record"),
            Outcome::Updated => write!(f, "updated the A record"),
            Outcome::Unchanged => write!(f, "A record is up to date"),
            Outcome::PrunedAndUpdated(n) => {
                write!(f, "pruned {} excess record(s) and reconciled the rest", n)
            }
        }
    }
}

/// Drives the zone towards exactly one A record holding `current_ip`.
///
/// The first A record the provider returns is kept as canonical and all
/// later ones are deleted. The API makes no ordering promise, so which
/// duplicate survives is up to the provider; a zone that keeps flapping
/// here has something else editing it. Records of other types are never
/// touched.
///
/// The four provider operations are not transactional. If a call fails
/// midway the zone may be left partially reconciled; that state is legal
/// and the next tick picks it up from the top.
pub fn reconcile(
    api: &dyn RecordApi,
    zone: &ZoneTarget,
    current_ip: Ipv4Addr,
) -> Result<Outcome, ProviderError> {
    let records = api.list_records(zone)?;

    let mut a_records = records.into_iter().filter(|r| r.kind == RecordKind::A);

    let Some(canonical) = a_records.next() else {
        let record = NewRecord {
            rdata: current_ip.to_string().into(),
            ttl: zone.ttl,
            priority: "".into(),
        };

        api.create_record(zone, &record)?;
        log::info!("{}: no A record yet, added one with {}", zone, current_ip);

        return Ok(Outcome::Created);
    };

    let mut pruned = 0;
    for excess in a_records {
        api.delete_record(zone, excess.id)?;
        pruned += 1;
    }

    if pruned > 0 {
        log::info!("{}: deleted {} unnecessary record(s)", zone, pruned);
    }

    let new_rdata = current_ip.to_string();
    let changed = canonical.rdata.as_ref() != new_rdata;

    if changed {
        log::info!(
            "{}: IP address has changed from {} to {}",
            zone,
            canonical.rdata,
            new_rdata
        );

        let mut updated = canonical;
        updated.rdata = new_rdata.into();
        api.update_record(zone, &updated)?;
    }

    Ok(match (pruned, changed) {
        (0, true) => Outcome::Updated,
        (0, false) => Outcome::Unchanged,
        (n, _) => Outcome::PrunedAndUpdated(n),
    })
}
