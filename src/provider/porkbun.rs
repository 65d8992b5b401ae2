use crate::http::{Error, Request, Response};

use super::{NewRecord, ProviderError, RecordApi, RecordId, RecordKind, ZoneRecord, ZoneTarget};

const API_BASE: &str = "https://api.porkbun.com/api/json/v3";

/// Client for the Porkbun v3 DNS API. Every endpoint is a POST carrying the
/// key pair in the request body, and every reply carries a "status" field.
///
/// See: https://porkbun.com/api/json/v3/documentation
pub struct Porkbun {
    api_key: Box<str>,
    secret_api_key: Box<str>,
}

impl Porkbun {
    pub fn new(api_key: Box<str>, secret_api_key: Box<str>) -> Self {
        Self {
            api_key,
            secret_api_key,
        }
    }

    /// The subdomain part the API expects: empty for the root of the domain.
    fn api_name(zone: &ZoneTarget) -> &str {
        if zone.is_root() {
            ""
        } else {
            zone.subdomain.as_ref()
        }
    }
}

/// Sorts a provider rejection into the error taxonomy. The API does not
/// return machine-readable error codes, so this goes by the HTTP status
/// first and falls back to well-known message prefixes.
fn classify_error(code: u16, message: &str) -> ProviderError {
    let lowered = message.to_lowercase();

    if code == 401 || code == 403 || lowered.contains("invalid api key") {
        ProviderError::Auth(message.into())
    } else if code == 404
        || lowered.contains("not opted in")
        || lowered.contains("could not be found")
    {
        ProviderError::NotFound(message.into())
    } else {
        ProviderError::Api(message.into())
    }
}

fn parse_and_check_response(
    response: Result<Response, Error>,
) -> Result<serde_json::Value, ProviderError> {
    let json = match response {
        Ok(resp) => resp
            .into_json::<serde_json::Value>()
            .map_err(|e| ProviderError::Json(e.to_string().into()))?,

        Err(Error::Status(code, resp)) if code < 500 => {
            let json = resp
                .into_json::<serde_json::Value>()
                .map_err(|e| ProviderError::Json(e.to_string().into()))?;

            let message = json
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("(null)");

            return Err(classify_error(code, message));
        }

        Err(Error::Status(code, _resp)) => {
            return Err(ProviderError::Transport(format!("HTTP {}", code).into()));
        }

        Err(Error::Transport(tp)) => return Err(ProviderError::Transport(tp)),
    };

    // A sanity check. 2xx with status != SUCCESS has been observed.
    let status = json.get("status").and_then(|v| v.as_str());
    if status != Some("SUCCESS") {
        let message = json
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("(null)");

        return Err(classify_error(200, message));
    }

    Ok(json)
}

/// Pulls the records for `zone` out of a /dns/retrieve reply. The listing
/// covers the whole domain; everything not under the target's name is
/// dropped here, and types other than A are kept but tagged as untouchable.
fn records_from_json(
    zone: &ZoneTarget,
    response: &serde_json::Value,
) -> Result<Vec<ZoneRecord>, ProviderError> {
    let Some(records) = response.get("records").and_then(|v| v.as_array()) else {
        return Err(ProviderError::Json("no records array in response".into()));
    };

    let fqdn = zone.fqdn();
    let mut returned_records = Vec::new();

    for record in records {
        let Some(name) = record.get("name").and_then(|v| v.as_str()) else {
            return Err(ProviderError::Json("record has no name?".into()));
        };

        if name != fqdn {
            continue;
        }

        let Some(id) = record.get("id").and_then(|v| v.as_str()) else {
            return Err(ProviderError::Json("record has no id?".into()));
        };

        let Ok(id) = id.parse::<RecordId>() else {
            return Err(ProviderError::Json("id is not a u64 number".into()));
        };

        let Some(ty) = record.get("type").and_then(|v| v.as_str()) else {
            return Err(ProviderError::Json("record has no type?".into()));
        };

        let kind = match ty {
            "A" => RecordKind::A,
            other => RecordKind::Other(other.into()),
        };

        let Some(rdata) = record.get("content").and_then(|v| v.as_str()) else {
            return Err(ProviderError::Json("record has no content?".into()));
        };

        // TTL comes back as a string of digits.
        let Some(ttl) = record
            .get("ttl")
            .and_then(|v| v.as_str())
            .and_then(|v| v.parse::<u32>().ok())
        else {
            return Err(ProviderError::Json("record has no usable ttl?".into()));
        };

        let priority = record
            .get("prio")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .into();

        returned_records.push(ZoneRecord {
            id,
            kind,
            rdata: rdata.into(),
            ttl,
            priority,
        });
    }

    Ok(returned_records)
}

impl RecordApi for Porkbun {
    /// See: https://porkbun.com/api/json/v3/documentation#DNS%20Retrieve%20Records
    fn list_records(&self, zone: &ZoneTarget) -> Result<Vec<ZoneRecord>, ProviderError> {
        let url = format!("{}/dns/retrieve/{}", API_BASE, zone.domain);

        let response = Request::post(&url).send_json(serde_json::json!({
            "secretapikey": self.secret_api_key.as_ref(),
            "apikey": self.api_key.as_ref(),
        }));

        let response = parse_and_check_response(response)?;

        records_from_json(zone, &response)
    }

    /// See: https://porkbun.com/api/json/v3/documentation#DNS%20Create%20Record
    fn create_record(&self, zone: &ZoneTarget, record: &NewRecord) -> Result<(), ProviderError> {
        let url = format!("{}/dns/create/{}", API_BASE, zone.domain);

        let mut body = serde_json::json!({
            "secretapikey": self.secret_api_key.as_ref(),
            "apikey": self.api_key.as_ref(),
            "name": Self::api_name(zone),
            "type": "A",
            "content": record.rdata.as_ref(),
            "ttl": record.ttl.to_string(),
        });

        // An empty priority means "let the provider default it".
        if !record.priority.is_empty() {
            body["prio"] = serde_json::Value::from(record.priority.as_ref());
        }

        parse_and_check_response(Request::post(&url).send_json(body))?;

        Ok(())
    }

    /// See: https://porkbun.com/api/json/v3/documentation#DNS%20Edit%20Record
    fn update_record(&self, zone: &ZoneTarget, record: &ZoneRecord) -> Result<(), ProviderError> {
        let url = format!("{}/dns/edit/{}/{}", API_BASE, zone.domain, record.id);

        let mut body = serde_json::json!({
            "secretapikey": self.secret_api_key.as_ref(),
            "apikey": self.api_key.as_ref(),
            "name": Self::api_name(zone),
            "type": "A",
            "content": record.rdata.as_ref(),
            "ttl": record.ttl.to_string(),
        });

        if !record.priority.is_empty() {
            body["prio"] = serde_json::Value::from(record.priority.as_ref());
        }

        parse_and_check_response(Request::post(&url).send_json(body))?;

        Ok(())
    }

    /// See: https://porkbun.com/api/json/v3/documentation#DNS%20Delete%20Record
    fn delete_record(&self, zone: &ZoneTarget, id: RecordId) -> Result<(), ProviderError> {
        let url = format!("{}/dns/delete/{}/{}", API_BASE, zone.domain, id);

        let response = Request::post(&url).send_json(serde_json::json!({
            "secretapikey": self.secret_api_key.as_ref(),
            "apikey": self.api_key.as_ref(),
        }));

        parse_and_check_response(response)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(subdomain: &str) -> ZoneTarget {
        ZoneTarget {
            domain: "example.com".into(),
            subdomain: subdomain.into(),
            ttl: 300,
        }
    }

    #[test]
    fn auth_rejections_are_fatal() {
        let error = classify_error(403, "Invalid API key. (002)");
        assert!(matches!(error, ProviderError::Auth(_)));
        assert!(error.is_fatal());

        // Some auth failures come back as 400 with a telltale message.
        let error = classify_error(400, "Invalid API key. (002)");
        assert!(matches!(error, ProviderError::Auth(_)));
    }

    #[test]
    fn unknown_domains_are_fatal() {
        let error = classify_error(400, "Domain is not opted in to API access.");
        assert!(matches!(error, ProviderError::NotFound(_)));
        assert!(error.is_fatal());
    }

    #[test]
    fn everything_else_is_an_api_error() {
        let error = classify_error(400, "You are making requests too quickly.");
        assert!(matches!(error, ProviderError::Api(_)));
        assert!(!error.is_fatal());
    }

    #[test]
    fn listing_is_scoped_to_the_target_name() {
        let response = serde_json::json!({
            "status": "SUCCESS",
            "records": [
                {
                    "id": "106926652",
                    "name": "example.com",
                    "type": "A",
                    "content": "203.0.113.7",
                    "ttl": "600",
                    "prio": "0",
                },
                {
                    "id": "106926653",
                    "name": "example.com",
                    "type": "TXT",
                    "content": "v=spf1 -all",
                    "ttl": "600",
                },
                {
                    "id": "106926654",
                    "name": "www.example.com",
                    "type": "A",
                    "content": "203.0.113.7",
                    "ttl": "600",
                },
            ],
        });

        let records = records_from_json(&target("@"), &response).unwrap();

        // www.example.com is filtered out; the TXT record survives listing
        // but is marked as not ours to touch.
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            ZoneRecord {
                id: 106926652,
                kind: RecordKind::A,
                rdata: "203.0.113.7".into(),
                ttl: 600,
                priority: "0".into(),
            }
        );
        assert_eq!(records[1].kind, RecordKind::Other("TXT".into()));
    }

    #[test]
    fn subdomain_listing_matches_the_fqdn() {
        let response = serde_json::json!({
            "status": "SUCCESS",
            "records": [
                {
                    "id": "1",
                    "name": "example.com",
                    "type": "A",
                    "content": "203.0.113.7",
                    "ttl": "600",
                },
                {
                    "id": "2",
                    "name": "www.example.com",
                    "type": "A",
                    "content": "203.0.113.8",
                    "ttl": "300",
                },
            ],
        });

        let records = records_from_json(&target("www"), &response).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 2);
        assert_eq!(records[0].rdata.as_ref(), "203.0.113.8");
        // Missing prio defaults to empty, not an error.
        assert_eq!(records[0].priority.as_ref(), "");
    }

    #[test]
    fn malformed_listing_is_a_json_error() {
        let response = serde_json::json!({ "status": "SUCCESS" });
        assert!(matches!(
            records_from_json(&target("@"), &response),
            Err(ProviderError::Json(_))
        ));

        let response = serde_json::json!({
            "status": "SUCCESS",
            "records": [ { "name": "example.com", "type": "A" } ],
        });
        assert!(matches!(
            records_from_json(&target("@"), &response),
            Err(ProviderError::Json(_))
        ));
    }
}
