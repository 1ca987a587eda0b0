use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::locations::{zfill5, Location};

/// A job posting currently open on the active sub-account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenJob {
    pub title: String,
    pub id: String,
    pub postal: String,
}

impl OpenJob {
    /// Maps one row of the open-jobs listing. Rows without a title or id
    /// are unusable and yield `None`.
    pub fn from_value(row: &Value) -> Option<Self> {
        let title = row.get("title")?.as_str()?.to_string();
        let id = json_id(row.get("id")?)?;
        let postal = zfill5(&row.get("postal").and_then(json_text).unwrap_or_default());
        Some(Self { title, id, postal })
    }
}

/// Ids arrive as either strings or integers depending on the endpoint.
pub fn json_id(value: &Value) -> Option<String> {
    json_text(value)
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Builds the payload that closes a job. Works on its own copy so the
/// "Closed" status can never leak into the clone payload built from the
/// same detail record.
pub fn close_payload(detail: &Value) -> Value {
    let mut payload = detail.clone();
    if let Some(fields) = payload.as_object_mut() {
        fields.insert("status".to_string(), json!("Closed"));
    }
    payload
}

/// Builds the payload that re-posts a job at the rotated location,
/// stamped with the run date.
pub fn clone_payload(detail: &Value, location: &Location, today: NaiveDate) -> Value {
    let mut payload = detail.clone();
    if let Some(fields) = payload.as_object_mut() {
        let stamp = today.format("%Y-%m-%d").to_string();
        fields.insert("city".to_string(), json!(location.city));
        fields.insert("state".to_string(), json!(location.state));
        fields.insert("postal".to_string(), json!(location.postal));
        fields.insert("status".to_string(), json!("Open"));
        fields.insert("dateOpened".to_string(), json!(stamp));
        fields.insert("updatedAt".to_string(), json!(stamp));
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::LocationTable;

    fn detail() -> Value {
        json!({
            "id": 7140,
            "title": "Branch Recruiter",
            "postal": "12201",
            "city": "Albany",
            "state": "NY",
            "status": "Open",
            "hiringLead": {"id": 9},
        })
    }

    fn table() -> LocationTable {
        LocationTable::from_rows(vec![
            Location {
                state: "NY".to_string(),
                city: "Albany".to_string(),
                postal: "12201".to_string(),
            },
            Location {
                state: "NY".to_string(),
                city: "Troy".to_string(),
                postal: "12180".to_string(),
            },
        ])
    }

    #[test]
    fn open_job_mapping_pads_postal() {
        let job = OpenJob::from_value(&json!({
            "title": "Driver",
            "id": 311,
            "postal": "501",
        }))
        .unwrap();
        assert_eq!(job.id, "311");
        assert_eq!(job.postal, "00501");
    }

    #[test]
    fn open_job_mapping_rejects_rows_without_id() {
        assert_eq!(OpenJob::from_value(&json!({"title": "Driver"})), None);
    }

    #[test]
    fn close_payload_flips_status_only() {
        let detail = detail();
        let payload = close_payload(&detail);
        assert_eq!(payload["status"], "Closed");
        assert_eq!(payload["postal"], "12201");
        // The detail record itself is untouched.
        assert_eq!(detail["status"], "Open");
    }

    #[test]
    fn clone_payload_rotates_to_next_location() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let detail = detail();
        let location = table().next_after("12201").unwrap().clone();

        let payload = clone_payload(&detail, &location, today);
        assert_eq!(payload["city"], "Troy");
        assert_eq!(payload["state"], "NY");
        assert_eq!(payload["postal"], "12180");
        assert_eq!(payload["status"], "Open");
        assert_eq!(payload["dateOpened"], "2026-08-23");
        assert_eq!(payload["updatedAt"], "2026-08-23");
        // Unrelated fields ride along unchanged.
        assert_eq!(payload["hiringLead"]["id"], 9);
    }

    #[test]
    fn last_row_clone_wraps_to_first_data_row() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let mut detail = detail();
        detail["postal"] = json!("12180");
        let location = table().next_after("12180").unwrap().clone();

        let payload = clone_payload(&detail, &location, today);
        assert_eq!(payload["city"], "Albany");
        assert_eq!(payload["postal"], "12201");
    }

    #[test]
    fn close_and_clone_payloads_are_independent() {
        let detail = detail();
        let closed = close_payload(&detail);
        let location = table().next_after("12201").unwrap().clone();
        let cloned = clone_payload(
            &detail,
            &location,
            NaiveDate::from_ymd_opt(2026, 8, 23).unwrap(),
        );

        assert_eq!(closed["status"], "Closed");
        assert_eq!(cloned["status"], "Open");
    }
}
