use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Server-assigned identifier of a job record.
///
/// The service may hand out numeric or textual ids. Canonical decimal
/// strings are folded into `Numeric` so that `"3"` and `3` name the same
/// record. Numeric ids order numerically and before textual ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobId {
    Numeric(u64),
    Text(String),
}

impl JobId {
    fn from_text(value: &str) -> Self {
        match value.parse::<u64>() {
            Ok(n) if n.to_string() == value => JobId::Numeric(n),
            _ => JobId::Text(value.to_string()),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobId::Numeric(n) => write!(f, "{}", n),
            JobId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for JobId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(JobId::from_text(s.trim()))
    }
}

impl Serialize for JobId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            JobId::Numeric(n) => serializer.serialize_u64(*n),
            JobId::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Numeric(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Numeric(n) => JobId::Numeric(n),
            RawId::Text(s) => JobId::from_text(&s),
        })
    }
}

/// Application status of a job record
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Applied,
        JobStatus::Interview,
        JobStatus::Offer,
        JobStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Applied => "Applied",
            JobStatus::Interview => "Interview",
            JobStatus::Offer => "Offer",
            JobStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown status '{0}', expected one of Applied, Interview, Offer, Rejected")]
pub struct ParseStatusError(pub String);

impl FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Job payload without identity, sent on create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInput {
    pub company: String,
    pub role: String,
    #[serde(default, with = "deadline_format")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub logo: Option<String>,
}

/// Job record as confirmed by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub company: String,
    pub role: String,
    #[serde(default, with = "deadline_format")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub logo: Option<String>,
}

impl JobRecord {
    pub fn new(id: JobId, input: JobInput) -> Self {
        Self {
            id,
            company: input.company,
            role: input.role,
            deadline: input.deadline,
            status: input.status,
            notes: input.notes,
            logo: input.logo,
        }
    }

    pub fn to_input(&self) -> JobInput {
        JobInput {
            company: self.company.clone(),
            role: self.role.clone(),
            deadline: self.deadline,
            status: self.status,
            notes: self.notes.clone(),
            logo: self.logo.clone(),
        }
    }

    /// Placeholder badge shown when the record has no logo
    pub fn initial(&self) -> char {
        self.company
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('?')
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

/// `YYYY-MM-DD` on the wire; `null`, missing and `""` all mean no deadline.
mod deadline_format {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_date(text)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid deadline '{}'", text))),
        }
    }
}

/// Accepts a calendar date or an RFC 3339 timestamp (date part kept)
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_numeric_and_textual_ids() {
        let numeric: JobRecord =
            serde_json::from_value(json!({"id": 7, "company": "Acme", "role": "Dev"})).unwrap();
        let digits: JobRecord =
            serde_json::from_value(json!({"id": "7", "company": "Acme", "role": "Dev"})).unwrap();
        let text: JobRecord =
            serde_json::from_value(json!({"id": "a1b2", "company": "Acme", "role": "Dev"})).unwrap();

        assert_eq!(numeric.id, JobId::Numeric(7));
        assert_eq!(digits.id, numeric.id);
        assert_eq!(text.id, JobId::Text("a1b2".into()));
        assert_eq!(numeric.status, JobStatus::Applied);
    }

    #[test]
    fn leading_zero_ids_stay_textual() {
        assert_eq!("007".parse::<JobId>().unwrap(), JobId::Text("007".into()));
        assert_eq!("12".parse::<JobId>().unwrap(), JobId::Numeric(12));
    }

    #[test]
    fn blank_wire_values_mean_absent() {
        let record: JobRecord = serde_json::from_value(json!({
            "id": 1,
            "company": "Pixel Forge",
            "role": "UI/UX Intern",
            "deadline": "",
            "status": "Rejected",
            "notes": null,
            "logo": ""
        }))
        .unwrap();

        assert_eq!(record.deadline, None);
        assert_eq!(record.logo, None);
        assert_eq!(record.notes, "");
        assert_eq!(record.status, JobStatus::Rejected);
    }

    #[test]
    fn deadline_round_trips_as_calendar_date() {
        let record: JobRecord = serde_json::from_value(json!({
            "id": 1, "company": "Acme", "role": "Dev", "deadline": "2025-11-20"
        }))
        .unwrap();
        assert_eq!(record.deadline, NaiveDate::from_ymd_opt(2025, 11, 20));

        let wire = serde_json::to_value(record.to_input()).unwrap();
        assert_eq!(wire["deadline"], json!("2025-11-20"));
        assert!(wire.get("id").is_none());
    }

    #[test]
    fn rejects_invalid_wire_values() {
        let result = serde_json::from_value::<JobRecord>(json!({
            "id": 1, "company": "Acme", "role": "Dev", "status": "Ghosted"
        }));
        assert!(result.is_err());

        for deadline in ["2025-02-30", "soon"] {
            let result = serde_json::from_value::<JobRecord>(json!({
                "id": 1, "company": "Acme", "role": "Dev", "deadline": deadline
            }));
            assert!(result.is_err(), "accepted deadline {deadline}");
        }
    }

    #[test]
    fn status_parsing_is_exact() {
        assert_eq!("Offer".parse::<JobStatus>(), Ok(JobStatus::Offer));
        assert!("offer".parse::<JobStatus>().is_err());
    }

    #[test]
    fn initial_uses_first_company_letter() {
        let record = JobRecord::new(
            JobId::Numeric(1),
            JobInput {
                company: "zeta labs".into(),
                role: "Dev".into(),
                deadline: None,
                status: JobStatus::Offer,
                notes: String::new(),
                logo: None,
            },
        );
        assert_eq!(record.initial(), 'Z');
    }
}
