use validator::Validate;

use super::models::{parse_date, JobRecord, JobStatus};

/// Raw job input as typed by the user, before validation
///
/// Every field is free text. An empty `deadline` or `logo` means "none".
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct JobForm {
    #[validate(length(min = 1, message = "Company is required"))]
    pub company: String,
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
    #[validate(custom(function = "validate_deadline"))]
    pub deadline: String,
    #[validate(custom(function = "validate_status"))]
    pub status: String,
    pub notes: String,
    pub logo: String,
}

impl Default for JobForm {
    fn default() -> Self {
        Self {
            company: String::new(),
            role: String::new(),
            deadline: String::new(),
            status: JobStatus::default().to_string(),
            notes: String::new(),
            logo: String::new(),
        }
    }
}

impl JobForm {
    pub fn new(company: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            role: role.into(),
            ..Self::default()
        }
    }

    /// Copy with surrounding whitespace removed from every field
    pub fn trimmed(&self) -> Self {
        Self {
            company: self.company.trim().to_string(),
            role: self.role.trim().to_string(),
            deadline: self.deadline.trim().to_string(),
            status: self.status.trim().to_string(),
            notes: self.notes.trim().to_string(),
            logo: self.logo.trim().to_string(),
        }
    }
}

impl From<&JobRecord> for JobForm {
    fn from(record: &JobRecord) -> Self {
        Self {
            company: record.company.clone(),
            role: record.role.clone(),
            deadline: record
                .deadline
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            status: record.status.to_string(),
            notes: record.notes.clone(),
            logo: record.logo.clone().unwrap_or_default(),
        }
    }
}

fn validate_deadline(deadline: &str) -> Result<(), validator::ValidationError> {
    if deadline.is_empty() || parse_date(deadline).is_some() {
        return Ok(());
    }
    Err(validator::ValidationError::new("deadline")
        .with_message("Deadline must be a date in YYYY-MM-DD format".into()))
}

fn validate_status(status: &str) -> Result<(), validator::ValidationError> {
    match status.parse::<JobStatus>() {
        Ok(_) => Ok(()),
        Err(_) => Err(validator::ValidationError::new("status")
            .with_message("Status must be one of Applied, Interview, Offer, Rejected".into())),
    }
}
