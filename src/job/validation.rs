use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use super::dto::JobForm;
use super::models::{parse_date, JobInput, JobStatus};

/// Field-level validation failure, one or more messages per field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), vec![message.into()]);
        Self { fields }
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self
            .fields
            .values()
            .flat_map(|messages| messages.iter().map(String::as_str))
            .collect();
        write!(f, "Validation failed: {}", messages.join("; "))
    }
}

impl From<ValidationErrors> for ValidationError {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Validation error in field: {}", field))
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self { fields }
    }
}

/// Validate a raw form into a payload ready for the remote service
///
/// Pure: nothing here touches the network.
pub fn validate(form: &JobForm) -> Result<JobInput, ValidationError> {
    let form = form.trimmed();
    form.validate()?;

    let status = form
        .status
        .parse::<JobStatus>()
        .map_err(|e| ValidationError::single("status", e.to_string()))?;

    let deadline = if form.deadline.is_empty() {
        None
    } else {
        Some(parse_date(&form.deadline).ok_or_else(|| {
            ValidationError::single("deadline", "Deadline must be a date in YYYY-MM-DD format")
        })?)
    };

    Ok(JobInput {
        company: form.company,
        role: form.role,
        deadline,
        status,
        notes: form.notes,
        logo: (!form.logo.is_empty()).then_some(form.logo),
    })
}
