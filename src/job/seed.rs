use chrono::NaiveDate;

use super::models::{JobInput, JobStatus};

/// Fixed set loaded by the demo action
pub fn demo_jobs() -> Vec<JobInput> {
    vec![
        JobInput {
            company: "Ganglia Technologies".into(),
            role: "Frontend Intern".into(),
            deadline: NaiveDate::from_ymd_opt(2025, 11, 20),
            status: JobStatus::Applied,
            notes: "Submitted resume".into(),
            logo: None,
        },
        JobInput {
            company: "Pixel Forge".into(),
            role: "UI/UX Intern".into(),
            deadline: NaiveDate::from_ymd_opt(2025, 12, 10),
            status: JobStatus::Rejected,
            notes: "Good portfolio".into(),
            logo: None,
        },
    ]
}
