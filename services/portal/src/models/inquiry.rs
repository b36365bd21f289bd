//! Inquiry model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Triage status of an inquiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    New,
    Contacted,
    Enrolled,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::Contacted => "contacted",
            InquiryStatus::Enrolled => "enrolled",
            InquiryStatus::Closed => "closed",
        }
    }
}

impl FromStr for InquiryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(InquiryStatus::New),
            "contacted" => Ok(InquiryStatus::Contacted),
            "enrolled" => Ok(InquiryStatus::Enrolled),
            "closed" => Ok(InquiryStatus::Closed),
            other => Err(format!("unknown inquiry status: {other}")),
        }
    }
}

/// Inquiry entity
#[derive(Debug, Clone, Serialize)]
pub struct Inquiry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub course_interest: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New inquiry submission payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewInquiry {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub course_interest: Option<String>,
    pub message: String,
}

/// Inquiry count per triage status
#[derive(Debug, Clone, Serialize)]
pub struct InquiryStatusCount {
    pub status: InquiryStatus,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            InquiryStatus::New,
            InquiryStatus::Contacted,
            InquiryStatus::Enrolled,
            InquiryStatus::Closed,
        ] {
            assert_eq!(status.as_str().parse::<InquiryStatus>().unwrap(), status);
        }
        assert!("spam".parse::<InquiryStatus>().is_err());
    }
}
