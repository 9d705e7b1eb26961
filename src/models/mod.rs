use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured fields extracted from a free-text listing.
///
/// Every field is optional; a present value is non-empty after trimming.
/// `price_amount` keeps the parsed integer alongside the display string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub location: Option<String>,
    pub project: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub area: Option<String>,
    pub price_amount: Option<i64>,
    pub price_formatted: Option<String>,
    pub status: Option<String>,
    pub parking: Option<String>,
    pub furnishing: Option<String>,
    pub view: Option<String>,
    pub floor: Option<String>,
    pub handover: Option<String>,
    pub payment_plan: Option<String>,
}

/// Contact information detected in a submission text.
///
/// Phone digits are normalized to an optional leading `+` plus digits;
/// handle names match `[A-Za-z0-9_]{5,}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactTarget {
    Handle(String),
    Phone(String),
    Both(String, String),
    None,
}

/// A deep-link action derived from a [`ContactTarget`], rendered as an
/// inline button at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactAction {
    pub label: String,
    pub url: String,
}

/// A candidate listing awaiting moderation.
///
/// Immutable after creation; removed from the store exactly once, on either
/// publish or reject. Lives in memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub author_id: i64,
    pub author_name: String,
    pub text: String,
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}
