use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Delivery lifecycle states. Closed set; transitions between them are
/// restricted by the table in `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageStatus {
    Created,
    Sent,
    Accepted,
    Returned,
    Canceled,
}

impl PackageStatus {
    pub const ALL: [PackageStatus; 5] = [
        PackageStatus::Created,
        PackageStatus::Sent,
        PackageStatus::Accepted,
        PackageStatus::Returned,
        PackageStatus::Canceled,
    ];
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageStatus::Created => "Created",
            PackageStatus::Sent => "Sent",
            PackageStatus::Accepted => "Accepted",
            PackageStatus::Returned => "Returned",
            PackageStatus::Canceled => "Canceled",
        };
        f.write_str(name)
    }
}

/// One immutable step of a package's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: PackageStatus,
    pub timestamp: DateTime<Utc>,
}

/// A tracked package with its full status history. History is append-only
/// and chronological; `current_status` always matches its last entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: Uuid,
    pub tracking_number: String,
    pub sender_name: String,
    pub sender_address: String,
    pub sender_phone: String,
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_phone: String,
    pub current_status: PackageStatus,
    pub created_at: DateTime<Utc>,
    pub status_history: Vec<StatusHistoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackageRequest {
    pub sender_name: String,
    pub sender_address: String,
    pub sender_phone: String,
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_phone: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub new_status: PackageStatus,
}
