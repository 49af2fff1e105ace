//! Student domain record, one-to-one with a profile.
//!
//! Student records are never created by role-grant provisioning; they
//! come from the admission workflow, usually before the student has any
//! login access at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub profile_id: Uuid,
    /// Generated human-readable code, e.g. `STU-4A1B2C3D`.
    pub enrollment_code: String,
    pub current_level: String,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentRecord {
    pub profile_id: Uuid,
    pub enrollment_code: String,
    pub current_level: String,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
}

/// Enrollment code derived from the profile id: `STU-` plus the first
/// eight hex characters, uppercased.
pub fn enrollment_code_for(profile_id: Uuid) -> String {
    let hex = profile_id.simple().to_string();
    format!("STU-{}", hex[..8].to_uppercase())
}
