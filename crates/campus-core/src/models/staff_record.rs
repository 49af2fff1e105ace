//! Staff domain record, one-to-one with a profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub profile_id: Uuid,
    /// Generated human-readable code, e.g. `EMP-9F86D081`.
    pub employee_code: String,
    pub designation: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStaffRecord {
    pub profile_id: Uuid,
    pub employee_code: String,
    pub designation: String,
}

/// Employee code derived from the identity id: `EMP-` plus the first
/// eight hex characters, uppercased.
pub fn employee_code_for(identity_id: Uuid) -> String {
    let hex = identity_id.simple().to_string();
    format!("EMP-{}", hex[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_code_uses_first_eight_hex_chars() {
        let id = Uuid::parse_str("9f86d081-884c-4d63-9b1b-1b2c3d4e5f60").unwrap();
        assert_eq!(employee_code_for(id), "EMP-9F86D081");
    }
}
