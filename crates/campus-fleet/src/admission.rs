//! Student admission.
//!
//! Admission happens on the tenant side, usually before the student has
//! any login access: it creates an unlinked profile plus the student
//! domain record. Portal activation links such a profile to an identity
//! later. These unlinked profiles are a legitimate population the
//! auditor counts but never repairs.

use campus_core::error::CampusResult;
use campus_core::models::profile::{CreateProfile, Profile};
use campus_core::models::student_record::{
    CreateStudentRecord, StudentRecord, enrollment_code_for,
};
use campus_core::repository::{ProfileRepository, StudentRecordRepository};
use campus_core::tenant::TenantScope;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AdmitStudent {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub current_level: String,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
}

pub struct AdmissionService<'a, P, T> {
    profile_repo: &'a P,
    student_repo: &'a T,
}

impl<'a, P: ProfileRepository, T: StudentRecordRepository> AdmissionService<'a, P, T> {
    pub fn new(profile_repo: &'a P, student_repo: &'a T) -> Self {
        Self {
            profile_repo,
            student_repo,
        }
    }

    /// Create the unlinked profile and the student record for a new
    /// admission.
    pub async fn admit_student(
        &self,
        scope: &TenantScope,
        input: AdmitStudent,
    ) -> CampusResult<(Profile, StudentRecord)> {
        let profile = self
            .profile_repo
            .create(
                scope,
                CreateProfile {
                    identity_ref: None,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    phone: input.phone,
                },
            )
            .await?;

        let record = self
            .student_repo
            .create(
                scope,
                CreateStudentRecord {
                    profile_id: profile.id,
                    enrollment_code: enrollment_code_for(profile.id),
                    current_level: input.current_level,
                    guardian_name: input.guardian_name,
                    guardian_phone: input.guardian_phone,
                },
            )
            .await?;

        info!(
            tenant = %scope.schema_name,
            profile_id = %profile.id,
            enrollment_code = %record.enrollment_code,
            "student admitted"
        );
        Ok((profile, record))
    }
}
