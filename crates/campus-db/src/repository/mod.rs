//! SurrealDB repository implementations.

mod identity;
mod institution;
mod organization;
mod profile;
mod role_grant;
mod staff_record;
mod student_record;

pub use identity::SurrealIdentityRepository;
pub use institution::SurrealInstitutionRepository;
pub use organization::SurrealOrganizationRepository;
pub use profile::SurrealProfileRepository;
pub use role_grant::SurrealRoleGrantRepository;
pub use staff_record::SurrealStaffRecordRepository;
pub use student_record::SurrealStudentRecordRepository;
