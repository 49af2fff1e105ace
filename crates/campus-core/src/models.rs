//! Domain models.

pub mod identity;
pub mod institution;
pub mod organization;
pub mod profile;
pub mod role_grant;
pub mod staff_record;
pub mod student_record;
