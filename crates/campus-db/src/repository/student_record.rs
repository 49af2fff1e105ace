//! SurrealDB implementation of [`StudentRecordRepository`].

use campus_core::error::CampusResult;
use campus_core::models::student_record::{CreateStudentRecord, StudentRecord};
use campus_core::repository::StudentRecordRepository;
use campus_core::tenant::TenantScope;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct StudentRow {
    tenant_id: String,
    profile_id: String,
    enrollment_code: String,
    current_level: String,
    guardian_name: Option<String>,
    guardian_phone: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct StudentRowWithId {
    record_id: String,
    tenant_id: String,
    profile_id: String,
    enrollment_code: String,
    current_level: String,
    guardian_name: Option<String>,
    guardian_phone: Option<String>,
    created_at: DateTime<Utc>,
}

/// Row struct for id-only projections.
#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Query(format!("invalid {field} UUID: {e}")))
}

impl StudentRow {
    fn try_into_record(self, id: Uuid) -> Result<StudentRecord, DbError> {
        Ok(StudentRecord {
            id,
            tenant_id: parse_uuid("tenant_id", &self.tenant_id)?,
            profile_id: parse_uuid("profile_id", &self.profile_id)?,
            enrollment_code: self.enrollment_code,
            current_level: self.current_level,
            guardian_name: self.guardian_name,
            guardian_phone: self.guardian_phone,
            created_at: self.created_at,
        })
    }
}

impl StudentRowWithId {
    fn try_into_record(self) -> Result<StudentRecord, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(StudentRecord {
            id,
            tenant_id: parse_uuid("tenant_id", &self.tenant_id)?,
            profile_id: parse_uuid("profile_id", &self.profile_id)?,
            enrollment_code: self.enrollment_code,
            current_level: self.current_level,
            guardian_name: self.guardian_name,
            guardian_phone: self.guardian_phone,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealStudentRecordRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStudentRecordRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> StudentRecordRepository for SurrealStudentRecordRepository<C> {
    async fn create(
        &self,
        scope: &TenantScope,
        input: CreateStudentRecord,
    ) -> CampusResult<StudentRecord> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('student_record', $id) SET \
                 tenant_id = $tenant_id, \
                 profile_id = $profile_id, \
                 enrollment_code = $enrollment_code, \
                 current_level = $current_level, \
                 guardian_name = $guardian_name, \
                 guardian_phone = $guardian_phone",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", scope.partition_key()))
            .bind(("profile_id", input.profile_id.to_string()))
            .bind(("enrollment_code", input.enrollment_code))
            .bind(("current_level", input.current_level))
            .bind(("guardian_name", input.guardian_name))
            .bind(("guardian_phone", input.guardian_phone))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("student_record", e.to_string()))?;

        let rows: Vec<StudentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "student_record".into(),
            id: id_str,
        })?;

        Ok(row.try_into_record(id)?)
    }

    async fn get_by_profile(
        &self,
        scope: &TenantScope,
        profile_id: Uuid,
    ) -> CampusResult<StudentRecord> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM student_record \
                 WHERE tenant_id = $tenant_id AND profile_id = $profile_id",
            )
            .bind(("tenant_id", scope.partition_key()))
            .bind(("profile_id", profile_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "student_record".into(),
            id: format!("profile_id={profile_id}"),
        })?;

        Ok(row.try_into_record()?)
    }

    async fn delete_by_profiles(
        &self,
        scope: &TenantScope,
        profile_ids: &[Uuid],
    ) -> CampusResult<u64> {
        if profile_ids.is_empty() {
            return Ok(0);
        }

        let id_strings: Vec<String> = profile_ids.iter().map(|id| id.to_string()).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM student_record \
                 WHERE tenant_id = $tenant_id AND profile_id IN $profile_ids; \
                 DELETE student_record \
                 WHERE tenant_id = $tenant_id AND profile_id IN $profile_ids",
            )
            .bind(("tenant_id", scope.partition_key()))
            .bind(("profile_ids", id_strings))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
