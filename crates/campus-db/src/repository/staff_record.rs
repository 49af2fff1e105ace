//! SurrealDB implementation of [`StaffRecordRepository`].

use campus_core::error::CampusResult;
use campus_core::models::staff_record::{CreateStaffRecord, StaffRecord};
use campus_core::repository::StaffRecordRepository;
use campus_core::tenant::TenantScope;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct StaffRow {
    tenant_id: String,
    profile_id: String,
    employee_code: String,
    designation: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct StaffRowWithId {
    record_id: String,
    tenant_id: String,
    profile_id: String,
    employee_code: String,
    designation: String,
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

impl StaffRow {
    fn try_into_record(self, id: Uuid) -> Result<StaffRecord, DbError> {
        Ok(StaffRecord {
            id,
            tenant_id: parse_uuid("tenant_id", &self.tenant_id)?,
            profile_id: parse_uuid("profile_id", &self.profile_id)?,
            employee_code: self.employee_code,
            designation: self.designation,
            created_at: self.created_at,
        })
    }
}

impl StaffRowWithId {
    fn try_into_record(self) -> Result<StaffRecord, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(StaffRecord {
            id,
            tenant_id: parse_uuid("tenant_id", &self.tenant_id)?,
            profile_id: parse_uuid("profile_id", &self.profile_id)?,
            employee_code: self.employee_code,
            designation: self.designation,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealStaffRecordRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStaffRecordRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> StaffRecordRepository for SurrealStaffRecordRepository<C> {
    async fn create(
        &self,
        scope: &TenantScope,
        input: CreateStaffRecord,
    ) -> CampusResult<StaffRecord> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('staff_record', $id) SET \
                 tenant_id = $tenant_id, \
                 profile_id = $profile_id, \
                 employee_code = $employee_code, \
                 designation = $designation",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", scope.partition_key()))
            .bind(("profile_id", input.profile_id.to_string()))
            .bind(("employee_code", input.employee_code))
            .bind(("designation", input.designation))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("staff_record", e.to_string()))?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "staff_record".into(),
            id: id_str,
        })?;

        Ok(row.try_into_record(id)?)
    }

    async fn get_by_profile(
        &self,
        scope: &TenantScope,
        profile_id: Uuid,
    ) -> CampusResult<StaffRecord> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM staff_record \
                 WHERE tenant_id = $tenant_id AND profile_id = $profile_id",
            )
            .bind(("tenant_id", scope.partition_key()))
            .bind(("profile_id", profile_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "staff_record".into(),
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
                "SELECT meta::id(id) AS record_id FROM staff_record \
                 WHERE tenant_id = $tenant_id AND profile_id IN $profile_ids; \
                 DELETE staff_record \
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
