//! SurrealDB implementation of [`InstitutionRepository`].

use campus_core::error::CampusResult;
use campus_core::models::institution::InstitutionSettings;
use campus_core::repository::InstitutionRepository;
use campus_core::tenant::TenantScope;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct InstitutionRow {
    tenant_id: String,
    organization_id: String,
    display_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct InstitutionRowWithId {
    record_id: String,
    tenant_id: String,
    organization_id: String,
    display_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Query(format!("invalid {field} UUID: {e}")))
}

impl InstitutionRow {
    fn try_into_settings(self, id: Uuid) -> Result<InstitutionSettings, DbError> {
        Ok(InstitutionSettings {
            id,
            tenant_id: parse_uuid("tenant_id", &self.tenant_id)?,
            organization_id: parse_uuid("organization_id", &self.organization_id)?,
            display_name: self.display_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl InstitutionRowWithId {
    fn try_into_settings(self) -> Result<InstitutionSettings, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(InstitutionSettings {
            id,
            tenant_id: parse_uuid("tenant_id", &self.tenant_id)?,
            organization_id: parse_uuid("organization_id", &self.organization_id)?,
            display_name: self.display_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealInstitutionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInstitutionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InstitutionRepository for SurrealInstitutionRepository<C> {
    async fn get(&self, scope: &TenantScope) -> CampusResult<InstitutionSettings> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM institution_settings \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("tenant_id", scope.partition_key()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InstitutionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "institution_settings".into(),
            id: format!("tenant={}", scope.schema_name),
        })?;

        Ok(row.try_into_settings()?)
    }

    async fn create(
        &self,
        scope: &TenantScope,
        display_name: &str,
    ) -> CampusResult<InstitutionSettings> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('institution_settings', $id) SET \
                 tenant_id = $tenant_id, \
                 organization_id = $organization_id, \
                 display_name = $display_name",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", scope.partition_key()))
            .bind(("organization_id", scope.organization_id.to_string()))
            .bind(("display_name", display_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("institution_settings", e.to_string()))?;

        let rows: Vec<InstitutionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "institution_settings".into(),
            id: id_str,
        })?;

        Ok(row.try_into_settings(id)?)
    }
}
