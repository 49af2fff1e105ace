//! SurrealDB implementation of the organization registry.
//!
//! The organization table is also the tenant directory: every row except
//! the reserved `public` one names a tenant partition, and
//! [`TenantDirectory`] is implemented here so callers obtain
//! [`TenantScope`] values from the registry instead of ambient state.

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::organization::{CreateOrganization, Organization, SHARED_SCHEMA};
use campus_core::repository::TenantDirectory;
use campus_core::tenant::TenantScope;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OrganizationRow {
    name: String,
    schema_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct OrganizationRowWithId {
    record_id: String,
    name: String,
    schema_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRow {
    fn into_organization(self, id: Uuid) -> Organization {
        Organization {
            id,
            name: self.name,
            schema_name: self.schema_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl OrganizationRowWithId {
    fn try_into_organization(self) -> Result<Organization, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(Organization {
            id,
            name: self.name,
            schema_name: self.schema_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateOrganization) -> CampusResult<Organization> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('organization', $id) SET \
                 name = $name, schema_name = $schema_name",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("schema_name", input.schema_name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("organization", e.to_string()))?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: id_str,
        })?;

        Ok(row.into_organization(id))
    }

    pub async fn get_by_id(&self, id: Uuid) -> CampusResult<Organization> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('organization', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: id_str,
        })?;

        Ok(row.into_organization(id))
    }

    pub async fn get_by_schema(&self, schema_name: &str) -> CampusResult<Organization> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM organization \
                 WHERE schema_name = $schema_name",
            )
            .bind(("schema_name", schema_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: format!("schema_name={schema_name}"),
        })?;

        Ok(row.try_into_organization()?)
    }
}

impl<C: Connection> TenantDirectory for SurrealOrganizationRepository<C> {
    async fn resolve(&self, organization_id: Uuid) -> CampusResult<TenantScope> {
        let org = self.get_by_id(organization_id).await?;
        if org.schema_name == SHARED_SCHEMA {
            return Err(CampusError::TenantContext);
        }
        Ok(TenantScope {
            organization_id: org.id,
            schema_name: org.schema_name,
            name: org.name,
        })
    }

    async fn resolve_by_schema(&self, schema_name: &str) -> CampusResult<TenantScope> {
        if schema_name == SHARED_SCHEMA {
            return Err(CampusError::TenantContext);
        }
        let org = self.get_by_schema(schema_name).await?;
        Ok(TenantScope {
            organization_id: org.id,
            schema_name: org.schema_name,
            name: org.name,
        })
    }

    async fn list_tenants(&self) -> CampusResult<Vec<TenantScope>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM organization \
                 WHERE schema_name != $shared \
                 ORDER BY created_at ASC",
            )
            .bind(("shared", SHARED_SCHEMA.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| {
                let org = row.try_into_organization()?;
                Ok(TenantScope {
                    organization_id: org.id,
                    schema_name: org.schema_name,
                    name: org.name,
                })
            })
            .collect()
    }
}
