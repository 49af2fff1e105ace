//! SurrealDB implementation of [`RoleGrantRepository`].

use campus_core::error::CampusResult;
use campus_core::models::role_grant::{CreateRoleGrant, RoleGrant};
use campus_core::repository::RoleGrantRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RoleGrantRow {
    identity_id: String,
    organization_id: String,
    role: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RoleGrantRowWithId {
    record_id: String,
    identity_id: String,
    organization_id: String,
    role: String,
    created_at: DateTime<Utc>,
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Query(format!("invalid {field} UUID: {e}")))
}

impl RoleGrantRow {
    fn try_into_grant(self, id: Uuid) -> Result<RoleGrant, DbError> {
        Ok(RoleGrant {
            id,
            identity_id: parse_uuid("identity_id", &self.identity_id)?,
            organization_id: parse_uuid("organization_id", &self.organization_id)?,
            role: self.role,
            created_at: self.created_at,
        })
    }
}

impl RoleGrantRowWithId {
    fn try_into_grant(self) -> Result<RoleGrant, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(RoleGrant {
            id,
            identity_id: parse_uuid("identity_id", &self.identity_id)?,
            organization_id: parse_uuid("organization_id", &self.organization_id)?,
            role: self.role,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealRoleGrantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleGrantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleGrantRepository for SurrealRoleGrantRepository<C> {
    async fn create(&self, input: CreateRoleGrant) -> CampusResult<RoleGrant> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('role_grant', $id) SET \
                 identity_id = $identity_id, \
                 organization_id = $organization_id, \
                 role = $role",
            )
            .bind(("id", id_str.clone()))
            .bind(("identity_id", input.identity_id.to_string()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("role", input.role))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("role_grant", e.to_string()))?;

        let rows: Vec<RoleGrantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role_grant".into(),
            id: id_str,
        })?;

        Ok(row.try_into_grant(id)?)
    }

    async fn get(
        &self,
        identity_id: Uuid,
        organization_id: Uuid,
        role: &str,
    ) -> CampusResult<RoleGrant> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role_grant \
                 WHERE identity_id = $identity_id \
                 AND organization_id = $organization_id \
                 AND role = $role",
            )
            .bind(("identity_id", identity_id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .bind(("role", role.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleGrantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role_grant".into(),
            id: format!("identity={identity_id} role={role} org={organization_id}"),
        })?;

        Ok(row.try_into_grant()?)
    }

    async fn list_by_identity(&self, identity_id: Uuid) -> CampusResult<Vec<RoleGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role_grant \
                 WHERE identity_id = $identity_id \
                 ORDER BY created_at ASC",
            )
            .bind(("identity_id", identity_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleGrantRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_grant().map_err(Into::into))
            .collect()
    }

    async fn delete(&self, id: Uuid) -> CampusResult<()> {
        self.db
            .query("DELETE type::record('role_grant', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
