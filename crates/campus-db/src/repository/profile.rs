//! SurrealDB implementation of [`ProfileRepository`].
//!
//! Every query binds the scope's partition key; there is no path here
//! that reads or writes a profile outside the caller's tenant. The
//! `identity_ref` column is read and written as an opaque string — the
//! storage layer never joins it against the identity table.

use campus_core::error::CampusResult;
use campus_core::models::profile::{CreateProfile, Profile};
use campus_core::repository::ProfileRepository;
use campus_core::tenant::TenantScope;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ProfileRow {
    tenant_id: String,
    identity_ref: Option<String>,
    local_username: Option<String>,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ProfileRowWithId {
    record_id: String,
    tenant_id: String,
    identity_ref: Option<String>,
    local_username: Option<String>,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct for id-only projections.
#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Query(format!("invalid {field} UUID: {e}")))
}

fn parse_identity_ref(raw: Option<String>) -> Result<Option<Uuid>, DbError> {
    raw.map(|v| parse_uuid("identity_ref", &v)).transpose()
}

impl ProfileRow {
    fn try_into_profile(self, id: Uuid) -> Result<Profile, DbError> {
        Ok(Profile {
            id,
            tenant_id: parse_uuid("tenant_id", &self.tenant_id)?,
            identity_ref: parse_identity_ref(self.identity_ref)?,
            local_username: self.local_username,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ProfileRowWithId {
    fn try_into_profile(self) -> Result<Profile, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(Profile {
            id,
            tenant_id: parse_uuid("tenant_id", &self.tenant_id)?,
            identity_ref: parse_identity_ref(self.identity_ref)?,
            local_username: self.local_username,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealProfileRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProfileRepository for SurrealProfileRepository<C> {
    async fn create(&self, scope: &TenantScope, input: CreateProfile) -> CampusResult<Profile> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('profile', $id) SET \
                 tenant_id = $tenant_id, \
                 identity_ref = $identity_ref, \
                 first_name = $first_name, last_name = $last_name, \
                 phone = $phone",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", scope.partition_key()))
            .bind(("identity_ref", input.identity_ref.map(|v| v.to_string())))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("phone", input.phone))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("profile", e.to_string()))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.try_into_profile(id)?)
    }

    async fn get_by_id(&self, scope: &TenantScope, id: Uuid) -> CampusResult<Profile> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('profile', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", scope.partition_key()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.try_into_profile(id)?)
    }

    async fn get_by_identity(
        &self,
        scope: &TenantScope,
        identity_id: Uuid,
    ) -> CampusResult<Profile> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM profile \
                 WHERE tenant_id = $tenant_id AND identity_ref = $identity_ref",
            )
            .bind(("tenant_id", scope.partition_key()))
            .bind(("identity_ref", identity_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: format!("identity_ref={identity_id}"),
        })?;

        Ok(row.try_into_profile()?)
    }

    async fn get_by_local_username(
        &self,
        scope: &TenantScope,
        local_username: &str,
    ) -> CampusResult<Profile> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM profile \
                 WHERE tenant_id = $tenant_id AND local_username = $local_username",
            )
            .bind(("tenant_id", scope.partition_key()))
            .bind(("local_username", local_username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: format!("local_username={local_username}"),
        })?;

        Ok(row.try_into_profile()?)
    }

    async fn local_username_exists(
        &self,
        scope: &TenantScope,
        local_username: &str,
    ) -> CampusResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM profile \
                 WHERE tenant_id = $tenant_id AND local_username = $local_username",
            )
            .bind(("tenant_id", scope.partition_key()))
            .bind(("local_username", local_username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn link_identity(
        &self,
        scope: &TenantScope,
        profile_id: Uuid,
        identity_id: Uuid,
        local_username: &str,
    ) -> CampusResult<Profile> {
        let id_str = profile_id.to_string();

        // Alias uniqueness rides on the (tenant_id, local_username)
        // unique index: a racing link surfaces here as a statement
        // error, classified as Duplicate for the activation retry loop.
        let result = self
            .db
            .query(
                "UPDATE type::record('profile', $id) SET \
                 identity_ref = $identity_ref, \
                 local_username = $local_username, \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", scope.partition_key()))
            .bind(("identity_ref", identity_id.to_string()))
            .bind(("local_username", local_username.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("profile", e.to_string()))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.try_into_profile(profile_id)?)
    }

    async fn list(&self, scope: &TenantScope) -> CampusResult<Vec<Profile>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM profile \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY created_at ASC",
            )
            .bind(("tenant_id", scope.partition_key()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_profile().map_err(Into::into))
            .collect()
    }

    async fn delete_by_identity_ref(
        &self,
        scope: &TenantScope,
        identity_id: Uuid,
    ) -> CampusResult<Vec<Uuid>> {
        // Capture the victim ids before the delete so dependent domain
        // records can be cascaded by the caller.
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM profile \
                 WHERE tenant_id = $tenant_id AND identity_ref = $identity_ref; \
                 DELETE profile \
                 WHERE tenant_id = $tenant_id AND identity_ref = $identity_ref",
            )
            .bind(("tenant_id", scope.partition_key()))
            .bind(("identity_ref", identity_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| parse_uuid("record", &row.record_id).map_err(Into::into))
            .collect()
    }

    async fn delete_by_ids(&self, scope: &TenantScope, ids: &[Uuid]) -> CampusResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM profile \
                 WHERE tenant_id = $tenant_id AND meta::id(id) IN $ids; \
                 DELETE profile \
                 WHERE tenant_id = $tenant_id AND meta::id(id) IN $ids",
            )
            .bind(("tenant_id", scope.partition_key()))
            .bind(("ids", id_strings))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
