//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity. UUIDs
//! are stored as strings. Per-tenant tables carry a mandatory
//! `tenant_id` column; nothing below defines a cross-partition foreign
//! key — `profile.identity_ref` is deliberately a bare string that may
//! dangle, and the purge reactor plus the auditor own its consistency.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organizations (shared partition; doubles as the tenant registry)
-- =======================================================================
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD schema_name ON TABLE organization TYPE string;
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_organization_schema ON TABLE organization \
    COLUMNS schema_name UNIQUE;

-- =======================================================================
-- Identities (shared partition, global credential pool)
-- =======================================================================
DEFINE TABLE identity SCHEMAFULL;
DEFINE FIELD username ON TABLE identity TYPE string;
DEFINE FIELD email ON TABLE identity TYPE option<string>;
DEFINE FIELD password_hash ON TABLE identity TYPE string;
DEFINE FIELD is_active ON TABLE identity TYPE bool DEFAULT true;
DEFINE FIELD needs_password_rotation ON TABLE identity TYPE bool \
    DEFAULT false;
DEFINE FIELD initial_password_display ON TABLE identity \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE identity TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE identity TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_identity_username ON TABLE identity \
    COLUMNS username UNIQUE;
-- Unique-when-present: rows with an absent email are not indexed, so
-- they never collide with each other.
DEFINE INDEX idx_identity_email ON TABLE identity \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Role grants (shared partition)
-- =======================================================================
DEFINE TABLE role_grant SCHEMAFULL;
DEFINE FIELD identity_id ON TABLE role_grant TYPE string;
DEFINE FIELD organization_id ON TABLE role_grant TYPE string;
DEFINE FIELD role ON TABLE role_grant TYPE string;
DEFINE FIELD created_at ON TABLE role_grant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_grant_identity_role_org ON TABLE role_grant \
    COLUMNS identity_id, role, organization_id UNIQUE;
DEFINE INDEX idx_grant_identity ON TABLE role_grant \
    COLUMNS identity_id;

-- =======================================================================
-- Institution settings (tenant scope, one row per tenant)
-- =======================================================================
DEFINE TABLE institution_settings SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE institution_settings TYPE string;
DEFINE FIELD organization_id ON TABLE institution_settings TYPE string;
DEFINE FIELD display_name ON TABLE institution_settings TYPE string;
DEFINE FIELD created_at ON TABLE institution_settings TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE institution_settings TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_institution_tenant ON TABLE institution_settings \
    COLUMNS tenant_id UNIQUE;

-- =======================================================================
-- Profiles (tenant scope)
-- =======================================================================
DEFINE TABLE profile SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE profile TYPE string;
-- Soft reference into the shared partition. No foreign key; may dangle.
DEFINE FIELD identity_ref ON TABLE profile TYPE option<string>;
DEFINE FIELD local_username ON TABLE profile TYPE option<string>;
DEFINE FIELD first_name ON TABLE profile TYPE string;
DEFINE FIELD last_name ON TABLE profile TYPE string;
DEFINE FIELD phone ON TABLE profile TYPE option<string>;
DEFINE FIELD created_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
-- Unique-when-present per tenant; profiles without an alias are not
-- indexed and never collide.
DEFINE INDEX idx_profile_tenant_local ON TABLE profile \
    COLUMNS tenant_id, local_username UNIQUE;
DEFINE INDEX idx_profile_tenant_identity ON TABLE profile \
    COLUMNS tenant_id, identity_ref;

-- =======================================================================
-- Staff records (tenant scope, one-to-one with profile)
-- =======================================================================
DEFINE TABLE staff_record SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE staff_record TYPE string;
DEFINE FIELD profile_id ON TABLE staff_record TYPE string;
DEFINE FIELD employee_code ON TABLE staff_record TYPE string;
DEFINE FIELD designation ON TABLE staff_record TYPE string;
DEFINE FIELD created_at ON TABLE staff_record TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_staff_tenant_profile ON TABLE staff_record \
    COLUMNS tenant_id, profile_id UNIQUE;
DEFINE INDEX idx_staff_tenant_code ON TABLE staff_record \
    COLUMNS tenant_id, employee_code UNIQUE;

-- =======================================================================
-- Student records (tenant scope, one-to-one with profile)
-- =======================================================================
DEFINE TABLE student_record SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE student_record TYPE string;
DEFINE FIELD profile_id ON TABLE student_record TYPE string;
DEFINE FIELD enrollment_code ON TABLE student_record TYPE string;
DEFINE FIELD current_level ON TABLE student_record TYPE string;
DEFINE FIELD guardian_name ON TABLE student_record TYPE option<string>;
DEFINE FIELD guardian_phone ON TABLE student_record TYPE option<string>;
DEFINE FIELD created_at ON TABLE student_record TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_student_tenant_profile ON TABLE student_record \
    COLUMNS tenant_id, profile_id UNIQUE;
DEFINE INDEX idx_student_tenant_code ON TABLE student_record \
    COLUMNS tenant_id, enrollment_code UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
