//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

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
-- Organisations (global scope)
-- =======================================================================
DEFINE TABLE organisation SCHEMAFULL;
DEFINE FIELD name ON TABLE organisation TYPE string;
DEFINE FIELD slug ON TABLE organisation TYPE string;
DEFINE FIELD org_type ON TABLE organisation TYPE string \
    ASSERT $value IN ['School', 'College', 'CoachingCenter', 'Ngo'];
DEFINE FIELD metadata ON TABLE organisation TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE organisation TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organisation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_organisation_slug ON TABLE organisation \
    COLUMNS slug UNIQUE;

-- =======================================================================
-- Organisational units (organisation scope, tree)
-- parent_id = NONE marks the single tree root; the repository enforces
-- uniqueness inside its insert/reparent transactions.
-- =======================================================================
DEFINE TABLE org_unit SCHEMAFULL;
DEFINE FIELD organisation_id ON TABLE org_unit TYPE string;
DEFINE FIELD parent_id ON TABLE org_unit TYPE option<string>;
DEFINE FIELD unit_type ON TABLE org_unit TYPE string \
    ASSERT $value IN ['Root', 'Organisation', 'Department', 'Class', \
    'Section', 'Subject', 'Batch', 'Group', 'Other'];
DEFINE FIELD name ON TABLE org_unit TYPE string;
DEFINE FIELD metadata ON TABLE org_unit TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE org_unit TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE org_unit TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_org_unit_org ON TABLE org_unit \
    COLUMNS organisation_id;
DEFINE INDEX idx_org_unit_parent ON TABLE org_unit \
    COLUMNS organisation_id, parent_id;

-- =======================================================================
-- Memberships (organisation scope)
-- =======================================================================
DEFINE TABLE membership SCHEMAFULL;
DEFINE FIELD organisation_id ON TABLE membership TYPE string;
DEFINE FIELD user_id ON TABLE membership TYPE string;
DEFINE FIELD base_role ON TABLE membership TYPE string \
    ASSERT $value IN ['Admin', 'Staff', 'Student', 'Parent'];
DEFINE FIELD role_id ON TABLE membership TYPE option<string>;
DEFINE FIELD unit_id ON TABLE membership TYPE option<string>;
DEFINE FIELD created_at ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_membership_org_user ON TABLE membership \
    COLUMNS organisation_id, user_id;
DEFINE INDEX idx_membership_org_unit ON TABLE membership \
    COLUMNS organisation_id, unit_id;

-- =======================================================================
-- Custom roles (organisation scope)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD organisation_id ON TABLE role TYPE string;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD scope ON TABLE role TYPE string \
    ASSERT $value IN ['Org', 'Unit'];
DEFINE FIELD permissions ON TABLE role TYPE array;
DEFINE FIELD permissions.* ON TABLE role TYPE string;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_org_name ON TABLE role \
    COLUMNS organisation_id, name UNIQUE;
";

// -----------------------------------------------------------------------
// Migration runner
// -----------------------------------------------------------------------

/// Applies any pending migrations. Idempotent.
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
