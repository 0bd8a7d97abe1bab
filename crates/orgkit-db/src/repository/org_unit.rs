//! SurrealDB implementation of [`OrgUnitRepository`].
//!
//! Structural writes are wrapped in transactions that re-check the
//! single-root invariant with a `THROW`; the thrown reason is mapped back
//! to a conflict. The service-layer precondition read may race, the
//! transaction here may not.

use chrono::{DateTime, Utc};
use orgkit_core::error::OrgResult;
use orgkit_core::models::org_unit::{CreateOrgUnit, OrgUnit, UnitType, UpdateOrgUnit};
use orgkit_core::repository::OrgUnitRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct OrgUnitRow {
    organisation_id: String,
    parent_id: Option<String>,
    unit_type: String,
    name: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct OrgUnitRowWithId {
    record_id: String,
    organisation_id: String,
    parent_id: Option<String>,
    unit_type: String,
    name: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_unit_type(s: &str) -> Result<UnitType, DbError> {
    match s {
        "Root" => Ok(UnitType::Root),
        "Organisation" => Ok(UnitType::Organisation),
        "Department" => Ok(UnitType::Department),
        "Class" => Ok(UnitType::Class),
        "Section" => Ok(UnitType::Section),
        "Subject" => Ok(UnitType::Subject),
        "Batch" => Ok(UnitType::Batch),
        "Group" => Ok(UnitType::Group),
        "Other" => Ok(UnitType::Other),
        other => Err(DbError::Migration(format!("unknown unit type: {other}"))),
    }
}

fn parse_parent(parent_id: Option<String>) -> Result<Option<Uuid>, DbError> {
    parent_id
        .map(|p| {
            Uuid::parse_str(&p).map_err(|e| DbError::Migration(format!("invalid parent UUID: {e}")))
        })
        .transpose()
}

impl OrgUnitRow {
    fn into_unit(self, id: Uuid) -> Result<OrgUnit, DbError> {
        let organisation_id = Uuid::parse_str(&self.organisation_id)
            .map_err(|e| DbError::Migration(format!("invalid organisation UUID: {e}")))?;
        Ok(OrgUnit {
            id,
            organisation_id,
            parent_id: parse_parent(self.parent_id)?,
            unit_type: parse_unit_type(&self.unit_type)?,
            name: self.name,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl OrgUnitRowWithId {
    fn try_into_unit(self) -> Result<OrgUnit, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let organisation_id = Uuid::parse_str(&self.organisation_id)
            .map_err(|e| DbError::Migration(format!("invalid organisation UUID: {e}")))?;
        Ok(OrgUnit {
            id,
            organisation_id,
            parent_id: parse_parent(self.parent_id)?,
            unit_type: parse_unit_type(&self.unit_type)?,
            name: self.name,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Maps a transaction error back to the invariant it protects.
fn map_tx_err(e: surrealdb::Error) -> DbError {
    let msg = e.to_string();
    if msg.contains("root exists") {
        DbError::Conflict {
            reason: "root exists".into(),
        }
    } else {
        DbError::Surreal(e)
    }
}

/// SurrealDB implementation of the OrgUnit repository.
#[derive(Clone)]
pub struct SurrealOrgUnitRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrgUnitRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OrgUnitRepository for SurrealOrgUnitRepository<C> {
    async fn create_unit(&self, input: CreateOrgUnit) -> OrgResult<OrgUnit> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let parent_id_str = input.parent_id.map(|p| p.to_string());
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 IF $parent_id = NONE AND \
                 (SELECT VALUE id FROM org_unit \
                  WHERE organisation_id = $organisation_id \
                  AND parent_id = NONE) != [] \
                 { THROW 'root exists'; }; \
                 CREATE type::record('org_unit', $id) SET \
                 organisation_id = $organisation_id, \
                 parent_id = $parent_id, \
                 unit_type = $unit_type, \
                 name = $name, metadata = $metadata; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("organisation_id", input.organisation_id.to_string()))
            .bind(("parent_id", parent_id_str))
            .bind(("unit_type", input.unit_type.as_str().to_string()))
            .bind(("name", input.name))
            .bind(("metadata", metadata))
            .await
            .map_err(map_tx_err)?;

        let mut result = result.check().map_err(map_tx_err)?;

        let rows: Vec<OrgUnitRow> = result.take(2).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "org_unit".into(),
            id: id_str,
        })?;

        Ok(row.into_unit(id)?)
    }

    async fn get(&self, organisation_id: Uuid, id: Uuid) -> OrgResult<OrgUnit> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('org_unit', $id) \
                 WHERE organisation_id = $organisation_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("organisation_id", organisation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrgUnitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "org_unit".into(),
            id: id_str,
        })?;

        Ok(row.into_unit(id)?)
    }

    async fn list_by_organisation(&self, organisation_id: Uuid) -> OrgResult<Vec<OrgUnit>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM org_unit \
                 WHERE organisation_id = $organisation_id \
                 ORDER BY created_at ASC",
            )
            .bind(("organisation_id", organisation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrgUnitRowWithId> = result.take(0).map_err(DbError::from)?;

        let units = rows
            .into_iter()
            .map(|row| row.try_into_unit())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(units)
    }

    async fn update(
        &self,
        organisation_id: Uuid,
        id: Uuid,
        input: UpdateOrgUnit,
    ) -> OrgResult<OrgUnit> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('org_unit', $id) SET {} \
             WHERE organisation_id = $organisation_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("organisation_id", organisation_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<OrgUnitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "org_unit".into(),
            id: id_str,
        })?;

        Ok(row.into_unit(id)?)
    }

    async fn reparent(
        &self,
        organisation_id: Uuid,
        id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> OrgResult<OrgUnit> {
        let id_str = id.to_string();
        let parent_id_str = new_parent_id.map(|p| p.to_string());

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 IF $parent_id = NONE AND \
                 (SELECT VALUE id FROM org_unit \
                  WHERE organisation_id = $organisation_id \
                  AND parent_id = NONE \
                  AND meta::id(id) != $id) != [] \
                 { THROW 'root exists'; }; \
                 UPDATE type::record('org_unit', $id) SET \
                 parent_id = $parent_id, updated_at = time::now() \
                 WHERE organisation_id = $organisation_id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("organisation_id", organisation_id.to_string()))
            .bind(("parent_id", parent_id_str))
            .await
            .map_err(map_tx_err)?;

        let mut result = result.check().map_err(map_tx_err)?;

        let rows: Vec<OrgUnitRow> = result.take(2).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "org_unit".into(),
            id: id_str,
        })?;

        Ok(row.into_unit(id)?)
    }

    async fn delete(&self, organisation_id: Uuid, id: Uuid) -> OrgResult<()> {
        self.db
            .query(
                "DELETE type::record('org_unit', $id) \
                 WHERE organisation_id = $organisation_id",
            )
            .bind(("id", id.to_string()))
            .bind(("organisation_id", organisation_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn delete_forced(&self, organisation_id: Uuid, id: Uuid, lift_to: Uuid) -> OrgResult<()> {
        // One transaction: widen scoped memberships, lift children to the
        // root, then remove the unit. Nothing in between is observable.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE membership SET unit_id = NONE, \
                 updated_at = time::now() \
                 WHERE organisation_id = $organisation_id \
                 AND unit_id = $id; \
                 UPDATE org_unit SET parent_id = $lift_to, \
                 updated_at = time::now() \
                 WHERE organisation_id = $organisation_id \
                 AND parent_id = $id; \
                 DELETE type::record('org_unit', $id) \
                 WHERE organisation_id = $organisation_id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("organisation_id", organisation_id.to_string()))
            .bind(("lift_to", lift_to.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn count_children(&self, organisation_id: Uuid, id: Uuid) -> OrgResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM org_unit \
                 WHERE organisation_id = $organisation_id \
                 AND parent_id = $id GROUP ALL",
            )
            .bind(("organisation_id", organisation_id.to_string()))
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_by_organisation(&self, organisation_id: Uuid) -> OrgResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM org_unit \
                 WHERE organisation_id = $organisation_id GROUP ALL",
            )
            .bind(("organisation_id", organisation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn find_root(&self, organisation_id: Uuid) -> OrgResult<Option<OrgUnit>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM org_unit \
                 WHERE organisation_id = $organisation_id \
                 AND parent_id = NONE LIMIT 1",
            )
            .bind(("organisation_id", organisation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrgUnitRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_unit()?)),
            None => Ok(None),
        }
    }
}
