//! SurrealDB implementation of [`MembershipRepository`].

use chrono::{DateTime, Utc};
use orgkit_core::error::OrgResult;
use orgkit_core::models::membership::{BaseRole, CreateMembership, Membership};
use orgkit_core::repository::MembershipRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct MembershipRow {
    organisation_id: String,
    user_id: String,
    base_role: String,
    role_id: Option<String>,
    unit_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct MembershipRowWithId {
    record_id: String,
    organisation_id: String,
    user_id: String,
    base_role: String,
    role_id: Option<String>,
    unit_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_base_role(s: &str) -> Result<BaseRole, DbError> {
    match s {
        "Admin" => Ok(BaseRole::Admin),
        "Staff" => Ok(BaseRole::Staff),
        "Student" => Ok(BaseRole::Student),
        "Parent" => Ok(BaseRole::Parent),
        other => Err(DbError::Migration(format!("unknown base role: {other}"))),
    }
}

fn parse_optional_uuid(value: Option<String>, what: &str) -> Result<Option<Uuid>, DbError> {
    value
        .map(|v| {
            Uuid::parse_str(&v)
                .map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
        })
        .transpose()
}

impl MembershipRow {
    fn into_membership(self, id: Uuid) -> Result<Membership, DbError> {
        let organisation_id = Uuid::parse_str(&self.organisation_id)
            .map_err(|e| DbError::Migration(format!("invalid organisation UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        Ok(Membership {
            id,
            organisation_id,
            user_id,
            base_role: parse_base_role(&self.base_role)?,
            role_id: parse_optional_uuid(self.role_id, "role")?,
            unit_id: parse_optional_uuid(self.unit_id, "unit")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl MembershipRowWithId {
    fn try_into_membership(self) -> Result<Membership, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = MembershipRow {
            organisation_id: self.organisation_id,
            user_id: self.user_id,
            base_role: self.base_role,
            role_id: self.role_id,
            unit_id: self.unit_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_membership(id)
    }
}

/// SurrealDB implementation of the Membership repository.
#[derive(Clone)]
pub struct SurrealMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn create(&self, input: CreateMembership) -> OrgResult<Membership> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('membership', $id) SET \
                 organisation_id = $organisation_id, \
                 user_id = $user_id, \
                 base_role = $base_role, \
                 role_id = $role_id, \
                 unit_id = $unit_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("organisation_id", input.organisation_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("base_role", input.base_role.as_str().to_string()))
            .bind(("role_id", input.role_id.map(|r| r.to_string())))
            .bind(("unit_id", input.unit_id.map(|u| u.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "membership".into(),
            id: id_str,
        })?;

        Ok(row.into_membership(id)?)
    }

    async fn get(&self, organisation_id: Uuid, id: Uuid) -> OrgResult<Membership> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('membership', $id) \
                 WHERE organisation_id = $organisation_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("organisation_id", organisation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "membership".into(),
            id: id_str,
        })?;

        Ok(row.into_membership(id)?)
    }

    async fn list_by_user(
        &self,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> OrgResult<Vec<Membership>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE organisation_id = $organisation_id \
                 AND user_id = $user_id \
                 ORDER BY created_at ASC",
            )
            .bind(("organisation_id", organisation_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;

        let memberships = rows
            .into_iter()
            .map(|row| row.try_into_membership())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(memberships)
    }

    async fn list_by_unit(
        &self,
        organisation_id: Uuid,
        unit_id: Uuid,
    ) -> OrgResult<Vec<Membership>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE organisation_id = $organisation_id \
                 AND unit_id = $unit_id \
                 ORDER BY created_at ASC",
            )
            .bind(("organisation_id", organisation_id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;

        let memberships = rows
            .into_iter()
            .map(|row| row.try_into_membership())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(memberships)
    }

    async fn count_by_unit(&self, organisation_id: Uuid, unit_id: Uuid) -> OrgResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM membership \
                 WHERE organisation_id = $organisation_id \
                 AND unit_id = $unit_id GROUP ALL",
            )
            .bind(("organisation_id", organisation_id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn clear_unit(&self, organisation_id: Uuid, unit_id: Uuid) -> OrgResult<()> {
        self.db
            .query(
                "UPDATE membership SET unit_id = NONE, \
                 updated_at = time::now() \
                 WHERE organisation_id = $organisation_id \
                 AND unit_id = $unit_id",
            )
            .bind(("organisation_id", organisation_id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn clear_role(&self, organisation_id: Uuid, role_id: Uuid) -> OrgResult<()> {
        self.db
            .query(
                "UPDATE membership SET role_id = NONE, \
                 updated_at = time::now() \
                 WHERE organisation_id = $organisation_id \
                 AND role_id = $role_id",
            )
            .bind(("organisation_id", organisation_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, organisation_id: Uuid, id: Uuid) -> OrgResult<()> {
        self.db
            .query(
                "DELETE type::record('membership', $id) \
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
}
