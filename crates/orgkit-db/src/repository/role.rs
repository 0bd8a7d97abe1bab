//! SurrealDB implementation of [`RoleRepository`].

use chrono::{DateTime, Utc};
use orgkit_core::error::OrgResult;
use orgkit_core::models::role::{CreateRole, Role, RoleScope, UpdateRole};
use orgkit_core::repository::{PaginatedResult, Pagination, RoleRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct RoleRow {
    organisation_id: String,
    name: String,
    scope: String,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    organisation_id: String,
    name: String,
    scope: String,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_scope(s: &str) -> Result<RoleScope, DbError> {
    match s {
        "Org" => Ok(RoleScope::Org),
        "Unit" => Ok(RoleScope::Unit),
        other => Err(DbError::Migration(format!("unknown role scope: {other}"))),
    }
}

impl RoleRow {
    fn into_role(self, id: Uuid) -> Result<Role, DbError> {
        let organisation_id = Uuid::parse_str(&self.organisation_id)
            .map_err(|e| DbError::Migration(format!("invalid organisation UUID: {e}")))?;
        Ok(Role {
            id,
            organisation_id,
            name: self.name,
            scope: parse_scope(&self.scope)?,
            permissions: self.permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = RoleRow {
            organisation_id: self.organisation_id,
            name: self.name,
            scope: self.scope,
            permissions: self.permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_role(id)
    }
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> OrgResult<Role> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 organisation_id = $organisation_id, \
                 name = $name, scope = $scope, \
                 permissions = $permissions",
            )
            .bind(("id", id_str.clone()))
            .bind(("organisation_id", input.organisation_id.to_string()))
            .bind(("name", input.name))
            .bind(("scope", input.scope.as_str().to_string()))
            .bind(("permissions", input.permissions))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn get_by_id(&self, organisation_id: Uuid, id: Uuid) -> OrgResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('role', $id) \
                 WHERE organisation_id = $organisation_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("organisation_id", organisation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn update(&self, organisation_id: Uuid, id: Uuid, input: UpdateRole) -> OrgResult<Role> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.scope.is_some() {
            sets.push("scope = $scope");
        }
        if input.permissions.is_some() {
            sets.push("permissions = $permissions");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {} \
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
        if let Some(scope) = input.scope {
            builder = builder.bind(("scope", scope.as_str().to_string()));
        }
        if let Some(permissions) = input.permissions {
            builder = builder.bind(("permissions", permissions));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn delete(&self, organisation_id: Uuid, id: Uuid) -> OrgResult<()> {
        // One transaction: detach the role from memberships, then delete
        // it. Memberships themselves are never deleted here.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE membership SET role_id = NONE, \
                 updated_at = time::now() \
                 WHERE organisation_id = $organisation_id \
                 AND role_id = $id; \
                 DELETE type::record('role', $id) \
                 WHERE organisation_id = $organisation_id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("organisation_id", organisation_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn list(
        &self,
        organisation_id: Uuid,
        pagination: Pagination,
    ) -> OrgResult<PaginatedResult<Role>> {
        let organisation_id_str = organisation_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM role \
                 WHERE organisation_id = $organisation_id GROUP ALL",
            )
            .bind(("organisation_id", organisation_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE organisation_id = $organisation_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("organisation_id", organisation_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
