//! SurrealDB implementation of [`OrganisationRepository`].

use chrono::{DateTime, Utc};
use orgkit_core::error::OrgResult;
use orgkit_core::models::organisation::{
    CreateOrganisation, Organisation, OrganisationType, UpdateOrganisation,
};
use orgkit_core::repository::{OrganisationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct OrganisationRow {
    name: String,
    slug: String,
    org_type: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct OrganisationRowWithId {
    record_id: String,
    name: String,
    slug: String,
    org_type: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_org_type(s: &str) -> Result<OrganisationType, DbError> {
    match s {
        "School" => Ok(OrganisationType::School),
        "College" => Ok(OrganisationType::College),
        "CoachingCenter" => Ok(OrganisationType::CoachingCenter),
        "Ngo" => Ok(OrganisationType::Ngo),
        other => Err(DbError::Migration(format!(
            "unknown organisation type: {other}"
        ))),
    }
}

impl OrganisationRow {
    fn into_organisation(self, id: Uuid) -> Result<Organisation, DbError> {
        Ok(Organisation {
            id,
            name: self.name,
            slug: self.slug,
            org_type: parse_org_type(&self.org_type)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl OrganisationRowWithId {
    fn try_into_organisation(self) -> Result<Organisation, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Organisation {
            id,
            name: self.name,
            slug: self.slug,
            org_type: parse_org_type(&self.org_type)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Organisation repository.
#[derive(Clone)]
pub struct SurrealOrganisationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganisationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OrganisationRepository for SurrealOrganisationRepository<C> {
    async fn create(&self, input: CreateOrganisation) -> OrgResult<Organisation> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('organisation', $id) SET \
                 name = $name, slug = $slug, org_type = $org_type, \
                 metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("org_type", input.org_type.as_str().to_string()))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<OrganisationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organisation".into(),
            id: id_str,
        })?;

        Ok(row.into_organisation(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> OrgResult<Organisation> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('organisation', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganisationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organisation".into(),
            id: id_str,
        })?;

        Ok(row.into_organisation(id)?)
    }

    async fn get_by_slug(&self, slug: &str) -> OrgResult<Organisation> {
        let slug_owned = slug.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM organisation WHERE slug = $slug",
            )
            .bind(("slug", slug_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganisationRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organisation".into(),
            id: slug_owned,
        })?;

        Ok(row.try_into_organisation()?)
    }

    async fn update(&self, id: Uuid, input: UpdateOrganisation) -> OrgResult<Organisation> {
        let id_str = id.to_string();

        // org_type is immutable: UpdateOrganisation has no field for it.
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.slug.is_some() {
            sets.push("slug = $slug");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('organisation', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(slug) = input.slug {
            builder = builder.bind(("slug", slug));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<OrganisationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organisation".into(),
            id: id_str,
        })?;

        Ok(row.into_organisation(id)?)
    }

    async fn delete(&self, id: Uuid) -> OrgResult<()> {
        let id_str = id.to_string();

        // Cascade: the organisation owns its tree, memberships and roles.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE org_unit WHERE organisation_id = $id; \
                 DELETE membership WHERE organisation_id = $id; \
                 DELETE role WHERE organisation_id = $id; \
                 DELETE type::record('organisation', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> OrgResult<PaginatedResult<Organisation>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM organisation GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM organisation \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganisationRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_organisation())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
