
use crate::Error;
use crate::model::{CveRecord, RefreshSummary, Source};
use crate::nvd::{FetchedCve, MAX_RESULTS, NvdClient};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use std::collections::{HashMap, HashSet};
use tracing::instrument;
use vigil_common::db::Database;
use vigil_cvss::Severity;
use vigil_entity::cve;

pub const DEFAULT_LIMIT: i64 = 25;

const NO_DESCRIPTION: &str = "No description provided.";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub inserted: u64,
    pub updated: u64,
}

/// Feed orchestration over the cache database and the upstream client.
///
/// Every request runs its own fetch-then-upsert sequence; concurrent calls
/// are not serialized. Upsert is idempotent per id, so racing refreshes
/// settle on the last write for each key.
pub struct FeedService {
    db: Database,
    client: NvdClient,
}

impl FeedService {
    pub fn new(db: Database, client: NvdClient) -> Self {
        Self { db, client }
    }

    /// The most recently published records, newest first, at most `limit`.
    pub async fn get_latest(&self, limit: u64) -> Result<Vec<CveRecord>, Error> {
        let records = cve::Entity::find()
            .order_by_desc(cve::Column::Published)
            // deterministic order for records published at the same instant
            .order_by_asc(cve::Column::Id)
            .limit(limit)
            .all(&*self.db)
            .await?;

        Ok(records.into_iter().map(CveRecord::from).collect())
    }

    /// Reconcile a batch of normalized records into the cache.
    ///
    /// Insert/update classification is per distinct id against the state
    /// before this call; when a batch repeats an id, the last record wins
    /// and the id counts once. Every column of an existing row is
    /// overwritten, nothing is merged.
    #[instrument(skip_all, fields(count = records.len()))]
    pub async fn upsert(&self, records: Vec<cve::Model>) -> Result<UpsertOutcome, Error> {
        if records.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        let ids = records.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        let existing = cve::Entity::find()
            .select_only()
            .column(cve::Column::Id)
            .filter(cve::Column::Id.is_in(ids))
            .into_tuple::<String>()
            .all(&*self.db)
            .await?
            .into_iter()
            .collect::<HashSet<_>>();

        let mut unique = HashMap::new();
        for record in records {
            unique.insert(record.id.clone(), record);
        }

        let inserted = unique
            .keys()
            .filter(|id| !existing.contains(*id))
            .count() as u64;
        let updated = unique.len() as u64 - inserted;

        let models = unique.into_values().map(|model| cve::ActiveModel {
            id: Set(model.id),
            score: Set(model.score),
            severity: Set(model.severity),
            published: Set(model.published),
            description: Set(model.description),
            metrics: Set(model.metrics),
        });

        cve::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(cve::Column::Id)
                    .update_columns([
                        cve::Column::Score,
                        cve::Column::Severity,
                        cve::Column::Published,
                        cve::Column::Description,
                        cve::Column::Metrics,
                    ])
                    .to_owned(),
            )
            .exec(&*self.db)
            .await?;

        log::debug!("upsert: {inserted} inserted, {updated} updated");

        Ok(UpsertOutcome { inserted, updated })
    }

    /// Normalization applied to every record before it reaches storage:
    /// clamp the score, scale for fixed-point storage, derive the severity
    /// label, substitute the placeholder description.
    pub fn normalize(item: FetchedCve) -> cve::Model {
        let score = item.score.clamp(0.0, 10.0);

        let description = if item.description.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            item.description
        };

        cve::Model {
            id: item.cve_id,
            score: (score * 10.0).round() as i32,
            severity: Severity::from_f64(score).to_string(),
            published: item.published,
            description,
            metrics: serde_json::Value::Object(item.metrics),
        }
    }

    /// Read path. With `Source::Nvd` the fetched records are persisted
    /// first and the answer still comes from the cache, so ordering is
    /// consistent regardless of source.
    #[instrument(skip(self), err)]
    pub async fn serve_latest(
        &self,
        limit: Option<i64>,
        source: Source,
    ) -> Result<Vec<CveRecord>, Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_RESULTS);

        if source == Source::Nvd {
            let fetched = self.client.fetch_recent(limit).await?;
            self.upsert(fetched.into_iter().map(Self::normalize).collect())
                .await?;
        }

        self.get_latest(limit as u64).await
    }

    /// Write path: always fetch live, reconcile, report counts.
    #[instrument(skip(self), err)]
    pub async fn refresh(&self, limit: Option<i64>) -> Result<RefreshSummary, Error> {
        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(limit) if (1..=MAX_RESULTS).contains(&limit) => limit,
            Some(_) => {
                return Err(Error::Validation {
                    message: format!("limit must be between 1 and {MAX_RESULTS}"),
                    field: Some("limit".into()),
                });
            }
        };

        let fetched = self.client.fetch_recent(limit).await?;
        let outcome = self
            .upsert(fetched.into_iter().map(Self::normalize).collect())
            .await?;

        Ok(RefreshSummary {
            inserted: outcome.inserted,
            updated: outcome.updated,
            total: outcome.inserted + outcome.updated,
        })
    }

    /// Populate an empty cache once at startup. Best effort: an unreachable
    /// upstream leaves the feed empty rather than failing the boot.
    pub async fn seed_if_empty(&self) {
        match self.try_seed().await {
            Ok(true) => log::info!("seeded the threat feed cache"),
            Ok(false) => log::debug!("cache already populated, skipping seed"),
            Err(err) => log::warn!("threat feed seeding skipped: {err}"),
        }
    }

    async fn try_seed(&self) -> Result<bool, Error> {
        if !self.get_latest(1).await?.is_empty() {
            return Ok(false);
        }

        let fetched = self.client.fetch_recent(DEFAULT_LIMIT).await?;
        self.upsert(fetched.into_iter().map(Self::normalize).collect())
            .await?;

        Ok(true)
    }
}
