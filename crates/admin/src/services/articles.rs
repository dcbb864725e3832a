//! Article catalog and bulk repricing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use lorry_desk_core::filter::{ArticleFilter, filter_articles};
use lorry_desk_core::models::{Article, CreateArticleInput, CustomerRate, UpdateArticleInput};
use lorry_desk_core::pricing::{
    BulkPreviewSummary, RateAdjustment, RatePreview, preview_bulk_adjustment, summarize_preview,
};
use lorry_desk_core::sort::{ArticleSortField, SortField, SortState, sort_records};
use lorry_desk_core::{ArticleId, BranchId, QueryContext};

use super::notify::Notifier;
use crate::db::{DataStore, RepositoryError, Scope};
use crate::error::AppError;
use crate::import_export::parse_articles;

/// Projected effect of a bulk adjustment.
#[derive(Debug, Clone, Serialize)]
pub struct BulkPreview {
    pub adjustment: RateAdjustment,
    pub summary: BulkPreviewSummary,
    pub articles: Vec<RatePreview>,
}

/// Outcome of an applied bulk adjustment.
#[derive(Debug, Clone, Serialize)]
pub struct BulkApplied {
    pub updated: usize,
    pub summary: BulkPreviewSummary,
}

/// Article operations for one organization.
pub struct ArticleService {
    store: Arc<dyn DataStore>,
    notifier: Arc<dyn Notifier>,
}

impl ArticleService {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// # Errors
    ///
    /// Returns error if the store rejects the read.
    pub async fn list(
        &self,
        ctx: &QueryContext,
        filter: &ArticleFilter,
        sort: SortState<ArticleSortField>,
    ) -> Result<Vec<Article>, AppError> {
        let articles = self.store.list_articles(&Scope::from(ctx)).await?;
        Ok(sort_records(&filter_articles(&articles, filter), sort))
    }

    /// # Errors
    ///
    /// Returns `AppError::Validation` for invalid input.
    #[instrument(skip(self, ctx, input), fields(name = %input.name))]
    pub async fn create(
        &self,
        ctx: &QueryContext,
        input: CreateArticleInput,
    ) -> Result<Article, AppError> {
        input.validate()?;
        let article = input.into_article(new_id(), ctx.now);
        let article = self
            .store
            .create_article(&ctx.organization_id, article)
            .await?;
        self.notifier
            .success("Article created", &format!("{} added to the catalog", article.name));
        Ok(article)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown ID and
    /// `AppError::Validation` for invalid edits.
    #[instrument(skip(self, ctx, id, input), fields(article_id = %id))]
    pub async fn update(
        &self,
        ctx: &QueryContext,
        id: &ArticleId,
        input: UpdateArticleInput,
    ) -> Result<Article, AppError> {
        let mut article = self.get(ctx, id).await?;
        input.apply(&mut article)?;
        let article = self
            .store
            .update_article(&ctx.organization_id, article)
            .await?;
        self.notifier
            .success("Article updated", &format!("{} has been updated", article.name));
        Ok(article)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown ID.
    pub async fn get(&self, ctx: &QueryContext, id: &ArticleId) -> Result<Article, AppError> {
        self.store
            .get_article(&ctx.organization_id, id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AppError::NotFound(format!("article {id}")),
                other => other.into(),
            })
    }

    /// Negotiated rates for an article.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown article.
    pub async fn customer_rates(
        &self,
        ctx: &QueryContext,
        id: &ArticleId,
    ) -> Result<Vec<CustomerRate>, AppError> {
        self.get(ctx, id).await?;
        Ok(self
            .store
            .get_customer_rates(&ctx.organization_id, id)
            .await?)
    }

    /// Project an adjustment over the filtered catalog without saving it.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the read.
    pub async fn preview_bulk(
        &self,
        ctx: &QueryContext,
        filter: &ArticleFilter,
        adjustment: RateAdjustment,
    ) -> Result<BulkPreview, AppError> {
        let articles = self.list(ctx, filter, by_name()).await?;
        let previews = preview_bulk_adjustment(&articles, adjustment);
        Ok(BulkPreview {
            adjustment,
            summary: summarize_preview(&previews, adjustment),
            articles: previews,
        })
    }

    /// Apply an adjustment to every article the filter selects. Either all
    /// selected articles are repriced or none are. The filter only picks
    /// the articles; each new rate is computed from the rate stored at the
    /// moment of writing.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the update; no rate changes then.
    #[instrument(skip(self, ctx, filter))]
    pub async fn apply_bulk(
        &self,
        ctx: &QueryContext,
        filter: &ArticleFilter,
        adjustment: RateAdjustment,
    ) -> Result<BulkApplied, AppError> {
        let ids: Vec<ArticleId> = self
            .list(ctx, filter, by_name())
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();

        let result = self
            .store
            .reprice_articles(&ctx.organization_id, &ids, adjustment)
            .await;
        match result {
            Ok(changes) => {
                let updated = changes.len();
                info!(updated, "Bulk rate adjustment applied");
                self.notifier.success(
                    "Rates updated",
                    &format!("{updated} article rate(s) adjusted"),
                );
                Ok(BulkApplied {
                    updated,
                    summary: summarize_preview(&changes, adjustment),
                })
            }
            Err(e) => {
                self.notifier.error("Rate update failed", &e.to_string());
                Err(e.into())
            }
        }
    }

    /// Import a CSV into `branch_id`'s catalog. Nothing is created if any
    /// row is invalid.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Import` with per-line problems.
    #[instrument(skip(self, ctx, body), fields(branch = %branch_id, bytes = body.len()))]
    pub async fn import_csv(
        &self,
        ctx: &QueryContext,
        branch_id: &BranchId,
        body: &[u8],
    ) -> Result<Vec<Article>, AppError> {
        let inputs = parse_articles(body, branch_id)?;
        let articles = into_articles(inputs, ctx.now);
        let count = self
            .store
            .create_articles(&ctx.organization_id, articles.clone())
            .await?;
        info!(count, "Articles imported");
        self.notifier
            .success("Import complete", &format!("{count} article(s) imported"));
        Ok(articles)
    }
}

fn by_name() -> SortState<ArticleSortField> {
    SortState::new(
        ArticleSortField::Name,
        ArticleSortField::Name.default_direction(),
    )
}

fn new_id() -> ArticleId {
    ArticleId::new(Uuid::new_v4().to_string())
}

fn into_articles(inputs: Vec<CreateArticleInput>, at: DateTime<Utc>) -> Vec<Article> {
    inputs
        .into_iter()
        .map(|input| input.into_article(new_id(), at))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::db::MemoryStore;
    use crate::fixtures;
    use crate::services::notify::tests::RecordingNotifier;

    fn service() -> (ArticleService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::from_seed(fixtures::seed()).unwrap());
        let service = ArticleService::new(store.clone(), Arc::new(RecordingNotifier::default()));
        (service, store)
    }

    fn ctx() -> QueryContext {
        QueryContext::new(fixtures::org(), fixtures::at())
    }

    fn input(name: &str, rate: rust_decimal::Decimal) -> CreateArticleInput {
        CreateArticleInput {
            name: name.to_owned(),
            description: None,
            base_rate: rate,
            branch_id: BranchId::new("br-mum"),
            hsn_code: None,
            tax_rate: None,
            unit_of_measure: None,
            min_quantity: None,
            is_fragile: false,
            requires_special_handling: false,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_update() {
        let (service, _) = service();
        let article = service.create(&ctx(), input(" Drums ", dec!(80))).await.unwrap();
        assert_eq!(article.name, "Drums");

        let updated = service
            .update(
                &ctx(),
                &article.id,
                UpdateArticleInput {
                    base_rate: Some(dec!(85)),
                    ..UpdateArticleInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.base_rate, dec!(85));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_rate() {
        let (service, _) = service();
        let err = service.create(&ctx(), input("Drums", dec!(-1))).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "base_rate"));
    }

    #[tokio::test]
    async fn test_bulk_preview_does_not_save() {
        let (service, _) = service();
        service.create(&ctx(), input("Drums", dec!(80))).await.unwrap();

        let preview = service
            .preview_bulk(&ctx(), &ArticleFilter::default(), RateAdjustment::fixed(dec!(-60)))
            .await
            .unwrap();
        assert_eq!(preview.summary.articles, 2);
        assert_eq!(preview.summary.floored_at_zero, 1);

        let rates: Vec<_> = service
            .list(&ctx(), &ArticleFilter::default(), by_name())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.base_rate)
            .collect();
        assert_eq!(rates, vec![dec!(50), dec!(80)]);
    }

    #[tokio::test]
    async fn test_bulk_apply_reprices_selection() {
        let (service, _) = service();
        service.create(&ctx(), input("Drums", dec!(80))).await.unwrap();
        let filter = ArticleFilter {
            search: Some("drum".to_owned()),
            branch: None,
        };

        let applied = service
            .apply_bulk(&ctx(), &filter, RateAdjustment::percentage(dec!(10)))
            .await
            .unwrap();
        assert_eq!(applied.updated, 1);
        assert_eq!(applied.summary.increased, 1);

        let rates: Vec<_> = service
            .list(&ctx(), &ArticleFilter::default(), by_name())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.base_rate)
            .collect();
        assert_eq!(rates, vec![dec!(50), dec!(88)]);
    }

    #[tokio::test]
    async fn test_import_is_all_or_nothing() {
        let (service, _) = service();
        let branch = BranchId::new("br-pun");
        let bad = "name,base_rate\nSacks,20\nBales,oops\n";
        let err = service.import_csv(&ctx(), &branch, bad.as_bytes()).await.unwrap_err();
        assert!(matches!(err, AppError::Import(_)));
        assert_eq!(
            service.list(&ctx(), &ArticleFilter::default(), by_name()).await.unwrap().len(),
            1
        );

        let good = "name,base_rate\nSacks,20\nBales,35\n";
        let imported = service.import_csv(&ctx(), &branch, good.as_bytes()).await.unwrap();
        assert_eq!(imported.len(), 2);
        assert!(imported.iter().all(|a| a.branch_id == branch));
    }

    #[tokio::test]
    async fn test_customer_rates_for_known_and_unknown_articles() {
        let (service, _) = service();
        let rates = service
            .customer_rates(&ctx(), &ArticleId::new("art-cartons"))
            .await
            .unwrap();
        assert_eq!(rates.len(), 1);
        let err = service
            .customer_rates(&ctx(), &ArticleId::new("art-none"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
