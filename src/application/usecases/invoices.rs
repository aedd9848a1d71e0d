use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    application::interfaces::page_cache::PageCache,
    domain::{
        repositories::invoices::InvoiceRepository,
        value_objects::{
            action_state::{ActionOutcome, ActionState},
            invoice_form::{InvoiceForm, ValidationFailure},
            invoices::{INVOICES_PATH, InvoiceListingModel, InvoiceModel},
        },
    },
};

pub const CREATE_MISSING_FIELDS: &str = "Missing Fields. Failed to Create Invoice.";
pub const CREATE_DATABASE_ERROR: &str = "Database Error: Failed to Create Invoice.";
pub const UPDATE_MISSING_FIELDS: &str = "Missing Fields. Failed to Update Invoice.";
pub const UPDATE_DATABASE_ERROR: &str = "Database Error: Failed to Update Invoice.";
pub const DELETE_DATABASE_ERROR: &str = "Database Error: Failed to Delete Invoice.";
pub const DELETED_INVOICE: &str = "Deleted Invoice.";

/// Form-driven invoice writes plus the reads that back the dashboard pages.
///
/// Each write runs validate, persist, revalidate, redirect in that order. Validation and
/// persistence failures come back as an [`ActionOutcome`] for the form to show; an `Err`
/// means something outside that contract broke (e.g. the cache could not be revalidated)
/// and is left for the caller's error boundary.
pub struct InvoiceUseCase<R, C>
where
    R: InvoiceRepository + Send + Sync,
    C: PageCache + Send + Sync,
{
    invoice_repository: Arc<R>,
    page_cache: Arc<C>,
}

impl<R, C> InvoiceUseCase<R, C>
where
    R: InvoiceRepository + Send + Sync,
    C: PageCache + Send + Sync,
{
    pub fn new(invoice_repository: Arc<R>, page_cache: Arc<C>) -> Self {
        Self {
            invoice_repository,
            page_cache,
        }
    }

    /// `prev_state` is whatever the form last showed. Nothing is carried over from it;
    /// it only tells the logs whether this is a resubmission.
    pub async fn create_invoice(
        &self,
        prev_state: &ActionState,
        form: InvoiceForm,
    ) -> Result<ActionOutcome> {
        debug!(
            resubmission = prev_state.has_errors(),
            "invoices: create requested"
        );

        let validated = match form.validate() {
            Ok(validated) => validated,
            Err(failure) => return Ok(rejected(failure, CREATE_MISSING_FIELDS, "create")),
        };

        let date = Utc::now().date_naive();
        let insert_invoice_entity = validated.to_insert_entity(date);

        let invoice_id = match self
            .invoice_repository
            .create_invoice(insert_invoice_entity)
            .await
        {
            Ok(invoice_id) => invoice_id,
            Err(err) => {
                error!(
                    customer_id = %validated.customer_id,
                    db_error = ?err,
                    "invoices: failed to insert invoice"
                );
                return Ok(ActionOutcome::PersistenceFailed(ActionState::with_message(
                    CREATE_DATABASE_ERROR,
                )));
            }
        };

        info!(
            %invoice_id,
            customer_id = %validated.customer_id,
            amount_minor = validated.amount_minor,
            status = %validated.status,
            %date,
            "invoices: invoice created"
        );

        self.revalidate_listing().await?;
        Ok(ActionOutcome::Redirect(INVOICES_PATH.to_string()))
    }

    /// Same contract as [`Self::create_invoice`] for an existing invoice; `id` and `date`
    /// are never written.
    pub async fn update_invoice(
        &self,
        invoice_id: Uuid,
        prev_state: &ActionState,
        form: InvoiceForm,
    ) -> Result<ActionOutcome> {
        debug!(
            %invoice_id,
            resubmission = prev_state.has_errors(),
            "invoices: update requested"
        );

        let validated = match form.validate() {
            Ok(validated) => validated,
            Err(failure) => return Ok(rejected(failure, UPDATE_MISSING_FIELDS, "update")),
        };

        let matched = match self
            .invoice_repository
            .update_invoice(invoice_id, validated.to_edit_entity())
            .await
        {
            Ok(matched) => matched,
            Err(err) => {
                error!(
                    %invoice_id,
                    db_error = ?err,
                    "invoices: failed to update invoice"
                );
                return Ok(ActionOutcome::PersistenceFailed(ActionState::with_message(
                    UPDATE_DATABASE_ERROR,
                )));
            }
        };

        if matched == 0 {
            warn!(%invoice_id, "invoices: update matched no invoice");
        } else {
            info!(
                %invoice_id,
                amount_minor = validated.amount_minor,
                status = %validated.status,
                "invoices: invoice updated"
            );
        }

        self.revalidate_listing().await?;
        Ok(ActionOutcome::Redirect(INVOICES_PATH.to_string()))
    }

    pub async fn delete_invoice(&self, invoice_id: Uuid) -> Result<ActionOutcome> {
        debug!(%invoice_id, "invoices: delete requested");

        match self.invoice_repository.delete_invoice(invoice_id).await {
            Ok(0) => warn!(%invoice_id, "invoices: delete matched no invoice"),
            Ok(_) => info!(%invoice_id, "invoices: invoice deleted"),
            Err(err) => {
                error!(
                    %invoice_id,
                    db_error = ?err,
                    "invoices: failed to delete invoice"
                );
                return Ok(ActionOutcome::PersistenceFailed(ActionState::with_message(
                    DELETE_DATABASE_ERROR,
                )));
            }
        }

        self.revalidate_listing().await?;
        Ok(ActionOutcome::Completed(ActionState::with_message(
            DELETED_INVOICE,
        )))
    }

    pub async fn find_invoice(&self, invoice_id: Uuid) -> Result<Option<InvoiceModel>> {
        self.invoice_repository
            .find_invoice(invoice_id)
            .await?
            .map(InvoiceModel::try_from)
            .transpose()
    }

    /// The listing page as JSON, served from the page cache until it is revalidated.
    /// A rendering that raced with a write is returned but not cached.
    pub async fn render_listing(&self) -> Result<Vec<u8>> {
        let lookup = self.page_cache.get(INVOICES_PATH).await;
        if let Some(rendered) = lookup.rendered {
            debug!(bytes = rendered.len(), "invoices: listing served from cache");
            return Ok(rendered);
        }

        let rows = self.invoice_repository.list_invoices().await.map_err(|err| {
            error!(db_error = ?err, "invoices: failed to list invoices");
            err
        })?;
        let invoices = rows
            .into_iter()
            .map(InvoiceListingModel::try_from)
            .collect::<Result<Vec<_>>>()?;

        let rendered = serde_json::to_vec(&invoices)?;
        let cached = self
            .page_cache
            .store(INVOICES_PATH, lookup.generation, rendered.clone())
            .await;
        if !cached {
            debug!("invoices: listing revalidated during render, not cached");
        }
        info!(invoice_count = invoices.len(), cached, "invoices: listing rendered");

        Ok(rendered)
    }

    async fn revalidate_listing(&self) -> Result<()> {
        self.page_cache
            .revalidate_path(INVOICES_PATH)
            .await
            .with_context(|| format!("failed to revalidate {}", INVOICES_PATH))
    }
}

fn rejected(failure: ValidationFailure, message: &str, operation: &str) -> ActionOutcome {
    let errors = failure.field_errors();
    warn!(
        operation,
        fields = ?errors.keys().collect::<Vec<_>>(),
        "invoices: form rejected by validation"
    );
    ActionOutcome::ValidationFailed(ActionState::with_errors(errors, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::interfaces::page_cache::{MockPageCache, PageLookup},
        domain::{
            entities::invoices::{
                EditInvoiceEntity, InsertInvoiceEntity, InvoiceEntity, InvoiceListingRow,
            },
            repositories::invoices::MockInvoiceRepository,
            value_objects::invoice_form::{
                AMOUNT_FIELD, AMOUNT_GREATER_THAN_ZERO, CUSTOMER_ID_FIELD, CUSTOMER_REQUIRED,
                STATUS_FIELD,
            },
        },
    };
    use crate::infrastructure::cache::in_memory_page_cache::InMemoryPageCache;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use mockall::{Sequence, predicate::eq};

    const CUSTOMER: &str = "d6e15727-9fe1-4961-8c5b-ea44a9bd81aa";

    fn customer_id() -> Uuid {
        Uuid::parse_str(CUSTOMER).unwrap()
    }

    fn form(customer_id: &str, amount: &str, status: &str) -> InvoiceForm {
        InvoiceForm {
            customer_id: Some(customer_id.to_string()),
            amount: Some(amount.to_string()),
            status: Some(status.to_string()),
        }
    }

    fn expect_single_revalidation(page_cache: &mut MockPageCache) {
        page_cache
            .expect_revalidate_path()
            .withf(|path| path.to_string() == INVOICES_PATH)
            .times(1)
            .returning(|_| Ok(()));
    }

    fn usecase(
        repository: MockInvoiceRepository,
        page_cache: MockPageCache,
    ) -> InvoiceUseCase<MockInvoiceRepository, MockPageCache> {
        InvoiceUseCase::new(Arc::new(repository), Arc::new(page_cache))
    }

    #[tokio::test]
    async fn create_persists_minor_units_and_today_then_revalidates_and_redirects() {
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();
        let mut seq = Sequence::new();
        let today = Utc::now().date_naive();

        repository
            .expect_create_invoice()
            .withf(move |invoice| {
                invoice.customer_id == customer_id()
                    && invoice.amount == 1999
                    && invoice.status == "pending"
                    && invoice.date == today
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Uuid::new_v4()));
        page_cache
            .expect_revalidate_path()
            .withf(|path| path.to_string() == INVOICES_PATH)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let outcome = usecase(repository, page_cache)
            .create_invoice(&ActionState::initial(), form(CUSTOMER, "19.99", "pending"))
            .await
            .unwrap();

        assert_eq!(outcome, ActionOutcome::Redirect(INVOICES_PATH.to_string()));
        assert!(outcome.state().is_none());
    }

    #[tokio::test]
    async fn create_with_invalid_fields_never_touches_storage() {
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();
        repository.expect_create_invoice().never();
        page_cache.expect_revalidate_path().never();

        let outcome = usecase(repository, page_cache)
            .create_invoice(&ActionState::initial(), form(CUSTOMER, "0", "unknown"))
            .await
            .unwrap();

        let ActionOutcome::ValidationFailed(state) = outcome else {
            panic!("expected validation failure, got {outcome:?}");
        };
        let errors = state.errors.unwrap();
        assert!(!errors[AMOUNT_FIELD].is_empty());
        assert!(!errors[STATUS_FIELD].is_empty());
        assert!(!errors.contains_key(CUSTOMER_ID_FIELD));
        assert_eq!(state.message.as_deref(), Some(CREATE_MISSING_FIELDS));
    }

    #[tokio::test]
    async fn create_with_empty_customer_reports_only_the_customer() {
        let mut repository = MockInvoiceRepository::new();
        repository.expect_create_invoice().never();

        let outcome = usecase(repository, MockPageCache::new())
            .create_invoice(&ActionState::initial(), form("", "50", "pending"))
            .await
            .unwrap();

        let state = outcome.state().unwrap();
        let errors = state.errors.as_ref().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[CUSTOMER_ID_FIELD], vec![CUSTOMER_REQUIRED.to_string()]);
        assert_eq!(state.message.as_deref(), Some(CREATE_MISSING_FIELDS));
    }

    #[tokio::test]
    async fn create_database_failure_is_a_flat_message_without_revalidation() {
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();
        repository
            .expect_create_invoice()
            .times(1)
            .returning(|_| Err(anyhow!("insert or update on table \"invoices\" violates foreign key")));
        page_cache.expect_revalidate_path().never();

        let outcome = usecase(repository, page_cache)
            .create_invoice(&ActionState::initial(), form(CUSTOMER, "10", "paid"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::PersistenceFailed(ActionState::with_message(CREATE_DATABASE_ERROR))
        );
    }

    #[tokio::test]
    async fn failed_revalidation_is_propagated_after_the_insert() {
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();
        repository
            .expect_create_invoice()
            .times(1)
            .returning(|_| Ok(Uuid::new_v4()));
        page_cache
            .expect_revalidate_path()
            .times(1)
            .returning(|_| Err(anyhow!("cache offline")));

        let result = usecase(repository, page_cache)
            .create_invoice(&ActionState::initial(), form(CUSTOMER, "10", "paid"))
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains(INVOICES_PATH));
    }

    #[tokio::test]
    async fn update_writes_only_mutable_columns_for_the_given_id() {
        let invoice_id = Uuid::new_v4();
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();
        let mut seq = Sequence::new();

        repository
            .expect_update_invoice()
            .withf(move |id, invoice| {
                *id == invoice_id
                    && invoice.customer_id == customer_id()
                    && invoice.amount == 1999
                    && invoice.status == "paid"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(1));
        page_cache
            .expect_revalidate_path()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let outcome = usecase(repository, page_cache)
            .update_invoice(
                invoice_id,
                &ActionState::initial(),
                form(CUSTOMER, "19.99", "paid"),
            )
            .await
            .unwrap();

        assert_eq!(outcome, ActionOutcome::Redirect(INVOICES_PATH.to_string()));
    }

    #[tokio::test]
    async fn update_validation_failure_uses_the_update_message() {
        let mut repository = MockInvoiceRepository::new();
        repository.expect_update_invoice().never();

        let outcome = usecase(repository, MockPageCache::new())
            .update_invoice(
                Uuid::new_v4(),
                &ActionState::initial(),
                form(CUSTOMER, "-1", "paid"),
            )
            .await
            .unwrap();

        let state = outcome.state().unwrap();
        assert_eq!(
            state.errors.as_ref().unwrap()[AMOUNT_FIELD],
            vec![AMOUNT_GREATER_THAN_ZERO.to_string()]
        );
        assert_eq!(state.message.as_deref(), Some(UPDATE_MISSING_FIELDS));
    }

    #[tokio::test]
    async fn update_database_failure_is_a_flat_message() {
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();
        repository
            .expect_update_invoice()
            .returning(|_, _| Err(anyhow!("connection reset")));
        page_cache.expect_revalidate_path().never();

        let outcome = usecase(repository, page_cache)
            .update_invoice(
                Uuid::new_v4(),
                &ActionState::initial(),
                form(CUSTOMER, "3", "pending"),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::PersistenceFailed(ActionState::with_message(UPDATE_DATABASE_ERROR))
        );
    }

    #[tokio::test]
    async fn status_change_after_create_resends_the_same_minor_units() {
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();
        let invoice_id = Uuid::new_v4();

        repository
            .expect_create_invoice()
            .withf(|invoice| invoice.amount == 1999)
            .times(1)
            .returning(move |_| Ok(invoice_id));
        repository
            .expect_update_invoice()
            .withf(move |id, invoice| {
                *id == invoice_id
                    && invoice.amount == 1999
                    && invoice.customer_id == customer_id()
                    && invoice.status == "paid"
            })
            .times(1)
            .returning(|_, _| Ok(1));
        page_cache
            .expect_revalidate_path()
            .times(2)
            .returning(|_| Ok(()));

        let usecase = usecase(repository, page_cache);
        usecase
            .create_invoice(&ActionState::initial(), form(CUSTOMER, "19.99", "pending"))
            .await
            .unwrap();
        let outcome = usecase
            .update_invoice(
                invoice_id,
                &ActionState::initial(),
                form(CUSTOMER, "19.99", "paid"),
            )
            .await
            .unwrap();

        assert_eq!(outcome, ActionOutcome::Redirect(INVOICES_PATH.to_string()));
    }

    #[tokio::test]
    async fn delete_removes_the_row_and_confirms() {
        let invoice_id = Uuid::new_v4();
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();

        repository
            .expect_delete_invoice()
            .with(eq(invoice_id))
            .times(1)
            .returning(|_| Ok(1));
        expect_single_revalidation(&mut page_cache);

        let outcome = usecase(repository, page_cache)
            .delete_invoice(invoice_id)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::Completed(ActionState::with_message(DELETED_INVOICE))
        );
    }

    #[tokio::test]
    async fn deleting_twice_never_escapes_the_pipeline() {
        let invoice_id = Uuid::new_v4();
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();
        let mut seq = Sequence::new();

        repository
            .expect_delete_invoice()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(1));
        repository
            .expect_delete_invoice()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow!("row already gone")));
        expect_single_revalidation(&mut page_cache);

        let usecase = usecase(repository, page_cache);
        let first = usecase.delete_invoice(invoice_id).await.unwrap();
        let second = usecase.delete_invoice(invoice_id).await.unwrap();

        assert!(matches!(first, ActionOutcome::Completed(_)));
        assert_eq!(
            second,
            ActionOutcome::PersistenceFailed(ActionState::with_message(DELETE_DATABASE_ERROR))
        );
    }

    #[tokio::test]
    async fn listing_is_served_from_cache_when_present() {
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();
        repository.expect_list_invoices().never();
        page_cache
            .expect_get()
            .returning(|_| PageLookup {
                rendered: Some(b"[]".to_vec()),
                generation: 3,
            });

        let rendered = usecase(repository, page_cache)
            .render_listing()
            .await
            .unwrap();

        assert_eq!(rendered, b"[]".to_vec());
    }

    #[tokio::test]
    async fn listing_is_rendered_and_stored_on_a_miss() {
        let mut repository = MockInvoiceRepository::new();
        let mut page_cache = MockPageCache::new();
        let row = InvoiceListingRow {
            id: Uuid::new_v4(),
            customer_id: customer_id(),
            amount: 15795,
            status: "pending".to_string(),
            date: NaiveDate::from_ymd_opt(2022, 12, 6).unwrap(),
            customer_name: "Delba de Oliveira".to_string(),
            customer_email: "delba@oliveira.com".to_string(),
        };

        page_cache.expect_get().returning(|_| PageLookup {
            rendered: None,
            generation: 2,
        });
        repository
            .expect_list_invoices()
            .times(1)
            .returning(move || Ok(vec![row.clone()]));
        page_cache
            .expect_store()
            .withf(|path, generation, _| {
                path.to_string() == INVOICES_PATH && *generation == 2
            })
            .times(1)
            .returning(|_, _, _| true);

        let rendered = usecase(repository, page_cache)
            .render_listing()
            .await
            .unwrap();

        let listing: serde_json::Value = serde_json::from_slice(&rendered).unwrap();
        assert_eq!(listing[0]["customerName"], "Delba de Oliveira");
        assert_eq!(listing[0]["amount"], 15795);
        assert_eq!(listing[0]["status"], "pending");
        assert_eq!(listing[0]["date"], "2022-12-06");
    }

    /// Stands in for a write that commits and revalidates while the listing query runs.
    struct WriteDuringListing {
        page_cache: Arc<InMemoryPageCache>,
    }

    #[async_trait]
    impl InvoiceRepository for WriteDuringListing {
        async fn create_invoice(&self, _: InsertInvoiceEntity) -> Result<Uuid> {
            Err(anyhow!("not used"))
        }

        async fn update_invoice(&self, _: Uuid, _: EditInvoiceEntity) -> Result<usize> {
            Err(anyhow!("not used"))
        }

        async fn delete_invoice(&self, _: Uuid) -> Result<usize> {
            Err(anyhow!("not used"))
        }

        async fn find_invoice(&self, _: Uuid) -> Result<Option<InvoiceEntity>> {
            Err(anyhow!("not used"))
        }

        async fn list_invoices(&self) -> Result<Vec<InvoiceListingRow>> {
            self.page_cache.revalidate_path(INVOICES_PATH).await?;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn listing_rendered_across_a_revalidation_is_not_cached() {
        let page_cache = Arc::new(InMemoryPageCache::new());
        let repository = WriteDuringListing {
            page_cache: Arc::clone(&page_cache),
        };
        let usecase = InvoiceUseCase::new(Arc::new(repository), Arc::clone(&page_cache));

        let rendered = usecase.render_listing().await.unwrap();

        assert_eq!(rendered, b"[]".to_vec());
        let lookup = page_cache.get(INVOICES_PATH).await;
        assert_eq!(lookup.rendered, None);
        assert_eq!(lookup.generation, 1);
    }

    #[tokio::test]
    async fn find_returns_none_for_unknown_invoice() {
        let mut repository = MockInvoiceRepository::new();
        repository.expect_find_invoice().returning(|_| Ok(None));

        let found = usecase(repository, MockPageCache::new())
            .find_invoice(Uuid::new_v4())
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn find_rejects_unknown_stored_status() {
        let mut repository = MockInvoiceRepository::new();
        repository.expect_find_invoice().returning(|id| {
            Ok(Some(InvoiceEntity {
                id,
                customer_id: customer_id(),
                amount: 100,
                status: "overdue".to_string(),
                date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            }))
        });

        let result = usecase(repository, MockPageCache::new())
            .find_invoice(Uuid::new_v4())
            .await;

        assert!(result.is_err());
    }
}
