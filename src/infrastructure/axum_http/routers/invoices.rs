use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    application::{interfaces::page_cache::PageCache, usecases::invoices::InvoiceUseCase},
    domain::{
        repositories::invoices::InvoiceRepository,
        value_objects::{
            action_state::{ActionOutcome, ActionState},
            invoice_form::InvoiceForm,
        },
    },
    infrastructure::{
        axum_http::error_responses::AppError,
        cache::in_memory_page_cache::InMemoryPageCache,
        postgres::{postgres_connection::PgPoolSquad, repositories::invoices::InvoicePostgres},
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, page_cache: Arc<InMemoryPageCache>) -> Router {
    let invoice_repository = InvoicePostgres::new(Arc::clone(&db_pool));
    let invoice_usecase = InvoiceUseCase::new(Arc::new(invoice_repository), page_cache);

    router(Arc::new(invoice_usecase))
}

pub fn router<R, C>(invoice_usecase: Arc<InvoiceUseCase<R, C>>) -> Router
where
    R: InvoiceRepository + Send + Sync + 'static,
    C: PageCache + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/:id", get(find_invoice).post(update_invoice))
        .route("/:id/delete", post(delete_invoice))
        .with_state(invoice_usecase)
}

pub async fn list_invoices<R, C>(
    State(invoice_usecase): State<Arc<InvoiceUseCase<R, C>>>,
) -> Result<Response, AppError>
where
    R: InvoiceRepository + Send + Sync + 'static,
    C: PageCache + Send + Sync + 'static,
{
    let rendered = invoice_usecase.render_listing().await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        rendered,
    )
        .into_response())
}

pub async fn find_invoice<R, C>(
    State(invoice_usecase): State<Arc<InvoiceUseCase<R, C>>>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Response, AppError>
where
    R: InvoiceRepository + Send + Sync + 'static,
    C: PageCache + Send + Sync + 'static,
{
    match invoice_usecase.find_invoice(invoice_id).await? {
        Some(invoice) => Ok((StatusCode::OK, Json(invoice)).into_response()),
        None => {
            info!(%invoice_id, "invoices: requested invoice not found");
            Err(AppError::NotFound)
        }
    }
}

pub async fn create_invoice<R, C>(
    State(invoice_usecase): State<Arc<InvoiceUseCase<R, C>>>,
    Form(form): Form<InvoiceForm>,
) -> Result<Response, AppError>
where
    R: InvoiceRepository + Send + Sync + 'static,
    C: PageCache + Send + Sync + 'static,
{
    let outcome = invoice_usecase
        .create_invoice(&ActionState::initial(), form)
        .await?;
    Ok(outcome_response(outcome))
}

pub async fn update_invoice<R, C>(
    State(invoice_usecase): State<Arc<InvoiceUseCase<R, C>>>,
    Path(invoice_id): Path<Uuid>,
    Form(form): Form<InvoiceForm>,
) -> Result<Response, AppError>
where
    R: InvoiceRepository + Send + Sync + 'static,
    C: PageCache + Send + Sync + 'static,
{
    let outcome = invoice_usecase
        .update_invoice(invoice_id, &ActionState::initial(), form)
        .await?;
    Ok(outcome_response(outcome))
}

pub async fn delete_invoice<R, C>(
    State(invoice_usecase): State<Arc<InvoiceUseCase<R, C>>>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Response, AppError>
where
    R: InvoiceRepository + Send + Sync + 'static,
    C: PageCache + Send + Sync + 'static,
{
    let outcome = invoice_usecase.delete_invoice(invoice_id).await?;
    Ok(outcome_response(outcome))
}

fn outcome_response(outcome: ActionOutcome) -> Response {
    match outcome {
        ActionOutcome::Redirect(location) => Redirect::to(&location).into_response(),
        ActionOutcome::Completed(state) => (StatusCode::OK, Json(state)).into_response(),
        ActionOutcome::ValidationFailed(state) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(state)).into_response()
        }
        ActionOutcome::PersistenceFailed(state) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(state)).into_response()
        }
    }
}
