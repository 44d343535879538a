use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceInvoice {
    pub id: Uuid,
    pub company_id: String,
    pub description: String,
    pub total: f64,
}

#[derive(Deserialize)]
pub struct IssueServiceInvoice {
    pub description: Option<String>,
    pub total: Option<f64>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, ServiceInvoice>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route(
            "/v1/companies/{company_id}/serviceinvoices",
            get(list_invoices).post(issue_invoice),
        )
        .route(
            "/v1/companies/{company_id}/serviceinvoices/{id}",
            get(get_invoice).delete(cancel_invoice),
        )
        .route("/v1/companies/{company_id}/serviceinvoices/{id}/pdf", get(invoice_pdf))
        .route("/v1/companies/{company_id}/serviceinvoices/{id}/xml", get(invoice_xml))
        .route("/v1/echo", post(echo))
        .route("/v1/failure", get(failure))
        .route("/v1/failure/empty", get(failure_empty))
        .layer(middleware::from_fn(require_api_key))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn require_api_key(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .is_some_and(|value| !value.is_empty());
    if !authorized {
        return message(StatusCode::UNAUTHORIZED, "missing api key");
    }
    next.run(request).await
}

async fn list_invoices(
    State(db): State<Db>,
    Path(company_id): Path<String>,
) -> Json<Vec<ServiceInvoice>> {
    let invoices = db.read().await;
    Json(
        invoices
            .values()
            .filter(|invoice| invoice.company_id == company_id)
            .cloned()
            .collect(),
    )
}

async fn issue_invoice(
    State(db): State<Db>,
    Path(company_id): Path<String>,
    Json(input): Json<IssueServiceInvoice>,
) -> Response {
    let mut errors = Vec::new();
    if input.description.as_deref().map_or(true, str::is_empty) {
        errors.push(json!({ "code": "description", "message": "description is required" }));
    }
    match input.total {
        Some(total) if total > 0.0 => {}
        _ => errors.push(json!({ "code": "total", "message": "total must be positive" })),
    }
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response();
    }

    let invoice = ServiceInvoice {
        id: Uuid::new_v4(),
        company_id,
        description: input.description.unwrap_or_default(),
        total: input.total.unwrap_or_default(),
    };
    db.write().await.insert(invoice.id, invoice.clone());
    (StatusCode::ACCEPTED, Json(invoice)).into_response()
}

async fn find_invoice(db: &Db, company_id: &str, id: Uuid) -> Result<ServiceInvoice, Response> {
    db.read()
        .await
        .get(&id)
        .filter(|invoice| invoice.company_id == company_id)
        .cloned()
        .ok_or_else(|| message(StatusCode::NOT_FOUND, "service invoice not found"))
}

async fn get_invoice(
    State(db): State<Db>,
    Path((company_id, id)): Path<(String, Uuid)>,
) -> Result<Json<ServiceInvoice>, Response> {
    find_invoice(&db, &company_id, id).await.map(Json)
}

async fn cancel_invoice(
    State(db): State<Db>,
    Path((company_id, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, Response> {
    find_invoice(&db, &company_id, id).await?;
    db.write().await.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

pub fn render_pdf(invoice: &ServiceInvoice) -> Vec<u8> {
    format!(
        "%PDF-1.4\n% service invoice {}\n1 0 obj\n<< /Total {} >>\nendobj\n%%EOF\n",
        invoice.id, invoice.total
    )
    .into_bytes()
}

pub fn render_xml(invoice: &ServiceInvoice) -> String {
    format!(
        "<Nfse><Id>{}</Id><Discriminacao>{}</Discriminacao><ValorServicos>{}</ValorServicos></Nfse>",
        invoice.id, invoice.description, invoice.total
    )
}

async fn invoice_pdf(
    State(db): State<Db>,
    Path((company_id, id)): Path<(String, Uuid)>,
) -> Result<Response, Response> {
    let invoice = find_invoice(&db, &company_id, id).await?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], render_pdf(&invoice)).into_response())
}

async fn invoice_xml(
    State(db): State<Db>,
    Path((company_id, id)): Path<(String, Uuid)>,
) -> Result<Response, Response> {
    let invoice = find_invoice(&db, &company_id, id).await?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], render_xml(&invoice)).into_response())
}

async fn echo(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn failure() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal failure")
}

async fn failure_empty() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}
