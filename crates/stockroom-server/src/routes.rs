use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State as AxumState,
    },
    response::Html,
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use stockroom_core::{HistoryEntry, HistoryKind, InventoryResult, InventoryService, Product};
use tracing::error;

use crate::{error::ApiError, state::State};

type AppState = AxumState<Arc<State>>;

// =========================================================================
// Request / response records
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SellProductRequest {
    #[serde(default)]
    pub name: String,
    /// Defaults to a single unit when omitted.
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SendToClinicRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiSuccess {
    pub success: bool,
}

impl ApiSuccess {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProductView {
    pub name: String,
    pub quantity: i64,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            quantity: product.quantity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatsResponse {
    pub total_products: i64,
    pub total_sold: i64,
    pub total_clinic: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryView {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    pub date_time: String,
}

impl From<HistoryEntry> for HistoryView {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            name: entry.name,
            quantity: entry.quantity,
            date_time: entry.timestamp,
        }
    }
}

/// Accept a quantity as a JSON integer or a numeric string. Blank strings
/// count as absent.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Run a blocking inventory call off the async runtime.
async fn run_blocking<T, F>(inventory: &InventoryService, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&InventoryService) -> InventoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    let inventory = inventory.clone();
    tokio::task::spawn_blocking(move || f(&inventory))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

// =========================================================================
// JSON API
// =========================================================================

pub async fn add_product_handler(
    AxumState(state): AppState,
    payload: Result<Json<AddProductRequest>, JsonRejection>,
) -> Result<Json<ApiSuccess>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::MalformedPayload)?;
    let quantity = request.quantity.unwrap_or(0);

    run_blocking(&state.inventory, move |inventory| {
        inventory.add_stock(&request.name, quantity)
    })
    .await?;
    Ok(ApiSuccess::ok())
}

pub async fn sell_product_handler(
    AxumState(state): AppState,
    payload: Result<Json<SellProductRequest>, JsonRejection>,
) -> Result<Json<ApiSuccess>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::MalformedPayload)?;
    let quantity = request.quantity.unwrap_or(1);

    run_blocking(&state.inventory, move |inventory| {
        inventory.sell_stock(&request.name, quantity)
    })
    .await?;
    Ok(ApiSuccess::ok())
}

pub async fn send_to_clinic_handler(
    AxumState(state): AppState,
    payload: Result<Json<SendToClinicRequest>, JsonRejection>,
) -> Result<Json<ApiSuccess>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::MalformedPayload)?;

    run_blocking(&state.inventory, move |inventory| {
        inventory.dispense_to_clinic(&request.name)
    })
    .await
    .map_err(ApiError::name_only)?;
    Ok(ApiSuccess::ok())
}

/// Never fails: lookup problems are logged and answered with an empty list.
pub async fn search_handler(
    AxumState(state): AppState,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Json<Vec<ProductView>> {
    let params = params.map(|Query(p)| p).unwrap_or_default();

    match run_blocking(&state.inventory, move |inventory| inventory.search(&params.q)).await {
        Ok(products) => Json(products.into_iter().map(ProductView::from).collect()),
        Err(e) => {
            error!(error = %e, "Product search failed");
            Json(Vec::new())
        }
    }
}

pub async fn stats_handler(
    AxumState(state): AppState,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = run_blocking(&state.inventory, |inventory| inventory.get_stats()).await?;

    Ok(Json(StatsResponse {
        total_products: stats.total_units_in_stock,
        total_sold: stats.total_sold_events,
        total_clinic: stats.total_clinic_events,
    }))
}

pub async fn sold_history_handler(AxumState(state): AppState) -> Json<Vec<HistoryView>> {
    history_json(&state, HistoryKind::Sold).await
}

pub async fn clinic_history_handler(AxumState(state): AppState) -> Json<Vec<HistoryView>> {
    history_json(&state, HistoryKind::Clinic).await
}

async fn history_json(state: &State, kind: HistoryKind) -> Json<Vec<HistoryView>> {
    match run_blocking(&state.inventory, move |inventory| inventory.list_history(kind)).await {
        Ok(entries) => Json(entries.into_iter().map(HistoryView::from).collect()),
        Err(e) => {
            error!(error = %e, ?kind, "History lookup failed");
            Json(Vec::new())
        }
    }
}

// =========================================================================
// HTML pages
// =========================================================================

pub async fn products_page(AxumState(state): AppState) -> Result<Html<String>, ApiError> {
    let (products, stats) = run_blocking(&state.inventory, |inventory| {
        Ok((inventory.list_products()?, inventory.get_stats()?))
    })
    .await?;

    state
        .views
        .products(&products, &stats)
        .map(Html)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn sold_page(AxumState(state): AppState) -> Result<Html<String>, ApiError> {
    let entries = run_blocking(&state.inventory, |inventory| {
        inventory.list_history(HistoryKind::Sold)
    })
    .await?;

    state
        .views
        .sold(&entries)
        .map(Html)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn clinic_page(AxumState(state): AppState) -> Result<Html<String>, ApiError> {
    let entries = run_blocking(&state.inventory, |inventory| {
        inventory.list_history(HistoryKind::Clinic)
    })
    .await?;

    state
        .views
        .clinic(&entries)
        .map(Html)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_accepts_number_or_string() {
        let from_int: AddProductRequest =
            serde_json::from_str(r#"{"name": "Aspirin", "quantity": 5}"#).unwrap();
        assert_eq!(from_int.quantity, Some(5));

        let from_text: AddProductRequest =
            serde_json::from_str(r#"{"name": "Aspirin", "quantity": " 12 "}"#).unwrap();
        assert_eq!(from_text.quantity, Some(12));
    }

    #[test]
    fn test_quantity_missing_or_blank() {
        let missing: SellProductRequest = serde_json::from_str(r#"{"name": "Aspirin"}"#).unwrap();
        assert_eq!(missing.quantity, None);

        let blank: SellProductRequest =
            serde_json::from_str(r#"{"name": "Aspirin", "quantity": ""}"#).unwrap();
        assert_eq!(blank.quantity, None);

        let null: SellProductRequest =
            serde_json::from_str(r#"{"name": "Aspirin", "quantity": null}"#).unwrap();
        assert_eq!(null.quantity, None);
    }

    #[test]
    fn test_quantity_rejects_words() {
        let result: Result<AddProductRequest, _> =
            serde_json::from_str(r#"{"name": "Aspirin", "quantity": "five"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_clinic_history_view_omits_quantity() {
        let view = HistoryView::from(HistoryEntry {
            name: "Gauze".into(),
            quantity: None,
            timestamp: "2025-01-01 08:00:00".into(),
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Gauze", "date_time": "2025-01-01 08:00:00"})
        );
    }
}
