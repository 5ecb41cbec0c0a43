//! HTTP surface: routing, request/response DTOs and status mapping. All
//! business rules live in the service layer.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::Actor;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::product::Product;
use crate::error::{AppError, Result};
use crate::service::cart::CartLine;
use crate::service::catalog::ProductInput;
use crate::service::orders::{OrderFilter, PlaceOrder};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route(
            "/api/v1/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route(
            "/api/v1/cart",
            get(get_cart).post(add_to_cart).delete(clear_cart),
        )
        .route(
            "/api/v1/cart/:product_id",
            patch(update_cart_item).delete(remove_cart_item),
        )
        .route("/api/v1/orders", get(list_orders).post(place_order))
        .route("/api/v1/orders/:id", get(get_order).delete(delete_order))
        .route("/api/v1/orders/:id/status", patch(update_order_status))
        .route("/api/v1/orders/:id/invoice", get(download_invoice))
        .route("/api/v1/orders/history/:user_id", get(order_history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy", "service": "kanso-commerce"}))
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub dept: Option<String>,
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<PaginatedResponse<Product>>> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).min(100);
    let (data, total) = state
        .catalog
        .list(page, per_page, params.dept.as_deref())
        .await?;
    Ok(Json(PaginatedResponse { data, total, page }))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog.get(id).await?))
}

async fn create_product(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.catalog.create(input, &actor).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog.update(id, input, &actor).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.catalog.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_cart(State(state): State<AppState>, actor: Actor) -> Result<Json<Vec<CartLine>>> {
    Ok(Json(state.cart.list(&actor).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

async fn add_to_cart(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<AddToCartRequest>,
) -> Result<StatusCode> {
    state
        .cart
        .add(request.product_id, request.quantity, &actor)
        .await?;
    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

async fn update_cart_item(
    State(state): State<AppState>,
    actor: Actor,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateCartRequest>,
) -> Result<StatusCode> {
    state
        .cart
        .set_quantity(product_id, request.quantity, &actor)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_cart_item(
    State(state): State<AppState>,
    actor: Actor,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.cart.remove(product_id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_cart(State(state): State<AppState>, actor: Actor) -> Result<StatusCode> {
    state.cart.clear(&actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
}

async fn list_orders(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<OrderListParams>,
) -> Result<Json<PaginatedResponse<Order>>> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).min(100);
    let status = params
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    let filter = OrderFilter {
        name_search: params.search.as_deref(),
        status,
    };
    let (data, total) = state.orders.list_orders(page, per_page, filter, &actor).await?;
    Ok(Json(PaginatedResponse { data, total, page }))
}

#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub order_id: Uuid,
}

async fn place_order(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<OrderPlaced>)> {
    let order = state.orders.place_order(request, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderPlaced {
            order_id: order.id(),
        }),
    ))
}

async fn get_order(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>> {
    Ok(Json(state.orders.get_order(id, &actor).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

async fn update_order_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let order = state
        .orders
        .update_status(id, &request.status, &actor)
        .await?;
    Ok(Json(order))
}

async fn delete_order(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.orders.delete_order(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn order_history(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.orders.history_for_user(user_id, &actor).await?))
}

async fn download_invoice(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let download = state.orders.invoice(id, &actor).await?;
    let disposition = format!("attachment; filename=\"{}\"", download.file_name);
    let disposition =
        HeaderValue::from_str(&disposition).map_err(|e| AppError::Pdf(e.to_string()))?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/pdf"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    ))
}
