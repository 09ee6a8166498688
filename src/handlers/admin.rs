use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, Service, Settings};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/overview
#[derive(Serialize)]
pub struct OverviewResponse {
    total_bookings: i64,
    paid_bookings: i64,
    pending_bookings: i64,
    services_count: i64,
    deposit_revenue: i64,
}

pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<OverviewResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let (stats, settings) = {
        let db = state.db.lock().unwrap();
        (queries::get_overview_stats(&db)?, queries::get_settings(&db)?)
    };

    Ok(Json(OverviewResponse {
        total_bookings: stats.total_bookings,
        paid_bookings: stats.paid_bookings,
        pending_bookings: stats.pending_bookings,
        services_count: stats.services_count,
        deposit_revenue: stats.paid_bookings * settings.dp_amount,
    }))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_all_bookings(&db, query.status.as_deref(), limit)?
    };

    Ok(Json(bookings))
}

// DELETE /api/admin/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let removed = {
        let db = state.db.lock().unwrap();
        queries::delete_booking(&db, &id)?
    };

    if removed {
        tracing::info!(booking_id = %id, "booking deleted by admin");
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("booking {id}")))
    }
}

// GET /api/admin/services
pub async fn get_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Service>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db)?
    };
    Ok(Json(services))
}

// POST /api/admin/services
#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub price: i64,
    pub duration_minutes: Option<i32>,
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateServiceRequest>,
) -> Result<Json<Service>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("service name is required".to_string()));
    }
    if body.price < 0 {
        return Err(AppError::Validation("price must not be negative".to_string()));
    }

    let service = Service {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        price: body.price,
        duration_minutes: body.duration_minutes,
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_service(&db, &service)?;
    }

    Ok(Json(service))
}

// PUT /api/admin/services/:id
#[derive(Deserialize)]
pub struct UpdateServiceRequest {
    pub name: String,
    pub price: i64,
    pub duration_minutes: Option<i32>,
}

pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateServiceRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("service name is required".to_string()));
    }
    if body.price < 0 {
        return Err(AppError::Validation("price must not be negative".to_string()));
    }

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_service(&db, &id, name, body.price, body.duration_minutes)?
    };

    if updated {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("service {id}")))
    }
}

// DELETE /api/admin/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let removed = {
        let db = state.db.lock().unwrap();
        queries::delete_service(&db, &id)?
    };

    if removed {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("service {id}")))
    }
}

// GET /api/admin/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Settings>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let settings = {
        let db = state.db.lock().unwrap();
        queries::get_settings(&db)?
    };
    Ok(Json(settings))
}

// POST /api/admin/settings
#[derive(Deserialize)]
pub struct UpdateSettingsRequest {
    pub business_name: Option<String>,
    pub admin_contact: Option<String>,
    pub primary_color: Option<String>,
    pub dp_amount: Option<i64>,
    pub require_deposit: Option<bool>,
    pub logo_url: Option<String>,
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<Settings>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if matches!(body.dp_amount, Some(amount) if amount < 0) {
        return Err(AppError::Validation(
            "deposit amount must not be negative".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    let mut settings = queries::get_settings(&db)?;

    if let Some(name) = body.business_name {
        settings.business_name = name;
    }
    if let Some(contact) = body.admin_contact {
        settings.admin_contact = contact;
    }
    if let Some(color) = body.primary_color {
        settings.primary_color = color;
    }
    if let Some(amount) = body.dp_amount {
        settings.dp_amount = amount;
    }
    if let Some(required) = body.require_deposit {
        settings.require_deposit = required;
    }
    if let Some(logo) = body.logo_url {
        settings.logo_url = Some(logo);
    }

    queries::save_settings(&db, &settings)?;

    Ok(Json(settings))
}
