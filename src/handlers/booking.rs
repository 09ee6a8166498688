use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, PaymentStatus};
use crate::services::availability;
use crate::services::payments::{PaymentOutcome, SnapTransaction};
use crate::state::AppState;

// GET /api/site
#[derive(Serialize)]
pub struct SiteResponse {
    business_name: String,
    admin_contact: String,
    primary_color: String,
    dp_amount: i64,
    require_deposit: bool,
    logo_url: Option<String>,
}

pub async fn get_site(State(state): State<Arc<AppState>>) -> Result<Json<SiteResponse>, AppError> {
    let settings = {
        let db = state.db.lock().unwrap();
        queries::get_settings(&db)?
    };

    Ok(Json(SiteResponse {
        business_name: settings.business_name,
        admin_contact: settings.admin_contact,
        primary_color: settings.primary_color,
        dp_amount: settings.dp_amount,
        require_deposit: settings.require_deposit,
        logo_url: settings.logo_url,
    }))
}

// GET /api/services
pub async fn get_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<crate::models::Service>>, AppError> {
    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db)?
    };
    Ok(Json(services))
}

// GET /api/slots?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    date: Option<String>,
    taken: Vec<String>,
    available: Vec<String>,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    // No date picked yet: nothing is taken and no query is issued.
    let Some(raw) = query.date.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Json(SlotsResponse {
            date: None,
            taken: vec![],
            available: availability::catalog(),
        }));
    };

    let date = parse_date(raw)?;

    let taken = {
        let db = state.db.lock().unwrap();
        availability::booked_slots(&db, &date)?
    };

    let available = availability::SLOT_CATALOG
        .iter()
        .filter(|s| !taken.contains(**s))
        .map(|s| s.to_string())
        .collect();

    Ok(Json(SlotsResponse {
        date: Some(raw.to_string()),
        taken: taken.into_iter().collect(),
        available,
    }))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub customer_name: String,
    pub customer_contact: String,
    pub service_id: String,
    pub date: String,
    pub slot: String,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let customer_name = body.customer_name.trim();
    let customer_contact = body.customer_contact.trim();
    let slot = body.slot.trim();

    if customer_name.is_empty() || customer_contact.is_empty() {
        return Err(AppError::Validation(
            "customer name and contact are required".to_string(),
        ));
    }

    let date = parse_date(body.date.trim())?;

    if !availability::is_catalog_slot(slot) {
        return Err(AppError::Validation(format!(
            "slot must be one of the catalog times, got {slot:?}"
        )));
    }

    let db = state.db.lock().unwrap();

    let service = queries::get_service_by_id(&db, body.service_id.trim())?
        .ok_or_else(|| AppError::NotFound(format!("service {}", body.service_id)))?;

    let settings = queries::get_settings(&db)?;
    let initial_status = if settings.require_deposit {
        PaymentStatus::Pending
    } else {
        PaymentStatus::Confirmed
    };

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        customer_name: customer_name.to_string(),
        customer_contact: customer_contact.to_string(),
        // Denormalized on purpose: renaming a service must not rewrite
        // history.
        service_name: service.name,
        date,
        slot: slot.to_string(),
        payment_status: initial_status,
        order_reference: None,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = queries::create_booking(&db, &booking) {
        if queries::is_slot_conflict(&e) {
            return Err(AppError::Conflict("slot already booked".to_string()));
        }
        return Err(e.into());
    }

    tracing::info!(
        booking_id = %booking.id,
        date = %booking.date,
        slot = %booking.slot,
        status = booking.payment_status.as_str(),
        "booking created"
    );

    Ok(Json(booking))
}

// POST /api/bookings/:id/pay
pub async fn pay_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SnapTransaction>, AppError> {
    let (booking, settings) = {
        let db = state.db.lock().unwrap();
        let booking = queries::get_booking_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
        let settings = queries::get_settings(&db)?;
        (booking, settings)
    };

    if !settings.require_deposit {
        return Err(AppError::Conflict(
            "deposit payment is disabled".to_string(),
        ));
    }
    if booking.payment_status != PaymentStatus::Pending {
        return Err(AppError::Conflict(format!(
            "booking is not awaiting payment (status: {})",
            booking.payment_status.as_str()
        )));
    }

    // The gateway caps order ids at 50 chars, so only a fragment of the
    // booking id goes into the reference.
    let fragment: String = booking.id.chars().take(8).collect();
    let order_id = format!("TRX-{}-{}", fragment, Utc::now().timestamp());

    {
        let db = state.db.lock().unwrap();
        queries::set_order_reference(&db, &booking.id, &order_id)?;
    }

    let transaction = state
        .payments
        .create_transaction(&order_id, settings.dp_amount, &booking.customer_name)
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?;

    tracing::info!(booking_id = %booking.id, order_id = %order_id, "payment transaction created");

    Ok(Json(transaction))
}

// POST /api/payments/result
//
// The widget's onSuccess/onPending/onError/onClose callbacks report here.
// Informational only: the webhook is what flips payment_status.
#[derive(Deserialize)]
pub struct PaymentResultRequest {
    pub order_id: Option<String>,
    pub outcome: PaymentOutcome,
}

pub async fn payment_result(
    Json(body): Json<PaymentResultRequest>,
) -> Json<serde_json::Value> {
    tracing::info!(
        order_id = body.order_id.as_deref().unwrap_or("-"),
        outcome = body.outcome.as_str(),
        "payment widget result"
    );
    Json(serde_json::json!({ "ok": true }))
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {raw:?}")))
}
