use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::services::reconcile::{self, PaymentNotification, ReconcileOutcome};
use crate::state::AppState;

// POST /webhook/payment
//
// The gateway retries aggressively on anything other than a 2xx, so every
// processed notification acknowledges with 200 — including ones that match
// no booking. Only a forged signature (403) or a store failure (500) breaks
// that rule, and the two are deliberately distinguishable.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    Json(notification): Json<PaymentNotification>,
) -> Result<Json<serde_json::Value>, AppError> {
    // Skip verification only when no server key is configured (dev mode).
    if !state.config.midtrans_server_key.is_empty()
        && !reconcile::verify_signature(&notification, &state.config.midtrans_server_key)
    {
        tracing::warn!(order_id = %notification.order_id, "rejected notification: invalid signature");
        return Err(AppError::InvalidSignature);
    }

    let outcome = {
        let db = state.db.lock().unwrap();
        reconcile::apply(&db, &notification)?
    };

    match outcome {
        ReconcileOutcome::Updated { booking_id, status } => {
            tracing::info!(
                booking_id = %booking_id,
                order_id = %notification.order_id,
                status = status.as_str(),
                "payment status updated"
            );
            Ok(Json(serde_json::json!({
                "ok": true,
                "payment_status": status.as_str(),
            })))
        }
        ReconcileOutcome::Unchanged { booking_id, status } => {
            tracing::info!(
                booking_id = %booking_id,
                order_id = %notification.order_id,
                status = status.as_str(),
                "notification left payment status unchanged"
            );
            Ok(Json(serde_json::json!({
                "ok": true,
                "payment_status": status.as_str(),
            })))
        }
        ReconcileOutcome::NotFound => {
            // Acknowledge anyway: retrying will never make the booking
            // appear, and a non-2xx keeps the gateway hammering us.
            tracing::warn!(
                order_id = %notification.order_id,
                "notification matched no booking"
            );
            Ok(Json(serde_json::json!({
                "ok": true,
                "message": "no matching booking",
            })))
        }
    }
}
