use rusqlite::Connection;
use serde::Deserialize;
use sha2::{Digest, Sha512};

use crate::db::queries;
use crate::models::PaymentStatus;

/// Inbound gateway notification, required fields only. Unknown extra fields
/// are ignored; a payload missing any of these is rejected at deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    pub gross_amount: String,
    pub status_code: String,
    pub signature_key: String,
}

/// The gateway signs notifications with
/// sha512(order_id + status_code + gross_amount + server_key), hex encoded.
pub fn expected_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_signature(notification: &PaymentNotification, server_key: &str) -> bool {
    let expected = expected_signature(
        &notification.order_id,
        &notification.status_code,
        &notification.gross_amount,
        server_key,
    );
    expected == notification.signature_key.to_lowercase()
}

/// Map the gateway's transaction/fraud vocabulary onto ours. Total by
/// construction: unrecognized or transitional statuses stay `pending` so a
/// new gateway status string can never fail a notification.
pub fn map_status(transaction_status: &str, fraud_status: Option<&str>) -> PaymentStatus {
    match transaction_status {
        "capture" | "settlement" => match fraud_status {
            Some("challenge") => PaymentStatus::Pending,
            _ => PaymentStatus::Paid,
        },
        "cancel" | "deny" | "expire" => PaymentStatus::Failed,
        _ => PaymentStatus::Pending,
    }
}

/// Extract the booking-id fragment from an order reference shaped
/// `<prefix>-<fragment>-<timestamp>`.
pub fn booking_fragment(order_id: &str) -> Option<&str> {
    let mut parts = order_id.splitn(3, '-');
    let _prefix = parts.next()?;
    let fragment = parts.next()?;
    let _timestamp = parts.next()?;
    if fragment.is_empty() {
        return None;
    }
    Some(fragment)
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Updated {
        booking_id: String,
        status: PaymentStatus,
    },
    /// The stored status already matches, or the booking is `paid` and the
    /// mapped status would downgrade it. Out-of-order and duplicate
    /// deliveries land here.
    Unchanged {
        booking_id: String,
        status: PaymentStatus,
    },
    NotFound,
}

/// Apply an already-authenticated notification to the store.
pub fn apply(
    conn: &Connection,
    notification: &PaymentNotification,
) -> anyhow::Result<ReconcileOutcome> {
    let mapped = map_status(
        &notification.transaction_status,
        notification.fraud_status.as_deref(),
    );

    let booking = match queries::find_booking_by_order_reference(conn, &notification.order_id)? {
        Some(b) => Some(b),
        None => match booking_fragment(&notification.order_id) {
            Some(fragment) => queries::find_booking_by_id_prefix(conn, fragment)?,
            None => None,
        },
    };

    let Some(booking) = booking else {
        return Ok(ReconcileOutcome::NotFound);
    };

    // paid is terminal: a late expire/cancel must not downgrade it.
    if booking.payment_status == PaymentStatus::Paid && mapped != PaymentStatus::Paid {
        return Ok(ReconcileOutcome::Unchanged {
            booking_id: booking.id,
            status: PaymentStatus::Paid,
        });
    }

    if booking.payment_status == mapped {
        return Ok(ReconcileOutcome::Unchanged {
            booking_id: booking.id,
            status: mapped,
        });
    }

    queries::update_payment_status(conn, &booking.id, mapped)?;
    Ok(ReconcileOutcome::Updated {
        booking_id: booking.id,
        status: mapped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::Booking;
    use chrono::{NaiveDate, Utc};

    const SERVER_KEY: &str = "SB-Mid-server-testkey";

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn insert_booking(conn: &Connection, id: &str, order_reference: Option<&str>) {
        let now = Utc::now().naive_utc();
        let booking = Booking {
            id: id.to_string(),
            customer_name: "Alice".to_string(),
            customer_contact: "+628111222333".to_string(),
            service_name: "Wedding Shoot".to_string(),
            date: NaiveDate::parse_from_str("2025-07-01", "%Y-%m-%d").unwrap(),
            slot: "09:00".to_string(),
            payment_status: PaymentStatus::Pending,
            order_reference: order_reference.map(|s| s.to_string()),
            created_at: now,
            updated_at: now,
        };
        queries::create_booking(conn, &booking).unwrap();
    }

    fn notification(order_id: &str, transaction_status: &str) -> PaymentNotification {
        let gross_amount = "50000";
        let status_code = "200";
        PaymentNotification {
            order_id: order_id.to_string(),
            transaction_status: transaction_status.to_string(),
            fraud_status: None,
            gross_amount: gross_amount.to_string(),
            status_code: status_code.to_string(),
            signature_key: expected_signature(order_id, status_code, gross_amount, SERVER_KEY),
        }
    }

    fn stored_status(conn: &Connection, id: &str) -> PaymentStatus {
        queries::get_booking_by_id(conn, id)
            .unwrap()
            .unwrap()
            .payment_status
    }

    // ── Signature ──

    #[test]
    fn test_valid_signature_accepted() {
        let n = notification("TRX-42-1700000000", "settlement");
        assert!(verify_signature(&n, SERVER_KEY));
    }

    #[test]
    fn test_uppercase_hex_signature_accepted() {
        let mut n = notification("TRX-42-1700000000", "settlement");
        n.signature_key = n.signature_key.to_uppercase();
        assert!(verify_signature(&n, SERVER_KEY));
    }

    #[test]
    fn test_tampered_order_id_rejected() {
        let mut n = notification("TRX-42-1700000000", "settlement");
        n.order_id = "TRX-43-1700000000".to_string();
        assert!(!verify_signature(&n, SERVER_KEY));
    }

    #[test]
    fn test_tampered_status_code_rejected() {
        let mut n = notification("TRX-42-1700000000", "settlement");
        n.status_code = "201".to_string();
        assert!(!verify_signature(&n, SERVER_KEY));
    }

    #[test]
    fn test_tampered_amount_rejected() {
        let mut n = notification("TRX-42-1700000000", "settlement");
        n.gross_amount = "1".to_string();
        assert!(!verify_signature(&n, SERVER_KEY));
    }

    #[test]
    fn test_wrong_server_key_rejected() {
        let n = notification("TRX-42-1700000000", "settlement");
        assert!(!verify_signature(&n, "some-other-key"));
    }

    // ── Status mapping ──

    #[test]
    fn test_map_status_is_total() {
        assert_eq!(map_status("capture", None), PaymentStatus::Paid);
        assert_eq!(map_status("capture", Some("accept")), PaymentStatus::Paid);
        assert_eq!(
            map_status("capture", Some("challenge")),
            PaymentStatus::Pending
        );
        assert_eq!(map_status("settlement", None), PaymentStatus::Paid);
        assert_eq!(map_status("cancel", None), PaymentStatus::Failed);
        assert_eq!(map_status("deny", None), PaymentStatus::Failed);
        assert_eq!(map_status("expire", None), PaymentStatus::Failed);
        assert_eq!(map_status("pending", None), PaymentStatus::Pending);
        assert_eq!(map_status("authorize", None), PaymentStatus::Pending);
        assert_eq!(map_status("", None), PaymentStatus::Pending);
        assert_eq!(
            map_status("some-future-status", Some("accept")),
            PaymentStatus::Pending
        );
    }

    // ── Order reference parsing ──

    #[test]
    fn test_booking_fragment_extraction() {
        assert_eq!(booking_fragment("TRX-42-1700000000"), Some("42"));
        assert_eq!(booking_fragment("TRX-a1b2c3d4-1700000000"), Some("a1b2c3d4"));
        assert_eq!(booking_fragment("TRX--1700000000"), None);
        assert_eq!(booking_fragment("TRX-42"), None);
        assert_eq!(booking_fragment("42"), None);
        assert_eq!(booking_fragment(""), None);
    }

    // ── Apply ──

    #[test]
    fn test_settlement_marks_paid() {
        let conn = setup_db();
        insert_booking(&conn, "42", Some("TRX-42-1700000000"));

        let outcome = apply(&conn, &notification("TRX-42-1700000000", "settlement")).unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Updated {
                booking_id: "42".to_string(),
                status: PaymentStatus::Paid,
            }
        );
        assert_eq!(stored_status(&conn, "42"), PaymentStatus::Paid);
    }

    #[test]
    fn test_expire_marks_failed() {
        let conn = setup_db();
        insert_booking(&conn, "42", Some("TRX-42-1700000000"));

        apply(&conn, &notification("TRX-42-1700000000", "expire")).unwrap();
        assert_eq!(stored_status(&conn, "42"), PaymentStatus::Failed);
    }

    #[test]
    fn test_pending_notification_is_noop() {
        let conn = setup_db();
        insert_booking(&conn, "42", Some("TRX-42-1700000000"));

        let outcome = apply(&conn, &notification("TRX-42-1700000000", "pending")).unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Unchanged {
                booking_id: "42".to_string(),
                status: PaymentStatus::Pending,
            }
        );
        assert_eq!(stored_status(&conn, "42"), PaymentStatus::Pending);
    }

    #[test]
    fn test_duplicate_delivery_idempotent() {
        let conn = setup_db();
        insert_booking(&conn, "42", Some("TRX-42-1700000000"));
        let n = notification("TRX-42-1700000000", "settlement");

        apply(&conn, &n).unwrap();
        let second = apply(&conn, &n).unwrap();

        assert_eq!(
            second,
            ReconcileOutcome::Unchanged {
                booking_id: "42".to_string(),
                status: PaymentStatus::Paid,
            }
        );
        assert_eq!(stored_status(&conn, "42"), PaymentStatus::Paid);
    }

    #[test]
    fn test_paid_never_downgraded() {
        let conn = setup_db();
        insert_booking(&conn, "42", Some("TRX-42-1700000000"));

        apply(&conn, &notification("TRX-42-1700000000", "settlement")).unwrap();

        // Late out-of-order deliveries must not regress the booking.
        apply(&conn, &notification("TRX-42-1700000000", "expire")).unwrap();
        assert_eq!(stored_status(&conn, "42"), PaymentStatus::Paid);

        apply(&conn, &notification("TRX-42-1700000000", "pending")).unwrap();
        assert_eq!(stored_status(&conn, "42"), PaymentStatus::Paid);
    }

    #[test]
    fn test_unknown_order_reference() {
        let conn = setup_db();
        insert_booking(&conn, "42", Some("TRX-42-1700000000"));

        let outcome = apply(&conn, &notification("TRX-99-1700000000", "settlement")).unwrap();
        assert_eq!(outcome, ReconcileOutcome::NotFound);
        assert_eq!(stored_status(&conn, "42"), PaymentStatus::Pending);
    }

    #[test]
    fn test_fallback_lookup_by_id_prefix() {
        // Booking created before its order_reference was persisted: the id
        // fragment embedded in the order id still resolves it.
        let conn = setup_db();
        insert_booking(&conn, "a1b2c3d4-0000-0000-0000-000000000000", None);

        let outcome = apply(&conn, &notification("TRX-a1b2c3d4-1700000000", "settlement")).unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Updated { .. }));
        assert_eq!(
            stored_status(&conn, "a1b2c3d4-0000-0000-0000-000000000000"),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_challenge_does_not_mark_paid() {
        let conn = setup_db();
        insert_booking(&conn, "42", Some("TRX-42-1700000000"));

        let mut n = notification("TRX-42-1700000000", "capture");
        n.fraud_status = Some("challenge".to_string());
        apply(&conn, &n).unwrap();
        assert_eq!(stored_status(&conn, "42"), PaymentStatus::Pending);
    }
}
