use std::collections::BTreeSet;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;

/// Fixed daily slot catalog, one-hour increments across business hours.
/// This is configuration: the checker never derives slots per date or
/// per service.
pub const SLOT_CATALOG: [&str; 9] = [
    "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
];

pub fn catalog() -> Vec<String> {
    SLOT_CATALOG.iter().map(|s| s.to_string()).collect()
}

/// Normalize a stored slot value to zero-padded HH:MM, truncating seconds.
pub fn normalize_slot(raw: &str) -> Option<String> {
    let mut parts = raw.trim().split(':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{hour:02}:{minute:02}"))
}

/// Slots already occupied on `date`, regardless of payment status: even an
/// abandoned pending booking holds its slot. A store failure propagates so
/// the caller never mistakes an outage for a fully open day.
pub fn booked_slots(conn: &Connection, date: &NaiveDate) -> anyhow::Result<BTreeSet<String>> {
    let bookings = queries::get_bookings_on_date(conn, date)?;

    let mut taken = BTreeSet::new();
    for booking in &bookings {
        let slot = normalize_slot(&booking.slot).unwrap_or_else(|| booking.slot.trim().to_string());
        taken.insert(slot);
    }
    Ok(taken)
}

/// Catalog slots still open on `date`.
pub fn open_slots(conn: &Connection, date: &NaiveDate) -> anyhow::Result<Vec<String>> {
    let taken = booked_slots(conn, date)?;
    Ok(SLOT_CATALOG
        .iter()
        .filter(|s| !taken.contains(**s))
        .map(|s| s.to_string())
        .collect())
}

pub fn is_catalog_slot(slot: &str) -> bool {
    SLOT_CATALOG.contains(&slot)
}
