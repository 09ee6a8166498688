use anyhow::Context;
use rusqlite::Connection;

// The UNIQUE(booking_date, booking_slot) constraint is the actual guard
// against double-booking; the availability endpoint is advisory only.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS bookings (
    id TEXT PRIMARY KEY,
    customer_name TEXT NOT NULL,
    customer_contact TEXT NOT NULL,
    service_name TEXT NOT NULL,
    booking_date TEXT NOT NULL,
    booking_slot TEXT NOT NULL,
    payment_status TEXT NOT NULL DEFAULT 'pending',
    order_reference TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(booking_date, booking_slot)
);

CREATE INDEX IF NOT EXISTS idx_bookings_date ON bookings(booking_date);
CREATE INDEX IF NOT EXISTS idx_bookings_order_ref ON bookings(order_reference);

CREATE TABLE IF NOT EXISTS services (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    price INTEGER NOT NULL,
    duration_minutes INTEGER,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    business_name TEXT NOT NULL,
    admin_contact TEXT NOT NULL,
    primary_color TEXT NOT NULL,
    dp_amount INTEGER NOT NULL,
    require_deposit INTEGER NOT NULL DEFAULT 1,
    logo_url TEXT
);
";

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(SCHEMA)
        .context("failed to create schema")?;

    let settings = crate::models::Settings::default();
    conn.execute(
        "INSERT OR IGNORE INTO settings (id, business_name, admin_contact, primary_color, dp_amount, require_deposit, logo_url)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            settings.business_name,
            settings.admin_contact,
            settings.primary_color,
            settings.dp_amount,
            settings.require_deposit as i32,
            settings.logo_url,
        ],
    )
    .context("failed to seed settings row")?;

    Ok(())
}
