use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Booking, PaymentStatus, Service, Settings};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, customer_name, customer_contact, service_name, booking_date, booking_slot, payment_status, order_reference, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.customer_name,
            booking.customer_contact,
            booking.service_name,
            booking.date.format(DATE_FMT).to_string(),
            booking.slot,
            booking.payment_status.as_str(),
            booking.order_reference,
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// True when an insert failed because the (date, slot) pair is already taken.
pub fn is_slot_conflict(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub fn get_bookings_on_date(conn: &Connection, date: &NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, customer_name, customer_contact, service_name, booking_date, booking_slot, payment_status, order_reference, created_at, updated_at
         FROM bookings WHERE booking_date = ?1 ORDER BY booking_slot ASC",
    )?;

    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            "SELECT id, customer_name, customer_contact, service_name, booking_date, booking_slot, payment_status, order_reference, created_at, updated_at \
             FROM bookings WHERE payment_status = ?1 ORDER BY booking_date DESC, booking_slot DESC LIMIT ?2"
                .to_string(),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            "SELECT id, customer_name, customer_contact, service_name, booking_date, booking_slot, payment_status, order_reference, created_at, updated_at \
             FROM bookings ORDER BY booking_date DESC, booking_slot DESC LIMIT ?1"
                .to_string(),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, customer_name, customer_contact, service_name, booking_date, booking_slot, payment_status, order_reference, created_at, updated_at \
         FROM bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_booking_by_order_reference(
    conn: &Connection,
    order_reference: &str,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, customer_name, customer_contact, service_name, booking_date, booking_slot, payment_status, order_reference, created_at, updated_at \
         FROM bookings WHERE order_reference = ?1",
        params![order_reference],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Prefix lookup for order references that carry only a truncated booking id.
pub fn find_booking_by_id_prefix(
    conn: &Connection,
    prefix: &str,
) -> anyhow::Result<Option<Booking>> {
    if prefix.is_empty() || prefix.contains('%') || prefix.contains('_') {
        return Ok(None);
    }

    let result = conn.query_row(
        "SELECT id, customer_name, customer_contact, service_name, booking_date, booking_slot, payment_status, order_reference, created_at, updated_at \
         FROM bookings WHERE id LIKE ?1 || '%' LIMIT 1",
        params![prefix],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_order_reference(
    conn: &Connection,
    id: &str,
    order_reference: &str,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET order_reference = ?1, updated_at = ?2 WHERE id = ?3",
        params![order_reference, now, id],
    )?;
    Ok(count > 0)
}

pub fn update_payment_status(
    conn: &Connection,
    id: &str,
    status: PaymentStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET payment_status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let customer_name: String = row.get(1)?;
    let customer_contact: String = row.get(2)?;
    let service_name: String = row.get(3)?;
    let date_str: String = row.get(4)?;
    let slot: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let order_reference: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    let date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
        .unwrap_or_else(|_| Utc::now().date_naive());
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id,
        customer_name,
        customer_contact,
        service_name,
        date,
        slot,
        payment_status: PaymentStatus::parse(&status_str),
        order_reference,
        created_at,
        updated_at,
    })
}

// ── Services ──

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, name, price, duration_minutes, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            service.id,
            service.name,
            service.price,
            service.duration_minutes,
            service.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn list_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, price, duration_minutes, created_at FROM services ORDER BY price ASC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

pub fn get_service_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, name, price, duration_minutes, created_at FROM services WHERE id = ?1",
        params![id],
        |row| Ok(parse_service_row(row)),
    );

    match result {
        Ok(service) => Ok(Some(service?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_service(
    conn: &Connection,
    id: &str,
    name: &str,
    price: i64,
    duration_minutes: Option<i32>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, price = ?2, duration_minutes = ?3 WHERE id = ?4",
        params![name, price, duration_minutes, id],
    )?;
    Ok(count > 0)
}

pub fn delete_service(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let price: i64 = row.get(2)?;
    let duration_minutes: Option<i32> = row.get(3)?;
    let created_at_str: String = row.get(4)?;

    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Service {
        id,
        name,
        price,
        duration_minutes,
        created_at,
    })
}

// ── Settings ──

pub fn get_settings(conn: &Connection) -> anyhow::Result<Settings> {
    let settings = conn.query_row(
        "SELECT business_name, admin_contact, primary_color, dp_amount, require_deposit, logo_url FROM settings WHERE id = 1",
        [],
        |row| {
            Ok(Settings {
                business_name: row.get(0)?,
                admin_contact: row.get(1)?,
                primary_color: row.get(2)?,
                dp_amount: row.get(3)?,
                require_deposit: row.get::<_, i32>(4)? != 0,
                logo_url: row.get(5)?,
            })
        },
    )?;
    Ok(settings)
}

pub fn save_settings(conn: &Connection, settings: &Settings) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE settings SET business_name = ?1, admin_contact = ?2, primary_color = ?3, dp_amount = ?4, require_deposit = ?5, logo_url = ?6 WHERE id = 1",
        params![
            settings.business_name,
            settings.admin_contact,
            settings.primary_color,
            settings.dp_amount,
            settings.require_deposit as i32,
            settings.logo_url,
        ],
    )?;
    Ok(())
}

// ── Dashboard ──

pub struct OverviewStats {
    pub total_bookings: i64,
    pub paid_bookings: i64,
    pub pending_bookings: i64,
    pub services_count: i64,
}

pub fn get_overview_stats(conn: &Connection) -> anyhow::Result<OverviewStats> {
    let total_bookings: i64 =
        conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;

    let paid_bookings: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE payment_status = 'paid'",
        [],
        |row| row.get(0),
    )?;

    let pending_bookings: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE payment_status = 'pending'",
        [],
        |row| row.get(0),
    )?;

    let services_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))?;

    Ok(OverviewStats {
        total_bookings,
        paid_bookings,
        pending_bookings,
        services_count,
    })
}
