use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub midtrans_server_key: String,
    pub midtrans_client_key: String,
    pub midtrans_snap_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "beefirst.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            midtrans_server_key: env::var("MIDTRANS_SERVER_KEY").unwrap_or_default(),
            midtrans_client_key: env::var("MIDTRANS_CLIENT_KEY").unwrap_or_default(),
            midtrans_snap_url: env::var("MIDTRANS_SNAP_URL").unwrap_or_else(|_| {
                "https://app.sandbox.midtrans.com/snap/v1/transactions".to_string()
            }),
        }
    }
}
