use serde::{Deserialize, Serialize};

/// Singleton site configuration (row id 1). Seeded at migration time and
/// only ever mutated through the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub business_name: String,
    pub admin_contact: String,
    pub primary_color: String,
    pub dp_amount: i64,
    pub require_deposit: bool,
    pub logo_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            business_name: "Beefirst Visual".to_string(),
            admin_contact: String::new(),
            primary_color: "#4f46e5".to_string(),
            dp_amount: 50_000,
            require_deposit: true,
            logo_url: None,
        }
    }
}
