pub mod booking;
pub mod service;
pub mod settings;

pub use booking::{Booking, PaymentStatus};
pub use service::Service;
pub use settings::Settings;
