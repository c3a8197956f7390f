//! Database repositories module
//!
//! Postgres implementations of the persistence ports

pub mod hero;
pub mod notification;
pub mod payment;
pub mod user;

// Re-export repositories
pub use hero::HeroRepository;
pub use notification::NotificationRepository;
pub use payment::PaymentRepository;
pub use user::PgUserStore;
