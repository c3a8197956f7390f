//! Database module
//!
//! This module handles database connections, persistence ports and their adapters

pub mod connection;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{create_pool, health_check, run_migrations, DatabasePool};
pub use repositories::{HeroRepository, NotificationRepository, PaymentRepository, PgUserStore};
pub use service::DatabaseService;
pub use store::{
    HeroCatalog, MemoryHeroCatalog, MemoryNotificationInbox, MemoryUserStore, NotificationInbox, UserStore,
};
