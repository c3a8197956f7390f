//! Database service layer
//!
//! Groups the Postgres repositories built on one pool

use crate::database::connection::{health_check, DatabasePool};
use crate::database::repositories::{HeroRepository, NotificationRepository, PaymentRepository, PgUserStore};
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: PgUserStore,
    pub notifications: NotificationRepository,
    pub payments: PaymentRepository,
    pub heroes: HeroRepository,
    pool: DatabasePool,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: PgUserStore::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            heroes: HeroRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        health_check(&self.pool).await
    }
}
