//! Spending stars on extra likes and super likes

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::{StarPackage, StoreConfig};
use crate::database::store::UserStore;
use crate::models::QuotaKind;
use crate::services::update_user;
use crate::services::quota::QuotaTracker;
use crate::utils::errors::{Result, TeamderError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResult {
    pub success: bool,
    pub kind: QuotaKind,
    pub amount: u32,
    pub remaining_stars: i64,
    pub total_available: u32,
}

#[derive(Clone)]
pub struct CurrencyService {
    store: Arc<dyn UserStore>,
    quota: QuotaTracker,
    catalog: StoreConfig,
    max_commit_attempts: u32,
}

impl CurrencyService {
    pub fn new(store: Arc<dyn UserStore>, quota: QuotaTracker, catalog: StoreConfig, max_commit_attempts: u32) -> Self {
        Self {
            store,
            quota,
            catalog,
            max_commit_attempts: max_commit_attempts.max(1),
        }
    }

    pub fn packages(&self) -> &[StarPackage] {
        &self.catalog.packages
    }

    /// Debit `stars_cost` and grant `amount` extra units in a single write.
    /// An insufficient balance changes nothing.
    pub async fn purchase_extra(
        &self,
        telegram_id: i64,
        kind: QuotaKind,
        amount: u32,
        stars_cost: i64,
    ) -> Result<PurchaseResult> {
        if amount == 0 {
            return Err(TeamderError::InvalidInput("Amount must be positive".to_string()));
        }
        if stars_cost <= 0 {
            return Err(TeamderError::InvalidInput("Price must be positive".to_string()));
        }

        let quota = &self.quota;
        let (saved, _) = update_user(self.store.as_ref(), telegram_id, self.max_commit_attempts, |user| {
            if user.stars < stars_cost {
                return Err(TeamderError::InsufficientFunds {
                    required: stars_cost,
                    available: user.stars,
                });
            }

            quota.reset_if_new_day(user, kind);
            user.stars -= stars_cost;
            quota.grant_extra(user, kind, amount);
            Ok(true)
        })
        .await?;

        info!(
            user_id = telegram_id,
            kind = kind.as_str(),
            amount = amount,
            stars_cost = stars_cost,
            remaining_stars = saved.stars,
            "Extra quota purchased"
        );

        Ok(PurchaseResult {
            success: true,
            kind,
            amount,
            remaining_stars: saved.stars,
            total_available: saved.quota(kind).total_available(),
        })
    }

    /// Buy one of the configured packages
    pub async fn purchase_package(&self, telegram_id: i64, package_id: &str) -> Result<PurchaseResult> {
        let package = self
            .catalog
            .find_package(package_id)
            .ok_or_else(|| TeamderError::InvalidInput(format!("Unknown package: {}", package_id)))?
            .clone();

        self.purchase_extra(telegram_id, package.kind, package.amount, package.stars_cost)
            .await
    }
}
