//! Hero catalog repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::store::HeroCatalog;
use crate::models::Hero;
use crate::utils::errors::Result;

#[derive(Clone, Debug)]
pub struct HeroRepository {
    pool: PgPool,
}

impl HeroRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HeroCatalog for HeroRepository {
    async fn find_by_localized_names(&self, names: &[String]) -> Result<Vec<Hero>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let heroes = sqlx::query_as::<_, Hero>(
            "SELECT id, name, localized_name, image_url FROM heroes WHERE LOWER(localized_name) = ANY($1)",
        )
        .bind(&lowered)
        .fetch_all(&self.pool)
        .await?;

        Ok(heroes)
    }
}
