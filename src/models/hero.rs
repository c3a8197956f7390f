//! Hero catalog record

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::ProfileHero;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Hero {
    pub id: i32,
    pub name: String,
    pub localized_name: String,
    pub image_url: String,
}

impl From<Hero> for ProfileHero {
    fn from(hero: Hero) -> Self {
        Self {
            id: hero.id,
            name: hero.name,
            localized_name: hero.localized_name,
            image_url: hero.image_url,
        }
    }
}
