use anyhow::{bail, Result};
use chrono::Utc;
use model::entities::user::{self, UserRole};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, EntityTrait, IntoActiveModel, QueryFilter, Set,
};
use tracing::{debug, info, trace};

use crate::auth::hash_password;
use crate::config::AppConfig;

/// Minimum password length accepted by the API as well.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Creates an administrator, or promotes and re-activates the user that
/// already owns `email` and resets its password.
pub async fn create_admin(database_url: &str, name: &str, email: &str, password: &str) -> Result<()> {
    trace!("Entering create_admin function");
    if password.len() < MIN_PASSWORD_LENGTH {
        bail!("Password must be at least {} characters long", MIN_PASSWORD_LENGTH);
    }

    let cost = AppConfig::load().map(|c| c.bcrypt_cost).unwrap_or(bcrypt::DEFAULT_COST);
    let password_hash = hash_password(password, cost)?;
    let email = email.trim().to_lowercase();

    let db = Database::connect(database_url).await?;
    debug!("Connected to {}", database_url);

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&db)
        .await?;

    match existing {
        Some(found) => {
            let mut active = found.into_active_model();
            active.name = Set(name.to_string());
            active.password_hash = Set(password_hash);
            active.role = Set(UserRole::Admin);
            active.is_active = Set(true);
            let updated = active.update(&db).await?;
            info!("Existing user {} promoted to admin", updated.email);
        }
        None => {
            let created = user::ActiveModel {
                name: Set(name.to_string()),
                email: Set(email),
                password_hash: Set(password_hash),
                role: Set(UserRole::Admin),
                is_active: Set(true),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db)
            .await?;
            info!("Admin {} created with id {}", created.email, created.id);
        }
    }

    Ok(())
}
