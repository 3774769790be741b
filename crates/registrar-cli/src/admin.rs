//! Admin account management.

use registrar_core::Role;
use registrar_models::User;
use sqlx::PgPool;

/// Creates the user as an admin, or promotes the existing user with the same
/// identity reference. The name is only overwritten when one is given.
pub async fn create_admin(
    db: &PgPool,
    email: &str,
    external_identity_ref: &str,
    name: Option<&str>,
) -> Result<User, Box<dyn std::error::Error>> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err("A valid email address is required".into());
    }
    let external_identity_ref = external_identity_ref.trim();
    if external_identity_ref.is_empty() {
        return Err("An identity reference is required".into());
    }

    let user = sqlx::query_as::<_, User>(
        r#"INSERT INTO users (external_identity_ref, email, name, role)
           VALUES ($1, $2, $3, $4)
           ON CONFLICT (external_identity_ref) DO UPDATE
           SET email = EXCLUDED.email,
               name = COALESCE(EXCLUDED.name, users.name),
               role = EXCLUDED.role,
               updated_at = NOW()
           RETURNING id, external_identity_ref, email, name, image_url, role, created_at, updated_at"#,
    )
    .bind(external_identity_ref)
    .bind(&email)
    .bind(name.map(str::trim).filter(|n| !n.is_empty()))
    .bind(Role::Admin)
    .fetch_one(db)
    .await?;

    Ok(user)
}
