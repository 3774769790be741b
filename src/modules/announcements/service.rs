use registrar_core::{AppError, Role};
use registrar_models::UserId;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::modules::announcements::model::{
    Announcement, AnnouncementTarget, AnnouncementWithCreator, CreateAnnouncementDto,
    visible_targets,
};

pub struct AnnouncementService;

impl AnnouncementService {
    #[instrument(skip(db, dto), fields(title = %dto.title))]
    pub async fn create_announcement(
        db: &PgPool,
        created_by: UserId,
        dto: CreateAnnouncementDto,
    ) -> Result<Announcement, AppError> {
        let mut targets: Vec<AnnouncementTarget> = Vec::with_capacity(dto.target_roles.len());
        for target in dto.target_roles {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        let announcement = sqlx::query_as::<_, Announcement>(
            r#"INSERT INTO announcements (title, content, target_roles, created_by)
               VALUES ($1, $2, $3, $4)
               RETURNING id, title, content, target_roles, created_by, created_at"#,
        )
        .bind(dto.title.trim())
        .bind(&dto.content)
        .bind(&targets)
        .bind(created_by)
        .fetch_one(db)
        .await?;

        info!(announcement_id = %announcement.id, "Announcement published");
        Ok(announcement)
    }

    /// Announcements `role` may read, newest first.
    #[instrument(skip(db))]
    pub async fn list_for_role(
        db: &PgPool,
        role: Role,
    ) -> Result<Vec<AnnouncementWithCreator>, AppError> {
        let announcements = sqlx::query_as::<_, AnnouncementWithCreator>(
            r#"SELECT a.id, a.title, a.content, a.target_roles, a.created_by,
                      u.name AS creator_name, u.email AS creator_email, a.created_at
               FROM announcements a
               JOIN users u ON u.id = a.created_by
               WHERE $1 OR a.target_roles && $2
               ORDER BY a.created_at DESC"#,
        )
        .bind(role == Role::Admin)
        .bind(visible_targets(role))
        .fetch_all(db)
        .await?;
        Ok(announcements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn admin(pool: &PgPool) -> UserId {
        sqlx::query_scalar(
            "INSERT INTO users (external_identity_ref, email, name, role)
             VALUES ('idp|admin', 'admin@example.com', 'Registrar', 'admin') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn dto(title: &str, targets: Vec<AnnouncementTarget>) -> CreateAnnouncementDto {
        CreateAnnouncementDto {
            title: title.to_string(),
            content: "Details inside".to_string(),
            target_roles: targets,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_visibility_by_role(pool: PgPool) {
        let admin_id = admin(&pool).await;
        AnnouncementService::create_announcement(
            &pool,
            admin_id,
            dto("Staff meeting", vec![AnnouncementTarget::Teacher]),
        )
        .await
        .unwrap();
        AnnouncementService::create_announcement(
            &pool,
            admin_id,
            dto("Resumption", vec![AnnouncementTarget::Both, AnnouncementTarget::Both]),
        )
        .await
        .unwrap();

        let student = AnnouncementService::list_for_role(&pool, Role::Student).await.unwrap();
        assert_eq!(student.len(), 1);
        assert_eq!(student[0].title, "Resumption");
        assert_eq!(student[0].target_roles, vec![AnnouncementTarget::Both]);
        assert_eq!(student[0].creator_name.as_deref(), Some("Registrar"));

        let teacher = AnnouncementService::list_for_role(&pool, Role::Teacher).await.unwrap();
        assert_eq!(teacher.len(), 2);
        assert_eq!(teacher[0].title, "Resumption");

        let admin = AnnouncementService::list_for_role(&pool, Role::Admin).await.unwrap();
        assert_eq!(admin.len(), 2);
    }
}
