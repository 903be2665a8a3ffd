//! Page service
//!
//! Standalone pages (about, contact, ...) share the slug and state
//! handling of posts but carry no excerpt, thumbnail, or categories.

use crate::db::repositories::{PageRepository, UserRepository};
use crate::models::{CreatePageInput, Page, PublishState, UpdatePageInput};
use crate::services::slug::{generate_slug, slug_candidate};
use anyhow::Context;
use std::sync::Arc;

/// Error types for page service operations
#[derive(Debug, thiserror::Error)]
pub enum PageServiceError {
    /// Page not found
    #[error("Page not found")]
    NotFound,

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Slug already in use
    #[error("Slug '{0}' is already in use")]
    DuplicateSlug(String),

    /// Referenced author does not exist
    #[error("Author {0} does not exist")]
    UnknownAuthor(i64),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Page service
pub struct PageService {
    repo: Arc<dyn PageRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl PageService {
    pub fn new(repo: Arc<dyn PageRepository>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self { repo, user_repo }
    }

    /// Create a new page.
    pub async fn create(&self, input: CreatePageInput) -> Result<Page, PageServiceError> {
        let author_id = input
            .author_id
            .ok_or_else(|| PageServiceError::ValidationError("Author is required".to_string()))?;
        self.check_author(author_id).await?;

        let slug = match input.slug {
            Some(slug) => {
                if self
                    .repo
                    .exists_by_slug(&slug)
                    .await
                    .context("Failed to check slug uniqueness")?
                {
                    return Err(PageServiceError::DuplicateSlug(slug));
                }
                slug
            }
            None => self.unique_slug(&generate_slug(&input.title.en)).await?,
        };

        let mut page = Page::new(input.title, slug, author_id);
        page.content = input.content;
        if let Some(state) = input.state {
            page.state = state;
        }

        let created = self
            .repo
            .create(&page)
            .await
            .context("Failed to create page")?;

        tracing::info!("Created page {} ({})", created.id, created.slug);
        Ok(created)
    }

    /// Get page by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Page>, PageServiceError> {
        let page = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get page")?;
        Ok(page)
    }

    /// Get page by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>, PageServiceError> {
        let page = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get page by slug")?;
        Ok(page)
    }

    /// List pages, optionally scoped to an owner and filtered by state
    pub async fn list(
        &self,
        owner: Option<i64>,
        state: Option<PublishState>,
    ) -> Result<Vec<Page>, PageServiceError> {
        let pages = self
            .repo
            .list(owner, state)
            .await
            .context("Failed to list pages")?;
        Ok(pages)
    }

    /// Update a page; absent fields keep their current values.
    pub async fn update(&self, id: i64, input: UpdatePageInput) -> Result<Page, PageServiceError> {
        let mut page = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get page")?
            .ok_or(PageServiceError::NotFound)?;

        if let Some(author_id) = input.author_id {
            if author_id != page.author_id {
                self.check_author(author_id).await?;
                page.author_id = author_id;
            }
        }
        if let Some(slug) = input.slug {
            if slug != page.slug {
                let taken = self
                    .repo
                    .get_by_slug(&slug)
                    .await
                    .context("Failed to check slug uniqueness")?
                    .map(|other| other.id != id)
                    .unwrap_or(false);
                if taken {
                    return Err(PageServiceError::DuplicateSlug(slug));
                }
                page.slug = slug;
            }
        }
        if let Some(title) = input.title {
            page.title = title;
        }
        if let Some(content) = input.content {
            page.content = content;
        }
        if let Some(state) = input.state {
            page.state = state;
        }

        let updated = self
            .repo
            .update(&page)
            .await
            .context("Failed to update page")?;
        Ok(updated)
    }

    /// Delete a page.
    pub async fn delete(&self, id: i64) -> Result<(), PageServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get page")?
            .is_none()
        {
            return Err(PageServiceError::NotFound);
        }

        self.repo
            .delete(id)
            .await
            .context("Failed to delete page")?;

        tracing::info!("Deleted page {}", id);
        Ok(())
    }

    async fn check_author(&self, author_id: i64) -> Result<(), PageServiceError> {
        if self
            .user_repo
            .get_by_id(author_id)
            .await
            .context("Failed to check author")?
            .is_none()
        {
            return Err(PageServiceError::UnknownAuthor(author_id));
        }
        Ok(())
    }

    /// First free slug: the base itself, then `base-2`, `base-3`, ...
    async fn unique_slug(&self, base: &str) -> Result<String, PageServiceError> {
        let base = if base.is_empty() { "page" } else { base };
        let mut attempt = 1;
        loop {
            let candidate = slug_candidate(base, attempt);
            if !self
                .repo
                .exists_by_slug(&candidate)
                .await
                .context("Failed to check slug uniqueness")?
            {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxPageRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, run_migrations};
    use crate::models::Localized;
    use sqlx::SqlitePool;

    async fn setup_test_service() -> (SqlitePool, PageService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let service = PageService::new(
            SqlxPageRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool.clone()),
        );
        (pool, service)
    }

    async fn create_author(pool: &SqlitePool, email: &str) -> i64 {
        sqlx::query("INSERT INTO users (email, password_hash, is_admin) VALUES (?, 'hash', 0)")
            .bind(email)
            .execute(pool)
            .await
            .expect("Failed to create author")
            .last_insert_rowid()
    }

    fn base_input(author_id: Option<i64>) -> CreatePageInput {
        CreatePageInput {
            title: Localized::new(
                "About Us".to_string(),
                "Giới thiệu".to_string(),
                "À propos".to_string(),
            ),
            content: Localized::default(),
            slug: None,
            author_id,
            state: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_and_dedupes_slug() {
        let (pool, service) = setup_test_service().await;
        let author = create_author(&pool, "a@example.com").await;

        let first = service.create(base_input(Some(author))).await.unwrap();
        let second = service.create(base_input(Some(author))).await.unwrap();

        assert_eq!(first.slug, "about-us");
        assert_eq!(second.slug, "about-us-2");
        assert_eq!(first.state, PublishState::Draft);
    }

    #[tokio::test]
    async fn test_create_requires_existing_author() {
        let (pool, service) = setup_test_service().await;
        let _ = create_author(&pool, "a@example.com").await;

        let result = service.create(base_input(None)).await;
        assert!(matches!(result, Err(PageServiceError::ValidationError(_))));

        let result = service.create(base_input(Some(999))).await;
        assert!(matches!(result, Err(PageServiceError::UnknownAuthor(999))));
    }

    #[tokio::test]
    async fn test_create_explicit_slug_collision() {
        let (pool, service) = setup_test_service().await;
        let author = create_author(&pool, "a@example.com").await;

        let mut input = base_input(Some(author));
        input.slug = Some("about".to_string());
        service.create(input).await.expect("First create should work");

        let mut input = base_input(Some(author));
        input.slug = Some("about".to_string());
        let result = service.create(input).await;

        assert!(matches!(result, Err(PageServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_update_and_slug_conflict() {
        let (pool, service) = setup_test_service().await;
        let author = create_author(&pool, "a@example.com").await;

        let page = service.create(base_input(Some(author))).await.unwrap();
        let other = service.create(base_input(Some(author))).await.unwrap();

        let updated = service
            .update(
                page.id,
                UpdatePageInput {
                    state: Some(PublishState::Published),
                    content: Some(Localized::new(
                        Some("Body".to_string()),
                        None,
                        None,
                    )),
                    ..Default::default()
                },
            )
            .await
            .expect("Update failed");
        assert_eq!(updated.state, PublishState::Published);
        assert_eq!(updated.content.en.as_deref(), Some("Body"));
        assert!(updated.content.vi.is_none());
        assert_eq!(updated.title.vi, "Giới thiệu");

        let result = service
            .update(
                page.id,
                UpdatePageInput {
                    slug: Some(other.slug.clone()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(PageServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_list_owner_and_state_filters() {
        let (pool, service) = setup_test_service().await;
        let alice = create_author(&pool, "alice@example.com").await;
        let bob = create_author(&pool, "bob@example.com").await;

        let mut input = base_input(Some(alice));
        input.state = Some(PublishState::Published);
        service.create(input).await.unwrap();
        service.create(base_input(Some(bob))).await.unwrap();

        assert_eq!(service.list(None, None).await.unwrap().len(), 2);
        assert_eq!(service.list(Some(alice), None).await.unwrap().len(), 1);
        assert_eq!(
            service
                .list(None, Some(PublishState::Published))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            service
                .list(Some(bob), Some(PublishState::Published))
                .await
                .unwrap()
                .len(),
            0
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let (pool, service) = setup_test_service().await;
        let author = create_author(&pool, "a@example.com").await;

        let page = service.create(base_input(Some(author))).await.unwrap();
        service.delete(page.id).await.expect("Delete failed");

        assert!(service.get_by_id(page.id).await.unwrap().is_none());
        assert!(matches!(
            service.delete(page.id).await,
            Err(PageServiceError::NotFound)
        ));
    }
}
