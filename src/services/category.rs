//! Category service
//!
//! Business logic for categories: slug derivation from the English name,
//! uniqueness checks, and a delete guard that refuses to remove a category
//! while posts still reference it.

use crate::db::repositories::CategoryRepository;
use crate::models::{Category, CreateCategoryInput, UpdateCategoryInput};
use crate::services::slug::{generate_slug, slug_candidate};
use anyhow::Context;
use std::sync::Arc;

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category not found
    #[error("Category not found")]
    NotFound,

    /// Slug already in use
    #[error("Slug '{0}' is already in use")]
    DuplicateSlug(String),

    /// Category still referenced by posts
    #[error("Category {id} is still used by {posts} post(s)")]
    InUse { id: i64, posts: i64 },

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// Create a new category.
    ///
    /// An omitted slug is derived from the English name and suffixed until
    /// unique; an explicit slug that collides is an error.
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        if input.name.en.trim().is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }

        let slug = match input.slug {
            Some(slug) => {
                if slug.trim().is_empty() {
                    return Err(CategoryServiceError::ValidationError(
                        "Category slug cannot be empty".to_string(),
                    ));
                }
                if self
                    .repo
                    .exists_by_slug(&slug)
                    .await
                    .context("Failed to check slug uniqueness")?
                {
                    return Err(CategoryServiceError::DuplicateSlug(slug));
                }
                slug
            }
            None => self.unique_slug(&generate_slug(&input.name.en)).await?,
        };

        let category = Category::new(input.name, slug);
        let created = self
            .repo
            .create(&category)
            .await
            .context("Failed to create category")?;

        tracing::info!("Created category {} ({})", created.id, created.slug);
        Ok(created)
    }

    /// Get category by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Category>, CategoryServiceError> {
        let category = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?;
        Ok(category)
    }

    /// Get category by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, CategoryServiceError> {
        let category = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get category by slug")?;
        Ok(category)
    }

    /// List all categories, ordered by English name
    pub async fn list(&self) -> Result<Vec<Category>, CategoryServiceError> {
        let categories = self.repo.list().await.context("Failed to list categories")?;
        Ok(categories)
    }

    /// Update a category; absent fields keep their current values.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateCategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        let mut category = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or(CategoryServiceError::NotFound)?;

        if let Some(slug) = input.slug {
            if slug != category.slug {
                let taken = self
                    .repo
                    .get_by_slug(&slug)
                    .await
                    .context("Failed to check slug uniqueness")?
                    .map(|other| other.id != id)
                    .unwrap_or(false);
                if taken {
                    return Err(CategoryServiceError::DuplicateSlug(slug));
                }
                category.slug = slug;
            }
        }
        if let Some(name) = input.name {
            if name.en.trim().is_empty() {
                return Err(CategoryServiceError::ValidationError(
                    "Category name cannot be empty".to_string(),
                ));
            }
            category.name = name;
        }

        let updated = self
            .repo
            .update(&category)
            .await
            .context("Failed to update category")?;
        Ok(updated)
    }

    /// Delete a category.
    ///
    /// Refused while posts still reference the category; callers must
    /// reassign or delete those posts first.
    pub async fn delete(&self, id: i64) -> Result<(), CategoryServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .is_none()
        {
            return Err(CategoryServiceError::NotFound);
        }

        let posts = self
            .repo
            .post_count(id)
            .await
            .context("Failed to count posts in category")?;
        if posts > 0 {
            return Err(CategoryServiceError::InUse { id, posts });
        }

        self.repo
            .delete(id)
            .await
            .context("Failed to delete category")?;

        tracing::info!("Deleted category {}", id);
        Ok(())
    }

    /// First free slug: the base itself, then `base-2`, `base-3`, ...
    async fn unique_slug(&self, base: &str) -> Result<String, CategoryServiceError> {
        let base = if base.is_empty() { "category" } else { base };
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
    use crate::db::repositories::SqlxCategoryRepository;
    use crate::db::{create_test_pool, run_migrations};
    use crate::models::Localized;
    use sqlx::SqlitePool;

    async fn setup_test_service() -> (SqlitePool, CategoryService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let service = CategoryService::new(SqlxCategoryRepository::boxed(pool.clone()));
        (pool, service)
    }

    fn input(en: &str, vi: &str, fr: &str) -> CreateCategoryInput {
        CreateCategoryInput {
            name: Localized::new(en.to_string(), vi.to_string(), fr.to_string()),
            slug: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug_from_english_name() {
        let (_pool, service) = setup_test_service().await;

        let category = service
            .create(input("Travel Notes", "Ghi chép du lịch", "Notes de voyage"))
            .await
            .expect("Failed to create category");

        assert!(category.id > 0);
        assert_eq!(category.slug, "travel-notes");
        assert_eq!(category.name.vi, "Ghi chép du lịch");
    }

    #[tokio::test]
    async fn test_create_dedupes_derived_slug() {
        let (_pool, service) = setup_test_service().await;

        let first = service.create(input("News", "Tin tức", "Actualités")).await.unwrap();
        let second = service.create(input("News", "Tin", "Infos")).await.unwrap();

        assert_eq!(first.slug, "news");
        assert_eq!(second.slug, "news-2");
    }

    #[tokio::test]
    async fn test_create_explicit_slug_collision() {
        let (_pool, service) = setup_test_service().await;

        let mut a = input("A", "A", "A");
        a.slug = Some("shared".to_string());
        service.create(a).await.expect("First create should work");

        let mut b = input("B", "B", "B");
        b.slug = Some("shared".to_string());
        let result = service.create(b).await;

        assert!(matches!(result, Err(CategoryServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_create_empty_name_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service.create(input("  ", "x", "x")).await;
        assert!(matches!(result, Err(CategoryServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_name_and_slug() {
        let (_pool, service) = setup_test_service().await;

        let created = service.create(input("Old", "Cũ", "Ancien")).await.unwrap();
        let other = service.create(input("Other", "Khác", "Autre")).await.unwrap();

        let updated = service
            .update(
                created.id,
                UpdateCategoryInput {
                    name: Some(Localized::new(
                        "New".to_string(),
                        "Mới".to_string(),
                        "Nouveau".to_string(),
                    )),
                    slug: None,
                },
            )
            .await
            .expect("Failed to update");
        assert_eq!(updated.name.en, "New");
        // Slug is not re-derived on rename
        assert_eq!(updated.slug, "old");

        let result = service
            .update(
                created.id,
                UpdateCategoryInput {
                    name: None,
                    slug: Some(other.slug.clone()),
                },
            )
            .await;
        assert!(matches!(result, Err(CategoryServiceError::DuplicateSlug(_))));

        // Re-submitting its own slug is fine
        service
            .update(
                created.id,
                UpdateCategoryInput {
                    name: None,
                    slug: Some("old".to_string()),
                },
            )
            .await
            .expect("Own slug should be accepted");
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.update(999, UpdateCategoryInput::default()).await;
        assert!(matches!(result, Err(CategoryServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_unused_category() {
        let (_pool, service) = setup_test_service().await;

        let created = service.create(input("Gone", "Mất", "Parti")).await.unwrap();
        service.delete(created.id).await.expect("Failed to delete");

        assert!(service.get_by_id(created.id).await.unwrap().is_none());

        let result = service.delete(created.id).await;
        assert!(matches!(result, Err(CategoryServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_category_in_use_fails() {
        let (pool, service) = setup_test_service().await;

        let category = service.create(input("Busy", "Bận", "Occupé")).await.unwrap();

        let author_id = sqlx::query(
            "INSERT INTO users (email, password_hash, is_admin) VALUES ('a@example.com', 'h', 0)",
        )
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();
        let post_id = sqlx::query(
            "INSERT INTO posts (title_en, title_vi, title_fr, slug, state, author_id, \
             excerpt_en, excerpt_vi, excerpt_fr) \
             VALUES ('t', 't', 't', 'p', 'draft', ?, 'e', 'e', 'e')",
        )
        .bind(author_id)
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();
        sqlx::query("INSERT INTO post_categories (post_id, category_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(category.id)
            .execute(&pool)
            .await
            .unwrap();

        let result = service.delete(category.id).await;
        assert!(matches!(
            result,
            Err(CategoryServiceError::InUse { posts: 1, .. })
        ));

        // Still there
        assert!(service.get_by_id(category.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_by_slug_and_list() {
        let (_pool, service) = setup_test_service().await;

        service.create(input("Bravo", "B", "B")).await.unwrap();
        service.create(input("Alpha", "A", "A")).await.unwrap();

        let found = service
            .get_by_slug("alpha")
            .await
            .expect("Failed to get by slug")
            .expect("Category not found");
        assert_eq!(found.name.en, "Alpha");

        let all = service.list().await.expect("Failed to list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name.en, "Alpha");
        assert_eq!(all[1].name.en, "Bravo");
    }
}
