//! Post service
//!
//! Business logic for posts: slug derivation from the English title with
//! collision suffixes, referential checks for author and categories, and
//! the thumbnail lifecycle. A replaced or orphaned thumbnail file is
//! removed from disk only after the database write has committed, and
//! removal failures never fail the operation.

use crate::db::repositories::{CategoryRepository, PostFilter, PostRepository, UserRepository};
use crate::models::{CreatePostInput, ListParams, PagedResult, Post, UpdatePostInput};
use crate::services::files::FileStore;
use crate::services::slug::{generate_slug, slug_candidate};
use anyhow::Context;
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Post not found
    #[error("Post not found")]
    NotFound,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Slug already in use
    #[error("Slug '{0}' is already in use")]
    DuplicateSlug(String),

    /// Referenced author does not exist
    #[error("Author {0} does not exist")]
    UnknownAuthor(i64),

    /// Referenced category does not exist
    #[error("Category {0} does not exist")]
    UnknownCategory(i64),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    user_repo: Arc<dyn UserRepository>,
    files: Arc<FileStore>,
}

impl PostService {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        user_repo: Arc<dyn UserRepository>,
        files: Arc<FileStore>,
    ) -> Self {
        Self {
            repo,
            category_repo,
            user_repo,
            files,
        }
    }

    /// Create a new post.
    ///
    /// The author defaults to the caller at the API layer, so by the time
    /// input reaches here it must carry one. An omitted slug is derived
    /// from the English title and suffixed until unique; an explicit slug
    /// that collides is an error.
    pub async fn create(&self, input: CreatePostInput) -> Result<Post, PostServiceError> {
        let author_id = input
            .author_id
            .ok_or_else(|| PostServiceError::ValidationError("Author is required".to_string()))?;
        self.check_author(author_id).await?;

        if input.category_ids.is_empty() {
            return Err(PostServiceError::ValidationError(
                "At least one category is required".to_string(),
            ));
        }
        self.check_categories(&input.category_ids).await?;

        let slug = match input.slug {
            Some(slug) => {
                if self
                    .repo
                    .exists_by_slug(&slug)
                    .await
                    .context("Failed to check slug uniqueness")?
                {
                    return Err(PostServiceError::DuplicateSlug(slug));
                }
                slug
            }
            None => self.unique_slug(&generate_slug(&input.title.en)).await?,
        };

        let mut post = Post::new(input.title, slug, author_id, input.excerpt);
        post.content = input.content;
        post.category_ids = input.category_ids;
        post.thumbnail = input.thumbnail;
        if let Some(state) = input.state {
            post.state = state;
        }

        let created = self
            .repo
            .create(&post)
            .await
            .context("Failed to create post")?;

        tracing::info!("Created post {} ({})", created.id, created.slug);
        Ok(created)
    }

    /// Get post by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>, PostServiceError> {
        let post = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?;
        Ok(post)
    }

    /// Get post by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, PostServiceError> {
        let post = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get post by slug")?;
        Ok(post)
    }

    /// List posts matching the filter
    pub async fn list(
        &self,
        filter: &PostFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let result = self
            .repo
            .list(filter, params)
            .await
            .context("Failed to list posts")?;
        Ok(result)
    }

    /// Update a post.
    ///
    /// Absent fields keep their current values. When the update replaces
    /// the thumbnail, the previous file is deleted from disk after the
    /// row is written.
    pub async fn update(&self, id: i64, input: UpdatePostInput) -> Result<Post, PostServiceError> {
        let mut post = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or(PostServiceError::NotFound)?;

        let old_thumbnail = post.thumbnail.clone();

        if let Some(author_id) = input.author_id {
            if author_id != post.author_id {
                self.check_author(author_id).await?;
                post.author_id = author_id;
            }
        }
        if let Some(category_ids) = input.category_ids {
            if category_ids.is_empty() {
                return Err(PostServiceError::ValidationError(
                    "At least one category is required".to_string(),
                ));
            }
            self.check_categories(&category_ids).await?;
            post.category_ids = category_ids;
        }
        if let Some(slug) = input.slug {
            if slug != post.slug {
                let taken = self
                    .repo
                    .get_by_slug(&slug)
                    .await
                    .context("Failed to check slug uniqueness")?
                    .map(|other| other.id != id)
                    .unwrap_or(false);
                if taken {
                    return Err(PostServiceError::DuplicateSlug(slug));
                }
                post.slug = slug;
            }
        }
        if let Some(title) = input.title {
            post.title = title;
        }
        if let Some(excerpt) = input.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(content) = input.content {
            post.content = content;
        }
        if let Some(state) = input.state {
            post.state = state;
        }
        if let Some(thumbnail) = input.thumbnail {
            post.thumbnail = Some(thumbnail);
        }

        let updated = self
            .repo
            .update(&post)
            .await
            .context("Failed to update post")?;

        // The row is committed; now it is safe to drop the old file.
        if let Some(ref old) = old_thumbnail {
            if updated.thumbnail.as_deref() != Some(old.as_str()) {
                self.files.delete(old).await;
            }
        }

        Ok(updated)
    }

    /// Delete a post and its thumbnail file.
    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        let post = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or(PostServiceError::NotFound)?;

        self.repo
            .delete(id)
            .await
            .context("Failed to delete post")?;

        if let Some(ref thumbnail) = post.thumbnail {
            self.files.delete(thumbnail).await;
        }

        tracing::info!("Deleted post {} ({})", id, post.slug);
        Ok(())
    }

    async fn check_author(&self, author_id: i64) -> Result<(), PostServiceError> {
        if self
            .user_repo
            .get_by_id(author_id)
            .await
            .context("Failed to check author")?
            .is_none()
        {
            return Err(PostServiceError::UnknownAuthor(author_id));
        }
        Ok(())
    }

    async fn check_categories(&self, category_ids: &[i64]) -> Result<(), PostServiceError> {
        for &category_id in category_ids {
            if self
                .category_repo
                .get_by_id(category_id)
                .await
                .context("Failed to check category")?
                .is_none()
            {
                return Err(PostServiceError::UnknownCategory(category_id));
            }
        }
        Ok(())
    }

    /// First free slug: the base itself, then `base-2`, `base-3`, ...
    async fn unique_slug(&self, base: &str) -> Result<String, PostServiceError> {
        let base = if base.is_empty() { "post" } else { base };
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
    use crate::config::UploadConfig;
    use crate::db::repositories::{
        SqlxCategoryRepository, SqlxPostRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, run_migrations};
    use crate::models::{Localized, PublishState};
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    struct TestEnv {
        pool: SqlitePool,
        service: PostService,
        // Keeps the upload directory alive for the duration of the test
        upload_dir: TempDir,
    }

    async fn setup() -> TestEnv {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let upload_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let files = Arc::new(FileStore::new(UploadConfig {
            path: upload_dir.path().to_path_buf(),
            ..UploadConfig::default()
        }));

        let service = PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool.clone()),
            files,
        );

        TestEnv {
            pool,
            service,
            upload_dir,
        }
    }

    async fn create_author(pool: &SqlitePool, email: &str) -> i64 {
        sqlx::query("INSERT INTO users (email, password_hash, is_admin) VALUES (?, 'hash', 0)")
            .bind(email)
            .execute(pool)
            .await
            .expect("Failed to create author")
            .last_insert_rowid()
    }

    async fn create_category(pool: &SqlitePool, slug: &str) -> i64 {
        sqlx::query("INSERT INTO categories (name_en, name_vi, name_fr, slug) VALUES ('n', 'n', 'n', ?)")
            .bind(slug)
            .execute(pool)
            .await
            .expect("Failed to create category")
            .last_insert_rowid()
    }

    fn base_input(author_id: Option<i64>, category_ids: Vec<i64>) -> CreatePostInput {
        CreatePostInput {
            title: Localized::new(
                "Hello World".to_string(),
                "Xin chào".to_string(),
                "Bonjour".to_string(),
            ),
            excerpt: Localized::from("Excerpt"),
            content: Localized::default(),
            slug: None,
            author_id,
            category_ids,
            state: None,
            thumbnail: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_and_dedupes_slug() {
        let env = setup().await;
        let author = create_author(&env.pool, "a@example.com").await;
        let cat = create_category(&env.pool, "c").await;

        let first = env
            .service
            .create(base_input(Some(author), vec![cat]))
            .await
            .expect("Failed to create first post");
        assert_eq!(first.slug, "hello-world");

        let second = env
            .service
            .create(base_input(Some(author), vec![cat]))
            .await
            .expect("Failed to create second post");
        assert_eq!(second.slug, "hello-world-2");

        let third = env
            .service
            .create(base_input(Some(author), vec![cat]))
            .await
            .expect("Failed to create third post");
        assert_eq!(third.slug, "hello-world-3");
    }

    #[tokio::test]
    async fn test_create_explicit_slug_collision() {
        let env = setup().await;
        let author = create_author(&env.pool, "a@example.com").await;
        let cat = create_category(&env.pool, "c").await;

        let mut input = base_input(Some(author), vec![cat]);
        input.slug = Some("fixed".to_string());
        env.service.create(input).await.expect("First create should work");

        let mut input = base_input(Some(author), vec![cat]);
        input.slug = Some("fixed".to_string());
        let result = env.service.create(input).await;

        assert!(matches!(result, Err(PostServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_missing_references() {
        let env = setup().await;
        let author = create_author(&env.pool, "a@example.com").await;
        let cat = create_category(&env.pool, "c").await;

        let result = env.service.create(base_input(None, vec![cat])).await;
        assert!(matches!(result, Err(PostServiceError::ValidationError(_))));

        let result = env.service.create(base_input(Some(999), vec![cat])).await;
        assert!(matches!(result, Err(PostServiceError::UnknownAuthor(999))));

        let result = env.service.create(base_input(Some(author), vec![])).await;
        assert!(matches!(result, Err(PostServiceError::ValidationError(_))));

        let result = env.service.create(base_input(Some(author), vec![cat, 888])).await;
        assert!(matches!(result, Err(PostServiceError::UnknownCategory(888))));
    }

    #[tokio::test]
    async fn test_update_merges_and_checks_slug() {
        let env = setup().await;
        let author = create_author(&env.pool, "a@example.com").await;
        let cat = create_category(&env.pool, "c").await;
        let other_cat = create_category(&env.pool, "d").await;

        let post = env
            .service
            .create(base_input(Some(author), vec![cat]))
            .await
            .unwrap();
        let other = env
            .service
            .create(base_input(Some(author), vec![cat]))
            .await
            .unwrap();

        let updated = env
            .service
            .update(
                post.id,
                UpdatePostInput {
                    state: Some(PublishState::Published),
                    category_ids: Some(vec![other_cat]),
                    ..Default::default()
                },
            )
            .await
            .expect("Update failed");
        assert_eq!(updated.state, PublishState::Published);
        assert_eq!(updated.category_ids, vec![other_cat]);
        // Untouched fields survive
        assert_eq!(updated.slug, "hello-world");
        assert_eq!(updated.title.vi, "Xin chào");

        // Taking another post's slug is rejected
        let result = env
            .service
            .update(
                post.id,
                UpdatePostInput {
                    slug: Some(other.slug.clone()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(PostServiceError::DuplicateSlug(_))));

        // Re-submitting its own slug is fine
        env.service
            .update(
                post.id,
                UpdatePostInput {
                    slug: Some("hello-world".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("Own slug should be accepted");
    }

    #[tokio::test]
    async fn test_update_replaces_thumbnail_file() {
        let env = setup().await;
        let author = create_author(&env.pool, "a@example.com").await;
        let cat = create_category(&env.pool, "c").await;

        let old_path = env.upload_dir.path().join("old.png");
        std::fs::write(&old_path, b"old").unwrap();

        let mut input = base_input(Some(author), vec![cat]);
        input.thumbnail = Some("old.png".to_string());
        let post = env.service.create(input).await.unwrap();

        let updated = env
            .service
            .update(
                post.id,
                UpdatePostInput {
                    thumbnail: Some("new.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("Update failed");

        assert_eq!(updated.thumbnail.as_deref(), Some("new.png"));
        assert!(!old_path.exists(), "Replaced thumbnail file should be deleted");
    }

    #[tokio::test]
    async fn test_update_without_thumbnail_keeps_file() {
        let env = setup().await;
        let author = create_author(&env.pool, "a@example.com").await;
        let cat = create_category(&env.pool, "c").await;

        let path = env.upload_dir.path().join("keep.png");
        std::fs::write(&path, b"keep").unwrap();

        let mut input = base_input(Some(author), vec![cat]);
        input.thumbnail = Some("keep.png".to_string());
        let post = env.service.create(input).await.unwrap();

        let updated = env
            .service
            .update(
                post.id,
                UpdatePostInput {
                    state: Some(PublishState::Published),
                    ..Default::default()
                },
            )
            .await
            .expect("Update failed");

        assert_eq!(updated.thumbnail.as_deref(), Some("keep.png"));
        assert!(path.exists(), "Untouched thumbnail file must survive");
    }

    #[tokio::test]
    async fn test_update_missing_thumbnail_file_is_tolerated() {
        let env = setup().await;
        let author = create_author(&env.pool, "a@example.com").await;
        let cat = create_category(&env.pool, "c").await;

        // Thumbnail recorded in the database but absent on disk
        let mut input = base_input(Some(author), vec![cat]);
        input.thumbnail = Some("ghost.png".to_string());
        let post = env.service.create(input).await.unwrap();

        env.service
            .update(
                post.id,
                UpdatePostInput {
                    thumbnail: Some("real.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("Missing old file must not fail the update");
    }

    #[tokio::test]
    async fn test_delete_removes_thumbnail_file() {
        let env = setup().await;
        let author = create_author(&env.pool, "a@example.com").await;
        let cat = create_category(&env.pool, "c").await;

        let path = env.upload_dir.path().join("gone.png");
        std::fs::write(&path, b"bye").unwrap();

        let mut input = base_input(Some(author), vec![cat]);
        input.thumbnail = Some("gone.png".to_string());
        let post = env.service.create(input).await.unwrap();

        env.service.delete(post.id).await.expect("Delete failed");

        assert!(env.service.get_by_id(post.id).await.unwrap().is_none());
        assert!(!path.exists(), "Thumbnail file should be deleted with the post");

        let result = env.service.delete(post.id).await;
        assert!(matches!(result, Err(PostServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_passes_filter_through() {
        let env = setup().await;
        let author = create_author(&env.pool, "a@example.com").await;
        let cat = create_category(&env.pool, "c").await;

        let mut input = base_input(Some(author), vec![cat]);
        input.state = Some(PublishState::Published);
        env.service.create(input).await.unwrap();
        env.service.create(base_input(Some(author), vec![cat])).await.unwrap();

        let filter = PostFilter {
            state: Some(PublishState::Published),
            ..Default::default()
        };
        let page = env
            .service
            .list(&filter, &ListParams::default())
            .await
            .expect("List failed");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].state, PublishState::Published);
    }
}
