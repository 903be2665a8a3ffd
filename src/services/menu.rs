//! Menu service

use crate::db::repositories::MenuRepository;
use crate::models::{CreateMenuInput, Menu, UpdateMenuInput};
use anyhow::Context;
use std::sync::Arc;

/// Error types for menu service operations
#[derive(Debug, thiserror::Error)]
pub enum MenuServiceError {
    /// Menu not found
    #[error("Menu not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Menu service
pub struct MenuService {
    repo: Arc<dyn MenuRepository>,
}

impl MenuService {
    pub fn new(repo: Arc<dyn MenuRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: CreateMenuInput) -> Result<Menu, MenuServiceError> {
        let menu = Menu::new(input.body);
        let created = self
            .repo
            .create(&menu)
            .await
            .context("Failed to create menu")?;
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Menu>, MenuServiceError> {
        let menu = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get menu")?;
        Ok(menu)
    }

    pub async fn list(&self) -> Result<Vec<Menu>, MenuServiceError> {
        let menus = self.repo.list().await.context("Failed to list menus")?;
        Ok(menus)
    }

    pub async fn update(&self, id: i64, input: UpdateMenuInput) -> Result<Menu, MenuServiceError> {
        let mut menu = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get menu")?
            .ok_or(MenuServiceError::NotFound)?;

        if let Some(body) = input.body {
            menu.body = body;
        }

        let updated = self
            .repo
            .update(&menu)
            .await
            .context("Failed to update menu")?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), MenuServiceError> {
        if self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get menu")?
            .is_none()
        {
            return Err(MenuServiceError::NotFound);
        }
        self.repo.delete(id).await.context("Failed to delete menu")?;
        Ok(())
    }
}
