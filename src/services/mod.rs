//! Services layer - Business logic
//!
//! This module contains all business logic services for the Triptych CMS.
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories and the file store
//! - Handling validation and error cases
//!
//! Access control is not applied here. Handlers consult the policy table
//! and narrow calls with owner filters before they reach a service.

pub mod category;
pub mod files;
pub mod menu;
pub mod page;
pub mod password;
pub mod post;
pub mod slug;
pub mod user;

pub use category::{CategoryService, CategoryServiceError};
pub use files::{FileStore, FileStoreError, StoredFile};
pub use menu::{MenuService, MenuServiceError};
pub use page::{PageService, PageServiceError};
pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError};
pub use slug::{generate_slug, slug_candidate};
pub use user::{UserService, UserServiceError};
