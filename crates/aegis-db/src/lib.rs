//! Aegis DB - Identity and session store abstractions
//!
//! SQLx-based persistence layer for the Aegis identity service. Business
//! logic depends only on the repository traits in [`repo`]; the Postgres
//! implementations live in [`pg`].
//!
//! # Example
//!
//! ```rust,ignore
//! use aegis_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/aegis").await?;
//! let repos = Repositories::new(pool);
//!
//! let user = repos
//!     .users
//!     .find_by_email("user@example.com", DeletedFilter::ActiveOnly)
//!     .await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
