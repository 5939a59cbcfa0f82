//! # SVN Manager
//!
//! Creates, archives and grants access to Subversion repositories served by
//! Apache through `mod_dav_svn`. Usable both as a standalone HTTP service and
//! as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! svnman = { version = "0.2", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use svnman::apache::{ApacheCtl, RestartCoordinator};
//! use svnman::manager::SvnMan;
//! use svnman::server::{AppState, create_router};
//! use svnman::store::{RepoPaths, RepoStore, StoreOptions, SvnAdmin};
//!
//! let ctl = ApacheCtl::new(vec!["apache2ctl".into()], Duration::from_secs(10))?;
//! let restarter = RestartCoordinator::new(Arc::new(ctl), Duration::from_secs(5)).await?;
//! let store = RepoStore::new(
//!     RepoPaths::new("/media/data/svn", "/etc/apache2/svn"),
//!     Arc::new(SvnAdmin::default()),
//!     Arc::new(restarter),
//!     StoreOptions::default(),
//! );
//! let router = create_router(Arc::new(AppState::new(Arc::new(SvnMan::new(store)))));
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `svnman` binary. Disable with `default-features = false`.

pub mod apache;
pub mod config;
pub mod error;
pub mod manager;
pub mod process;
pub mod server;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub const APP_NAME: &str = "SVN Manager";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
