//! # Belvedere
//!
//! View-rendering middleware for async HTTP pipelines.
//!
//! Given a base directory of template files and a relative view name,
//! belvedere resolves the concrete file, selects a rendering engine by
//! file extension, merges per-request and global data into one template
//! context, and produces the HTML response body. Handlers call a single
//! render operation without knowing which engine backs a given extension.
//!
//! ## How a render flows
//!
//! 1. **Path resolution** ([`paths`]): `"profile"` with default extension
//!    `html` targets `profile.html`; `"profile.pug"` keeps its own
//!    extension. Directories fall back to their `index` file.
//! 2. **Engine dispatch** ([`engine`]): plain `html` files (with no remap
//!    table configured) are sent as static files; anything else selects a
//!    registered [`Engine`](engine::Engine) by extension, remappable via
//!    [`ViewsConfig::map`].
//! 3. **Context merge** ([`context`]): per-call locals, configured
//!    options and ambient request state merge into a fresh context
//!    (later sources win), with an isolated copy of the configured
//!    partials.
//! 4. **Placement** ([`middleware`]): with `auto_render` (the default)
//!    the HTML becomes the response body; otherwise it is returned to
//!    the caller.
//!
//! ## Quick start
//!
//! ```no_run
//! use belvedere::{ViewsMiddleware, ViewRenderer};
//! use belvedere::http::{Handler, Middleware, Request, Response};
//! use async_trait::async_trait;
//! use serde_json::{Map, json};
//! use std::sync::Arc;
//!
//! struct ProfileHandler;
//!
//! #[async_trait]
//! impl Handler for ProfileHandler {
//!     async fn handle(&self, request: Request) -> belvedere::Result<Response> {
//!         let renderer = request
//!             .extensions()
//!             .get::<ViewRenderer>()
//!             .ok_or_else(|| belvedere::ViewsError::Engine("views not installed".into()))?;
//!         let mut locals = Map::new();
//!         locals.insert("user".to_string(), json!("tobi"));
//!         renderer.render("profile", locals).await?;
//!         Ok(renderer.take_response())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let views = ViewsMiddleware::new("./views");
//! let _response = views
//!     .process(Request::get("/profile"), Arc::new(ProfileHandler))
//!     .await?;
//! # Ok::<_, belvedere::ViewsError>(())
//! # });
//! ```
//!
//! ## Module structure
//!
//! - [`paths`] - view name → on-disk file resolution
//! - [`engine`] - engine trait, registry and dispatch
//! - [`context`] - data context construction
//! - [`middleware`] - configuration, installation and orchestration
//! - [`static_files`] - static HTML passthrough collaborator
//! - [`http`] - the pipeline seam (request/response/middleware traits)
//! - [`error`] - error types

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod context;
pub mod engine;
pub mod error;
pub mod http;
pub mod middleware;
pub mod paths;
pub mod static_files;

pub use engine::{Engine, EngineRegistry};
pub use error::{Result, ViewsError};
pub use middleware::{Prettifier, Rendered, ViewRenderer, ViewsConfig, ViewsMiddleware};
pub use paths::ResolvedView;
pub use static_files::{FsStaticSender, StaticSender};

#[cfg(feature = "tera")]
pub use engine::TeraEngine;
