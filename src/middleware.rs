//! Views middleware and render orchestration.
//!
//! [`ViewsMiddleware`] installs a [`ViewRenderer`] into each request's
//! extensions; downstream handlers pull it out by type and call
//! [`ViewRenderer::render`] once per request. The renderer chains the
//! path resolver, the engine dispatcher and the context merger strictly
//! in sequence, then places the output according to the `auto_render`
//! configuration flag.
//!
//! ```no_run
//! use belvedere::ViewRenderer;
//! use belvedere::http::{Handler, Request, Response};
//! use async_trait::async_trait;
//! use serde_json::{Map, json};
//!
//! struct Profile;
//!
//! #[async_trait]
//! impl Handler for Profile {
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
//! ```

use crate::context::{build_context, is_truthy};
use crate::engine::{Dispatch, EngineRegistry, select_engine};
use crate::error::Result;
use crate::http::{Handler, Middleware, Request, RequestState, Response};
use crate::paths::resolve_view;
use crate::static_files::{FsStaticSender, StaticSender};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Pure HTML post-processor applied when a render's `pretty` local is set
pub type Prettifier = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Configuration for the views middleware
///
/// Created once at setup and shared read-only across all invocations.
#[derive(Clone)]
pub struct ViewsConfig {
	auto_render: bool,
	extension: String,
	options: Map<String, Value>,
	map: Option<HashMap<String, String>>,
	prettifier: Option<Prettifier>,
}

impl ViewsConfig {
	/// Create a configuration with defaults: `auto_render = true`,
	/// default extension `html`, no options, no remap table
	pub fn new() -> Self {
		Self {
			auto_render: true,
			extension: "html".to_string(),
			options: Map::new(),
			map: None,
			prettifier: None,
		}
	}

	/// Whether rendered output is placed into the response automatically
	pub fn auto_render(mut self, auto_render: bool) -> Self {
		self.auto_render = auto_render;
		self
	}

	/// Default file extension for view names that carry none
	pub fn extension(mut self, extension: impl Into<String>) -> Self {
		self.extension = extension.into();
		self
	}

	/// Configuration-level extras merged into every data context
	///
	/// An `options["partials"]` object is copied (never shared) into each
	/// invocation's context under the same key.
	pub fn options(mut self, options: Map<String, Value>) -> Self {
		self.options = options;
		self
	}

	/// Set a single configuration-level option
	pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
		self.options.insert(key.into(), value);
		self
	}

	/// Extension→engine-name remap table
	///
	/// Configuring a table (even an empty one) disables the static `html`
	/// bypass: every extension goes through engine dispatch.
	pub fn map(mut self, map: HashMap<String, String>) -> Self {
		self.map = Some(map);
		self
	}

	/// Remap a single extension to an engine name
	pub fn map_extension(mut self, ext: impl Into<String>, engine: impl Into<String>) -> Self {
		self.map
			.get_or_insert_with(HashMap::new)
			.insert(ext.into(), engine.into());
		self
	}

	/// Install the HTML pretty-printer collaborator
	pub fn prettifier(mut self, prettifier: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
		self.prettifier = Some(Arc::new(prettifier));
		self
	}
}

impl Default for ViewsConfig {
	fn default() -> Self {
		Self::new()
	}
}

/// Middleware that installs a per-request [`ViewRenderer`]
///
/// Installation is idempotent: if a renderer is already present on the
/// request (an earlier instance installed one), the middleware is a plain
/// passthrough to the next pipeline stage.
pub struct ViewsMiddleware {
	base_dir: PathBuf,
	config: ViewsConfig,
	engines: Arc<EngineRegistry>,
	static_sender: Arc<dyn StaticSender>,
}

impl ViewsMiddleware {
	/// Create a views middleware serving templates from `base_dir` with
	/// the default configuration and the bundled engine registry
	pub fn new(base_dir: impl Into<PathBuf>) -> Self {
		Self::with_config(base_dir, ViewsConfig::new())
	}

	/// Create a views middleware with an explicit configuration
	pub fn with_config(base_dir: impl Into<PathBuf>, config: ViewsConfig) -> Self {
		Self {
			base_dir: base_dir.into(),
			config,
			engines: Arc::new(EngineRegistry::with_defaults()),
			static_sender: Arc::new(FsStaticSender::new()),
		}
	}

	/// Replace the engine registry (builder style)
	pub fn engines(mut self, engines: EngineRegistry) -> Self {
		self.engines = Arc::new(engines);
		self
	}

	/// Replace the static-file sender collaborator (builder style)
	pub fn static_sender(mut self, sender: impl StaticSender + 'static) -> Self {
		self.static_sender = Arc::new(sender);
		self
	}

	/// Build the renderer value this middleware installs
	///
	/// Exposed so hosts that construct per-request scopes themselves can
	/// install the capability without running the middleware chain.
	pub fn renderer_for(&self, request: &Request) -> ViewRenderer {
		ViewRenderer {
			inner: Arc::new(RendererInner {
				base_dir: self.base_dir.clone(),
				config: self.config.clone(),
				engines: Arc::clone(&self.engines),
				static_sender: Arc::clone(&self.static_sender),
				state: request.state(),
				response: Mutex::new(Response::ok()),
			}),
		}
	}
}

#[async_trait]
impl Middleware for ViewsMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		if !request.extensions().contains::<ViewRenderer>() {
			request.extensions().insert(self.renderer_for(&request));
		}
		next.handle(request).await
	}
}

/// Outcome of a successful render call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
	/// `auto_render` placed the output into the renderer's response;
	/// fetch it with [`ViewRenderer::take_response`]
	Completed,
	/// `auto_render` is off; the HTML is returned to the caller and the
	/// response body is untouched
	Html(String),
}

impl Rendered {
	/// The rendered HTML, when placement was left to the caller
	pub fn into_html(self) -> Option<String> {
		match self {
			Rendered::Completed => None,
			Rendered::Html(html) => Some(html),
		}
	}
}

struct RendererInner {
	base_dir: PathBuf,
	config: ViewsConfig,
	engines: Arc<EngineRegistry>,
	static_sender: Arc<dyn StaticSender>,
	state: RequestState,
	response: Mutex<Response>,
}

/// Per-request render capability
///
/// Cloneable handle around one request's renderer; installed into the
/// request's extensions by [`ViewsMiddleware`]. Owns the response under
/// construction for the request, which the handler collects with
/// [`take_response`](Self::take_response) after rendering.
#[derive(Clone)]
pub struct ViewRenderer {
	inner: Arc<RendererInner>,
}

impl ViewRenderer {
	/// Render a view with per-call locals
	///
	/// Sequential steps, no internal retries:
	/// 1. resolve the view file (extension inference, existence check)
	/// 2. merge locals, configured options and a snapshot of the request
	///    state into a fresh data context, with an isolated partials copy
	/// 3. set the response content type to HTML (unconditionally, before
	///    any output exists)
	/// 4. dispatch: static passthrough for plain `html`, otherwise the
	///    engine selected for the resolved extension
	/// 5. when the caller's `pretty` local is truthy and a prettifier is
	///    configured, post-process the HTML through it
	/// 6. place the output per `auto_render`
	///
	/// # Errors
	///
	/// Resolution, dispatch and engine failures are propagated unchanged;
	/// all are terminal for this invocation.
	pub async fn render(&self, view: &str, locals: Map<String, Value>) -> Result<Rendered> {
		let inner = &self.inner;
		let resolved = resolve_view(&inner.base_dir, view, &inner.config.extension).await?;

		let state = {
			let state = inner.state.lock().unwrap_or_else(|e| e.into_inner());
			state.clone()
		};
		let context = build_context(&locals, &inner.config.options, &state);
		debug!(view = %resolved.rel.display(), keys = context.len(), "rendering view");

		// Observable regardless of what dispatch does next
		self.set_content_type();

		let dispatch = select_engine(&resolved.ext, inner.config.map.as_ref(), &inner.engines)?;
		let html = match dispatch {
			Dispatch::Static => {
				let sent = inner
					.static_sender
					.send(&resolved.rel, &inner.base_dir)
					.await?;
				self.absorb_static(sent);
				return Ok(Rendered::Completed);
			}
			Dispatch::Render(engine) => {
				let absolute = resolved.absolute(&inner.base_dir);
				engine.render(&absolute, &Value::Object(context)).await?
			}
		};

		let html = if is_truthy(locals.get("pretty")) {
			match &inner.config.prettifier {
				Some(prettify) => {
					debug!("prettifying rendered html");
					prettify(&html)
				}
				None => html,
			}
		} else {
			html
		};

		if inner.config.auto_render {
			let mut response = inner.response.lock().unwrap_or_else(|e| e.into_inner());
			response.body = html.into();
			Ok(Rendered::Completed)
		} else {
			Ok(Rendered::Html(html))
		}
	}

	/// Take the response built by this renderer, leaving a fresh 200 in
	/// its place
	pub fn take_response(&self) -> Response {
		let mut response = self.inner.response.lock().unwrap_or_else(|e| e.into_inner());
		std::mem::take(&mut *response)
	}

	/// Peek at the response under construction
	pub fn response(&self) -> Response {
		self.inner
			.response
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.clone()
	}

	fn set_content_type(&self) {
		let mut response = self.inner.response.lock().unwrap_or_else(|e| e.into_inner());
		response.set_header("content-type", "text/html; charset=utf-8");
	}

	/// Fold a static sender's response into the one under construction,
	/// keeping headers set earlier (content type included) unless the
	/// sender overrides them
	fn absorb_static(&self, sent: Response) {
		let mut response = self.inner.response.lock().unwrap_or_else(|e| e.into_inner());
		response.status = sent.status;
		response.body = sent.body;
		for (name, value) in sent.headers.iter() {
			response.headers.insert(name.clone(), value.clone());
		}
	}
}
