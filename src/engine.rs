//! Rendering engines and engine dispatch.
//!
//! An [`Engine`] is a black box that turns a template file plus a data
//! context into an HTML string. Engines live in an [`EngineRegistry`]
//! keyed by name; [`select_engine`] decides, from a resolved extension and
//! an optional extension→engine remap table, whether a request is served
//! as static HTML or through a registered engine.

use crate::error::{Result, ViewsError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A named rendering function: compiles/executes a template file against
/// a data context and produces HTML
#[async_trait]
pub trait Engine: Send + Sync {
	/// Render the template at `template` with the given context
	///
	/// # Errors
	///
	/// Engine failures (syntax errors, missing variables) surface as
	/// errors and are propagated to the caller unmodified.
	async fn render(&self, template: &Path, context: &Value) -> Result<String>;
}

/// Registry of rendering engines, keyed by engine name
///
/// Shared read-only across all render invocations; engines are registered
/// at setup time and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use belvedere::engine::{Engine, EngineRegistry};
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use std::path::Path;
///
/// struct Upper;
///
/// #[async_trait]
/// impl Engine for Upper {
///     async fn render(&self, _template: &Path, _context: &Value) -> belvedere::Result<String> {
///         Ok("HTML".to_string())
///     }
/// }
///
/// let registry = EngineRegistry::new().register("upper", Upper);
/// assert!(registry.get("upper").is_some());
/// ```
#[derive(Clone, Default)]
pub struct EngineRegistry {
	engines: HashMap<String, Arc<dyn Engine>>,
}

impl EngineRegistry {
	/// Create an empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a registry pre-populated with the bundled engines
	///
	/// With the `tera` feature (on by default) this registers
	/// [`TeraEngine`] under the name `"tera"`.
	pub fn with_defaults() -> Self {
		let registry = Self::new();
		#[cfg(feature = "tera")]
		let registry = registry.register("tera", TeraEngine::new());
		registry
	}

	/// Register an engine under a name (builder style)
	pub fn register(mut self, name: impl Into<String>, engine: impl Engine + 'static) -> Self {
		self.engines.insert(name.into(), Arc::new(engine));
		self
	}

	/// Look up an engine by name
	pub fn get(&self, name: &str) -> Option<Arc<dyn Engine>> {
		self.engines.get(name).cloned()
	}

	/// Whether the registry has no engines
	pub fn is_empty(&self) -> bool {
		self.engines.is_empty()
	}
}

/// Outcome of engine dispatch for one resolved view
#[derive(Clone)]
pub enum Dispatch {
	/// Serve the file as-is, bypassing all templating
	Static,
	/// Render through the selected engine
	Render(Arc<dyn Engine>),
}

impl std::fmt::Debug for Dispatch {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Dispatch::Static => f.write_str("Static"),
			Dispatch::Render(_) => f.write_str("Render(..)"),
		}
	}
}

/// Decide how to produce output for a resolved extension
///
/// A plain `html` file with no remap table configured bypasses templating
/// entirely. Otherwise the extension (after the optional remap) names the
/// engine; a missing or empty name is an explicit error carrying the
/// extension that failed.
///
/// # Errors
///
/// Returns [`ViewsError::EngineNotFound`] when no engine is registered
/// for the resolved extension.
pub fn select_engine(
	ext: &str,
	map: Option<&HashMap<String, String>>,
	registry: &EngineRegistry,
) -> Result<Dispatch> {
	if ext == "html" && map.is_none() {
		debug!(ext, "static html bypass");
		return Ok(Dispatch::Static);
	}

	let engine_name = map
		.and_then(|m| m.get(ext))
		.map(String::as_str)
		.unwrap_or(ext);

	if engine_name.is_empty() {
		return Err(ViewsError::EngineNotFound {
			extension: ext.to_string(),
		});
	}

	match registry.get(engine_name) {
		Some(engine) => {
			debug!(ext, engine = engine_name, "selected engine");
			Ok(Dispatch::Render(engine))
		}
		None => Err(ViewsError::EngineNotFound {
			extension: ext.to_string(),
		}),
	}
}

/// Tera-backed engine
///
/// Reads the template file and renders it one-off against the JSON data
/// context. Partials are visible to the template as the `partials` value
/// of the context, like every other merged key.
#[cfg(feature = "tera")]
#[derive(Debug, Default)]
pub struct TeraEngine;

#[cfg(feature = "tera")]
impl TeraEngine {
	/// Create a new Tera engine
	pub fn new() -> Self {
		Self
	}
}

#[cfg(feature = "tera")]
#[async_trait]
impl Engine for TeraEngine {
	async fn render(&self, template: &Path, context: &Value) -> Result<String> {
		let source = tokio::fs::read_to_string(template).await?;
		let context = tera::Context::from_value(context.clone())
			.map_err(|e| ViewsError::Engine(e.to_string()))?;
		tera::Tera::one_off(&source, &context, true).map_err(|e| ViewsError::Engine(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct NullEngine;

	#[async_trait]
	impl Engine for NullEngine {
		async fn render(&self, _template: &Path, _context: &Value) -> Result<String> {
			Ok(String::new())
		}
	}

	fn remap(from: &str, to: &str) -> HashMap<String, String> {
		HashMap::from([(from.to_string(), to.to_string())])
	}

	#[test]
	fn html_without_map_is_static() {
		let registry = EngineRegistry::new();
		assert!(matches!(
			select_engine("html", None, &registry).unwrap(),
			Dispatch::Static
		));
	}

	#[test]
	fn html_with_map_goes_through_registry() {
		let registry = EngineRegistry::new().register("swig", NullEngine);
		let map = remap("html", "swig");
		assert!(matches!(
			select_engine("html", Some(&map), &registry).unwrap(),
			Dispatch::Render(_)
		));
	}

	#[test]
	fn extension_names_the_engine_directly() {
		let registry = EngineRegistry::new().register("pug", NullEngine);
		assert!(matches!(
			select_engine("pug", None, &registry).unwrap(),
			Dispatch::Render(_)
		));
	}

	#[test]
	fn unknown_extension_carries_contract_message() {
		let registry = EngineRegistry::new();
		let err = select_engine("xyz", None, &registry).unwrap_err();
		assert_eq!(
			err.to_string(),
			"Engine not found for the \".xyz\" file extension"
		);
	}

	#[test]
	fn empty_remap_target_is_engine_not_found() {
		let registry = EngineRegistry::new().register("md", NullEngine);
		let map = remap("md", "");
		let err = select_engine("md", Some(&map), &registry).unwrap_err();
		assert!(matches!(err, ViewsError::EngineNotFound { extension } if extension == "md"));
	}
}
