//! Minimal HTTP pipeline seam.
//!
//! The views middleware does not own the request/response lifecycle; the
//! host pipeline does. This module defines the boundary it plugs into:
//! a [`Request`] carrying per-request state and type-safe extensions, a
//! [`Response`] under construction, and the [`Handler`]/[`Middleware`]
//! traits used to compose the chain.
//!
//! ```
//! use belvedere::http::{Handler, Request, Response};
//! use async_trait::async_trait;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn handle(&self, _request: Request) -> belvedere::Result<Response> {
//!         Ok(Response::ok().with_body("hello"))
//!     }
//! }
//! ```

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::{HeaderMap, Method, StatusCode, Uri};
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Type-safe extension storage attached to a request
///
/// Values are stored by type and cloned out on access, so capabilities
/// installed by middleware stay available to every downstream handler.
#[derive(Clone, Default)]
pub struct Extensions {
	map: Arc<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl Extensions {
	/// Create an empty extension store
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a value, replacing any existing value of the same type
	pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
		let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.insert(TypeId::of::<T>(), Box::new(value));
	}

	/// Get a cloned value by type
	pub fn get<T>(&self) -> Option<T>
	where
		T: Clone + Send + Sync + 'static,
	{
		let map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.get(&TypeId::of::<T>())
			.and_then(|boxed| boxed.downcast_ref::<T>())
			.cloned()
	}

	/// Check whether a value of the given type exists
	pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
		let map = self.map.lock().unwrap_or_else(|e| e.into_inner());
		map.contains_key(&TypeId::of::<T>())
	}
}

/// Shared per-request state, visible to templates as ambient context
///
/// Handlers and middleware write into it; the renderer snapshots it at
/// render time and merges it into the template context with the highest
/// precedence.
pub type RequestState = Arc<Mutex<Map<String, Value>>>;

/// HTTP request representation
pub struct Request {
	/// Request method
	pub method: Method,
	/// Request URI
	pub uri: Uri,
	/// Request headers
	pub headers: HeaderMap,
	/// Request body
	pub body: Bytes,
	state: RequestState,
	extensions: Extensions,
}

impl Request {
	/// Create a new request
	pub fn new(method: Method, uri: Uri) -> Self {
		Self {
			method,
			uri,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			state: Arc::new(Mutex::new(Map::new())),
			extensions: Extensions::new(),
		}
	}

	/// Create a GET request, convenient for tests and examples
	///
	/// ```
	/// use belvedere::http::Request;
	///
	/// let request = Request::get("/profile");
	/// assert_eq!(request.uri.path(), "/profile");
	/// ```
	pub fn get(uri: &str) -> Self {
		let uri = uri.parse().unwrap_or_else(|_| Uri::from_static("/"));
		Self::new(Method::GET, uri)
	}

	/// The request path
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Handle to the shared per-request state
	pub fn state(&self) -> RequestState {
		Arc::clone(&self.state)
	}

	/// Set a single state value
	pub fn set_state(&self, key: impl Into<String>, value: Value) {
		let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
		state.insert(key.into(), value);
	}

	/// Snapshot of the current per-request state
	pub fn state_snapshot(&self) -> Map<String, Value> {
		self.state
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.clone()
	}

	/// The request's extension store
	pub fn extensions(&self) -> &Extensions {
		&self.extensions
	}
}

/// HTTP response representation
#[derive(Debug, Clone)]
pub struct Response {
	/// Status code
	pub status: StatusCode,
	/// Response headers
	pub headers: HeaderMap,
	/// Response body
	pub body: Bytes,
}

impl Response {
	/// Create a response with the given status and an empty body
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	/// Create a 200 OK response
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// Create a 404 Not Found response
	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	/// Set the body (builder style)
	///
	/// ```
	/// use belvedere::http::Response;
	///
	/// let response = Response::ok().with_body("<p>hi</p>");
	/// assert_eq!(&response.body[..], b"<p>hi</p>");
	/// ```
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Set a header (builder style); invalid names or values are ignored
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		self.set_header(name, value);
		self
	}

	/// Set a header in place; invalid names or values are ignored
	pub fn set_header(&mut self, name: &str, value: &str) {
		if let (Ok(name), Ok(value)) = (
			name.parse::<hyper::header::HeaderName>(),
			value.parse::<hyper::header::HeaderValue>(),
		) {
			self.headers.insert(name, value);
		}
	}

	/// The `Content-Type` header value, if any
	pub fn content_type(&self) -> Option<&str> {
		self.headers
			.get(hyper::header::CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
	}

	/// The body as UTF-8, lossy
	pub fn body_string(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

impl Default for Response {
	fn default() -> Self {
		Self::ok()
	}
}

/// Handler trait for processing requests
///
/// The core abstraction of the pipeline: a handler receives a request and
/// produces a response or an error.
#[async_trait]
pub trait Handler: Send + Sync {
	/// Handle a request and produce a response
	async fn handle(&self, request: Request) -> Result<Response>;
}

/// Blanket implementation so `Arc<dyn Handler>` is itself a Handler
#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Middleware trait for request/response processing
///
/// Middleware wraps the next handler in the chain; it may act on the
/// request before delegating or on the response after.
#[async_trait]
pub trait Middleware: Send + Sync {
	/// Process a request, delegating to `next` for the rest of the chain
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn extensions_store_and_clone_out() {
		let extensions = Extensions::new();
		assert!(!extensions.contains::<String>());

		extensions.insert("hello".to_string());
		assert!(extensions.contains::<String>());
		assert_eq!(extensions.get::<String>(), Some("hello".to_string()));
		assert_eq!(extensions.get::<u32>(), None);
	}

	#[test]
	fn state_snapshot_is_detached() {
		let request = Request::get("/");
		request.set_state("user", json!("alice"));

		let snapshot = request.state_snapshot();
		request.set_state("user", json!("bob"));

		assert_eq!(snapshot.get("user"), Some(&json!("alice")));
		assert_eq!(request.state_snapshot().get("user"), Some(&json!("bob")));
	}

	#[test]
	fn response_builders() {
		let response = Response::ok()
			.with_header("content-type", "text/html")
			.with_body("x");
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.content_type(), Some("text/html"));
		assert_eq!(response.body_string(), "x");
	}
}
