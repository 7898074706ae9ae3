//! Static file passthrough.
//!
//! Plain `html` views (with no engine remap configured) skip templating
//! entirely and are handed to a [`StaticSender`], which owns the response
//! in that branch: it reads the file and produces body and status itself.

use crate::error::{Result, ViewsError};
use crate::http::Response;
use async_trait::async_trait;
use hyper::StatusCode;
use std::path::{Component, Path};
use tracing::debug;

/// Collaborator that serves a file relative to a root directory
///
/// The default implementation is [`FsStaticSender`]; tests and hosts with
/// their own static pipeline can substitute one.
#[async_trait]
pub trait StaticSender: Send + Sync {
	/// Produce the response for the file at `rel` under `root`
	///
	/// # Errors
	///
	/// Read and permission failures propagate unmodified.
	async fn send(&self, rel: &Path, root: &Path) -> Result<Response>;
}

/// Filesystem-backed static sender
#[derive(Debug, Default)]
pub struct FsStaticSender;

impl FsStaticSender {
	/// Create a new filesystem sender
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl StaticSender for FsStaticSender {
	async fn send(&self, rel: &Path, root: &Path) -> Result<Response> {
		// The resolver already normalizes view names; this guards direct
		// callers handing in raw paths.
		if rel.is_absolute()
			|| rel
				.components()
				.any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
		{
			return Err(ViewsError::InvalidPath(rel.display().to_string()));
		}

		let path = root.join(rel);
		debug!(file = %path.display(), "serving static view");
		let body = tokio::fs::read(&path).await?;
		Ok(Response::new(StatusCode::OK).with_body(body))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::path::PathBuf;
	use tempfile::TempDir;

	#[rstest]
	#[tokio::test]
	async fn sends_file_contents() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("page.html"), "<p>static</p>").unwrap();

		let sender = FsStaticSender::new();
		let response = sender
			.send(Path::new("page.html"), dir.path())
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.body_string(), "<p>static</p>");
	}

	#[rstest]
	#[tokio::test]
	async fn missing_file_surfaces_io_error() {
		let dir = TempDir::new().unwrap();
		let sender = FsStaticSender::new();
		let err = sender
			.send(Path::new("missing.html"), dir.path())
			.await
			.unwrap_err();
		assert!(matches!(err, ViewsError::Io(_)));
	}

	#[rstest]
	#[tokio::test]
	async fn rejects_parent_traversal() {
		let dir = TempDir::new().unwrap();
		let sender = FsStaticSender::new();
		let err = sender
			.send(&PathBuf::from("../outside.html"), dir.path())
			.await
			.unwrap_err();
		assert!(matches!(err, ViewsError::InvalidPath(_)));
	}
}
