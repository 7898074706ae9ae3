//! View path resolution.
//!
//! Turns a relative view name into the concrete file to render: if the
//! name already carries an extension that extension is authoritative,
//! otherwise the configured default extension is appended. A name that
//! resolves to a directory falls back to `index.<ext>` inside it. The
//! resolver only checks that the candidate exists; it never reads it.

use crate::error::{Result, ViewsError};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A resolved view: the on-disk path relative to the base directory and
/// its actual extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedView {
	/// Path relative to the base directory, safe to join against it
	pub rel: PathBuf,
	/// The file extension, without the leading dot, never empty
	pub ext: String,
}

impl ResolvedView {
	/// The absolute path of the view under `base_dir`
	pub fn absolute(&self, base_dir: &Path) -> PathBuf {
		base_dir.join(&self.rel)
	}
}

/// Resolve a view name against a base directory
///
/// # Errors
///
/// Returns [`ViewsError::InvalidPath`] when the name is absolute or
/// escapes the base directory, and [`ViewsError::ViewNotFound`] when no
/// candidate file exists.
///
/// # Examples
///
/// ```no_run
/// use belvedere::paths::resolve_view;
/// use std::path::Path;
///
/// # tokio_test::block_on(async {
/// let view = resolve_view(Path::new("./views"), "index", "html").await?;
/// assert_eq!(view.ext, "html");
/// # Ok::<_, belvedere::ViewsError>(())
/// # });
/// ```
pub async fn resolve_view(base_dir: &Path, name: &str, default_ext: &str) -> Result<ResolvedView> {
	let rel = sanitize(name)?;

	match rel.extension().and_then(|e| e.to_str()) {
		// The caller's extension is authoritative
		Some(ext) => {
			let ext = ext.to_string();
			require_file(base_dir, rel, ext).await
		}
		None => {
			let candidate = append_extension(&rel, default_ext);
			if is_file(&base_dir.join(&candidate)).await {
				debug!(view = %candidate.display(), "resolved view by default extension");
				return Ok(ResolvedView {
					rel: candidate,
					ext: default_ext.to_string(),
				});
			}

			// A directory named like the view serves its index file
			if is_dir(&base_dir.join(&rel)).await {
				let index = rel.join(format!("index.{default_ext}"));
				if is_file(&base_dir.join(&index)).await {
					debug!(view = %index.display(), "resolved view to directory index");
					return Ok(ResolvedView {
						rel: index,
						ext: default_ext.to_string(),
					});
				}
			}

			Err(ViewsError::ViewNotFound(candidate))
		}
	}
}

async fn require_file(base_dir: &Path, rel: PathBuf, ext: String) -> Result<ResolvedView> {
	if is_file(&base_dir.join(&rel)).await {
		debug!(view = %rel.display(), "resolved view by explicit extension");
		Ok(ResolvedView { rel, ext })
	} else {
		Err(ViewsError::ViewNotFound(rel))
	}
}

async fn is_file(path: &Path) -> bool {
	match tokio::fs::metadata(path).await {
		Ok(meta) => meta.is_file(),
		Err(_) => false,
	}
}

async fn is_dir(path: &Path) -> bool {
	match tokio::fs::metadata(path).await {
		Ok(meta) => meta.is_dir(),
		Err(_) => false,
	}
}

/// Normalize a view name into a relative path that is safe to join
/// against the base directory
///
/// Rejects absolute names and any name whose `..` components would climb
/// above the base directory.
fn sanitize(name: &str) -> Result<PathBuf> {
	let trimmed = name.trim_start_matches('/');
	let path = Path::new(trimmed);

	let mut depth: i32 = 0;
	let mut normalized = PathBuf::new();
	for component in path.components() {
		match component {
			Component::Normal(part) => {
				depth += 1;
				normalized.push(part);
			}
			Component::CurDir => {}
			Component::ParentDir => {
				depth -= 1;
				if depth < 0 {
					return Err(ViewsError::InvalidPath(name.to_string()));
				}
				normalized.pop();
			}
			Component::RootDir | Component::Prefix(_) => {
				return Err(ViewsError::InvalidPath(name.to_string()));
			}
		}
	}

	if normalized.as_os_str().is_empty() {
		return Err(ViewsError::InvalidPath(name.to_string()));
	}
	Ok(normalized)
}

fn append_extension(rel: &Path, ext: &str) -> PathBuf {
	let mut name = rel.as_os_str().to_os_string();
	name.push(".");
	name.push(ext);
	PathBuf::from(name)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tempfile::TempDir;

	fn views_dir() -> TempDir {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("home.html"), "<h1>home</h1>").unwrap();
		std::fs::write(dir.path().join("profile.pug"), "h1 profile").unwrap();
		std::fs::create_dir(dir.path().join("admin")).unwrap();
		std::fs::write(dir.path().join("admin/index.html"), "<h1>admin</h1>").unwrap();
		dir
	}

	#[rstest]
	#[tokio::test]
	async fn appends_default_extension() {
		let dir = views_dir();
		let view = resolve_view(dir.path(), "home", "html").await.unwrap();
		assert_eq!(view.rel, PathBuf::from("home.html"));
		assert_eq!(view.ext, "html");
	}

	#[rstest]
	#[tokio::test]
	async fn explicit_extension_wins_over_default() {
		let dir = views_dir();
		let view = resolve_view(dir.path(), "profile.pug", "html").await.unwrap();
		assert_eq!(view.rel, PathBuf::from("profile.pug"));
		assert_eq!(view.ext, "pug");
	}

	#[rstest]
	#[tokio::test]
	async fn directory_falls_back_to_index() {
		let dir = views_dir();
		let view = resolve_view(dir.path(), "admin", "html").await.unwrap();
		assert_eq!(view.rel, PathBuf::from("admin/index.html"));
		assert_eq!(view.ext, "html");
	}

	#[rstest]
	#[tokio::test]
	async fn missing_view_is_not_found() {
		let dir = views_dir();
		let err = resolve_view(dir.path(), "missing", "html").await.unwrap_err();
		assert!(matches!(err, ViewsError::ViewNotFound(p) if p == PathBuf::from("missing.html")));
	}

	#[rstest]
	#[case("../secret")]
	#[case("..")]
	#[case("a/../../b")]
	#[tokio::test]
	async fn traversal_names_are_rejected(#[case] name: &str) {
		let dir = views_dir();
		let err = resolve_view(dir.path(), name, "html").await.unwrap_err();
		assert!(matches!(err, ViewsError::InvalidPath(_)));
	}

	#[rstest]
	#[tokio::test]
	async fn interior_parent_segments_are_normalized() {
		let dir = views_dir();
		let view = resolve_view(dir.path(), "admin/../home", "html").await.unwrap();
		assert_eq!(view.rel, PathBuf::from("home.html"));
	}
}
