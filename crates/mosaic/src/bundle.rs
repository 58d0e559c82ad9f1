//! Writing an assembled bundle to disk.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use mosaic_assembly::Assembled;
use thiserror::Error;

pub const METADATA_FILE: &str = "metadata.json";
pub const SOURCES_DIR: &str = "sources";

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("fragment name '{0}' has no usable path components")]
    EmptyName(String),

    #[error("fragment name '{0}' escapes the bundle directory")]
    Escapes(String),

    #[error("fragments '{first}' and '{second}' map to the same path")]
    Collision { first: String, second: String },

    #[error("{} already exists, pass --force to replace it", .0.display())]
    Exists(PathBuf),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

type Result<T> = std::result::Result<T, BundleError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> BundleError + '_ {
    move |source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Turn a fragment name into a relative path inside the bundle.
///
/// Absolute names are re-rooted, `.` is dropped and `..` may not climb above
/// the root.
pub fn sanitize_name(name: &str) -> Result<PathBuf> {
    let mut result = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => result.push(part),
            Component::ParentDir => {
                if !result.pop() {
                    return Err(BundleError::Escapes(name.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
        }
    }

    if result.as_os_str().is_empty() {
        return Err(BundleError::EmptyName(name.to_string()));
    }
    Ok(result)
}

#[derive(Debug, PartialEq, Eq)]
pub struct Written {
    pub root: PathBuf,
    pub fragments: usize,
}

/// Write `assembled` to `out`: every fragment under `sources/` and the
/// manifest as `metadata.json`.
///
/// The bundle is staged next to `out` and moved into place once complete,
/// so a failed write leaves nothing behind.
pub fn write(out: &Path, assembled: &Assembled, force: bool) -> Result<Written> {
    if out.exists() && !force {
        return Err(BundleError::Exists(out.to_path_buf()));
    }

    let parent = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(io_error(&parent))?;
    let staging = tempfile::Builder::new()
        .prefix(".mosaic-")
        .tempdir_in(&parent)
        .map_err(io_error(&parent))?;

    let sources = staging.path().join(SOURCES_DIR);
    let mut claimed: HashMap<PathBuf, &str> = HashMap::new();
    for (name, content) in &assembled.fragments {
        let relative = sanitize_name(name)?;
        if let Some(first) = claimed.insert(relative.clone(), name) {
            return Err(BundleError::Collision {
                first: first.to_string(),
                second: name.clone(),
            });
        }
        let path = sources.join(relative);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_error(dir))?;
        }
        fs::write(&path, content).map_err(io_error(&path))?;
    }

    let metadata = staging.path().join(METADATA_FILE);
    let document = serde_json::to_vec_pretty(assembled.manifest.document())
        .map_err(|err| io_error(&metadata)(err.into()))?;
    fs::write(&metadata, document).map_err(io_error(&metadata))?;

    if out.exists() {
        fs::remove_dir_all(out).map_err(io_error(out))?;
    }
    let staged = staging.keep();
    if let Err(source) = fs::rename(&staged, out) {
        let _ = fs::remove_dir_all(&staged);
        return Err(io_error(out)(source));
    }

    Ok(Written {
        root: out.to_path_buf(),
        fragments: assembled.fragments.len(),
    })
}
