//! Snapshot sources.
//!
//! Fetching, authentication and push delivery live outside this crate. A
//! [`SnapshotSource`] is the seam they plug into: each call hands back a
//! freshly decoded document, which callers re-wrap from scratch.

use crate::models::error::ModelError;
use crate::models::ids::HomeId;
use crate::models::node::Node;
use crate::models::status::HomeStatus;
use log::{info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum SourceError {
    Io { path: PathBuf, error: std::io::Error },
    /// Malformed JSON, or a value no node can represent.
    Json { path: String, message: String },
    Model(ModelError),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io { path, error } => write!(f, "reading {} failed: {}", path.display(), error),
            SourceError::Json { path, message } => {
                if path.is_empty() || path == "." {
                    write!(f, "json error: {}", message)
                } else {
                    write!(f, "json error at {}: {}", path, message)
                }
            }
            SourceError::Model(e) => write!(f, "model error: {}", e),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SourceError::Io { error, .. } => Some(error),
            SourceError::Model(e) => Some(e),
            SourceError::Json { .. } => None,
        }
    }
}

impl From<ModelError> for SourceError {
    fn from(value: ModelError) -> Self {
        SourceError::Model(value)
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(value: serde_json::Error) -> Self {
        SourceError::Json {
            path: String::new(),
            message: value.to_string(),
        }
    }
}

/// Supplier of decoded home documents.
pub trait SnapshotSource {
    /// The home-data document (envelope or bare list of homes).
    fn homes_data(&self) -> Result<Node, SourceError>;

    /// The status document of `home_id`, if this source has one.
    fn home_status(&self, home_id: &HomeId) -> Result<Option<Node>, SourceError>;
}

/// Parse one JSON document into a node tree, reporting the JSON path of
/// any value that cannot be represented.
pub fn parse_snapshot<R: Read>(reader: R) -> Result<Node, SourceError> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    let node: Node = serde_path_to_error::deserialize(&mut de).map_err(|e| SourceError::Json {
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })?;
    de.end()?;
    Ok(node)
}

/// Snapshots stored as JSON files, re-read on every call.
#[derive(Debug, Clone)]
pub struct FileSource {
    homes_data: PathBuf,
    home_status: Option<PathBuf>,
}

impl FileSource {
    pub fn new(homes_data: impl Into<PathBuf>, home_status: Option<PathBuf>) -> Self {
        FileSource {
            homes_data: homes_data.into(),
            home_status,
        }
    }

    fn load(path: &Path) -> Result<Node, SourceError> {
        let file = File::open(path).map_err(|error| SourceError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let node = parse_snapshot(BufReader::new(file))?;
        info!("Loaded snapshot from {}", path.display());
        Ok(node)
    }
}

impl SnapshotSource for FileSource {
    fn homes_data(&self) -> Result<Node, SourceError> {
        Self::load(&self.homes_data)
    }

    fn home_status(&self, home_id: &HomeId) -> Result<Option<Node>, SourceError> {
        let Some(path) = self.home_status.as_deref() else {
            return Ok(None);
        };
        let node = Self::load(path)?;
        let status_id = HomeStatus::from_response(&node)?.id()?;
        if status_id != *home_id {
            warn!(
                "Status snapshot {} belongs to home {}, not {}",
                path.display(),
                status_id,
                home_id
            );
            return Ok(None);
        }
        Ok(Some(node))
    }
}

/// Snapshots already decoded by some other component.
#[derive(Debug, Clone, Default)]
pub struct DecodedSource {
    pub homes_data: Value,
    pub home_statuses: Vec<Value>,
}

impl SnapshotSource for DecodedSource {
    fn homes_data(&self) -> Result<Node, SourceError> {
        Ok(Node::from_value(&self.homes_data)?)
    }

    fn home_status(&self, home_id: &HomeId) -> Result<Option<Node>, SourceError> {
        for value in &self.home_statuses {
            let node = Node::from_value(value)?;
            if HomeStatus::from_response(&node)?.id()? == *home_id {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }
}
