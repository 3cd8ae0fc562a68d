use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::graph_utils::error::GraphError;
use crate::graph_utils::geometry::Point;
use crate::graph_utils::graph::{GraphStore, VertexId};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed graph file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("connection {connection} references vertex index {index}, but only {vertex_count} vertices exist")]
    IndexOutOfRange { connection: usize, index: usize, vertex_count: usize },
    #[error("vertex {index} is invalid: {source}")]
    InvalidVertex { index: usize, source: GraphError },
    #[error("connection {index} is invalid: {source}")]
    InvalidConnection { index: usize, source: GraphError },
    #[error("graph file I/O failed: {0}")]
    Io(#[from] io::Error),
}

// On-disk layout: vertices by position, connections by vertex index
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphFile {
    pub vertices: Vec<VertexRecord>,
    pub connections: Vec<ConnectionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VertexRecord {
    pub note: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub vertex1: usize,
    pub vertex2: usize,
}

impl GraphFile {
    pub fn from_store(store: &GraphStore) -> Self {
        let vertices = store
            .vertices()
            .iter()
            .map(|v| VertexRecord {
                note: v.note.clone(),
                x: v.position.x,
                y: v.position.y,
                radius: v.radius,
            })
            .collect();
        // Endpoints always exist in the store, so every index resolves
        let connections = store
            .connections()
            .iter()
            .filter_map(|c| {
                Some(ConnectionRecord {
                    vertex1: store.index_of(c.source)?,
                    vertex2: store.index_of(c.target)?,
                })
            })
            .collect();
        GraphFile { vertices, connections }
    }

    /// Rebuild a store, handing out fresh ids in file order.
    pub fn into_store(self) -> Result<GraphStore, CodecError> {
        let mut store = GraphStore::new();
        let mut ids: Vec<VertexId> = Vec::with_capacity(self.vertices.len());
        for (index, v) in self.vertices.into_iter().enumerate() {
            let id = store
                .restore_vertex(v.note, Point::new(v.x, v.y), v.radius)
                .map_err(|err| CodecError::InvalidVertex { index, source: err })?;
            ids.push(id);
        }
        let resolve = |connection: usize, index: usize| -> Result<VertexId, CodecError> {
            ids.get(index).copied().ok_or(CodecError::IndexOutOfRange {
                connection,
                index,
                vertex_count: ids.len(),
            })
        };
        for (index, c) in self.connections.iter().enumerate() {
            let source = resolve(index, c.vertex1)?;
            let target = resolve(index, c.vertex2)?;
            match store.connect(source, target) {
                Ok(_) => {}
                // Older files may hold self-loops or repeated pairs; drop just that record
                Err(err) if err.is_duplicate() || matches!(err, GraphError::SelfConnection(_)) => {
                    log::warn!("skipping connection {index} ({} -> {}): {err}", c.vertex1, c.vertex2);
                }
                Err(err) => return Err(CodecError::InvalidConnection { index, source: err }),
            }
        }
        Ok(store)
    }
}

pub fn encode(store: &GraphStore) -> Result<Vec<u8>, CodecError> {
    let mut bytes = serde_json::to_vec_pretty(&GraphFile::from_store(store))?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn decode(bytes: &[u8]) -> Result<GraphStore, CodecError> {
    let file: GraphFile = serde_json::from_slice(bytes)?;
    file.into_store()
}

fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
        f.sync_all()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

pub fn save_to_path(store: &GraphStore, path: &Path) -> Result<(), CodecError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let bytes = encode(store)?;
    atomic_write(path, &bytes)?;
    log::info!(
        "saved {} vertices and {} connections to {}",
        store.vertex_count(),
        store.connection_count(),
        path.display()
    );
    Ok(())
}

// A missing file is an empty start, not an error
pub fn load_from_path(path: &Path) -> Result<Option<GraphStore>, CodecError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    let store = decode(&bytes)?;
    log::info!(
        "loaded {} vertices and {} connections from {}",
        store.vertex_count(),
        store.connection_count(),
        path.display()
    );
    Ok(Some(store))
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub store: GraphStore,
    // Set when the file existed but could not be used
    pub error: Option<String>,
    // Where an unreadable file was moved so the next save cannot clobber it
    pub quarantined: Option<PathBuf>,
}

/// Load the graph at `path`, falling back to an empty graph on any failure.
pub fn load_or_empty(path: &Path) -> LoadOutcome {
    match load_from_path(path) {
        Ok(Some(store)) => LoadOutcome { store, error: None, quarantined: None },
        Ok(None) => {
            log::info!("no graph file at {}, starting empty", path.display());
            LoadOutcome { store: GraphStore::new(), error: None, quarantined: None }
        }
        Err(e) => {
            log::warn!("could not load {}: {e}; starting with an empty graph", path.display());
            let quarantined = match quarantine(path) {
                Ok(p) => Some(p),
                Err(qe) => {
                    log::warn!("could not move aside {}: {qe}", path.display());
                    None
                }
            };
            LoadOutcome { store: GraphStore::new(), error: Some(e.to_string()), quarantined }
        }
    }
}

pub fn quarantine_path(path: &Path) -> PathBuf {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = now.format(fmt).unwrap_or_else(|_| "unknown".to_string());
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("graph_data");
    path.with_file_name(format!("{stem}.corrupt-{stamp}.json"))
}

fn quarantine(path: &Path) -> io::Result<PathBuf> {
    if !path.exists() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "file vanished"));
    }
    let target = quarantine_path(path);
    fs::rename(path, &target)?;
    log::warn!("moved unreadable graph file to {}", target.display());
    Ok(target)
}
