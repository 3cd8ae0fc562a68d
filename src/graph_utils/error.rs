use thiserror::Error;

use super::graph::{ConnectionId, VertexId};

pub const MAX_NOTE_CHARS: usize = 128;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("note is {len} characters long; the limit is {MAX_NOTE_CHARS}")]
    NoteTooLong { len: usize },
    #[error("vertex {0} does not exist")]
    VertexNotFound(VertexId),
    #[error("connection {0} does not exist")]
    ConnectionNotFound(ConnectionId),
    #[error("vertex {0} cannot be connected to itself")]
    SelfConnection(VertexId),
    #[error("vertices {0} and {1} are already connected")]
    DuplicateConnection(VertexId, VertexId),
}

impl GraphError {
    /// User input the UI should report and otherwise ignore.
    pub fn is_validation(&self) -> bool {
        matches!(self, GraphError::NoteTooLong { .. })
    }

    /// References to something that is not in the graph. Self-connections
    /// are grouped here since no valid target was named.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GraphError::VertexNotFound(_)
                | GraphError::ConnectionNotFound(_)
                | GraphError::SelfConnection(_)
        )
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, GraphError::DuplicateConnection(..))
    }
}

pub fn validate_note(note: &str) -> Result<(), GraphError> {
    let len = note.chars().count();
    if len > MAX_NOTE_CHARS {
        return Err(GraphError::NoteTooLong { len });
    }
    Ok(())
}
