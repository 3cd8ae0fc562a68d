use rand::Rng;
use uuid::Uuid;

use super::error::{validate_note, GraphError};
use super::geometry::{
    self, Arrow, Bounds, Point, LINE_HIT_TOLERANCE, PLACEMENT_ATTEMPTS,
};

// Basic type aliases for clarity
pub type VertexId = Uuid;
pub type ConnectionId = Uuid;

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub note: String,
    pub position: Point,
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: VertexId,
    pub target: VertexId,
    // Derived from the endpoint vertices; refreshed after every geometry change
    pub arrow: Arrow,
}

impl Connection {
    pub fn touches(&self, id: VertexId) -> bool {
        self.source == id || self.target == id
    }

    pub fn joins(&self, a: VertexId, b: VertexId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Authoritative vertex and connection lists.
///
/// Vertices keep insertion order, which is also the order the codec writes
/// them in. Connections hold id pairs only, never references into the vertex
/// list, and every endpoint always names a live vertex.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    vertices: Vec<Vertex>,
    connections: Vec<Connection>,
    placement_bounds: Bounds,
}

impl GraphStore {
    // Instantiate a new, empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placement_bounds(bounds: Bounds) -> Self {
        GraphStore { placement_bounds: bounds, ..Self::default() }
    }

    pub fn placement_bounds(&self) -> Bounds { self.placement_bounds }

    pub fn set_placement_bounds(&mut self, bounds: Bounds) {
        self.placement_bounds = bounds;
    }

    // Add a vertex, placing it randomly when no position is given
    pub fn add_vertex(&mut self, note: impl Into<String>, position: Option<Point>) -> Result<VertexId, GraphError> {
        self.add_vertex_with_rng(note, position, &mut rand::rng())
    }

    pub fn add_vertex_with_rng<R: Rng>(
        &mut self,
        note: impl Into<String>,
        position: Option<Point>,
        rng: &mut R,
    ) -> Result<VertexId, GraphError> {
        let note = note.into();
        validate_note(&note)?;
        let radius = geometry::radius_for_note(&note);
        let position = match position {
            Some(p) => p,
            None => {
                let existing: Vec<(Point, f32)> =
                    self.vertices.iter().map(|v| (v.position, v.radius)).collect();
                geometry::find_non_overlapping_position(
                    radius,
                    self.placement_bounds,
                    &existing,
                    PLACEMENT_ATTEMPTS,
                    rng,
                )
            }
        };
        Ok(self.push_vertex(note, position, radius))
    }

    /// Re-create a vertex from persisted data. The stored radius may carry a
    /// zoom factor from the last session, so it is kept whenever it is usable.
    pub fn restore_vertex(&mut self, note: impl Into<String>, position: Point, radius: f32) -> Result<VertexId, GraphError> {
        let note = note.into();
        validate_note(&note)?;
        let radius = if radius.is_finite() && radius > 0.0 {
            radius
        } else {
            geometry::radius_for_note(&note)
        };
        Ok(self.push_vertex(note, position, radius))
    }

    fn push_vertex(&mut self, note: String, position: Point, radius: f32) -> VertexId {
        let id = Uuid::now_v7();
        log::debug!("add vertex {id} at ({:.1}, {:.1}) r={radius:.1}", position.x, position.y);
        self.vertices.push(Vertex { id, note, position, radius });
        id
    }

    pub fn edit_vertex_text(&mut self, id: VertexId, new_note: impl Into<String>) -> Result<(), GraphError> {
        let new_note = new_note.into();
        validate_note(&new_note)?;
        let vertex = self.vertex_mut(id).ok_or(GraphError::VertexNotFound(id))?;
        vertex.radius = geometry::radius_for_note(&new_note);
        vertex.note = new_note;
        self.refresh_connections_of(id);
        Ok(())
    }

    pub fn move_vertex(&mut self, id: VertexId, x: f32, y: f32) -> Result<(), GraphError> {
        let vertex = self.vertex_mut(id).ok_or(GraphError::VertexNotFound(id))?;
        vertex.position = Point::new(x, y);
        self.refresh_connections_of(id);
        Ok(())
    }

    pub fn delete_vertex(&mut self, id: VertexId) -> Result<(), GraphError> {
        let idx = self.index_of(id).ok_or(GraphError::VertexNotFound(id))?;
        self.vertices.remove(idx);
        // Cascade delete connections involving this vertex
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        log::debug!("delete vertex {id} (+{} connections)", before - self.connections.len());
        Ok(())
    }

    // Connect two distinct vertices; the arrow points from source to target
    pub fn connect(&mut self, source: VertexId, target: VertexId) -> Result<ConnectionId, GraphError> {
        if source == target {
            return Err(GraphError::SelfConnection(source));
        }
        let (a, b) = match (self.vertex(source), self.vertex(target)) {
            (Some(a), Some(b)) => (a, b),
            (None, _) => return Err(GraphError::VertexNotFound(source)),
            (_, None) => return Err(GraphError::VertexNotFound(target)),
        };
        if self.find_connection(source, target).is_some() {
            return Err(GraphError::DuplicateConnection(source, target));
        }
        let arrow = geometry::arrow_endpoints(a.position, a.radius, b.position, b.radius);
        let id = Uuid::now_v7();
        self.connections.push(Connection { id, source, target, arrow });
        log::debug!("connect {source} -> {target} as {id}");
        Ok(id)
    }

    pub fn delete_connection(&mut self, id: ConnectionId) -> Result<(), GraphError> {
        let idx = self
            .connections
            .iter()
            .position(|c| c.id == id)
            .ok_or(GraphError::ConnectionNotFound(id))?;
        self.connections.remove(idx);
        log::debug!("delete connection {id}");
        Ok(())
    }

    /// Scale every vertex position and radius about `anchor`.
    pub fn rescale(&mut self, factor: f32, anchor: Point) {
        if !factor.is_finite() || factor <= 0.0 {
            log::warn!("ignoring rescale by invalid factor {factor}");
            return;
        }
        for v in &mut self.vertices {
            v.position = v.position.scaled_about(anchor, factor);
            v.radius *= factor;
        }
        self.refresh_connections();
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        for v in &mut self.vertices {
            v.position = v.position.offset(dx, dy);
        }
        self.refresh_connections();
    }

    // Recompute every arrow from current vertex geometry
    pub fn refresh_connections(&mut self) {
        let vertices = &self.vertices;
        for c in &mut self.connections {
            if let Some(arrow) = arrow_between(vertices, c.source, c.target) {
                c.arrow = arrow;
            }
        }
    }

    fn refresh_connections_of(&mut self, id: VertexId) {
        let vertices = &self.vertices;
        for c in self.connections.iter_mut().filter(|c| c.touches(id)) {
            if let Some(arrow) = arrow_between(vertices, c.source, c.target) {
                c.arrow = arrow;
            }
        }
    }

    fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.iter_mut().find(|v| v.id == id)
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.iter().find(|v| v.id == id)
    }
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }
    pub fn vertices(&self) -> &[Vertex] { &self.vertices }
    pub fn connections(&self) -> &[Connection] { &self.connections }
    pub fn vertex_count(&self) -> usize { self.vertices.len() }
    pub fn connection_count(&self) -> usize { self.connections.len() }
    pub fn is_empty(&self) -> bool { self.vertices.is_empty() }

    // Position of a vertex in insertion order
    pub fn index_of(&self, id: VertexId) -> Option<usize> {
        self.vertices.iter().position(|v| v.id == id)
    }

    // Unordered lookup: a->b and b->a are the same pair
    pub fn find_connection(&self, a: VertexId, b: VertexId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.joins(a, b))
    }

    // Hit testing, first match in insertion order
    pub fn vertex_at(&self, p: Point) -> Option<VertexId> {
        self.vertices
            .iter()
            .find(|v| geometry::point_in_circle(p, v.position, v.radius))
            .map(|v| v.id)
    }

    pub fn connection_near(&self, p: Point, tolerance: f32) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|c| geometry::point_near_line(p, c.arrow.start, c.arrow.end, tolerance))
            .map(|c| c.id)
    }

    pub fn connection_at(&self, p: Point) -> Option<ConnectionId> {
        self.connection_near(p, LINE_HIT_TOLERANCE)
    }
}

fn arrow_between(vertices: &[Vertex], source: VertexId, target: VertexId) -> Option<Arrow> {
    let a = vertices.iter().find(|v| v.id == source)?;
    let b = vertices.iter().find(|v| v.id == target)?;
    Some(geometry::arrow_endpoints(a.position, a.radius, b.position, b.radius))
}
