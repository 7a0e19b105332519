//! Abstract topologies: graphs of vertices over which rule programs are grounded and graph
//! constraints are instantiated.

mod digraph;
mod graph_relations;
mod grid;
mod tarjan;

use std::fmt::Debug;
use std::rc::Rc;

pub use digraph::DigraphTopology;
pub(crate) use graph_relations::GraphRelationRegistry;
pub use graph_relations::GraphVariableRelation;
pub use grid::GridTopology;
pub(crate) use tarjan::find_sccs;

/// A vertex of a topology.
pub type VertexId = usize;

/// The abstract graph interface the core needs: vertex count and incoming/outgoing edges.
pub trait Topology: Debug {
    fn num_vertices(&self) -> usize;

    fn is_valid_vertex(&self, vertex: VertexId) -> bool {
        vertex < self.num_vertices()
    }

    fn outgoing(&self, vertex: VertexId) -> Vec<VertexId>;

    fn incoming(&self, vertex: VertexId) -> Vec<VertexId>;

    fn vertex_to_string(&self, vertex: VertexId) -> String {
        format!("v{vertex}")
    }
}

/// Shared handle to a topology. The solver is single-threaded, so reference counting without
/// atomics suffices.
pub type TopologyRef = Rc<dyn Topology>;

pub(crate) fn topology_eq(a: &TopologyRef, b: &TopologyRef) -> bool {
    Rc::ptr_eq(a, b)
}
