//! Vertex → solver-variable relations. Registered relations make learned clauses eligible for
//! graph promotion: a clause whose literals all resolve through relations at one vertex can be
//! re-instantiated at every other vertex of the topology.

use fnv::FnvHashMap;

use crate::engine::variables::VariableId;
use crate::topology::TopologyRef;
use crate::topology::VertexId;

/// A (partial) map from the vertices of one topology to solver variables.
#[derive(Debug, Clone)]
pub struct GraphVariableRelation {
    name: String,
    topology: TopologyRef,
    variables: Vec<Option<VariableId>>,
}

impl GraphVariableRelation {
    pub fn new(name: String, topology: TopologyRef) -> GraphVariableRelation {
        let num_vertices = topology.num_vertices();
        GraphVariableRelation {
            name,
            topology,
            variables: vec![None; num_vertices],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topology(&self) -> &TopologyRef {
        &self.topology
    }

    pub fn bind(&mut self, vertex: VertexId, variable: VariableId) {
        assert!(self.topology.is_valid_vertex(vertex));
        self.variables[vertex] = Some(variable);
    }

    pub fn resolve(&self, vertex: VertexId) -> Option<VariableId> {
        self.variables.get(vertex).copied().flatten()
    }
}

/// Index of every registered relation, with a reverse map from variables to the
/// `(relation, vertex)` pairs that produce them.
#[derive(Debug, Default)]
pub(crate) struct GraphRelationRegistry {
    relations: Vec<GraphVariableRelation>,
    by_variable: FnvHashMap<VariableId, Vec<(usize, VertexId)>>,
}

impl GraphRelationRegistry {
    pub(crate) fn register(&mut self, relation: GraphVariableRelation) -> usize {
        let index = self.relations.len();
        for vertex in 0..relation.topology().num_vertices() {
            if let Some(variable) = relation.resolve(vertex) {
                self.by_variable
                    .entry(variable)
                    .or_default()
                    .push((index, vertex));
            }
        }
        self.relations.push(relation);
        index
    }

    pub(crate) fn relation(&self, index: usize) -> &GraphVariableRelation {
        &self.relations[index]
    }

    /// All `(relation index, vertex)` pairs resolving to `variable`.
    pub(crate) fn sources_of(&self, variable: VariableId) -> &[(usize, VertexId)] {
        self.by_variable
            .get(&variable)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
