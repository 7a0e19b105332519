//! External predicates: caller-supplied relations the grounder can enumerate or test without
//! the formula machinery, such as the edge relation of a topology.

use std::fmt::Debug;

use crate::program::symbols::ProgramSymbol;
use crate::topology::TopologyRef;

/// A predicate evaluated during grounding. `pattern` has one entry per argument; `None` means
/// the argument is unbound. The implementation returns every full argument tuple consistent
/// with the pattern.
pub trait ExternalPredicate: Debug {
    fn arity(&self) -> usize;

    fn enumerate(&self, pattern: &[Option<ProgramSymbol>]) -> Vec<Vec<ProgramSymbol>>;
}

/// The edge relation of a topology: `edge(From, To)` holds for every directed edge. Vertices
/// are integer symbols.
pub struct TopologyEdges {
    topology: TopologyRef,
}

impl TopologyEdges {
    pub fn new(topology: TopologyRef) -> TopologyEdges {
        TopologyEdges { topology }
    }

    fn to_vertex(&self, symbol: ProgramSymbol) -> Option<usize> {
        match symbol.as_int() {
            Some(value) if value >= 0 && self.topology.is_valid_vertex(value as usize) => {
                Some(value as usize)
            }
            _ => None,
        }
    }

    fn tuple(from: usize, to: usize) -> Vec<ProgramSymbol> {
        vec![
            ProgramSymbol::Int(from as i64),
            ProgramSymbol::Int(to as i64),
        ]
    }
}

impl Debug for TopologyEdges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TopologyEdges({} vertices)", self.topology.num_vertices())
    }
}

impl ExternalPredicate for TopologyEdges {
    fn arity(&self) -> usize {
        2
    }

    fn enumerate(&self, pattern: &[Option<ProgramSymbol>]) -> Vec<Vec<ProgramSymbol>> {
        let from = pattern[0].map(|symbol| self.to_vertex(symbol));
        let to = pattern[1].map(|symbol| self.to_vertex(symbol));

        match (from, to) {
            // A bound argument that is not a vertex matches nothing.
            (Some(None), _) | (_, Some(None)) => Vec::new(),
            (Some(Some(from)), Some(Some(to))) => {
                if self.topology.outgoing(from).contains(&to) {
                    vec![Self::tuple(from, to)]
                } else {
                    Vec::new()
                }
            }
            (Some(Some(from)), None) => self
                .topology
                .outgoing(from)
                .into_iter()
                .map(|to| Self::tuple(from, to))
                .collect(),
            (None, Some(Some(to))) => self
                .topology
                .incoming(to)
                .into_iter()
                .map(|from| Self::tuple(from, to))
                .collect(),
            (None, None) => {
                let mut tuples = Vec::new();
                for from in 0..self.topology.num_vertices() {
                    for to in self.topology.outgoing(from) {
                        tuples.push(Self::tuple(from, to));
                    }
                }
                tuples
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::topology::DigraphTopology;

    #[test]
    fn enumeration_respects_bound_arguments() {
        let graph = Rc::new(DigraphTopology::from_edges(3, [(0, 1), (0, 2), (1, 2)]));
        let edges = TopologyEdges::new(graph);

        assert_eq!(edges.enumerate(&[None, None]).len(), 3);
        assert_eq!(
            edges.enumerate(&[Some(ProgramSymbol::Int(0)), None]).len(),
            2
        );
        assert_eq!(
            edges
                .enumerate(&[None, Some(ProgramSymbol::Int(2))])
                .len(),
            2
        );
        assert!(edges
            .enumerate(&[Some(ProgramSymbol::Int(1)), Some(ProgramSymbol::Int(0))])
            .is_empty());
    }
}
