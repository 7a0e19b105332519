use std::collections::VecDeque;

use crate::basic_types::Clause;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::basic_types::ValueSet;
use crate::engine::propagation::ExplanationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::Literal;
use crate::engine::variables::VariableId;
use crate::topology::TopologyRef;
use crate::topology::VertexId;

const OFF: usize = 0;
const ON: usize = 1;

/// Connectivity over a topology: every vertex whose boolean variable is forced "on" must be
/// reachable from the source through vertices that can still be "on". Unreachable vertices are
/// forced "off"; a definitely-on vertex that becomes unreachable is a conflict.
///
/// Explanations are cut-based: any path to an unreachable vertex crosses the frontier of
/// definitely-off vertices around the reached region, so regaining one of those suffices.
pub(crate) struct ReachabilityPropagator {
    topology: TopologyRef,
    /// One boolean variable per vertex, aligned with vertex numbering.
    vertex_variables: Vec<VariableId>,
    source: VertexId,
}

struct Flood {
    reached: Vec<bool>,
    /// Definitely-off vertices adjacent to the reached region (the cut).
    frontier: Vec<VertexId>,
}

impl ReachabilityPropagator {
    pub(crate) fn new(
        topology: TopologyRef,
        vertex_variables: Vec<VariableId>,
        source: VertexId,
    ) -> ReachabilityPropagator {
        assert_eq!(vertex_variables.len(), topology.num_vertices());
        assert!(topology.is_valid_vertex(source));
        ReachabilityPropagator {
            topology,
            vertex_variables,
            source,
        }
    }

    /// Breadth-first search from the source through vertices that can still be on, collecting
    /// the definitely-off frontier as the cut.
    fn flood(&self, can_be_on: impl Fn(VertexId) -> bool) -> Flood {
        let num_vertices = self.topology.num_vertices();
        let mut reached = vec![false; num_vertices];
        let mut frontier = Vec::new();
        let mut in_frontier = vec![false; num_vertices];

        if !can_be_on(self.source) {
            return Flood {
                reached,
                frontier: vec![self.source],
            };
        }

        let mut queue = VecDeque::new();
        reached[self.source] = true;
        queue.push_back(self.source);
        while let Some(vertex) = queue.pop_front() {
            for next in self.topology.outgoing(vertex) {
                if reached[next] {
                    continue;
                }
                if can_be_on(next) {
                    reached[next] = true;
                    queue.push_back(next);
                } else if !in_frontier[next] {
                    in_frontier[next] = true;
                    frontier.push(next);
                }
            }
        }

        Flood { reached, frontier }
    }

    fn on_literal(&self, vertex: VertexId) -> Literal {
        Literal::new(self.vertex_variables[vertex], ValueSet::singleton(2, ON))
    }

    fn off_literal(&self, vertex: VertexId) -> Literal {
        Literal::new(self.vertex_variables[vertex], ValueSet::singleton(2, OFF))
    }

    fn cut_clause(&self, subject: VertexId, flood: &Flood) -> Clause {
        let mut clause = Clause::default();
        clause.add(self.off_literal(subject));
        for &vertex in &flood.frontier {
            clause.add(self.on_literal(vertex));
        }
        clause
    }
}

impl Propagator for ReachabilityPropagator {
    fn name(&self) -> &str {
        "Reachability"
    }

    fn priority(&self) -> u32 {
        3
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for &variable in &self.vertex_variables {
            // Only a vertex losing its "on" value can change reachability.
            let _ = context.register_lost_values(variable, ValueSet::singleton(2, ON));
        }
        Ok(())
    }

    fn on_narrowed(
        &mut self,
        context: &mut PropagationContextMut,
        _variable: VariableId,
        _previous: &ValueSet,
    ) -> PropagationStatus {
        context.request_second_pass();
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        let flood = self.flood(|vertex| {
            context
                .potential_values(self.vertex_variables[vertex])
                .contains(ON)
        });

        for vertex in 0..self.topology.num_vertices() {
            if flood.reached[vertex] {
                continue;
            }
            let variable = self.vertex_variables[vertex];
            if context.is_literal_true(&self.on_literal(vertex)) {
                return Err(Inconsistency::Conflict(self.cut_clause(vertex, &flood)));
            }
            if context.potential_values(variable).contains(ON) {
                context.assert_literal(&self.off_literal(vertex))?;
            }
        }
        Ok(())
    }

    fn explain(
        &self,
        context: &ExplanationContext<'_>,
        variable: VariableId,
        values: &ValueSet,
    ) -> Clause {
        let subject = self
            .vertex_variables
            .iter()
            .position(|&candidate| candidate == variable)
            .expect("explained variable belongs to this constraint");

        let flood = self.flood(|vertex| {
            context
                .values_before(self.vertex_variables[vertex])
                .contains(ON)
        });

        let mut clause = Clause::default();
        clause.add(Literal::new(variable, values.clone()));
        for &vertex in &flood.frontier {
            if vertex != subject {
                clause.add(self.on_literal(vertex));
            }
        }
        clause
    }

    fn check_conflicting(&self, store: &VariableStore) -> bool {
        let flood = self.flood(|vertex| {
            store
                .potential_values(self.vertex_variables[vertex])
                .contains(ON)
        });
        (0..self.topology.num_vertices()).any(|vertex| {
            !flood.reached[vertex] && store.is_literal_true(&self.on_literal(vertex))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::engine::test_helper::TestSolver;
    use crate::topology::GridTopology;

    #[test]
    fn cut_vertices_force_the_far_side_off() {
        // A 3x1 corridor: turning the middle cell off makes the right cell unreachable.
        let mut solver = TestSolver::default();
        let grid = Rc::new(GridTopology::new(3, 1));
        let cells: Vec<_> = (0..3).map(|_| solver.new_boolean()).collect();

        let _ = solver
            .new_propagator(ReachabilityPropagator::new(
                grid,
                cells.clone(),
                0,
            ))
            .expect("feasible at root");

        solver.push_decision_level();
        solver.assign_boolean(cells[1], false);
        solver.notify_and_propagate().expect("no conflict");

        assert_eq!(solver.solved_index(cells[2]), Some(0));
    }

    #[test]
    fn unreachable_on_vertex_conflicts() {
        let mut solver = TestSolver::default();
        let grid = Rc::new(GridTopology::new(3, 1));
        let cells: Vec<_> = (0..3).map(|_| solver.new_boolean()).collect();

        let _ = solver
            .new_propagator(ReachabilityPropagator::new(
                grid,
                cells.clone(),
                0,
            ))
            .expect("feasible at root");

        solver.push_decision_level();
        solver.assign_boolean(cells[2], true);
        solver.assign_boolean(cells[1], false);
        assert!(solver.notify_and_propagate().is_err());
    }
}
