use enumset::EnumSet;

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
use crate::engine::watch_list::WatchEvent;

/// Bounds on how often a value may be taken across a set of variables.
#[derive(Clone, Copy, Debug)]
pub struct ValueBound {
    pub value: i32,
    pub min_occurrences: usize,
    pub max_occurrences: usize,
}

/// Enforces per-value occurrence bounds: once a value's maximum is reached by solved
/// variables, it is stripped everywhere else; once the variables that can still take a value
/// are down to its minimum, they are all forced to it.
pub(crate) struct CardinalityPropagator {
    variables: Box<[VariableId]>,
    bounds: Vec<ValueBound>,
}

impl CardinalityPropagator {
    pub(crate) fn new(variables: Box<[VariableId]>, bounds: Vec<ValueBound>) -> CardinalityPropagator {
        CardinalityPropagator { variables, bounds }
    }

    fn index_of(
        context: &PropagationContextMut<'_>,
        variable: VariableId,
        value: i32,
    ) -> Option<usize> {
        context.domain(variable).value_to_index(value)
    }
}

impl Propagator for CardinalityPropagator {
    fn name(&self) -> &str {
        "Cardinality"
    }

    fn priority(&self) -> u32 {
        1
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for &variable in self.variables.iter() {
            let _ = context.register(variable, EnumSet::only(WatchEvent::AnyChange));
        }
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        for bound_position in 0..self.bounds.len() {
            let bound = self.bounds[bound_position];

            let mut solved_to_value = Vec::new();
            let mut can_take_value = Vec::new();
            for &variable in self.variables.iter() {
                let Some(index) = Self::index_of(context, variable, bound.value) else {
                    continue;
                };
                if !context.potential_values(variable).contains(index) {
                    continue;
                }
                can_take_value.push(variable);
                if context.solved_index(variable) == Some(index) {
                    solved_to_value.push(variable);
                }
            }

            if solved_to_value.len() > bound.max_occurrences {
                return Err(Inconsistency::Conflict(self.at_most_clause(
                    context,
                    bound.value,
                    &solved_to_value,
                )));
            }

            if can_take_value.len() < bound.min_occurrences {
                let mut clause = Clause::default();
                for &variable in self.variables.iter() {
                    if let Some(index) = Self::index_of(context, variable, bound.value) {
                        if !can_take_value.contains(&variable) {
                            let size = context.domain(variable).size();
                            clause.add(Literal::new(variable, ValueSet::singleton(size, index)));
                        }
                    }
                }
                return Err(Inconsistency::Conflict(clause));
            }

            if solved_to_value.len() == bound.max_occurrences {
                for &variable in &can_take_value {
                    if context.solved_index(variable).is_some() {
                        continue;
                    }
                    let index = Self::index_of(context, variable, bound.value)
                        .expect("variable can take the value");
                    let size = context.domain(variable).size();
                    context.exclude(variable, &ValueSet::singleton(size, index))?;
                }
            }

            if can_take_value.len() == bound.min_occurrences && bound.min_occurrences > 0 {
                for &variable in &can_take_value {
                    let index = Self::index_of(context, variable, bound.value)
                        .expect("variable can take the value");
                    let size = context.domain(variable).size();
                    context.constrain(variable, &ValueSet::singleton(size, index))?;
                }
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
        let previous = context.values_before(variable);
        let removed = previous.difference(values);
        let domain = context.domain(variable);

        if removed.is_singleton() {
            // An exclusion: the value's maximum was reached by variables solved to it.
            let removed_value = domain.index_to_value(removed.singleton_index());
            let mut clause = Clause::default();
            clause.add(Literal::new(variable, values.clone()));
            for &other in self.variables.iter() {
                if other == variable {
                    continue;
                }
                let other_domain = context.domain(other);
                if let Some(index) = other_domain.value_to_index(removed_value) {
                    let held = context.values_before(other);
                    if held.is_singleton() && held.singleton_index() == index {
                        let mask = ValueSet::singleton(other_domain.size(), index).inverted();
                        clause.add(Literal::new(other, mask));
                    }
                }
            }
            clause
        } else {
            // A forcing: every other variable that could have taken the value had lost it.
            let forced_value = domain.index_to_value(
                values
                    .first_set()
                    .expect("a forcing narrows to a non-empty set"),
            );
            let mut clause = Clause::default();
            clause.add(Literal::new(variable, values.clone()));
            for &other in self.variables.iter() {
                if other == variable {
                    continue;
                }
                let other_domain = context.domain(other);
                if let Some(index) = other_domain.value_to_index(forced_value) {
                    if !context.values_before(other).contains(index) {
                        let mask = ValueSet::singleton(other_domain.size(), index);
                        clause.add(Literal::new(other, mask));
                    }
                }
            }
            clause
        }
    }

    fn check_conflicting(&self, store: &VariableStore) -> bool {
        for bound in &self.bounds {
            let occurrences = self
                .variables
                .iter()
                .filter(|&&variable| store.solved_value(variable) == Some(bound.value))
                .count();
            if occurrences > bound.max_occurrences || occurrences < bound.min_occurrences {
                return true;
            }
        }
        false
    }
}

impl CardinalityPropagator {
    fn at_most_clause(
        &self,
        context: &PropagationContextMut<'_>,
        value: i32,
        solved: &[VariableId],
    ) -> Clause {
        let mut clause = Clause::default();
        for &variable in solved {
            let domain = context.domain(variable);
            let index = domain
                .value_to_index(value)
                .expect("solved variables hold the value");
            clause.add(Literal::new(
                variable,
                ValueSet::singleton(domain.size(), index).inverted(),
            ));
        }
        clause
    }
}
