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

/// All variables take pairwise distinct values. Propagation removes the value of every solved
/// variable from all other variables.
pub(crate) struct AllDifferentPropagator {
    variables: Box<[VariableId]>,
}

impl AllDifferentPropagator {
    pub(crate) fn new(variables: Box<[VariableId]>) -> AllDifferentPropagator {
        AllDifferentPropagator { variables }
    }

    fn solved_value_of(
        context: &ExplanationContext<'_>,
        variable: VariableId,
    ) -> Option<i32> {
        let values = context.values_before(variable);
        values
            .is_singleton()
            .then(|| context.domain(variable).index_to_value(values.singleton_index()))
    }
}

impl Propagator for AllDifferentPropagator {
    fn name(&self) -> &str {
        "AllDifferent"
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for &variable in self.variables.iter() {
            let _ = context.register(variable, EnumSet::only(WatchEvent::BecameSingleton));
        }
        Ok(())
    }

    fn on_narrowed(
        &mut self,
        context: &mut PropagationContextMut,
        variable: VariableId,
        _previous: &ValueSet,
    ) -> PropagationStatus {
        let Some(index) = context.solved_index(variable) else {
            return Ok(());
        };
        let value = context.domain(variable).index_to_value(index);

        for &other in self.variables.iter() {
            if other == variable {
                continue;
            }
            if let Some(other_index) = context.domain(other).value_to_index(value) {
                let mask = ValueSet::singleton(context.domain(other).size(), other_index);
                context.exclude(other, &mask)?;
            }
        }
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        for position in 0..self.variables.len() {
            let variable = self.variables[position];
            if context.is_solved(variable) {
                let previous = context.potential_values(variable).clone();
                self.on_narrowed(context, variable, &previous)?;
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
        // The values that were stripped from `variable` each belong to another variable that
        // was already solved to them at the time of the narrowing.
        let previous = context.values_before(variable);
        let removed = previous.difference(values);
        let domain = context.domain(variable);

        let mut clause = Clause::default();
        clause.add(Literal::new(variable, values.clone()));
        for removed_index in removed.iter_set() {
            let removed_value = domain.index_to_value(removed_index);
            let culprit = self.variables.iter().find(|&&other| {
                other != variable
                    && Self::solved_value_of(context, other) == Some(removed_value)
            });
            if let Some(&culprit) = culprit {
                let culprit_domain = context.domain(culprit);
                let culprit_index = culprit_domain
                    .value_to_index(removed_value)
                    .expect("the culprit is solved to this value");
                let mask = ValueSet::singleton(culprit_domain.size(), culprit_index).inverted();
                clause.add(Literal::new(culprit, mask));
            }
        }
        clause
    }

    fn check_conflicting(&self, store: &VariableStore) -> bool {
        for (position, &variable) in self.variables.iter().enumerate() {
            let Some(value) = store.solved_value(variable) else {
                continue;
            };
            for &other in &self.variables[position + 1..] {
                if store.solved_value(other) == Some(value) {
                    return true;
                }
            }
        }
        false
    }
}
