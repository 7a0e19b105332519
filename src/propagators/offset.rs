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
use crate::engine::variables::VariableDomain;
use crate::engine::variables::VariableId;
use crate::engine::watch_list::WatchEvent;

/// Channels `target = source + offset`. The two domains may differ; masks are translated
/// through the value space.
pub(crate) struct OffsetPropagator {
    source: VariableId,
    target: VariableId,
    offset: i32,
}

impl OffsetPropagator {
    pub(crate) fn new(source: VariableId, target: VariableId, offset: i32) -> OffsetPropagator {
        OffsetPropagator {
            source,
            target,
            offset,
        }
    }
}

/// The image of `values` under `value -> value + offset`, expressed in `to`'s index space.
pub(crate) fn shifted_mask(
    values: &ValueSet,
    from: VariableDomain,
    to: VariableDomain,
    offset: i32,
) -> ValueSet {
    let mut mask = ValueSet::new_empty(to.size());
    for index in values.iter_set() {
        let shifted = from.index_to_value(index) + offset;
        if let Some(to_index) = to.value_to_index(shifted) {
            mask.set(to_index);
        }
    }
    mask
}

impl Propagator for OffsetPropagator {
    fn name(&self) -> &str {
        "Offset"
    }

    fn priority(&self) -> u32 {
        0
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        let _ = context.register(self.source, EnumSet::only(WatchEvent::AnyChange));
        let _ = context.register(self.target, EnumSet::only(WatchEvent::AnyChange));
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        let source_domain = context.domain(self.source);
        let target_domain = context.domain(self.target);

        let forward = shifted_mask(
            context.potential_values(self.source),
            source_domain,
            target_domain,
            self.offset,
        );
        context.constrain(self.target, &forward)?;

        let backward = shifted_mask(
            context.potential_values(self.target),
            target_domain,
            source_domain,
            -self.offset,
        );
        context.constrain(self.source, &backward)?;
        Ok(())
    }

    fn explain(
        &self,
        context: &ExplanationContext<'_>,
        variable: VariableId,
        values: &ValueSet,
    ) -> Clause {
        context.generic_explanation([self.source, self.target], variable, values)
    }

    fn check_conflicting(&self, store: &VariableStore) -> bool {
        match (store.solved_value(self.source), store.solved_value(self.target)) {
            (Some(source), Some(target)) => target != source + self.offset,
            _ => false,
        }
    }
}
