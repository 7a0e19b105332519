mod contexts;
mod propagator;

pub(crate) use contexts::ExplanationContext;
pub(crate) use contexts::PropagationContextMut;
pub(crate) use contexts::PropagatorInitialisationContext;
pub(crate) use propagator::Propagator;

/// The identity of a propagator; an index into the solver's propagator list. Constraints are
/// numbered by creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PropagatorId(pub(crate) u32);

impl PropagatorId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
