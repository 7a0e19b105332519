use bitfield::bitfield;

use crate::engine::propagation::PropagatorId;

bitfield! {
    /// The cause recorded on a trail entry: either a user decision or the constraint that
    /// performed the narrowing, packed into a single word.
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConstraintReference(u32);
    impl Debug;
    u32;
    constraint_index, set_constraint_index: 30, 0;
    decision_bit, set_decision_bit: 31, 31;
}

impl ConstraintReference {
    pub fn decision() -> ConstraintReference {
        let mut reference = ConstraintReference(0);
        reference.set_decision_bit(1);
        reference
    }

    pub fn constraint(propagator: PropagatorId) -> ConstraintReference {
        let mut reference = ConstraintReference(0);
        reference.set_constraint_index(propagator.0);
        reference
    }

    pub fn is_decision(&self) -> bool {
        self.decision_bit() != 0
    }

    pub fn as_propagator(&self) -> Option<PropagatorId> {
        if self.is_decision() {
            None
        } else {
            Some(PropagatorId(self.constraint_index()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConstraintReference;
    use crate::engine::propagation::PropagatorId;

    #[test]
    fn decision_and_constraint_references_are_distinct() {
        let decision = ConstraintReference::decision();
        let constraint = ConstraintReference::constraint(PropagatorId(0));

        assert!(decision.is_decision());
        assert_eq!(decision.as_propagator(), None);
        assert!(!constraint.is_decision());
        assert_eq!(constraint.as_propagator(), Some(PropagatorId(0)));
    }

    #[test]
    fn constraint_index_round_trips() {
        let reference = ConstraintReference::constraint(PropagatorId(123_456));
        assert_eq!(reference.as_propagator(), Some(PropagatorId(123_456)));
    }
}
