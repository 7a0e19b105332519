//! Clauses are the common currency between constraints, rule atoms, and conflict analysis: a
//! disjunction of [`Literal`]s of which at least one must hold.

use crate::engine::variables::Literal;
use crate::engine::variables::VariableId;

/// A disjunction of literals. Literals over the same variable are merged by taking the union of
/// their value sets when the clause is [normalized](Clause::normalize).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Clause {
        let mut clause = Clause { literals };
        clause.normalize();
        clause
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn into_literals(self) -> Vec<Literal> {
        self.literals
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn find(&self, variable: VariableId) -> Option<&Literal> {
        self.literals
            .iter()
            .find(|literal| literal.variable == variable)
    }

    /// Add a literal, merging it into an existing literal over the same variable.
    pub fn add(&mut self, literal: Literal) {
        if literal.values.is_empty() {
            return;
        }
        match self
            .literals
            .iter_mut()
            .find(|existing| existing.variable == literal.variable)
        {
            Some(existing) => existing.values.include(&literal.values),
            None => self.literals.push(literal),
        }
    }

    fn normalize(&mut self) {
        let mut merged: Vec<Literal> = Vec::with_capacity(self.literals.len());
        for literal in self.literals.drain(..) {
            if literal.values.is_empty() {
                continue;
            }
            match merged
                .iter_mut()
                .find(|existing| existing.variable == literal.variable)
            {
                Some(existing) => existing.values.include(&literal.values),
                None => merged.push(literal),
            }
        }
        self.literals = merged;
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Clause {
        Clause::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Clause {
    type Item = Literal;
    type IntoIter = std::vec::IntoIter<Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.literals.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Clause;
    use crate::basic_types::ValueSet;
    use crate::engine::variables::Literal;
    use crate::engine::variables::VariableId;

    #[test]
    fn same_variable_literals_are_merged() {
        let variable = VariableId::new(3);
        let mut clause = Clause::default();
        clause.add(Literal::new(variable, ValueSet::singleton(4, 0)));
        clause.add(Literal::new(variable, ValueSet::singleton(4, 2)));

        assert_eq!(clause.len(), 1);
        let values = &clause.find(variable).unwrap().values;
        assert!(values.contains(0) && values.contains(2) && !values.contains(1));
    }

    #[test]
    fn empty_value_sets_are_dropped() {
        let mut clause = Clause::default();
        clause.add(Literal::new(VariableId::new(0), ValueSet::new_empty(4)));
        assert!(clause.is_empty());
    }
}
