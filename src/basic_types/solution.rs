use crate::engine::variables::VariableId;

/// A complete assignment extracted after a successful solve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    values: Vec<i32>,
}

impl Solution {
    pub(crate) fn new(values: Vec<i32>) -> Solution {
        Solution { values }
    }

    pub fn value(&self, variable: VariableId) -> i32 {
        self.values[variable.index()]
    }

    pub fn num_variables(&self) -> usize {
        self.values.len()
    }
}
