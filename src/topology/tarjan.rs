//! Iterative Tarjan strongly-connected-components search, used for loop detection in the rule
//! layer and for ordering rule statements in the grounder.

#[derive(Debug)]
pub(crate) struct SccResult {
    /// For each node, the index of its component in `components`.
    pub(crate) component_of: Vec<usize>,
    /// Components in emission order: every edge between two components goes from a
    /// later-emitted component to an earlier-emitted one, so iterating in emission order
    /// visits the condensation in reverse topological order.
    pub(crate) components: Vec<Vec<usize>>,
}

pub(crate) fn find_sccs(adjacency: &[Vec<usize>]) -> SccResult {
    let num_nodes = adjacency.len();
    let mut state = TarjanState {
        adjacency,
        index: vec![usize::MAX; num_nodes],
        low_link: vec![0; num_nodes],
        on_stack: vec![false; num_nodes],
        stack: Vec::new(),
        next_index: 0,
        component_of: vec![usize::MAX; num_nodes],
        components: Vec::new(),
    };

    for root in 0..num_nodes {
        if state.index[root] == usize::MAX {
            state.visit(root);
        }
    }

    SccResult {
        component_of: state.component_of,
        components: state.components,
    }
}

struct TarjanState<'a> {
    adjacency: &'a [Vec<usize>],
    index: Vec<usize>,
    low_link: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    component_of: Vec<usize>,
    components: Vec<Vec<usize>>,
}

impl TarjanState<'_> {
    /// Depth-first search with an explicit call stack; each frame remembers how many
    /// successors it has already explored.
    fn visit(&mut self, root: usize) {
        let mut call_stack: Vec<(usize, usize)> = vec![(root, 0)];
        self.open(root);

        while !call_stack.is_empty() {
            let top = call_stack.len() - 1;
            let (node, cursor) = call_stack[top];

            if cursor < self.adjacency[node].len() {
                call_stack[top].1 += 1;
                let successor = self.adjacency[node][cursor];

                if self.index[successor] == usize::MAX {
                    self.open(successor);
                    call_stack.push((successor, 0));
                } else if self.on_stack[successor] {
                    self.low_link[node] = self.low_link[node].min(self.index[successor]);
                }
            } else {
                let _ = call_stack.pop();
                if self.low_link[node] == self.index[node] {
                    self.pop_component(node);
                }
                if let Some(&(parent, _)) = call_stack.last() {
                    self.low_link[parent] = self.low_link[parent].min(self.low_link[node]);
                }
            }
        }
    }

    fn open(&mut self, node: usize) {
        self.index[node] = self.next_index;
        self.low_link[node] = self.next_index;
        self.next_index += 1;
        self.on_stack[node] = true;
        self.stack.push(node);
    }

    fn pop_component(&mut self, representative: usize) {
        let component_index = self.components.len();
        let mut members = Vec::new();
        loop {
            let member = self.stack.pop().expect("representative is on the stack");
            self.on_stack[member] = false;
            self.component_of[member] = component_index;
            members.push(member);
            if member == representative {
                break;
            }
        }
        self.components.push(members);
    }
}

#[cfg(test)]
mod tests {
    use super::find_sccs;

    #[test]
    fn cycles_are_grouped() {
        // 0 -> 1 -> 2 -> 0 forms a cycle; 3 hangs off it.
        let adjacency = vec![vec![1], vec![2], vec![0, 3], vec![]];
        let result = find_sccs(&adjacency);

        assert_eq!(result.component_of[0], result.component_of[1]);
        assert_eq!(result.component_of[1], result.component_of[2]);
        assert_ne!(result.component_of[0], result.component_of[3]);
        assert_eq!(result.components.len(), 2);
    }

    #[test]
    fn emission_order_is_reverse_topological() {
        // Chain 0 -> 1 -> 2: components must be emitted 2, 1, 0.
        let adjacency = vec![vec![1], vec![2], vec![]];
        let result = find_sccs(&adjacency);

        for (from, successors) in adjacency.iter().enumerate() {
            for &to in successors {
                assert!(
                    result.component_of[from] >= result.component_of[to],
                    "edge {from}->{to} must not point at a later component"
                );
            }
        }
    }

    #[test]
    fn self_loop_forms_singleton_component() {
        let adjacency = vec![vec![0], vec![]];
        let result = find_sccs(&adjacency);
        assert_eq!(result.components.len(), 2);
        assert_ne!(result.component_of[0], result.component_of[1]);
    }
}
