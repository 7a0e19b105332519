//! A Hamiltonian circuit stated as a rule program: edge choices, in/out-degree constraints
//! through negation, and recursive reachability (a non-tight program exercising unfounded-set
//! reasoning).

use std::rc::Rc;

use warren::topology::DigraphTopology;
use warren::topology::TopologyRef;
use warren::ConstraintSolver;
use warren::RuleProgram;
use warren::SolveResult;
use warren::Term;
use warren::TopologyEdges;

const EDGES: [(usize, usize); 7] = [(0, 1), (0, 2), (1, 2), (1, 3), (2, 0), (2, 3), (3, 0)];

fn build_program(graph: &TopologyRef) -> RuleProgram {
    let mut program = RuleProgram::new("hamilton");
    let edge = program.external("edge", Rc::new(TopologyEdges::new(Rc::clone(graph))));
    let path = program.formula("path", 2).unwrap();
    let reached = program.formula("reached", 1).unwrap();
    let has_out = program.formula("has_out", 1).unwrap();
    let has_in = program.formula("has_in", 1).unwrap();
    let node = program.formula("node", 1).unwrap();

    for vertex in 0..4 {
        program.fact(node.at([Term::int(vertex)])).unwrap();
    }

    // Any subset of edges may be on the tour.
    let x = program.wildcard("X");
    let y = program.wildcard("Y");
    program
        .rule(
            path.at([x.clone(), y.clone()]).choice(),
            [edge.at([x, y]).into()],
        )
        .unwrap();

    // At most one outgoing edge per node.
    let x = program.wildcard("X");
    let y = program.wildcard("Y");
    let z = program.wildcard("Z");
    program
        .disallow([
            path.at([x.clone(), y.clone()]).into(),
            path.at([x, z.clone()]).into(),
            y.not_equals(z),
        ])
        .unwrap();

    // At most one incoming edge per node.
    let x = program.wildcard("X");
    let y = program.wildcard("Y");
    let z = program.wildcard("Z");
    program
        .disallow([
            path.at([x.clone(), z.clone()]).into(),
            path.at([y.clone(), z]).into(),
            x.not_equals(y),
        ])
        .unwrap();

    // Every node is entered and left.
    let x = program.wildcard("X");
    let y = program.wildcard("Y");
    program
        .rule(has_out.at([x.clone()]), [path.at([x, y]).into()])
        .unwrap();
    let x = program.wildcard("X");
    let y = program.wildcard("Y");
    program
        .rule(has_in.at([y.clone()]), [path.at([x, y]).into()])
        .unwrap();

    let x = program.wildcard("X");
    program
        .disallow([node.at([x.clone()]).into(), has_out.not_at([x]).into()])
        .unwrap();
    let x = program.wildcard("X");
    program
        .disallow([node.at([x.clone()]).into(), has_in.not_at([x]).into()])
        .unwrap();

    // Reachability from node 0; circular support does not count.
    program.fact(reached.at([Term::int(0)])).unwrap();
    let x = program.wildcard("X");
    let y = program.wildcard("Y");
    program
        .rule(
            reached.at([y.clone()]),
            [reached.at([x.clone()]).into(), path.at([x, y]).into()],
        )
        .unwrap();
    let x = program.wildcard("X");
    program
        .disallow([node.at([x.clone()]).into(), reached.not_at([x]).into()])
        .unwrap();

    program
}

#[test]
fn four_node_tour_is_found() {
    let graph: TopologyRef = Rc::new(DigraphTopology::from_edges(4, EDGES));
    let mut solver = ConstraintSolver::new("hamilton", 23);
    let program = build_program(&graph);
    solver.add_program(program, Rc::clone(&graph)).unwrap();

    assert_eq!(solver.solve(), SolveResult::Solved);

    // Collect the chosen tour edges.
    let mut successor = [usize::MAX; 4];
    let mut chosen = Vec::new();
    for &(from, to) in &EDGES {
        let atom = solver
            .rules()
            .find_atom(&format!("path({from},{to})"))
            .expect("every edge has a path atom");
        let literal = solver.rules().atom_literal(atom).expect("choice atoms get literals");
        if solver.solved_value(literal.variable) == Some(1) {
            assert_eq!(successor[from], usize::MAX, "one outgoing edge per node");
            successor[from] = to;
            chosen.push((from, to));
        }
    }

    // Every chosen pair is a real edge, and following the successors from node 0 visits all
    // four nodes before closing the circuit.
    assert_eq!(chosen.len(), 4);
    let mut current = 0;
    let mut visited = [false; 4];
    for _ in 0..4 {
        assert!(!visited[current]);
        visited[current] = true;
        assert!(EDGES.contains(&(current, successor[current])));
        current = successor[current];
    }
    assert_eq!(current, 0, "the tour is a closed circuit");
    assert!(visited.iter().all(|&seen| seen));
}

#[test]
fn tour_is_unsatisfiable_without_the_closing_edge() {
    // Removing 3 -> 0 leaves node 3 with no way back; indegree/outdegree cannot be met.
    let edges: Vec<(usize, usize)> = EDGES
        .iter()
        .copied()
        .filter(|&edge| edge != (3, 0))
        .collect();
    let graph: TopologyRef = Rc::new(DigraphTopology::from_edges(4, edges));
    let mut solver = ConstraintSolver::new("hamilton-unsat", 23);
    let program = build_program(&graph);
    solver.add_program(program, Rc::clone(&graph)).unwrap();

    assert_eq!(solver.solve(), SolveResult::Unsatisfiable);
}
