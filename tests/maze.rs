//! Maze generation on a 5x5 grid: boolean blank/wall cells, a reachability constraint from
//! the entrance through blank cells, and no uniform 2x2 block of either kind.

use std::collections::VecDeque;
use std::rc::Rc;

use warren::topology::GridTopology;
use warren::topology::Topology;
use warren::ConstraintSolver;
use warren::GraphVariableRelation;
use warren::Literal;
use warren::SolveResult;
use warren::VariableId;

const SIZE: usize = 5;

fn blanks_topology(grid: &Rc<GridTopology>) -> Rc<dyn Topology> {
    Rc::clone(grid) as Rc<dyn Topology>
}

#[test]
fn maze_with_connected_blanks() {
    let mut solver = ConstraintSolver::new("maze", 41);
    let grid = Rc::new(GridTopology::new(SIZE, SIZE));

    // One boolean per cell: 1 = blank, 0 = wall.
    let cells: Vec<VariableId> = (0..grid.num_vertices())
        .map(|vertex| {
            solver
                .new_boolean(format!("cell{}", grid.vertex_to_string(vertex)))
                .unwrap()
        })
        .collect();

    let entrance = grid.vertex_at(0, 0);
    let exit = grid.vertex_at(SIZE - 1, SIZE - 1);
    let _ = solver
        .add_clause([solver.true_literal(cells[entrance])])
        .unwrap();
    let _ = solver.add_clause([solver.true_literal(cells[exit])]).unwrap();

    // Every blank must stay reachable from the entrance through blanks.
    let _ = solver
        .add_reachability(blanks_topology(&grid), cells.clone(), entrance)
        .unwrap();

    // No 2x2 block entirely blank or entirely wall.
    for x in 0..SIZE - 1 {
        for y in 0..SIZE - 1 {
            let block = [
                cells[grid.vertex_at(x, y)],
                cells[grid.vertex_at(x + 1, y)],
                cells[grid.vertex_at(x, y + 1)],
                cells[grid.vertex_at(x + 1, y + 1)],
            ];
            let some_blank: Vec<Literal> = block
                .iter()
                .map(|&cell| solver.true_literal(cell))
                .collect();
            let some_wall: Vec<Literal> = block
                .iter()
                .map(|&cell| solver.true_literal(cell).negated())
                .collect();
            let _ = solver.add_clause(some_blank).unwrap();
            let _ = solver.add_clause(some_wall).unwrap();
        }
    }

    // Cell variables form a vertex relation, so learned clauses over them can be promoted
    // across the grid.
    let mut relation = GraphVariableRelation::new("cell".to_owned(), blanks_topology(&grid));
    for (vertex, &cell) in cells.iter().enumerate() {
        relation.bind(vertex, cell);
    }
    solver.register_graph_relation(relation);

    assert_eq!(solver.solve(), SolveResult::Solved);

    let blank: Vec<bool> = cells
        .iter()
        .map(|&cell| solver.solved_value(cell) == Some(1))
        .collect();
    assert!(blank[entrance] && blank[exit]);

    // Breadth-first search over blanks from the entrance reaches every blank.
    let mut reached = vec![false; blank.len()];
    let mut queue = VecDeque::from([entrance]);
    reached[entrance] = true;
    while let Some(vertex) = queue.pop_front() {
        for next in grid.outgoing(vertex) {
            if blank[next] && !reached[next] {
                reached[next] = true;
                queue.push_back(next);
            }
        }
    }
    for vertex in 0..blank.len() {
        assert!(
            !blank[vertex] || reached[vertex],
            "blank cell {} is cut off from the entrance",
            grid.vertex_to_string(vertex)
        );
    }

    // No uniform 2x2 block.
    for x in 0..SIZE - 1 {
        for y in 0..SIZE - 1 {
            let values = [
                blank[grid.vertex_at(x, y)],
                blank[grid.vertex_at(x + 1, y)],
                blank[grid.vertex_at(x, y + 1)],
                blank[grid.vertex_at(x + 1, y + 1)],
            ];
            assert!(values.iter().any(|&value| value));
            assert!(values.iter().any(|&value| !value));
        }
    }
}
