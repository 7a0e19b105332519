//! Eight queens: one variable per column, an all-different over the rows, and all-differents
//! over both families of shifted diagonal copies.

use warren::ConstraintSolver;
use warren::SolveResult;
use warren::VariableDomain;
use warren::VariableId;

const N: i32 = 8;

#[test]
fn eight_queens_has_no_attacks() {
    let mut solver = ConstraintSolver::new("nqueens", 11);

    let queens: Vec<VariableId> = (0..N)
        .map(|column| {
            solver
                .new_variable(format!("q{column}"), VariableDomain::new(0, N - 1))
                .unwrap()
        })
        .collect();
    let _ = solver.add_all_different(queens.clone()).unwrap();

    // Shifted copies: up[i] = q[i] + i and down[i] = q[i] - i; distinct diagonals mean
    // distinct shifted values.
    let mut up_diagonals = Vec::new();
    let mut down_diagonals = Vec::new();
    for (column, &queen) in queens.iter().enumerate() {
        let offset = column as i32;
        let up = solver
            .new_variable(format!("up{column}"), VariableDomain::new(0, 2 * N - 2))
            .unwrap();
        let down = solver
            .new_variable(format!("down{column}"), VariableDomain::new(1 - N, N - 1))
            .unwrap();
        let _ = solver.add_offset(queen, up, offset).unwrap();
        let _ = solver.add_offset(queen, down, -offset).unwrap();
        up_diagonals.push(up);
        down_diagonals.push(down);
    }
    let _ = solver.add_all_different(up_diagonals).unwrap();
    let _ = solver.add_all_different(down_diagonals).unwrap();

    assert_eq!(solver.solve(), SolveResult::Solved);

    let rows: Vec<i32> = queens
        .iter()
        .map(|&queen| solver.solved_value(queen).unwrap())
        .collect();
    for i in 0..rows.len() {
        for j in i + 1..rows.len() {
            assert_ne!(rows[i], rows[j], "two queens share a row");
            assert_ne!(
                (rows[i] - rows[j]).abs(),
                (j - i) as i32,
                "two queens share a diagonal"
            );
        }
    }
}
