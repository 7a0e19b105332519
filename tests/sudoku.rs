//! Sudoku: 81 variables over [1..9], an all-different per row, column, and box, and the 17
//! clues of a minimal puzzle. Redundant per-unit cardinality constraints strengthen
//! propagation (hidden singles) without changing the solution set.

use warren::ConstraintSolver;
use warren::SolveResult;
use warren::ValueBound;
use warren::ValueSet;
use warren::VariableDomain;
use warren::VariableId;

/// A 17-clue minimal puzzle (Royle's collection), row-major, 0 for blanks.
const PUZZLE: &str = "000000010400000000020000000000050407008000300001090000300400200050100000000806000";

fn units() -> Vec<Vec<usize>> {
    let mut units = Vec::new();
    for row in 0..9 {
        units.push((0..9).map(|column| row * 9 + column).collect());
    }
    for column in 0..9 {
        units.push((0..9).map(|row| row * 9 + column).collect());
    }
    for box_row in 0..3 {
        for box_column in 0..3 {
            let mut unit = Vec::new();
            for row in 0..3 {
                for column in 0..3 {
                    unit.push((box_row * 3 + row) * 9 + box_column * 3 + column);
                }
            }
            units.push(unit);
        }
    }
    units
}

#[test]
fn seventeen_clue_puzzle_is_solved() {
    let mut solver = ConstraintSolver::new("sudoku", 7);

    let cells: Vec<VariableId> = PUZZLE
        .bytes()
        .enumerate()
        .map(|(index, clue)| {
            let domain = VariableDomain::new(1, 9);
            let name = format!("cell{}_{}", index / 9, index % 9);
            if clue == b'0' {
                solver.new_variable(name, domain).unwrap()
            } else {
                let value = i32::from(clue - b'0');
                let initial =
                    ValueSet::singleton(domain.size(), domain.value_to_index(value).unwrap());
                solver
                    .new_variable_with_initial(name, domain, initial)
                    .unwrap()
            }
        })
        .collect();

    for unit in units() {
        let members: Vec<VariableId> = unit.iter().map(|&cell| cells[cell]).collect();
        let _ = solver.add_all_different(members.clone()).unwrap();

        // Redundant: each digit appears exactly once per unit.
        let bounds = (1..=9)
            .map(|value| ValueBound {
                value,
                min_occurrences: 1,
                max_occurrences: 1,
            })
            .collect();
        let _ = solver.add_cardinality(members, bounds).unwrap();
    }

    assert_eq!(solver.solve(), SolveResult::Solved);

    for unit in units() {
        let mut seen = [false; 10];
        for &cell in &unit {
            let value = solver.solved_value(cells[cell]).unwrap();
            assert!((1..=9).contains(&value));
            assert!(!seen[value as usize], "value repeated within a unit");
            seen[value as usize] = true;
        }
    }

    // The clues survived.
    for (index, clue) in PUZZLE.bytes().enumerate() {
        if clue != b'0' {
            assert_eq!(
                solver.solved_value(cells[index]).unwrap(),
                i32::from(clue - b'0')
            );
        }
    }
}
