//! Towers of Hanoi with three disks in the minimum seven moves. Each turn's configuration is
//! one variable (ternary encoding of the three disk positions); a table constraint between
//! consecutive turns allows exactly the legal single-disk moves.

use warren::ConstraintSolver;
use warren::SolveResult;
use warren::VariableDomain;
use warren::VariableId;

const NUM_DISKS: u32 = 3;
const NUM_STATES: i32 = 27;
const NUM_TURNS: usize = 8; // initial configuration plus seven moves

fn peg_of(state: i32, disk: u32) -> i32 {
    (state / 3i32.pow(disk)) % 3
}

fn with_disk_on(state: i32, disk: u32, peg: i32) -> i32 {
    state + (peg - peg_of(state, disk)) * 3i32.pow(disk)
}

/// Disk `disk` may move iff no smaller disk sits on its peg, and may land on any peg that
/// holds no smaller disk.
fn legal_moves() -> Vec<Vec<i32>> {
    let mut moves = Vec::new();
    for state in 0..NUM_STATES {
        for disk in 0..NUM_DISKS {
            let from = peg_of(state, disk);
            let blocked = (0..disk).any(|smaller| peg_of(state, smaller) == from);
            if blocked {
                continue;
            }
            for to in 0..3 {
                if to == from {
                    continue;
                }
                let occupied = (0..disk).any(|smaller| peg_of(state, smaller) == to);
                if !occupied {
                    moves.push(vec![state, with_disk_on(state, disk, to)]);
                }
            }
        }
    }
    moves
}

#[test]
fn three_disks_in_seven_moves() {
    let mut solver = ConstraintSolver::new("hanoi", 31);

    let turns: Vec<VariableId> = (0..NUM_TURNS)
        .map(|turn| {
            solver
                .new_variable(format!("turn{turn}"), VariableDomain::new(0, NUM_STATES - 1))
                .unwrap()
        })
        .collect();

    // All disks start on peg 0 and end on peg 1.
    let start = 0;
    let goal = 1 + 3 + 9;
    let _ = solver.add_clause([solver.eq_literal(turns[0], start)]).unwrap();
    let _ = solver
        .add_clause([solver.eq_literal(turns[NUM_TURNS - 1], goal)])
        .unwrap();

    let moves = legal_moves();
    for pair in turns.windows(2) {
        let _ = solver
            .add_table(vec![pair[0], pair[1]], moves.clone())
            .unwrap();
    }

    assert_eq!(solver.solve(), SolveResult::Solved);

    let states: Vec<i32> = turns
        .iter()
        .map(|&turn| solver.solved_value(turn).unwrap())
        .collect();
    assert_eq!(states[0], start);
    assert_eq!(states[NUM_TURNS - 1], goal);

    for pair in states.windows(2) {
        assert!(
            moves.contains(&vec![pair[0], pair[1]]),
            "turn {} -> {} is not a legal move",
            pair[0],
            pair[1]
        );
        // Exactly one disk moved, and never onto a smaller disk.
        let moved: Vec<u32> = (0..NUM_DISKS)
            .filter(|&disk| peg_of(pair[0], disk) != peg_of(pair[1], disk))
            .collect();
        assert_eq!(moved.len(), 1);
        let disk = moved[0];
        let target = peg_of(pair[1], disk);
        for smaller in 0..disk {
            assert_ne!(
                peg_of(pair[1], smaller),
                target,
                "a bigger disk landed on a smaller one"
            );
        }
    }
}
