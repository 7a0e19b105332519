//! End-to-end checks of the search engine on small propositional problems, plus the
//! reproducibility guarantees: determinism under a fixed seed and decision-log replay.

use warren::ConstraintSolver;
use warren::DecisionStrategy;
use warren::SolveResult;
use warren::VariableDomain;
use warren::VariableId;

fn build_triangle(solver: &mut ConstraintSolver) -> Vec<VariableId> {
    let variables: Vec<VariableId> = ["a", "b", "c"]
        .iter()
        .map(|name| solver.new_boolean(*name).unwrap())
        .collect();

    let pairs = [(0, 1), (1, 2), (0, 2)];
    for (left, right) in pairs {
        let a = solver.true_literal(variables[left]);
        let b = solver.true_literal(variables[right]);
        // At least one of each pair, and at most one of each pair.
        let _ = solver.add_clause([a.clone(), b.clone()]).unwrap();
        let _ = solver.add_clause([a.negated(), b.negated()]).unwrap();
    }
    variables
}

#[test]
fn unsatisfiable_triangle() {
    let mut solver = ConstraintSolver::new("triangle", 3);
    let _ = build_triangle(&mut solver);
    assert_eq!(solver.solve(), SolveResult::Unsatisfiable);
}

fn queens_problem(solver: &mut ConstraintSolver, size: i32) -> Vec<VariableId> {
    let queens: Vec<VariableId> = (0..size)
        .map(|column| {
            solver
                .new_variable(format!("q{column}"), VariableDomain::new(0, size - 1))
                .unwrap()
        })
        .collect();
    let _ = solver.add_all_different(queens.clone()).unwrap();

    let mut up_diagonals = Vec::new();
    let mut down_diagonals = Vec::new();
    for (column, &queen) in queens.iter().enumerate() {
        let offset = column as i32;
        let up = solver
            .new_variable(format!("up{column}"), VariableDomain::new(0, 2 * size - 2))
            .unwrap();
        let down = solver
            .new_variable(
                format!("down{column}"),
                VariableDomain::new(-size + 1, size - 1),
            )
            .unwrap();
        let _ = solver.add_offset(queen, up, offset).unwrap();
        let _ = solver.add_offset(queen, down, -offset).unwrap();
        up_diagonals.push(up);
        down_diagonals.push(down);
    }
    let _ = solver.add_all_different(up_diagonals).unwrap();
    let _ = solver.add_all_different(down_diagonals).unwrap();
    queens
}

#[test]
fn identical_seeds_give_identical_runs() {
    let mut logs = Vec::new();
    let mut solutions = Vec::new();
    for _ in 0..2 {
        let mut solver = ConstraintSolver::new("determinism", 99);
        solver.enable_decision_log();
        let queens = queens_problem(&mut solver, 6);
        assert_eq!(solver.solve(), SolveResult::Solved);
        logs.push(solver.decision_log().entries().to_vec());
        solutions.push(
            queens
                .iter()
                .map(|&queen| solver.solved_value(queen).unwrap())
                .collect::<Vec<_>>(),
        );
    }
    assert_eq!(logs[0], logs[1]);
    assert_eq!(solutions[0], solutions[1]);
}

#[test]
fn decision_log_replay_reproduces_the_solution() {
    let path = std::env::temp_dir().join("warren_replay_test.log");

    let mut recording = ConstraintSolver::new("recording", 12);
    recording.enable_decision_log();
    let queens = queens_problem(&mut recording, 6);
    assert_eq!(recording.solve(), SolveResult::Solved);
    let recorded: Vec<i32> = queens
        .iter()
        .map(|&queen| recording.solved_value(queen).unwrap())
        .collect();
    recording.decision_log().write_to(&path).unwrap();

    let log = warren::SolverDecisionLog::read_from(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    // A different seed, but the replayed decisions steer the search the same way.
    let mut replaying = ConstraintSolver::new("replaying", 999);
    let queens = queens_problem(&mut replaying, 6);
    replaying.push_heuristic(DecisionStrategy::LogReplay(log));
    assert_eq!(replaying.solve(), SolveResult::Solved);
    let replayed: Vec<i32> = queens
        .iter()
        .map(|&queen| replaying.solved_value(queen).unwrap())
        .collect();

    assert_eq!(recorded, replayed);
}

#[test]
fn alternative_heuristics_solve_the_same_problem() {
    for strategy in [DecisionStrategy::Lrb, DecisionStrategy::StaticOrder] {
        let mut solver = ConstraintSolver::new("heuristics", 5);
        let queens = queens_problem(&mut solver, 6);
        solver.push_heuristic(strategy);
        assert_eq!(solver.solve(), SolveResult::Solved);

        let values: Vec<i32> = queens
            .iter()
            .map(|&queen| solver.solved_value(queen).unwrap())
            .collect();
        for i in 0..values.len() {
            for j in i + 1..values.len() {
                assert_ne!(values[i], values[j]);
            }
        }
    }
}

#[test]
fn statistics_are_tracked() {
    let mut solver = ConstraintSolver::new("stats", 17);
    let _ = queens_problem(&mut solver, 8);
    assert_eq!(solver.solve(), SolveResult::Solved);

    let stats = solver.stats();
    assert!(stats.num_decisions() > 0);
    assert!(stats.num_steps() >= stats.num_decisions());
}

#[test]
fn conflicts_are_analysed_and_learned_from() {
    // Three pigeons, two holes: the root is consistent, so the search has to decide, run
    // into conflicts, learn from them, and backjump before unsatisfiability is proven.
    let mut solver = ConstraintSolver::new("pigeonhole", 13);
    let pigeons: Vec<VariableId> = (0..3)
        .map(|pigeon| {
            solver
                .new_variable(format!("pigeon{pigeon}"), VariableDomain::new(0, 1))
                .unwrap()
        })
        .collect();
    let _ = solver.add_all_different(pigeons).unwrap();

    assert_eq!(solver.solve(), SolveResult::Unsatisfiable);

    let stats = solver.stats();
    assert!(stats.num_conflicts() > 0, "the search must hit a conflict");
    assert!(stats.num_learned_clauses() > 0);
    assert!(stats.num_backjumps() > 0);
}
