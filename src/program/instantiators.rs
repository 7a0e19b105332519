//! Instantiators: cursors over the possible matches of one ordered body term. The grounder
//! recurses through them like nested loops, advancing the innermost cursor, backtracking when
//! one is exhausted.

use std::rc::Rc;

use crate::program::ast::BinaryOpType;
use crate::program::ast::TermKind;
use crate::program::ast::WildcardId;
use crate::program::compiler::GroundState;
use crate::program::externals::ExternalPredicate;
use crate::program::symbols::ProgramSymbol;
use crate::warren_assert_simple;

/// The wildcard bindings (plus the grounding vertex) threaded through the cursor recursion.
#[derive(Debug)]
pub(crate) struct GroundingEnv {
    pub(crate) bindings: Vec<Option<ProgramSymbol>>,
    pub(crate) bound_vertex: Option<usize>,
    pub(crate) num_vertices: usize,
}

impl GroundingEnv {
    pub(crate) fn new(num_wildcards: usize, num_vertices: usize) -> GroundingEnv {
        GroundingEnv {
            bindings: vec![None; num_wildcards],
            bound_vertex: None,
            num_vertices,
        }
    }
}

/// What a cursor bound, so it can be unbound when the cursor advances.
#[derive(Debug, Clone, Copy)]
enum SavedBinding {
    Wildcard(WildcardId),
    Vertex,
}

fn undo(env: &mut GroundingEnv, saved: &mut Vec<SavedBinding>) {
    for binding in saved.drain(..) {
        match binding {
            SavedBinding::Wildcard(wildcard) => env.bindings[wildcard.0 as usize] = None,
            SavedBinding::Vertex => env.bound_vertex = None,
        }
    }
}

/// Evaluate an arithmetic term under the current bindings. `None` means an unbound wildcard,
/// a type error, or division by zero: no match.
pub(crate) fn evaluate(term: &TermKind, env: &GroundingEnv) -> Option<ProgramSymbol> {
    match term {
        TermKind::Wildcard(wildcard) => env.bindings[wildcard.0 as usize],
        TermKind::Symbol(symbol) => Some(*symbol),
        TermKind::Vertex => env
            .bound_vertex
            .map(|vertex| ProgramSymbol::Int(vertex as i64)),
        TermKind::BinaryOp(op, left, right) => {
            let left = evaluate(left, env)?.as_int()?;
            let right = evaluate(right, env)?.as_int()?;
            let value = match op {
                BinaryOpType::Add => left + right,
                BinaryOpType::Subtract => left - right,
                BinaryOpType::Multiply => left * right,
                BinaryOpType::Divide => {
                    if right == 0 {
                        return None;
                    }
                    left / right
                }
                _ => return None,
            };
            Some(ProgramSymbol::Int(value))
        }
    }
}

/// Evaluate a relational term under the current bindings.
pub(crate) fn evaluate_condition(term: &TermKind, env: &GroundingEnv) -> Option<bool> {
    let TermKind::BinaryOp(op, left, right) = term else {
        // A bare term is judged by integer truthiness.
        return Some(evaluate(term, env)?.as_int()? != 0);
    };
    match op {
        BinaryOpType::Equal => Some(evaluate(left, env)? == evaluate(right, env)?),
        BinaryOpType::NotEqual => Some(evaluate(left, env)? != evaluate(right, env)?),
        BinaryOpType::LessThan => {
            Some(evaluate(left, env)?.as_int()? < evaluate(right, env)?.as_int()?)
        }
        BinaryOpType::LessThanEq => {
            Some(evaluate(left, env)?.as_int()? <= evaluate(right, env)?.as_int()?)
        }
        BinaryOpType::GreaterThan => {
            Some(evaluate(left, env)?.as_int()? > evaluate(right, env)?.as_int()?)
        }
        BinaryOpType::GreaterThanEq => {
            Some(evaluate(left, env)?.as_int()? >= evaluate(right, env)?.as_int()?)
        }
        _ => Some(evaluate(term, env)?.as_int()? != 0),
    }
}

/// Unify one argument term against a ground symbol, binding wildcards (and the vertex) as
/// needed.
fn unify(
    term: &TermKind,
    symbol: ProgramSymbol,
    env: &mut GroundingEnv,
    saved: &mut Vec<SavedBinding>,
) -> bool {
    match term {
        TermKind::Wildcard(wildcard) => match env.bindings[wildcard.0 as usize] {
            Some(bound) => bound == symbol,
            None => {
                env.bindings[wildcard.0 as usize] = Some(symbol);
                saved.push(SavedBinding::Wildcard(*wildcard));
                true
            }
        },
        TermKind::Symbol(expected) => *expected == symbol,
        TermKind::Vertex => match env.bound_vertex {
            Some(vertex) => symbol == ProgramSymbol::Int(vertex as i64),
            None => match symbol.as_int() {
                Some(value) if value >= 0 && (value as usize) < env.num_vertices => {
                    env.bound_vertex = Some(value as usize);
                    saved.push(SavedBinding::Vertex);
                    true
                }
                _ => false,
            },
        },
        TermKind::BinaryOp(..) => evaluate(term, env) == Some(symbol),
    }
}

pub(crate) trait Instantiator {
    /// Position the cursor on its first match (resetting any previous state).
    fn first(&mut self, env: &mut GroundingEnv, state: &GroundState);

    /// Undo this cursor's bindings and move to the next match.
    fn advance(&mut self, env: &mut GroundingEnv, state: &GroundState);

    fn exhausted(&self) -> bool;
}

/// Iterates the grounded instances of a formula, unifying the call's arguments.
pub(crate) struct FunctionInstantiator {
    formula: usize,
    args: Vec<TermKind>,
    index: usize,
    end: usize,
    saved: Vec<SavedBinding>,
}

impl FunctionInstantiator {
    pub(crate) fn new(formula: usize, args: Vec<TermKind>) -> FunctionInstantiator {
        FunctionInstantiator {
            formula,
            args,
            index: 0,
            end: 0,
            saved: Vec::new(),
        }
    }

    fn seek(&mut self, env: &mut GroundingEnv, state: &GroundState) {
        while self.index < self.end {
            let instance = &state.domains[self.formula].list[self.index];
            let mut attempt = Vec::new();
            let matched = self
                .args
                .iter()
                .zip(instance.args.iter())
                .all(|(term, &symbol)| unify(term, symbol, env, &mut attempt));
            if matched {
                self.saved = attempt;
                return;
            }
            undo(env, &mut attempt);
            self.index += 1;
        }
    }
}

impl Instantiator for FunctionInstantiator {
    fn first(&mut self, env: &mut GroundingEnv, state: &GroundState) {
        warren_assert_simple!(self.saved.is_empty());
        self.index = 0;
        self.end = state.domains[self.formula].list.len();
        self.seek(env, state);
    }

    fn advance(&mut self, env: &mut GroundingEnv, state: &GroundState) {
        undo(env, &mut self.saved);
        self.index += 1;
        self.seek(env, state);
    }

    fn exhausted(&self) -> bool {
        self.index >= self.end
    }
}

/// A negated formula occurrence: all arguments are bound; the match fails when the evaluated
/// instance is a known fact, and succeeds exactly once otherwise. (The emitted rule carries
/// the negation as a body literal.)
pub(crate) struct NegativeInstantiator {
    formula: usize,
    args: Vec<TermKind>,
    done: bool,
    failed: bool,
}

impl NegativeInstantiator {
    pub(crate) fn new(formula: usize, args: Vec<TermKind>) -> NegativeInstantiator {
        NegativeInstantiator {
            formula,
            args,
            done: true,
            failed: true,
        }
    }
}

impl Instantiator for NegativeInstantiator {
    fn first(&mut self, env: &mut GroundingEnv, state: &GroundState) {
        let args: Option<Vec<ProgramSymbol>> =
            self.args.iter().map(|term| evaluate(term, env)).collect();
        let args = args.expect("negated arguments are bound by the term ordering");

        self.failed = state.domains[self.formula]
            .map
            .get(&args)
            .is_some_and(|&index| state.domains[self.formula].list[index].is_fact);
        self.done = false;
    }

    fn advance(&mut self, _env: &mut GroundingEnv, _state: &GroundState) {
        self.done = true;
    }

    fn exhausted(&self) -> bool {
        self.failed || self.done
    }
}

/// Delegates to a caller-supplied predicate, iterating the tuples it reports.
pub(crate) struct ExternalInstantiator {
    provider: Rc<dyn ExternalPredicate>,
    args: Vec<TermKind>,
    matches: Vec<Vec<ProgramSymbol>>,
    index: usize,
    saved: Vec<SavedBinding>,
}

impl ExternalInstantiator {
    pub(crate) fn new(provider: Rc<dyn ExternalPredicate>, args: Vec<TermKind>) -> ExternalInstantiator {
        ExternalInstantiator {
            provider,
            args,
            matches: Vec::new(),
            index: 0,
            saved: Vec::new(),
        }
    }

    fn seek(&mut self, env: &mut GroundingEnv) {
        while self.index < self.matches.len() {
            let tuple = &self.matches[self.index];
            let mut attempt = Vec::new();
            let matched = self
                .args
                .iter()
                .zip(tuple.iter())
                .all(|(term, &symbol)| unify(term, symbol, env, &mut attempt));
            if matched {
                self.saved = attempt;
                return;
            }
            undo(env, &mut attempt);
            self.index += 1;
        }
    }
}

impl Instantiator for ExternalInstantiator {
    fn first(&mut self, env: &mut GroundingEnv, state: &GroundState) {
        let _ = state;
        warren_assert_simple!(self.saved.is_empty());
        let pattern: Vec<Option<ProgramSymbol>> = self
            .args
            .iter()
            .map(|term| evaluate(term, env))
            .collect();
        self.matches = self.provider.enumerate(&pattern);
        self.index = 0;
        self.seek(env);
    }

    fn advance(&mut self, env: &mut GroundingEnv, _state: &GroundState) {
        undo(env, &mut self.saved);
        self.index += 1;
        self.seek(env);
    }

    fn exhausted(&self) -> bool {
        self.index >= self.matches.len()
    }
}

/// `Wildcard == expr`: binds the wildcard from the evaluated right-hand side, or checks
/// equality if it is already bound.
pub(crate) struct EqualityInstantiator {
    wildcard: WildcardId,
    expr: TermKind,
    done: bool,
    matched: bool,
    saved: Vec<SavedBinding>,
}

impl EqualityInstantiator {
    pub(crate) fn new(wildcard: WildcardId, expr: TermKind) -> EqualityInstantiator {
        EqualityInstantiator {
            wildcard,
            expr,
            done: true,
            matched: false,
            saved: Vec::new(),
        }
    }
}

impl Instantiator for EqualityInstantiator {
    fn first(&mut self, env: &mut GroundingEnv, _state: &GroundState) {
        warren_assert_simple!(self.saved.is_empty());
        self.done = false;
        self.matched = match evaluate(&self.expr, env) {
            None => false,
            Some(value) => match env.bindings[self.wildcard.0 as usize] {
                Some(bound) => bound == value,
                None => {
                    env.bindings[self.wildcard.0 as usize] = Some(value);
                    self.saved.push(SavedBinding::Wildcard(self.wildcard));
                    true
                }
            },
        };
    }

    fn advance(&mut self, env: &mut GroundingEnv, _state: &GroundState) {
        undo(env, &mut self.saved);
        self.done = true;
    }

    fn exhausted(&self) -> bool {
        !self.matched || self.done
    }
}

/// A non-equality comparison: passes exactly once iff it evaluates to true.
pub(crate) struct RelationInstantiator {
    term: TermKind,
    done: bool,
    matched: bool,
}

impl RelationInstantiator {
    pub(crate) fn new(term: TermKind) -> RelationInstantiator {
        RelationInstantiator {
            term,
            done: true,
            matched: false,
        }
    }
}

impl Instantiator for RelationInstantiator {
    fn first(&mut self, env: &mut GroundingEnv, _state: &GroundState) {
        self.done = false;
        self.matched = evaluate_condition(&self.term, env).unwrap_or(false);
    }

    fn advance(&mut self, _env: &mut GroundingEnv, _state: &GroundState) {
        self.done = true;
    }

    fn exhausted(&self) -> bool {
        !self.matched || self.done
    }
}

/// A constant term: a one-shot pass or fail on its truthiness.
pub(crate) struct ConstInstantiator {
    matched: bool,
    done: bool,
}

impl ConstInstantiator {
    pub(crate) fn new(matched: bool) -> ConstInstantiator {
        ConstInstantiator {
            matched,
            done: true,
        }
    }
}

impl Instantiator for ConstInstantiator {
    fn first(&mut self, _env: &mut GroundingEnv, _state: &GroundState) {
        self.done = false;
    }

    fn advance(&mut self, _env: &mut GroundingEnv, _state: &GroundState) {
        self.done = true;
    }

    fn exhausted(&self) -> bool {
        !self.matched || self.done
    }
}

/// Binds the grounding vertex, enumerating every vertex of the topology unless an earlier
/// term already bound it.
pub(crate) struct VertexInstantiator {
    owns_binding: bool,
    current: usize,
    done: bool,
}

impl VertexInstantiator {
    pub(crate) fn new() -> VertexInstantiator {
        VertexInstantiator {
            owns_binding: false,
            current: 0,
            done: true,
        }
    }
}

impl Instantiator for VertexInstantiator {
    fn first(&mut self, env: &mut GroundingEnv, _state: &GroundState) {
        if env.bound_vertex.is_some() {
            self.owns_binding = false;
            self.done = false;
            return;
        }
        self.owns_binding = true;
        self.current = 0;
        self.done = env.num_vertices == 0;
        if !self.done {
            env.bound_vertex = Some(0);
        }
    }

    fn advance(&mut self, env: &mut GroundingEnv, _state: &GroundState) {
        if !self.owns_binding {
            self.done = true;
            return;
        }
        self.current += 1;
        if self.current < env.num_vertices {
            env.bound_vertex = Some(self.current);
        } else {
            env.bound_vertex = None;
            self.done = true;
        }
    }

    fn exhausted(&self) -> bool {
        self.done
    }
}
