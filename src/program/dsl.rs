//! The builder through which rule programs are written. All state is carried by the
//! [`RuleProgram`] instance being built; there is no ambient "current program" global.

use std::rc::Rc;

use fnv::FnvHashMap;
use fnv::FnvHashSet;
use thiserror::Error;

use crate::engine::variables::Literal;
use crate::engine::ConstraintSolver;
use crate::program::ast::BodyElement;
use crate::program::ast::ExternalCall;
use crate::program::ast::ExternalId;
use crate::program::ast::FormulaCall;
use crate::program::ast::FormulaId;
use crate::program::ast::Head;
use crate::program::ast::RuleStatement;
use crate::program::ast::Term;
use crate::program::ast::TermKind;
use crate::program::ast::WildcardId;
use crate::program::externals::ExternalPredicate;
use crate::program::symbols::IdentifierInterner;
use crate::program::symbols::ProgramSymbol;

/// Build-time errors of the rule front-end, reported synchronously.
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("formula `{name}` was already declared with arity {existing}, not {requested}")]
    DuplicateFormula {
        name: String,
        existing: usize,
        requested: usize,
    },
    #[error("wildcard `{wildcard}` in rule {rule} cannot be bound by any body term")]
    UnsafeWildcard { wildcard: String, rule: usize },
    #[error("formula `{name}` takes {expected} arguments, the call provides {provided}")]
    ArityMismatch {
        name: String,
        expected: usize,
        provided: usize,
    },
}

/// Binds formula instances to solver literals. Called once per ground instance during
/// finalization; returning `None` leaves the instance as a plain rule atom.
pub type BinderFn = Box<dyn FnMut(&mut ConstraintSolver, &[ProgramSymbol]) -> Option<Literal>>;

pub(crate) struct FormulaDecl {
    pub(crate) name: String,
    pub(crate) arity: usize,
    pub(crate) binder: Option<BinderFn>,
}

pub(crate) struct ExternalDecl {
    pub(crate) name: String,
    pub(crate) arity: usize,
    pub(crate) provider: Rc<dyn ExternalPredicate>,
}

/// A handle to a declared formula, used to build calls.
#[derive(Clone, Copy, Debug)]
pub struct FormulaHandle {
    id: FormulaId,
    arity: usize,
}

impl FormulaHandle {
    pub fn id(&self) -> FormulaId {
        self.id
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// A positive occurrence of the formula with the given arguments.
    pub fn at(&self, args: impl IntoIterator<Item = Term>) -> FormulaCall {
        FormulaCall {
            formula: self.id,
            args: args.into_iter().map(|term| term.0).collect(),
            negated: false,
        }
    }

    /// A negated body occurrence.
    pub fn not_at(&self, args: impl IntoIterator<Item = Term>) -> FormulaCall {
        FormulaCall {
            negated: true,
            ..self.at(args)
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExternalHandle {
    id: ExternalId,
}

impl ExternalHandle {
    pub fn at(&self, args: impl IntoIterator<Item = Term>) -> ExternalCall {
        ExternalCall {
            external: self.id,
            args: args.into_iter().map(|term| term.0).collect(),
        }
    }
}

/// A rule program under construction: formula declarations, external predicates, and rule
/// statements. Programs are registered with a solver and grounded over a topology when
/// solving starts.
pub struct RuleProgram {
    pub(crate) name: String,
    pub(crate) formulas: Vec<FormulaDecl>,
    formula_names: FnvHashMap<String, FormulaId>,
    pub(crate) externals: Vec<ExternalDecl>,
    pub(crate) statements: Vec<RuleStatement>,
    pub(crate) num_wildcards: u32,
    pub(crate) wildcard_names: Vec<String>,
    pub(crate) identifiers: IdentifierInterner,
}

impl std::fmt::Debug for RuleProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleProgram")
            .field("name", &self.name)
            .field("num_formulas", &self.formulas.len())
            .field("num_statements", &self.statements.len())
            .finish()
    }
}

impl RuleProgram {
    pub fn new(name: impl Into<String>) -> RuleProgram {
        RuleProgram {
            name: name.into(),
            formulas: Vec::new(),
            formula_names: FnvHashMap::default(),
            externals: Vec::new(),
            statements: Vec::new(),
            num_wildcards: 0,
            wildcard_names: Vec::new(),
            identifiers: IdentifierInterner::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare (or look up) a formula. Re-declaring with a different arity is an error.
    pub fn formula(
        &mut self,
        name: &str,
        arity: usize,
    ) -> Result<FormulaHandle, ProgramError> {
        if let Some(&id) = self.formula_names.get(name) {
            let existing = self.formulas[id.0 as usize].arity;
            if existing != arity {
                return Err(ProgramError::DuplicateFormula {
                    name: name.to_owned(),
                    existing,
                    requested: arity,
                });
            }
            return Ok(FormulaHandle { id, arity });
        }
        let id = FormulaId(self.formulas.len() as u32);
        self.formulas.push(FormulaDecl {
            name: name.to_owned(),
            arity,
            binder: None,
        });
        let _ = self.formula_names.insert(name.to_owned(), id);
        Ok(FormulaHandle { id, arity })
    }

    pub fn external(
        &mut self,
        name: &str,
        provider: Rc<dyn ExternalPredicate>,
    ) -> ExternalHandle {
        let id = ExternalId(self.externals.len() as u32);
        self.externals.push(ExternalDecl {
            name: name.to_owned(),
            arity: provider.arity(),
            provider,
        });
        ExternalHandle { id }
    }

    /// A fresh wildcard scoped to the rules it appears in.
    pub fn wildcard(&mut self, name: &str) -> Term {
        let id = WildcardId(self.num_wildcards);
        self.num_wildcards += 1;
        self.wildcard_names.push(name.to_owned());
        Term(TermKind::Wildcard(id))
    }

    /// An interned identifier constant.
    pub fn id(&mut self, name: &str) -> Term {
        Term(TermKind::Symbol(ProgramSymbol::Id(
            self.identifiers.intern(name),
        )))
    }

    /// Add a rule. The head may be a formula call, a choice wrapper, a disjunction, or
    /// `Head::None` for a constraint. The statement is checked for arity mismatches and
    /// unsafe (unbindable) wildcards.
    pub fn rule(
        &mut self,
        head: impl Into<Head>,
        body: impl IntoIterator<Item = BodyElement>,
    ) -> Result<(), ProgramError> {
        let statement = RuleStatement {
            head: head.into(),
            body: body.into_iter().collect(),
        };
        self.check_arities(&statement)?;
        self.check_safety(&statement)?;
        self.statements.push(statement);
        Ok(())
    }

    /// An unconditional fact.
    pub fn fact(&mut self, head: FormulaCall) -> Result<(), ProgramError> {
        self.rule(head, [])
    }

    /// A constraint: the body must never hold.
    pub fn disallow(
        &mut self,
        body: impl IntoIterator<Item = BodyElement>,
    ) -> Result<(), ProgramError> {
        self.rule(Head::None, body)
    }

    /// A disjunctive head: exactly the rule `a | b | ... :- body`.
    pub fn disjunction(calls: impl IntoIterator<Item = FormulaCall>) -> Head {
        Head::Disjunction(calls.into_iter().collect())
    }

    /// Attach a binder aliasing the formula's ground instances to solver literals.
    pub fn bind(&mut self, formula: FormulaHandle, binder: BinderFn) {
        self.formulas[formula.id().0 as usize].binder = Some(binder);
    }

    fn check_arities(&self, statement: &RuleStatement) -> Result<(), ProgramError> {
        let check_call = |call: &FormulaCall| {
            let decl = &self.formulas[call.formula.0 as usize];
            if call.args.len() != decl.arity {
                return Err(ProgramError::ArityMismatch {
                    name: decl.name.clone(),
                    expected: decl.arity,
                    provided: call.args.len(),
                });
            }
            Ok(())
        };

        for call in statement.head_calls() {
            check_call(call)?;
        }
        for element in &statement.body {
            match element {
                BodyElement::Atom(call) => check_call(call)?,
                BodyElement::External(call) => {
                    let decl = &self.externals[call.external.0 as usize];
                    if call.args.len() != decl.arity {
                        return Err(ProgramError::ArityMismatch {
                            name: decl.name.clone(),
                            expected: decl.arity,
                            provided: call.args.len(),
                        });
                    }
                }
                BodyElement::Compare(_) => {}
            }
        }
        Ok(())
    }

    /// Every wildcard must be bindable: provided by a positive atom, an external, or the
    /// left-hand side of an equality whose right-hand side is bound first.
    fn check_safety(&self, statement: &RuleStatement) -> Result<(), ProgramError> {
        let mut mentioned: Vec<WildcardId> = Vec::new();
        for call in statement.head_calls() {
            for arg in &call.args {
                arg.collect_wildcards(&mut mentioned);
            }
        }
        for element in &statement.body {
            match element {
                BodyElement::Atom(call) => {
                    for arg in &call.args {
                        arg.collect_wildcards(&mut mentioned);
                    }
                }
                BodyElement::External(call) => {
                    for arg in &call.args {
                        arg.collect_wildcards(&mut mentioned);
                    }
                }
                BodyElement::Compare(term) => term.0.collect_wildcards(&mut mentioned),
            }
        }

        let mut bound: FnvHashSet<WildcardId> = FnvHashSet::default();
        loop {
            let mut changed = false;
            for element in &statement.body {
                let (requires, provides) = element_bindings(element);
                if requires.iter().all(|wildcard| bound.contains(wildcard)) {
                    for wildcard in provides {
                        changed |= bound.insert(wildcard);
                    }
                }
            }
            if !changed {
                break;
            }
        }

        for wildcard in mentioned {
            if !bound.contains(&wildcard) {
                return Err(ProgramError::UnsafeWildcard {
                    wildcard: self.wildcard_names[wildcard.0 as usize].clone(),
                    rule: self.statements.len(),
                });
            }
        }
        Ok(())
    }
}

/// The wildcards a body element requires to be bound already, and the ones it can bind.
/// Wildcards buried inside arithmetic count as required: the math rewrite lifts them into an
/// equality whose right-hand side has to be bound elsewhere.
pub(crate) fn element_bindings(element: &BodyElement) -> (Vec<WildcardId>, Vec<WildcardId>) {
    let mut requires = Vec::new();
    let mut provides = Vec::new();
    match element {
        BodyElement::Atom(call) if !call.negated => {
            for arg in &call.args {
                match arg.as_plain_wildcard() {
                    Some(wildcard) => provides.push(wildcard),
                    None => arg.collect_wildcards(&mut requires),
                }
            }
        }
        BodyElement::Atom(call) => {
            for arg in &call.args {
                arg.collect_wildcards(&mut requires);
            }
        }
        BodyElement::External(call) => {
            for arg in &call.args {
                match arg.as_plain_wildcard() {
                    Some(wildcard) => provides.push(wildcard),
                    None => arg.collect_wildcards(&mut requires),
                }
            }
        }
        BodyElement::Compare(term) => {
            if let TermKind::BinaryOp(op, left, right) = &term.0 {
                if *op == crate::program::ast::BinaryOpType::Equal {
                    if let Some(wildcard) = left.as_plain_wildcard() {
                        provides.push(wildcard);
                        right.collect_wildcards(&mut requires);
                        return (requires, provides);
                    }
                }
            }
            term.0.collect_wildcards(&mut requires);
        }
    }
    (requires, provides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_formula_with_different_arity_is_rejected() {
        let mut program = RuleProgram::new("test");
        let _ = program.formula("p", 2).unwrap();
        assert!(matches!(
            program.formula("p", 3),
            Err(ProgramError::DuplicateFormula { .. })
        ));
        assert!(program.formula("p", 2).is_ok());
    }

    #[test]
    fn unsafe_wildcard_is_rejected() {
        let mut program = RuleProgram::new("test");
        let p = program.formula("p", 1).unwrap();
        let q = program.formula("q", 1).unwrap();
        let x = program.wildcard("X");
        let y = program.wildcard("Y");

        // q(Y) :- p(X) leaves Y unbound.
        let result = program.rule(q.at([y]), [p.at([x]).into()]);
        assert!(matches!(result, Err(ProgramError::UnsafeWildcard { .. })));
    }

    #[test]
    fn negated_and_equality_bindings_are_checked() {
        let mut program = RuleProgram::new("test");
        let p = program.formula("p", 1).unwrap();
        let q = program.formula("q", 1).unwrap();
        let r = program.formula("r", 1).unwrap();
        let x = program.wildcard("X");
        let m = program.wildcard("M");

        // r(M) :- p(X), M == X + 1, not q(M): fine, M is bound by the equality.
        let result = program.rule(
            r.at([m.clone()]),
            [
                p.at([x.clone()]).into(),
                m.clone().equals(x + Term::int(1)),
                q.not_at([m]).into(),
            ],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let mut program = RuleProgram::new("test");
        let p = program.formula("p", 2).unwrap();
        let x = program.wildcard("X");
        assert!(matches!(
            program.fact(p.at([x])),
            Err(ProgramError::ArityMismatch { .. })
        ));
    }
}
