//! The rule AST: terms over wildcards, constants, and the grounding vertex, assembled into
//! formula calls, body elements, and rule statements by the builder in `dsl`.

use std::ops::Add;
use std::ops::Mul;
use std::ops::Sub;

use crate::program::symbols::ProgramSymbol;

/// A wildcard (rule-scoped variable) placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WildcardId(pub(crate) u32);

/// Identifies a declared formula within one program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FormulaId(pub(crate) u32);

/// Identifies a declared external predicate within one program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExternalId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinaryOpType {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    LessThan,
    LessThanEq,
    GreaterThan,
    GreaterThanEq,
}

/// An argument expression inside a rule.
#[derive(Clone, Debug)]
pub struct Term(pub(crate) TermKind);

#[derive(Clone, Debug)]
pub(crate) enum TermKind {
    Wildcard(WildcardId),
    Symbol(ProgramSymbol),
    /// The vertex the rule is being grounded at.
    Vertex,
    BinaryOp(BinaryOpType, Box<TermKind>, Box<TermKind>),
}

impl Term {
    pub fn int(value: i64) -> Term {
        Term(TermKind::Symbol(ProgramSymbol::Int(value)))
    }

    /// The topology vertex the rule is grounded at.
    pub fn vertex() -> Term {
        Term(TermKind::Vertex)
    }

    fn compare(self, op: BinaryOpType, other: Term) -> BodyElement {
        BodyElement::Compare(Term(TermKind::BinaryOp(
            op,
            Box::new(self.0),
            Box::new(other.0),
        )))
    }

    pub fn equals(self, other: impl Into<Term>) -> BodyElement {
        self.compare(BinaryOpType::Equal, other.into())
    }

    pub fn not_equals(self, other: impl Into<Term>) -> BodyElement {
        self.compare(BinaryOpType::NotEqual, other.into())
    }

    pub fn less_than(self, other: impl Into<Term>) -> BodyElement {
        self.compare(BinaryOpType::LessThan, other.into())
    }

    pub fn at_most(self, other: impl Into<Term>) -> BodyElement {
        self.compare(BinaryOpType::LessThanEq, other.into())
    }

    pub fn greater_than(self, other: impl Into<Term>) -> BodyElement {
        self.compare(BinaryOpType::GreaterThan, other.into())
    }

    pub fn at_least(self, other: impl Into<Term>) -> BodyElement {
        self.compare(BinaryOpType::GreaterThanEq, other.into())
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Term {
        Term::int(value)
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Term {
        Term::int(i64::from(value))
    }
}

impl Add for Term {
    type Output = Term;

    fn add(self, other: Term) -> Term {
        Term(TermKind::BinaryOp(
            BinaryOpType::Add,
            Box::new(self.0),
            Box::new(other.0),
        ))
    }
}

impl Sub for Term {
    type Output = Term;

    fn sub(self, other: Term) -> Term {
        Term(TermKind::BinaryOp(
            BinaryOpType::Subtract,
            Box::new(self.0),
            Box::new(other.0),
        ))
    }
}

impl Mul for Term {
    type Output = Term;

    fn mul(self, other: Term) -> Term {
        Term(TermKind::BinaryOp(
            BinaryOpType::Multiply,
            Box::new(self.0),
            Box::new(other.0),
        ))
    }
}

impl TermKind {
    pub(crate) fn collect_wildcards(&self, out: &mut Vec<WildcardId>) {
        match self {
            TermKind::Wildcard(wildcard) => {
                if !out.contains(wildcard) {
                    out.push(*wildcard);
                }
            }
            TermKind::Symbol(_) | TermKind::Vertex => {}
            TermKind::BinaryOp(_, left, right) => {
                left.collect_wildcards(out);
                right.collect_wildcards(out);
            }
        }
    }

    pub(crate) fn as_plain_wildcard(&self) -> Option<WildcardId> {
        match self {
            TermKind::Wildcard(wildcard) => Some(*wildcard),
            _ => None,
        }
    }

    pub(crate) fn contains_vertex(&self) -> bool {
        match self {
            TermKind::Vertex => true,
            TermKind::Wildcard(_) | TermKind::Symbol(_) => false,
            TermKind::BinaryOp(_, left, right) => left.contains_vertex() || right.contains_vertex(),
        }
    }

    pub(crate) fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            TermKind::BinaryOp(
                BinaryOpType::Add
                    | BinaryOpType::Subtract
                    | BinaryOpType::Multiply
                    | BinaryOpType::Divide,
                _,
                _
            )
        )
    }
}

/// A formula applied to arguments; usable as a head or a (possibly negated) body literal.
#[derive(Clone, Debug)]
pub struct FormulaCall {
    pub(crate) formula: FormulaId,
    pub(crate) args: Vec<TermKind>,
    pub(crate) negated: bool,
}

impl FormulaCall {
    /// Wrap into a choice head: the atom may be true when the body holds, but is not forced.
    pub fn choice(self) -> Head {
        Head::Choice(self)
    }
}

/// An external predicate applied to arguments.
#[derive(Clone, Debug)]
pub struct ExternalCall {
    pub(crate) external: ExternalId,
    pub(crate) args: Vec<TermKind>,
}

/// One conjunct of a rule body.
#[derive(Clone, Debug)]
pub enum BodyElement {
    Atom(FormulaCall),
    External(ExternalCall),
    Compare(Term),
}

impl From<FormulaCall> for BodyElement {
    fn from(call: FormulaCall) -> BodyElement {
        BodyElement::Atom(call)
    }
}

impl From<ExternalCall> for BodyElement {
    fn from(call: ExternalCall) -> BodyElement {
        BodyElement::External(call)
    }
}

/// The head of a rule statement.
#[derive(Clone, Debug)]
pub enum Head {
    /// A constraint rule: the body must not hold.
    None,
    Atom(FormulaCall),
    Choice(FormulaCall),
    Disjunction(Vec<FormulaCall>),
}

impl From<FormulaCall> for Head {
    fn from(call: FormulaCall) -> Head {
        Head::Atom(call)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RuleStatement {
    pub(crate) head: Head,
    pub(crate) body: Vec<BodyElement>,
}

impl RuleStatement {
    pub(crate) fn head_calls(&self) -> &[FormulaCall] {
        match &self.head {
            Head::None => &[],
            Head::Atom(call) | Head::Choice(call) => std::slice::from_ref(call),
            Head::Disjunction(calls) => calls,
        }
    }

    pub(crate) fn mentions_vertex(&self) -> bool {
        let head_mentions = self
            .head_calls()
            .iter()
            .any(|call| call.args.iter().any(TermKind::contains_vertex));
        let body_mentions = self.body.iter().any(|element| match element {
            BodyElement::Atom(call) => call.args.iter().any(TermKind::contains_vertex),
            BodyElement::External(call) => call.args.iter().any(TermKind::contains_vertex),
            BodyElement::Compare(term) => term.0.contains_vertex(),
        });
        head_mentions || body_mentions
    }
}
