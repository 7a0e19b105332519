//! The grounder: strips every wildcard out of the rule statements, replacing them with all
//! viable ground combinations, and hands the resulting propositional rules to the rule
//! database.
//!
//! Grounding runs in phases: arithmetic nested inside formula arguments is lifted into
//! equality terms; statements are ordered by the strongly-connected components of their
//! dependency graph (all edges for the outer components, positive edges for the inner ones);
//! each statement's body terms are topologically ordered so binders precede consumers and then
//! instantiated like nested loops through cursor objects; ground rules are collected to a
//! fixed point within each component; finally choice and disjunction heads are transformed and
//! everything is exported.

use std::rc::Rc;

use fnv::FnvHashMap;
use fnv::FnvHashSet;
use log::debug;

use crate::engine::ConstraintSolver;
use crate::program::ast::BinaryOpType;
use crate::program::ast::BodyElement;
use crate::program::ast::FormulaCall;
use crate::program::ast::Head;
use crate::program::ast::RuleStatement;
use crate::program::ast::TermKind;
use crate::program::ast::WildcardId;
use crate::program::dsl::element_bindings;
use crate::program::dsl::ProgramError;
use crate::program::dsl::RuleProgram;
use crate::program::instantiators::evaluate;
use crate::program::instantiators::evaluate_condition;
use crate::program::instantiators::ConstInstantiator;
use crate::program::instantiators::EqualityInstantiator;
use crate::program::instantiators::ExternalInstantiator;
use crate::program::instantiators::FunctionInstantiator;
use crate::program::instantiators::GroundingEnv;
use crate::program::instantiators::Instantiator;
use crate::program::instantiators::NegativeInstantiator;
use crate::program::instantiators::RelationInstantiator;
use crate::program::instantiators::VertexInstantiator;
use crate::program::symbols::ProgramSymbol;
use crate::rules::AtomId;
use crate::rules::AtomLiteral;
use crate::rules::RuleDatabase;
use crate::topology::find_sccs;
use crate::topology::TopologyRef;

/// One interned ground instance of a formula.
#[derive(Debug)]
pub(crate) struct GroundAtom {
    pub(crate) args: Vec<ProgramSymbol>,
    pub(crate) is_fact: bool,
    rdb_atom: Option<AtomId>,
}

/// All known instances of one formula. Interning makes instance identity structural.
#[derive(Debug, Default)]
pub(crate) struct AtomDomain {
    pub(crate) map: FnvHashMap<Vec<ProgramSymbol>, usize>,
    pub(crate) list: Vec<GroundAtom>,
}

impl AtomDomain {
    fn intern(&mut self, args: Vec<ProgramSymbol>) -> (usize, bool) {
        if let Some(&index) = self.map.get(&args) {
            return (index, false);
        }
        let index = self.list.len();
        let _ = self.map.insert(args.clone(), index);
        self.list.push(GroundAtom {
            args,
            is_fact: false,
            rdb_atom: None,
        });
        (index, true)
    }
}

#[derive(Debug)]
pub(crate) struct GroundState {
    pub(crate) domains: Vec<AtomDomain>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum HeadKind {
    Normal,
    Choice,
}

/// A fully ground rule, pre-transformation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GroundRule {
    head: Option<(u32, usize, HeadKind)>,
    positive: Vec<(u32, usize)>,
    negative: Vec<(u32, usize)>,
}

/// Ground `program` over `topology` and feed the result into the rule database.
pub(crate) fn compile_program(
    rules: &mut RuleDatabase,
    solver: &mut ConstraintSolver,
    program: RuleProgram,
    topology: &TopologyRef,
) -> Result<(), ProgramError> {
    let mut compiler = Compiler::new(program, Rc::clone(topology));
    compiler.rewrite_math();
    compiler.order_statements();
    compiler.ground()?;
    compiler.export(rules, solver);
    Ok(())
}

struct Compiler {
    program: RuleProgram,
    topology: TopologyRef,
    state: GroundState,
    /// Statement indices grouped by outer component, in dependency (definers-first) order.
    components: Vec<Vec<usize>>,
    ground_rules: Vec<GroundRule>,
    rule_dedup: FnvHashSet<GroundRule>,
}

impl Compiler {
    fn new(program: RuleProgram, topology: TopologyRef) -> Compiler {
        let num_formulas = program.formulas.len();
        Compiler {
            program,
            topology,
            state: GroundState {
                domains: (0..num_formulas).map(|_| AtomDomain::default()).collect(),
            },
            components: Vec::new(),
            ground_rules: Vec::new(),
            rule_dedup: FnvHashSet::default(),
        }
    }

    // Phase 1: lift arithmetic buried inside formula arguments to a synthetic wildcard plus an
    // equality body term, e.g. `a(X+1) :- b(X)` becomes `a(M) :- b(X), M == X+1`.
    fn rewrite_math(&mut self) {
        let mut statements = std::mem::take(&mut self.program.statements);
        let mut next_wildcard = self.program.num_wildcards;
        let mut new_names: Vec<String> = Vec::new();

        for statement in statements.iter_mut() {
            let mut lifted: Vec<BodyElement> = Vec::new();

            let mut lift = |args: &mut Vec<TermKind>, lifted: &mut Vec<BodyElement>| {
                for arg in args.iter_mut() {
                    if arg.is_arithmetic() {
                        let wildcard = WildcardId(next_wildcard);
                        next_wildcard += 1;
                        new_names.push(format!("_m{}", wildcard.0));
                        let expr = std::mem::replace(arg, TermKind::Wildcard(wildcard));
                        lifted.push(BodyElement::Compare(crate::program::ast::Term(
                            TermKind::BinaryOp(
                                BinaryOpType::Equal,
                                Box::new(TermKind::Wildcard(wildcard)),
                                Box::new(expr),
                            ),
                        )));
                    }
                }
            };

            match &mut statement.head {
                Head::None => {}
                Head::Atom(call) | Head::Choice(call) => lift(&mut call.args, &mut lifted),
                Head::Disjunction(calls) => {
                    for call in calls.iter_mut() {
                        lift(&mut call.args, &mut lifted);
                    }
                }
            }
            for element in statement.body.iter_mut() {
                match element {
                    BodyElement::Atom(call) => lift(&mut call.args, &mut lifted),
                    BodyElement::External(call) => lift(&mut call.args, &mut lifted),
                    BodyElement::Compare(_) => {}
                }
            }
            statement.body.append(&mut lifted);
        }

        self.program.statements = statements;
        self.program.num_wildcards = next_wildcard;
        self.program.wildcard_names.append(&mut new_names);
    }

    // Phase 2: the statement dependency graph. An edge runs from a statement to every
    // statement defining a formula its body mentions. Outer components are computed over all
    // edges, inner components over the positive edges only; processing outer components in
    // emission order grounds definers before users.
    fn order_statements(&mut self) {
        let num_statements = self.program.statements.len();
        let mut definers: FnvHashMap<u32, Vec<usize>> = FnvHashMap::default();
        for (index, statement) in self.program.statements.iter().enumerate() {
            for call in statement.head_calls() {
                definers.entry(call.formula.0).or_default().push(index);
            }
        }

        let mut all_edges = vec![Vec::new(); num_statements];
        let mut positive_edges = vec![Vec::new(); num_statements];
        for (index, statement) in self.program.statements.iter().enumerate() {
            for element in &statement.body {
                let BodyElement::Atom(call) = element else {
                    continue;
                };
                if let Some(defining) = definers.get(&call.formula.0) {
                    for &definer in defining {
                        if !all_edges[index].contains(&definer) {
                            all_edges[index].push(definer);
                        }
                        if !call.negated && !positive_edges[index].contains(&definer) {
                            positive_edges[index].push(definer);
                        }
                    }
                }
            }
        }

        let outer = find_sccs(&all_edges);
        let inner = find_sccs(&positive_edges);

        let mut order: Vec<usize> = (0..num_statements).collect();
        order.sort_by_key(|&index| {
            (outer.component_of[index], inner.component_of[index], index)
        });

        let mut components: Vec<Vec<usize>> = Vec::new();
        for index in order {
            match components.last_mut() {
                Some(current) if outer.component_of[current[0]] == outer.component_of[index] => {
                    current.push(index)
                }
                _ => components.push(vec![index]),
            }
        }
        self.components = components;
    }

    // Phases 3 and 4: ground every statement, re-grounding within a component until no new
    // atoms or rules appear.
    fn ground(&mut self) -> Result<(), ProgramError> {
        for component_position in 0..self.components.len() {
            loop {
                let mut changed = false;
                for position in 0..self.components[component_position].len() {
                    let statement = self.components[component_position][position];
                    changed |= self.ground_statement(statement)?;
                }
                if !changed {
                    break;
                }
            }
        }
        debug!(
            "grounded program `{}`: {} rules",
            self.program.name,
            self.ground_rules.len()
        );
        Ok(())
    }

    fn ground_statement(&mut self, statement_index: usize) -> Result<bool, ProgramError> {
        let statement = self.program.statements[statement_index].clone();
        let ordered = self.order_body_terms(&statement, statement_index)?;

        let mut nodes: Vec<Box<dyn Instantiator>> = Vec::with_capacity(ordered.len());
        for node in &ordered {
            nodes.push(match node {
                TermNode::Vertex => Box::new(VertexInstantiator::new()),
                TermNode::Body(index) => self.make_instantiator(&statement.body[*index]),
            });
        }

        let mut env = GroundingEnv::new(
            self.program.num_wildcards as usize,
            self.topology.num_vertices(),
        );

        let mut emissions: Vec<(Vec<Option<ProgramSymbol>>, Option<usize>)> = Vec::new();
        instantiate(&mut nodes, &mut env, &self.state, &mut |env| {
            emissions.push((env.bindings.clone(), env.bound_vertex));
        });

        let mut changed = false;
        for (bindings, vertex) in emissions {
            let env = GroundingEnv {
                bindings,
                bound_vertex: vertex,
                num_vertices: self.topology.num_vertices(),
            };
            changed |= self.emit_ground_rule(&statement, &env);
        }
        Ok(changed)
    }

    fn make_instantiator(&self, element: &BodyElement) -> Box<dyn Instantiator> {
        match element {
            BodyElement::Atom(call) if !call.negated => Box::new(FunctionInstantiator::new(
                call.formula.0 as usize,
                call.args.clone(),
            )),
            BodyElement::Atom(call) => Box::new(NegativeInstantiator::new(
                call.formula.0 as usize,
                call.args.clone(),
            )),
            BodyElement::External(call) => Box::new(ExternalInstantiator::new(
                Rc::clone(&self.program.externals[call.external.0 as usize].provider),
                call.args.clone(),
            )),
            BodyElement::Compare(term) => {
                let term = &term.0;
                let mut wildcards = Vec::new();
                term.collect_wildcards(&mut wildcards);
                if wildcards.is_empty() && !term.contains_vertex() {
                    // Constant truthiness is known before grounding starts.
                    let env = GroundingEnv::new(0, 0);
                    let matched = evaluate_condition(term, &env).unwrap_or(false);
                    return Box::new(ConstInstantiator::new(matched));
                }
                if let TermKind::BinaryOp(BinaryOpType::Equal, left, right) = term {
                    if let Some(wildcard) = left.as_plain_wildcard() {
                        return Box::new(EqualityInstantiator::new(wildcard, (**right).clone()));
                    }
                }
                Box::new(RelationInstantiator::new(term.clone()))
            }
        }
    }

    // Order the body terms so binders precede consumers. Tie-breaking follows the fixed
    // precedence: constants, then vertex terms, then externals, then terms with an
    // already-bound wildcard, then the rest. The grounding vertex is an implicit term of the
    // vertex class, enumerating the topology when nothing else binds it.
    fn order_body_terms(
        &self,
        statement: &RuleStatement,
        statement_index: usize,
    ) -> Result<Vec<TermNode>, ProgramError> {
        let mut pending: Vec<usize> = (0..statement.body.len()).collect();
        let mut ordered: Vec<TermNode> = Vec::new();
        let mut bound: FnvHashSet<WildcardId> = FnvHashSet::default();
        let mut vertex_pending = statement.mentions_vertex();
        let mut vertex_bound = false;

        const IMPLICIT_VERTEX_CLASS: usize = 3;

        while !pending.is_empty() || vertex_pending {
            let mut best: Option<(usize, Option<usize>)> = None;

            for (slot, &element_index) in pending.iter().enumerate() {
                let element = &statement.body[element_index];
                let (requires, _) = element_bindings(element);
                if !requires.iter().all(|wildcard| bound.contains(wildcard)) {
                    continue;
                }
                if element_requires_vertex(element) && !vertex_bound {
                    continue;
                }
                let class = element_class(element, &bound);
                if best.is_none() || class < best.unwrap().0 {
                    best = Some((class, Some(slot)));
                }
            }
            if vertex_pending && (best.is_none() || IMPLICIT_VERTEX_CLASS < best.unwrap().0) {
                best = Some((IMPLICIT_VERTEX_CLASS, None));
            }

            match best {
                Some((_, Some(slot))) => {
                    let element_index = pending.remove(slot);
                    let element = &statement.body[element_index];
                    let (_, provides) = element_bindings(element);
                    for wildcard in provides {
                        let _ = bound.insert(wildcard);
                    }
                    if element_binds_vertex(element) {
                        vertex_bound = true;
                        vertex_pending = false;
                    }
                    ordered.push(TermNode::Body(element_index));
                }
                Some((_, None)) => {
                    vertex_pending = false;
                    vertex_bound = true;
                    ordered.push(TermNode::Vertex);
                }
                None => {
                    // Validation at rule() time makes this unreachable for well-formed
                    // programs.
                    let element = &statement.body[pending[0]];
                    let (requires, _) = element_bindings(element);
                    let unbound = requires
                        .into_iter()
                        .find(|wildcard| !bound.contains(wildcard))
                        .expect("an unready term has an unbound requirement");
                    return Err(ProgramError::UnsafeWildcard {
                        wildcard: self.program.wildcard_names[unbound.0 as usize].clone(),
                        rule: statement_index,
                    });
                }
            }
        }
        Ok(ordered)
    }

    /// Evaluate the statement under a complete binding and record the ground rule. Returns
    /// whether anything new was learned.
    fn emit_ground_rule(&mut self, statement: &RuleStatement, env: &GroundingEnv) -> bool {
        let mut changed = false;

        let mut positive = Vec::new();
        let mut negative = Vec::new();
        for element in &statement.body {
            if let BodyElement::Atom(call) = element {
                let (formula, index, new) = intern_call(&mut self.state.domains, env, call);
                changed |= new;
                if call.negated {
                    negative.push((formula, index));
                } else {
                    positive.push((formula, index));
                }
            }
        }
        positive.sort_unstable();
        positive.dedup();
        negative.sort_unstable();
        negative.dedup();

        match &statement.head {
            Head::None => {
                changed |= self.push_rule(GroundRule {
                    head: None,
                    positive,
                    negative,
                });
            }
            Head::Atom(call) => {
                let (formula, index, new) = intern_call(&mut self.state.domains, env, call);
                changed |= new;
                if positive.is_empty() && negative.is_empty() {
                    // A ground fact.
                    let instance = &mut self.state.domains[formula as usize].list[index];
                    if !instance.is_fact {
                        instance.is_fact = true;
                        changed = true;
                    }
                } else {
                    changed |= self.push_rule(GroundRule {
                        head: Some((formula, index, HeadKind::Normal)),
                        positive,
                        negative,
                    });
                }
            }
            Head::Choice(call) => {
                let (formula, index, new) = intern_call(&mut self.state.domains, env, call);
                changed |= new;
                changed |= self.push_rule(GroundRule {
                    head: Some((formula, index, HeadKind::Choice)),
                    positive,
                    negative,
                });
            }
            Head::Disjunction(calls) => {
                // `a | b :- body` expands into one rule per disjunct, each with the other
                // disjuncts negated in its body.
                let mut instances = Vec::with_capacity(calls.len());
                for call in calls {
                    let (formula, index, new) = intern_call(&mut self.state.domains, env, call);
                    changed |= new;
                    instances.push((formula, index));
                }
                for (position, &(formula, index)) in instances.iter().enumerate() {
                    let mut negative = negative.clone();
                    for (other_position, &other) in instances.iter().enumerate() {
                        if other_position != position && !negative.contains(&other) {
                            negative.push(other);
                        }
                    }
                    negative.sort_unstable();
                    changed |= self.push_rule(GroundRule {
                        head: Some((formula, index, HeadKind::Normal)),
                        positive: positive.clone(),
                        negative,
                    });
                }
            }
        }
        changed
    }

    fn push_rule(&mut self, rule: GroundRule) -> bool {
        if self.rule_dedup.insert(rule.clone()) {
            self.ground_rules.push(rule);
            true
        } else {
            false
        }
    }

    fn resolve_atom(
        &mut self,
        rules: &mut RuleDatabase,
        solver: &mut ConstraintSolver,
        is_input: &[bool],
        formula: u32,
        index: usize,
    ) -> AtomId {
        if let Some(existing) = self.state.domains[formula as usize].list[index].rdb_atom {
            return existing;
        }
        let args = self.state.domains[formula as usize].list[index].args.clone();
        let rendered: Vec<String> = args
            .iter()
            .map(|&symbol| self.program.identifiers.format_symbol(symbol))
            .collect();
        let decl = &mut self.program.formulas[formula as usize];
        let name = format!("{}({})", decl.name, rendered.join(","));

        let atom = match decl.binder.as_mut().and_then(|binder| binder(solver, &args)) {
            Some(literal) => rules.create_bound_atom(name, literal, is_input[formula as usize]),
            None => rules.create_atom(name),
        };
        self.state.domains[formula as usize].list[index].rdb_atom = Some(atom);
        atom
    }

    // Phase 5 epilogue: translate the ground program into rule-database atoms and rules.
    fn export(&mut self, rules: &mut RuleDatabase, solver: &mut ConstraintSolver) {
        // Formulas never appearing in a head are inputs: their bound atoms take truth from
        // the solver.
        let mut is_input = vec![true; self.program.formulas.len()];
        for statement in &self.program.statements {
            for call in statement.head_calls() {
                is_input[call.formula.0 as usize] = false;
            }
        }

        let ground_rules = std::mem::take(&mut self.ground_rules);
        for rule in ground_rules {
            // A rule whose head is already a fact adds nothing; a rule negating a fact can
            // never fire.
            if let Some((formula, index, _)) = rule.head {
                if self.state.domains[formula as usize].list[index].is_fact {
                    continue;
                }
            }
            if rule
                .negative
                .iter()
                .any(|&(formula, index)| self.state.domains[formula as usize].list[index].is_fact)
            {
                continue;
            }

            let head = rule.head.map(|(formula, index, kind)| {
                (
                    self.resolve_atom(rules, solver, &is_input, formula, index),
                    kind == HeadKind::Choice,
                )
            });
            let mut body = Vec::new();
            for &(formula, index) in &rule.positive {
                // Positive literals on facts always hold and drop out.
                if self.state.domains[formula as usize].list[index].is_fact {
                    continue;
                }
                body.push(AtomLiteral::positive(self.resolve_atom(
                    rules, solver, &is_input, formula, index,
                )));
            }
            for &(formula, index) in &rule.negative {
                body.push(AtomLiteral::negative(self.resolve_atom(
                    rules, solver, &is_input, formula, index,
                )));
            }
            rules.add_rule(head, body);
        }

        // Export facts for instances the database knows about (bound instances always do).
        for formula in 0..self.program.formulas.len() as u32 {
            let has_binder = self.program.formulas[formula as usize].binder.is_some();
            for index in 0..self.state.domains[formula as usize].list.len() {
                let instance = &self.state.domains[formula as usize].list[index];
                if !instance.is_fact || (instance.rdb_atom.is_none() && !has_binder) {
                    continue;
                }
                let atom = self.resolve_atom(rules, solver, &is_input, formula, index);
                rules.add_fact(atom);
            }
        }

        // Formulas keyed by a single vertex argument become graph relations, making learned
        // clauses over them promotable.
        for formula in 0..self.program.formulas.len() as u32 {
            if self.program.formulas[formula as usize].arity != 1 {
                continue;
            }
            let mut members = Vec::new();
            for instance in &self.state.domains[formula as usize].list {
                let Some(atom) = instance.rdb_atom else {
                    continue;
                };
                if let Some(value) = instance.args[0].as_int() {
                    if value >= 0 && self.topology.is_valid_vertex(value as usize) {
                        members.push((value as usize, atom));
                    }
                }
            }
            if members.len() > 1 {
                rules.register_vertex_family(
                    self.program.formulas[formula as usize].name.clone(),
                    Rc::clone(&self.topology),
                    members,
                );
            }
        }
    }
}

fn intern_call(
    domains: &mut [AtomDomain],
    env: &GroundingEnv,
    call: &FormulaCall,
) -> (u32, usize, bool) {
    let args: Vec<ProgramSymbol> = call
        .args
        .iter()
        .map(|arg| evaluate(arg, env).expect("emitted rules are fully bound"))
        .collect();
    let (index, new) = domains[call.formula.0 as usize].intern(args);
    (call.formula.0, index, new)
}

enum TermNode {
    Vertex,
    Body(usize),
}

/// Precedence class for simultaneously ready terms. Lower is grounded earlier.
fn element_class(element: &BodyElement, bound: &FnvHashSet<WildcardId>) -> usize {
    let mut wildcards = Vec::new();
    match element {
        BodyElement::Atom(call) => {
            for arg in &call.args {
                arg.collect_wildcards(&mut wildcards);
            }
        }
        BodyElement::External(call) => {
            for arg in &call.args {
                arg.collect_wildcards(&mut wildcards);
            }
        }
        BodyElement::Compare(term) => term.0.collect_wildcards(&mut wildcards),
    }

    let mentions_vertex = match element {
        BodyElement::Atom(call) => call.args.iter().any(TermKind::contains_vertex),
        BodyElement::External(call) => call.args.iter().any(TermKind::contains_vertex),
        BodyElement::Compare(term) => term.0.contains_vertex(),
    };

    if wildcards.is_empty() && !mentions_vertex {
        1
    } else if mentions_vertex {
        2
    } else if matches!(element, BodyElement::External(_)) {
        4
    } else if wildcards.iter().any(|wildcard| bound.contains(wildcard)) {
        5
    } else {
        6
    }
}

/// Whether the element can bind the grounding vertex through unification (a top-level vertex
/// argument in an enumerable term).
fn element_binds_vertex(element: &BodyElement) -> bool {
    match element {
        BodyElement::Atom(call) if !call.negated => {
            call.args.iter().any(|arg| matches!(arg, TermKind::Vertex))
        }
        BodyElement::External(call) => {
            call.args.iter().any(|arg| matches!(arg, TermKind::Vertex))
        }
        _ => false,
    }
}

/// Whether the element needs the vertex bound before it can run.
fn element_requires_vertex(element: &BodyElement) -> bool {
    match element {
        BodyElement::Atom(call) if !call.negated => call
            .args
            .iter()
            .any(|arg| arg.contains_vertex() && !matches!(arg, TermKind::Vertex)),
        BodyElement::Atom(call) => call.args.iter().any(TermKind::contains_vertex),
        BodyElement::External(call) => call
            .args
            .iter()
            .any(|arg| arg.contains_vertex() && !matches!(arg, TermKind::Vertex)),
        BodyElement::Compare(term) => term.0.contains_vertex(),
    }
}

/// The nested-loop recursion over the ordered instantiators.
fn instantiate(
    nodes: &mut [Box<dyn Instantiator>],
    env: &mut GroundingEnv,
    state: &GroundState,
    emit: &mut dyn FnMut(&GroundingEnv),
) {
    let Some((node, rest)) = nodes.split_first_mut() else {
        emit(env);
        return;
    };
    node.first(env, state);
    while !node.exhausted() {
        instantiate(rest, env, state, emit);
        node.advance(env, state);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::program::ast::Term;
    use crate::program::externals::TopologyEdges;
    use crate::topology::DigraphTopology;

    fn singleton_topology() -> TopologyRef {
        Rc::new(DigraphTopology::new(1))
    }

    #[test]
    fn transitive_closure_reaches_a_fixed_point() {
        // path(X,Y) :- edge(X,Y); path(X,Z) :- path(X,Y), edge(Y,Z) over edges 0->1->2.
        let graph: TopologyRef = Rc::new(DigraphTopology::from_edges(3, [(0, 1), (1, 2)]));
        let mut program = RuleProgram::new("paths");
        let edges = program.external("edge", Rc::new(TopologyEdges::new(Rc::clone(&graph))));
        let path = program.formula("path", 2).unwrap();

        let x = program.wildcard("X");
        let y = program.wildcard("Y");
        program
            .rule(path.at([x.clone(), y.clone()]), [edges.at([x, y]).into()])
            .unwrap();

        let x = program.wildcard("X");
        let y = program.wildcard("Y");
        let z = program.wildcard("Z");
        program
            .rule(
                path.at([x.clone(), z.clone()]),
                [path.at([x, y.clone()]).into(), edges.at([y, z]).into()],
            )
            .unwrap();

        let mut compiler = Compiler::new(program, graph);
        compiler.rewrite_math();
        compiler.order_statements();
        compiler.ground().unwrap();

        let domain = &compiler.state.domains[path.id().0 as usize];
        let mut pairs: Vec<(i64, i64)> = domain
            .list
            .iter()
            .map(|atom| {
                (
                    atom.args[0].as_int().unwrap(),
                    atom.args[1].as_int().unwrap(),
                )
            })
            .collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn math_rewrite_lifts_nested_arithmetic() {
        let mut program = RuleProgram::new("math");
        let p = program.formula("p", 1).unwrap();
        let q = program.formula("q", 1).unwrap();
        let x = program.wildcard("X");

        program
            .rule(q.at([x.clone() + Term::int(1)]), [p.at([x]).into()])
            .unwrap();

        let mut compiler = Compiler::new(program, singleton_topology());
        compiler.rewrite_math();

        let statement = &compiler.program.statements[0];
        let Head::Atom(call) = &statement.head else {
            panic!("head is an atom");
        };
        assert!(matches!(call.args[0], TermKind::Wildcard(_)));
        assert_eq!(statement.body.len(), 2, "an equality term was appended");
    }

    #[test]
    fn relational_terms_filter_matches() {
        // q(X) :- p(X), X >= 2 over facts p(1), p(2), p(3).
        let mut program = RuleProgram::new("filter");
        let p = program.formula("p", 1).unwrap();
        let q = program.formula("q", 1).unwrap();
        for value in 1..=3 {
            program.fact(p.at([Term::int(value)])).unwrap();
        }
        let x = program.wildcard("X");
        program
            .rule(q.at([x.clone()]), [p.at([x.clone()]).into(), x.at_least(2)])
            .unwrap();

        let mut compiler = Compiler::new(program, singleton_topology());
        compiler.rewrite_math();
        compiler.order_statements();
        compiler.ground().unwrap();

        let domain = &compiler.state.domains[q.id().0 as usize];
        let mut values: Vec<i64> = domain
            .list
            .iter()
            .map(|atom| atom.args[0].as_int().unwrap())
            .collect();
        values.sort_unstable();
        assert_eq!(values, vec![2, 3]);
    }

    #[test]
    fn vertex_placeholder_enumerates_the_topology() {
        // mark(V) for every vertex V; keep(V) :- mark(V), V >= 1.
        let graph: TopologyRef = Rc::new(DigraphTopology::new(3));
        let mut program = RuleProgram::new("vertices");
        let mark = program.formula("mark", 1).unwrap();
        let keep = program.formula("keep", 1).unwrap();

        program.fact(mark.at([Term::vertex()])).unwrap();
        let v = program.wildcard("V");
        program
            .rule(
                keep.at([v.clone()]),
                [mark.at([v.clone()]).into(), v.at_least(1)],
            )
            .unwrap();

        let mut compiler = Compiler::new(program, graph);
        compiler.rewrite_math();
        compiler.order_statements();
        compiler.ground().unwrap();

        assert_eq!(compiler.state.domains[mark.id().0 as usize].list.len(), 3);
        let mut kept: Vec<i64> = compiler.state.domains[keep.id().0 as usize]
            .list
            .iter()
            .map(|atom| atom.args[0].as_int().unwrap())
            .collect();
        kept.sort_unstable();
        assert_eq!(kept, vec![1, 2]);
    }

    #[test]
    fn disjunction_heads_expand_with_sibling_negation() {
        // a | b :- c with fact c.
        let mut program = RuleProgram::new("disjunction");
        let a = program.formula("a", 0).unwrap();
        let b = program.formula("b", 0).unwrap();
        let c = program.formula("c", 0).unwrap();
        program.fact(c.at([])).unwrap();
        program
            .rule(
                RuleProgram::disjunction([a.at([]), b.at([])]),
                [c.at([]).into()],
            )
            .unwrap();

        let mut compiler = Compiler::new(program, singleton_topology());
        compiler.rewrite_math();
        compiler.order_statements();
        compiler.ground().unwrap();

        // Two rules, each negating the sibling disjunct.
        assert_eq!(compiler.ground_rules.len(), 2);
        for rule in &compiler.ground_rules {
            assert_eq!(rule.negative.len(), 1);
        }
    }
}
