//! Ground rules, fact propagation, loop detection, and the translation of a rule program into
//! clause constraints.
//!
//! Atoms and bodies live in arenas owned by the database; all cross-references are indices, so
//! there are no ownership cycles. Finalization runs in phases: compile pending programs, expand
//! abstract rules per vertex, propagate facts to a fixed point, compute the strongly-connected
//! components of the positive dependency graph, hand out solver literals, and emit the clause
//! encodings. Non-tight components additionally get an unfounded-set analyzer.

use std::rc::Rc;

use fnv::FnvHashMap;
use log::debug;

use crate::basic_types::ConstraintOperationError;
use crate::basic_types::ValueSet;
use crate::engine::variables::Literal;
use crate::engine::variables::VariableDomain;
use crate::engine::ConstraintSolver;
use crate::program::compile_program;
use crate::program::RuleProgram;
use crate::propagators::ClausePropagator;
use crate::rules::unfounded_set_analyzer::MemberAtom;
use crate::rules::unfounded_set_analyzer::SupportBody;
use crate::rules::UnfoundedSetAnalyzer;
use crate::topology::find_sccs;
use crate::topology::GraphVariableRelation;
use crate::topology::TopologyRef;
use crate::topology::VertexId;
use crate::warren_assert_simple;

/// A proposition in the rule layer; an index into the database's atom arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AtomId(u32);

impl AtomId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct BodyId(u32);

impl BodyId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A positive or negative occurrence of an atom in a rule body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtomLiteral {
    pub atom: AtomId,
    pub positive: bool,
}

impl AtomLiteral {
    pub fn positive(atom: AtomId) -> AtomLiteral {
        AtomLiteral {
            atom,
            positive: true,
        }
    }

    pub fn negative(atom: AtomId) -> AtomLiteral {
        AtomLiteral {
            atom,
            positive: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TruthStatus {
    True,
    False,
    #[default]
    Undetermined,
}

/// A family of atoms instantiated once per vertex of a topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbstractAtomId(u32);

/// Either a plain atom or a per-vertex family to be made concrete during finalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbstractAtomRef {
    Concrete(AtomId),
    PerVertex(AbstractAtomId),
}

#[derive(Debug)]
struct AtomInfo {
    name: String,
    /// The solver literal meaning "this atom is true"; assigned during finalization for
    /// undetermined atoms without an explicit binding.
    literal: Option<Literal>,
    status: TruthStatus,
    /// Bodies that can support this atom, with a choice flag per supporting rule.
    supports: Vec<(BodyId, bool)>,
    positive_in: Vec<BodyId>,
    negative_in: Vec<BodyId>,
    scc: Option<usize>,
    /// External atoms take their truth from outside the rule program (e.g. a bound solver
    /// variable) and are exempt from support requirements.
    is_external: bool,
    enqueued: bool,
}

#[derive(Debug)]
struct BodyInfo {
    positive: Vec<AtomId>,
    negative: Vec<AtomId>,
    heads: Vec<(AtomId, bool)>,
    /// A headless rule: the body must never hold.
    is_constraint: bool,
    status: TruthStatus,
    /// Literal slots not yet satisfied during fact propagation.
    num_undetermined: usize,
    literal: Option<Literal>,
    enqueued: bool,
}

#[derive(Debug)]
struct AbstractAtomInfo {
    name: String,
    topology: TopologyRef,
    concrete: Vec<Option<AtomId>>,
}

#[derive(Debug)]
struct AbstractRule {
    head: Option<(AbstractAtomRef, bool)>,
    body: Vec<(AbstractAtomRef, bool)>,
    topology: TopologyRef,
}

/// A named per-vertex family of atoms registered by the grounder; becomes a graph variable
/// relation for clause promotion once solver literals exist.
#[derive(Debug)]
struct VertexFamily {
    name: String,
    topology: TopologyRef,
    members: Vec<(VertexId, AtomId)>,
}

#[derive(Default)]
pub struct RuleDatabase {
    atoms: Vec<AtomInfo>,
    bodies: Vec<BodyInfo>,
    body_dedup: FnvHashMap<(Vec<u32>, Vec<u32>), BodyId>,
    abstract_atoms: Vec<AbstractAtomInfo>,
    abstract_rules: Vec<AbstractRule>,
    programs: Vec<(RuleProgram, TopologyRef)>,
    vertex_families: Vec<VertexFamily>,
    atom_queue: Vec<AtomId>,
    body_queue: Vec<BodyId>,
    conflict: bool,
    is_tight: bool,
    finalized: bool,
}

impl std::fmt::Debug for RuleDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleDatabase")
            .field("num_atoms", &self.atoms.len())
            .field("num_bodies", &self.bodies.len())
            .field("finalized", &self.finalized)
            .finish()
    }
}

impl RuleDatabase {
    pub fn create_atom(&mut self, name: impl Into<String>) -> AtomId {
        self.push_atom(name.into(), None, false)
    }

    /// An atom aliased to an existing solver literal. External atoms take their truth from the
    /// solver rather than requiring rule support.
    pub fn create_bound_atom(
        &mut self,
        name: impl Into<String>,
        literal: Literal,
        external: bool,
    ) -> AtomId {
        self.push_atom(name.into(), Some(literal), external)
    }

    pub fn create_abstract_atom(
        &mut self,
        name: impl Into<String>,
        topology: TopologyRef,
    ) -> AbstractAtomId {
        let id = AbstractAtomId(self.abstract_atoms.len() as u32);
        let num_vertices = topology.num_vertices();
        self.abstract_atoms.push(AbstractAtomInfo {
            name: name.into(),
            topology,
            concrete: vec![None; num_vertices],
        });
        id
    }

    /// The concrete atom of a per-vertex family at `vertex`, created on first use. Concrete
    /// instances are shared: asking twice returns the same atom.
    pub fn concrete_instance(&mut self, family: AbstractAtomId, vertex: VertexId) -> AtomId {
        if let Some(existing) = self.abstract_atoms[family.0 as usize].concrete[vertex] {
            return existing;
        }
        let info = &self.abstract_atoms[family.0 as usize];
        let name = format!("{}@{}", info.name, info.topology.vertex_to_string(vertex));
        let atom = self.push_atom(name, None, false);
        self.abstract_atoms[family.0 as usize].concrete[vertex] = Some(atom);
        atom
    }

    fn push_atom(&mut self, name: String, literal: Option<Literal>, external: bool) -> AtomId {
        let id = AtomId(self.atoms.len() as u32);
        self.atoms.push(AtomInfo {
            name,
            literal,
            status: TruthStatus::Undetermined,
            supports: Vec::new(),
            positive_in: Vec::new(),
            negative_in: Vec::new(),
            scc: None,
            is_external: external,
            enqueued: false,
        });
        id
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn atom_status(&self, atom: AtomId) -> TruthStatus {
        self.atoms[atom.index()].status
    }

    pub fn atom_name(&self, atom: AtomId) -> &str {
        &self.atoms[atom.index()].name
    }

    /// Look up an atom by its display name, e.g. `path(0,1)`.
    pub fn find_atom(&self, name: &str) -> Option<AtomId> {
        self.atoms
            .iter()
            .position(|atom| atom.name == name)
            .map(|index| AtomId(index as u32))
    }

    /// The solver literal of an atom; available after finalization for atoms whose truth the
    /// search still has to determine.
    pub fn atom_literal(&self, atom: AtomId) -> Option<Literal> {
        self.atoms[atom.index()].literal.clone()
    }

    pub fn is_tight(&self) -> bool {
        self.is_tight
    }

    /// Record `atom` as unconditionally true.
    pub fn add_fact(&mut self, atom: AtomId) {
        self.set_atom_status(atom, TruthStatus::True);
    }

    /// Add a ground rule. `head` is `None` for a constraint rule (the body must not hold);
    /// the boolean marks a choice head, which may be true when the body holds but is not
    /// forced.
    pub fn add_rule(&mut self, head: Option<(AtomId, bool)>, body: Vec<AtomLiteral>) {
        warren_assert_simple!(!self.finalized, "rules are added before solving starts");

        // A fact: the head holds unconditionally. A choice fact leaves the atom entirely
        // free, which is what external atoms already are.
        if body.is_empty() {
            match head {
                Some((atom, choice)) => {
                    if choice {
                        self.atoms[atom.index()].is_external = true;
                    } else {
                        self.add_fact(atom);
                    }
                }
                None => self.conflict = true,
            }
            return;
        }

        if let Some((atom, _)) = head {
            if self.atoms[atom.index()].status == TruthStatus::True {
                // The head already holds; the rule adds nothing.
                return;
            }
        }

        let body_id = self.find_or_create_body(body);
        match head {
            Some((atom, choice)) => {
                self.atoms[atom.index()].supports.push((body_id, choice));
                self.bodies[body_id.index()].heads.push((atom, choice));
            }
            None => self.bodies[body_id.index()].is_constraint = true,
        }
    }

    /// Add a rule schema instantiated at every vertex of `topology` during finalization.
    /// Concrete instances share atoms: two schemas referring to the same family meet in the
    /// same per-vertex atom.
    pub fn add_abstract_rule(
        &mut self,
        head: Option<(AbstractAtomRef, bool)>,
        body: Vec<(AbstractAtomRef, bool)>,
        topology: TopologyRef,
    ) {
        warren_assert_simple!(!self.finalized);
        self.abstract_rules.push(AbstractRule {
            head,
            body,
            topology,
        });
    }

    /// Queue a rule program for compilation when solving starts.
    pub fn add_program(&mut self, program: RuleProgram, topology: TopologyRef) {
        warren_assert_simple!(!self.finalized);
        self.programs.push((program, topology));
    }

    /// Used by the grounder: a formula whose instances are keyed by a vertex becomes a graph
    /// variable relation once literals exist.
    pub(crate) fn register_vertex_family(
        &mut self,
        name: String,
        topology: TopologyRef,
        members: Vec<(VertexId, AtomId)>,
    ) {
        self.vertex_families.push(VertexFamily {
            name,
            topology,
            members,
        });
    }

    fn find_or_create_body(&mut self, literals: Vec<AtomLiteral>) -> BodyId {
        let mut positive: Vec<AtomId> = Vec::new();
        let mut negative: Vec<AtomId> = Vec::new();
        for literal in literals {
            if literal.positive {
                positive.push(literal.atom);
            } else {
                negative.push(literal.atom);
            }
        }
        positive.sort_by_key(|atom| atom.0);
        positive.dedup();
        negative.sort_by_key(|atom| atom.0);
        negative.dedup();

        let key = (
            positive.iter().map(|atom| atom.0).collect::<Vec<_>>(),
            negative.iter().map(|atom| atom.0).collect::<Vec<_>>(),
        );
        if let Some(&existing) = self.body_dedup.get(&key) {
            return existing;
        }

        let id = BodyId(self.bodies.len() as u32);
        for &atom in &positive {
            self.atoms[atom.index()].positive_in.push(id);
        }
        for &atom in &negative {
            self.atoms[atom.index()].negative_in.push(id);
        }
        self.bodies.push(BodyInfo {
            positive,
            negative,
            heads: Vec::new(),
            is_constraint: false,
            status: TruthStatus::Undetermined,
            num_undetermined: 0,
            literal: None,
            enqueued: false,
        });
        let _ = self.body_dedup.insert(key, id);
        id
    }

    /// Compile programs, expand abstract rules, propagate facts, compute components, assign
    /// literals, and emit the clause encodings into the solver. A conflict derived here means
    /// the program is unsatisfiable at the root.
    pub fn finalize(
        &mut self,
        solver: &mut ConstraintSolver,
    ) -> Result<(), ConstraintOperationError> {
        warren_assert_simple!(!self.finalized);

        let programs = std::mem::take(&mut self.programs);
        for (program, topology) in programs {
            compile_program(self, solver, program, &topology)
                .map_err(|_| ConstraintOperationError::InfeasibleConstraint)?;
        }

        self.expand_abstract_rules();
        self.finalized = true;

        if !self.propagate_facts() {
            return Err(ConstraintOperationError::InfeasibleConstraint);
        }

        self.compute_sccs();
        self.assign_literals(solver);
        self.emit_clauses(solver);
        self.emit_unfounded_set_analyzers(solver);
        self.register_graph_relations(solver);

        debug!(
            "rule database finalized: {} atoms, {} bodies, tight: {}",
            self.atoms.len(),
            self.bodies.len(),
            self.is_tight
        );
        Ok(())
    }

    fn expand_abstract_rules(&mut self) {
        let rules = std::mem::take(&mut self.abstract_rules);
        for rule in rules {
            for vertex in 0..rule.topology.num_vertices() {
                let head = rule
                    .head
                    .map(|(reference, choice)| (self.resolve_ref(reference, vertex), choice));
                let body = rule
                    .body
                    .iter()
                    .map(|&(reference, positive)| AtomLiteral {
                        atom: self.resolve_ref(reference, vertex),
                        positive,
                    })
                    .collect();
                self.add_rule(head, body);
            }
        }
    }

    fn resolve_ref(&mut self, reference: AbstractAtomRef, vertex: VertexId) -> AtomId {
        match reference {
            AbstractAtomRef::Concrete(atom) => atom,
            AbstractAtomRef::PerVertex(family) => self.concrete_instance(family, vertex),
        }
    }

    // Fact propagation: derive every truth status that follows without search. Returns false
    // on conflict.
    fn propagate_facts(&mut self) -> bool {
        // Atoms without any possible support are false.
        for index in 0..self.atoms.len() {
            let atom = &self.atoms[index];
            if atom.status == TruthStatus::Undetermined
                && !atom.is_external
                && atom.supports.is_empty()
            {
                self.set_atom_status(AtomId(index as u32), TruthStatus::False);
            }
        }

        // Every body starts with all of its literal slots open; the queue drain below performs
        // each satisfied-literal decrement exactly once, when the determining atom is
        // processed. Bodies are never empty (facts bypass body creation).
        for body in self.bodies.iter_mut() {
            if body.status == TruthStatus::Undetermined {
                body.num_undetermined = body.positive.len() + body.negative.len();
            }
        }

        while !self.conflict && (!self.atom_queue.is_empty() || !self.body_queue.is_empty()) {
            while let Some(atom_id) = self.atom_queue.pop() {
                self.propagate_atom(atom_id);
                if self.conflict {
                    return false;
                }
            }
            while let Some(body_id) = self.body_queue.pop() {
                self.propagate_body(body_id);
                if self.conflict {
                    return false;
                }
            }
        }
        !self.conflict
    }

    fn propagate_atom(&mut self, id: AtomId) {
        self.atoms[id.index()].enqueued = false;
        let status = self.atoms[id.index()].status;
        let positive_in = self.atoms[id.index()].positive_in.clone();
        let negative_in = self.atoms[id.index()].negative_in.clone();
        let supports = self.atoms[id.index()].supports.clone();

        match status {
            TruthStatus::True => {
                for body in negative_in {
                    self.set_body_status(body, TruthStatus::False);
                }
                for body in positive_in {
                    self.decrement_undetermined(body);
                }
            }
            TruthStatus::False => {
                for body in positive_in {
                    self.set_body_status(body, TruthStatus::False);
                }
                for body in negative_in {
                    self.decrement_undetermined(body);
                }
                // A false atom cannot have a true non-choice support.
                for (body, choice) in supports {
                    if !choice {
                        self.set_body_status(body, TruthStatus::False);
                    }
                }
            }
            TruthStatus::Undetermined => {}
        }
    }

    fn propagate_body(&mut self, id: BodyId) {
        self.bodies[id.index()].enqueued = false;
        let status = self.bodies[id.index()].status;
        let heads = self.bodies[id.index()].heads.clone();
        let is_constraint = self.bodies[id.index()].is_constraint;

        match status {
            TruthStatus::True => {
                if is_constraint {
                    self.conflict = true;
                    return;
                }
                for (head, choice) in heads {
                    if !choice {
                        self.set_atom_status(head, TruthStatus::True);
                    }
                }
            }
            TruthStatus::False => {
                for (head, _) in heads {
                    let atom = &self.atoms[head.index()];
                    if atom.status == TruthStatus::Undetermined
                        && !atom.is_external
                        && atom
                            .supports
                            .iter()
                            .all(|&(body, _)| self.bodies[body.index()].status == TruthStatus::False)
                    {
                        self.set_atom_status(head, TruthStatus::False);
                    }
                }
            }
            TruthStatus::Undetermined => {}
        }
    }

    fn decrement_undetermined(&mut self, body: BodyId) {
        let info = &mut self.bodies[body.index()];
        if info.status != TruthStatus::Undetermined {
            return;
        }
        warren_assert_simple!(info.num_undetermined > 0);
        info.num_undetermined -= 1;
        if info.num_undetermined == 0 {
            self.set_body_status(body, TruthStatus::True);
        }
    }

    fn set_atom_status(&mut self, id: AtomId, status: TruthStatus) {
        warren_assert_simple!(status != TruthStatus::Undetermined);
        let atom = &mut self.atoms[id.index()];
        match atom.status {
            TruthStatus::Undetermined => {
                atom.status = status;
                if !atom.enqueued {
                    atom.enqueued = true;
                    self.atom_queue.push(id);
                }
            }
            existing if existing == status => {}
            _ => self.conflict = true,
        }
    }

    fn set_body_status(&mut self, id: BodyId, status: TruthStatus) {
        warren_assert_simple!(status != TruthStatus::Undetermined);
        let body = &mut self.bodies[id.index()];
        match body.status {
            TruthStatus::Undetermined => {
                body.status = status;
                if !body.enqueued {
                    body.enqueued = true;
                    self.body_queue.push(id);
                }
            }
            existing if existing == status => {}
            _ => self.conflict = true,
        }
    }

    // SCCs of the positive dependency graph: atom -> supporting body -> the body's positive
    // literals. The program is tight when every component is a single node.
    fn compute_sccs(&mut self) {
        let num_atoms = self.atoms.len();
        let num_nodes = num_atoms + self.bodies.len();
        let mut adjacency = vec![Vec::new(); num_nodes];

        for (index, atom) in self.atoms.iter().enumerate() {
            for &(body, _) in &atom.supports {
                adjacency[index].push(num_atoms + body.index());
            }
        }
        for (index, body) in self.bodies.iter().enumerate() {
            for &atom in &body.positive {
                adjacency[num_atoms + index].push(atom.index());
            }
        }

        let result = find_sccs(&adjacency);
        self.is_tight = result
            .components
            .iter()
            .all(|component| component.len() == 1);

        for (index, atom) in self.atoms.iter_mut().enumerate() {
            atom.scc = Some(result.component_of[index]);
        }
    }

    fn assign_literals(&mut self, solver: &mut ConstraintSolver) {
        for index in 0..self.atoms.len() {
            let atom = &self.atoms[index];
            if atom.status != TruthStatus::Undetermined || atom.literal.is_some() {
                continue;
            }
            let variable =
                solver.internal_new_variable(atom.name.clone(), VariableDomain::boolean());
            self.atoms[index].literal = Some(Literal::new(variable, ValueSet::singleton(2, 1)));
        }

        for index in 0..self.bodies.len() {
            if self.bodies[index].status != TruthStatus::Undetermined {
                continue;
            }
            let active = self.active_body_literals(BodyId(index as u32));
            warren_assert_simple!(!active.is_empty());
            let literal = if active.len() == 1 {
                // A single-literal body is the literal itself; no auxiliary variable needed.
                active[0].clone()
            } else {
                let variable = solver
                    .internal_new_variable(format!("body{index}"), VariableDomain::boolean());
                Literal::new(variable, ValueSet::singleton(2, 1))
            };
            self.bodies[index].literal = Some(literal);
        }
    }

    /// The solver literals of a body's undetermined atom literals; determined-satisfied
    /// literals drop out of the encoding.
    fn active_body_literals(&self, id: BodyId) -> Vec<Literal> {
        let body = &self.bodies[id.index()];
        let mut literals = Vec::new();
        for &atom in &body.positive {
            let info = &self.atoms[atom.index()];
            if info.status == TruthStatus::Undetermined {
                literals.push(info.literal.clone().expect("undetermined atoms have literals"));
            }
        }
        for &atom in &body.negative {
            let info = &self.atoms[atom.index()];
            if info.status == TruthStatus::Undetermined {
                literals.push(
                    info.literal
                        .clone()
                        .expect("undetermined atoms have literals")
                        .negated(),
                );
            }
        }
        literals
    }

    fn emit_clauses(&mut self, solver: &mut ConstraintSolver) {
        let mut emit = |literals: Vec<Literal>| {
            let _ = solver.place_propagator(Box::new(ClausePropagator::new(
                crate::basic_types::Clause::new(literals),
                false,
            )));
        };

        // Facts on bound atoms become unit clauses.
        for atom in &self.atoms {
            if let Some(literal) = &atom.literal {
                match atom.status {
                    TruthStatus::True => emit(vec![literal.clone()]),
                    TruthStatus::False => emit(vec![literal.negated()]),
                    TruthStatus::Undetermined => {}
                }
            }
        }

        for index in 0..self.bodies.len() {
            let body = &self.bodies[index];
            if body.status != TruthStatus::Undetermined {
                // A true constraint body was already caught during fact propagation.
                continue;
            }
            let body_literal = body.literal.clone().expect("undetermined bodies have literals");
            let active = self.active_body_literals(BodyId(index as u32));

            // Body truth is the conjunction of its literals.
            if active.len() > 1 {
                let mut completion = vec![body_literal.clone()];
                for literal in &active {
                    emit(vec![body_literal.negated(), literal.clone()]);
                    completion.push(literal.negated());
                }
                emit(completion);
            }

            // A true body forces its non-choice heads.
            for &(head, choice) in &self.bodies[index].heads {
                if choice {
                    continue;
                }
                match self.atoms[head.index()].status {
                    TruthStatus::Undetermined => {
                        let head_literal = self.atoms[head.index()]
                            .literal
                            .clone()
                            .expect("undetermined atoms have literals");
                        emit(vec![body_literal.negated(), head_literal]);
                    }
                    TruthStatus::False => emit(vec![body_literal.negated()]),
                    TruthStatus::True => {}
                }
            }

            // A constraint body must not hold.
            if self.bodies[index].is_constraint {
                emit(vec![body_literal.negated()]);
            }
        }

        // An atom needs at least one true support.
        for index in 0..self.atoms.len() {
            let atom = &self.atoms[index];
            if atom.status != TruthStatus::Undetermined || atom.is_external {
                continue;
            }
            let satisfied = atom
                .supports
                .iter()
                .any(|&(body, _)| self.bodies[body.index()].status == TruthStatus::True);
            if satisfied {
                continue;
            }
            let mut clause = vec![atom
                .literal
                .clone()
                .expect("undetermined atoms have literals")
                .negated()];
            for &(body, _) in &atom.supports {
                if self.bodies[body.index()].status == TruthStatus::Undetermined {
                    clause.push(
                        self.bodies[body.index()]
                            .literal
                            .clone()
                            .expect("undetermined bodies have literals"),
                    );
                }
            }
            emit(clause);
        }
    }

    // Every strongly-connected component with more than one node needs unfounded-set
    // reasoning: no atom in the component may be true unless a body external to the component
    // supports it.
    fn emit_unfounded_set_analyzers(&mut self, solver: &mut ConstraintSolver) {
        if self.is_tight {
            return;
        }

        let mut components: FnvHashMap<usize, Vec<AtomId>> = FnvHashMap::default();
        for index in 0..self.atoms.len() {
            let atom = &self.atoms[index];
            if atom.status != TruthStatus::Undetermined {
                continue;
            }
            let scc = atom.scc.expect("components were computed");
            components
                .entry(scc)
                .or_default()
                .push(AtomId(index as u32));
        }

        let mut component_ids: Vec<usize> = components.keys().copied().collect();
        component_ids.sort_unstable();

        for scc in component_ids {
            // An atom with an unconditionally true support can never be unfounded.
            let members: Vec<AtomId> = components[&scc]
                .iter()
                .copied()
                .filter(|&atom| {
                    !self.atoms[atom.index()]
                        .supports
                        .iter()
                        .any(|&(body, _)| self.bodies[body.index()].status == TruthStatus::True)
                })
                .collect();
            let in_component: FnvHashMap<AtomId, usize> = members
                .iter()
                .enumerate()
                .map(|(position, &atom)| (atom, position))
                .collect();

            // A single atom only loops through a body that mentions it positively.
            let recursive = members.len() > 1
                || members.iter().any(|&atom| {
                    self.atoms[atom.index()].supports.iter().any(|&(body, _)| {
                        self.bodies[body.index()].positive.contains(&atom)
                    })
                });
            if !recursive {
                continue;
            }

            let mut analyzer_members = Vec::with_capacity(members.len());
            for &atom in &members {
                let info = &self.atoms[atom.index()];
                let mut supports = Vec::new();
                for &(body, _) in &info.supports {
                    let body_info = &self.bodies[body.index()];
                    if body_info.status == TruthStatus::False {
                        continue;
                    }
                    let members_in_body = body_info
                        .positive
                        .iter()
                        .filter_map(|positive| in_component.get(positive).copied())
                        .collect();
                    supports.push(SupportBody {
                        literal: body_info
                            .literal
                            .clone()
                            .expect("non-false bodies have literals"),
                        members_in_body,
                    });
                }
                analyzer_members.push(MemberAtom {
                    name: info.name.clone(),
                    literal: info.literal.clone().expect("undetermined atoms have literals"),
                    supports,
                });
            }

            let _ = solver.place_propagator(Box::new(UnfoundedSetAnalyzer::new(analyzer_members)));
        }
    }

    #[cfg(test)]
    pub(crate) fn body_status_of_atom_supports(&self, atom: AtomId) -> Vec<TruthStatus> {
        self.atoms[atom.index()]
            .supports
            .iter()
            .map(|&(body, _)| self.bodies[body.index()].status)
            .collect()
    }

    fn register_graph_relations(&mut self, solver: &mut ConstraintSolver) {
        let families = std::mem::take(&mut self.vertex_families);
        for family in families {
            let mut relation =
                GraphVariableRelation::new(family.name.clone(), Rc::clone(&family.topology));
            let mut any = false;
            for (vertex, atom) in family.members {
                if let Some(literal) = &self.atoms[atom.index()].literal {
                    relation.bind(vertex, literal.variable);
                    any = true;
                }
            }
            if any {
                solver.register_graph_relation(relation);
            }
        }

        for family in &self.abstract_atoms {
            let mut relation =
                GraphVariableRelation::new(family.name.clone(), Rc::clone(&family.topology));
            let mut any = false;
            for (vertex, atom) in family.concrete.iter().enumerate() {
                if let Some(atom) = atom {
                    if let Some(literal) = &self.atoms[atom.index()].literal {
                        relation.bind(vertex, literal.variable);
                        any = true;
                    }
                }
            }
            if any {
                solver.register_graph_relation(relation);
            }
        }
    }
}
