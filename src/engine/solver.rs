//! The CDCL search engine: decisions, propagation through the watch system, first-UIP conflict
//! analysis, clause learning, restarts, and the build API through which problems are stated.

use std::time::Instant;

use fnv::FnvHashSet;
use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::basic_types::Clause;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::ConstraintReference;
use crate::basic_types::Inconsistency;
use crate::basic_types::Solution;
use crate::basic_types::SolveResult;
use crate::basic_types::SolverStatus;
use crate::basic_types::ValueSet;
use crate::branching::DecisionHeuristic;
use crate::branching::LogReplayHeuristic;
use crate::branching::LrbHeuristic;
use crate::branching::SelectionContext;
use crate::branching::StaticOrderHeuristic;
use crate::branching::VsidsHeuristic;
use crate::engine::conflict_analysis::analyse_conflict;
use crate::engine::conflict_analysis::ConflictAnalysisResult;
use crate::engine::decision_log::write_solution_dump;
use crate::engine::decision_log::SolverDecisionLog;
use crate::engine::graph_promotion::clause_key;
use crate::engine::graph_promotion::promote_learned_clause;
use crate::engine::graph_promotion::ClauseKey;
use crate::engine::learned_clause_manager::LearnedClauseManager;
use crate::engine::propagation::ExplanationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorId;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagator_queue::PropagatorQueue;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::Literal;
use crate::engine::variables::VariableDomain;
use crate::engine::variables::VariableId;
use crate::engine::watch_list::WatchList;
use crate::program::RuleProgram;
use crate::propagators::AllDifferentPropagator;
use crate::propagators::CardinalityPropagator;
use crate::propagators::ClausePropagator;
use crate::propagators::DisjunctionPropagator;
use crate::propagators::IffPropagator;
use crate::propagators::InequalityPropagator;
use crate::propagators::LinearSumPropagator;
use crate::propagators::OffsetPropagator;
use crate::propagators::ReachabilityPropagator;
use crate::propagators::TablePropagator;
use crate::propagators::ValueBound;
use crate::restart::make_policy;
use crate::restart::RestartPolicy;
use crate::restart::RestartStrategy;
use crate::rules::RuleDatabase;
use crate::statistics::SolverStats;
use crate::topology::GraphRelationRegistry;
use crate::topology::GraphVariableRelation;
use crate::topology::TopologyRef;
use crate::topology::VertexId;
use crate::warren_assert_extreme;
use crate::warren_assert_moderate;
use crate::warren_assert_simple;

/// Constraint-queue priority levels.
const NUM_PRIORITY_LEVELS: usize = 5;
/// Learned clauses at or below this LBD are kept permanently.
const PERMANENT_LBD: u32 = 2;

/// Options controlling search behaviour. The seed makes runs reproducible: the same seed and
/// the same build sequence produce the same trail.
#[derive(Debug)]
pub struct SolverOptions {
    pub seed: u64,
    pub restart_strategy: RestartStrategy,
    /// Purge threshold for temporary learned clauses.
    pub max_temporary_clauses: usize,
    /// Attempt to promote learned clauses to per-vertex graph templates.
    pub enable_graph_promotion: bool,
    /// Record a replayable decision log during search.
    pub record_decision_log: bool,
}

impl Default for SolverOptions {
    fn default() -> SolverOptions {
        SolverOptions {
            seed: 42,
            restart_strategy: RestartStrategy::default(),
            max_temporary_clauses: 4096,
            enable_graph_promotion: true,
            record_decision_log: false,
        }
    }
}

/// Which decision heuristic to push onto the solver's heuristic stack.
#[derive(Debug)]
pub enum DecisionStrategy {
    Vsids,
    Lrb,
    StaticOrder,
    LogReplay(SolverDecisionLog),
}

pub struct ConstraintSolver {
    name: String,
    status: SolverStatus,
    store: VariableStore,
    watch_list: WatchList,
    propagators: Vec<Option<Box<dyn Propagator>>>,
    propagator_priorities: Vec<u32>,
    free_slots: Vec<usize>,
    backjump_listeners: Vec<PropagatorId>,
    propagator_queue: PropagatorQueue,
    /// Index of the next trail entry whose watchers have not fired yet; the variable-change
    /// queue is the trail suffix starting here.
    next_trail_event: usize,
    pending_conflict: Option<Clause>,
    /// Heuristic stack; queried from the top (end) down. Index 0 is the VSIDS fallback.
    heuristics: Vec<Box<dyn DecisionHeuristic>>,
    restart_policy: Box<dyn RestartPolicy>,
    learned: LearnedClauseManager,
    relations: GraphRelationRegistry,
    promoted_keys: FnvHashSet<ClauseKey>,
    rules: RuleDatabase,
    random: SmallRng,
    stats: SolverStats,
    options: SolverOptions,
    decision_log: SolverDecisionLog,
    affected_buffer: Vec<PropagatorId>,
}

impl std::fmt::Debug for ConstraintSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintSolver")
            .field("name", &self.name)
            .field("status", &self.status)
            .field("num_variables", &self.store.num_variables())
            .field("num_propagators", &self.propagators.len())
            .finish()
    }
}

impl ConstraintSolver {
    pub fn new(name: impl Into<String>, seed: u64) -> ConstraintSolver {
        ConstraintSolver::with_options(
            name,
            SolverOptions {
                seed,
                ..SolverOptions::default()
            },
        )
    }

    pub fn with_options(name: impl Into<String>, options: SolverOptions) -> ConstraintSolver {
        ConstraintSolver {
            name: name.into(),
            status: SolverStatus::Ready,
            store: VariableStore::new(),
            watch_list: WatchList::default(),
            propagators: Vec::new(),
            propagator_priorities: Vec::new(),
            free_slots: Vec::new(),
            backjump_listeners: Vec::new(),
            propagator_queue: PropagatorQueue::new(NUM_PRIORITY_LEVELS),
            next_trail_event: 0,
            pending_conflict: None,
            heuristics: vec![Box::new(VsidsHeuristic::new())],
            restart_policy: make_policy(options.restart_strategy),
            learned: LearnedClauseManager::new(options.max_temporary_clauses),
            relations: GraphRelationRegistry::default(),
            promoted_keys: FnvHashSet::default(),
            rules: RuleDatabase::default(),
            random: SmallRng::seed_from_u64(options.seed),
            stats: SolverStats::default(),
            options,
            decision_log: SolverDecisionLog::default(),
            affected_buffer: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_status(&self) -> SolverStatus {
        self.status
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }
}

// The build API: variables, constraints, rules.
impl ConstraintSolver {
    fn check_build_phase(&self) -> Result<(), ConstraintOperationError> {
        match self.status {
            SolverStatus::Ready => Ok(()),
            _ => Err(ConstraintOperationError::SolvingAlreadyStarted),
        }
    }

    pub fn new_variable(
        &mut self,
        name: impl Into<String>,
        domain: VariableDomain,
    ) -> Result<VariableId, ConstraintOperationError> {
        self.check_build_phase()?;
        self.store.new_variable(name.into(), domain, None)
    }

    pub fn new_variable_with_initial(
        &mut self,
        name: impl Into<String>,
        domain: VariableDomain,
        initial: ValueSet,
    ) -> Result<VariableId, ConstraintOperationError> {
        self.check_build_phase()?;
        self.store.new_variable(name.into(), domain, Some(initial))
    }

    pub fn new_boolean(
        &mut self,
        name: impl Into<String>,
    ) -> Result<VariableId, ConstraintOperationError> {
        self.new_variable(name, VariableDomain::boolean())
    }

    /// The literal asserting `variable == value`.
    pub fn eq_literal(&self, variable: VariableId, value: i32) -> Literal {
        let domain = self.store.domain(variable);
        let index = domain
            .value_to_index(value)
            .expect("the value lies in the variable's domain");
        Literal::new(variable, ValueSet::singleton(domain.size(), index))
    }

    /// The literal asserting a boolean variable is true.
    pub fn true_literal(&self, variable: VariableId) -> Literal {
        self.eq_literal(variable, 1)
    }

    pub fn domain_of(&self, variable: VariableId) -> VariableDomain {
        self.store.domain(variable)
    }

    pub fn add_clause(
        &mut self,
        literals: impl IntoIterator<Item = Literal>,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        let clause = Clause::new(literals.into_iter().collect());
        self.add_propagator(ClausePropagator::new(clause, false))
    }

    pub fn add_all_different(
        &mut self,
        variables: impl Into<Box<[VariableId]>>,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.add_propagator(AllDifferentPropagator::new(variables.into()))
    }

    pub fn add_table(
        &mut self,
        variables: impl Into<Box<[VariableId]>>,
        tuples: Vec<Vec<i32>>,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.add_propagator(TablePropagator::new(variables.into(), tuples))
    }

    /// `left + offset <= right`.
    pub fn add_inequality(
        &mut self,
        left: VariableId,
        right: VariableId,
        offset: i32,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.add_propagator(InequalityPropagator::new(left, right, offset))
    }

    /// `target = source + offset`.
    pub fn add_offset(
        &mut self,
        source: VariableId,
        target: VariableId,
        offset: i32,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.add_propagator(OffsetPropagator::new(source, target, offset))
    }

    pub fn add_cardinality(
        &mut self,
        variables: impl Into<Box<[VariableId]>>,
        bounds: Vec<ValueBound>,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.add_propagator(CardinalityPropagator::new(variables.into(), bounds))
    }

    /// `min_sum <= Σ variables <= max_sum`.
    pub fn add_sum(
        &mut self,
        variables: impl Into<Box<[VariableId]>>,
        min_sum: i64,
        max_sum: i64,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.add_propagator(LinearSumPropagator::new(variables.into(), min_sum, max_sum))
    }

    pub fn add_iff(
        &mut self,
        left: Literal,
        right: Literal,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.add_propagator(IffPropagator::new(left, right))
    }

    /// At least one group of literals must hold in full.
    pub fn add_disjunction(
        &mut self,
        groups: Vec<Vec<Literal>>,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.add_propagator(DisjunctionPropagator::new(groups))
    }

    /// Every vertex whose boolean variable is on must be reachable from `source` through
    /// possibly-on vertices.
    pub fn add_reachability(
        &mut self,
        topology: TopologyRef,
        vertex_variables: Vec<VariableId>,
        source: VertexId,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.add_propagator(ReachabilityPropagator::new(
            topology,
            vertex_variables,
            source,
        ))
    }

    /// Register a vertex→variable relation, making clauses over its variables eligible for
    /// graph promotion.
    pub fn register_graph_relation(&mut self, relation: GraphVariableRelation) {
        let _ = self.relations.register(relation);
    }

    /// Register a rule program to be grounded over `topology` when solving starts.
    pub fn add_program(
        &mut self,
        program: RuleProgram,
        topology: TopologyRef,
    ) -> Result<(), ConstraintOperationError> {
        self.check_build_phase()?;
        self.rules.add_program(program, topology);
        Ok(())
    }

    /// Access to the rule database for building rule programs against this solver.
    pub fn rules_mut(&mut self) -> &mut RuleDatabase {
        &mut self.rules
    }

    pub fn rules(&self) -> &RuleDatabase {
        &self.rules
    }

    fn add_propagator(
        &mut self,
        propagator: impl Propagator + 'static,
    ) -> Result<PropagatorId, ConstraintOperationError> {
        self.check_build_phase()?;
        Ok(self.place_propagator(Box::new(propagator)))
    }

    /// Used by the rule database during finalization, when the status is already `Solving`.
    pub(crate) fn place_propagator(&mut self, propagator: Box<dyn Propagator>) -> PropagatorId {
        let priority = propagator.priority();
        match self.free_slots.pop() {
            Some(slot) => {
                self.propagators[slot] = Some(propagator);
                self.propagator_priorities[slot] = priority;
                PropagatorId(slot as u32)
            }
            None => {
                self.propagators.push(Some(propagator));
                self.propagator_priorities.push(priority);
                PropagatorId(self.propagators.len() as u32 - 1)
            }
        }
    }

    pub fn push_heuristic(&mut self, strategy: DecisionStrategy) {
        let heuristic: Box<dyn DecisionHeuristic> = match strategy {
            DecisionStrategy::Vsids => Box::new(VsidsHeuristic::new()),
            DecisionStrategy::Lrb => Box::new(LrbHeuristic::new()),
            DecisionStrategy::StaticOrder => Box::new(StaticOrderHeuristic),
            DecisionStrategy::LogReplay(log) => Box::new(LogReplayHeuristic::new(log)),
        };
        self.heuristics.push(heuristic);
    }

    pub fn enable_decision_log(&mut self) {
        self.options.record_decision_log = true;
    }

    pub fn decision_log(&self) -> &SolverDecisionLog {
        &self.decision_log
    }
}

// The solve API.
impl ConstraintSolver {
    pub fn solve(&mut self) -> SolveResult {
        let start = Instant::now();
        let result = loop {
            match self.step() {
                SolveResult::Unsolved => continue,
                result => break result,
            }
        };
        self.stats.duration += start.elapsed();
        result
    }

    /// Finalize the build (compile rule programs, initialise propagators, run the initial
    /// root-level propagation) without making any decision.
    pub fn start_solving(&mut self) {
        if self.status != SolverStatus::Ready {
            return;
        }
        self.status = SolverStatus::Solving;
        debug!("{}: finalizing build", self.name);

        // Compile and emit the rule programs; the rule database creates variables and clause
        // constraints through the solver.
        let mut rules = std::mem::take(&mut self.rules);
        let rules_ok = rules.finalize(self);
        self.rules = rules;
        if rules_ok.is_err() {
            debug!("{}: rule database is conflicting at the root", self.name);
            self.status = SolverStatus::Unsatisfiable;
            return;
        }

        // Initialise every propagator: watches are registered here.
        self.watch_list.grow_to(self.store.num_variables());
        self.propagator_queue.grow_to(self.propagators.len());
        for index in 0..self.propagators.len() {
            let Some(propagator) = self.propagators[index].as_mut() else {
                continue;
            };
            let id = PropagatorId(index as u32);
            let mut context =
                PropagatorInitialisationContext::new(&self.store, &mut self.watch_list, id);
            if propagator.initialise_at_root(&mut context).is_err() {
                self.status = SolverStatus::Unsatisfiable;
                return;
            }
            if propagator.wants_backjump_notifications() {
                self.backjump_listeners.push(id);
            }
            self.propagator_queue
                .enqueue(id, self.propagator_priorities[index]);
        }

        for heuristic in self.heuristics.iter_mut() {
            heuristic.initialise(&self.store, &mut self.random);
        }

        // Initial propagation establishes arc-consistency at the root.
        self.propagate();
        if self.pending_conflict.take().is_some() {
            self.status = SolverStatus::Unsatisfiable;
        }
    }

    /// One search iteration: propagate, then either resolve a conflict or make a decision.
    pub fn step(&mut self) -> SolveResult {
        match self.status {
            SolverStatus::Ready => {
                self.start_solving();
                return self.step_result();
            }
            SolverStatus::Solving => {}
            SolverStatus::Solved => return SolveResult::Solved,
            SolverStatus::Unsatisfiable => return SolveResult::Unsatisfiable,
        }

        self.stats.num_steps += 1;
        self.propagate();

        if let Some(conflict) = self.pending_conflict.take() {
            self.stats.num_conflicts += 1;
            self.learned.on_conflict();

            match analyse_conflict(&self.store, &self.propagators, self.learned.ids(), conflict) {
                None => {
                    self.status = SolverStatus::Unsatisfiable;
                }
                Some(result) => {
                    self.process_learned_clause(result);
                    self.consider_restart();
                    self.consider_purge();
                }
            }
        } else {
            self.make_decision();
        }

        self.step_result()
    }

    fn step_result(&self) -> SolveResult {
        match self.status {
            SolverStatus::Solved => SolveResult::Solved,
            SolverStatus::Unsatisfiable => SolveResult::Unsatisfiable,
            _ => SolveResult::Unsolved,
        }
    }

    pub fn solved_value(&self, variable: VariableId) -> Option<i32> {
        self.store.solved_value(variable)
    }

    /// The values still possible for `variable`.
    pub fn potential_values(&self, variable: VariableId) -> Vec<i32> {
        let domain = self.store.domain(variable);
        self.store
            .potential_values(variable)
            .iter_set()
            .map(|index| domain.index_to_value(index))
            .collect()
    }

    pub fn solution(&self) -> Option<Solution> {
        if self.status != SolverStatus::Solved {
            return None;
        }
        let values = self
            .store
            .variables()
            .map(|variable| {
                self.store
                    .solved_value(variable)
                    .expect("every variable is solved")
            })
            .collect();
        Some(Solution::new(values))
    }

    pub fn write_solution(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        write_solution_dump(&self.store, path)
    }

    pub fn log_statistics(&self) {
        self.stats.log_statistics();
    }
}

// Internal search machinery.
impl ConstraintSolver {
    /// Drain the variable-change queue (the unprocessed trail suffix), firing watchers in
    /// registration order; when it is empty, pop one propagator from the constraint queue.
    /// Repeat until a fixed point or a conflict.
    fn propagate(&mut self) {
        warren_assert_simple!(self.pending_conflict.is_none());
        let trail_before = self.store.num_trail_entries();

        'fixpoint: loop {
            while self.next_trail_event < self.store.num_trail_entries() {
                let event = self.next_trail_event;
                self.next_trail_event += 1;

                let entry = self.store.entry(event);
                let variable = entry.variable;
                let previous = entry.previous_values.clone();
                let new = entry.new_values.clone();

                for heuristic in self.heuristics.iter_mut() {
                    heuristic.on_assigned(variable, &previous, &new);
                }

                let mut affected = std::mem::take(&mut self.affected_buffer);
                self.watch_list
                    .affected_propagators(variable, &previous, &new, &mut affected);
                let mut failure = None;
                for position in 0..affected.len() {
                    let id = affected[position];
                    if let Err(inconsistency) = self.notify_propagator(id, variable, &previous) {
                        failure = Some((id, inconsistency));
                        break;
                    }
                }
                self.affected_buffer = affected;
                if let Some((id, inconsistency)) = failure {
                    self.record_conflict(id, inconsistency);
                    break 'fixpoint;
                }
            }

            match self.propagator_queue.pop() {
                Some(id) => {
                    if let Err(inconsistency) = self.run_propagator(id) {
                        self.record_conflict(id, inconsistency);
                        break 'fixpoint;
                    }
                }
                None => break 'fixpoint,
            }
        }

        self.stats.num_propagations += (self.store.num_trail_entries() - trail_before) as u64;
    }

    fn notify_propagator(
        &mut self,
        id: PropagatorId,
        variable: VariableId,
        previous: &ValueSet,
    ) -> Result<(), Inconsistency> {
        let Some(propagator) = self.propagators[id.index()].as_mut() else {
            return Ok(());
        };
        let mut context = PropagationContextMut::new(
            &mut self.store,
            &mut self.watch_list,
            &mut self.propagator_queue,
            id,
            self.propagator_priorities[id.index()],
        );
        propagator.on_narrowed(&mut context, variable, previous)
    }

    fn run_propagator(&mut self, id: PropagatorId) -> Result<(), Inconsistency> {
        let Some(propagator) = self.propagators[id.index()].as_mut() else {
            return Ok(());
        };
        let mut context = PropagationContextMut::new(
            &mut self.store,
            &mut self.watch_list,
            &mut self.propagator_queue,
            id,
            self.propagator_priorities[id.index()],
        );
        propagator.propagate(&mut context)
    }

    /// Turn a propagator failure into the conflict clause conflict analysis starts from.
    fn record_conflict(&mut self, id: PropagatorId, inconsistency: Inconsistency) {
        let clause = match inconsistency {
            Inconsistency::Conflict(clause) => clause,
            Inconsistency::EmptyDomain(empty) => {
                let propagator = self.propagators[id.index()]
                    .as_ref()
                    .expect("the failing propagator exists");
                let context = ExplanationContext::at_current(&self.store);
                propagator.explain(&context, empty.variable, &empty.attempted)
            }
        };
        debug!(
            "{}: conflict at level {} ({} literals)",
            self.name,
            self.store.decision_level(),
            clause.len()
        );
        self.pending_conflict = Some(clause);
    }

    fn make_decision(&mut self) {
        let decision = {
            let mut context = SelectionContext::new(&self.store, &mut self.random);
            self.heuristics
                .iter_mut()
                .rev()
                .find_map(|heuristic| heuristic.next_decision(&mut context))
        };

        match decision {
            Some((variable, values)) => {
                self.stats.num_decisions += 1;
                self.store.push_decision_level();

                if self.options.record_decision_log {
                    self.decision_log.add_decision(
                        self.store.decision_level(),
                        variable.raw(),
                        values.first_set().expect("decisions pick possible values"),
                    );
                }

                let changed = self
                    .store
                    .constrain(variable, &values, ConstraintReference::decision())
                    .expect("heuristics only pick possible values");
                warren_assert_moderate!(changed, "a decision must narrow its variable");
            }
            None => {
                warren_assert_simple!(
                    self.store.all_solved(),
                    "heuristics only run dry once every variable is a singleton"
                );
                warren_assert_extreme!(self
                    .propagators
                    .iter()
                    .flatten()
                    .all(|propagator| !propagator.check_conflicting(&self.store)));
                self.status = SolverStatus::Solved;
            }
        }
    }

    fn process_learned_clause(&mut self, result: ConflictAnalysisResult) {
        for heuristic in self.heuristics.iter_mut() {
            for &variable in &result.participating_variables {
                heuristic.on_conflict_participation(variable);
            }
            for &variable in &result.reason_variables {
                heuristic.on_reason_participation(variable);
            }
            heuristic.on_clause_learned();
        }
        for &id in &result.resolved_constraints {
            self.learned.bump_activity(id);
        }

        self.restart_policy
            .on_clause_learned(result.lbd, self.store.num_trail_entries());

        self.stats.num_learned_clauses += 1;
        self.stats
            .average_learned_clause_length
            .add_term(result.learned_clause.len() as u64);
        self.stats.average_lbd.add_term(u64::from(result.lbd));
        if result.learned_clause.len() == 1 {
            self.stats.num_learned_unit_clauses += 1;
        }

        self.backjump(result.backjump_level);

        // Install the learned clause and re-establish propagation with it as the cause of the
        // asserting literal.
        let is_permanent = result.lbd <= PERMANENT_LBD || result.learned_clause.len() == 1;
        let id = self.place_propagator(Box::new(ClausePropagator::new(
            Clause::new(result.learned_clause.clone()),
            true,
        )));
        self.initialise_placed_propagator(id);
        if !is_permanent {
            self.learned.register(id, result.lbd);
        }

        let asserting = result.asserting_literal;
        let _ = self
            .store
            .constrain(
                asserting.variable,
                &asserting.values,
                ConstraintReference::constraint(id),
            )
            .expect("the asserting literal is possible after the backjump");

        if self.options.enable_graph_promotion {
            self.promote_clause(&result.learned_clause);
        }
    }

    fn initialise_placed_propagator(&mut self, id: PropagatorId) {
        self.watch_list.grow_to(self.store.num_variables());
        self.propagator_queue.grow_to(self.propagators.len());
        let propagator = self.propagators[id.index()]
            .as_mut()
            .expect("the propagator was just placed");
        let mut context =
            PropagatorInitialisationContext::new(&self.store, &mut self.watch_list, id);
        let initialised = propagator.initialise_at_root(&mut context);
        warren_assert_simple!(initialised.is_ok(), "learned clauses are never empty");
        if propagator.wants_backjump_notifications() {
            self.backjump_listeners.push(id);
        }
    }

    fn promote_clause(&mut self, literals: &[Literal]) {
        let instances = promote_learned_clause(literals, &self.relations);
        for instance in instances {
            // Only instantiate where the masks fit the variables' domains.
            let fits = instance.iter().all(|literal| {
                self.store.domain(literal.variable).size() == literal.values.len()
            });
            if !fits {
                continue;
            }
            let key = clause_key(&instance);
            if !self.promoted_keys.insert(key) {
                continue;
            }
            let id = self.place_propagator(Box::new(ClausePropagator::new(
                Clause::new(instance),
                false,
            )));
            self.initialise_placed_propagator(id);
            self.propagator_queue
                .enqueue(id, self.propagator_priorities[id.index()]);
            self.stats.num_promoted_clauses += 1;
        }
    }

    fn backjump(&mut self, target_level: usize) {
        let distance = (self.store.decision_level() - target_level) as u64;
        self.stats.num_backjumps += 1;
        self.stats.max_backjump = self.stats.max_backjump.max(distance);

        let undone = self.store.backjump(target_level);
        for entry in &undone {
            for heuristic in self.heuristics.iter_mut() {
                heuristic.on_unassigned(entry.variable, &entry.new_values, &entry.previous_values);
            }
        }

        self.watch_list.on_backjump(target_level);
        self.propagator_queue.clear();
        self.next_trail_event = self.next_trail_event.min(self.store.num_trail_entries());

        for index in 0..self.backjump_listeners.len() {
            let id = self.backjump_listeners[index];
            if let Some(propagator) = self.propagators[id.index()].as_mut() {
                propagator.on_backjump(target_level);
            }
        }
    }

    fn consider_restart(&mut self) {
        if self.store.decision_level() == 0 {
            return;
        }
        if self
            .restart_policy
            .should_restart(self.store.num_trail_entries())
        {
            debug!("{}: restarting", self.name);
            self.stats.num_restarts += 1;
            self.backjump(0);
            self.restart_policy.on_restart();
            for heuristic in self.heuristics.iter_mut() {
                heuristic.on_restart();
            }
        }
    }

    fn consider_purge(&mut self) {
        if !self.learned.should_purge() {
            return;
        }
        let mut locked = FnvHashSet::default();
        for index in 0..self.store.num_trail_entries() {
            if let Some(id) = self.store.entry(index).cause.as_propagator() {
                let _ = locked.insert(id);
            }
        }
        let purged = self.learned.purge(&locked);
        self.stats.num_purged_clauses += purged.len() as u64;
        for id in purged {
            self.watch_list.kill_propagator_watches(id);
            self.propagators[id.index()] = None;
            self.free_slots.push(id.index());
        }
    }
}

// Crate-internal access for the rule layer.
impl ConstraintSolver {
    pub(crate) fn internal_new_variable(
        &mut self,
        name: String,
        domain: VariableDomain,
    ) -> VariableId {
        self.store
            .new_variable(name, domain, None)
            .expect("a full initial domain is never empty")
    }
}
