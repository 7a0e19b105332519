//! Promotion of learned clauses to graph templates. When every literal of a learned clause is
//! produced by a registered vertex→variable relation at one common anchor vertex, the clause
//! is a per-vertex instance of a general rule; the same template is then instantiated at every
//! other vertex where all the relations resolve.

use crate::basic_types::ValueSet;
use crate::engine::variables::Literal;
use crate::topology::topology_eq;
use crate::topology::GraphRelationRegistry;
use crate::topology::TopologyRef;

/// A key identifying a clause up to literal order, used to drop duplicate instantiations.
pub(crate) type ClauseKey = Vec<(u32, String)>;

pub(crate) fn clause_key(literals: &[Literal]) -> ClauseKey {
    let mut key: ClauseKey = literals
        .iter()
        .map(|literal| (literal.variable.raw(), literal.values.to_bit_string()))
        .collect();
    key.sort();
    key
}

/// A promotable clause: one relation per literal, all anchored at the same vertex of the same
/// topology.
struct Template<'a> {
    topology: &'a TopologyRef,
    relations: Vec<usize>,
    masks: Vec<&'a ValueSet>,
    anchor: usize,
}

/// Try to promote `literals`; on success returns the clauses instantiated at every other
/// vertex (the anchor's instance is the learned clause itself).
pub(crate) fn promote_learned_clause(
    literals: &[Literal],
    registry: &GraphRelationRegistry,
) -> Vec<Vec<Literal>> {
    if registry.is_empty() || literals.is_empty() {
        return Vec::new();
    }
    let Some(template) = find_template(literals, registry) else {
        return Vec::new();
    };

    let mut instances = Vec::new();
    'vertices: for vertex in 0..template.topology.num_vertices() {
        if vertex == template.anchor {
            continue;
        }
        let mut clause = Vec::with_capacity(literals.len());
        for (position, &relation_index) in template.relations.iter().enumerate() {
            let relation = registry.relation(relation_index);
            let Some(variable) = relation.resolve(vertex) else {
                // Promotion only succeeds where every relation resolves.
                continue 'vertices;
            };
            clause.push(Literal::new(variable, template.masks[position].clone()));
        }
        instances.push(clause);
    }
    instances
}

fn find_template<'a>(
    literals: &'a [Literal],
    registry: &'a GraphRelationRegistry,
) -> Option<Template<'a>> {
    // Anchor candidates come from the first literal; each must be confirmed by every other
    // literal having a relation producing its variable at the same vertex.
    let first_sources = registry.sources_of(literals[0].variable);

    'candidates: for &(first_relation, anchor) in first_sources {
        let topology = registry.relation(first_relation).topology();
        let mut relations = vec![first_relation];

        for literal in &literals[1..] {
            let matching = registry
                .sources_of(literal.variable)
                .iter()
                .find(|&&(relation_index, vertex)| {
                    vertex == anchor
                        && topology_eq(registry.relation(relation_index).topology(), topology)
                });
            match matching {
                Some(&(relation_index, _)) => relations.push(relation_index),
                None => continue 'candidates,
            }
        }

        return Some(Template {
            topology,
            relations,
            masks: literals.iter().map(|literal| &literal.values).collect(),
            anchor,
        });
    }
    None
}
