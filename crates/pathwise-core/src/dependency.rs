//! # Concept Dependencies
//!
//! Concept-prerequisite graphs, one per skill.
//!
//! Stored rows are loaded verbatim into a [`DirectedGraph`] and checked with a
//! topological sort before anything else happens: a stored cycle
//! (`StoredCycle`) or a row naming a concept the skill does not own
//! (`DanglingPrerequisite`) is corruption, while a requested edge that would close a
//! cycle is a rejected mutation (`CycleRejected`).
//!
//! Edges point from the prerequisite to the concept that needs it, so the
//! topological order runs from foundations to advanced concepts.
//!
//! ## Write discipline
//!
//! Validation runs against a snapshot. Two writers validating different
//! edges against the same stale snapshot could together close a cycle, so
//! [`ConceptDependencyService`] serialises every write per skill and reads
//! the snapshot inside the lock.

use crate::graph::DirectedGraph;
use crate::{NodeId, PathwiseError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};

// =============================================================================
// ROWS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub concept_id: i64,
    pub skill_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A stored edge: `prerequisite_id` must be learned before `concept_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub skill_id: i64,
    pub concept_id: i64,
    pub prerequisite_id: i64,
}

/// Everything stored for one skill.
///
/// `concepts` may also hold rows of other skills; only rows of `skill_id`
/// become graph nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSnapshot {
    pub skill_id: i64,
    #[serde(default)]
    pub skill_name: String,
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
}

impl SkillSnapshot {
    fn concept(&self, concept_id: i64) -> Option<&Concept> {
        self.concepts
            .iter()
            .find(|concept| concept.concept_id == concept_id)
    }

    /// Concepts of this skill ordered by id.
    fn own_concepts(&self) -> Vec<&Concept> {
        let mut own: Vec<&Concept> = self
            .concepts
            .iter()
            .filter(|concept| concept.skill_id == self.skill_id)
            .collect();
        own.sort_by_key(|concept| concept.concept_id);
        own
    }

    /// Stored edges of this skill in storage order.
    fn own_prerequisites(&self) -> impl Iterator<Item = &Prerequisite> {
        self.prerequisites
            .iter()
            .filter(|row| row.skill_id == self.skill_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConcept {
    pub skill_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPrerequisite {
    pub skill_id: i64,
    pub concept_id: i64,
    pub prerequisite_id: i64,
}

impl NewPrerequisite {
    fn validate(&self) -> Result<(), PathwiseError> {
        if self.skill_id <= 0 {
            return Err(PathwiseError::InvalidInput(
                "skill id is required".to_string(),
            ));
        }
        if self.concept_id <= 0 || self.prerequisite_id <= 0 {
            return Err(PathwiseError::InvalidInput(
                "concept id and prerequisite id are required".to_string(),
            ));
        }
        if self.concept_id == self.prerequisite_id {
            return Err(PathwiseError::SelfReference(self.concept_id));
        }
        Ok(())
    }
}

/// What a valid prerequisite request amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "row", rename_all = "snake_case")]
pub enum PrerequisitePlan {
    /// The edge is already stored; nothing to write.
    AlreadyPresent,
    /// The edge keeps the graph acyclic and should be stored.
    Insert(Prerequisite),
}

// =============================================================================
// GRAPH VIEW
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptEdge {
    pub from_prerequisite_id: i64,
    pub to_concept_id: i64,
}

/// A skill's concepts, edges and foundation-first order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillGraph {
    pub skill_id: i64,
    pub skill_name: String,
    pub concepts: Vec<Concept>,
    pub edges: Vec<ConceptEdge>,
    pub topological_order: Vec<i64>,
}

/// Load a skill's stored graph and run the corruption check.
pub fn build_skill_graph(snapshot: &SkillSnapshot) -> Result<DirectedGraph, PathwiseError> {
    load_checked(snapshot).map(|(graph, _)| graph)
}

fn load_checked(snapshot: &SkillSnapshot) -> Result<(DirectedGraph, Vec<NodeId>), PathwiseError> {
    let nodes = snapshot
        .own_concepts()
        .into_iter()
        .map(|concept| (NodeId(concept.concept_id), concept.name.clone()));
    let edges = snapshot
        .own_prerequisites()
        .map(|row| (NodeId(row.prerequisite_id), NodeId(row.concept_id)));

    let mut graph = DirectedGraph::from_stored(nodes, edges);

    let dangling = snapshot.own_prerequisites().find(|row| {
        !graph.contains_node(NodeId(row.prerequisite_id))
            || !graph.contains_node(NodeId(row.concept_id))
    });
    if let Some(row) = dangling {
        tracing::warn!(
            skill_id = snapshot.skill_id,
            from = row.prerequisite_id,
            to = row.concept_id,
            "stored prerequisite references an unknown concept"
        );
        return Err(PathwiseError::DanglingPrerequisite {
            skill_id: snapshot.skill_id,
            concept_id: row.concept_id,
            prerequisite_id: row.prerequisite_id,
        });
    }

    let topo = graph.try_topological_order();
    if !topo.complete {
        tracing::warn!(skill_id = snapshot.skill_id, "stored prerequisites contain a cycle");
        return Err(PathwiseError::StoredCycle {
            skill_id: snapshot.skill_id,
        });
    }

    Ok((graph, topo.order))
}

/// Concepts, edges and topological order of a skill.
pub fn skill_graph_view(snapshot: &SkillSnapshot) -> Result<SkillGraph, PathwiseError> {
    let (graph, order) = load_checked(snapshot)?;

    let mut seen = BTreeSet::new();
    let edges = snapshot
        .own_prerequisites()
        .filter(|row| graph.has_edge(NodeId(row.prerequisite_id), NodeId(row.concept_id)))
        .filter(|row| seen.insert((row.prerequisite_id, row.concept_id)))
        .map(|row| ConceptEdge {
            from_prerequisite_id: row.prerequisite_id,
            to_concept_id: row.concept_id,
        })
        .collect();

    Ok(SkillGraph {
        skill_id: snapshot.skill_id,
        skill_name: snapshot.skill_name.clone(),
        concepts: snapshot.own_concepts().into_iter().cloned().collect(),
        edges,
        topological_order: order.into_iter().map(NodeId::value).collect(),
    })
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Decide whether `request` may be stored against `snapshot`.
///
/// Checks run in a fixed order: request fields, self-reference, concept
/// existence, skill membership, idempotency, stored corruption and finally
/// the acyclic guard.
pub fn plan_prerequisite(
    snapshot: &SkillSnapshot,
    request: &NewPrerequisite,
) -> Result<PrerequisitePlan, PathwiseError> {
    request.validate()?;
    if snapshot.skill_id != request.skill_id {
        return Err(PathwiseError::InvalidInput(format!(
            "snapshot is for skill {}, request is for skill {}",
            snapshot.skill_id, request.skill_id
        )));
    }

    let concept = snapshot
        .concept(request.concept_id)
        .ok_or(PathwiseError::ConceptNotFound(request.concept_id))?;
    let prerequisite = snapshot
        .concept(request.prerequisite_id)
        .ok_or(PathwiseError::ConceptNotFound(request.prerequisite_id))?;
    if concept.skill_id != request.skill_id || prerequisite.skill_id != request.skill_id {
        return Err(PathwiseError::SkillMismatch {
            skill_id: request.skill_id,
        });
    }

    let row = Prerequisite {
        skill_id: request.skill_id,
        concept_id: request.concept_id,
        prerequisite_id: request.prerequisite_id,
    };
    if snapshot.prerequisites.contains(&row) {
        return Ok(PrerequisitePlan::AlreadyPresent);
    }

    let mut graph = build_skill_graph(snapshot)?;
    if !graph.try_add_edge_acyclic(NodeId(row.prerequisite_id), NodeId(row.concept_id)) {
        return Err(PathwiseError::CycleRejected {
            from: row.prerequisite_id,
            to: row.concept_id,
        });
    }

    Ok(PrerequisitePlan::Insert(row))
}

/// Normalise a concept request: trimmed name, empty description dropped,
/// names unique per skill.
pub fn validate_new_concept(
    snapshot: &SkillSnapshot,
    request: &NewConcept,
) -> Result<NewConcept, PathwiseError> {
    if request.skill_id <= 0 {
        return Err(PathwiseError::InvalidInput(
            "skill id is required".to_string(),
        ));
    }
    let name = request.name.trim();
    if name.is_empty() {
        return Err(PathwiseError::InvalidInput("name is required".to_string()));
    }
    if snapshot.skill_id != request.skill_id {
        return Err(PathwiseError::SkillMismatch {
            skill_id: request.skill_id,
        });
    }

    let duplicate = snapshot
        .own_concepts()
        .iter()
        .any(|concept| concept.name == name);
    if duplicate {
        return Err(PathwiseError::DuplicateConcept {
            skill_id: request.skill_id,
            name: name.to_string(),
        });
    }

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    Ok(NewConcept {
        skill_id: request.skill_id,
        name: name.to_string(),
        description,
    })
}

// =============================================================================
// STORE
// =============================================================================

/// Persistence seen by the dependency service.
///
/// Methods take `&self`: implementations own their synchronisation, the
/// service only serialises writes per skill.
pub trait PrerequisiteStore {
    /// Rows of one skill, or `None` if the skill does not exist.
    fn snapshot(&self, skill_id: i64) -> Result<Option<SkillSnapshot>, PathwiseError>;

    /// Any concept by id, whatever its skill.
    fn concept(&self, concept_id: i64) -> Result<Option<Concept>, PathwiseError>;

    /// Store a validated concept and return it with its assigned id.
    fn insert_concept(&self, concept: NewConcept) -> Result<Concept, PathwiseError>;

    /// Append a validated prerequisite row.
    fn insert_prerequisite(&self, row: Prerequisite) -> Result<(), PathwiseError>;
}

#[derive(Debug, Default)]
struct StoreState {
    skills: BTreeMap<i64, String>,
    concepts: BTreeMap<i64, Concept>,
    prerequisites: Vec<Prerequisite>,
}

/// Reference store keeping every row in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with the rows of a snapshot, taken verbatim.
    #[must_use]
    pub fn from_snapshot(snapshot: SkillSnapshot) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            state
                .skills
                .insert(snapshot.skill_id, snapshot.skill_name);
            for concept in snapshot.concepts {
                state.concepts.insert(concept.concept_id, concept);
            }
            state.prerequisites = snapshot.prerequisites;
        }
        store
    }

    /// Register a skill. Re-adding keeps the first name.
    pub fn add_skill(&self, skill_id: i64, name: impl Into<String>) {
        self.lock().skills.entry(skill_id).or_insert_with(|| name.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PrerequisiteStore for InMemoryStore {
    fn snapshot(&self, skill_id: i64) -> Result<Option<SkillSnapshot>, PathwiseError> {
        let state = self.lock();
        let Some(skill_name) = state.skills.get(&skill_id) else {
            return Ok(None);
        };

        Ok(Some(SkillSnapshot {
            skill_id,
            skill_name: skill_name.clone(),
            concepts: state
                .concepts
                .values()
                .filter(|concept| concept.skill_id == skill_id)
                .cloned()
                .collect(),
            prerequisites: state
                .prerequisites
                .iter()
                .filter(|row| row.skill_id == skill_id)
                .copied()
                .collect(),
        }))
    }

    fn concept(&self, concept_id: i64) -> Result<Option<Concept>, PathwiseError> {
        Ok(self.lock().concepts.get(&concept_id).cloned())
    }

    fn insert_concept(&self, concept: NewConcept) -> Result<Concept, PathwiseError> {
        let mut state = self.lock();
        let concept_id = match state.concepts.keys().next_back() {
            None => 1,
            Some(last) => last.checked_add(1).ok_or_else(|| {
                PathwiseError::InvalidInput("concept id space exhausted".to_string())
            })?,
        };
        let stored = Concept {
            concept_id,
            skill_id: concept.skill_id,
            name: concept.name,
            description: concept.description,
        };
        state.concepts.insert(concept_id, stored.clone());
        Ok(stored)
    }

    fn insert_prerequisite(&self, row: Prerequisite) -> Result<(), PathwiseError> {
        self.lock().prerequisites.push(row);
        Ok(())
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// One lock per skill id, created on first use.
///
/// Entries are dropped once no writer holds or waits on them, so the map
/// only holds skills with writes in flight.
#[derive(Debug, Default)]
pub struct SkillLocks {
    locks: Mutex<BTreeMap<i64, Arc<Mutex<()>>>>,
}

impl SkillLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock of `skill_id`.
    ///
    /// The guarded value is `()`, so a poisoned lock is taken over as is.
    pub fn with_skill<T>(&self, skill_id: i64, f: impl FnOnce() -> T) -> T {
        let handle = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(skill_id).or_default())
        };
        let result = {
            let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(handle);
        if locks
            .get(&skill_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&skill_id);
        }
        result
    }

    /// Number of skills with a writer holding or waiting on their lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Concept and prerequisite writes over a [`PrerequisiteStore`].
#[derive(Debug)]
pub struct ConceptDependencyService<S> {
    store: S,
    locks: SkillLocks,
}

impl<S: PrerequisiteStore> ConceptDependencyService<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: SkillLocks::new(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and store a new concept for an existing skill.
    pub fn add_concept(&self, request: &NewConcept) -> Result<Concept, PathwiseError> {
        self.locks.with_skill(request.skill_id, || {
            let snapshot = self.load(request.skill_id)?;
            let concept = validate_new_concept(&snapshot, request)?;
            let stored = self.store.insert_concept(concept)?;
            tracing::debug!(
                skill_id = stored.skill_id,
                concept_id = stored.concept_id,
                "concept added"
            );
            Ok(stored)
        })
    }

    /// Concepts of a skill ordered by id.
    pub fn concepts(&self, skill_id: i64) -> Result<Vec<Concept>, PathwiseError> {
        let snapshot = self.load(skill_id)?;
        Ok(snapshot.own_concepts().into_iter().cloned().collect())
    }

    /// Validate a prerequisite edge and store it if it is new.
    ///
    /// The snapshot is read under the skill's lock, so the acyclic check and
    /// the insert see the same stored edges.
    pub fn add_prerequisite(
        &self,
        request: &NewPrerequisite,
    ) -> Result<PrerequisitePlan, PathwiseError> {
        request.validate()?;

        self.locks.with_skill(request.skill_id, || {
            let mut snapshot = self.load(request.skill_id)?;

            // Concepts of other skills are fetched so a mismatch is reported
            // as such instead of as a missing concept.
            for concept_id in [request.concept_id, request.prerequisite_id] {
                if snapshot.concept(concept_id).is_some() {
                    continue;
                }
                if let Some(concept) = self.store.concept(concept_id)? {
                    snapshot.concepts.push(concept);
                }
            }

            let plan = plan_prerequisite(&snapshot, request)?;
            match plan {
                PrerequisitePlan::Insert(row) => {
                    self.store.insert_prerequisite(row)?;
                    tracing::debug!(
                        skill_id = row.skill_id,
                        from = row.prerequisite_id,
                        to = row.concept_id,
                        "prerequisite added"
                    );
                }
                PrerequisitePlan::AlreadyPresent => {
                    tracing::debug!(
                        skill_id = request.skill_id,
                        from = request.prerequisite_id,
                        to = request.concept_id,
                        "prerequisite already present"
                    );
                }
            }
            Ok(plan)
        })
    }

    /// Graph view of a skill with its topological order.
    pub fn skill_graph(&self, skill_id: i64) -> Result<SkillGraph, PathwiseError> {
        skill_graph_view(&self.load(skill_id)?)
    }

    fn load(&self, skill_id: i64) -> Result<SkillSnapshot, PathwiseError> {
        self.store
            .snapshot(skill_id)?
            .ok_or(PathwiseError::SkillNotFound(skill_id))
    }
}

// =============================================================================
// TESTS
// =============================================================================
