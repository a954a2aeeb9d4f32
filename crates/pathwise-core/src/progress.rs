//! # Progress Graph Assembler
//!
//! Builds one heterogeneous graph per progress request:
//!
//! ```text
//!            ┌──────────► metric (x3)
//!   user ────┤
//!            └──────────► skill ─────► course
//! ```
//!
//! Node kinds share one id space through a dense handle allocation keyed by
//! [`NodeKind`], so user 7, skill 7 and course 7 never collide.
//!
//! Levels are BFS distances from the user node. The summary is one DFS from
//! the user node; metric node values are filled from it afterwards.

use crate::NodeId;
use crate::graph::DirectedGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// NODE KINDS
// =============================================================================

/// Aggregate metrics shown as their own nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CoursesCompleted,
    VideosWatched,
    SkillsLearned,
}

impl Metric {
    /// All metrics in display order.
    pub const ALL: [Self; 3] = [
        Self::CoursesCompleted,
        Self::VideosWatched,
        Self::SkillsLearned,
    ];

    /// Display label of the metric node.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CoursesCompleted => "Total Courses Done",
            Self::VideosWatched => "Total Videos Watched",
            Self::SkillsLearned => "Total Skills Learned",
        }
    }
}

/// The entity a progress node stands for, keyed by its natural id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "key", rename_all = "snake_case")]
pub enum NodeKind {
    User(i64),
    Metric(Metric),
    Skill(i64),
    Course(i64),
}

impl NodeKind {
    /// Lowercase kind name: `user`, `metric`, `skill` or `course`.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Metric(_) => "metric",
            Self::Skill(_) => "skill",
            Self::Course(_) => "course",
        }
    }
}

// =============================================================================
// INPUT ROWS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub user_id: i64,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRow {
    pub skill_id: i64,
    pub skill_name: String,
}

/// One course of one of the user's learning paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCourseRow {
    pub skill_id: i64,
    pub skill_name: String,
    pub course_id: i64,
    pub course_title: String,
    #[serde(default)]
    pub total_videos: u32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completion_percentage: u8,
}

/// Everything the caller loads for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInput {
    pub user: UserRow,
    #[serde(default)]
    pub path_courses: Vec<PathCourseRow>,
    /// Skills the user was assessed on, with or without a learning path.
    #[serde(default)]
    pub assessed_skills: Vec<SkillRow>,
    /// Skills with an explicit completion record.
    #[serde(default)]
    pub completed_skill_ids: Vec<i64>,
    /// Watched video count per course id.
    #[serde(default)]
    pub watched_by_course: BTreeMap<i64, u32>,
}

// =============================================================================
// OUTPUT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub courses_completed: u64,
    pub videos_watched: u64,
    pub skills_learned: u64,
}

impl ProgressSummary {
    fn metric(&self, metric: Metric) -> u64 {
        match metric {
            Metric::CoursesCompleted => self.courses_completed,
            Metric::VideosWatched => self.videos_watched,
            Metric::SkillsLearned => self.skills_learned,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressNode {
    pub id: i64,
    pub kind: NodeKind,
    pub label: String,
    /// BFS distance from the user node; 0 for unreached nodes.
    pub level: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_percentage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_videos: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_videos: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEdge {
    pub from: i64,
    pub to: i64,
}

/// Derived view of a user's progress graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressGraph {
    pub nodes: Vec<ProgressNode>,
    pub edges: Vec<ProgressEdge>,
    pub summary: ProgressSummary,
}

impl ProgressGraph {
    /// Assemble the graph for one user and derive levels and summary.
    #[must_use]
    pub fn build(input: &ProgressInput) -> Self {
        let mut assembler = Assembler::default();

        let user_name = input.user.display_name.as_deref().unwrap_or("Student");
        let user = assembler.node(
            NodeKind::User(input.user.user_id),
            format!("User: {user_name}"),
        );

        for metric in Metric::ALL {
            let id = assembler.node(NodeKind::Metric(metric), metric.label());
            assembler.link(user, id);
        }

        // Paths first, then assessments; a name from an assessment wins.
        let mut skill_order = Vec::new();
        let mut skill_names = BTreeMap::new();
        for skill in &input.assessed_skills {
            skill_names.insert(skill.skill_id, skill.skill_name.as_str());
        }
        let path_skills = input.path_courses.iter().map(|row| row.skill_id);
        let assessed = input.assessed_skills.iter().map(|skill| skill.skill_id);
        for skill_id in path_skills.chain(assessed) {
            if !skill_order.contains(&skill_id) {
                skill_order.push(skill_id);
            }
        }
        for row in &input.path_courses {
            skill_names.entry(row.skill_id).or_insert(row.skill_name.as_str());
        }

        let completed_skills: BTreeSet<i64> = input.completed_skill_ids.iter().copied().collect();
        for skill_id in skill_order {
            let label = skill_names.get(&skill_id).map_or_else(
                || format!("Skill: Skill {skill_id}"),
                |name| format!("Skill: {name}"),
            );
            let id = assembler.node(NodeKind::Skill(skill_id), label);
            assembler.meta_mut(id).completed = Some(completed_skills.contains(&skill_id));
            assembler.link(user, id);
        }

        for row in &input.path_courses {
            let id = assembler.node(
                NodeKind::Course(row.course_id),
                format!("Course: {}", row.course_title),
            );
            let meta = assembler.meta_mut(id);
            meta.completed = Some(row.is_completed);
            meta.completion_percentage = Some(row.completion_percentage);
            meta.watched_videos = Some(
                input
                    .watched_by_course
                    .get(&row.course_id)
                    .copied()
                    .unwrap_or(0),
            );
            meta.total_videos = Some(row.total_videos);

            let skill = assembler.node(NodeKind::Skill(row.skill_id), "");
            assembler.link(skill, id);
        }

        let levels = assembler.graph.bfs_levels(user);
        let summary = assembler.summarize(user);

        for metric in Metric::ALL {
            if let Some(&id) = assembler.handles.get(&NodeKind::Metric(metric)) {
                assembler.meta_mut(id).value = Some(summary.metric(metric));
            }
        }

        tracing::debug!(
            user_id = input.user.user_id,
            nodes = assembler.graph.node_count(),
            edges = assembler.graph.edge_count(),
            "progress graph assembled"
        );

        assembler.into_view(&levels, summary)
    }
}

// =============================================================================
// ASSEMBLER
// =============================================================================

#[derive(Debug, Clone, Default)]
struct NodeMeta {
    value: Option<u64>,
    completed: Option<bool>,
    completion_percentage: Option<u8>,
    watched_videos: Option<u32>,
    total_videos: Option<u32>,
}

#[derive(Debug, Default)]
struct Assembler {
    graph: DirectedGraph,
    handles: BTreeMap<NodeKind, NodeId>,
    kinds: BTreeMap<NodeId, NodeKind>,
    meta: BTreeMap<NodeId, NodeMeta>,
}

impl Assembler {
    /// Handle for `kind`, allocating the next dense id on first sight.
    fn node(&mut self, kind: NodeKind, label: impl Into<String>) -> NodeId {
        if let Some(&id) = self.handles.get(&kind) {
            return id;
        }
        let id = NodeId(self.handles.len() as i64);
        self.handles.insert(kind, id);
        self.kinds.insert(id, kind);
        self.graph.add_node(id, label);
        id
    }

    fn meta_mut(&mut self, id: NodeId) -> &mut NodeMeta {
        self.meta.entry(id).or_default()
    }

    fn link(&mut self, from: NodeId, to: NodeId) {
        if !self.graph.try_add_edge_acyclic(from, to) {
            tracing::warn!(%from, %to, "progress edge rejected");
        }
    }

    fn is_completed(&self, id: NodeId) -> bool {
        self.meta.get(&id).and_then(|meta| meta.completed) == Some(true)
    }

    /// A skill is learned with an explicit completion record, or when it
    /// has at least one course child and every course child is completed.
    fn is_skill_learned(&self, skill: NodeId) -> bool {
        if self.is_completed(skill) {
            return true;
        }

        let mut has_course = false;
        for child in self.graph.successors(skill) {
            if !matches!(self.kinds.get(&child), Some(NodeKind::Course(_))) {
                continue;
            }
            has_course = true;
            if !self.is_completed(child) {
                return false;
            }
        }

        has_course
    }

    fn summarize(&self, start: NodeId) -> ProgressSummary {
        let mut summary = ProgressSummary::default();
        let mut visited = BTreeSet::new();
        let mut stack = vec![start];
        visited.insert(start);

        while let Some(current) = stack.pop() {
            match self.kinds.get(&current) {
                Some(NodeKind::Course(_)) => {
                    if self.is_completed(current) {
                        summary.courses_completed = summary.courses_completed.saturating_add(1);
                    }
                    let watched = self
                        .meta
                        .get(&current)
                        .and_then(|meta| meta.watched_videos)
                        .unwrap_or(0);
                    summary.videos_watched = summary.videos_watched.saturating_add(u64::from(watched));
                }
                Some(NodeKind::Skill(_)) => {
                    if self.is_skill_learned(current) {
                        summary.skills_learned = summary.skills_learned.saturating_add(1);
                    }
                }
                _ => {}
            }

            for next in self.graph.successors(current) {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }

        summary
    }

    fn into_view(self, levels: &BTreeMap<NodeId, usize>, summary: ProgressSummary) -> ProgressGraph {
        let nodes = self
            .graph
            .nodes()
            .filter_map(|node| {
                let kind = *self.kinds.get(&node.id())?;
                let meta = self.meta.get(&node.id()).cloned().unwrap_or_default();
                Some(ProgressNode {
                    id: node.id().value(),
                    kind,
                    label: node.label().to_string(),
                    level: levels.get(&node.id()).copied().unwrap_or(0),
                    value: meta.value,
                    completed: meta.completed,
                    completion_percentage: meta.completion_percentage,
                    watched_videos: meta.watched_videos,
                    total_videos: meta.total_videos,
                })
            })
            .collect();

        let edges = self
            .graph
            .edges()
            .map(|(from, to)| ProgressEdge {
                from: from.value(),
                to: to.value(),
            })
            .collect();

        ProgressGraph {
            nodes,
            edges,
            summary,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
