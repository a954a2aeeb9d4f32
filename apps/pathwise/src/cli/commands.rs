//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Each command has a `run_*` function that turns parsed input into a
//! serialisable report, and a `cmd_*` wrapper that reads the file and
//! prints the report.

use pathwise_core::primitives::QUESTION_TREE_DEPTH;
use pathwise_core::{
    AssessmentPolicy, AssessmentRun, BinaryQuestionTree, ConceptDependencyService, Course,
    CourseProgress, InMemoryStore, NewPrerequisite, PathwiseError, PrerequisitePlan,
    ProgressGraph, ProgressInput, Question, SkillGraph, SkillSnapshot, active_course,
    build_roadmap, course_completion_percent, order_courses, path_completed,
    skill_completion_percent, skill_graph_view,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE HANDLING
// =============================================================================

/// Maximum input file size (16 MB).
const MAX_INPUT_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Resolve `path` to an existing regular file within the size limit.
fn validate_input_file(path: &Path) -> Result<PathBuf, PathwiseError> {
    let canonical = path.canonicalize().map_err(|e| {
        PathwiseError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| PathwiseError::Io(format!("Cannot read file metadata: {}", e)))?;
    if !metadata.is_file() {
        return Err(PathwiseError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        return Err(PathwiseError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_INPUT_FILE_SIZE
        )));
    }

    Ok(canonical)
}

/// Read and parse a JSON input file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, PathwiseError> {
    let validated = validate_input_file(path)?;
    let contents = std::fs::read(&validated)
        .map_err(|e| PathwiseError::Io(format!("Read file: {}", e)))?;
    serde_json::from_slice(&contents).map_err(|e| {
        PathwiseError::Serialization(format!("Parse '{}': {}", path.display(), e))
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), PathwiseError> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| PathwiseError::Serialization(e.to_string()))?;
    println!("{}", output);
    Ok(())
}

// =============================================================================
// GRAPH COMMAND
// =============================================================================

/// Show a skill's concept graph.
pub fn cmd_graph(input: &Path, json_mode: bool) -> Result<(), PathwiseError> {
    let snapshot: SkillSnapshot = load_json(input)?;
    let view = skill_graph_view(&snapshot)?;

    if json_mode {
        return print_json(&view);
    }

    print_skill_graph(&view);
    Ok(())
}

fn print_skill_graph(view: &SkillGraph) {
    println!("Skill {}: {}", view.skill_id, view.skill_name);
    println!("==================");
    println!("Concepts: {}", view.concepts.len());
    for concept in &view.concepts {
        println!("  [{}] {}", concept.concept_id, concept.name);
    }
    println!();
    println!("Edges: {}", view.edges.len());
    for edge in &view.edges {
        println!("  {} -> {}", edge.from_prerequisite_id, edge.to_concept_id);
    }
    println!();
    let order: Vec<String> = view
        .topological_order
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("Order: {}", order.join(" -> "));
}

// =============================================================================
// LINK COMMAND
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    pub skill_id: i64,
    pub plan: PrerequisitePlan,
    pub written: bool,
}

/// Validate a prerequisite edge through the dependency service.
///
/// Returns the plan and, when the edge is new, the snapshot with the
/// edge appended.
pub fn run_link(
    snapshot: &SkillSnapshot,
    concept_id: i64,
    prerequisite_id: i64,
) -> Result<(PrerequisitePlan, Option<SkillSnapshot>), PathwiseError> {
    let service = ConceptDependencyService::new(InMemoryStore::from_snapshot(snapshot.clone()));
    let plan = service.add_prerequisite(&NewPrerequisite {
        skill_id: snapshot.skill_id,
        concept_id,
        prerequisite_id,
    })?;

    let updated = match plan {
        PrerequisitePlan::Insert(row) => {
            let mut updated = snapshot.clone();
            updated.prerequisites.push(row);
            Some(updated)
        }
        PrerequisitePlan::AlreadyPresent => None,
    };

    Ok((plan, updated))
}

/// Validate (and optionally store) a prerequisite edge.
pub fn cmd_link(
    input: &Path,
    json_mode: bool,
    concept_id: i64,
    prerequisite_id: i64,
    write: bool,
) -> Result<(), PathwiseError> {
    let snapshot: SkillSnapshot = load_json(input)?;
    let (plan, updated) = run_link(&snapshot, concept_id, prerequisite_id)?;

    let written = match updated {
        Some(updated) if write => {
            let contents = serde_json::to_string_pretty(&updated)
                .map_err(|e| PathwiseError::Serialization(e.to_string()))?;
            std::fs::write(input, contents)
                .map_err(|e| PathwiseError::Io(format!("Write file: {}", e)))?;
            tracing::info!(path = %input.display(), "prerequisite written");
            true
        }
        _ => false,
    };

    let report = LinkReport {
        skill_id: snapshot.skill_id,
        plan,
        written,
    };

    if json_mode {
        return print_json(&report);
    }

    match report.plan {
        PrerequisitePlan::Insert(row) => {
            println!(
                "Accepted: {} -> {} (skill {})",
                row.prerequisite_id, row.concept_id, row.skill_id
            );
            if report.written {
                println!("Written to {}", input.display());
            }
        }
        PrerequisitePlan::AlreadyPresent => {
            println!("Already present: {} -> {}", prerequisite_id, concept_id);
        }
    }
    Ok(())
}

// =============================================================================
// ROADMAP COMMAND
// =============================================================================

/// Courses of one learning path plus watched video counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapInput {
    pub courses: Vec<Course>,
    /// Distinct watched videos per course id.
    #[serde(default)]
    pub watched: BTreeMap<i64, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoadmapReport {
    pub roadmap: Vec<i64>,
    pub courses: Vec<Course>,
    pub progress: Vec<CourseProgress>,
    pub skill_percent: u8,
    pub active_course: Option<i64>,
    pub path_completed: bool,
}

#[must_use]
pub fn run_roadmap(input: RoadmapInput) -> RoadmapReport {
    let ordered = order_courses(input.courses);
    let roadmap = build_roadmap(&ordered);

    let mut by_id: BTreeMap<i64, &Course> = BTreeMap::new();
    for course in &ordered {
        by_id.entry(course.course_id).or_insert(course);
    }

    let progress: Vec<CourseProgress> = roadmap
        .iter()
        .map(|&course_id| {
            let total_videos = by_id.get(&course_id).map_or(0, |course| course.total_videos);
            let watched = input.watched.get(&course_id).copied().unwrap_or(0);
            CourseProgress {
                course_id,
                percent: course_completion_percent(watched, total_videos),
            }
        })
        .collect();

    let percents: Vec<u8> = progress.iter().map(|course| course.percent).collect();

    RoadmapReport {
        skill_percent: skill_completion_percent(&percents),
        active_course: active_course(&progress),
        path_completed: path_completed(&progress),
        roadmap,
        progress,
        courses: ordered,
    }
}

/// Order courses and build the roadmap.
pub fn cmd_roadmap(input: &Path, json_mode: bool) -> Result<(), PathwiseError> {
    let report = run_roadmap(load_json(input)?);

    if json_mode {
        return print_json(&report);
    }

    println!("Roadmap");
    println!("=======");
    for (step, progress) in report.progress.iter().enumerate() {
        let title = report
            .courses
            .iter()
            .find(|course| course.course_id == progress.course_id)
            .map_or("", |course| course.title.as_str());
        let marker = if Some(progress.course_id) == report.active_course {
            ">"
        } else {
            " "
        };
        println!(
            "{} {:>2}. [{}] {} ({}%)",
            marker,
            step + 1,
            progress.course_id,
            title,
            progress.percent
        );
    }
    println!();
    println!("Skill completion: {}%", report.skill_percent);
    if report.path_completed {
        println!("Path completed");
    }
    Ok(())
}

// =============================================================================
// PROGRESS COMMAND
// =============================================================================

/// Build a user's progress graph.
pub fn cmd_progress(input: &Path, json_mode: bool) -> Result<(), PathwiseError> {
    let input: ProgressInput = load_json(input)?;
    let graph = ProgressGraph::build(&input);

    if json_mode {
        return print_json(&graph);
    }

    println!("Progress Graph");
    println!("==============");
    println!("Courses completed: {}", graph.summary.courses_completed);
    println!("Videos watched:    {}", graph.summary.videos_watched);
    println!("Skills learned:    {}", graph.summary.skills_learned);
    println!();

    let max_level = graph.nodes.iter().map(|node| node.level).max().unwrap_or(0);
    for level in 0..=max_level {
        println!("Level {}:", level);
        for node in graph.nodes.iter().filter(|node| node.level == level) {
            let state = match node.completed {
                Some(true) => " [done]",
                _ => "",
            };
            println!("  ({}) {}{}", node.kind.type_name(), node.label, state);
        }
    }
    Ok(())
}

// =============================================================================
// ASSESS COMMAND
// =============================================================================

/// Build the tree for a bank and replay `answers` from its root.
pub fn run_assess<S: AsRef<str>>(
    questions: Vec<Question>,
    answers: &[S],
    policy: AssessmentPolicy,
) -> Result<AssessmentRun, PathwiseError> {
    let tree = BinaryQuestionTree::complete(questions)?;
    policy.run(&tree, answers)
}

/// Replay answers through a question tree.
pub fn cmd_assess(
    input: &Path,
    json_mode: bool,
    answers: &[String],
    policy: AssessmentPolicy,
) -> Result<(), PathwiseError> {
    let run = run_assess(load_json(input)?, answers, policy)?;

    if json_mode {
        return print_json(&run);
    }

    let visited: Vec<String> = run.visited.iter().map(ToString::to_string).collect();
    println!("Assessment");
    println!("==========");
    println!("Path:    {}", visited.join(" -> "));
    println!("Correct: {} / {}", run.correct_count, run.total_count);
    match run.level {
        Some(level) => println!("Level:   {}", level),
        None => println!(
            "Level:   pending ({} of {} answers)",
            run.total_count, policy.questions_to_ask
        ),
    }
    Ok(())
}

// =============================================================================
// CHECK-QUESTIONS COMMAND
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionBankReport {
    pub questions: usize,
    pub depth: u32,
    pub skill_id: i64,
}

pub fn run_check_questions(questions: Vec<Question>) -> Result<QuestionBankReport, PathwiseError> {
    let tree = BinaryQuestionTree::complete(questions)?;
    let skill_id = tree
        .root()
        .map(|question| question.skill_id)
        .ok_or(PathwiseError::QuestionNotFound(0))?;
    Ok(QuestionBankReport {
        questions: tree.len(),
        depth: QUESTION_TREE_DEPTH,
        skill_id,
    })
}

/// Check that a question bank forms a complete tree.
pub fn cmd_check_questions(input: &Path, json_mode: bool) -> Result<(), PathwiseError> {
    let report = run_check_questions(load_json(input)?)?;

    if json_mode {
        return print_json(&report);
    }

    println!(
        "Question bank OK: skill {}, {} questions, depth {}",
        report.skill_id, report.questions, report.depth
    );
    Ok(())
}
