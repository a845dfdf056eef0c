use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::GraphError;
use crate::model::{EdgeStyle, NodeKind, NodeSpec};
use crate::store::GraphStore;

/// Hierarchical analysis produced upstream: problem, hypothesis, pillars.
///
/// Accepts both the camelCase field names and the snake_case names emitted by
/// the analysis service (`core_problem`, `analysis_pillars`, `metrics`,
/// `initiatives`, ...). Required strings are optional here so that a missing
/// field is reported with its path instead of a bare serde message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, alias = "diagram_title", alias = "diagramTitle")]
    pub title: Option<String>,
    #[serde(default, alias = "core_problem")]
    pub root_problem: Option<String>,
    #[serde(default)]
    pub hypothesis: Option<String>,
    #[serde(default, alias = "analysis_pillars")]
    pub pillars: Vec<Pillar>,
    #[serde(default, alias = "implementation_risks")]
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pillar {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default, alias = "metrics")]
    pub evidence: Vec<String>,
    #[serde(default, alias = "key_findings")]
    pub key_findings: Vec<String>,
    #[serde(default, alias = "initiatives")]
    pub solutions: Vec<SolutionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SolutionItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl AnalysisResult {
    pub fn from_json(input: &str) -> Result<Self, GraphError> {
        serde_json::from_str(input).map_err(|err| GraphError::malformed("$", err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Attach `implementation_risks` as risk nodes under the hypothesis.
    pub include_risks: bool,
    /// Keep at most this many evidence items per pillar.
    pub max_evidence_per_pillar: Option<usize>,
}

struct TreePlan<'a> {
    root_problem: &'a str,
    hypothesis: &'a str,
    pillars: Vec<PillarPlan<'a>>,
}

struct PillarPlan<'a> {
    category: &'a str,
    goal: &'a str,
    evidence: &'a [String],
    solutions: Vec<SolutionPlan<'a>>,
}

struct SolutionPlan<'a> {
    title: &'a str,
    description: &'a str,
    impact: Option<&'a str>,
}

/// Expands an analysis result into a tree-shaped graph.
///
/// Nodes are allocated depth-first (problem, hypothesis, then each pillar
/// followed by its evidence and solutions), so identical input always yields
/// identical ids. Input is validated up front; on error nothing is built.
pub fn build_graph(
    result: &AnalysisResult,
    options: &BuildOptions,
) -> Result<GraphStore, GraphError> {
    let plan = plan_tree(result)?;
    let mut store = GraphStore::new();

    let problem = store.add_node(
        NodeSpec::new(NodeKind::Problem, "Core Problem").with_content(plan.root_problem),
    );
    let hypothesis = store.add_node(
        NodeSpec::new(NodeKind::Hypothesis, "Hypothesis").with_content(plan.hypothesis),
    );
    store.add_edge(problem, hypothesis)?;

    for pillar in &plan.pillars {
        let pillar_id = store
            .add_node(NodeSpec::new(NodeKind::Pillar, pillar.category).with_content(pillar.goal));
        store.add_edge(hypothesis, pillar_id)?;

        let keep = options
            .max_evidence_per_pillar
            .map_or(pillar.evidence.len(), |cap| cap.min(pillar.evidence.len()));
        for item in &pillar.evidence[..keep] {
            let evidence = store.add_node(
                NodeSpec::new(NodeKind::Evidence, "Evidence").with_content(item.as_str()),
            );
            store.add_edge(pillar_id, evidence)?;
        }

        for solution in &pillar.solutions {
            let spec = NodeSpec::new(NodeKind::Solution, "Solution")
                .with_content(format!("{}: {}", solution.title, solution.description))
                .with_sub_content(solution.impact.map(str::to_string));
            let solution_id = store.add_node(spec);
            store.add_edge_styled(pillar_id, solution_id, EdgeStyle::Dashed)?;
        }
    }

    if options.include_risks {
        for risk in &result.risks {
            let risk_id =
                store.add_node(NodeSpec::new(NodeKind::Risk, "Risk").with_content(risk.as_str()));
            store.add_edge(hypothesis, risk_id)?;
        }
    }

    debug!(
        nodes = store.node_count(),
        edges = store.edge_count(),
        "analysis graph built"
    );
    Ok(store)
}

fn plan_tree(result: &AnalysisResult) -> Result<TreePlan<'_>, GraphError> {
    let root_problem = required(&result.root_problem, || "rootProblem".to_string())?;
    let hypothesis = required(&result.hypothesis, || "hypothesis".to_string())?;

    let mut pillars = Vec::with_capacity(result.pillars.len());
    for (index, pillar) in result.pillars.iter().enumerate() {
        let category = required(&pillar.category, || format!("pillars[{index}].category"))?;
        let goal = required(&pillar.goal, || format!("pillars[{index}].goal"))?;
        let mut solutions = Vec::with_capacity(pillar.solutions.len());
        for (sol_index, solution) in pillar.solutions.iter().enumerate() {
            solutions.push(SolutionPlan {
                title: required(&solution.title, || {
                    format!("pillars[{index}].solutions[{sol_index}].title")
                })?,
                description: required(&solution.description, || {
                    format!("pillars[{index}].solutions[{sol_index}].description")
                })?,
                impact: solution.impact.as_deref(),
            });
        }
        pillars.push(PillarPlan {
            category,
            goal,
            evidence: &pillar.evidence,
            solutions,
        });
    }

    Ok(TreePlan {
        root_problem,
        hypothesis,
        pillars,
    })
}

fn required<'a>(
    value: &'a Option<String>,
    field: impl FnOnce() -> String,
) -> Result<&'a str, GraphError> {
    value
        .as_deref()
        .ok_or_else(|| GraphError::malformed(field(), "required field is missing"))
}
