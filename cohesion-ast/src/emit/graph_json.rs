//! Visualization graph emitter: a node/edge view of a compiled workflow,
//! separate from the Step Functions JSON itself, meant for rendering.

use std::collections::HashMap;

use serde::Serialize;

use crate::wir::{StateKind, Workflow};

#[derive(Clone, Debug, Serialize)]
pub struct SrcMap {
    pub loc: [usize; 2],
    #[serde(rename = "locEnd", skip_serializing_if = "Option::is_none")]
    pub loc_end: Option<[usize; 2]>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Node {
    pub row: usize,
    pub column: usize,
    pub srcmap: SrcMap,
}

#[derive(Clone, Debug, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Graph {
    pub nodes: HashMap<String, Node>,
    pub edges: Vec<Edge>,
}

/// Builds the visualization graph for one workflow. Called before pass
/// elimination strips layout rows to a dense grid isn't required — layout is
/// advisory, so the graph reflects whatever cursor state the state carried
/// when the WIR builder emitted it.
pub fn build(workflow: &Workflow) -> Graph {
    let mut nodes = HashMap::with_capacity(workflow.states.len());
    let mut edges = Vec::new();

    for state in &workflow.states {
        let pos = state.layout.unwrap_or_default();
        nodes.insert(
            state.name.clone(),
            Node {
                row: pos.row,
                column: pos.column,
                srcmap: SrcMap {
                    loc: [state.range.start.line, state.range.start.col],
                    loc_end: Some([state.range.end.line, state.range.end.col]),
                },
            },
        );

        if let Some(next) = &state.next {
            edges.push(Edge { from: state.name.clone(), to: next.clone(), edge_type: None });
        }

        if matches!(state.kind, StateKind::Choice) {
            for choice in &state.choices {
                edges.push(Edge { from: state.name.clone(), to: choice.next.clone(), edge_type: None });
            }
            edges.push(Edge { from: state.name.clone(), to: state.default.clone(), edge_type: None });
        }

        for catcher in &state.catch {
            edges.push(Edge { from: state.name.clone(), to: catcher.next.clone(), edge_type: Some("catch".to_string()) });
        }
    }

    Graph { nodes, edges }
}
