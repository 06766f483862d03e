//! The workflow IR: the flat state-machine graph that gets serialized to the
//! cloud workflow's JSON. States reference each other by name, never by
//! pointer — a back-edge (a loop) is just two states whose `next` fields
//! point at each other, no special cycle handling required, which a linked
//! object graph couldn't express without `Rc`/`RefCell`.

use cohesion_dsl::TextRange;
use enum_debug::EnumDebug;
use serde::{Deserialize, Serialize};
use specifications::{CatchRule, RetryRule};

use crate::state::Position;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(rename = "Variable")]
    pub variable: String,
    #[serde(rename = "BooleanEquals")]
    pub boolean_equals: bool,
    #[serde(rename = "Next")]
    pub next: String,
}

#[derive(Clone, Debug, EnumDebug)]
pub enum StateKind {
    /// A task invoking an activity (or any non-Lambda resource).
    Task,
    /// A task specialization that always invokes a Lambda function.
    Lambda,
    /// A `Wait` state driven by a path into `env` rather than a literal.
    Sleep,
    Choice,
    Pass,
    /// A `Pass` whose `next` is pinned to a loop's break target and can
    /// never be retargeted by ordinary sequencing.
    Break,
    /// A placeholder `Pass` inserted to simplify edge-wiring during
    /// construction; removed by pass elimination once every real edge is in
    /// place.
    RemovablePass,
}

#[derive(Clone, Debug)]
pub struct State {
    pub name: String,
    pub kind: StateKind,
    pub comment: String,
    pub next: Option<String>,
    pub end: bool,
    pub layout: Option<Position>,
    pub range: TextRange,

    // Task/Lambda/Sleep-only fields; unused (left default) on other kinds.
    pub resource: String,
    pub input_path: String,
    pub parameters: Option<serde_json::Map<String, serde_json::Value>>,
    pub result_path: String,
    pub output_path: String,
    pub seconds_path: String,
    pub timeout_sec: Option<i64>,
    pub heartbeat_sec: Option<i64>,
    pub retry: Vec<RetryRule>,
    pub catch: Vec<CatchRule>,

    // Choice-only fields.
    pub choices: Vec<Choice>,
    pub default: String,
}

impl State {
    pub fn new(name: impl Into<String>, kind: StateKind, range: TextRange) -> Self {
        Self {
            name: name.into(),
            kind,
            comment: String::new(),
            next: None,
            end: false,
            layout: None,
            range,
            resource: String::new(),
            input_path: "$".to_string(),
            parameters: None,
            result_path: "$".to_string(),
            output_path: "$".to_string(),
            seconds_path: String::new(),
            timeout_sec: None,
            heartbeat_sec: None,
            retry: Vec::new(),
            catch: Vec::new(),
            choices: Vec::new(),
            default: String::new(),
        }
    }

    /// Sets `next` and clears `end`, matching `State.set_next` in
    /// `asfast.py` (a `Break` state overrides this to be a no-op).
    pub fn set_next(&mut self, next: impl Into<String>) {
        if matches!(self.kind, StateKind::Break) {
            return;
        }
        self.next = Some(next.into());
        self.end = false;
    }

    pub fn set_end(&mut self, end: bool) {
        if matches!(self.kind, StateKind::Break) {
            return;
        }
        self.end = end;
    }
}

#[derive(Clone, Debug, Default)]
pub struct Workflow {
    pub name: String,
    pub start_state: String,
    pub states: Vec<State>,
    pub timeout_sec: Option<i64>,
}

impl Workflow {
    /// Checks the graph-level invariants every finished workflow must
    /// satisfy: `start_state` exists, no state has both `next` and `end`,
    /// and every edge target resolves to a real state name.
    pub fn validate(&self) -> Result<(), crate::errors::CompileError> {
        let names: std::collections::HashSet<&str> = self.states.iter().map(|s| s.name.as_str()).collect();

        if !names.contains(self.start_state.as_str()) {
            return Err(crate::errors::CompileError::EdgeTargetMissing {
                workflow: self.name.clone(),
                state: "<start>".to_string(),
                target: self.start_state.clone(),
            });
        }

        for s in &self.states {
            if let Some(next) = &s.next {
                if s.end {
                    return Err(crate::errors::CompileError::InternalInvariant {
                        message: format!("state '{}' in workflow '{}' has both next and end set", s.name, self.name),
                    });
                }
                if !names.contains(next.as_str()) {
                    return Err(crate::errors::CompileError::EdgeTargetMissing { workflow: self.name.clone(), state: s.name.clone(), target: next.clone() });
                }
            }
            if matches!(s.kind, StateKind::Choice) {
                for choice in &s.choices {
                    if !names.contains(choice.next.as_str()) {
                        return Err(crate::errors::CompileError::EdgeTargetMissing { workflow: self.name.clone(), state: s.name.clone(), target: choice.next.clone() });
                    }
                }
                if !names.contains(s.default.as_str()) {
                    return Err(crate::errors::CompileError::EdgeTargetMissing { workflow: self.name.clone(), state: s.name.clone(), target: s.default.clone() });
                }
            }
            for catcher in &s.catch {
                if !names.contains(catcher.next.as_str()) {
                    return Err(crate::errors::CompileError::EdgeTargetMissing { workflow: self.name.clone(), state: s.name.clone(), target: catcher.next.clone() });
                }
            }
        }
        Ok(())
    }
}
