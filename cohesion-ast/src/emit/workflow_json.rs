//! Workflow JSON emitter: renders a compiled workflow as Amazon States
//! Language JSON. Key-omission rules are encoded as custom `Serialize`
//! impls rather than assembled by hand into a `serde_json::Value`.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::wir::{State, StateKind, Workflow};

impl Serialize for Workflow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("StartAt", &self.start_state)?;
        if let Some(timeout) = self.timeout_sec {
            map.serialize_entry("TimeoutSeconds", &timeout)?;
        }
        let states: HashMap<&str, &State> = self.states.iter().map(|s| (s.name.as_str(), s)).collect();
        map.serialize_entry("States", &states)?;
        map.end()
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("Type", type_name(&self.kind))?;
        if !self.comment.is_empty() {
            map.serialize_entry("Comment", &self.comment)?;
        }

        match self.kind {
            StateKind::Task | StateKind::Lambda => {
                map.serialize_entry("Resource", &self.resource)?;
                if !self.input_path.is_empty() && self.input_path != "$" {
                    map.serialize_entry("InputPath", &self.input_path)?;
                }
                if let Some(parameters) = &self.parameters {
                    map.serialize_entry("Parameters", parameters)?;
                }
                map.serialize_entry("OutputPath", &self.output_path)?;
                map.serialize_entry("ResultPath", &self.result_path)?;
                if let Some(timeout) = self.timeout_sec {
                    map.serialize_entry("TimeoutSeconds", &timeout)?;
                }
                if let Some(heartbeat) = self.heartbeat_sec {
                    map.serialize_entry("HeartbeatSeconds", &heartbeat)?;
                }
                if !self.retry.is_empty() {
                    map.serialize_entry("Retry", &self.retry)?;
                }
                if !self.catch.is_empty() {
                    map.serialize_entry("Catch", &self.catch)?;
                }
                serialize_next_or_end(&mut map, self)?;
            }
            StateKind::Sleep => {
                map.serialize_entry("SecondsPath", &self.seconds_path)?;
                serialize_next_or_end(&mut map, self)?;
            }
            StateKind::Choice => {
                map.serialize_entry("Choices", &self.choices)?;
                map.serialize_entry("Default", &self.default)?;
            }
            StateKind::Pass | StateKind::Break | StateKind::RemovablePass => {
                if !self.input_path.is_empty() && self.input_path != "$" {
                    map.serialize_entry("InputPath", &self.input_path)?;
                }
                if let Some(parameters) = &self.parameters {
                    map.serialize_entry("Parameters", parameters)?;
                }
                if !self.output_path.is_empty() && self.output_path != "$" {
                    map.serialize_entry("OutputPath", &self.output_path)?;
                }
                serialize_next_or_end(&mut map, self)?;
            }
        }

        map.end()
    }
}

fn type_name(kind: &StateKind) -> &'static str {
    match kind {
        StateKind::Task | StateKind::Lambda => "Task",
        StateKind::Sleep => "Wait",
        StateKind::Choice => "Choice",
        StateKind::Pass | StateKind::Break | StateKind::RemovablePass => "Pass",
    }
}

fn serialize_next_or_end<M: SerializeMap>(map: &mut M, state: &State) -> Result<(), M::Error> {
    if let Some(next) = &state.next {
        map.serialize_entry("Next", next)?;
    }
    if state.end {
        map.serialize_entry("End", &true)?;
    }
    Ok(())
}
