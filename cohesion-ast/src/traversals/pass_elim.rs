//! Pass elimination: `RemovablePass` states exist only to simplify wiring
//! during WIR construction and are spliced back out once the graph is
//! complete.

use crate::aggregate::Aggregate;
use crate::errors::CompileError;
use crate::wir::{StateKind, Workflow};

pub fn eliminate(agg: &mut Aggregate) -> Result<(), CompileError> {
    for workflow in &mut agg.workflows {
        eliminate_workflow(workflow)?;
    }
    Ok(())
}

fn eliminate_workflow(wf: &mut Workflow) -> Result<(), CompileError> {
    let candidates: Vec<(String, Option<String>)> = wf
        .states
        .iter()
        .filter(|s| matches!(s.kind, StateKind::RemovablePass))
        .map(|s| (s.name.clone(), s.next.clone()))
        .collect();

    let mut removed_names = Vec::new();
    let mut removed_rows = Vec::new();

    for (name, next) in candidates {
        let success = remove_state_refs(wf, &name, next.as_deref());
        if !success {
            return Err(CompileError::PlaceholderElisionFailure { workflow: wf.name.clone(), state: name });
        }
        if let Some(pos) = wf.states.iter().find(|s| s.name == name).and_then(|s| s.layout) {
            removed_rows.push(pos.row);
        }
        removed_names.push(name);
    }

    if removed_names.is_empty() {
        return Ok(());
    }

    wf.states.retain(|s| !removed_names.contains(&s.name));

    // Fix layout: a removed state's row may now be empty, in which case
    // every state below it shifts up one row. Process deepest row first so
    // earlier shifts don't invalidate later comparisons.
    removed_rows.sort_unstable_by(|a, b| b.cmp(a));
    removed_rows.dedup();
    for row in removed_rows {
        let row_occupied = wf.states.iter().any(|s| s.layout.is_some_and(|p| p.row == row));
        if row_occupied {
            continue;
        }
        for s in wf.states.iter_mut() {
            if let Some(pos) = s.layout.as_mut() {
                if pos.row > row {
                    pos.row -= 1;
                }
            }
        }
    }

    Ok(())
}

/// Repoints every edge into `state_name` at `replacement`. With no
/// replacement (the placeholder had no successor of its own — e.g. a loop
/// whose exit is the function's last state), a `next`-style edge just
/// terminates there instead, same as if that state had been written with
/// `end=true` directly; this applies to a `Break`'s `next` exactly like any
/// other state's, since a break out of a loop that was already the last
/// thing in the function is itself the workflow's last step (e.g.
/// `while True: break` with nothing after it compiles to a workflow whose
/// control flow exits on the first iteration). Only a `Choice` arm can't
/// absorb a missing replacement — `Default`/`Choices[].Next` are mandatory
/// fields with no
/// terminal form — so that case alone fails elimination, matching
/// `remove_state_refs`'s `failed` return.
fn remove_state_refs(wf: &mut Workflow, state_name: &str, replacement: Option<&str>) -> bool {
    let mut failed = false;
    for s in wf.states.iter_mut() {
        if s.next.as_deref() == Some(state_name) {
            match replacement {
                Some(r) => {
                    s.next = Some(r.to_string());
                    s.end = false;
                }
                None => {
                    s.next = None;
                    s.end = true;
                }
            }
        }
        if matches!(s.kind, StateKind::Choice) {
            for choice in s.choices.iter_mut() {
                if choice.next == state_name {
                    match replacement {
                        Some(r) => choice.next = r.to_string(),
                        None => failed = true,
                    }
                }
            }
            if s.default == state_name {
                match replacement {
                    Some(r) => s.default = r.to_string(),
                    None => failed = true,
                }
            }
        }
    }
    !failed
}

#[cfg(test)]
mod tests {
    use cohesion_dsl::TextRange;

    use super::*;
    use crate::wir::State;

    fn workflow(states: Vec<State>) -> Workflow {
        Workflow { name: "wf".to_string(), start_state: states[0].name.clone(), states, timeout_sec: None }
    }

    #[test]
    fn placeholder_in_the_middle_is_spliced_out() {
        let mut a = State::new("a", StateKind::Pass, TextRange::default());
        a.set_next("mid");
        let mut mid = State::new("mid", StateKind::RemovablePass, TextRange::default());
        mid.set_next("b");
        let mut b = State::new("b", StateKind::Pass, TextRange::default());
        b.set_end(true);

        let mut wf = workflow(vec![a, mid, b]);
        eliminate_workflow(&mut wf).unwrap();

        assert_eq!(wf.states.len(), 2);
        assert_eq!(wf.states[0].next.as_deref(), Some("b"));
    }

    #[test]
    fn dangling_break_becomes_terminal_not_an_error() {
        // A `while True: break` with nothing after it: the break's target is
        // a placeholder with no successor of its own.
        let mut brk = State::new("brk", StateKind::Break, TextRange::default());
        brk.next = Some("placeholder".to_string());
        let placeholder = State::new("placeholder", StateKind::RemovablePass, TextRange::default());

        let mut wf = workflow(vec![brk, placeholder]);
        eliminate_workflow(&mut wf).unwrap();

        assert_eq!(wf.states.len(), 1);
        assert!(wf.states[0].end);
        assert!(wf.states[0].next.is_none());
    }

    #[test]
    fn dangling_choice_arm_fails_elimination() {
        let mut choice = State::new("c", StateKind::Choice, TextRange::default());
        choice.default = "placeholder".to_string();
        let placeholder = State::new("placeholder", StateKind::RemovablePass, TextRange::default());

        let mut wf = workflow(vec![choice, placeholder]);
        let err = eliminate_workflow(&mut wf).unwrap_err();
        assert!(matches!(err, CompileError::PlaceholderElisionFailure { .. }));
    }
}
