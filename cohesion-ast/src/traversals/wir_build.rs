//! WIR builder: the one pass that turns a tree (CIR) into a flat graph
//! (WIR). Every node produces a `Vec<State>` with a known first and last
//! state, and the caller wires sequencing by name.

use cohesion_dsl::TextRange;
use specifications::{CatchRule, Config, ResourceNamer};

use crate::aggregate::Aggregate;
use crate::cir::{Cir, CirHandler};
use crate::errors::CompileError;
use crate::state::{BuilderState, HandlerRef, NameTable, Position, StateNameTable};
use crate::wir::{Choice, State, StateKind, Workflow};

pub fn build(cir: &Cir, config: &Config, names: &mut NameTable, state_names: &mut StateNameTable, agg: &mut Aggregate) -> Result<Vec<Workflow>, CompileError> {
    let arn = ResourceNamer::new(config.region.clone(), config.account_id.clone());

    let router_func = if config.use_router_func && !agg.helpers.is_empty() {
        let name = names.fresh("router");
        agg.router_func = Some(name.clone());
        Some(name)
    } else {
        None
    };

    let Cir::Module { defs } = cir else {
        return Err(CompileError::InternalInvariant { message: "expected a CIR module at the workflow builder root".to_string() });
    };

    let mut workflows = Vec::new();
    for def in defs {
        let Cir::FunctionDef { name, params, body, range } = def else {
            return Err(CompileError::InternalInvariant { message: "expected only function definitions at the CIR module's top level".to_string() });
        };
        let mut builder = FunctionBuilder { arn: &arn, router_func: router_func.as_deref(), state_names, bs: BuilderState::default() };
        let workflow = builder.build_workflow(name, params, body, *range)?;
        workflow.validate()?;
        workflows.push(workflow);
    }
    Ok(workflows)
}

struct FunctionBuilder<'a> {
    arn: &'a ResourceNamer,
    router_func: Option<&'a str>,
    state_names: &'a mut StateNameTable,
    bs: BuilderState,
}

impl<'a> FunctionBuilder<'a> {
    fn build_workflow(&mut self, name: &str, params: &[String], body: &[Cir], range: TextRange) -> Result<Workflow, CompileError> {
        let init_name = self.state_names.gen("env_init");
        let mut init = State::new(init_name, StateKind::Pass, range);

        let mut env_obj = serde_json::Map::new();
        for p in params {
            env_obj.insert(format!("{p}.$"), serde_json::Value::String(format!("$.{p}")));
        }
        let mut parameters = serde_json::Map::new();
        parameters.insert("env".to_string(), serde_json::Value::Object(env_obj));
        init.parameters = Some(parameters);
        init.layout = Some(self.bs.layout.get());

        let body_states = self.transform_sequence(body)?;
        init.set_next(body_states.first().map(|s| s.name.clone()).unwrap_or_else(|| init.name.clone()));

        let mut states = vec![init];
        states.extend(body_states);
        let start_state = states[0].name.clone();

        Ok(Workflow { name: name.to_string(), start_state, states, timeout_sec: None })
    }

    /// Translates a sequence of CIR nodes, wiring each item's last state to
    /// the next item's first state by name, then marking the final state of
    /// the whole sequence terminal. A caller that's embedding this sequence
    /// inside a larger construct (if/while/try) overrides that terminal
    /// marker right afterward via `set_next`, matching
    /// `transform_cast_sequence` in the source.
    fn transform_sequence(&mut self, nodes: &[Cir]) -> Result<Vec<State>, CompileError> {
        let mut result: Vec<State> = Vec::new();
        for node in nodes {
            let produced = self.transform_node(node)?;
            if let Some(first) = produced.first() {
                if let Some(last) = result.last_mut() {
                    last.set_next(first.name.clone());
                }
            }
            result.extend(produced);
        }
        if let Some(last) = result.last_mut() {
            last.set_end(true);
        }
        Ok(result)
    }

    fn transform_node(&mut self, node: &Cir) -> Result<Vec<State>, CompileError> {
        match node {
            Cir::Assign { target, value, range } => {
                if !matches!(value.as_ref(), Cir::Call { .. }) {
                    return Err(CompileError::InternalInvariant { message: "CIR assignment right-hand side must be a call".to_string() });
                }
                self.transform_call(value, Some(target.clone()), *range)
            }
            Cir::Call { .. } => self.transform_call(node, None, node.range()),
            Cir::If { test_var, then_body, else_body, range } => self.transform_if(test_var, then_body, else_body, *range),
            Cir::WhileLoop { body, range } => self.transform_while(body, *range),
            Cir::Return { var_name, range } => self.transform_return(var_name.as_deref(), *range),
            Cir::Break { range } => self.transform_break(*range),
            Cir::Try { body, handlers, range } => self.transform_try(body, handlers, *range),
            Cir::Module { .. } | Cir::FunctionDef { .. } | Cir::RawBlock { .. } => {
                Err(CompileError::InternalInvariant { message: "unexpected module, function, or raw block nested inside a workflow body".to_string() })
            }
        }
    }

    fn transform_call(&mut self, call: &Cir, target_var: Option<String>, range: TextRange) -> Result<Vec<State>, CompileError> {
        let Cir::Call { callee, args, timeout_sec, heartbeat_sec, retry, .. } = call else {
            return Err(CompileError::InternalInvariant { message: "transform_call given a non-Call node".to_string() });
        };
        let parts: Vec<&str> = callee.split('.').collect();

        if parts.len() > 1 {
            let resource_kind = parts[1];
            let resource_name = parts.last().copied().unwrap_or_default();

            let mut state = match resource_kind {
                "Lambda" => {
                    let name = self.state_names.gen(resource_name);
                    let mut s = State::new(name, StateKind::Lambda, range);
                    s.resource = self.arn.lambda_arn(resource_name);
                    s
                }
                "activity" => {
                    let name = self.state_names.gen(resource_name);
                    let mut s = State::new(name, StateKind::Task, range);
                    s.resource = self.arn.activity_arn(resource_name);
                    s
                }
                "sleep" => {
                    let name = self.state_names.gen("sleep");
                    let mut s = State::new(name, StateKind::Sleep, range);
                    let arg = args.first().ok_or_else(|| CompileError::UnsupportedConstruct { message: "cohesion.sleep requires one argument".to_string(), range })?;
                    s.seconds_path = format!("$.env.{arg}");
                    s.layout = Some(self.bs.layout.get());
                    return Ok(vec![s]);
                }
                "task" => {
                    return Err(CompileError::UnsupportedConstruct { message: "cohesion.task is not implemented".to_string(), range });
                }
                other => {
                    return Err(CompileError::UnsupportedConstruct { message: format!("unknown cohesion resource kind '{other}'"), range });
                }
            };

            state.timeout_sec = *timeout_sec;
            state.heartbeat_sec = *heartbeat_sec;

            if let Some(target) = &target_var {
                state.result_path = format!("$.env.{target}");
            } else {
                state.result_path = "$.env.discard".to_string();
                match args.len() {
                    0 => state.parameters = Some(serde_json::Map::new()),
                    1 => state.input_path = format!("$.env.{}", args[0]),
                    _ => {
                        return Err(CompileError::UnsupportedConstruct {
                            message: format!("call to '{callee}' with multiple positional arguments and a discarded result has no defined input marshalling; pass a single dict argument instead"),
                            range,
                        });
                    }
                }
            }

            if !retry.is_empty() {
                state.retry = retry.clone();
            }

            let catch_map = self.bs.catch_map();
            if !catch_map.is_empty() {
                state.catch = catch_map.into_iter().map(|(error_type, next)| CatchRule { error_equals: vec![error_type], next }).collect();
            }

            state.layout = Some(self.bs.layout.get());
            Ok(vec![state])
        } else {
            // A helper-generated call: no dotted prefix, no arguments.
            let mut state = if let Some(router) = self.router_func {
                let name = self.state_names.gen(callee);
                let mut s = State::new(name, StateKind::Lambda, range);
                s.resource = self.arn.lambda_arn(router);
                let mut params = serde_json::Map::new();
                params.insert("env".to_string(), serde_json::Value::String("$.env".to_string()));
                params.insert("func".to_string(), serde_json::Value::String(callee.clone()));
                s.parameters = Some(params);
                s
            } else {
                let name = self.state_names.gen(callee);
                let mut s = State::new(name, StateKind::Lambda, range);
                s.resource = self.arn.lambda_arn(callee);
                s
            };
            state.layout = Some(self.bs.layout.get());
            Ok(vec![state])
        }
    }

    fn transform_if(&mut self, test_var: &str, then_body: &[Cir], else_body: &[Cir], range: TextRange) -> Result<Vec<State>, CompileError> {
        let choice_name = self.state_names.gen("choice");
        let pass_name = self.state_names.gen("if_pass");

        let mut choice = State::new(choice_name, StateKind::Choice, range);
        choice.layout = Some(self.bs.layout.get());

        self.bs.layout.push_column();
        let mut then_states = self.transform_sequence(then_body)?;
        let then_first = then_states.first().ok_or_else(|| CompileError::InternalInvariant { message: "if-branch produced no states".to_string() })?.name.clone();
        then_states.last_mut().unwrap().set_next(pass_name.clone());
        let then_pos = self.bs.layout.pop();

        let mut else_states = Vec::new();
        let default_target = if else_body.is_empty() {
            pass_name.clone()
        } else {
            else_states = self.transform_sequence(else_body)?;
            let first = else_states[0].name.clone();
            else_states.last_mut().unwrap().set_next(pass_name.clone());
            first
        };

        self.bs.layout.update_row(then_pos);

        choice.choices.push(Choice { variable: format!("$.env.{test_var}"), boolean_equals: true, next: then_first });
        choice.default = default_target;

        let mut pass_state = State::new(pass_name, StateKind::RemovablePass, range);
        pass_state.layout = Some(self.bs.layout.get());

        let mut result = vec![choice];
        result.extend(then_states);
        result.extend(else_states);
        result.push(pass_state);
        Ok(result)
    }

    fn transform_while(&mut self, body: &[Cir], range: TextRange) -> Result<Vec<State>, CompileError> {
        let start_name = self.state_names.gen("loop_start");
        let end_name = self.state_names.gen("loop_end");

        let mut start = State::new(start_name, StateKind::RemovablePass, range);
        start.layout = Some(self.bs.layout.get());

        self.bs.break_targets.push(end_name.clone());
        let body_result = self.transform_sequence(body);
        self.bs.break_targets.pop();
        let mut body_states = body_result?;

        let body_first = body_states.first().ok_or_else(|| CompileError::InternalInvariant { message: "while-loop body produced no states".to_string() })?.name.clone();
        start.set_next(body_first);
        body_states.last_mut().unwrap().set_next(start.name.clone());

        let mut end = State::new(end_name, StateKind::RemovablePass, range);
        end.layout = Some(self.bs.layout.get());

        let mut result = vec![start];
        result.extend(body_states);
        result.push(end);
        Ok(result)
    }

    fn transform_return(&mut self, var_name: Option<&str>, range: TextRange) -> Result<Vec<State>, CompileError> {
        let name = self.state_names.gen("exit_pass");
        let mut pass_state = State::new(name, StateKind::Pass, range);
        if let Some(v) = var_name {
            pass_state.input_path = format!("$.env.{v}");
        }
        pass_state.end = true;
        pass_state.layout = Some(self.bs.layout.get());
        Ok(vec![pass_state])
    }

    fn transform_break(&mut self, range: TextRange) -> Result<Vec<State>, CompileError> {
        let target = self.bs.break_targets.last().cloned().ok_or_else(|| CompileError::MalformedExceptionFlow { message: "break outside a loop".to_string(), range })?;
        let name = self.state_names.gen("break");
        let mut state = State::new(name, StateKind::Break, range);
        state.next = Some(target);
        state.layout = Some(self.bs.layout.get());
        Ok(vec![state])
    }

    fn transform_try(&mut self, body: &[Cir], handlers: &[CirHandler], range: TextRange) -> Result<Vec<State>, CompileError> {
        let end_name = self.state_names.gen("endTry");

        // Ancillary column for the handler bodies; fixed up to sit below
        // the try body once its depth is known.
        self.bs.layout.push(Position { row: 1, column: self.bs.layout.peek().column + 1 });

        let mut handler_state_lists = Vec::new();
        for h in handlers {
            let mut hbody = self.transform_sequence(&h.body)?;
            let first_name = hbody.first().ok_or_else(|| CompileError::InternalInvariant { message: "except body produced no states".to_string() })?.name.clone();
            hbody.last_mut().unwrap().set_next(end_name.clone());
            self.bs.handler_stack.push(HandlerRef { error_types: h.error_types.clone(), state_name: first_name });
            handler_state_lists.push(hbody);
        }
        self.bs.layout.pop();

        let body_result = self.transform_sequence(body);
        let mut body_states = match body_result {
            Ok(states) => states,
            Err(err) => {
                for _ in 0..handlers.len() {
                    self.bs.handler_stack.pop();
                }
                return Err(err);
            }
        };
        body_states.last_mut().unwrap().set_next(end_name.clone());

        let n_rows = body_states.last().and_then(|s| s.layout).map(|p| p.row).unwrap_or(0);
        let mut last_row = 0;
        let mut handler_states = Vec::new();
        for mut hbody in handler_state_lists {
            for s in hbody.iter_mut() {
                if let Some(pos) = s.layout.as_mut() {
                    pos.move_down(n_rows);
                    last_row = pos.row;
                }
            }
            handler_states.extend(hbody);
        }
        self.bs.layout.update_row(Position { row: last_row, column: 0 });

        for _ in 0..handlers.len() {
            self.bs.handler_stack.pop();
        }

        let mut end_state = State::new(end_name, StateKind::RemovablePass, range);
        end_state.layout = Some(self.bs.layout.get());

        let mut result = Vec::new();
        result.extend(body_states);
        result.extend(handler_states);
        result.push(end_state);
        Ok(result)
    }
}
