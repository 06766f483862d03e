//! CIR builder: lowers the lifted, variable-rewritten AST into the flat
//! `Cir` node hierarchy the rest of the pipeline operates on.

use cohesion_dsl::ast::{Expr, Literal, Module, Stmt};
use cohesion_dsl::TextRange;
use specifications::RetryRule;

use crate::cir::{Cir, CirHandler};
use crate::errors::CompileError;

/// Every top-level statement is a workflow entry point by construction, so
/// unlike a nested statement list it's never blue/green-split into a
/// `RawBlock`: even a function with no `cohesion` call anywhere in its body
/// (e.g. a bare `return`) still becomes its own `FunctionDef`/`Workflow`,
/// not a helper. Only statements *inside* each function body go through
/// `transform_list`'s blue/green packing.
pub fn build(module: &Module) -> Result<Cir, CompileError> {
    let defs = module.body.iter().map(transform_node).collect::<Result<Vec<_>, CompileError>>()?;
    Ok(Cir::Module { defs })
}

/// Packs a run of blue statements into a single `RawBlock`; each green
/// statement becomes its own CIR node.
fn transform_list(stmts: &[Stmt]) -> Result<Vec<Cir>, CompileError> {
    let mut result = Vec::new();
    let mut blue_run: Vec<Stmt> = Vec::new();

    for stmt in stmts {
        if stmt.is_green() {
            if !blue_run.is_empty() {
                result.push(raw_block(std::mem::take(&mut blue_run)));
            }
            result.push(transform_node(stmt)?);
        } else {
            blue_run.push(stmt.clone());
        }
    }
    if !blue_run.is_empty() {
        result.push(raw_block(blue_run));
    }
    Ok(result)
}

fn raw_block(nodes: Vec<Stmt>) -> Cir {
    let range = match (nodes.first(), nodes.last()) {
        (Some(first), Some(last)) => first.range().merge(&last.range()),
        _ => TextRange::default(),
    };
    Cir::RawBlock { nodes, range }
}

fn transform_node(stmt: &Stmt) -> Result<Cir, CompileError> {
    let range = stmt.range();
    match stmt {
        Stmt::FunctionDef { name, params, body, .. } => {
            Ok(Cir::FunctionDef { name: name.clone(), params: params.clone(), body: transform_list(body)?, range })
        }
        Stmt::If { test, body, orelse, .. } => {
            let test_var = expect_env_name(test)?;
            Ok(Cir::If { test_var, then_body: transform_list(body)?, else_body: transform_list(orelse)?, range })
        }
        Stmt::While { body, .. } => Ok(Cir::WhileLoop { body: transform_list(body)?, range }),
        Stmt::For { .. } => Err(CompileError::UnsupportedConstruct { message: "for loops are not supported in workflow code".to_string(), range }),
        Stmt::Try { body, handlers, .. } => {
            let handlers = handlers
                .iter()
                .map(|h| {
                    Ok(CirHandler { error_types: h.types.clone(), bind_name: h.bind_name.clone(), body: transform_list(&h.body)? })
                })
                .collect::<Result<Vec<_>, CompileError>>()?;
            Ok(Cir::Try { body: transform_list(body)?, handlers, range })
        }
        Stmt::Break { .. } => Ok(Cir::Break { range }),
        Stmt::Return { value, .. } => {
            let var_name = match value {
                None => None,
                Some(v) => Some(expect_env_name(v)?),
            };
            Ok(Cir::Return { var_name, range })
        }
        Stmt::Assign { target, value, .. } => {
            // Variable rewrite never touches assignment targets, only reads,
            // so `target` is already the plain name to carry forward as-is.
            let Expr::Call { .. } = value else {
                return Err(CompileError::UnsupportedConstruct { message: "a green assignment's right-hand side must be a call".to_string(), range });
            };
            Ok(Cir::Assign { target: target.clone(), value: Box::new(transform_call(value)?), range })
        }
        Stmt::ExprStmt { value, .. } => transform_call(value),
    }
}

fn transform_call(expr: &Expr) -> Result<Cir, CompileError> {
    let range = expr.range();
    let Expr::Call { func, args, keywords, .. } = expr else {
        return Err(CompileError::UnsupportedConstruct { message: "expected a call in workflow position".to_string(), range });
    };
    let callee = func.dotted_name().ok_or_else(|| CompileError::UnsupportedConstruct {
        message: "call target must be a dotted name".to_string(),
        range,
    })?;

    let mut cir_args = Vec::with_capacity(args.len());
    for a in args {
        cir_args.push(expect_env_name(a)?);
    }

    let mut timeout_sec = None;
    let mut heartbeat_sec = None;
    let mut retry = Vec::new();
    for (key, value) in keywords {
        match key.to_ascii_lowercase().as_str() {
            "timeout" | "timeoutseconds" => timeout_sec = Some(expect_number(value)?),
            "heartbeat" | "heartbeatseconds" => heartbeat_sec = Some(expect_number(value)?),
            "retry" => retry = parse_retry(value)?,
            other => {
                return Err(CompileError::UnsupportedConstruct { message: format!("unknown call keyword argument '{other}'"), range: value.range() });
            }
        }
    }

    Ok(Cir::Call { callee, args: cir_args, timeout_sec, heartbeat_sec, retry, range })
}

/// Extracts a bare variable reference, unwrapping the `env['x']` subscript
/// left by variable rewrite for expressions that came from green source.
/// Accepts a plain `Name` too, for values that never went through variable
/// rewrite (e.g. a loop/test variable outside any green scope).
fn expect_env_name(expr: &Expr) -> Result<String, CompileError> {
    match expr {
        Expr::Name { id, .. } => Ok(id.clone()),
        Expr::Subscript { value, index, .. } => match (value.as_ref(), index.as_ref()) {
            (Expr::Name { id, .. }, Expr::Literal { value: Literal::Str(key), .. }) if id == "env" => Ok(key.clone()),
            _ => Err(CompileError::UnsupportedConstruct { message: "expected a variable reference".to_string(), range: expr.range() }),
        },
        _ => Err(CompileError::UnsupportedConstruct { message: "expected a variable reference".to_string(), range: expr.range() }),
    }
}

fn expect_number(expr: &Expr) -> Result<i64, CompileError> {
    match expr {
        Expr::Literal { value: Literal::Num(n), .. } => Ok(*n as i64),
        _ => Err(CompileError::UnsupportedConstruct { message: "expected a numeric literal".to_string(), range: expr.range() }),
    }
}

fn expect_float(expr: &Expr) -> Result<f64, CompileError> {
    match expr {
        Expr::Literal { value: Literal::Num(n), .. } => Ok(*n),
        _ => Err(CompileError::UnsupportedConstruct { message: "expected a numeric literal".to_string(), range: expr.range() }),
    }
}

fn expect_string(expr: &Expr) -> Result<String, CompileError> {
    match expr {
        Expr::Literal { value: Literal::Str(s), .. } => Ok(s.clone()),
        _ => Err(CompileError::UnsupportedConstruct { message: "expected a string literal".to_string(), range: expr.range() }),
    }
}

fn parse_retry(expr: &Expr) -> Result<Vec<RetryRule>, CompileError> {
    let Expr::List { elts, range } = expr else {
        return Err(CompileError::UnsupportedConstruct { message: "expected a list of retry rules".to_string(), range: expr.range() });
    };
    let _ = range;
    elts.iter().map(parse_retry_rule).collect()
}

fn parse_retry_rule(expr: &Expr) -> Result<RetryRule, CompileError> {
    let Expr::Dict { entries, range } = expr else {
        return Err(CompileError::UnsupportedConstruct { message: "expected a retry rule object".to_string(), range: expr.range() });
    };

    let mut error_equals = None;
    let mut interval_seconds = None;
    let mut max_attempts = None;
    let mut backoff_rate = None;
    for (key, value) in entries {
        match key.as_str() {
            "Error" => error_equals = Some(vec![expect_string(value)?]),
            "IntervalSeconds" => interval_seconds = Some(expect_number(value)?),
            "MaxAttempts" => max_attempts = Some(expect_number(value)?),
            "BackoffRate" => backoff_rate = Some(expect_float(value)?),
            other => return Err(CompileError::UnsupportedConstruct { message: format!("unknown retry rule key '{other}'"), range: value.range() }),
        }
    }

    Ok(RetryRule {
        error_equals: error_equals.ok_or_else(|| CompileError::UnsupportedConstruct { message: "retry rule missing 'Error'".to_string(), range: *range })?,
        interval_seconds: interval_seconds.ok_or_else(|| CompileError::UnsupportedConstruct { message: "retry rule missing 'IntervalSeconds'".to_string(), range: *range })?,
        max_attempts: max_attempts.ok_or_else(|| CompileError::UnsupportedConstruct { message: "retry rule missing 'MaxAttempts'".to_string(), range: *range })?,
        backoff_rate: backoff_rate.ok_or_else(|| CompileError::UnsupportedConstruct { message: "retry rule missing 'BackoffRate'".to_string(), range: *range })?,
    })
}

#[cfg(test)]
mod tests {
    use cohesion_dsl::parse;

    use super::*;
    use crate::state::NameTable;
    use crate::traversals::{coloring, lifting, variables};

    fn built(source: &str) -> Cir {
        let mut module = parse(source).unwrap();
        coloring::color(&mut module, "cohesion").unwrap();
        let mut names = NameTable::from_module(&module);
        lifting::lift(&mut module, &mut names).unwrap();
        variables::rewrite(&mut module);
        build(&module).unwrap()
    }

    #[test]
    fn a_bare_return_never_becomes_a_raw_block() {
        // No `cohesion` call anywhere in this function's body, but it's a
        // top-level def and therefore a workflow entry point unconditionally.
        let cir = built("def f(x):\n    return x\n");
        let Cir::Module { defs } = &cir else { panic!() };
        let Cir::FunctionDef { body, .. } = &defs[0] else { panic!() };
        assert_eq!(body.len(), 1);
        assert!(matches!(&body[0], Cir::Return { var_name: Some(n), .. } if n == "x"));
    }

    #[test]
    fn contiguous_blue_statements_pack_into_one_raw_block() {
        // The call is lifted to its own `call_1 = cohesion.activity.hello()`
        // ahead of the `return`, so the trailing green run is an `Assign`
        // wrapping the call followed by the `Return`, not a bare `Call`.
        let cir = built("def f():\n    a = 1\n    b = 2\n    return cohesion.activity.hello()\n");
        let Cir::Module { defs } = &cir else { panic!() };
        let Cir::FunctionDef { body, .. } = &defs[0] else { panic!() };
        assert!(matches!(&body[0], Cir::RawBlock { nodes, .. } if nodes.len() == 2));
        assert!(matches!(&body[1], Cir::Assign { value, .. } if matches!(value.as_ref(), Cir::Call { callee, .. } if callee == "cohesion.activity.hello")));
        assert!(matches!(&body[2], Cir::Return { var_name: Some(_), .. }));
    }
}
