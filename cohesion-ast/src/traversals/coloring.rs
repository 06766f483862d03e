//! Blue-green coloring: a compound node's greenness is the fixpoint OR of
//! "do I trigger" and "does any of my children end up green" — every
//! ancestor of a triggering call ends up colored green by the same rule,
//! viewed bottom-up instead of walking an explicit ancestor stack top-down.

use std::collections::HashSet;

use cohesion_dsl::ast::{Expr, Module, Stmt};

use crate::errors::CompileError;

const DEFAULT_MODULE: &str = "cohesion";

/// Runs the coloring pass to convergence: repeats the walk until a whole
/// pass marks no new node.
///
/// Every top-level function is a workflow entry point regardless of whether
/// its body ever calls into `module_name` — a bare `return x` is already a
/// complete, valid workflow — so top-level defs are seeded green up front,
/// before the fixpoint walk, the same way a triggering call seeds the node
/// it's found on. This is the only place greenness is assigned rather than
/// derived: everything below it still follows purely from the
/// ancestor-OR-descendant rule.
pub fn color(module: &mut Module, module_name: &str) -> Result<(), CompileError> {
    let module_name = if module_name.is_empty() { DEFAULT_MODULE } else { module_name };
    let mut green_functions = HashSet::new();
    for stmt in &mut module.body {
        if let Stmt::FunctionDef { name, green, .. } = stmt {
            *green = true;
            green_functions.insert(name.clone());
        }
    }
    loop {
        let mut changed = false;
        for stmt in &mut module.body {
            color_stmt(stmt, &mut green_functions, module_name, None, None, &mut changed)?;
        }
        if !changed {
            return Ok(());
        }
    }
}

fn color_stmt(
    stmt: &mut Stmt,
    functions: &mut HashSet<String>,
    module_name: &str,
    enclosing_function_green: Option<bool>,
    enclosing_loop_green: Option<bool>,
    changed: &mut bool,
) -> Result<bool, CompileError> {
    match stmt {
        Stmt::FunctionDef { name, body, green, .. } => {
            let self_green_before = *green;
            let mut body_green = false;
            for s in body.iter_mut() {
                body_green |= color_stmt(s, functions, module_name, Some(self_green_before), None, changed)?;
            }
            let new_green = *green || body_green;
            if new_green && !*green {
                *green = true;
                *changed = true;
            }
            if *green {
                functions.insert(name.clone());
            }
            Ok(*green || body_green)
        }
        Stmt::If { test, body, orelse, green, .. } => {
            let test_green = color_expr(test, functions, module_name, changed);
            let mut body_green = false;
            for s in body.iter_mut() {
                body_green |= color_stmt(s, functions, module_name, enclosing_function_green, enclosing_loop_green, changed)?;
            }
            let mut orelse_green = false;
            for s in orelse.iter_mut() {
                orelse_green |= color_stmt(s, functions, module_name, enclosing_function_green, enclosing_loop_green, changed)?;
            }
            let contributes = test_green || body_green || orelse_green;
            if contributes && !*green {
                *green = true;
                *changed = true;
            }
            Ok(*green || contributes)
        }
        Stmt::While { test, body, green, .. } => {
            let test_green = color_expr(test, functions, module_name, changed);
            let self_green_before = *green;
            let mut body_green = false;
            for s in body.iter_mut() {
                body_green |= color_stmt(s, functions, module_name, enclosing_function_green, Some(self_green_before), changed)?;
            }
            let contributes = test_green || body_green;
            if contributes && !*green {
                *green = true;
                *changed = true;
            }
            Ok(*green || contributes)
        }
        Stmt::For { iter, body, green, .. } => {
            let iter_green = color_expr(iter, functions, module_name, changed);
            let self_green_before = *green;
            let mut body_green = false;
            for s in body.iter_mut() {
                body_green |= color_stmt(s, functions, module_name, enclosing_function_green, Some(self_green_before), changed)?;
            }
            let contributes = iter_green || body_green;
            if contributes && !*green {
                *green = true;
                *changed = true;
            }
            Ok(*green || contributes)
        }
        Stmt::Try { body, handlers, green, .. } => {
            let mut body_green = false;
            for s in body.iter_mut() {
                body_green |= color_stmt(s, functions, module_name, enclosing_function_green, enclosing_loop_green, changed)?;
            }
            let mut handlers_green = false;
            for h in handlers.iter_mut() {
                for s in h.body.iter_mut() {
                    handlers_green |= color_stmt(s, functions, module_name, enclosing_function_green, enclosing_loop_green, changed)?;
                }
            }
            let contributes = body_green || handlers_green;
            if contributes && !*green {
                *green = true;
                *changed = true;
            }
            Ok(*green || contributes)
        }
        Stmt::Break { green, range } => {
            let loop_green = enclosing_loop_green
                .ok_or_else(|| CompileError::MalformedExceptionFlow { message: "break outside a loop".to_string(), range: *range })?;
            if loop_green && !*green {
                *green = true;
                *changed = true;
            }
            Ok(*green)
        }
        Stmt::Return { value, green, range } => {
            let func_green = enclosing_function_green
                .ok_or_else(|| CompileError::MalformedExceptionFlow { message: "return outside a function".to_string(), range: *range })?;
            let value_green = value.as_mut().map(|v| color_expr(v, functions, module_name, changed)).unwrap_or(false);
            let new_green = *green || func_green || value_green;
            if new_green && !*green {
                *green = true;
                *changed = true;
            }
            Ok(*green)
        }
        Stmt::Assign { value, green, .. } => {
            let value_green = color_expr(value, functions, module_name, changed);
            if value_green && !*green {
                *green = true;
                *changed = true;
            }
            Ok(*green || value_green)
        }
        Stmt::ExprStmt { value, green, .. } => {
            let value_green = color_expr(value, functions, module_name, changed);
            if value_green && !*green {
                *green = true;
                *changed = true;
            }
            Ok(*green || value_green)
        }
    }
}

/// Colors `expr` (marking any triggering `Call`s green) and returns whether
/// the subtree contains a green call, for propagation to the enclosing
/// statement.
fn color_expr(expr: &mut Expr, functions: &mut HashSet<String>, module_name: &str, changed: &mut bool) -> bool {
    match expr {
        Expr::Name { .. } | Expr::Literal { .. } => false,
        Expr::Call { func, args, keywords, green, .. } => {
            let mut any = false;
            for a in args.iter_mut() {
                any |= color_expr(a, functions, module_name, changed);
            }
            for (_, v) in keywords.iter_mut() {
                any |= color_expr(v, functions, module_name, changed);
            }
            if is_trigger(func, module_name, functions) && !*green {
                *green = true;
                *changed = true;
            }
            *green || any
        }
        Expr::Attribute { value, .. } => color_expr(value, functions, module_name, changed),
        Expr::Subscript { value, index, .. } => {
            let a = color_expr(value, functions, module_name, changed);
            let b = color_expr(index, functions, module_name, changed);
            a || b
        }
        Expr::UnaryOp { operand, .. } => color_expr(operand, functions, module_name, changed),
        Expr::Tuple { elts, .. } => elts.iter_mut().fold(false, |acc, e| acc | color_expr(e, functions, module_name, changed)),
        // List/Dict literals only occur as call-keyword values (retry
        // rules); they're never a call target and can't themselves trigger.
        Expr::List { .. } | Expr::Dict { .. } => false,
    }
}

fn is_trigger(func: &Expr, module_name: &str, green_functions: &HashSet<String>) -> bool {
    if let Some(dotted) = func.dotted_name() {
        if dotted == module_name || dotted.starts_with(&format!("{module_name}.")) {
            return true;
        }
    }
    if let Expr::Name { id, .. } = func {
        if green_functions.contains(id) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohesion_dsl::parse;

    fn colored(source: &str) -> Module {
        let mut module = parse(source).unwrap();
        color(&mut module, "cohesion").unwrap();
        module
    }

    #[test]
    fn all_blue_function_is_still_green_at_top_level() {
        let module = colored("def f(x):\n    return x\n");
        let Stmt::FunctionDef { green, body, .. } = &module.body[0] else { panic!() };
        assert!(*green, "a top-level def is a workflow entry point unconditionally");
        assert!(matches!(body[0], Stmt::Return { green: true, .. }));
    }

    #[test]
    fn ancestors_of_a_triggering_call_turn_green() {
        let module = colored("def f(x):\n    if x:\n        y = cohesion.activity.hello()\n    return\n");
        let Stmt::FunctionDef { body, .. } = &module.body[0] else { panic!() };
        assert!(matches!(body[0], Stmt::If { green: true, .. }));
    }

    #[test]
    fn unrelated_blue_branch_stays_blue() {
        let module = colored("def f(x):\n    if x:\n        y = cohesion.activity.hello()\n    else:\n        z = 1\n    return\n");
        let Stmt::FunctionDef { body, .. } = &module.body[0] else { panic!() };
        let Stmt::If { orelse, .. } = &body[0] else { panic!() };
        assert!(matches!(orelse[0], Stmt::Assign { green: false, .. }));
    }

    #[test]
    fn break_outside_a_loop_is_rejected() {
        let mut module = parse("def f():\n    return\n").unwrap();
        // Hand-craft an illegal `break` at function-body scope; the parser
        // itself would never produce one outside a loop.
        let Stmt::FunctionDef { body, .. } = &mut module.body[0] else { panic!() };
        body.insert(0, Stmt::Break { green: false, range: Default::default() });
        assert!(color(&mut module, "cohesion").is_err());
    }
}
