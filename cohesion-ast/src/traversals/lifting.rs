//! Call lifting: normalizes every green construct so that remote calls
//! become standalone statements with variable-only arguments.

use cohesion_dsl::ast::{Expr, Literal, Module, Stmt, UnaryOperator};

use crate::errors::CompileError;
use crate::state::NameTable;

pub fn lift(module: &mut Module, names: &mut NameTable) -> Result<(), CompileError> {
    for stmt in &mut module.body {
        lift_in_place(stmt, names)?;
    }
    Ok(())
}

/// Transforms a sequence of statements, splicing each statement's
/// pre-statements before it.
fn lift_sequence(stmts: &mut Vec<Stmt>, names: &mut NameTable) -> Result<(), CompileError> {
    let mut out = Vec::with_capacity(stmts.len());
    for mut stmt in stmts.drain(..) {
        let mut pre = Vec::new();
        lift_stmt(&mut stmt, names, &mut pre)?;
        out.extend(pre);
        out.push(stmt);
    }
    *stmts = out;
    Ok(())
}

/// Lifts a statement whose own body is itself a sequence (function defs,
/// `if`/`while`/`try`); these never produce pre-statements of their own.
fn lift_in_place(stmt: &mut Stmt, names: &mut NameTable) -> Result<(), CompileError> {
    let mut pre = Vec::new();
    lift_stmt(stmt, names, &mut pre)?;
    if !pre.is_empty() {
        return Err(CompileError::InternalInvariant { message: "top-level statement produced pre-statements".to_string() });
    }
    Ok(())
}

fn lift_stmt(stmt: &mut Stmt, names: &mut NameTable, pre: &mut Vec<Stmt>) -> Result<(), CompileError> {
    match stmt {
        Stmt::FunctionDef { body, green, .. } => {
            if *green {
                lift_sequence(body, names)?;
            }
        }
        Stmt::For { body, green, .. } => {
            if *green {
                lift_sequence(body, names)?;
            }
        }
        Stmt::If { test, body, orelse, green, .. } => {
            if !*green {
                return Ok(());
            }
            lift_sequence(body, names)?;
            lift_sequence(orelse, names)?;
            lift_expr_in_place(test, names, pre)?;

            // Always lift the test into `test_k = bool(<test>)`, since we
            // can't statically know it's already boolean.
            let range = test.range();
            let test_var = names.fresh("test");
            let old_test = std::mem::replace(test, Expr::Name { id: test_var.clone(), range });
            let bool_call = Expr::Call {
                func: Box::new(Expr::Name { id: "bool".to_string(), range }),
                args: vec![old_test],
                keywords: Vec::new(),
                green: false,
                range,
            };
            pre.push(Stmt::Assign { target: test_var, value: bool_call, green: true, range });
        }
        Stmt::While { test, body, green, range } => {
            if !*green {
                return Ok(());
            }
            let range = *range;
            let test_var = names.fresh("test");
            let old_test = std::mem::replace(test, Expr::Literal { value: Literal::Bool(true), range });

            let test_stmt = Stmt::Assign {
                target: test_var.clone(),
                value: Expr::UnaryOp {
                    op: UnaryOperator::Not,
                    operand: Box::new(Expr::Call {
                        func: Box::new(Expr::Name { id: "bool".to_string(), range }),
                        args: vec![old_test],
                        keywords: Vec::new(),
                        green: false,
                        range,
                    }),
                    range,
                },
                green: true,
                range,
            };
            let break_if = Stmt::If {
                test: Expr::Name { id: test_var, range },
                body: vec![Stmt::Break { green: true, range }],
                orelse: Vec::new(),
                green: true,
                range,
            };

            let mut new_body = vec![test_stmt, break_if];
            new_body.append(body);
            lift_sequence(&mut new_body, names)?;
            *body = new_body;
        }
        Stmt::Assign { value, green, .. } => {
            if !*green {
                return Ok(());
            }
            // Green + Call RHS: lift its non-name args, same as any other
            // call in workflow position, then leave the call itself in
            // place for the CIR builder. Green + anything else: this
            // assignment's RHS will be emitted inside a helper, so demote
            // it to blue.
            if let Expr::Call { args, .. } = value {
                lift_call_args(args, names, pre)?;
            } else {
                *green = false;
            }
        }
        Stmt::Try { body, handlers, green, .. } => {
            if !*green {
                return Ok(());
            }
            lift_sequence(body, names)?;
            for h in handlers.iter_mut() {
                lift_sequence(&mut h.body, names)?;
            }
        }
        Stmt::ExprStmt { value, green, .. } => {
            // Void-context calls: lift arguments only, keep the call in
            // place so the WIR builder knows its result is discarded.
            if !*green {
                return Ok(());
            }
            if let Expr::Call { args, .. } = value {
                lift_call_args(args, names, pre)?;
            }
        }
        Stmt::Return { value, green, range } => {
            if !*green {
                return Ok(());
            }
            let range = *range;
            let Some(v) = value else { return Ok(()) };
            if matches!(v, Expr::Literal { .. }) {
                return Ok(());
            }
            if matches!(v, Expr::Name { .. }) {
                return Ok(());
            }

            lift_expr_in_place(v, names, pre)?;
            if matches!(v, Expr::Name { .. }) {
                // No further transform needed: the expression reduced to a
                // plain name after lifting (e.g. it was a lifted Call).
                return Ok(());
            }
            let ret_var = names.fresh("ret");
            let taken = std::mem::replace(v, Expr::Name { id: ret_var.clone(), range });
            pre.push(Stmt::Assign { target: ret_var, value: taken, green: true, range });
        }
        Stmt::Break { .. } => {}
    }
    Ok(())
}

/// If `expr` itself is a green `Call`, lifts it into its own
/// `call_N = ...` statement appended to `pre`, replacing `expr` in place
/// with a reference to the result. A no-op on anything else.
fn lift_expr_in_place(expr: &mut Expr, names: &mut NameTable, pre: &mut Vec<Stmt>) -> Result<(), CompileError> {
    if let Expr::Call { green, .. } = expr {
        if *green {
            let range = expr.range();
            let Expr::Call { args, .. } = expr else { unreachable!() };
            lift_call_args(args, names, pre)?;
            let call_var = names.fresh("call");
            let taken = std::mem::replace(expr, Expr::Name { id: call_var.clone(), range });
            pre.push(Stmt::Assign { target: call_var, value: taken, green: true, range });
            return Ok(());
        }
    }
    Ok(())
}

/// Lifts each non-name argument of a green call to its own assignment,
/// leaving only variable references as arguments.
fn lift_call_args(args: &mut [Expr], names: &mut NameTable, pre: &mut Vec<Stmt>) -> Result<(), CompileError> {
    for arg in args.iter_mut() {
        if arg.is_name() {
            continue;
        }
        lift_expr_in_place(arg, names, pre)?;
        if arg.is_name() {
            continue;
        }
        let range = arg.range();
        let arg_var = names.fresh("a");
        let taken = std::mem::replace(arg, Expr::Name { id: arg_var.clone(), range });
        pre.push(Stmt::Assign { target: arg_var, value: taken, green: true, range });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use cohesion_dsl::parse;

    use super::*;
    use crate::state::NameTable;
    use crate::traversals::coloring;

    fn lifted(source: &str) -> Module {
        let mut module = parse(source).unwrap();
        coloring::color(&mut module, "cohesion").unwrap();
        let mut names = NameTable::from_module(&module);
        lift(&mut module, &mut names).unwrap();
        module
    }

    #[test]
    fn nested_call_result_is_hoisted_to_its_own_assignment() {
        let module = lifted("def f():\n    return cohesion.activity.a(cohesion.activity.b())\n");
        let Stmt::FunctionDef { body, .. } = &module.body[0] else { panic!() };
        // The inner call becomes its own `call_N = cohesion.activity.b()`
        // statement ahead of the outer call, which now takes a bare name.
        assert!(body.len() >= 2, "the inner call should be lifted ahead of the outer one");
        let Stmt::Return { value: Some(Expr::Call { args, .. }), .. } = body.last().unwrap() else { panic!("expected the final statement to be the return") };
        assert!(matches!(args.as_slice(), [Expr::Name { .. }]), "the outer call's argument must be a bare name after lifting");
    }

    #[test]
    fn literal_arg_of_a_green_assignment_call_is_lifted() {
        let module = lifted("def f():\n    x = cohesion.activity.foo(42)\n    return x\n");
        let Stmt::FunctionDef { body, .. } = &module.body[0] else { panic!() };
        let Stmt::Assign { value: Expr::Call { args, .. }, .. } = &body[1] else { panic!("expected the assignment to be the second statement, after the lifted literal") };
        assert!(matches!(args.as_slice(), [Expr::Name { .. }]), "a literal call argument must become a bare name after lifting");
    }

    #[test]
    fn while_true_gets_a_synthetic_break_check() {
        let module = lifted("def f():\n    while True:\n        cohesion.activity.step()\n        break\n");
        let Stmt::FunctionDef { body, .. } = &module.body[0] else { panic!() };
        let Stmt::While { body: loop_body, .. } = &body[0] else { panic!() };
        // Prelude: `test_N = bool(not True)`, then `if test_N: break`.
        assert!(matches!(loop_body[0], Stmt::Assign { .. }));
        assert!(matches!(loop_body[1], Stmt::If { .. }));
    }

    #[test]
    fn blue_assign_with_non_call_rhs_is_demoted() {
        // Coloring only ever marks an assignment green when its RHS itself
        // is (or contains) a triggering call; a green non-call RHS can't
        // arise from real source, so this exercises `lift_stmt`'s demotion
        // branch directly against a hand-built AST.
        let range = TextRange::default();
        let mut stmt = Stmt::Assign { target: "x".to_string(), value: Expr::Literal { value: Literal::Num(1.0), range }, green: true, range };
        let mut names = NameTable::default();
        let mut pre = Vec::new();
        lift_stmt(&mut stmt, &mut names, &mut pre).unwrap();
        assert!(matches!(stmt, Stmt::Assign { green: false, .. }));
    }
}
