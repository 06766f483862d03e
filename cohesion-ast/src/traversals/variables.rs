//! Variable rewrite: every variable read inside a green function becomes a
//! lookup into the `env` dict that the generated helper functions share,
//! since each helper only sees the slice of state AWS hands it back.
//!
//! Assignment targets stay plain identifiers in this IR — the CIR `Assign`
//! carries `target: String`, not an expression — so the `env['x'] =`
//! wrapping for targets happens once, at helper-printing time, rather than
//! here.

use cohesion_dsl::ast::{Expr, Literal, Module, Stmt};

const ENV: &str = "env";

pub fn rewrite(module: &mut Module) {
    for stmt in &mut module.body {
        rewrite_stmt(stmt, false);
    }
}

fn rewrite_stmt(stmt: &mut Stmt, green: bool) {
    match stmt {
        Stmt::FunctionDef { body, green: self_green, .. } => {
            let inner = *self_green;
            for s in body.iter_mut() {
                rewrite_stmt(s, inner);
            }
        }
        Stmt::If { test, body, orelse, .. } => {
            rewrite_expr(test, green);
            for s in body.iter_mut() {
                rewrite_stmt(s, green);
            }
            for s in orelse.iter_mut() {
                rewrite_stmt(s, green);
            }
        }
        Stmt::While { test, body, .. } => {
            rewrite_expr(test, green);
            for s in body.iter_mut() {
                rewrite_stmt(s, green);
            }
        }
        Stmt::For { iter, body, .. } => {
            rewrite_expr(iter, green);
            for s in body.iter_mut() {
                rewrite_stmt(s, green);
            }
        }
        Stmt::Try { body, handlers, .. } => {
            for s in body.iter_mut() {
                rewrite_stmt(s, green);
            }
            for h in handlers.iter_mut() {
                // `bind_name`/`types` are plain strings, not `Name` nodes:
                // nothing to rewrite there, matching the source's choice not
                // to touch the handler's exception type.
                for s in h.body.iter_mut() {
                    rewrite_stmt(s, green);
                }
            }
        }
        Stmt::Break { .. } => {}
        Stmt::Return { value, .. } => {
            if let Some(v) = value {
                rewrite_expr(v, green);
            }
        }
        Stmt::Assign { value, .. } => rewrite_expr(value, green),
        Stmt::ExprStmt { value, .. } => rewrite_expr(value, green),
    }
}

fn rewrite_expr(expr: &mut Expr, green: bool) {
    match expr {
        Expr::Name { id, range } => {
            if green {
                let literal = Expr::Literal { value: Literal::Str(id.clone()), range: *range };
                *expr = Expr::Subscript {
                    value: Box::new(Expr::Name { id: ENV.to_string(), range: *range }),
                    index: Box::new(literal),
                    range: *range,
                };
            }
        }
        Expr::Literal { .. } => {}
        Expr::Call { args, keywords, .. } => {
            // The callee itself is left untouched (matches `visit_Call`
            // skipping `node.func`): function names aren't stored in `env`.
            for a in args.iter_mut() {
                rewrite_expr(a, green);
            }
            for (_, v) in keywords.iter_mut() {
                rewrite_expr(v, green);
            }
        }
        Expr::Attribute { value, .. } => rewrite_expr(value, green),
        Expr::Subscript { value, index, .. } => {
            rewrite_expr(value, green);
            rewrite_expr(index, green);
        }
        Expr::UnaryOp { operand, .. } => rewrite_expr(operand, green),
        Expr::Tuple { elts, .. } | Expr::List { elts, .. } => {
            for e in elts.iter_mut() {
                rewrite_expr(e, green);
            }
        }
        Expr::Dict { .. } => {
            // Retry-rule dicts are consumed directly by the CIR builder
            // before this pass would ever see one in practice; left
            // untouched for consistency with `visit_Call` not rewriting
            // keyword literals either.
        }
    }
}

#[cfg(test)]
mod tests {
    use cohesion_dsl::parse;

    use super::*;
    use crate::traversals::coloring;

    fn rewritten(source: &str) -> Module {
        let mut module = parse(source).unwrap();
        coloring::color(&mut module, "cohesion").unwrap();
        rewrite(&mut module);
        module
    }

    #[test]
    fn read_inside_a_green_function_becomes_an_env_lookup() {
        let module = rewritten("def f(x):\n    return x\n");
        let Stmt::FunctionDef { body, .. } = &module.body[0] else { panic!() };
        let Stmt::Return { value: Some(Expr::Subscript { value, index, .. }), .. } = &body[0] else { panic!("read should be rewritten to a subscript") };
        assert!(matches!(value.as_ref(), Expr::Name { id, .. } if id == "env"));
        assert!(matches!(index.as_ref(), Expr::Literal { value: Literal::Str(k), .. } if k == "x"));
    }

    #[test]
    fn assignment_target_stays_a_plain_string() {
        let module = rewritten("def f():\n    x = cohesion.activity.hello()\n    return x\n");
        let Stmt::FunctionDef { body, .. } = &module.body[0] else { panic!() };
        let Stmt::Assign { target, .. } = &body[0] else { panic!() };
        assert_eq!(target, "x", "only reads go through env[...], the target never does");
    }
}
