//! Helper wrapper and module emitter: wraps each extracted helper body in
//! the env-dict prologue/epilogue a Lambda invocation expects, then renders
//! every helper as one source file's worth of text.
//!
//! `cohesion-dsl` has no pretty-printer of its own (it only parses); the
//! printer here is the minimal inverse of the parser's grammar, just enough
//! to reproduce a helper body as source text.

use cohesion_dsl::ast::{Expr, Literal, Stmt, UnaryOperator};

use crate::aggregate::Aggregate;

const INDENT: &str = "    ";

/// Renders every registered helper, plus the router function if one was
/// generated, as one source file's worth of text. Helpers are sorted by
/// name for determinism: the source's own dict-insertion order isn't
/// something a `HashMap`-backed aggregate can reproduce, and output must be
/// byte-for-byte reproducible across runs.
pub fn render(agg: &Aggregate) -> String {
    let mut out = String::new();
    let mut names: Vec<&String> = agg.helpers.keys().collect();
    names.sort();

    for name in names {
        let helper = &agg.helpers[name];
        out.push_str(&format!("def {}(event, context):\n", helper.name));
        out.push_str(INDENT);
        out.push_str("env = event['env']\n");
        print_body(&helper.body, 1, &mut out);
        out.push_str(INDENT);
        out.push_str("return {'env': env}\n");
        out.push_str("\n\n");
    }

    // The router's body is a fixed three-line dispatcher with no
    // workflow-visible structure of its own; it's emitted as a literal
    // template rather than forced through the typed Stmt/Expr printer
    // above, since `globals()[funcName]` has no representation in the
    // restricted grammar this compiler accepts as input.
    if let Some(router) = &agg.router_func {
        out.push_str(&format!(
            "def {router}(event, context):\n{INDENT}funcName = event['func']\n{INDENT}func = globals()[funcName]\n{INDENT}return func(event, context)\n\n\n"
        ));
    }

    out
}

fn pad(indent: usize) -> String {
    INDENT.repeat(indent)
}

fn print_body(body: &[Stmt], indent: usize, out: &mut String) {
    if body.is_empty() {
        out.push_str(&pad(indent));
        out.push_str("pass\n");
        return;
    }
    for stmt in body {
        print_stmt(stmt, indent, out);
    }
}

fn print_stmt(stmt: &Stmt, indent: usize, out: &mut String) {
    let p = pad(indent);
    match stmt {
        Stmt::FunctionDef { name, params, body, .. } => {
            out.push_str(&format!("{p}def {name}({}):\n", params.join(", ")));
            print_body(body, indent + 1, out);
        }
        Stmt::If { test, body, orelse, .. } => {
            out.push_str(&format!("{p}if {}:\n", print_expr(test)));
            print_body(body, indent + 1, out);
            if !orelse.is_empty() {
                out.push_str(&format!("{p}else:\n"));
                print_body(orelse, indent + 1, out);
            }
        }
        Stmt::While { test, body, .. } => {
            out.push_str(&format!("{p}while {}:\n", print_expr(test)));
            print_body(body, indent + 1, out);
        }
        Stmt::For { target, iter, body, .. } => {
            out.push_str(&format!("{p}for {target} in {}:\n", print_expr(iter)));
            print_body(body, indent + 1, out);
        }
        Stmt::Try { body, handlers, .. } => {
            out.push_str(&format!("{p}try:\n"));
            print_body(body, indent + 1, out);
            for handler in handlers {
                let types = handler.types.join(", ");
                let bind = handler.bind_name.as_deref().map(|b| format!(" as {b}")).unwrap_or_default();
                out.push_str(&format!("{p}except {types}{bind}:\n"));
                print_body(&handler.body, indent + 1, out);
            }
        }
        Stmt::Break { .. } => out.push_str(&format!("{p}break\n")),
        Stmt::Return { value, .. } => match value {
            Some(v) => out.push_str(&format!("{p}return {}\n", print_expr(v))),
            None => out.push_str(&format!("{p}return\n")),
        },
        Stmt::Assign { target, value, .. } => out.push_str(&format!("{p}{target} = {}\n", print_expr(value))),
        Stmt::ExprStmt { value, .. } => out.push_str(&format!("{p}{}\n", print_expr(value))),
    }
}

fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Name { id, .. } => id.clone(),
        Expr::Literal { value, .. } => print_literal(value),
        Expr::Call { func, args, keywords, .. } => {
            let mut parts: Vec<String> = args.iter().map(print_expr).collect();
            parts.extend(keywords.iter().map(|(k, v)| format!("{k}={}", print_expr(v))));
            format!("{}({})", print_expr(func), parts.join(", "))
        }
        Expr::Attribute { value, attr, .. } => format!("{}.{attr}", print_expr(value)),
        Expr::Subscript { value, index, .. } => format!("{}[{}]", print_expr(value), print_expr(index)),
        Expr::UnaryOp { op, operand, .. } => {
            let symbol = match op {
                UnaryOperator::Not => "not ",
                UnaryOperator::Neg => "-",
            };
            format!("{symbol}{}", print_expr(operand))
        }
        Expr::Tuple { elts, .. } => format!("({})", elts.iter().map(print_expr).collect::<Vec<_>>().join(", ")),
        Expr::List { elts, .. } => format!("[{}]", elts.iter().map(print_expr).collect::<Vec<_>>().join(", ")),
        Expr::Dict { entries, .. } => {
            let parts: Vec<String> = entries.iter().map(|(k, v)| format!("{k}: {}", print_expr(v))).collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

fn print_literal(literal: &Literal) -> String {
    match literal {
        Literal::Num(n) if n.fract() == 0.0 => format!("{}", *n as i64),
        Literal::Num(n) => format!("{n}"),
        Literal::Str(s) => format!("{s:?}"),
        Literal::Bool(true) => "True".to_string(),
        Literal::Bool(false) => "False".to_string(),
        Literal::None => "None".to_string(),
    }
}
