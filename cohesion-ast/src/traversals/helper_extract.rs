//! Helper extraction: every `RawBlock` becomes its own ordinary function,
//! registered in the aggregate and referenced from the CIR by a bare-name
//! `Call` with no arguments.

use crate::aggregate::{Aggregate, HelperFunction};
use crate::cir::Cir;
use crate::state::NameTable;

pub fn extract(cir: Cir, agg: &mut Aggregate, names: &mut NameTable) -> Cir {
    match cir {
        Cir::Module { defs } => Cir::Module { defs: extract_list(defs, "func", agg, names) },
        other => other,
    }
}

fn extract_list(defs: Vec<Cir>, enclosing_name: &str, agg: &mut Aggregate, names: &mut NameTable) -> Vec<Cir> {
    defs.into_iter().map(|d| extract_node(d, enclosing_name, agg, names)).collect()
}

fn extract_node(node: Cir, enclosing_name: &str, agg: &mut Aggregate, names: &mut NameTable) -> Cir {
    match node {
        Cir::RawBlock { nodes, range } => {
            let helper_name = names.fresh(&format!("{enclosing_name}_func"));
            agg.add_helper(HelperFunction { name: helper_name.clone(), body: nodes });
            Cir::Call { callee: helper_name, args: Vec::new(), timeout_sec: None, heartbeat_sec: None, retry: Vec::new(), range }
        }
        Cir::FunctionDef { name, params, body, range } => {
            let body = extract_list(body, &name, agg, names);
            Cir::FunctionDef { name, params, body, range }
        }
        Cir::If { test_var, then_body, else_body, range } => Cir::If {
            test_var,
            then_body: extract_list(then_body, enclosing_name, agg, names),
            else_body: extract_list(else_body, enclosing_name, agg, names),
            range,
        },
        Cir::WhileLoop { body, range } => Cir::WhileLoop { body: extract_list(body, enclosing_name, agg, names), range },
        Cir::Try { body, handlers, range } => {
            let body = extract_list(body, enclosing_name, agg, names);
            let handlers = handlers
                .into_iter()
                .map(|h| crate::cir::CirHandler { body: extract_list(h.body, enclosing_name, agg, names), ..h })
                .collect();
            Cir::Try { body, handlers, range }
        }
        Cir::Assign { target, value, range } => Cir::Assign { target, value: Box::new(extract_node(*value, enclosing_name, agg, names)), range },
        leaf @ (Cir::Call { .. } | Cir::Break { .. } | Cir::Return { .. } | Cir::Module { .. }) => leaf,
    }
}

#[cfg(test)]
mod tests {
    use cohesion_dsl::TextRange;

    use super::*;

    fn raw_block() -> Cir {
        Cir::RawBlock { nodes: Vec::new(), range: TextRange::default() }
    }

    #[test]
    fn raw_block_becomes_a_bare_helper_call() {
        let mut agg = Aggregate::new();
        let mut names = NameTable::default();
        let cir = Cir::Module {
            defs: vec![Cir::FunctionDef { name: "f".to_string(), params: Vec::new(), body: vec![raw_block()], range: TextRange::default() }],
        };

        let extracted = extract(cir, &mut agg, &mut names);
        let Cir::Module { defs } = extracted else { panic!() };
        let Cir::FunctionDef { body, .. } = &defs[0] else { panic!() };
        let Cir::Call { callee, args, .. } = &body[0] else { panic!("raw block should become a call") };
        assert!(args.is_empty(), "a helper call takes no CIR arguments, it reads env instead");
        assert!(agg.helpers.contains_key(callee));
    }

    #[test]
    fn two_raw_blocks_get_distinct_helper_names() {
        let mut agg = Aggregate::new();
        let mut names = NameTable::default();
        let cir = Cir::Module {
            defs: vec![Cir::FunctionDef { name: "f".to_string(), params: Vec::new(), body: vec![raw_block(), raw_block()], range: TextRange::default() }],
        };

        let extracted = extract(cir, &mut agg, &mut names);
        let Cir::Module { defs } = extracted else { panic!() };
        let Cir::FunctionDef { body, .. } = &defs[0] else { panic!() };
        let (Cir::Call { callee: a, .. }, Cir::Call { callee: b, .. }) = (&body[0], &body[1]) else { panic!() };
        assert_ne!(a, b);
        assert_eq!(agg.helpers.len(), 2);
    }
}
