//! The cross-IR carrier object threaded through the back half of the
//! pipeline: generated helpers, finished workflows, the optional router
//! function, and per-workflow layout graphs all accumulate here.

use std::collections::HashMap;

use cohesion_dsl::ast::Stmt;

use crate::cir::Cir;
use crate::wir::Workflow;

/// A generated helper function: an ordinary-code function with the
/// conventional `(event, context)` entry point, produced by helper
/// extraction from a CIR `RawBlock`. Its body still expects `env` to be
/// bound in scope; the prologue/epilogue are added at emission time.
#[derive(Clone, Debug)]
pub struct HelperFunction {
    pub name: String,
    pub body: Vec<Stmt>,
}

#[derive(Default)]
pub struct Aggregate {
    pub cir: Option<Cir>,
    pub helpers: HashMap<String, HelperFunction>,
    pub workflows: Vec<Workflow>,
    pub router_func: Option<String>,
    pub graphs: HashMap<String, crate::emit::graph_json::Graph>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_helper(&mut self, helper: HelperFunction) {
        self.helpers.insert(helper.name.clone(), helper);
    }
}
