//! The control-flow IR: one tagged sum covering every statement shape the
//! colored, lifted source can still contain once it's ready for the WIR
//! builder.

use cohesion_dsl::ast::Stmt;
use cohesion_dsl::TextRange;
use enum_debug::EnumDebug;
use specifications::RetryRule;

#[derive(Clone, Debug, EnumDebug)]
pub enum Cir {
    Module { defs: Vec<Cir> },
    FunctionDef { name: String, params: Vec<String>, body: Vec<Cir>, range: TextRange },
    /// A contiguous run of source statements with no workflow-visible
    /// operation; removed by helper extraction before the WIR builder runs.
    RawBlock { nodes: Vec<Stmt>, range: TextRange },
    Call { callee: String, args: Vec<String>, timeout_sec: Option<i64>, heartbeat_sec: Option<i64>, retry: Vec<RetryRule>, range: TextRange },
    /// The right-hand side is always a `Call`.
    Assign { target: String, value: Box<Cir>, range: TextRange },
    If { test_var: String, then_body: Vec<Cir>, else_body: Vec<Cir>, range: TextRange },
    /// The test is always the literal `true` by this point — lifting has
    /// already rewritten every loop exit into an `if`/`break` inside the
    /// body, so the original test expression is never retained here.
    WhileLoop { body: Vec<Cir>, range: TextRange },
    Break { range: TextRange },
    Return { var_name: Option<String>, range: TextRange },
    Try { body: Vec<Cir>, handlers: Vec<CirHandler>, range: TextRange },
}

#[derive(Clone, Debug)]
pub struct CirHandler {
    pub error_types: Vec<String>,
    pub bind_name: Option<String>,
    pub body: Vec<Cir>,
}

impl Cir {
    pub fn range(&self) -> TextRange {
        match self {
            Cir::Module { .. } => TextRange::default(),
            Cir::FunctionDef { range, .. }
            | Cir::RawBlock { range, .. }
            | Cir::Call { range, .. }
            | Cir::Assign { range, .. }
            | Cir::If { range, .. }
            | Cir::WhileLoop { range, .. }
            | Cir::Break { range, .. }
            | Cir::Return { range, .. }
            | Cir::Try { range, .. } => *range,
        }
    }

    /// True iff no `RawBlock` remains anywhere in this subtree; checked
    /// right after helper extraction, which is the one pass responsible for
    /// clearing every `RawBlock` out of the tree.
    pub fn has_no_raw_blocks(&self) -> bool {
        match self {
            Cir::RawBlock { .. } => false,
            Cir::Module { defs } => defs.iter().all(Cir::has_no_raw_blocks),
            Cir::FunctionDef { body, .. } | Cir::WhileLoop { body, .. } => body.iter().all(Cir::has_no_raw_blocks),
            Cir::If { then_body, else_body, .. } => then_body.iter().all(Cir::has_no_raw_blocks) && else_body.iter().all(Cir::has_no_raw_blocks),
            Cir::Try { body, handlers, .. } => body.iter().all(Cir::has_no_raw_blocks) && handlers.iter().all(|h| h.body.iter().all(Cir::has_no_raw_blocks)),
            Cir::Assign { value, .. } => value.has_no_raw_blocks(),
            Cir::Call { .. } | Cir::Break { .. } | Cir::Return { .. } => true,
        }
    }
}
