//! Compilation-scoped mutable state, collected into a handful of small
//! structs that get threaded explicitly through every pass rather than
//! living as module-level globals.

use std::collections::{HashMap, HashSet};

use cohesion_dsl::ast::{Expr, Module, Stmt};

/// Fresh-name supply over the identifiers used by the source program,
/// grounded on `src/gensym.py`'s `GenSym`. Used only by the lifting pass
/// (`a_`, `call_`, `test_`, `ret_` prefixes); the WIR builder's state names
/// come from a disjoint [`StateNameTable`], matching the source's separate
/// `GenStateName` class.
#[derive(Debug, Default)]
pub struct NameTable {
    used: HashSet<String>,
}

impl NameTable {
    pub fn from_module(module: &Module) -> Self {
        let mut used = HashSet::new();
        for stmt in &module.body {
            collect_stmt_names(stmt, &mut used);
        }
        Self { used }
    }

    /// Returns a name `prefix_N` for the smallest `N >= 1` not yet handed out.
    pub fn fresh(&mut self, prefix: &str) -> String {
        let mut n = 1;
        loop {
            let candidate = format!("{prefix}_{n}");
            if !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return candidate;
            }
            n += 1;
        }
    }
}

fn collect_stmt_names(stmt: &Stmt, used: &mut HashSet<String>) {
    match stmt {
        Stmt::FunctionDef { name, params, body, .. } => {
            used.insert(name.clone());
            used.extend(params.iter().cloned());
            body.iter().for_each(|s| collect_stmt_names(s, used));
        }
        Stmt::If { test, body, orelse, .. } => {
            collect_expr_names(test, used);
            body.iter().for_each(|s| collect_stmt_names(s, used));
            orelse.iter().for_each(|s| collect_stmt_names(s, used));
        }
        Stmt::While { test, body, .. } => {
            collect_expr_names(test, used);
            body.iter().for_each(|s| collect_stmt_names(s, used));
        }
        Stmt::For { target, iter, body, .. } => {
            used.insert(target.clone());
            collect_expr_names(iter, used);
            body.iter().for_each(|s| collect_stmt_names(s, used));
        }
        Stmt::Try { body, handlers, .. } => {
            body.iter().for_each(|s| collect_stmt_names(s, used));
            for h in handlers {
                if let Some(bind) = &h.bind_name {
                    used.insert(bind.clone());
                }
                h.body.iter().for_each(|s| collect_stmt_names(s, used));
            }
        }
        Stmt::Break { .. } => {}
        Stmt::Return { value, .. } => {
            if let Some(v) = value {
                collect_expr_names(v, used);
            }
        }
        Stmt::Assign { target, value, .. } => {
            used.insert(target.clone());
            collect_expr_names(value, used);
        }
        Stmt::ExprStmt { value, .. } => collect_expr_names(value, used),
    }
}

fn collect_expr_names(expr: &Expr, used: &mut HashSet<String>) {
    match expr {
        Expr::Name { id, .. } => {
            used.insert(id.clone());
        }
        Expr::Literal { .. } => {}
        Expr::Call { func, args, keywords, .. } => {
            collect_expr_names(func, used);
            args.iter().for_each(|a| collect_expr_names(a, used));
            keywords.iter().for_each(|(_, v)| collect_expr_names(v, used));
        }
        Expr::Attribute { value, .. } => collect_expr_names(value, used),
        Expr::Subscript { value, index, .. } => {
            collect_expr_names(value, used);
            collect_expr_names(index, used);
        }
        Expr::UnaryOp { operand, .. } => collect_expr_names(operand, used),
        Expr::Tuple { elts, .. } | Expr::List { elts, .. } => elts.iter().for_each(|e| collect_expr_names(e, used)),
        Expr::Dict { entries, .. } => entries.iter().for_each(|(_, v)| collect_expr_names(v, used)),
    }
}

/// A `(row, column)` layout cursor, grounded on `src/layoutState.py`'s
/// `Position`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn inc_row(&mut self) {
        self.row += 1;
    }

    pub fn move_down(&mut self, n: usize) {
        self.row += n;
    }
}

/// A stack of layout cursors, one per nested "column" of parallel control
/// flow (then/else branches, try handlers). Grounded on `layoutState.py`'s
/// `LayoutState`.
#[derive(Debug)]
pub struct LayoutState {
    stack: Vec<Position>,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self { stack: vec![Position::default()] }
    }
}

impl LayoutState {
    /// Returns the current position and advances the row cursor.
    pub fn get(&mut self) -> Position {
        let pos = *self.stack.last().unwrap();
        self.stack.last_mut().unwrap().inc_row();
        pos
    }

    pub fn peek(&self) -> Position {
        *self.stack.last().unwrap()
    }

    pub fn push(&mut self, pos: Position) {
        self.stack.push(pos);
    }

    /// Pushes a new cursor one column to the right of the current one.
    pub fn push_column(&mut self) -> Position {
        let mut pos = self.peek();
        pos.column += 1;
        self.stack.push(pos);
        pos
    }

    pub fn pop(&mut self) -> Position {
        assert!(self.stack.len() > 1, "layout stack underflow");
        self.stack.pop().unwrap()
    }

    /// Raises the current cursor's row to `pos.row` if that's deeper.
    pub fn update_row(&mut self, pos: Position) {
        let top = self.stack.last_mut().unwrap();
        if pos.row > top.row {
            top.row = pos.row;
        }
    }
}

/// Fresh state-name supply for the WIR builder, disjoint from
/// [`NameTable`]; grounded on `src/aws/asfast.py`'s `GenStateName`.
#[derive(Debug, Default)]
pub struct StateNameTable {
    used: HashSet<String>,
}

impl StateNameTable {
    /// Returns `prefix` itself if free, else `prefix_N` for the smallest
    /// free `N >= 1` — matching `GenStateName.gen`'s "bare prefix first"
    /// behavior, which lets single-use states (like a workflow's one
    /// `getData` task) keep a readable name.
    pub fn gen(&mut self, prefix: &str) -> String {
        if !self.used.contains(prefix) {
            self.used.insert(prefix.to_string());
            return prefix.to_string();
        }
        let mut n = 0;
        loop {
            let candidate = format!("{prefix}_{n}");
            if !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return candidate;
            }
            n += 1;
        }
    }
}

/// One `except` handler pushed onto the exception-handler stack while
/// translating a `Try`'s body; grounded on `asfast.py`'s `HandlerReference`.
#[derive(Clone, Debug)]
pub struct HandlerRef {
    pub error_types: Vec<String>,
    pub state_name: String,
}

/// Per-workflow builder state: break targets, the exception-handler stack
/// and its derived catch map, and the layout cursor. Reinitialized fresh for
/// each CIR function translated; nothing here survives across workflows.
#[derive(Debug, Default)]
pub struct BuilderState {
    pub break_targets: Vec<String>,
    pub handler_stack: Vec<HandlerRef>,
    pub layout: LayoutState,
}

impl BuilderState {
    /// The currently-effective catch map: for each error type, the state
    /// name of the topmost handler on the stack that lists it (innermost
    /// wins, matching `asfast.py`'s bottom-to-top fold over
    /// `exception_handler_stack`).
    pub fn catch_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for handler in &self.handler_stack {
            for ty in &handler.error_types {
                map.insert(ty.clone(), handler.state_name.clone());
            }
        }
        map
    }
}
