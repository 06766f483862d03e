//! The source AST: struct-per-variant `enum`s with a `range` field on every
//! node, covering a restricted scripting subset — module, function-def, if,
//! while, for, try/except, break, return, assign, expression-statement,
//! call, name, subscript, attribute, literal, unary-op, tuple.
//!
//! The `green` field is the color tag: missing (i.e. freshly parsed) is
//! always `false` ("blue").

use enum_debug::EnumDebug;

use crate::location::TextRange;

/// A parsed module: a flat list of top-level statements (in practice, a
/// sequence of `FunctionDef`s).
#[derive(Clone, Debug)]
pub struct Module {
    pub body: Vec<Stmt>,
    pub range: TextRange,
}

#[derive(Clone, Debug, EnumDebug)]
pub enum Stmt {
    FunctionDef { name: String, params: Vec<String>, body: Vec<Stmt>, green: bool, range: TextRange },
    If { test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>, green: bool, range: TextRange },
    While { test: Expr, body: Vec<Stmt>, green: bool, range: TextRange },
    /// Parsed for completeness; always rejected downstream with
    /// `UnsupportedConstruct`.
    For { target: String, iter: Expr, body: Vec<Stmt>, green: bool, range: TextRange },
    Try { body: Vec<Stmt>, handlers: Vec<ExceptHandler>, green: bool, range: TextRange },
    Break { green: bool, range: TextRange },
    Return { value: Option<Expr>, green: bool, range: TextRange },
    Assign { target: String, value: Expr, green: bool, range: TextRange },
    /// An expression used as a statement (e.g. a void-context call).
    ExprStmt { value: Expr, green: bool, range: TextRange },
}

impl Stmt {
    pub fn range(&self) -> TextRange {
        match self {
            Stmt::FunctionDef { range, .. }
            | Stmt::If { range, .. }
            | Stmt::While { range, .. }
            | Stmt::For { range, .. }
            | Stmt::Try { range, .. }
            | Stmt::Break { range, .. }
            | Stmt::Return { range, .. }
            | Stmt::Assign { range, .. }
            | Stmt::ExprStmt { range, .. } => *range,
        }
    }

    pub fn is_green(&self) -> bool {
        match self {
            Stmt::FunctionDef { green, .. }
            | Stmt::If { green, .. }
            | Stmt::While { green, .. }
            | Stmt::For { green, .. }
            | Stmt::Try { green, .. }
            | Stmt::Break { green, .. }
            | Stmt::Return { green, .. }
            | Stmt::Assign { green, .. }
            | Stmt::ExprStmt { green, .. } => *green,
        }
    }

    pub fn set_green(&mut self, value: bool) {
        let slot = match self {
            Stmt::FunctionDef { green, .. }
            | Stmt::If { green, .. }
            | Stmt::While { green, .. }
            | Stmt::For { green, .. }
            | Stmt::Try { green, .. }
            | Stmt::Break { green, .. }
            | Stmt::Return { green, .. }
            | Stmt::Assign { green, .. }
            | Stmt::ExprStmt { green, .. } => green,
        };
        *slot = value;
    }
}

/// An `except` clause of a `try` statement.
#[derive(Clone, Debug)]
pub struct ExceptHandler {
    pub types: Vec<String>,
    pub bind_name: Option<String>,
    pub body: Vec<Stmt>,
    pub range: TextRange,
}

#[derive(Clone, Debug, EnumDebug)]
pub enum Expr {
    Name { id: String, range: TextRange },
    Literal { value: Literal, range: TextRange },
    Call { func: Box<Expr>, args: Vec<Expr>, keywords: Vec<(String, Expr)>, green: bool, range: TextRange },
    Attribute { value: Box<Expr>, attr: String, range: TextRange },
    Subscript { value: Box<Expr>, index: Box<Expr>, range: TextRange },
    UnaryOp { op: UnaryOperator, operand: Box<Expr>, range: TextRange },
    Tuple { elts: Vec<Expr>, range: TextRange },
    /// A `[...]` literal. Only used in source for call-keyword values (e.g.
    /// a `retry=[...]` list of retry-rule dicts); never appears as a
    /// variable reference and is never colored green.
    List { elts: Vec<Expr>, range: TextRange },
    /// A `{key: value, ...}` literal with bare-identifier keys, used for
    /// retry-rule dicts.
    Dict { entries: Vec<(String, Expr)>, range: TextRange },
}

impl Expr {
    pub fn range(&self) -> TextRange {
        match self {
            Expr::Name { range, .. }
            | Expr::Literal { range, .. }
            | Expr::Call { range, .. }
            | Expr::Attribute { range, .. }
            | Expr::Subscript { range, .. }
            | Expr::UnaryOp { range, .. }
            | Expr::Tuple { range, .. }
            | Expr::List { range, .. }
            | Expr::Dict { range, .. } => *range,
        }
    }

    /// Renders the dotted-name source text of an attribute/name chain (used
    /// for callee strings like `cohesion.Lambda.foo`). Returns `None` if the
    /// expression isn't a pure name/attribute chain.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Name { id, .. } => Some(id.clone()),
            Expr::Attribute { value, attr, .. } => value.dotted_name().map(|base| format!("{base}.{attr}")),
            _ => None,
        }
    }

    pub fn is_name(&self) -> bool {
        matches!(self, Expr::Name { .. })
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Literal { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Num(f64),
    Str(String),
    Bool(bool),
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumDebug)]
pub enum UnaryOperator {
    Not,
    Neg,
}
