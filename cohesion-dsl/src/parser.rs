//! Recursive-descent parser over the token stream produced by
//! [`crate::lexer`]: per-construct `parse_*` functions returning AST nodes
//! with attached `TextRange`s.

use crate::ast::{ExceptHandler, Expr, Literal, Module, Stmt, UnaryOperator};
use crate::errors::ParseError;
use crate::lexer::{lex, Token, TokenKind};
use crate::location::TextRange;

pub fn parse(source: &str) -> Result<Module, ParseError> {
    let tokens = lex(source)?;
    Parser { tokens, pos: 0 }.parse_module()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_range(&self) -> TextRange {
        self.tokens[self.pos].range
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken { expected: format!("{kind:?}"), found: format!("{:?}", self.peek()), range: self.peek_range() })
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), TokenKind::Newline) {
            self.advance();
        }
    }

    /// Parses a whole module: a sequence of statements until EOF.
    fn parse_module(&mut self) -> Result<Module, ParseError> {
        let start = self.peek_range();
        self.skip_newlines();
        let mut body = Vec::new();
        while !matches!(self.peek(), TokenKind::Eof) {
            body.push(self.parse_stmt()?);
            self.skip_newlines();
        }
        let end = self.peek_range();
        Ok(Module { body, range: start.merge(&end) })
    }

    /// Parses an indented block: `:` NEWLINE INDENT stmt+ DEDENT.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek(), TokenKind::Dedent) {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::Dedent)?;
        if stmts.is_empty() {
            return Err(ParseError::ExpectedIndent { range: self.peek_range() });
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            TokenKind::Def => self.parse_function_def(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Return => self.parse_return(),
            _ => self.parse_simple_stmt(),
        }
    }

    fn parse_function_def(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_range();
        self.expect(TokenKind::Def)?;
        let name = self.parse_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            params.push(self.parse_ident()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        let end = body.last().map(|s| s.range()).unwrap_or(start);
        Ok(Stmt::FunctionDef { name, params, body, green: false, range: start.merge(&end) })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_range();
        self.expect(TokenKind::If)?;
        let test = self.parse_expr()?;
        let body = self.parse_block()?;
        self.skip_newlines();
        let orelse = if self.check(&TokenKind::Elif) {
            // desugar `elif` into a nested `if` in the `else` branch
            vec![self.parse_if()?]
        } else if self.check(&TokenKind::Else) {
            self.advance();
            self.parse_block()?
        } else {
            Vec::new()
        };
        let end = orelse.last().or_else(|| body.last()).map(|s| s.range()).unwrap_or(start);
        Ok(Stmt::If { test, body, orelse, green: false, range: start.merge(&end) })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_range();
        self.expect(TokenKind::While)?;
        let test = self.parse_expr()?;
        let body = self.parse_block()?;
        let end = body.last().map(|s| s.range()).unwrap_or(start);
        Ok(Stmt::While { test, body, green: false, range: start.merge(&end) })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_range();
        self.expect(TokenKind::For)?;
        let target = self.parse_ident()?;
        self.expect(TokenKind::In)?;
        let iter = self.parse_expr()?;
        let body = self.parse_block()?;
        let end = body.last().map(|s| s.range()).unwrap_or(start);
        Ok(Stmt::For { target, iter, body, green: false, range: start.merge(&end) })
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_range();
        self.expect(TokenKind::Try)?;
        let body = self.parse_block()?;
        let mut handlers = Vec::new();
        self.skip_newlines();
        while self.check(&TokenKind::Except) {
            let h_start = self.peek_range();
            self.advance();
            let mut types = Vec::new();
            if !self.check(&TokenKind::Colon) {
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    while !self.check(&TokenKind::RParen) {
                        types.push(self.parse_ident()?);
                        if self.check(&TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                } else {
                    types.push(self.parse_ident()?);
                }
            }
            let bind_name = if self.check(&TokenKind::As) {
                self.advance();
                Some(self.parse_ident()?)
            } else {
                None
            };
            let h_body = self.parse_block()?;
            let h_end = h_body.last().map(|s| s.range()).unwrap_or(h_start);
            handlers.push(ExceptHandler { types, bind_name, body: h_body, range: h_start.merge(&h_end) });
            self.skip_newlines();
        }
        let end = handlers.last().map(|h| h.range).or_else(|| body.last().map(|s| s.range())).unwrap_or(start);
        Ok(Stmt::Try { body, handlers, green: false, range: start.merge(&end) })
    }

    fn parse_break(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_range();
        self.expect(TokenKind::Break)?;
        self.end_simple_stmt()?;
        Ok(Stmt::Break { green: false, range: start })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_range();
        self.expect(TokenKind::Return)?;
        let value = if matches!(self.peek(), TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent) { None } else { Some(self.parse_expr()?) };
        let end = value.as_ref().map(|v| v.range()).unwrap_or(start);
        self.end_simple_stmt()?;
        Ok(Stmt::Return { value, green: false, range: start.merge(&end) })
    }

    /// An assignment (`name = expr`) or a bare expression statement.
    fn parse_simple_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_range();
        let expr = self.parse_expr()?;
        if self.check(&TokenKind::Assign) {
            self.advance();
            let target = match &expr {
                Expr::Name { id, .. } => id.clone(),
                _ => return Err(ParseError::UnexpectedToken { expected: "assignment target name".into(), found: format!("{expr:?}"), range: expr.range() }),
            };
            let value = self.parse_expr()?;
            let end = value.range();
            self.end_simple_stmt()?;
            return Ok(Stmt::Assign { target, value, green: false, range: start.merge(&end) });
        }
        let end = expr.range();
        self.end_simple_stmt()?;
        Ok(Stmt::ExprStmt { value: expr, green: false, range: start.merge(&end) })
    }

    fn end_simple_stmt(&mut self) -> Result<(), ParseError> {
        if matches!(self.peek(), TokenKind::Newline) {
            self.advance();
        } else if !matches!(self.peek(), TokenKind::Eof | TokenKind::Dedent) {
            return Err(ParseError::UnexpectedToken { expected: "end of statement".into(), found: format!("{:?}", self.peek()), range: self.peek_range() });
        }
        Ok(())
    }

    fn parse_ident(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::UnexpectedToken { expected: "identifier".into(), found: format!("{other:?}"), range: self.peek_range() }),
        }
    }

    // --- expressions, by ascending precedence ---

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_not()
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Not) {
            let start = self.peek_range();
            self.advance();
            let operand = self.parse_not()?;
            let range = start.merge(&operand.range());
            return Ok(Expr::UnaryOp { op: UnaryOperator::Not, operand: Box::new(operand), range });
        }
        self.parse_unary()
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Minus) {
            let start = self.peek_range();
            self.advance();
            let operand = self.parse_unary()?;
            let range = start.merge(&operand.range());
            return Ok(Expr::UnaryOp { op: UnaryOperator::Neg, operand: Box::new(operand), range });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let attr = self.parse_ident()?;
                    let range = expr.range().merge(&self.tokens[self.pos - 1].range);
                    expr = Expr::Attribute { value: Box::new(expr), attr, range };
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    let mut keywords = Vec::new();
                    while !self.check(&TokenKind::RParen) {
                        if let TokenKind::Ident(name) = self.peek().clone() {
                            if self.tokens.get(self.pos + 1).map(|t| &t.kind) == Some(&TokenKind::Assign) {
                                self.advance();
                                self.advance();
                                let value = self.parse_expr()?;
                                keywords.push((name, value));
                                if self.check(&TokenKind::Comma) {
                                    self.advance();
                                }
                                continue;
                            }
                        }
                        args.push(self.parse_expr()?);
                        if self.check(&TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    let close = self.expect(TokenKind::RParen)?;
                    let range = expr.range().merge(&close.range);
                    expr = Expr::Call { func: Box::new(expr), args, keywords, green: false, range };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let close = self.expect(TokenKind::RBracket)?;
                    let range = expr.range().merge(&close.range);
                    expr = Expr::Subscript { value: Box::new(expr), index: Box::new(index), range };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let range = self.peek_range();
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Name { id: name, range })
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal { value: Literal::Num(n), range })
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal { value: Literal::Str(s), range })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal { value: Literal::Bool(true), range })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal { value: Literal::Bool(false), range })
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::Literal { value: Literal::None, range })
            }
            TokenKind::LParen => {
                self.advance();
                if self.check(&TokenKind::RParen) {
                    let close = self.advance();
                    return Ok(Expr::Tuple { elts: Vec::new(), range: range.merge(&close.range) });
                }
                let mut first = self.parse_expr()?;
                if self.check(&TokenKind::Comma) {
                    let mut elts = vec![first];
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        if self.check(&TokenKind::RParen) {
                            break;
                        }
                        elts.push(self.parse_expr()?);
                    }
                    let close = self.expect(TokenKind::RParen)?;
                    let r = range.merge(&close.range);
                    return Ok(Expr::Tuple { elts, range: r });
                }
                let close = self.expect(TokenKind::RParen)?;
                first.set_range_hint(range.merge(&close.range));
                Ok(first)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elts = Vec::new();
                while !self.check(&TokenKind::RBracket) {
                    elts.push(self.parse_expr()?);
                    if self.check(&TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                let close = self.expect(TokenKind::RBracket)?;
                Ok(Expr::List { elts, range: range.merge(&close.range) })
            }
            TokenKind::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                while !self.check(&TokenKind::RBrace) {
                    let key = self.parse_ident()?;
                    self.expect(TokenKind::Colon)?;
                    let value = self.parse_expr()?;
                    entries.push((key, value));
                    if self.check(&TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                let close = self.expect(TokenKind::RBrace)?;
                Ok(Expr::Dict { entries, range: range.merge(&close.range) })
            }
            other => Err(ParseError::UnexpectedToken { expected: "expression".into(), found: format!("{other:?}"), range }),
        }
    }
}

impl Expr {
    /// Widens a parenthesized expression's reported range to include the
    /// parens, without otherwise altering the node.
    fn set_range_hint(&mut self, range: TextRange) {
        let slot = match self {
            Expr::Name { range, .. }
            | Expr::Literal { range, .. }
            | Expr::Call { range, .. }
            | Expr::Attribute { range, .. }
            | Expr::Subscript { range, .. }
            | Expr::UnaryOp { range, .. }
            | Expr::Tuple { range, .. }
            | Expr::List { range, .. }
            | Expr::Dict { range, .. } => range,
        };
        *slot = range;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_function() {
        let module = parse("def f():\n    x = 1\n    return x\n").unwrap();
        assert_eq!(module.body.len(), 1);
        assert!(matches!(module.body[0], Stmt::FunctionDef { .. }));
    }

    #[test]
    fn parses_dotted_call() {
        let module = parse("def f():\n    cohesion.activity.getData(timeoutSeconds=120)\n").unwrap();
        let Stmt::FunctionDef { body, .. } = &module.body[0] else { panic!() };
        let Stmt::ExprStmt { value, .. } = &body[0] else { panic!() };
        let Expr::Call { func, keywords, .. } = value else { panic!() };
        assert_eq!(func.dotted_name().as_deref(), Some("cohesion.activity.getData"));
        assert_eq!(keywords.len(), 1);
    }

    #[test]
    fn parses_if_else() {
        let module = parse("def f():\n    if x:\n        a = 1\n    else:\n        b = 2\n").unwrap();
        let Stmt::FunctionDef { body, .. } = &module.body[0] else { panic!() };
        assert!(matches!(body[0], Stmt::If { .. }));
    }
}
