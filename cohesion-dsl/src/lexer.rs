//! Hand-written indentation-sensitive lexer.
//!
//! A brace-delimited grammar scans well with combinator parsing, but that
//! approach doesn't compose well with Python-style significant whitespace,
//! where INDENT/DEDENT tokens depend on a running indentation stack rather
//! than local lookahead
//! — so this lexer is a plain hand-rolled state machine instead. See
//! DESIGN.md for the dependency-drop note (no `nom` here).

use enum_debug::EnumDebug;

use crate::errors::ParseError;
use crate::location::{TextPos, TextRange};

#[derive(Clone, Debug, PartialEq, EnumDebug)]
pub enum TokenKind {
    Indent,
    Dedent,
    Newline,
    Eof,

    Ident(String),
    Number(f64),
    Str(String),

    Def,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Try,
    Except,
    As,
    Break,
    Return,
    True,
    False,
    None,
    Not,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Assign,
    Minus,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

pub fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    paren_depth: i32,
    indents: Vec<usize>,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            paren_depth: 0,
            indents: vec![0],
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn pos_here(&self) -> TextPos {
        TextPos::new(self.line, self.col)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, start: TextPos) {
        let end = self.pos_here();
        self.tokens.push(Token { kind, range: TextRange::new(start, end) });
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        loop {
            if self.at_line_start && self.paren_depth == 0 {
                self.handle_indentation()?;
            }
            self.skip_intraline_whitespace_and_comments();

            let Some(c) = self.peek() else { break };

            if c == '\n' {
                self.advance();
                if self.paren_depth == 0 {
                    // Only emit NEWLINE if the line produced real tokens.
                    if matches!(self.tokens.last().map(|t| &t.kind), Some(TokenKind::Newline) | None) {
                        // blank line, nothing to terminate
                    } else {
                        let start = self.pos_here();
                        self.push(TokenKind::Newline, start);
                    }
                    self.at_line_start = true;
                }
                continue;
            }

            let start = self.pos_here();
            if c.is_ascii_digit() {
                self.lex_number(start)?;
            } else if c == '"' || c == '\'' {
                self.lex_string(start)?;
            } else if c.is_alphabetic() || c == '_' {
                self.lex_ident_or_keyword(start);
            } else {
                self.lex_punct(start)?;
            }
        }

        // EOF: close out any open logical line and unwind indentation.
        if !matches!(self.tokens.last().map(|t| &t.kind), Some(TokenKind::Newline) | None) {
            let p = self.pos_here();
            self.push(TokenKind::Newline, p);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            let p = self.pos_here();
            self.push(TokenKind::Dedent, p);
        }
        let p = self.pos_here();
        self.push(TokenKind::Eof, p);
        Ok(self.tokens)
    }

    fn handle_indentation(&mut self) {
        // Measure leading whitespace of this physical line, skipping blank
        // and comment-only lines entirely (they carry no indentation
        // significance).
        loop {
            let save = self.pos;
            let save_line = self.line;
            let save_col = self.col;
            let mut width = 0usize;
            while let Some(c) = self.peek() {
                if c == ' ' {
                    width += 1;
                    self.advance();
                } else if c == '\t' {
                    width += 8;
                    self.advance();
                } else {
                    break;
                }
            }
            match self.peek() {
                None => {
                    self.pos = save;
                    self.line = save_line;
                    self.col = save_col;
                    return;
                }
                Some('\n') | Some('#') => {
                    // blank or comment-only line: consume to end-of-line and retry
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    if self.peek() == Some('\n') {
                        self.advance();
                    }
                    continue;
                }
                Some(_) => {
                    self.at_line_start = false;
                    let current = *self.indents.last().unwrap();
                    if width > current {
                        self.indents.push(width);
                        let p = self.pos_here();
                        self.push(TokenKind::Indent, p);
                    } else {
                        while width < *self.indents.last().unwrap() {
                            self.indents.pop();
                            let p = self.pos_here();
                            self.push(TokenKind::Dedent, p);
                        }
                    }
                    return;
                }
            }
        }
    }

    fn skip_intraline_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn lex_number(&mut self, start: TextPos) -> Result<(), ParseError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let value: f64 = text.parse().map_err(|_| ParseError::InvalidNumber { text: text.clone(), range: TextRange::new(start, self.pos_here()) })?;
        self.push(TokenKind::Number(value), start);
        Ok(())
    }

    fn lex_string(&mut self, start: TextPos) -> Result<(), ParseError> {
        let quote = self.advance().unwrap();
        let mut text = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => {
                    if let Some(escaped) = self.advance() {
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    }
                }
                Some(c) => text.push(c),
                None => return Err(ParseError::UnterminatedString { range: TextRange::new(start, self.pos_here()) }),
            }
        }
        self.push(TokenKind::Str(text), start);
        Ok(())
    }

    fn lex_ident_or_keyword(&mut self, start: TextPos) {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match text.as_str() {
            "def" => TokenKind::Def,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "try" => TokenKind::Try,
            "except" => TokenKind::Except,
            "as" => TokenKind::As,
            "break" => TokenKind::Break,
            "return" => TokenKind::Return,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            "not" => TokenKind::Not,
            _ => TokenKind::Ident(text),
        };
        self.push(kind, start);
    }

    fn lex_punct(&mut self, start: TextPos) -> Result<(), ParseError> {
        let c = self.advance().unwrap();
        let kind = match c {
            '(' => {
                self.paren_depth += 1;
                TokenKind::LParen
            }
            ')' => {
                self.paren_depth -= 1;
                TokenKind::RParen
            }
            '[' => {
                self.paren_depth += 1;
                TokenKind::LBracket
            }
            ']' => {
                self.paren_depth -= 1;
                TokenKind::RBracket
            }
            '{' => {
                self.paren_depth += 1;
                TokenKind::LBrace
            }
            '}' => {
                self.paren_depth -= 1;
                TokenKind::RBrace
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '-' => TokenKind::Minus,
            '=' => TokenKind::Assign,
            other => return Err(ParseError::UnexpectedChar { found: other, range: TextRange::new(start, self.pos_here()) }),
        };
        self.push(kind, start);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_balance() {
        let toks = lex("def f():\n    x = 1\n    return x\n").unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| &t.kind).collect();
        assert!(kinds.contains(&&TokenKind::Indent));
        assert!(kinds.contains(&&TokenKind::Dedent));
        assert_eq!(kinds.last(), Some(&&TokenKind::Eof));
    }

    #[test]
    fn string_and_number_literals() {
        let toks = lex("x = 1\ny = \"hi\"\n").unwrap();
        assert!(toks.iter().any(|t| matches!(t.kind, TokenKind::Number(n) if n == 1.0)));
        assert!(toks.iter().any(|t| matches!(&t.kind, TokenKind::Str(s) if s == "hi")));
    }
}
