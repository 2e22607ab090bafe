//! Parser for one-line IR expressions.
//!
//! The grammar is keyword-prefixed, parenthesized and comma-separated:
//! an operator token (`MOVE`, `MEM`, `+`, `-`, `*`, `/`) followed by a
//! parenthesized list becomes an internal node, `CONST`/`TEMP` consume one
//! following token as their literal value, and any other bare token becomes
//! an opaque leaf carrying its own text.

use super::{ExprTree, NodeId, NodeKind};
use crate::error::{SelectError, SelectResult};

/// Parses one line of IR text. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> SelectResult<Option<ExprTree>> {
    let tokens = tokenize(line);
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        tree: ExprTree::new(),
    };
    let root = parser.parse_expr()?;
    if let Some(extra) = parser.peek() {
        return Err(SelectError::TrailingInput {
            found: extra.text(),
        });
    }
    parser.tree.set_root(root);
    Ok(Some(parser.tree))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Open,
    Close,
    Comma,
    Word(&'a str),
}

impl Token<'_> {
    fn text(&self) -> String {
        match self {
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
            Token::Comma => ",".to_string(),
            Token::Word(word) => (*word).to_string(),
        }
    }
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut word_start = None;
    for (idx, ch) in line.char_indices() {
        let punct = matches!(ch, '(' | ')' | ',');
        if punct || ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                tokens.push(Token::Word(&line[start..idx]));
            }
            match ch {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                ',' => tokens.push(Token::Comma),
                _ => {}
            }
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }
    if let Some(start) = word_start {
        tokens.push(Token::Word(&line[start..]));
    }
    tokens
}

fn operator_kind(word: &str) -> Option<NodeKind> {
    match word {
        "MOVE" => Some(NodeKind::Move),
        "MEM" => Some(NodeKind::Mem),
        "+" => Some(NodeKind::Add),
        "-" => Some(NodeKind::Sub),
        "*" => Some(NodeKind::Mul),
        "/" => Some(NodeKind::Div),
        _ => None,
    }
}

fn is_keyword(word: &str) -> bool {
    operator_kind(word).is_some() || word == "CONST" || word == "TEMP"
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    tree: ExprTree,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: Token<'a>) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_expr(&mut self) -> SelectResult<NodeId> {
        let word = match self.bump() {
            Some(Token::Word(word)) => word,
            Some(other) => {
                return Err(SelectError::UnexpectedToken {
                    found: other.text(),
                })
            }
            None => return Err(SelectError::UnexpectedEnd),
        };

        if let Some(kind) = operator_kind(word) {
            let node = self.tree.push(kind, None);
            if self.eat(Token::Open) {
                if !self.eat(Token::Close) {
                    loop {
                        let child = self.parse_expr()?;
                        self.tree.add_child(node, child);
                        if !self.eat(Token::Comma) {
                            break;
                        }
                    }
                    if !self.eat(Token::Close) {
                        return Err(match self.peek() {
                            Some(token) => SelectError::UnexpectedToken {
                                found: token.text(),
                            },
                            None => SelectError::UnexpectedEnd,
                        });
                    }
                }
            }
            Ok(node)
        } else if word == "CONST" || word == "TEMP" {
            let kind = if word == "CONST" {
                NodeKind::Const
            } else {
                NodeKind::Temp
            };
            // The next word is the literal value, unless it is a keyword
            // itself (then the leaf carries no value).
            let value = match self.peek() {
                Some(Token::Word(next)) if !is_keyword(next) => {
                    self.pos += 1;
                    Some(next.to_string())
                }
                _ => None,
            };
            Ok(self.tree.push(kind, value))
        } else {
            Ok(self.tree.push(NodeKind::Opaque, Some(word.to_string())))
        }
    }
}
