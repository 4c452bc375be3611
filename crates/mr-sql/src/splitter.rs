//! Statement splitting
//!
//! A script is tokenized once and then walked lazily: each call to
//! [`Statements::next`] scans forward to the next top-level terminator.
//! A terminator is top-level when it is outside parentheses and outside any
//! procedural block (`BEGIN ... END`, `DECLARE ... END`, a routine body,
//! `CASE ... END`, `IF ... END IF`, loops).

use crate::dialect::parser_dialect;
use crate::error::{SqlError, SqlResult};
use mr_core::Dialect;
use sqlparser::dialect::Dialect as ParserDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Words that follow `BEGIN` when it starts a transaction rather than a block
const TRANSACTION_WORDS: &[&str] = &[
    "TRANSACTION",
    "WORK",
    "TRAN",
    "DEFERRED",
    "IMMEDIATE",
    "EXCLUSIVE",
    "ISOLATION",
    "READ",
];

/// Words after a routine's `AS` that mean the body is a plain statement
const AS_INLINE_WORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "MERGE", "WITH", "VALUES", "TABLE", "SET", "EXEC",
    "EXECUTE", "CALL", "RETURN", "IF", "OBJECT", "LANGUAGE", "CASE", "EXTERNAL",
];

/// Words after `IS` that make it an expression or type declaration, not a body
const IS_INLINE_WORDS: &[&str] = &[
    "NULL", "NOT", "SELECT", "WITH", "TABLE", "RECORD", "REF", "VARRAY", "OBJECT", "DISTINCT",
    "JSON", "TRUE", "FALSE", "CASE", "LANGUAGE", "EXTERNAL",
];

/// Operator keywords that keep `AS a AND b` an expression rather than a
/// `name TYPE` declaration
const EXPRESSION_WORDS: &[&str] = &[
    "AND", "OR", "IS", "NOT", "IN", "BETWEEN", "LIKE", "ILIKE", "GLOB", "SIMILAR", "COLLATE",
    "ESCAPE", "OVER", "FILTER", "DIV", "MOD",
];

/// Words that may follow `END` to close a specific construct
const END_QUALIFIERS: &[&str] = &["IF", "LOOP", "CASE", "WHILE", "REPEAT", "FOR"];

/// Routine kinds whose bodies may contain terminators
const ROUTINE_WORDS: &[&str] = &["FUNCTION", "PROCEDURE", "TRIGGER", "PACKAGE"];

/// Splits scripts using a fixed tokenizer dialect
pub struct StatementSplitter {
    dialect: Box<dyn ParserDialect>,
}

impl StatementSplitter {
    /// Create a splitter for a configured dialect
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect: parser_dialect(dialect),
        }
    }

    /// Split `sql`, failing if the tokenizer rejects it
    pub fn try_split(&self, sql: &str) -> SqlResult<Statements> {
        let tokens = Tokenizer::new(self.dialect.as_ref(), sql)
            .with_unescape(false)
            .tokenize()
            .map_err(|e| SqlError::Tokenize(e.to_string()))?;
        Ok(Statements::from_tokens(tokens))
    }

    /// Split `sql` into statements.
    ///
    /// A script the tokenizer cannot handle (an unterminated quote, for
    /// example) is returned whole as a single statement so the database
    /// reports the problem when it is executed.
    pub fn split(&self, sql: &str) -> Statements {
        match self.try_split(sql) {
            Ok(statements) => statements,
            Err(e) => {
                log::warn!("{e}; treating the script as a single statement");
                Statements::whole(sql)
            }
        }
    }
}

impl Default for StatementSplitter {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

/// Split `sql` with the given dialect
pub fn split_statements(sql: &str, dialect: Dialect) -> Statements {
    StatementSplitter::new(dialect).split(sql)
}

/// Lazy, single-pass iterator over the statements of one script.
///
/// Each item is trimmed and has its terminator removed. Fragments made only
/// of whitespace and comments are skipped.
pub struct Statements {
    tokens: Vec<Token>,
    pos: usize,
    whole: Option<String>,
}

impl Statements {
    fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            whole: None,
        }
    }

    fn whole(sql: &str) -> Self {
        let trimmed = trim_terminator(sql);
        Self {
            tokens: Vec::new(),
            pos: 0,
            whole: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    /// Index of the next non-whitespace token at or after `from`
    fn next_significant(&self, from: usize) -> Option<usize> {
        (from..self.tokens.len()).find(|&i| !is_trivia(&self.tokens[i]))
    }

    /// Upper-cased unquoted word at `idx`, if that token is one
    fn word_at(&self, idx: usize) -> Option<String> {
        match self.tokens.get(idx) {
            Some(Token::Word(w)) if w.quote_style.is_none() => Some(w.value.to_ascii_uppercase()),
            _ => None,
        }
    }

    /// Upper-cased word following `idx`, skipping whitespace
    fn peek_word(&self, idx: usize) -> Option<String> {
        self.next_significant(idx + 1).and_then(|i| self.word_at(i))
    }

    /// Whether `word` appears before the next terminator after `idx`
    fn word_before_terminator(&self, idx: usize, word: &str) -> bool {
        for token in &self.tokens[idx + 1..] {
            match token {
                Token::SemiColon => return false,
                Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(word) => {
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    /// Scan one fragment, consuming its terminator.
    ///
    /// Returns the fragment text and whether it holds anything besides
    /// whitespace and comments.
    fn next_fragment(&mut self) -> (String, bool) {
        let mut text = String::new();
        let mut has_code = false;
        let mut blocks = BlockTracker::default();

        while self.pos < self.tokens.len() {
            let idx = self.pos;
            self.pos += 1;
            let token = &self.tokens[idx];

            match token {
                Token::EOF => continue,
                Token::SemiColon if blocks.at_top_level() => break,
                Token::LParen => blocks.paren += 1,
                Token::RParen => blocks.paren -= 1,
                Token::Word(_) => {
                    if let Some(word) = self.word_at(idx) {
                        self.track_word(&mut blocks, idx, &word, !has_code);
                    }
                }
                _ => {}
            }

            if !is_trivia(token) {
                has_code = true;
            }
            text.push_str(&token.to_string());
        }

        (trim_terminator(&text).to_string(), has_code)
    }

    fn track_word(&self, blocks: &mut BlockTracker, idx: usize, word: &str, leading: bool) {
        if leading && word == "CREATE" {
            blocks.is_create = true;
        }
        if blocks.skip_next_word {
            blocks.skip_next_word = false;
            return;
        }

        match word {
            w if ROUTINE_WORDS.contains(&w) && blocks.is_create && blocks.stack.is_empty() => {
                blocks.is_routine = true;
            }
            "IS" | "AS" if blocks.is_routine && blocks.paren <= 0 && blocks.awaiting_body() => {
                let inline = if word == "IS" { IS_INLINE_WORDS } else { AS_INLINE_WORDS };
                if self.opens_routine_body(idx, inline) {
                    blocks.stack.push(Block::Declarations);
                }
            }
            "DECLARE" if blocks.stack.is_empty() && (blocks.is_create || leading) => {
                blocks.stack.push(Block::Declarations);
            }
            "BEGIN" => {
                if blocks.stack.last() == Some(&Block::Declarations) {
                    blocks.stack.pop();
                    blocks.stack.push(Block::Begin);
                } else if blocks.is_create
                    || !blocks.stack.is_empty()
                    || (leading && self.begin_starts_block(idx))
                {
                    blocks.stack.push(Block::Begin);
                }
            }
            "CASE" => blocks.stack.push(Block::Case),
            "IF" if blocks.in_block() && self.word_before_terminator(idx, "THEN") => {
                blocks.stack.push(Block::Control);
            }
            "LOOP" if blocks.in_block() => blocks.stack.push(Block::Control),
            "WHILE" if blocks.in_block() && self.word_before_terminator(idx, "DO") => {
                blocks.stack.push(Block::Control);
            }
            "REPEAT"
                if blocks.in_block()
                    && !matches!(
                        self.next_significant(idx + 1).map(|i| &self.tokens[i]),
                        Some(Token::LParen)
                    ) =>
            {
                blocks.stack.push(Block::Control);
            }
            "END" => {
                blocks.skip_next_word = self
                    .peek_word(idx)
                    .is_some_and(|next| END_QUALIFIERS.contains(&next.as_str()));
                blocks.stack.pop();
            }
            _ => {}
        }
    }

    /// Whether the routine `IS`/`AS` at `idx` introduces a procedural body.
    ///
    /// A body starts with `BEGIN`, `DECLARE`, or a declaration shaped like
    /// `name TYPE`. Anything else (`AS x + 1`, `AS ASSIGNMENT`, `AS $$...$$`)
    /// is an inline expression that ends at the next terminator.
    fn opens_routine_body(&self, idx: usize, inline: &[&str]) -> bool {
        let Some(first) = self.next_significant(idx + 1) else {
            return false;
        };
        let Some(word) = self.word_at(first) else {
            return false;
        };
        if inline.contains(&word.as_str()) {
            return false;
        }
        if word == "BEGIN" || word == "DECLARE" {
            return true;
        }
        self.peek_word(first)
            .is_some_and(|next| !EXPRESSION_WORDS.contains(&next.as_str()))
    }

    /// A leading `BEGIN` opens a block unless it starts a transaction
    fn begin_starts_block(&self, idx: usize) -> bool {
        match self.next_significant(idx + 1).map(|i| &self.tokens[i]) {
            None | Some(Token::SemiColon) => false,
            Some(_) => !self
                .peek_word(idx)
                .is_some_and(|next| TRANSACTION_WORDS.contains(&next.as_str())),
        }
    }
}

impl Iterator for Statements {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(whole) = self.whole.take() {
            return Some(whole);
        }
        while self.pos < self.tokens.len() {
            let (text, has_code) = self.next_fragment();
            if has_code && !text.is_empty() {
                return Some(text);
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    /// Declaration section of a routine or anonymous block; its `BEGIN`
    /// turns it into a [`Block::Begin`]
    Declarations,
    Begin,
    Case,
    Control,
}

#[derive(Debug, Default)]
struct BlockTracker {
    paren: i32,
    stack: Vec<Block>,
    is_create: bool,
    is_routine: bool,
    skip_next_word: bool,
}

impl BlockTracker {
    fn at_top_level(&self) -> bool {
        self.paren <= 0 && self.stack.is_empty()
    }

    fn in_block(&self) -> bool {
        self.stack
            .iter()
            .any(|b| matches!(b, Block::Begin | Block::Declarations))
    }

    /// A routine header may open a body here: at the top of the statement or
    /// nested inside another routine's declarations (package bodies)
    fn awaiting_body(&self) -> bool {
        matches!(self.stack.last(), None | Some(Block::Declarations))
    }
}

fn is_trivia(token: &Token) -> bool {
    matches!(token, Token::Whitespace(_) | Token::EOF)
}

/// Trim whitespace and one trailing terminator
fn trim_terminator(sql: &str) -> &str {
    let trimmed = sql.trim();
    trimmed.strip_suffix(';').map(str::trim_end).unwrap_or(trimmed)
}

#[cfg(test)]
#[path = "splitter_test.rs"]
mod tests;
