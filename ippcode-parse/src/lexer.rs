//! Tokenizer for IPPcode22 source
//!
//! Reads the program one character at a time and hands out classified tokens on demand.
//! Whitespace is collapsed, `#` comments are dropped and every newline produces exactly one
//! [`TokenKind::EndOfLine`], even when it directly terminates a lexeme.

use std::fmt;
use std::io::{self, BufReader, Bytes, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::parser::{ParseError, ParseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    EndOfInput,
    EndOfLine,

    Variable,    // GF@counter
    ConstString, // string@hello\032world
    ConstInt,    // int@-5, int@0x1F, int@0o17
    ConstBool,   // bool@true
    ConstNil,    // nil@nil

    // Anything without an `@`: header, opcode, label or type name
    Word,
}

impl TokenKind {
    pub fn is_constant(self) -> bool {
        matches!(
            self,
            TokenKind::ConstString | TokenKind::ConstInt | TokenKind::ConstBool | TokenKind::ConstNil
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::EndOfInput => "end of input",
            TokenKind::EndOfLine => "end of line",
            TokenKind::Variable => "variable",
            TokenKind::ConstString => "string constant",
            TokenKind::ConstInt => "int constant",
            TokenKind::ConstBool => "bool constant",
            TokenKind::ConstNil => "nil constant",
            TokenKind::Word => "word",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
}

impl Token {
    fn end_of_line(line: usize) -> Self {
        Token {
            kind: TokenKind::EndOfLine,
            literal: String::new(),
            line,
        }
    }

    fn end_of_input(line: usize) -> Self {
        Token {
            kind: TokenKind::EndOfInput,
            literal: String::new(),
            line,
        }
    }

    /// Short description for diagnostics: the lexeme itself, or the kind for empty tokens.
    pub fn describe(&self) -> String {
        if self.literal.is_empty() {
            self.kind.to_string()
        } else {
            format!("`{}`", self.literal)
        }
    }
}

/// Patterns for lexemes containing `@`.
/// Order matters: the first matching pattern decides the kind.
const LEXEME_PATTERNS: &[(TokenKind, &str)] = &[
    (TokenKind::Variable, r"^(LF|TF|GF)@[a-zA-Z_$&%*!?-][0-9a-zA-Z_$&%*!?-]*$"),
    (TokenKind::ConstNil, r"^nil@nil$"),
    (TokenKind::ConstBool, r"^bool@(true|false)$"),
    // `int@` is required in front of every numeric form
    (TokenKind::ConstInt, r"^int@([+-]?[0-9]+|0[xX][0-9a-fA-F]+|0[oO][0-7]+)$"),
    (TokenKind::ConstString, r"^string@(\\[0-9]{3}|[^#\\])*$"),
];

static LEXEME_REGEXES: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    LEXEME_PATTERNS
        .iter()
        .map(|(kind, pattern)| (*kind, Regex::new(pattern).unwrap()))
        .collect()
});

/// Classify a finished lexeme.
pub fn classify(lexeme: &str) -> Option<TokenKind> {
    if !lexeme.contains('@') {
        return Some(TokenKind::Word);
    }

    LEXEME_REGEXES
        .iter()
        .find(|(_, re)| re.is_match(lexeme))
        .map(|(kind, _)| *kind)
}

// Same set as C's isspace, vertical tab included
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

/// Decodes UTF-8 from a byte stream one character at a time.
struct CharReader<R> {
    bytes: Bytes<BufReader<R>>,
    line: usize,
}

impl<R: Read> CharReader<R> {
    fn new(reader: R) -> Self {
        Self {
            bytes: BufReader::new(reader).bytes(),
            line: 1,
        }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        self.bytes.next().transpose()
    }

    fn next_char(&mut self) -> ParseResult<Option<char>> {
        let Some(lead) = self.next_byte()? else {
            return Ok(None);
        };

        let width = match lead {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(ParseError::InvalidUtf8 { line: self.line }),
        };

        let mut buf = [lead, 0, 0, 0];
        for slot in buf.iter_mut().take(width).skip(1) {
            *slot = self
                .next_byte()?
                .ok_or(ParseError::InvalidUtf8 { line: self.line })?;
        }

        let c = std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or(ParseError::InvalidUtf8 { line: self.line })?;

        if c == '\n' {
            self.line += 1;
        }

        Ok(Some(c))
    }
}

pub struct Lexer<R> {
    reader: CharReader<R>,

    // A newline that terminated the previous lexeme and still has to be reported
    deferred_eol: bool,
    finished: bool,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Lexer {
            reader: CharReader::new(reader),
            deferred_eol: false,
            finished: false,
        }
    }

    /// Read the next token from the stream.
    ///
    /// Once [`TokenKind::EndOfInput`] has been returned, every further call returns it again.
    pub fn next_token(&mut self) -> ParseResult<Token> {
        if self.deferred_eol {
            self.deferred_eol = false;
            return Ok(Token::end_of_line(self.reader.line - 1));
        }

        let mut lexeme = String::new();
        // leading newlines return early, so the lexeme starts on the current line
        let start = self.reader.line;
        let mut in_comment = false;

        while let Some(c) = self.reader.next_char()? {
            if in_comment && c != '\n' {
                continue;
            }
            if c == '#' {
                in_comment = true;
                continue;
            }

            if is_space(c) {
                if c == '\n' {
                    // the newline was consumed, so it belongs to the previous line
                    let line = self.reader.line - 1;
                    if lexeme.is_empty() {
                        trace!(line, "end of line");
                        return Ok(Token::end_of_line(line));
                    }
                    self.deferred_eol = true;
                }

                if lexeme.is_empty() {
                    continue;
                }
                break;
            }

            lexeme.push(c);
        }

        if lexeme.is_empty() {
            return Ok(Token::end_of_input(self.reader.line));
        }

        let kind = classify(&lexeme).ok_or_else(|| ParseError::Lexical {
            lexeme: lexeme.clone(),
            line: start,
        })?;
        trace!(line = start, %kind, lexeme = %lexeme, "token");

        Ok(Token {
            kind,
            literal: lexeme,
            line: start,
        })
    }
}

impl<R: Read> Iterator for Lexer<R> {
    type Item = ParseResult<Token>;

    /// Yields tokens up to and including [`TokenKind::EndOfInput`], or up to the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let token = self.next_token();
        self.finished = !matches!(&token, Ok(t) if t.kind != TokenKind::EndOfInput);
        Some(token)
    }
}
