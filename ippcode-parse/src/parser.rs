//! Parser for IPPcode22
//!
//! A small state machine over the token stream: the header line comes first, then every
//! instruction has to be followed by an end of line. Each opcode pulls exactly as many
//! tokens as its operand template has slots and checks them against the slot kind.
use std::io::{self, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::document::{ArgKind, Argument, Program, ProgramBuilder};
use super::lexer::{Lexer, Token, TokenKind};
use super::{HEADER, Opcode, Operand};

// --------------------------------------------
// Errors

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: input is not valid UTF-8")]
    InvalidUtf8 { line: usize },

    #[error("line {line}: wrong header {found}, expected `{}`", HEADER)]
    BadHeader { found: String, line: usize },

    #[error("line {line}: unknown opcode `{name}`")]
    UnknownOpcode { name: String, line: usize },

    #[error("line {line}: malformed lexeme `{lexeme}`")]
    Lexical { lexeme: String, line: usize },

    #[error("line {line}: {opcode} expects {expected} as argument {position}, found {found}")]
    WrongArgument {
        opcode: Opcode,
        position: usize,
        expected: Operand,
        found: String,
        line: usize,
    },

    #[error("line {line}: missing end of line after instruction, found {found}")]
    MissingEndOfLine { found: String, line: usize },

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl ParseError {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ParseError::BadHeader { .. } => 21,
            ParseError::UnknownOpcode { .. } => 22,
            ParseError::Io(_)
            | ParseError::InvalidUtf8 { .. }
            | ParseError::Lexical { .. }
            | ParseError::WrongArgument { .. }
            | ParseError::MissingEndOfLine { .. }
            | ParseError::Output(_) => 23,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

// --------------------------------------------
// Parsing

static LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_$&%*!?-][0-9a-zA-Z_$&%*!?-]*$").unwrap());

const TYPE_NAMES: [&str; 4] = ["int", "string", "bool", "nil"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    ExpectEndOfLine,
    ExpectInstruction,
}

pub struct Parser<R> {
    lexer: Lexer<R>,
    state: State,
    builder: ProgramBuilder,
}

impl<R: Read> Parser<R> {
    pub fn new(lexer: Lexer<R>) -> Self {
        Self {
            lexer,
            state: State::Header,
            builder: ProgramBuilder::new(),
        }
    }

    /// Consume the whole token stream and return the finished program.
    ///
    /// Input ending before any header is not an error; the program then has no root.
    pub fn parse(mut self) -> ParseResult<Program> {
        loop {
            let token = self.lexer.next_token()?;

            match (self.state, token.kind) {
                (_, TokenKind::EndOfInput) => break,

                (State::Header, TokenKind::EndOfLine) => {}
                (State::Header, _) => self.parse_header(token)?,

                (State::ExpectEndOfLine, TokenKind::EndOfLine) => {
                    self.state = State::ExpectInstruction;
                }
                (State::ExpectEndOfLine, _) => {
                    return Err(ParseError::MissingEndOfLine {
                        found: token.describe(),
                        line: token.line,
                    });
                }

                (State::ExpectInstruction, TokenKind::EndOfLine) => {}
                (State::ExpectInstruction, _) => self.parse_instruction(token)?,
            }
        }

        let program = self.builder.finish();
        debug!(
            instructions = program.instructions.len(),
            root = program.has_root(),
            "program parsed"
        );

        Ok(program)
    }

    fn parse_header(&mut self, token: Token) -> ParseResult<()> {
        if !token.literal.eq_ignore_ascii_case(HEADER) {
            return Err(ParseError::BadHeader {
                found: token.describe(),
                line: token.line,
            });
        }

        debug!(line = token.line, "header accepted");
        self.builder.open_root();
        self.state = State::ExpectEndOfLine;
        Ok(())
    }

    fn parse_instruction(&mut self, token: Token) -> ParseResult<()> {
        let opcode =
            Opcode::from_mnemonic(&token.literal).ok_or_else(|| ParseError::UnknownOpcode {
                name: token.literal.to_ascii_uppercase(),
                line: token.line,
            })?;

        let mut args = Vec::with_capacity(opcode.signature().len());
        for (i, operand) in opcode.signature().iter().enumerate() {
            let arg_token = self.lexer.next_token()?;
            args.push(parse_argument(opcode, i + 1, *operand, arg_token)?);
        }

        let order = self.builder.append(opcode, args);
        debug!(order, %opcode, line = token.line, "instruction");

        self.state = State::ExpectEndOfLine;
        Ok(())
    }
}

/// Output kind of a token standing in a `<symb>` slot.
fn symbol_kind(kind: TokenKind) -> Option<ArgKind> {
    match kind {
        TokenKind::Variable => Some(ArgKind::Var),
        TokenKind::ConstInt => Some(ArgKind::Int),
        TokenKind::ConstString => Some(ArgKind::String),
        TokenKind::ConstBool => Some(ArgKind::Bool),
        TokenKind::ConstNil => Some(ArgKind::Nil),
        _ => None,
    }
}

fn parse_argument(
    opcode: Opcode,
    position: usize,
    operand: Operand,
    token: Token,
) -> ParseResult<Argument> {
    let argument = match operand {
        Operand::Var if token.kind == TokenKind::Variable => {
            Some(Argument::new(position, ArgKind::Var, token.literal.as_str()))
        }
        Operand::Symb if token.kind.is_constant() => {
            // constants keep only the payload after the type prefix
            let payload = token.literal.split_once('@').map_or("", |(_, value)| value);
            symbol_kind(token.kind).map(|kind| Argument::new(position, kind, payload))
        }
        Operand::Symb if token.kind == TokenKind::Variable => {
            Some(Argument::new(position, ArgKind::Var, token.literal.as_str()))
        }
        // Labels are checked on the raw text whatever the lexeme was classified as
        Operand::Label if LABEL_REGEX.is_match(&token.literal) => {
            Some(Argument::new(position, ArgKind::Label, token.literal.as_str()))
        }
        Operand::Type if TYPE_NAMES.contains(&token.literal.as_str()) => {
            Some(Argument::new(position, ArgKind::Type, token.literal.as_str()))
        }
        _ => None,
    };

    argument.ok_or_else(|| ParseError::WrongArgument {
        opcode,
        position,
        expected: operand,
        found: token.describe(),
        line: token.line,
    })
}
