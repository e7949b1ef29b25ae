//! Source analyzer for IPPcode22
//!
//! Reads a program from a character stream, checks it lexically and syntactically
//! and builds the [`document::Program`] tree that is rendered to XML.
pub mod document;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::io::Read;

use document::Program;
use lexer::Lexer;
use parser::{ParseResult, Parser};

/// Header line every program has to start with (compared case-insensitively).
pub const HEADER: &str = ".IPPcode22";

/// Language identifier put on the root of the output document.
pub const LANGUAGE: &str = "IPPcode22";

/// Parse a whole program from `reader`.
pub fn parse<R: Read>(reader: R) -> ParseResult<Program> {
    Parser::new(Lexer::new(reader)).parse()
}

pub fn parse_str(src: &str) -> ParseResult<Program> {
    parse(src.as_bytes())
}

/// One slot of an instruction template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Var,   // GF@x
    Symb,  // GF@x, int@5, string@abc, bool@true, nil@nil
    Label, // loop_start
    Type,  // int, string, bool, nil
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operand::Var => "<var>",
            Operand::Symb => "<symb>",
            Operand::Label => "<label>",
            Operand::Type => "<type>",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Opcode {
    // Frames and calls
    MOVE,
    CREATEFRAME,
    PUSHFRAME,
    POPFRAME,
    DEFVAR,
    CALL,
    RETURN,

    // Data stack
    PUSHS,
    POPS,

    // Arithmetic, relational and boolean
    ADD,
    SUB,
    MUL,
    IDIV,
    LT,
    GT,
    EQ,
    AND,
    OR,
    NOT,
    INT2CHAR,
    STRI2INT,

    // I/O
    READ,
    WRITE,

    // Strings
    CONCAT,
    STRLEN,
    GETCHAR,
    SETCHAR,

    // Types
    TYPE,

    // Control flow
    LABEL,
    JUMP,
    JUMPIFEQ,
    JUMPIFNEQ,
    EXIT,

    // Debugging
    DPRINT,
    BREAK,
}

impl Opcode {
    #[rustfmt::skip]
    pub const ALL: [Opcode; 35] = [
        Opcode::MOVE, Opcode::CREATEFRAME, Opcode::PUSHFRAME, Opcode::POPFRAME,
        Opcode::DEFVAR, Opcode::CALL, Opcode::RETURN, Opcode::PUSHS, Opcode::POPS,
        Opcode::ADD, Opcode::SUB, Opcode::MUL, Opcode::IDIV, Opcode::LT, Opcode::GT,
        Opcode::EQ, Opcode::AND, Opcode::OR, Opcode::NOT, Opcode::INT2CHAR,
        Opcode::STRI2INT, Opcode::READ, Opcode::WRITE, Opcode::CONCAT, Opcode::STRLEN,
        Opcode::GETCHAR, Opcode::SETCHAR, Opcode::TYPE, Opcode::LABEL, Opcode::JUMP,
        Opcode::JUMPIFEQ, Opcode::JUMPIFNEQ, Opcode::EXIT, Opcode::DPRINT, Opcode::BREAK,
    ];

    /// Look up an opcode by its mnemonic, ignoring ASCII case.
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::MOVE => "MOVE",
            Opcode::CREATEFRAME => "CREATEFRAME",
            Opcode::PUSHFRAME => "PUSHFRAME",
            Opcode::POPFRAME => "POPFRAME",
            Opcode::DEFVAR => "DEFVAR",
            Opcode::CALL => "CALL",
            Opcode::RETURN => "RETURN",
            Opcode::PUSHS => "PUSHS",
            Opcode::POPS => "POPS",
            Opcode::ADD => "ADD",
            Opcode::SUB => "SUB",
            Opcode::MUL => "MUL",
            Opcode::IDIV => "IDIV",
            Opcode::LT => "LT",
            Opcode::GT => "GT",
            Opcode::EQ => "EQ",
            Opcode::AND => "AND",
            Opcode::OR => "OR",
            Opcode::NOT => "NOT",
            Opcode::INT2CHAR => "INT2CHAR",
            Opcode::STRI2INT => "STRI2INT",
            Opcode::READ => "READ",
            Opcode::WRITE => "WRITE",
            Opcode::CONCAT => "CONCAT",
            Opcode::STRLEN => "STRLEN",
            Opcode::GETCHAR => "GETCHAR",
            Opcode::SETCHAR => "SETCHAR",
            Opcode::TYPE => "TYPE",
            Opcode::LABEL => "LABEL",
            Opcode::JUMP => "JUMP",
            Opcode::JUMPIFEQ => "JUMPIFEQ",
            Opcode::JUMPIFNEQ => "JUMPIFNEQ",
            Opcode::EXIT => "EXIT",
            Opcode::DPRINT => "DPRINT",
            Opcode::BREAK => "BREAK",
        }
    }

    /// Operand template of the instruction, in argument order.
    pub fn signature(self) -> &'static [Operand] {
        use Operand::*;

        match self {
            Opcode::MOVE | Opcode::INT2CHAR | Opcode::STRLEN | Opcode::TYPE | Opcode::NOT => {
                &[Var, Symb]
            }
            Opcode::CREATEFRAME
            | Opcode::PUSHFRAME
            | Opcode::POPFRAME
            | Opcode::RETURN
            | Opcode::BREAK => &[],
            Opcode::DEFVAR | Opcode::POPS => &[Var],
            Opcode::PUSHS | Opcode::WRITE | Opcode::EXIT | Opcode::DPRINT => &[Symb],
            Opcode::CALL | Opcode::LABEL | Opcode::JUMP => &[Label],
            Opcode::JUMPIFEQ | Opcode::JUMPIFNEQ => &[Label, Symb, Symb],
            Opcode::ADD
            | Opcode::SUB
            | Opcode::MUL
            | Opcode::IDIV
            | Opcode::LT
            | Opcode::GT
            | Opcode::EQ
            | Opcode::AND
            | Opcode::OR
            | Opcode::STRI2INT
            | Opcode::CONCAT
            | Opcode::GETCHAR
            | Opcode::SETCHAR => &[Var, Symb, Symb],
            Opcode::READ => &[Var, Type],
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
