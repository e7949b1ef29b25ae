//! Output document for a parsed IPPcode22 program
//!
//! The parser appends instructions through a [`ProgramBuilder`]; the finished [`Program`] is
//! rendered as XML only once the whole input has been accepted.
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <program language="IPPcode22">
//!   <instruction order="1" opcode="MOVE">
//!     <arg1 type="var">GF@x</arg1>
//!     <arg2 type="int">5</arg2>
//!   </instruction>
//! </program>
//! ```

use std::fmt;
use std::io::{self, Write};

use super::{LANGUAGE, Opcode};

/// Value of the `type` attribute of an argument element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Var,
    Int,
    String,
    Bool,
    Nil,
    Label,
    Type,
}

impl ArgKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArgKind::Var => "var",
            ArgKind::Int => "int",
            ArgKind::String => "string",
            ArgKind::Bool => "bool",
            ArgKind::Nil => "nil",
            ArgKind::Label => "label",
            ArgKind::Type => "type",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub position: usize,
    pub kind: ArgKind,
    // Raw value, escaped when rendered
    pub value: String,
}

impl Argument {
    pub fn new(position: usize, kind: ArgKind, value: impl Into<String>) -> Self {
        Self {
            position,
            kind,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub order: usize,
    pub opcode: Opcode,
    pub args: Vec<Argument>,
}

/// A parsed program. Without a header line there is no `<program>` root at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    root: bool,
}

impl Program {
    pub fn language(&self) -> &'static str {
        LANGUAGE
    }

    pub fn has_root(&self) -> bool {
        self.root
    }

    pub fn to_xml(&self) -> String {
        let mut xml = XmlWriter::new();
        xml.declaration();

        if !self.root {
            return xml.finish();
        }

        let root_attrs = [("language", self.language())];
        if self.instructions.is_empty() {
            xml.empty("program", &root_attrs);
            return xml.finish();
        }

        xml.open("program", &root_attrs);
        for instr in &self.instructions {
            let order = instr.order.to_string();
            let attrs = [("order", order.as_str()), ("opcode", instr.opcode.mnemonic())];

            if instr.args.is_empty() {
                xml.empty("instruction", &attrs);
                continue;
            }

            xml.open("instruction", &attrs);
            for arg in &instr.args {
                let tag = format!("arg{}", arg.position);
                xml.text_element(&tag, &[("type", arg.kind.as_str())], &arg.value);
            }
            xml.close("instruction");
        }
        xml.close("program");

        xml.finish()
    }

    pub fn write_xml<W: Write>(&self, mut out: W) -> io::Result<()> {
        out.write_all(self.to_xml().as_bytes())?;
        out.flush()
    }
}

/// Collects instructions in source order and numbers them.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    root: bool,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the document root; called once the header is accepted.
    pub fn open_root(&mut self) {
        self.root = true;
    }

    /// Append an instruction and return the order it was given.
    pub fn append(&mut self, opcode: Opcode, args: Vec<Argument>) -> usize {
        debug_assert!(self.root, "instructions need a document root");
        debug_assert!(
            args.iter().enumerate().all(|(i, arg)| arg.position == i + 1),
            "arguments must be numbered 1..n"
        );

        let order = self.instructions.len() + 1;
        self.instructions.push(Instruction {
            order,
            opcode,
            args,
        });
        order
    }

    pub fn finish(self) -> Program {
        Program {
            instructions: self.instructions,
            root: self.root,
        }
    }
}

/// Escape `&`, `<` and `>` for use in element content.
///
/// Meant to be applied exactly once to a raw value: `&amp;` becomes `&amp;amp;`.
pub fn escape_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attribute(raw: &str) -> String {
    escape_markup(raw).replace('"', "&quot;")
}

/// Minimal indented XML emitter
struct XmlWriter {
    output: String,
    indent_level: usize,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
        }
    }

    fn declaration(&mut self) {
        self.output
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }

    fn start_tag(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.output.push_str(&"  ".repeat(self.indent_level));
        self.output.push('<');
        self.output.push_str(tag);
        for (name, value) in attrs {
            self.output
                .push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start_tag(tag, attrs);
        self.output.push_str(">\n");
        self.indent_level += 1;
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start_tag(tag, attrs);
        self.output.push_str("/>\n");
    }

    fn text_element(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) {
        if text.is_empty() {
            self.empty(tag, attrs);
            return;
        }

        self.start_tag(tag, attrs);
        self.output.push('>');
        self.output.push_str(&escape_markup(text));
        self.output.push_str(&format!("</{}>\n", tag));
    }

    fn close(&mut self, tag: &str) {
        self.indent_level -= 1;
        self.output.push_str(&"  ".repeat(self.indent_level));
        self.output.push_str(&format!("</{}>\n", tag));
    }

    fn finish(self) -> String {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

    fn rooted() -> ProgramBuilder {
        let mut builder = ProgramBuilder::new();
        builder.open_root();
        builder
    }

    #[test]
    fn builder_numbers_instructions() {
        let mut builder = rooted();

        assert_eq!(builder.append(Opcode::CREATEFRAME, vec![]), 1);
        assert_eq!(builder.append(Opcode::PUSHFRAME, vec![]), 2);

        let program = builder.finish();
        let orders: Vec<_> = program.instructions.iter().map(|i| i.order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn renders_empty_program() {
        let program = rooted().finish();

        assert!(program.has_root());
        assert_eq!(
            program.to_xml(),
            format!("{DECL}<program language=\"IPPcode22\"/>\n")
        );
    }

    #[test]
    fn renders_declaration_only_without_root() {
        let program = ProgramBuilder::new().finish();

        assert!(!program.has_root());
        assert_eq!(program.to_xml(), DECL);
        assert_eq!(Program::default().to_xml(), DECL);
    }

    #[test]
    fn renders_instructions_and_arguments() {
        let mut builder = rooted();
        builder.append(
            Opcode::MOVE,
            vec![
                Argument::new(1, ArgKind::Var, "GF@x"),
                Argument::new(2, ArgKind::Int, "5"),
            ],
        );
        builder.append(Opcode::BREAK, vec![]);

        let expected = format!(
            "{DECL}<program language=\"IPPcode22\">\n\
             \x20 <instruction order=\"1\" opcode=\"MOVE\">\n\
             \x20   <arg1 type=\"var\">GF@x</arg1>\n\
             \x20   <arg2 type=\"int\">5</arg2>\n\
             \x20 </instruction>\n\
             \x20 <instruction order=\"2\" opcode=\"BREAK\"/>\n\
             </program>\n"
        );
        assert_eq!(builder.finish().to_xml(), expected);
    }

    #[test]
    fn renders_empty_string_argument_self_closed() {
        let mut builder = rooted();
        builder.append(Opcode::WRITE, vec![Argument::new(1, ArgKind::String, "")]);

        assert!(builder.finish().to_xml().contains("<arg1 type=\"string\"/>\n"));
    }

    #[test]
    fn escapes_markup_once() {
        assert_eq!(escape_markup("a<b>&c"), "a&lt;b&gt;&amp;c");
        assert_eq!(escape_markup("&amp;"), "&amp;amp;");
        assert_eq!(escape_markup("plain\\032text"), "plain\\032text");
    }

    #[test]
    fn escapes_argument_text_when_rendered() {
        let mut builder = rooted();
        builder.append(
            Opcode::WRITE,
            vec![Argument::new(1, ArgKind::String, "x<y&&z")],
        );
        let program = builder.finish();

        assert_eq!(program.instructions[0].args[0].value, "x<y&&z");
        assert!(
            program
                .to_xml()
                .contains("<arg1 type=\"string\">x&lt;y&amp;&amp;z</arg1>")
        );
    }

    #[test]
    fn escapes_quotes_in_attributes_only() {
        assert_eq!(escape_attribute("a\"b&"), "a&quot;b&amp;");
        assert_eq!(escape_markup("a\"b"), "a\"b");
    }

    #[test]
    fn writes_to_sink() {
        let program = rooted().finish();
        let mut out = Vec::new();
        program.write_xml(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), program.to_xml());
    }
}
