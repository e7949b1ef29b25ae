use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use rstest::rstest;

fn run(stdin: &str) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("parse");
    cmd.write_stdin(stdin);
    cmd.assert()
}

#[test]
fn writes_document_for_valid_program() {
    let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                    <program language=\"IPPcode22\">\n\
                    \x20 <instruction order=\"1\" opcode=\"MOVE\">\n\
                    \x20   <arg1 type=\"var\">GF@x</arg1>\n\
                    \x20   <arg2 type=\"int\">5</arg2>\n\
                    \x20 </instruction>\n\
                    </program>\n";

    run(".IPPcode22\nMOVE GF@x int@5\n")
        .success()
        .stdout(expected);
}

#[test]
fn writes_empty_program_for_comment_only_source() {
    run(".IPPcode22\n# comment only\n")
        .success()
        .stdout(predicate::str::contains("<program language=\"IPPcode22\"/>"))
        .stdout(predicate::str::contains("<instruction").not());
}

#[rstest]
#[case("")]
#[case("\n\n")]
#[case("# only comment\n")]
fn writes_declaration_only_without_header(#[case] src: &str) {
    run(src)
        .success()
        .stdout("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
}

#[test]
fn writes_instruction_without_arguments() {
    run(".IPPcode22\nCREATEFRAME\n")
        .success()
        .stdout(predicate::str::contains(
            "<instruction order=\"1\" opcode=\"CREATEFRAME\"/>",
        ))
        .stdout(predicate::str::contains("<arg1").not());
}

#[test]
fn escapes_string_constants() {
    run(".IPPcode22\nWRITE string@a<b>&amp;\n")
        .success()
        .stdout(predicate::str::contains(
            "<arg1 type=\"string\">a&lt;b&gt;&amp;amp;</arg1>",
        ));
}

#[test]
fn numbers_every_instruction() {
    let src = ".IPPcode22\n\
               DEFVAR GF@a\n\
               \n\
               # comment\n\
               READ GF@a int\n\
               write GF@a\n";

    run(src)
        .success()
        .stdout(predicate::str::contains("order=\"1\" opcode=\"DEFVAR\""))
        .stdout(predicate::str::contains("order=\"2\" opcode=\"READ\""))
        .stdout(predicate::str::contains("order=\"3\" opcode=\"WRITE\""))
        .stdout(predicate::str::contains("order=\"4\"").not());
}

#[rstest]
#[case("BADHEADER\n", 21)]
#[case(".IPPcode22\nFOO GF@x\n", 22)]
#[case(".IPPcode22\nDEFVAR 5\n", 23)]
#[case(".IPPcode22\nWRITE int@abc\n", 23)]
#[case(".IPPcode22\nBREAK BREAK\n", 23)]
#[case(".IPPcode22\nDEFVAR GF@ok\nJUMP GF@x\n", 23)]
fn fails_with_exit_code_and_no_output(#[case] src: &str, #[case] code: i32) {
    run(src)
        .code(code)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty().not());
}

#[test]
fn prints_help() {
    cargo_bin_cmd!("parse")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--help"));
}

#[rstest]
#[case(&["--help", "--help"])]
#[case(&["--help", "extra"])]
#[case(&["-h"])]
#[case(&["--version"])]
#[case(&["input.src"])]
fn rejects_other_arguments(#[case] args: &[&str]) {
    cargo_bin_cmd!("parse")
        .args(args)
        .write_stdin(".IPPcode22\n")
        .assert()
        .code(10)
        .stdout(predicate::str::is_empty());
}
