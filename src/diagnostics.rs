//! Diagnostic rendering for inference errors.

use std::io;
use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportBuilder, ReportKind, Source};

use crate::error::{InferError, MalformedAst};

fn describe(error: &InferError) -> (String, String, Option<&'static str>) {
    match error {
        InferError::Malformed(e) => match e {
            MalformedAst::MissingCallee { node, .. } => (
                format!("Call expression {} has no callee", node),
                "this call".to_string(),
                None,
            ),
            MalformedAst::InvalidAssignmentTarget { .. } => (
                "Invalid assignment target".to_string(),
                "cannot assign to this expression".to_string(),
                Some("only identifiers and member expressions can be assigned to"),
            ),
            MalformedAst::EmptyPropertyName { .. } => (
                "Member access with an empty property name".to_string(),
                "property name missing here".to_string(),
                None,
            ),
            MalformedAst::ReturnOutsideFunction { .. } => (
                "'return' outside of function".to_string(),
                "not inside a function body".to_string(),
                None,
            ),
            MalformedAst::DuplicateNodeId { node, .. } => (
                format!("Node id {} appears more than once", node),
                "second occurrence".to_string(),
                Some("every AST node must carry a distinct id"),
            ),
        },
    }
}

fn build_report<'a>(filename: &'a str, error: &InferError) -> ReportBuilder<'a, (&'a str, Range<usize>)> {
    let span = error.span();
    let (message, label, note) = describe(error);

    let mut report = Report::build(ReportKind::Error, (filename, span.start..span.end))
        .with_message(&message)
        .with_label(
            Label::new((filename, span.start..span.end))
                .with_message(label)
                .with_color(Color::Red),
        );

    if let Some(note) = note {
        report.add_note(note);
    }
    report.add_help("the statement containing this node was skipped");

    report
}

/// Render an error as plain text, without colors.
///
/// Falls back to the error's `Display` text if the report cannot be drawn.
pub fn render_error(filename: &str, source: &str, error: &InferError) -> String {
    let mut out = Vec::new();
    match write_plain(filename, source, error, &mut out) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => error.to_string(),
    }
}

fn write_plain(
    filename: &str,
    source: &str,
    error: &InferError,
    out: &mut Vec<u8>,
) -> io::Result<()> {
    build_report(filename, error)
        .with_config(Config::default().with_color(false))
        .finish()
        .write((filename, Source::from(source)), out)
}

/// Print an error with colored diagnostics to stderr.
pub fn print_error(filename: &str, source: &str, error: &InferError) {
    eprintln!();
    if let Err(e) = build_report(filename, error).finish().eprint((filename, Source::from(source))) {
        eprintln!("{}", error);
        eprintln!("(failed to render diagnostic: {})", e);
    }
    eprintln!();
}
