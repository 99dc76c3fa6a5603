//! Module-level sorting (spec.md §4.4): resolve every reference a
//! top-level statement makes against its siblings — no hard/soft split at
//! this scope, unlike the class-level sorter — break any cycles
//! deterministically, and emit the statements in dependency order.

use crate::error::{Position, ResolutionError, WildcardImportError};
use crate::graph::{self, Graph};
use crate::policy::{self, OnUnresolved, OnWildcardImport};
use crate::refs;
use crate::statement::Statement;
use crate::SortError;

/// Builds the module-level dependency graph and resolves it, dispatching
/// `on_unresolved`/`on_wildcard_import` as needed. Returns `None` when a
/// wildcard import makes the rest of the file's analysis unsound and the
/// policy didn't raise past it — the caller returns the input unchanged
/// in that case (spec.md §4.2, §7).
///
/// Unlike the class-level runtime graph, every free reference counts here,
/// not just underscore-prefixed ones (spec.md §4.4: "every reference is
/// hard at module scope"; the "unresolved raises" seed scenario in §8
/// uses a plain public name).
pub fn build_graph(
    source_text: &str,
    statements: &[Statement],
    on_unresolved: &OnUnresolved,
    on_wildcard_import: &OnWildcardImport,
) -> Result<Option<Graph>, SortError> {
    for statement in statements {
        if let Some(offset) = refs::first_wildcard_import(&statement.node) {
            let position = position_at(source_text, offset);
            policy::dispatch::<_, WildcardImportError>(on_wildcard_import, WildcardImportError { position })?;
            return Ok(None);
        }
    }

    let (graph, unresolved) = graph::resolve(statements, refs::free_references, false);

    for miss in unresolved {
        let position = position_at(source_text, miss.offset);
        policy::dispatch::<_, ResolutionError>(
            on_unresolved,
            ResolutionError {
                message: format!("unresolved dependency '{}'", miss.name),
                name: miss.name,
                position,
            },
        )?;
    }

    Ok(Some(graph))
}

/// Sorts `statements` (already resolved into `graph`) and renders the
/// final module text, recursing into class bodies along the way. Joins
/// with `\n` and always leaves the caller to denormalize back to the
/// source file's own line ending.
pub fn render(statements: &[Statement], mut graph: Graph, sort_fields: bool) -> String {
    graph.replace_cycles(|i| i);
    let order = graph.topological_sort();
    debug_assert!(graph.is_topologically_sorted(&order));

    let mut output = String::new();
    for index in order {
        output.push_str(&crate::class_sort::sort_statement_text(&statements[index], sort_fields));
    }
    output
}

/// Converts a byte offset into `source` to a (line, column) pair: `line`
/// is 1-based, `column` is 0-based, matching the `col_offset` convention
/// of the original ast the offsets are taken from.
pub fn position_at(source: &str, offset: usize) -> Position {
    let mut line = 1u32;
    let mut line_start = 0usize;
    for (index, byte) in source.as_bytes().iter().enumerate() {
        if index >= offset {
            break;
        }
        if *byte == b'\n' {
            line += 1;
            line_start = index + 1;
        }
    }
    let column = source[line_start..offset.min(source.len())].chars().count() as u32;
    Position::new(line, column)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ruff_python_parser::parse_module;

    use super::*;
    use crate::statement;

    fn statements_of(source: &str) -> (Arc<str>, Vec<Statement>) {
        let parsed = parse_module(source).expect("valid python");
        let buf: Arc<str> = Arc::from(source);
        let statements = statement::segment(&buf, parsed.into_syntax().body, 0, buf.len());
        (buf, statements)
    }

    #[test]
    fn reorders_private_helper_before_its_caller() {
        let source = "\ndef public():\n    return _private()\n\ndef _private():\n    pass\n";
        let (_buf, statements) = statements_of(source);
        let graph = build_graph(source, &statements, &OnUnresolved::default(), &OnWildcardImport::default())
            .expect("no policy errors")
            .expect("no wildcard import");
        let rendered = render(&statements, graph, false);
        assert!(rendered.find("_private").unwrap() < rendered.find("public").unwrap());
    }

    #[test]
    fn position_at_reports_line_and_column() {
        let source = "a = 1\nbb = 2\n";
        let position = position_at(source, 7);
        assert_eq!((position.line, position.column), (2, 1));
    }

    #[test]
    fn position_at_reports_zero_based_column_for_an_indented_reference() {
        let source = "def fun():\n    unresolved()\n";
        let offset = source.find("unresolved").unwrap();
        let position = position_at(source, offset);
        assert_eq!((position.line, position.column), (2, 4));
    }

    #[test]
    fn position_at_reports_column_zero_for_a_line_start() {
        let source = "from module import *\n";
        let position = position_at(source, 0);
        assert_eq!((position.line, position.column), (1, 0));
    }
}
