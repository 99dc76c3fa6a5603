//! `Statement`: a verbatim-text-preserving slice of one top-level (or
//! class-body-level) construct, plus the segmenter that produces them
//! (spec.md §3, §4.1).

use std::sync::Arc;

use ruff_python_ast::Stmt;
use ruff_text_size::Ranged;

/// One statement: its parsed node plus the exact source text it owns.
///
/// `source` and `range` together realize the "slice over a shared source
/// buffer" ownership model from spec.md §9: cloning a `Statement` is an
/// `Arc` bump, not a text copy.
#[derive(Debug, Clone)]
pub struct Statement {
    source: Arc<str>,
    range: std::ops::Range<usize>,
    pub node: Stmt,
}

impl Statement {
    /// The verbatim source text for this statement, including any leading
    /// blank lines/comments attached to it and ending at the end of its
    /// own last physical line.
    pub fn text(&self) -> &str {
        &self.source[self.range.clone()]
    }

    pub fn start_offset(&self) -> usize {
        self.range.start
    }

    /// The bindings this statement introduces into its enclosing scope
    /// (spec.md §3). The first entry is the tie-break representative.
    pub fn bindings(&self) -> Vec<String> {
        crate::bindings::bindings_of(&self.node)
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        // Two statements are "the same" for the no-op / idempotence check
        // iff they denote the same source span of the same buffer.
        Arc::ptr_eq(&self.source, &other.source) && self.range == other.range
    }
}

/// Segments `stmts` (children of a single scope, already in source order)
/// into `Statement`s whose spans exactly tile `[start, end)` of `source`.
///
/// Statement *i*'s span starts where statement *i-1*'s own last physical
/// line ends, so blank lines and whole-line comments between statements
/// are attached as leading trivia of the statement that follows them,
/// never as trailing trivia of the one before. The last statement's span
/// runs to `end` (picking up any trailing comments/blank lines before the
/// scope closes).
pub fn segment(source: &Arc<str>, stmts: Vec<Stmt>, start: usize, end: usize) -> Vec<Statement> {
    let n = stmts.len();
    let mut out = Vec::with_capacity(n);
    let mut cursor = start;

    for (i, node) in stmts.into_iter().enumerate() {
        let node_end: usize = node.range().end().into();
        let seg_end = if i + 1 == n { end } else { line_end_from(source, node_end) };
        out.push(Statement {
            source: Arc::clone(source),
            range: cursor..seg_end,
            node,
        });
        cursor = seg_end;
    }

    out
}

/// The offset of the first `\n` at-or-after `offset`, plus one (i.e. just
/// past it), or the end of `source` if there is none.
fn line_end_from(source: &str, offset: usize) -> usize {
    match source[offset..].find('\n') {
        Some(rel) => offset + rel + 1,
        None => source.len(),
    }
}

/// Splits a class statement into `(head_text, body_statements)`: the text
/// from the start of the class statement up to and including its header
/// line, and the segmented class-body statements (spec.md §4.1).
///
/// # Panics
/// Panics if `statement.node` is not a `ClassDef` (callers only invoke
/// this on statements already classified as classes).
pub fn split_class(statement: &Statement) -> (&str, Vec<Statement>) {
    let Stmt::ClassDef(class_def) = &statement.node else {
        panic!("split_class called on a non-class statement");
    };

    let header_start: usize = class_def.range().start().into();
    let class_end = statement.range.end;

    if class_def.body.is_empty() {
        return (statement.text(), Vec::new());
    }

    let body_start: usize = class_def.body[0].range().start().into();
    let source = &statement.source_for_split();
    let header_end = find_header_end(source, header_start, body_start);

    let head_text = &statement.source[statement.range.start..header_end];
    let body = segment(&statement.source_arc(), class_def.body.clone(), header_end, class_end);

    (head_text, body)
}

impl Statement {
    fn source_for_split(&self) -> &str {
        &self.source
    }

    fn source_arc(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }
}

/// Finds the offset just past the class header line: the physical line
/// containing the top-level `:` that opens the class suite. For a
/// (rare) single-line class body (`class C: pass`) this returns the
/// offset just past the colon instead, since there is no header line of
/// its own to consume.
fn find_header_end(source: &str, header_start: usize, body_start: usize) -> usize {
    let Some(colon_rel) = find_top_level_colon(&source[header_start..body_start]) else {
        // Malformed input shouldn't reach here since the parser already
        // accepted this as a valid ClassDef; fall back conservatively.
        return body_start;
    };
    let colon = header_start + colon_rel;

    let same_line = !source[colon..body_start].contains('\n');
    if same_line { colon + 1 } else { line_end_from(source, colon) }
}

/// Scans `segment` for a `:` outside of brackets, strings, and comments.
fn find_top_level_colon(segment: &str) -> Option<usize> {
    let bytes = segment.as_bytes();
    let mut depth: i32 = 0;
    let mut in_string: Option<(u8, bool)> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if let Some((quote, triple)) = in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == quote {
                if triple {
                    if bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote) {
                        in_string = None;
                        i += 3;
                        continue;
                    }
                } else {
                    in_string = None;
                    i += 1;
                    continue;
                }
            }
            i += 1;
            continue;
        }

        match b {
            b'\'' | b'"' => {
                let triple = bytes.get(i + 1) == Some(&b) && bytes.get(i + 2) == Some(&b);
                in_string = Some((b, triple));
                i += if triple { 3 } else { 1 };
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'#' if depth == 0 => {
                return match segment[i..].find('\n') {
                    Some(rel) => {
                        i += rel;
                        continue;
                    }
                    None => None,
                };
            }
            b':' if depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use ruff_python_parser::parse_module;

    use super::*;

    fn parse(source: &str) -> (Arc<str>, Vec<Stmt>) {
        let parsed = parse_module(source).expect("valid python");
        (Arc::from(source), parsed.into_syntax().body)
    }

    #[test]
    fn segments_tile_the_source_exactly() {
        let source = "\ndef public():\n    return _private()\n\ndef _private():\n    pass\n";
        let (buf, stmts) = parse(source);
        let statements = segment(&buf, stmts, 0, buf.len());
        let joined: String = statements.iter().map(Statement::text).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn leading_blank_line_attaches_to_the_statement_that_follows() {
        let source = "x = 1\n\n\ny = 2\n";
        let (buf, stmts) = parse(source);
        let statements = segment(&buf, stmts, 0, buf.len());
        assert_eq!(statements[0].text(), "x = 1\n");
        assert_eq!(statements[1].text(), "\n\ny = 2\n");
    }

    #[test]
    fn split_class_separates_header_from_body() {
        let source = "class Foo(Base):\n    \"\"\"doc\"\"\"\n    x = 1\n";
        let (buf, stmts) = parse(source);
        let statements = segment(&buf, stmts, 0, buf.len());
        let (head, body) = split_class(&statements[0]);
        assert_eq!(head, "class Foo(Base):\n");
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].text(), "    \"\"\"doc\"\"\"\n");
        assert_eq!(body[1].text(), "    x = 1\n");
    }

    #[test]
    fn split_class_handles_multiline_header() {
        let source = "class Foo(\n    Base,\n    metaclass=M,\n):\n    x = 1\n";
        let (buf, stmts) = parse(source);
        let statements = segment(&buf, stmts, 0, buf.len());
        let (head, body) = split_class(&statements[0]);
        assert_eq!(head, "class Foo(\n    Base,\n    metaclass=M,\n):\n");
        assert_eq!(body.len(), 1);
    }
}
