//! The names a statement introduces into its enclosing scope (spec.md §3).
//!
//! A statement's bindings drive both the role-bucket predicates in
//! [`crate::roles`] and the dependency resolution in [`crate::module_sort`]
//! and [`crate::class_sort`]: a reference resolves to whichever statement in
//! the same scope binds its name.

use ruff_python_ast::{Expr, Stmt};

use crate::refs::for_each_child_stmt;

/// The names `stmt` binds into its enclosing scope, in the order they
/// appear. A non-scoping compound statement (`if`, `try`, `for`, `while`,
/// `with`, `match`) binds whatever its eagerly-executing bodies bind,
/// recursively — `if TYPE_CHECKING: import Foo` at module scope binds
/// `Foo` just like a bare `import Foo` would. Empty for statements that
/// bind nothing at all (bare expressions, ...) — those never participate
/// in dependency resolution as a target.
pub fn bindings_of(stmt: &Stmt) -> Vec<String> {
    match stmt {
        Stmt::FunctionDef(f) => vec![f.name.to_string()],
        Stmt::ClassDef(c) => vec![c.name.to_string()],
        Stmt::Assign(a) => a.targets.iter().flat_map(target_names).collect(),
        Stmt::AnnAssign(a) => target_names(&a.target),
        Stmt::AugAssign(a) => target_names(&a.target),
        Stmt::TypeAlias(t) => target_names(&t.name),
        Stmt::Import(import) => import
            .names
            .iter()
            .map(|alias| match &alias.asname {
                Some(asname) => asname.to_string(),
                None => alias.name.as_str().split('.').next().unwrap_or_default().to_owned(),
            })
            .collect(),
        Stmt::ImportFrom(import) => import
            .names
            .iter()
            .map(|alias| alias.asname.as_ref().unwrap_or(&alias.name).to_string())
            .collect(),
        Stmt::If(_) | Stmt::Try(_) | Stmt::For(_) | Stmt::While(_) | Stmt::With(_) | Stmt::Match(_) => {
            let mut names = Vec::new();
            for_each_child_stmt(stmt, &mut |child| names.extend(bindings_of(child)));
            names
        }
        _ => Vec::new(),
    }
}

/// Flattens an assignment target into the names it binds: a plain name
/// binds itself, tuple/list targets bind each element, a starred target
/// binds whatever it wraps, and attribute/subscript targets (`self.x =
/// ...`) bind nothing in the enclosing scope.
fn target_names(target: &Expr) -> Vec<String> {
    match target {
        Expr::Name(name) => vec![name.id.to_string()],
        Expr::Tuple(tuple) => tuple.elts.iter().flat_map(target_names).collect(),
        Expr::List(list) => list.elts.iter().flat_map(target_names).collect(),
        Expr::Starred(starred) => target_names(&starred.value),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use ruff_python_parser::parse_module;

    use super::*;

    fn bindings_of_source(source: &str) -> Vec<String> {
        let parsed = parse_module(source).expect("valid python");
        bindings_of(&parsed.into_syntax().body[0])
    }

    #[test]
    fn function_def_binds_its_name() {
        assert_eq!(bindings_of_source("def foo():\n    pass\n"), vec!["foo"]);
    }

    #[test]
    fn tuple_assignment_binds_every_element() {
        assert_eq!(bindings_of_source("a, b = 1, 2\n"), vec!["a", "b"]);
    }

    #[test]
    fn plain_import_binds_the_top_level_package() {
        assert_eq!(bindings_of_source("import a.b.c\n"), vec!["a"]);
    }

    #[test]
    fn aliased_import_binds_the_alias() {
        assert_eq!(bindings_of_source("import numpy as np\n"), vec!["np"]);
    }

    #[test]
    fn attribute_target_binds_nothing() {
        assert_eq!(bindings_of_source("self.x = 1\n"), Vec::<String>::new());
    }

    #[test]
    fn conditional_import_binds_through_the_if() {
        let source = "if TYPE_CHECKING:\n    import Foo\nelse:\n    Foo = None\n";
        assert_eq!(bindings_of_source(source), vec!["Foo", "Foo"]);
    }
}
