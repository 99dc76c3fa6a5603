//! Finds, for a statement, every name it might depend on: free-variable
//! references anywhere in its subtree, including inside nested function
//! and class bodies (spec.md §4.2). Resolution against sibling bindings
//! happens one level up, in [`crate::module_sort`] and [`crate::class_sort`].

use std::collections::HashSet;

use ruff_python_ast::{self as ast, Expr, Stmt};
use ruff_text_size::Ranged;

/// A candidate reference: a name loaded, or an attribute accessed, that
/// might resolve to a sibling statement's binding.
#[derive(Debug, Clone)]
pub struct Reference {
    pub name: String,
    pub offset: usize,
}

/// Every free-variable-like reference inside `stmt`'s own subtree:
/// bare name loads and attribute accesses (`self._helper()` contributes
/// `_helper`), skipping names that are bound locally somewhere inside the
/// subtree itself (parameters, loop targets, comprehension variables,
/// nested assignments, ...) since those can never resolve to a sibling.
pub fn free_references(stmt: &Stmt) -> Vec<Reference> {
    let mut refs = Vec::new();
    let mut bound = HashSet::new();
    collect_locally_bound_in_stmt(stmt, &mut bound);
    visit_stmt(stmt, &bound, &mut refs);
    refs
}

/// References `stmt` evaluates immediately when it executes: a class
/// body's own assignments, decorators, and base-class/default-value
/// expressions run the moment the `class` statement is defined, unlike
/// the body of a `def`, which only runs when called. Used to build the
/// class-level initialisation graph (spec.md §4.4), which must be
/// respected exactly (these are real execution-order dependencies, not a
/// style preference).
pub fn hard_references(stmt: &Stmt) -> Vec<Reference> {
    let mut refs = Vec::new();
    let bound = HashSet::new();
    match stmt {
        Stmt::FunctionDef(node) => {
            for decorator in &node.decorator_list {
                visit_expr(&decorator.expression, &bound, &mut refs);
            }
            for with_default in node
                .parameters
                .posonlyargs
                .iter()
                .chain(node.parameters.args.iter())
                .chain(node.parameters.kwonlyargs.iter())
            {
                if let Some(default) = &with_default.default {
                    visit_expr(default, &bound, &mut refs);
                }
                if let Some(annotation) = &with_default.parameter.annotation {
                    visit_expr(annotation, &bound, &mut refs);
                }
            }
        }
        Stmt::ClassDef(node) => {
            for decorator in &node.decorator_list {
                visit_expr(&decorator.expression, &bound, &mut refs);
            }
            if let Some(arguments) = &node.arguments {
                arguments.args.iter().for_each(|e| visit_expr(e, &bound, &mut refs));
                arguments.keywords.iter().for_each(|kw| visit_expr(&kw.value, &bound, &mut refs));
            }
        }
        Stmt::Assign(node) => visit_expr(&node.value, &bound, &mut refs),
        Stmt::AnnAssign(node) => {
            visit_expr(&node.annotation, &bound, &mut refs);
            if let Some(value) = &node.value {
                visit_expr(value, &bound, &mut refs);
            }
        }
        Stmt::AugAssign(node) => visit_expr(&node.value, &bound, &mut refs),
        Stmt::If(node) => {
            visit_expr(&node.test, &bound, &mut refs);
            for clause in &node.elif_else_clauses {
                if let Some(test) = &clause.test {
                    visit_expr(test, &bound, &mut refs);
                }
            }
            for_each_child_stmt(stmt, &mut |child| refs.extend(hard_references(child)));
        }
        Stmt::For(node) => {
            visit_expr(&node.iter, &bound, &mut refs);
            for_each_child_stmt(stmt, &mut |child| refs.extend(hard_references(child)));
        }
        Stmt::While(node) => {
            visit_expr(&node.test, &bound, &mut refs);
            for_each_child_stmt(stmt, &mut |child| refs.extend(hard_references(child)));
        }
        Stmt::With(node) => {
            for item in &node.items {
                visit_expr(&item.context_expr, &bound, &mut refs);
            }
            for_each_child_stmt(stmt, &mut |child| refs.extend(hard_references(child)));
        }
        Stmt::Try(node) => {
            for handler in &node.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                if let Some(kind) = &handler.type_ {
                    visit_expr(kind, &bound, &mut refs);
                }
            }
            for_each_child_stmt(stmt, &mut |child| refs.extend(hard_references(child)));
        }
        Stmt::Match(node) => {
            visit_expr(&node.subject, &bound, &mut refs);
            for case in &node.cases {
                if let Some(guard) = &case.guard {
                    visit_expr(guard, &bound, &mut refs);
                }
            }
            for_each_child_stmt(stmt, &mut |child| refs.extend(hard_references(child)));
        }
        _ => {}
    }
    refs
}

/// The position of the first `from m import *` anywhere in `stmt`'s own
/// subtree, if any (spec.md §4.2: wildcard imports make dependency
/// analysis for the rest of the scope unreliable).
pub fn first_wildcard_import(stmt: &Stmt) -> Option<usize> {
    let mut found = None;
    visit_for_wildcard(stmt, &mut found);
    found
}

fn visit_for_wildcard(stmt: &Stmt, found: &mut Option<usize>) {
    if found.is_some() {
        return;
    }
    if let Stmt::ImportFrom(import) = stmt {
        if import.names.iter().any(|alias| alias.name.as_str() == "*") {
            *found = Some(usize::from(import.range().start()));
            return;
        }
    }
    for_each_child_stmt(stmt, &mut |child| visit_for_wildcard(child, found));
}

/// Walks into the statement bodies that execute eagerly (or, for a
/// `FunctionDef`/`ClassDef`, are owned by) `stmt`, invoking `f` on each
/// direct child statement. Shared by [`bindings_of`](crate::bindings::bindings_of),
/// [`hard_references`], and [`first_wildcard_import`] so the three stay
/// consistent about which compound-statement bodies are "part of" the
/// enclosing scope rather than a nested one.
pub(crate) fn for_each_child_stmt(stmt: &Stmt, f: &mut impl FnMut(&Stmt)) {
    match stmt {
        Stmt::FunctionDef(node) => node.body.iter().for_each(f),
        Stmt::ClassDef(node) => node.body.iter().for_each(f),
        Stmt::For(node) => {
            node.body.iter().for_each(&mut *f);
            node.orelse.iter().for_each(f);
        }
        Stmt::While(node) => {
            node.body.iter().for_each(&mut *f);
            node.orelse.iter().for_each(f);
        }
        Stmt::If(node) => {
            node.body.iter().for_each(&mut *f);
            for clause in &node.elif_else_clauses {
                clause.body.iter().for_each(&mut *f);
            }
        }
        Stmt::With(node) => node.body.iter().for_each(f),
        Stmt::Try(node) => {
            node.body.iter().for_each(&mut *f);
            for handler in &node.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                handler.body.iter().for_each(&mut *f);
            }
            node.orelse.iter().for_each(&mut *f);
            node.finalbody.iter().for_each(f);
        }
        Stmt::Match(node) => {
            for case in &node.cases {
                case.body.iter().for_each(&mut *f);
            }
        }
        _ => {}
    }
}

/// Collects names bound *anywhere* inside `stmt`'s subtree: parameters,
/// loop/with/except targets, comprehension variables, and local
/// assignments. Flattened across nesting depth rather than popped per
/// scope — a deliberately conservative approximation that only ever
/// suppresses a reference, never invents one.
fn collect_locally_bound_in_stmt(stmt: &Stmt, bound: &mut HashSet<String>) {
    match stmt {
        Stmt::FunctionDef(node) => {
            for parameter in all_parameter_names(&node.parameters) {
                bound.insert(parameter);
            }
            node.body.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
        }
        Stmt::ClassDef(node) => {
            node.body.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
        }
        Stmt::Assign(node) => node.targets.iter().for_each(|t| collect_bound_in_expr(t, bound)),
        Stmt::AnnAssign(node) => collect_bound_in_expr(&node.target, bound),
        Stmt::AugAssign(node) => collect_bound_in_expr(&node.target, bound),
        Stmt::For(node) => {
            collect_bound_in_expr(&node.target, bound);
            node.body.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
            node.orelse.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
        }
        Stmt::While(node) => {
            node.body.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
            node.orelse.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
        }
        Stmt::If(node) => {
            node.body.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
            for clause in &node.elif_else_clauses {
                clause.body.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
            }
        }
        Stmt::With(node) => {
            for item in &node.items {
                if let Some(target) = &item.optional_vars {
                    collect_bound_in_expr(target, bound);
                }
            }
            node.body.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
        }
        Stmt::Try(node) => {
            node.body.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
            for handler in &node.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                if let Some(name) = &handler.name {
                    bound.insert(name.to_string());
                }
                handler.body.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
            }
            node.orelse.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
            node.finalbody.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
        }
        Stmt::Match(node) => {
            for case in &node.cases {
                case.body.iter().for_each(|s| collect_locally_bound_in_stmt(s, bound));
            }
        }
        Stmt::Global(node) => node.names.iter().for_each(|n| {
            bound.insert(n.to_string());
        }),
        Stmt::Nonlocal(node) => node.names.iter().for_each(|n| {
            bound.insert(n.to_string());
        }),
        Stmt::Import(node) => node.names.iter().for_each(|alias| {
            let name = alias
                .asname
                .as_ref()
                .map_or_else(|| alias.name.as_str().split('.').next().unwrap_or_default().to_owned(), ToString::to_string);
            bound.insert(name);
        }),
        Stmt::ImportFrom(node) => node.names.iter().for_each(|alias| {
            bound.insert(alias.asname.as_ref().unwrap_or(&alias.name).to_string());
        }),
        _ => {}
    }
}

/// Every name a `def`'s parameter list binds: positional-only, regular,
/// keyword-only, plus `*args`/`**kwargs` if present.
fn all_parameter_names(parameters: &ast::Parameters) -> Vec<String> {
    let mut names: Vec<String> = parameters
        .posonlyargs
        .iter()
        .chain(parameters.args.iter())
        .chain(parameters.kwonlyargs.iter())
        .map(|p| p.parameter.name.to_string())
        .collect();
    for variadic in [&parameters.vararg, &parameters.kwarg].into_iter().flatten() {
        names.push(variadic.name.to_string());
    }
    names
}

fn collect_bound_in_expr(expr: &Expr, bound: &mut HashSet<String>) {
    match expr {
        Expr::Name(name) => {
            bound.insert(name.id.to_string());
        }
        Expr::Tuple(tuple) => tuple.elts.iter().for_each(|e| collect_bound_in_expr(e, bound)),
        Expr::List(list) => list.elts.iter().for_each(|e| collect_bound_in_expr(e, bound)),
        Expr::Starred(starred) => collect_bound_in_expr(&starred.value, bound),
        _ => {}
    }
}

fn visit_stmt(stmt: &Stmt, bound: &HashSet<String>, refs: &mut Vec<Reference>) {
    match stmt {
        Stmt::FunctionDef(node) => {
            for decorator in &node.decorator_list {
                visit_expr(&decorator.expression, bound, refs);
            }
            for with_default in node
                .parameters
                .posonlyargs
                .iter()
                .chain(node.parameters.args.iter())
                .chain(node.parameters.kwonlyargs.iter())
            {
                if let Some(default) = &with_default.default {
                    visit_expr(default, bound, refs);
                }
                if let Some(annotation) = &with_default.parameter.annotation {
                    visit_expr(annotation, bound, refs);
                }
            }
            for variadic in [&node.parameters.vararg, &node.parameters.kwarg].into_iter().flatten() {
                if let Some(annotation) = &variadic.annotation {
                    visit_expr(annotation, bound, refs);
                }
            }
            if let Some(returns) = &node.returns {
                visit_expr(returns, bound, refs);
            }
            node.body.iter().for_each(|s| visit_stmt(s, bound, refs));
        }
        Stmt::ClassDef(node) => {
            for decorator in &node.decorator_list {
                visit_expr(&decorator.expression, bound, refs);
            }
            if let Some(arguments) = &node.arguments {
                arguments.args.iter().for_each(|e| visit_expr(e, bound, refs));
                arguments.keywords.iter().for_each(|kw| visit_expr(&kw.value, bound, refs));
            }
            node.body.iter().for_each(|s| visit_stmt(s, bound, refs));
        }
        Stmt::Return(node) => {
            if let Some(value) = &node.value {
                visit_expr(value, bound, refs);
            }
        }
        Stmt::Delete(node) => node.targets.iter().for_each(|e| visit_expr(e, bound, refs)),
        Stmt::Assign(node) => {
            visit_expr(&node.value, bound, refs);
            node.targets.iter().for_each(|t| visit_non_name_parts(t, bound, refs));
        }
        Stmt::AnnAssign(node) => {
            visit_expr(&node.annotation, bound, refs);
            if let Some(value) = &node.value {
                visit_expr(value, bound, refs);
            }
            visit_non_name_parts(&node.target, bound, refs);
        }
        Stmt::AugAssign(node) => {
            visit_expr(&node.value, bound, refs);
            visit_expr(&node.target, bound, refs);
        }
        Stmt::TypeAlias(node) => visit_expr(&node.value, bound, refs),
        Stmt::For(node) => {
            visit_expr(&node.iter, bound, refs);
            visit_non_name_parts(&node.target, bound, refs);
            node.body.iter().for_each(|s| visit_stmt(s, bound, refs));
            node.orelse.iter().for_each(|s| visit_stmt(s, bound, refs));
        }
        Stmt::While(node) => {
            visit_expr(&node.test, bound, refs);
            node.body.iter().for_each(|s| visit_stmt(s, bound, refs));
            node.orelse.iter().for_each(|s| visit_stmt(s, bound, refs));
        }
        Stmt::If(node) => {
            visit_expr(&node.test, bound, refs);
            node.body.iter().for_each(|s| visit_stmt(s, bound, refs));
            for clause in &node.elif_else_clauses {
                if let Some(test) = &clause.test {
                    visit_expr(test, bound, refs);
                }
                clause.body.iter().for_each(|s| visit_stmt(s, bound, refs));
            }
        }
        Stmt::With(node) => {
            for item in &node.items {
                visit_expr(&item.context_expr, bound, refs);
            }
            node.body.iter().for_each(|s| visit_stmt(s, bound, refs));
        }
        Stmt::Raise(node) => {
            if let Some(exc) = &node.exc {
                visit_expr(exc, bound, refs);
            }
            if let Some(cause) = &node.cause {
                visit_expr(cause, bound, refs);
            }
        }
        Stmt::Try(node) => {
            node.body.iter().for_each(|s| visit_stmt(s, bound, refs));
            for handler in &node.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                if let Some(kind) = &handler.type_ {
                    visit_expr(kind, bound, refs);
                }
                handler.body.iter().for_each(|s| visit_stmt(s, bound, refs));
            }
            node.orelse.iter().for_each(|s| visit_stmt(s, bound, refs));
            node.finalbody.iter().for_each(|s| visit_stmt(s, bound, refs));
        }
        Stmt::Assert(node) => {
            visit_expr(&node.test, bound, refs);
            if let Some(msg) = &node.msg {
                visit_expr(msg, bound, refs);
            }
        }
        Stmt::Match(node) => {
            visit_expr(&node.subject, bound, refs);
            for case in &node.cases {
                if let Some(guard) = &case.guard {
                    visit_expr(guard, bound, refs);
                }
                case.body.iter().for_each(|s| visit_stmt(s, bound, refs));
            }
        }
        Stmt::Expr(node) => visit_expr(&node.value, bound, refs),
        _ => {}
    }
}

/// Visits only the non-`Name` parts of an assignment-like target, e.g.
/// the receiver in `self.x = ...` or the collection in `d[k] = ...`: the
/// bound name itself was already recorded by [`collect_bound_in_expr`].
fn visit_non_name_parts(target: &Expr, bound: &HashSet<String>, refs: &mut Vec<Reference>) {
    match target {
        Expr::Name(_) => {}
        Expr::Tuple(tuple) => tuple.elts.iter().for_each(|e| visit_non_name_parts(e, bound, refs)),
        Expr::List(list) => list.elts.iter().for_each(|e| visit_non_name_parts(e, bound, refs)),
        Expr::Starred(starred) => visit_non_name_parts(&starred.value, bound, refs),
        Expr::Attribute(attr) => visit_expr(&attr.value, bound, refs),
        Expr::Subscript(sub) => {
            visit_expr(&sub.value, bound, refs);
            visit_expr(&sub.slice, bound, refs);
        }
        _ => visit_expr(target, bound, refs),
    }
}

fn visit_expr(expr: &Expr, bound: &HashSet<String>, refs: &mut Vec<Reference>) {
    match expr {
        Expr::Name(name) => {
            if !bound.contains(name.id.as_str()) {
                refs.push(Reference {
                    name: name.id.to_string(),
                    offset: usize::from(name.range().start()),
                });
            }
        }
        Expr::Attribute(attr) => {
            visit_expr(&attr.value, bound, refs);
            if !bound.contains(attr.attr.as_str()) {
                refs.push(Reference {
                    name: attr.attr.to_string(),
                    offset: usize::from(attr.attr.range().start()),
                });
            }
        }
        Expr::Call(call) => {
            visit_expr(&call.func, bound, refs);
            call.arguments.args.iter().for_each(|e| visit_expr(e, bound, refs));
            call.arguments.keywords.iter().for_each(|kw| visit_expr(&kw.value, bound, refs));
        }
        Expr::BoolOp(node) => node.values.iter().for_each(|e| visit_expr(e, bound, refs)),
        Expr::BinOp(node) => {
            visit_expr(&node.left, bound, refs);
            visit_expr(&node.right, bound, refs);
        }
        Expr::UnaryOp(node) => visit_expr(&node.operand, bound, refs),
        Expr::Lambda(node) => {
            if let Some(parameters) = &node.parameters {
                for with_default in parameters
                    .posonlyargs
                    .iter()
                    .chain(parameters.args.iter())
                    .chain(parameters.kwonlyargs.iter())
                {
                    if let Some(default) = &with_default.default {
                        visit_expr(default, bound, refs);
                    }
                }
            }
            visit_expr(&node.body, bound, refs);
        }
        Expr::If(node) => {
            visit_expr(&node.test, bound, refs);
            visit_expr(&node.body, bound, refs);
            visit_expr(&node.orelse, bound, refs);
        }
        Expr::Dict(node) => {
            for item in &node.items {
                if let Some(key) = &item.key {
                    visit_expr(key, bound, refs);
                }
                visit_expr(&item.value, bound, refs);
            }
        }
        Expr::Set(node) => node.elts.iter().for_each(|e| visit_expr(e, bound, refs)),
        Expr::ListComp(node) => {
            visit_expr(&node.elt, bound, refs);
            visit_comprehensions(&node.generators, bound, refs);
        }
        Expr::SetComp(node) => {
            visit_expr(&node.elt, bound, refs);
            visit_comprehensions(&node.generators, bound, refs);
        }
        Expr::DictComp(node) => {
            visit_expr(&node.key, bound, refs);
            visit_expr(&node.value, bound, refs);
            visit_comprehensions(&node.generators, bound, refs);
        }
        Expr::Generator(node) => {
            visit_expr(&node.elt, bound, refs);
            visit_comprehensions(&node.generators, bound, refs);
        }
        Expr::Await(node) => visit_expr(&node.value, bound, refs),
        Expr::Yield(node) => {
            if let Some(value) = &node.value {
                visit_expr(value, bound, refs);
            }
        }
        Expr::YieldFrom(node) => visit_expr(&node.value, bound, refs),
        Expr::Compare(node) => {
            visit_expr(&node.left, bound, refs);
            node.comparators.iter().for_each(|e| visit_expr(e, bound, refs));
        }
        Expr::Subscript(node) => {
            visit_expr(&node.value, bound, refs);
            visit_expr(&node.slice, bound, refs);
        }
        Expr::Starred(node) => visit_expr(&node.value, bound, refs),
        Expr::List(node) => node.elts.iter().for_each(|e| visit_expr(e, bound, refs)),
        Expr::Tuple(node) => node.elts.iter().for_each(|e| visit_expr(e, bound, refs)),
        Expr::Slice(node) => {
            [&node.lower, &node.upper, &node.step].into_iter().flatten().for_each(|e| visit_expr(e, bound, refs));
        }
        Expr::Named(node) => {
            visit_expr(&node.value, bound, refs);
        }
        // f-string interpolations aren't walked: they hold formatting/display
        // expressions, not the kind of load-bearing reference this analysis
        // needs to order definitions by.
        _ => {}
    }
}

fn visit_comprehensions(generators: &[ast::Comprehension], bound: &HashSet<String>, refs: &mut Vec<Reference>) {
    for generator in generators {
        visit_expr(&generator.iter, bound, refs);
        generator.ifs.iter().for_each(|e| visit_expr(e, bound, refs));
    }
}

#[cfg(test)]
mod tests {
    use ruff_python_parser::parse_module;

    use super::*;

    fn refs_of(source: &str) -> Vec<String> {
        let parsed = parse_module(source).expect("valid python");
        free_references(&parsed.into_syntax().body[0]).into_iter().map(|r| r.name).collect()
    }

    #[test]
    fn finds_reference_nested_in_function_body() {
        assert_eq!(refs_of("def public():\n    return _private()\n"), vec!["_private"]);
    }

    #[test]
    fn parameter_shadows_outer_reference() {
        assert_eq!(refs_of("def f(x):\n    return x + 1\n"), Vec::<String>::new());
    }

    #[test]
    fn private_attribute_access_is_a_reference() {
        assert_eq!(refs_of("def f(self):\n    return self._helper()\n"), vec!["_helper"]);
    }

    #[test]
    fn wildcard_import_is_detected() {
        let parsed = parse_module("from odoo import *\n").expect("valid python");
        assert!(first_wildcard_import(&parsed.into_syntax().body[0]).is_some());
    }
}
