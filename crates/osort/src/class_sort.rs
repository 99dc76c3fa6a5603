//! Class-body sorting (spec.md §3, §4.4): bucket the body into role
//! groups, order each bucket, then repair the result against two
//! dependency graphs so the final order never breaks a real reference.

use crate::graph::Graph;
use crate::refs;
use crate::roles;
use crate::statement::{self, Statement};

/// Sorts one class statement's body and reassembles it with its header.
/// Returns the class statement's own original text unchanged when the
/// computed order is a no-op (spec.md §3: "never rewrite a file that
/// doesn't need it").
pub fn sort_class(statement: &Statement, sort_fields: bool) -> String {
    let (head_text, body) = statement::split_class(statement);

    if body.is_empty() {
        return statement.text().to_owned();
    }

    let initialisation_graph = build_initialisation_graph(&body);

    let bucketed = bucket_sort(body.clone(), sort_fields);

    let init_on_bucketed = initialisation_graph.remap(&body, &bucketed);
    let after_init = reorder(&bucketed, &init_on_bucketed);

    let runtime_graph = build_runtime_graph(&after_init);
    let mut merged = runtime_graph;
    merged.merge(&initialisation_graph.remap(&body, &after_init));
    merged.replace_cycles(|i| i);
    let final_order = reorder(&after_init, &merged);

    if final_order == body {
        return statement.text().to_owned();
    }

    // Each statement's own text already carries its trailing newline (and
    // any leading blank-line/comment trivia of the one that follows it in
    // `final_order`), so reassembly is plain concatenation, not a "\n"-join.
    let sorted_bodies: String = final_order.iter().map(|s| sort_statement_text(s, sort_fields)).collect();
    format!("{head_text}{sorted_bodies}")
}

/// Recurses into class statements; every other statement's text is left
/// as-is (it already went through module-level sorting).
pub fn sort_statement_text(statement: &Statement, sort_fields: bool) -> String {
    if roles::is_class(statement) {
        sort_class(statement, sort_fields)
    } else {
        statement.text().to_owned()
    }
}

fn build_initialisation_graph(body: &[Statement]) -> Graph {
    crate::graph::resolve(body, refs::hard_references, false).0
}

fn build_runtime_graph(body: &[Statement]) -> Graph {
    crate::graph::resolve(body, refs::free_references, true).0
}

fn reorder(statements: &[Statement], graph: &Graph) -> Vec<Statement> {
    graph.topological_sort().into_iter().map(|index| statements[index].clone()).collect()
}

/// Stable-partitions `statements` on `predicate`, preserving relative
/// order on both sides.
fn partition(statements: Vec<Statement>, predicate: impl Fn(&Statement) -> bool) -> (Vec<Statement>, Vec<Statement>) {
    let mut matched = Vec::new();
    let mut rest = Vec::new();
    for statement in statements {
        if predicate(&statement) {
            matched.push(statement);
        } else {
            rest.push(statement);
        }
    }
    (matched, rest)
}

/// Groups a class body into role buckets and reassembles them in the
/// fixed order spec.md §3 defines, sorting the hard-coded-order buckets
/// on their closed identifier lists and leaving the rest in original
/// relative order.
fn bucket_sort(statements: Vec<Statement>, sort_fields: bool) -> Vec<Statement> {
    let (docstrings, statements) = match statements.first() {
        Some(first) if roles::is_string_literal(first) => {
            let mut rest = statements;
            let doc = rest.remove(0);
            (vec![doc], rest)
        }
        _ => (Vec::new(), statements),
    };

    let (mut special_properties, statements) = partition(statements, roles::is_special_property);
    let (lifecycle_operations, statements) = partition(statements, roles::is_lifecycle_operation);
    let (regular_operations, statements) = partition(statements, roles::is_regular_operation);
    let (inner_classes, statements) = partition(statements, roles::is_class);
    let (odoo_special_attributes, statements) = partition(statements, roles::is_odoo_special_attribute);
    let (mut odoo_private_attributes, statements) = partition(statements, roles::is_odoo_private_attribute);
    let (other_private_attributes, statements) = partition(statements, roles::is_private_attribute);
    let (orm_overrides, statements) = partition(statements, roles::is_orm_override);
    let (default_methods, statements) = partition(statements, roles::is_default_method);
    let (odoo_fields, statements) = partition(statements, roles::is_field);
    let (compute_methods, statements) = partition(statements, roles::is_compute_method);
    let (selection_methods, statements) = partition(statements, roles::is_selection_method);
    let (constraint_methods, statements) = partition(statements, roles::is_constraint_method);
    let (onchange_methods, statements) = partition(statements, roles::is_onchange_method);
    let (actions, statements) = partition(statements, roles::is_action);
    // `is_property` matches any plain assignment regardless of naming, so
    // it must run last among the assign-targeting predicates — everything
    // more specific (fields, private attributes, ...) has already claimed
    // its statements by this point.
    let (properties, statements) = partition(statements, roles::is_property);
    let methods = statements;

    let mut fields: Vec<String> = odoo_fields.iter().filter_map(|s| s.bindings().into_iter().next()).collect();
    if sort_fields {
        fields.sort();
    }

    roles::sort_by_binding_key(&mut special_properties, roles::sort_key_from_iter(roles::SPECIAL_PROPERTIES));
    roles::sort_by_binding_key(&mut odoo_private_attributes, roles::sort_key_from_iter(roles::ODOO_PRIVATE_ATTRIBUTES));

    let mut default_methods = default_methods;
    default_methods.sort_by_cached_key(|s| {
        let bindings = s.bindings();
        if bindings.first().is_some_and(|b| b == "default_get") {
            (0usize, String::new())
        } else {
            let key = roles::sort_key_from_ending(&fields);
            let min_key = bindings.iter().map(|b| key(b)).min().unwrap_or(usize::MAX);
            (min_key.saturating_add(1), bindings.first().cloned().unwrap_or_default())
        }
    });

    let mut odoo_fields = odoo_fields;
    if sort_fields {
        odoo_fields.sort_by_cached_key(|s| s.bindings().into_iter().next().unwrap_or_default());
    }

    let mut odoo_special_attributes = odoo_special_attributes;
    roles::sort_by_binding_key(&mut odoo_special_attributes, roles::sort_key_from_iter(roles::ODOO_SPECIAL_ATTRIBUTES));

    let mut lifecycle_operations = lifecycle_operations;
    roles::sort_by_binding_key(&mut lifecycle_operations, roles::sort_key_from_iter(roles::LIFECYCLE_OPERATIONS));

    let mut compute_methods = compute_methods;
    roles::sort_by_binding_key(&mut compute_methods, roles::sort_key_from_ending(&fields));

    let mut selection_methods = selection_methods;
    roles::sort_by_binding_key(&mut selection_methods, roles::sort_key_from_ending(&fields));

    let mut constraint_methods = constraint_methods;
    roles::sort_by_binding_key(&mut constraint_methods, roles::sort_key_from_ending(&fields));

    let mut onchange_methods = onchange_methods;
    roles::sort_by_binding_key(&mut onchange_methods, roles::sort_key_from_ending(&fields));

    let mut orm_overrides = orm_overrides;
    roles::sort_by_binding_key(&mut orm_overrides, roles::sort_key_from_iter(roles::ODOO_MODEL_METHODS));

    let mut regular_operations = regular_operations;
    roles::sort_by_binding_key(&mut regular_operations, roles::sort_key_from_iter(roles::REGULAR_OPERATIONS));

    let mut out = Vec::new();
    out.extend(docstrings);
    out.extend(special_properties);
    out.extend(inner_classes);
    out.extend(odoo_private_attributes);
    out.extend(other_private_attributes);
    out.extend(default_methods);
    out.extend(properties);
    out.extend(odoo_fields);
    out.extend(odoo_special_attributes);
    out.extend(lifecycle_operations);
    out.extend(compute_methods);
    out.extend(selection_methods);
    out.extend(constraint_methods);
    out.extend(onchange_methods);
    out.extend(orm_overrides);
    out.extend(actions);
    out.extend(methods);
    out.extend(regular_operations);
    out
}

#[cfg(test)]
mod tests {
    use ruff_python_parser::parse_module;
    use std::sync::Arc;

    use super::*;

    fn class_statement(source: &str) -> Statement {
        let parsed = parse_module(source).expect("valid python");
        let buf: Arc<str> = Arc::from(source);
        statement::segment(&buf, parsed.into_syntax().body, 0, buf.len()).into_iter().next().unwrap()
    }

    #[test]
    fn lifecycle_methods_sort_before_regular_methods() {
        let source = "class Foo:\n    def do_thing(self):\n        pass\n\n    def __init__(self):\n        pass\n";
        let statement = class_statement(source);
        let sorted = sort_class(&statement, false);
        assert!(sorted.find("__init__").unwrap() < sorted.find("do_thing").unwrap());
    }

    #[test]
    fn already_sorted_class_is_a_no_op() {
        let source = "class Foo:\n    def __init__(self):\n        pass\n\n    def do_thing(self):\n        pass\n";
        let statement = class_statement(source);
        assert_eq!(sort_class(&statement, false), source);
    }

    #[test]
    fn private_helper_moves_before_its_caller() {
        let source =
            "class Foo:\n    def do_thing(self):\n        return self._helper()\n\n    def _helper(self):\n        pass\n";
        let statement = class_statement(source);
        let sorted = sort_class(&statement, false);
        assert!(sorted.find("_helper").unwrap() < sorted.find("do_thing").unwrap());
    }
}
