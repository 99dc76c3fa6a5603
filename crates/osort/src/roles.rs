//! Class-body role buckets (spec.md §3): the closed identifier lists that
//! give "dunder" and framework methods a hard-coded position, and the
//! predicates that sort a class body's statements into buckets before
//! they are reassembled in bucket order.

use ruff_python_ast::Stmt;

use crate::statement::Statement;

/// Attributes that always lead a class body, in this order.
pub const SPECIAL_PROPERTIES: &[&str] = &["__doc__", "__slots__"];

/// Lifecycle/metaclass/descriptor dunders, in the order they should sort.
pub const LIFECYCLE_OPERATIONS: &[&str] = &[
    "__new__",
    "__init__",
    "__del__",
    "__copy__",
    "__deepcopy__",
    "__init_subclass__",
    "__instancecheck__",
    "__subclasscheck__",
    "__class_getitem__",
    "__get__",
    "__set__",
    "__delete__",
    "__set_name__",
];

/// Operator-overload and protocol dunders, in the order they should sort.
pub const REGULAR_OPERATIONS: &[&str] = &[
    "__call__",
    "__getattr__",
    "__getattribute__",
    "__setattr__",
    "__delattr__",
    "__dir__",
    "__getitem__",
    "__setitem__",
    "__delitem__",
    "__missing__",
    "__iter__",
    "__reversed__",
    "__contains__",
    "__len__",
    "__length_hint__",
    "__add__",
    "__radd__",
    "__iadd__",
    "__sub__",
    "__rsub__",
    "__isub__",
    "__mul__",
    "__rmul__",
    "__imul__",
    "__matmul__",
    "__rmatmul__",
    "__imatmul__",
    "__truediv__",
    "__rtruediv__",
    "__itruediv__",
    "__floordiv__",
    "__rfloordiv__",
    "__ifloordiv__",
    "__mod__",
    "__rmod__",
    "__imod__",
    "__divmod__",
    "__rdivmod__",
    "__pow__",
    "__rpow__",
    "__ipow__",
    "__lshift__",
    "__rlshift__",
    "__ilshift__",
    "__rshift__",
    "__rrshift__",
    "__irshift__",
    "__and__",
    "__rand__",
    "__iand__",
    "__xor__",
    "__rxor__",
    "__ixor__",
    "__or__",
    "__ror__",
    "__ior__",
    "__neg__",
    "__pos__",
    "__abs__",
    "__invert__",
    "__lt__",
    "__le__",
    "__eq__",
    "__ne__",
    "__gt__",
    "__ge__",
    "__hash__",
    "__bool__",
    "__complex__",
    "__int__",
    "__float__",
    "__index__",
    "__round__",
    "__trunc__",
    "__floor__",
    "__ceil__",
    "__enter__",
    "__exit__",
    "__await__",
    "__aiter__",
    "__anext__",
    "__aenter__",
    "__aexit__",
    "__getnewargs_ex__",
    "__reduce__",
    "__getstate__",
    "__setstate__",
    "__repr__",
    "__str__",
    "__bytes__",
    "__format__",
];

/// Attributes placed right after the field definitions.
pub const ODOO_SPECIAL_ATTRIBUTES: &[&str] = &["_sql_constraints", "init"];

/// Model-declaration attributes (`_name`, `_inherit`, ...), sorted first
/// among attributes.
pub const ODOO_PRIVATE_ATTRIBUTES: &[&str] = &[
    "_name",
    "_description",
    "_inherit",
    "_inherits",
    "_abstract",
    "_active_name",
    "_allow_sudo_commands",
    "_auto",
    "_check_company_auto",
    "_custom",
    "_depends",
    "_fold_name",
    "_module",
    "_order",
    "_parent_name",
    "_parent_store",
    "_rec_name",
    "_rec_names_search",
    "_register",
    "_table",
    "_table_query",
    "_transient",
    "_translate",
    "_sql_constraints",
];

/// ORM methods that models commonly override, sorted into a fixed order.
pub const ODOO_MODEL_METHODS: &[&str] = &[
    "__ensure_xml_id",
    "action_archive",
    "action_unarchive",
    "_add_fake_fields",
    "_add_field",
    "_add_inherited_fields",
    "_add_missing_default_values",
    "_add_precomputed_values",
    "_add_sql_constraints",
    "_apply_ir_rules",
    "_apply_onchange_methods",
    "_as_query",
    "_auto_init",
    "browse",
    "_build_model",
    "_build_model_attributes",
    "_build_model_check_base",
    "_build_model_check_parent",
    "_cache",
    "check_access_rights",
    "check_access_rule",
    "_check_company",
    "_check_company_domain",
    "check_field_access_rights",
    "_check_m2m_recursion",
    "_check_parent_path",
    "_check_qorder",
    "_check_recursion",
    "_check_removed_columns",
    "clear_caches",
    "_compute_display_name",
    "_compute_field_value",
    "_constraint_methods",
    "_convert_records",
    "_convert_to_record",
    "_convert_to_write",
    "copy",
    "copy_data",
    "copy_multi",
    "copy_translations",
    "create",
    "_create",
    "default_get",
    "_determine_fields_to_fetch",
    "ensure_one",
    "exists",
    "export_data",
    "_export_rows",
    "_extract_records",
    "fetch",
    "_fetch_field",
    "_fetch_query",
    "_field_properties_to_sql",
    "_field_to_sql",
    "fields_get",
    "_filter_access_rules",
    "_filter_access_rules_python",
    "filtered",
    "filtered_domain",
    "_flush",
    "flush_model",
    "flush_recordset",
    "_flush_search",
    "_generate_order_by",
    "_get_base_lang",
    "get_base_url",
    "get_external_id",
    "_get_external_ids",
    "get_field_translations",
    "get_metadata",
    "_get_placeholder_filename",
    "get_property_definition",
    "grouped",
    "_has_onchange",
    "ids",
    "_in_cache_without",
    "_inherits_check",
    "_inherits_join_calc",
    "init",
    "_init_column",
    "_init_constraints_onchanges",
    "_invalidate_cache",
    "invalidate_model",
    "invalidate_recordset",
    "_is_an_ordinary_table",
    "is_transient",
    "load",
    "_load_records",
    "_load_records_create",
    "_load_records_write",
    "mapped",
    "_mapped_func",
    "modified",
    "_modified",
    "_modified_triggers",
    "name_create",
    "name_get",
    "name_search",
    "_name_search",
    "new",
    "onchange",
    "_onchange_methods",
    "_ondelete_methods",
    "_order_field_to_sql",
    "_order_to_sql",
    "_origin",
    "_parent_store_compute",
    "_parent_store_create",
    "_parent_store_update",
    "_parent_store_update_prepare",
    "_pop_field",
    "_populate",
    "_populate_dependencies",
    "_populate_factories",
    "_populate_sizes",
    "_prepare_create_values",
    "_prepare_setup",
    "read",
    "_read_format",
    "read_group",
    "_read_group",
    "_read_group_check_field_access_rights",
    "_read_group_empty_value",
    "_read_group_expand_full",
    "_read_group_fill_results",
    "_read_group_fill_temporal",
    "_read_group_format_result",
    "_read_group_format_result_properties",
    "_read_group_groupby",
    "_read_group_having",
    "_read_group_orderby",
    "_read_group_postprocess_aggregate",
    "_read_group_postprocess_groupby",
    "_read_group_select",
    "_rec_name_fallback",
    "_recompute_field",
    "_recompute_model",
    "_recompute_recordset",
    "_register_hook",
    "search",
    "_search",
    "search_count",
    "search_fetch",
    "search_read",
    "_setup_base",
    "_setup_complete",
    "_setup_fields",
    "sorted",
    "sudo",
    "_table_has_rows",
    "toggle_active",
    "unlink",
    "_unregister_hook",
    "update",
    "_update_cache",
    "update_field_translations",
    "_update_field_translations",
    "user_has_groups",
    "_valid_field_parameter",
    "_validate_fields",
    "_where_calc",
    "with_company",
    "with_context",
    "with_env",
    "with_prefetch",
    "with_user",
    "write",
    "_write",
];

pub fn is_string_literal(statement: &Statement) -> bool {
    let Stmt::Expr(expr_stmt) = &statement.node else {
        return false;
    };
    matches!(&*expr_stmt.value, ruff_python_ast::Expr::StringLiteral(_))
}

pub fn is_special_property(statement: &Statement) -> bool {
    statement.bindings().iter().any(|b| SPECIAL_PROPERTIES.contains(&b.as_str()))
}

pub fn is_odoo_special_attribute(statement: &Statement) -> bool {
    statement.bindings().iter().any(|b| ODOO_SPECIAL_ATTRIBUTES.contains(&b.as_str()))
}

pub fn is_lifecycle_operation(statement: &Statement) -> bool {
    statement.bindings().iter().any(|b| LIFECYCLE_OPERATIONS.contains(&b.as_str()))
}

pub fn is_regular_operation(statement: &Statement) -> bool {
    statement.bindings().iter().any(|b| REGULAR_OPERATIONS.contains(&b.as_str()))
}

fn is_assign_like(statement: &Statement) -> bool {
    matches!(statement.node, Stmt::Assign(_) | Stmt::AnnAssign(_) | Stmt::AugAssign(_))
}

pub fn is_odoo_private_attribute(statement: &Statement) -> bool {
    is_assign_like(statement) && statement.bindings().iter().any(|b| ODOO_PRIVATE_ATTRIBUTES.contains(&b.as_str()))
}

pub fn is_private_attribute(statement: &Statement) -> bool {
    is_assign_like(statement)
        && statement
            .bindings()
            .iter()
            .all(|b| b.starts_with('_') && !ODOO_PRIVATE_ATTRIBUTES.contains(&b.as_str()))
}

pub fn is_field(statement: &Statement) -> bool {
    is_assign_like(statement)
        && statement.bindings().iter().all(|b| !b.starts_with('_'))
        && statement.text().contains("fields.")
}

pub fn is_property(statement: &Statement) -> bool {
    is_assign_like(statement)
}

fn is_function_def(statement: &Statement) -> bool {
    matches!(statement.node, Stmt::FunctionDef(_))
}

pub fn is_default_method(statement: &Statement) -> bool {
    is_function_def(statement)
        && statement.bindings().iter().all(|b| b == "default_get" || b.starts_with("_default_"))
}

fn has_decorator_named(statement: &Statement, name: &str) -> bool {
    let Stmt::FunctionDef(f) = &statement.node else {
        return false;
    };
    f.decorator_list.iter().any(|dec| decorator_attr(&dec.expression) == Some(name))
}

/// The trailing attribute name of a decorator expression, e.g. `depends`
/// for both `@api.depends(...)` and `@api.depends`.
fn decorator_attr(expr: &ruff_python_ast::Expr) -> Option<&str> {
    use ruff_python_ast::Expr;
    match expr {
        Expr::Call(call) => decorator_attr(&call.func),
        Expr::Attribute(attr) => Some(attr.attr.as_str()),
        Expr::Name(name) => Some(name.id.as_str()),
        _ => None,
    }
}

pub fn is_compute_method(statement: &Statement) -> bool {
    is_function_def(statement)
        && (has_decorator_named(statement, "depends")
            || statement
                .bindings()
                .iter()
                .all(|b| b.starts_with("_compute_") || b.starts_with("_inverse_") || b.starts_with("_search_")))
}

pub fn is_selection_method(statement: &Statement) -> bool {
    is_function_def(statement) && statement.bindings().iter().all(|b| b.starts_with("_selection_"))
}

pub fn is_constraint_method(statement: &Statement) -> bool {
    is_function_def(statement) && has_decorator_named(statement, "constrains")
}

pub fn is_onchange_method(statement: &Statement) -> bool {
    is_function_def(statement) && has_decorator_named(statement, "onchange")
}

pub fn is_orm_override(statement: &Statement) -> bool {
    is_function_def(statement) && statement.bindings().iter().any(|b| ODOO_MODEL_METHODS.contains(&b.as_str()))
}

pub fn is_action(statement: &Statement) -> bool {
    is_function_def(statement) && statement.bindings().iter().any(|b| b.starts_with("action_"))
}

pub fn is_class(statement: &Statement) -> bool {
    matches!(statement.node, Stmt::ClassDef(_))
}

/// A key function over binding names, used as the primary sort key for a
/// bucket: the position of a name in a fixed reference list, or
/// [`usize::MAX`] if the name isn't in the list at all.
pub fn sort_key_from_iter<'a>(names: &'a [&'a str]) -> impl Fn(&str) -> usize + 'a {
    move |name| names.iter().position(|&n| n == name).unwrap_or(usize::MAX)
}

/// A key function over binding names that orders methods by the position
/// of their associated *field* among `fields`, inferred from the method
/// name's ending (`_compute_foo`, `_onchange_foo`, ... all key on `foo`).
/// Falls back to [`usize::MAX`] when no field name is a suffix of the
/// binding.
pub fn sort_key_from_ending<'a>(fields: &'a [String]) -> impl Fn(&str) -> usize + 'a {
    move |name| {
        fields
            .iter()
            .enumerate()
            .filter(|(_, field)| !field.is_empty() && name.ends_with(field.as_str()))
            .max_by_key(|(_, field)| field.len())
            .map_or(usize::MAX, |(index, _)| index)
    }
}

/// Sorts `statements` on `(min(key(binding)) over bindings, bindings[0])`,
/// stably preserving original relative order for true ties.
pub fn sort_by_binding_key(statements: &mut [Statement], key: impl Fn(&str) -> usize) {
    statements.sort_by_cached_key(|statement| {
        let bindings = statement.bindings();
        let min_key = bindings.iter().map(|b| key(b)).min().unwrap_or(usize::MAX);
        (min_key, bindings.first().cloned().unwrap_or_default())
    });
}
