//! End-to-end sorting over small, representative Odoo-shaped files.
//!
//! Grounded on the corpus's own idempotence check (`test_samples.py`
//! parametrizes over a directory of before/after fixtures and asserts
//! that sorting an already-sorted file is a no-op): every scenario here
//! asserts the same property, since no fixture data shipped with the
//! distilled specification to replay verbatim.

use osort::{Policy, Source, SortOptions};

fn sort_text(source: &str) -> String {
    let result = osort::sort(Source::Text(source.to_owned()), &SortOptions::default()).expect("sorts cleanly");
    result.as_text().expect("text in, text out").to_owned()
}

#[test]
fn model_class_moves_fields_before_compute_methods_and_orm_overrides_last() {
    let source = "\
from odoo import api, fields, models


class SaleOrderLine(models.Model):
    _inherit = \"sale.order.line\"

    def write(self, vals):
        return super().write(vals)

    @api.depends(\"product_id\")
    def _compute_display_name_suffix(self):
        for line in self:
            line.display_name_suffix = line.product_id.name

    display_name_suffix = fields.Char()

    def action_confirm_line(self):
        self.ensure_one()
";
    let sorted = sort_text(source);

    let order = ["_inherit", "display_name_suffix", "_compute_display_name_suffix", "write", "action_confirm_line"];
    let mut positions = Vec::new();
    for name in order {
        let pos = sorted.find(name).unwrap_or_else(|| panic!("expected to find {name} in output"));
        positions.push(pos);
    }
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "unexpected order in:\n{sorted}");
}

#[test]
fn lifecycle_hook_sorts_before_regular_method_and_private_helper_before_caller() {
    let source = "\
class Widget:
    def render(self):
        return self._render_inner()

    def __init__(self, name):
        self.name = name

    def _render_inner(self):
        return self.name
";
    let sorted = sort_text(source);
    assert!(sorted.find("__init__").unwrap() < sorted.find("_render_inner").unwrap());
    assert!(sorted.find("_render_inner").unwrap() < sorted.find("render").unwrap());
}

#[test]
fn already_sorted_module_is_a_byte_for_byte_no_op() {
    let source = "def _helper():\n    pass\n\n\ndef public():\n    return _helper()\n";
    assert_eq!(sort_text(source), source);
}

#[test]
fn sorting_twice_is_idempotent() {
    let source = "\
class Model:
    def action_do(self):
        return self._do()

    def _do(self):
        return 1

    def __init__(self):
        pass
";
    let once = sort_text(source);
    let twice = sort_text(&once);
    assert_eq!(once, twice);
}

#[test]
fn unresolved_module_reference_can_be_ignored_instead_of_raised() {
    let source = "def fun():\n    undefined_name()\n";
    let mut options = SortOptions::default();
    options.on_unresolved = Policy::Ignore;
    let result = osort::sort(Source::Text(source.to_owned()), &options).expect("ignored, not raised");
    assert_eq!(result.as_text().unwrap(), source);
}

#[test]
fn wildcard_import_can_be_ignored_to_leave_the_file_untouched() {
    let source = "from module import *\n\ndef public():\n    return _private()\n\ndef _private():\n    pass\n";
    let mut options = SortOptions::default();
    options.on_wildcard_import = Policy::Ignore;
    let result = osort::sort(Source::Text(source.to_owned()), &options).expect("ignored, not raised");
    assert_eq!(result.as_text().unwrap(), source);
}

#[test]
fn decoding_error_can_be_observed_via_a_custom_handler() {
    let bytes = b"# coding=ascii\nx = \"\xe9\"\n".to_vec();
    let seen = std::rc::Rc::new(std::cell::RefCell::new(None));
    let mut options = SortOptions::default();
    options.on_decoding_error = Policy::custom({
        let seen = std::rc::Rc::clone(&seen);
        Box::new(move |err: &osort::DecodingError| {
            *seen.borrow_mut() = Some(err.message.clone());
        }) as Box<dyn Fn(&osort::DecodingError)>
    });
    let result = osort::sort(Source::Bytes(bytes.clone()), &options).expect("custom never raises");
    match result {
        Source::Bytes(out) => assert_eq!(out, bytes),
        Source::Text(_) => panic!("bytes in, bytes out"),
    }
    assert!(seen.borrow().is_some());
}
