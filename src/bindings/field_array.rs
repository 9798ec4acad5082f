//! Array-valued fields
//!
//! Thin CRUD over the array at one path of the value tree. Every operation
//! is a single store batch; dirty and touched state are left alone.

use super::resolve_form;
use crate::error::FormResult;
use crate::form::Form;
use crate::store::Node;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct UseFieldArrayProps {
    pub name: String,
    pub form: Option<Form>,
}

impl UseFieldArrayProps {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            form: None,
        }
    }

    pub fn form(mut self, form: &Form) -> Self {
        self.form = Some(form.clone());
        self
    }
}

pub fn use_field_array(props: UseFieldArrayProps) -> FormResult<FieldArray> {
    let form = resolve_form(props.form)?;
    Ok(FieldArray { name: props.name, form })
}

/// An array stays as is; anything else becomes a one-element list.
pub fn convert_to_array_payload(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

#[derive(Debug, Clone)]
pub struct FieldArray {
    name: String,
    form: Form,
}

impl FieldArray {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current items. Tracked by observers.
    pub fn fields(&self) -> Vec<Value> {
        self.node()
            .and_then(|node| node.get())
            .and_then(|value| match value {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn append(&self, value: Value) {
        self.edit(|node| node.push(convert_to_array_payload(value)));
    }

    pub fn prepend(&self, value: Value) {
        self.edit(|node| node.insert(0, convert_to_array_payload(value)));
    }

    /// Insert before `index`; past-the-end indexes append.
    pub fn insert(&self, index: usize, value: Value) {
        self.edit(|node| node.insert(index, convert_to_array_payload(value)));
    }

    /// Remove the given indexes, or every item when `None`.
    pub fn remove(&self, indexes: Option<Vec<usize>>) {
        self.edit(|node| match indexes {
            None => node.set(Value::Array(Vec::new())),
            Some(mut indexes) => {
                indexes.sort_unstable();
                indexes.dedup();
                for (removed, index) in indexes.into_iter().enumerate() {
                    node.remove_at(index - removed);
                }
            }
        });
    }

    pub fn replace(&self, value: Value) {
        self.edit(|node| node.set(Value::Array(convert_to_array_payload(value))));
    }

    pub fn update(&self, index: usize, value: Value) {
        self.edit(|node| node.child(index).set(value));
    }

    pub fn swap(&self, a: usize, b: usize) {
        self.edit(|node| {
            let len = node.array_len();
            if a >= len || b >= len || a == b {
                return;
            }
            let (first, second) = (node.child(a), node.child(b));
            let (Some(first_value), Some(second_value)) = (first.peek(), second.peek()) else {
                return;
            };
            first.set(second_value);
            second.set(first_value);
        });
    }

    pub fn move_item(&self, from: usize, to: usize) {
        self.edit(|node| {
            if let Some(item) = node.remove_at(from) {
                node.insert(to, vec![item]);
            }
        });
    }

    fn node(&self) -> Option<Node> {
        self.form.get_observable(&self.name)
    }

    fn edit(&self, f: impl FnOnce(&Node)) {
        let Some(node) = self.node() else {
            tracing::debug!(form = %self.form.id(), "field array without a name");
            return;
        };
        self.form.store().batch(|| f(&node));
    }
}
