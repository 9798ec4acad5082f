//! Dirty and touched bookkeeping

use super::Form;
use crate::path::{get_path, is_truthy, Path, Prune};
use crate::store::{set_observable_path, unset_observable_path};
use serde_json::Value;

impl Form {
    /// Whole-form dirtiness: the value tree differs from the defaults.
    ///
    /// A form created disabled is never dirty. With both `name` and `value`
    /// given, the value is written first.
    pub fn get_dirty(&self, name: Option<&str>, value: Option<Value>) -> bool {
        if self.options().disabled {
            return false;
        }
        if let (Some(name), Some(value)) = (name, value) {
            set_observable_path(&self.inner.values, &Path::parse(name), value);
        }
        self.peek_values() != self.default_values()
    }

    /// Refresh the dirty mirror entry for `name` and, on blur, mark it
    /// touched. Returns true when any flag changed.
    ///
    /// The dirty side runs for change events and for blur events with
    /// `should_dirty`; it is skipped entirely for disabled forms.
    pub(crate) fn update_touch_and_dirty(&self, name: &str, is_blur: bool, should_dirty: bool) -> bool {
        let path = Path::parse(name);
        if path.is_empty() || path.contains_forbidden() {
            return false;
        }
        let mut changed = false;

        self.inner.store.batch(|| {
            if !self.options().disabled && (!is_blur || should_dirty) {
                let was_dirty = self.flag("isDirty");
                let is_dirty = self.get_dirty(None, None);
                if was_dirty != is_dirty {
                    self.set_flag("isDirty", is_dirty);
                    changed = true;
                }

                let field_disabled = self.field(name).is_some_and(|field| field.is_disabled());
                let current = self.inner.values.at(&path).peek();
                let pristine =
                    field_disabled || get_path(&self.default_values(), &path) == current.as_ref();
                let dirty = self.dirty_node();
                let was_field_dirty = dirty.at(&path).with(|value| value.is_some_and(is_truthy));
                if pristine {
                    unset_observable_path(&dirty, &path, Prune::Holes);
                } else {
                    set_observable_path(&dirty, &path, Value::Bool(true));
                }
                changed |= was_field_dirty == pristine;
            }

            if is_blur {
                changed |= self.mark_touched_path(&path);
            }
        });

        changed
    }

    /// Mark `name` touched. Already-touched fields are left alone, so a
    /// repeat blur writes nothing and notifies nobody.
    pub fn mark_touched(&self, name: &str) -> bool {
        let path = Path::parse(name);
        if path.is_empty() {
            return false;
        }
        self.mark_touched_path(&path)
    }

    fn mark_touched_path(&self, path: &Path) -> bool {
        let touched = self.touched_node();
        if touched.at(path).with(|value| value.is_some_and(is_truthy)) {
            return false;
        }
        set_observable_path(&touched, path, Value::Bool(true)).is_some()
    }

    pub(crate) fn is_touched(&self, name: &str) -> bool {
        let path = Path::parse(name);
        !path.is_empty() && self.touched_node().at(&path).with(|value| value.is_some_and(is_truthy))
    }
}
