use super::resolve_form;
use crate::error::FormResult;
use crate::form::Form;
use crate::store::Subscription;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct UseWatchProps {
    /// Watch the whole value tree when absent.
    pub name: Option<String>,
    pub form: Option<Form>,
}

impl UseWatchProps {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            form: None,
        }
    }

    pub fn form(mut self, form: &Form) -> Self {
        self.form = Some(form.clone());
        self
    }
}

/// Call `callback` with the watched value now and after every change to it.
pub fn use_watch<F>(props: UseWatchProps, callback: F) -> FormResult<Subscription>
where
    F: Fn(Option<Value>) + Send + Sync + 'static,
{
    let form = resolve_form(props.form)?;
    let node = props
        .name
        .as_deref()
        .and_then(|name| form.get_observable(name))
        .unwrap_or_else(|| form.values_node().clone());
    Ok(form.store().observe(move || callback(node.get())))
}
