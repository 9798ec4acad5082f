//! Form construction

use super::{lock, Form, FormInner, FormState, FORM_STATE, VALUES};
use crate::config::FormOptions;
use crate::resolver::{DefaultValuesProducer, Resolver};
use crate::store::Store;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Attaches the collaborators [`FormOptions`] cannot carry.
pub struct FormBuilder {
    options: FormOptions,
    resolver: Option<Arc<dyn Resolver>>,
    producer: Option<Arc<dyn DefaultValuesProducer>>,
}

impl FormBuilder {
    pub(crate) fn new(options: FormOptions) -> Self {
        Self {
            options,
            resolver: None,
            producer: None,
        }
    }

    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn shared_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Load default values asynchronously. The form reports `isLoading`
    /// until [`Form::reset_default_values`] completes.
    pub fn default_values_producer(mut self, producer: impl DefaultValuesProducer + 'static) -> Self {
        self.producer = Some(Arc::new(producer));
        self
    }

    pub fn build(self) -> Form {
        let id = Uuid::new_v4();
        let mut form_state = FormState::new(self.options.disabled);
        form_state.is_loading = self.producer.is_some();

        let mut root = Map::new();
        root.insert(VALUES.to_string(), self.options.initial_values());
        root.insert(FORM_STATE.to_string(), form_state.to_value());
        let store = Store::new(Value::Object(root));
        let revalidate = self.options.revalidate_on_value_change;

        let form = Form {
            inner: Arc::new(FormInner {
                id,
                values: store.node(VALUES),
                form_state: store.node(FORM_STATE),
                store,
                defaults: Mutex::new(self.options.baseline()),
                options: Mutex::new(self.options),
                resolver: self.resolver,
                producer: self.producer,
                fields: Mutex::new(BTreeMap::new()),
                generation: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                values_watch: Mutex::new(None),
            }),
        };

        if revalidate {
            let weak = Arc::downgrade(&form.inner);
            let subscription = form.inner.values.subscribe(move |values: Option<Value>| {
                if let Some(inner) = weak.upgrade() {
                    Form { inner }.on_values_changed(values.unwrap_or(Value::Null));
                }
            });
            *lock(&form.inner.values_watch) = Some(subscription);
        }

        tracing::debug!(form = %id, resolver = form.has_resolver(), "form created");
        form
    }
}
