//! Setup and render contexts.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::definition::ComponentDef;
use crate::reactive::{Reactive, Value};
use crate::vnode::Props;

/// Local state returned by a setup step, by name.
pub type State = IndexMap<String, Value>;

/// Second argument of a setup step.
#[derive(Debug, Clone, Default)]
pub struct SetupContext {
    /// Everything passed to the component that is not a declared prop.
    pub attrs: Props,
}

/// What a render step reads from.
#[derive(Clone)]
pub struct RenderContext {
    def: Rc<ComponentDef>,
    props: Reactive,
    attrs: Props,
    state: Rc<State>,
}

impl RenderContext {
    pub(crate) fn new(def: Rc<ComponentDef>, props: Reactive, attrs: Props, state: Rc<State>) -> Self {
        Self {
            def,
            props,
            attrs,
            state,
        }
    }

    /// Resolve a name against setup state, then props, then attrs.
    ///
    /// Signals and memos are read, so the running render tracks them.
    pub fn get(&self, name: &str) -> Value {
        if let Some(value) = self.state.get(name) {
            return value.unwrap_cell();
        }
        if self.props.has(name) {
            return self.props.get(name).unwrap_cell();
        }
        self.attrs.get(name).map(Value::unwrap_cell).unwrap_or_default()
    }

    /// [`get`](Self::get) as display text.
    pub fn text(&self, name: &str) -> String {
        self.get(name).to_display_string()
    }

    pub fn props(&self) -> &Reactive {
        &self.props
    }

    pub fn attrs(&self) -> &Props {
        &self.attrs
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn component_name(&self) -> &str {
        self.def.name()
    }

    /// Look up a child component registered on this component's definition.
    pub fn resolve_component(&self, name: &str) -> Option<Rc<ComponentDef>> {
        self.def.resolve_component(name)
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("component", &self.def.name())
            .field("props", &self.props)
            .field("attrs", &self.attrs)
            .field("state", &self.state)
            .finish()
    }
}
