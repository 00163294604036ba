//! Component definitions.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use super::context::{RenderContext, SetupContext, State};
use crate::error::{RenderError, Result};
use crate::reactive::Reactive;
use crate::vnode::Renderable;

/// One-time setup step: receives the reactive props and the attrs.
pub type SetupFn = Rc<dyn Fn(&Reactive, &SetupContext) -> Result<State>>;

/// Render step: turns the render context into a tree.
pub type RenderFn = Rc<dyn Fn(&RenderContext) -> Result<Renderable>>;

/// Turns template source into a render step.
///
/// Registered on the [`Renderer`](crate::renderer::Renderer) and invoked at
/// most once per definition, the first time a template component renders.
pub trait TemplateCompiler {
    fn compile(&self, template: &str) -> std::result::Result<RenderFn, String>;
}

/// What a component is: declared props, setup, and render step or template.
///
/// ```rust,ignore
/// let counter = ComponentDef::new("Counter")
///     .props(["start"])
///     .setup(|props, _| {
///         let count = Signal::new(props.get("start"));
///         Ok(props! {"count" => count})
///     })
///     .render(|ctx| Ok(h("p", props! {}, ctx.get("count")).into()))
///     .build();
/// ```
pub struct ComponentDef {
    name: String,
    props: Vec<String>,
    setup: Option<SetupFn>,
    render: Option<RenderFn>,
    template: Option<String>,
    components: IndexMap<String, Rc<ComponentDef>>,
    compiled: OnceCell<RenderFn>,
}

impl ComponentDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: Vec::new(),
            setup: None,
            render: None,
            template: None,
            components: IndexMap::new(),
            compiled: OnceCell::new(),
        }
    }

    /// Declare prop names. Everything else passed to the component is an
    /// attribute.
    pub fn props<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&Reactive, &SetupContext) -> Result<State> + 'static,
    {
        self.setup = Some(Rc::new(setup));
        self
    }

    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&RenderContext) -> Result<Renderable> + 'static,
    {
        self.render = Some(Rc::new(render));
        self
    }

    /// Use a template instead of a render step.
    pub fn template(mut self, source: impl Into<String>) -> Self {
        self.template = Some(source.into());
        self
    }

    /// Register a child component, resolvable by name while rendering.
    pub fn component(mut self, name: impl Into<String>, def: Rc<ComponentDef>) -> Self {
        self.components.insert(name.into(), def);
        self
    }

    pub fn build(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_props(&self) -> &[String] {
        &self.props
    }

    pub fn declares(&self, prop: &str) -> bool {
        self.props.iter().any(|p| p == prop)
    }

    pub(crate) fn setup_fn(&self) -> Option<&SetupFn> {
        self.setup.as_ref()
    }

    /// The render step, compiling the template on first use.
    pub(crate) fn render_fn(&self, compiler: Option<&dyn TemplateCompiler>) -> Result<RenderFn> {
        if let Some(render) = &self.render {
            return Ok(Rc::clone(render));
        }
        if let Some(compiled) = self.compiled.get() {
            return Ok(Rc::clone(compiled));
        }

        let template = self
            .template
            .as_deref()
            .ok_or_else(|| RenderError::MissingRender(self.name.clone()))?;
        let compiler = compiler.ok_or_else(|| RenderError::MissingCompiler(self.name.clone()))?;

        debug!(component = %self.name, "compiling template");
        let render = compiler.compile(template).map_err(|message| RenderError::Compile {
            component: self.name.clone(),
            message,
        })?;
        Ok(Rc::clone(self.compiled.get_or_init(|| render)))
    }

    /// Look up a registered child component by name.
    ///
    /// Tries the name as given, then camel-cased (`todo-item` ⇒ `todoItem`),
    /// then capitalized (`TodoItem`).
    pub fn resolve_component(&self, name: &str) -> Option<Rc<ComponentDef>> {
        let camel = camelize(name);
        let pascal = capitalize(&camel);
        let found = [name, camel.as_str(), pascal.as_str()]
            .into_iter()
            .find_map(|candidate| self.components.get(candidate).cloned());
        found
    }
}

fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("setup", &self.setup.is_some())
            .field("render", &self.render.is_some())
            .field("template", &self.template)
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::vnode::VNode;
    use std::cell::Cell;

    struct CountingCompiler {
        calls: Cell<usize>,
    }

    impl TemplateCompiler for CountingCompiler {
        fn compile(&self, template: &str) -> std::result::Result<RenderFn, String> {
            self.calls.set(self.calls.get() + 1);
            if template.is_empty() {
                return Err("empty template".to_string());
            }
            let text = template.to_string();
            Ok(Rc::new(move |_: &RenderContext| Ok(Renderable::Node(VNode::text(text.clone())))))
        }
    }

    #[test]
    fn template_is_compiled_once() {
        let def = ComponentDef::new("Hello").template("hello").build();
        let compiler = CountingCompiler { calls: Cell::new(0) };

        def.render_fn(Some(&compiler)).unwrap();
        def.render_fn(Some(&compiler)).unwrap();
        assert_eq!(compiler.calls.get(), 1);
    }

    #[test]
    fn missing_render_and_compiler_are_errors() {
        let bare = ComponentDef::new("Bare");
        assert!(matches!(
            bare.render_fn(None),
            Err(Error::Render(RenderError::MissingRender(name))) if name == "Bare"
        ));

        let templated = ComponentDef::new("Templated").template("x");
        assert!(matches!(
            templated.render_fn(None),
            Err(Error::Render(RenderError::MissingCompiler(_)))
        ));

        let broken = ComponentDef::new("Broken").template("");
        let compiler = CountingCompiler { calls: Cell::new(0) };
        assert!(matches!(
            broken.render_fn(Some(&compiler)),
            Err(Error::Render(RenderError::Compile { .. }))
        ));
    }

    #[test]
    fn declared_props_are_known() {
        let def = ComponentDef::new("Item").props(["label", "done"]);
        assert!(def.declares("label"));
        assert!(!def.declares("class"));
    }

    #[test]
    fn components_resolve_by_kebab_and_pascal_case() {
        let item = ComponentDef::new("TodoItem").build();
        let list = ComponentDef::new("TodoList").component("TodoItem", Rc::clone(&item));

        let resolved = list.resolve_component("todo-item").unwrap();
        assert!(Rc::ptr_eq(&resolved, &item));
        assert!(list.resolve_component("missing").is_none());
        assert_eq!(camelize("a-b-c"), "aBC");
    }
}
