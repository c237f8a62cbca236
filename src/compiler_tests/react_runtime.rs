//! Just enough of React to render components and replay clicks.
//!
//! Hooks are keyed by the position of their component in the rendered tree. State updates
//! schedule another render pass, and the memo cache behaves like the runtime module the
//! compiled code imports: staged writes only land when the render commits.

use crate::compiler_tests::js_eval::{
    CacheSlot, Element, ElementKind, Flow, Interpreter, Scope, Value, argument, describe, strict_equals, throw,
};
use crate::projects::settings::{CREATE_CACHE_EXPORT, RUNTIME_MODULE};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

const MAX_RENDER_PASSES: usize = 25;

enum HookCell {
    State { value: Value, setter: Value },
    Ref(Value),
    Memo { value: Value, deps: Option<Vec<Value>> },
    Effect { deps: Option<Vec<Value>> },
    Cache { parts: Vec<Value>, staged: Rc<RefCell<Vec<(usize, Value)>>> },
}

#[derive(Default)]
pub(crate) struct HookState {
    cells: FxHashMap<String, Vec<HookCell>>,

    // Tree position of the component being rendered and its next hook index
    frame: Option<(String, usize)>,

    pending_effects: Vec<Value>,
    updates: usize,
}

impl HookState {
    fn enter(&mut self, path: &str) -> Option<(String, usize)> {
        self.frame.replace((path.to_owned(), 0))
    }

    fn leave(&mut self, previous: Option<(String, usize)>) {
        self.frame = previous;
    }

    fn next_hook(&mut self) -> Flow<(String, usize)> {
        let Some((path, index)) = &mut self.frame else {
            return throw("Hooks can only be called inside the body of a component");
        };
        let position = (path.clone(), *index);
        *index += 1;
        Ok(position)
    }

    fn cell(&mut self, path: &str, index: usize) -> Option<&mut HookCell> {
        self.cells.get_mut(path).and_then(|cells| cells.get_mut(index))
    }

    fn store(&mut self, path: &str, index: usize, cell: HookCell) {
        let cells = self.cells.entry(path.to_owned()).or_default();
        if index < cells.len() {
            cells[index] = cell;
        } else {
            cells.push(cell);
        }
    }
}

pub(crate) fn install_react(globals: &Rc<Scope>, modules: &mut FxHashMap<String, Value>) {
    let hooks = || {
        vec![
            ("useState", Value::native(use_state)),
            ("useRef", Value::native(use_ref)),
            ("useMemo", Value::native(use_memo)),
            ("useCallback", Value::native(use_callback)),
            ("useEffect", Value::native(use_effect)),
        ]
    };

    // Components in fixtures often use hooks without importing them
    for (name, hook) in hooks() {
        globals.declare(name, hook);
    }

    let mut react = hooks();
    react.push(("default", Value::object(hooks())));
    modules.insert(String::from("react"), Value::object(react));

    modules.insert(
        String::from(RUNTIME_MODULE),
        Value::object(vec![(CREATE_CACHE_EXPORT, Value::native(use_create_cache))]),
    );
}

fn state_setter(path: String, index: usize) -> Value {
    Value::native(move |interpreter, arguments| {
        let current = match interpreter.hooks.cell(&path, index) {
            Some(HookCell::State { value, .. }) => value.clone(),
            _ => return throw("State setter called for a hook that no longer exists"),
        };

        let next = argument(&arguments, 0);
        let next = if next.is_callable() {
            interpreter.call(&next, vec![current.clone()])?
        } else {
            next
        };

        if !strict_equals(&current, &next)
            && let Some(HookCell::State { value, .. }) = interpreter.hooks.cell(&path, index)
        {
            *value = next;
            interpreter.hooks.updates += 1;
        }
        Ok(Value::Undefined)
    })
}

fn use_state(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Flow<Value> {
    let (path, index) = interpreter.hooks.next_hook()?;
    if let Some(HookCell::State { value, setter }) = interpreter.hooks.cell(&path, index) {
        return Ok(Value::array(vec![value.clone(), setter.clone()]));
    }

    let initial = argument(&arguments, 0);
    let initial = if initial.is_callable() {
        interpreter.call(&initial, Vec::new())?
    } else {
        initial
    };

    let setter = state_setter(path.clone(), index);
    interpreter.hooks.store(
        &path,
        index,
        HookCell::State {
            value: initial.clone(),
            setter: setter.clone(),
        },
    );
    Ok(Value::array(vec![initial, setter]))
}

fn use_ref(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Flow<Value> {
    let (path, index) = interpreter.hooks.next_hook()?;
    if let Some(HookCell::Ref(object)) = interpreter.hooks.cell(&path, index) {
        return Ok(object.clone());
    }

    let object = Value::object(vec![("current", argument(&arguments, 0))]);
    interpreter.hooks.store(&path, index, HookCell::Ref(object.clone()));
    Ok(object)
}

fn dependency_list(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.borrow().clone()),
        _ => None,
    }
}

fn dependencies_match(previous: &Option<Vec<Value>>, next: &Option<Vec<Value>>) -> bool {
    match (previous, next) {
        (Some(previous), Some(next)) => {
            previous.len() == next.len() && previous.iter().zip(next).all(|(a, b)| strict_equals(a, b))
        }
        _ => false,
    }
}

fn memoized(interpreter: &mut Interpreter, arguments: Vec<Value>, call_factory: bool) -> Flow<Value> {
    let (path, index) = interpreter.hooks.next_hook()?;
    let deps = dependency_list(&argument(&arguments, 1));

    if let Some(HookCell::Memo { value, deps: previous }) = interpreter.hooks.cell(&path, index)
        && dependencies_match(previous, &deps)
    {
        return Ok(value.clone());
    }

    let value = if call_factory {
        interpreter.call(&argument(&arguments, 0), Vec::new())?
    } else {
        argument(&arguments, 0)
    };
    interpreter.hooks.store(&path, index, HookCell::Memo { value: value.clone(), deps });
    Ok(value)
}

fn use_memo(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Flow<Value> {
    memoized(interpreter, arguments, true)
}

fn use_callback(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Flow<Value> {
    memoized(interpreter, arguments, false)
}

fn use_effect(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Flow<Value> {
    let (path, index) = interpreter.hooks.next_hook()?;
    let deps = dependency_list(&argument(&arguments, 1));

    if let Some(HookCell::Effect { deps: previous }) = interpreter.hooks.cell(&path, index)
        && dependencies_match(previous, &deps)
    {
        return Ok(Value::Undefined);
    }

    interpreter.hooks.pending_effects.push(argument(&arguments, 0));
    interpreter.hooks.store(&path, index, HookCell::Effect { deps });
    Ok(Value::Undefined)
}

/// `[slots, commit, unset]`, the same arrays and functions on every render.
fn use_create_cache(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Flow<Value> {
    let (path, index) = interpreter.hooks.next_hook()?;

    // Writes staged by a render that never committed are dropped
    if let Some(HookCell::Cache { parts, staged }) = interpreter.hooks.cell(&path, index) {
        staged.borrow_mut().clear();
        return Ok(Value::array(parts.clone()));
    }

    let size = argument(&arguments, 0).to_number();
    let size = if size.is_finite() && size > 0.0 { size as usize } else { 0 };

    let unset: Rc<str> = Rc::from("unforget.unset");
    let staged: Rc<RefCell<Vec<(usize, Value)>>> = Rc::default();
    let slots: Vec<Rc<CacheSlot>> = (0..size)
        .map(|slot| {
            Rc::new(CacheSlot {
                index: slot,
                value: RefCell::new(Value::Symbol(Rc::clone(&unset))),
                unset: Rc::clone(&unset),
                staged: Rc::clone(&staged),
            })
        })
        .collect();

    let commit = {
        let slots = slots.clone();
        let staged = Rc::clone(&staged);
        Value::native(move |_, _| {
            for (slot, value) in staged.borrow_mut().drain(..) {
                if let Some(slot) = slots.get(slot) {
                    *slot.value.borrow_mut() = value;
                }
            }
            Ok(Value::Undefined)
        })
    };

    let parts = vec![
        Value::array(slots.iter().map(|slot| Value::Slot(Rc::clone(slot))).collect()),
        commit,
        Value::Symbol(unset),
    ];
    interpreter.hooks.store(
        &path,
        index,
        HookCell::Cache {
            parts: parts.clone(),
            staged,
        },
    );
    Ok(Value::array(parts))
}

/// A component mounted at the root of a tree, rendered to static HTML.
pub(crate) struct MountedApp {
    interpreter: Interpreter,
    root: Value,
    props: Value,

    // Event handlers of host elements in document order, from the last render
    handlers: Vec<Value>,
    pub(crate) html: String,
}

impl MountedApp {
    pub(crate) fn mount(source: &str, component: &str, props: Value) -> Result<MountedApp, String> {
        let interpreter = Interpreter::load(source)?;
        let root = interpreter
            .binding(component)
            .ok_or_else(|| format!("No component named '{component}'"))?;

        let mut app = MountedApp {
            interpreter,
            root,
            props,
            handlers: Vec::new(),
            html: String::new(),
        };
        app.render()?;
        Ok(app)
    }

    /// Renders until no state update is pending.
    pub(crate) fn render(&mut self) -> Result<String, String> {
        for _ in 0..MAX_RENDER_PASSES {
            self.interpreter.hooks.updates = 0;
            self.handlers.clear();

            let root = Value::Element(Rc::new(Element {
                kind: ElementKind::Component(self.root.clone()),
                props: self.props.clone(),
            }));
            let mut html = String::new();
            self.render_node(&root, "root", &mut html)
                .map_err(|control| describe(&control))?;
            self.html = html;

            for effect in std::mem::take(&mut self.interpreter.hooks.pending_effects) {
                self.interpreter
                    .call(&effect, Vec::new())
                    .map_err(|control| describe(&control))?;
            }

            if self.interpreter.hooks.updates == 0 {
                return Ok(self.html.clone());
            }
        }

        Err(String::from("Too many re-renders"))
    }

    pub(crate) fn set_props(&mut self, props: Value) -> Result<String, String> {
        self.props = props;
        self.render()
    }

    pub(crate) fn click(&mut self, handler: usize) -> Result<String, String> {
        let Some(callback) = self.handlers.get(handler).cloned() else {
            return Err(format!("No event handler {handler}, the last render had {}", self.handlers.len()));
        };

        let event = Value::object(vec![("type", Value::string("click"))]);
        self.interpreter
            .call(&callback, vec![event])
            .map_err(|control| describe(&control))?;
        self.render()
    }

    /// A module level binding, for fixtures that count how often something ran.
    pub(crate) fn global(&self, name: &str) -> Value {
        self.interpreter.binding(name).unwrap_or(Value::Undefined)
    }

    pub(crate) fn logs(&self) -> &[String] {
        &self.interpreter.logs
    }

    fn render_node(&mut self, node: &Value, path: &str, out: &mut String) -> Flow<()> {
        match node {
            Value::Undefined | Value::Null | Value::Bool(_) => Ok(()),
            Value::Number(_) | Value::String(_) => {
                out.push_str(&escape_html(&node.to_js_string()));
                Ok(())
            }
            Value::Array(items) => {
                let items = items.borrow().clone();
                for (index, item) in items.iter().enumerate() {
                    let key = match item {
                        Value::Element(element) => match self.interpreter.get_property(&element.props, "key")? {
                            Value::Undefined => index.to_string(),
                            key => format!("k{}", key.to_js_string()),
                        },
                        _ => index.to_string(),
                    };
                    self.render_node(item, &format!("{path}.{key}"), out)?;
                }
                Ok(())
            }
            Value::Element(element) => self.render_element(element, path, out),
            other => throw(format!("Objects are not valid as a child (found: {other:?})")),
        }
    }

    fn render_element(&mut self, element: &Element, path: &str, out: &mut String) -> Flow<()> {
        match &element.kind {
            ElementKind::Fragment => {
                let children = self.interpreter.get_property(&element.props, "children")?;
                self.render_node(&children, &format!("{path}.f"), out)
            }

            ElementKind::Host(tag) => {
                out.push('<');
                out.push_str(tag);

                for (name, value) in element.props.entries() {
                    if name == "children" || name == "key" {
                        continue;
                    }
                    if name.starts_with("on") && value.is_callable() {
                        self.handlers.push(value);
                        continue;
                    }
                    match value {
                        Value::Bool(true) => {
                            out.push(' ');
                            out.push_str(&name);
                        }
                        Value::Bool(false) | Value::Null | Value::Undefined => {}
                        other if other.is_callable() => {}
                        other => out.push_str(&format!(" {name}=\"{}\"", escape_html(&other.to_js_string()))),
                    }
                }
                out.push('>');

                let children = self.interpreter.get_property(&element.props, "children")?;
                self.render_node(&children, &format!("{path}.{tag}"), out)?;

                out.push_str("</");
                out.push_str(tag);
                out.push('>');
                Ok(())
            }

            ElementKind::Component(component) => {
                let previous = self.interpreter.hooks.enter(path);
                let rendered = self.interpreter.call(component, vec![element.props.clone()]);
                self.interpreter.hooks.leave(previous);

                self.render_node(&rendered?, &format!("{path}/c"), out)
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}
