use crate::compiler_frontend::memoization::test_support::transform_source;
use crate::compiler_tests::js_eval::Value;
use crate::compiler_tests::react_runtime::MountedApp;

enum Step {
    Click(usize),
    Props(Value),
}

fn compiled(source: &str) -> String {
    transform_source(source).0
}

fn mount(source: &str, component: &str, props: Value) -> MountedApp {
    MountedApp::mount(source, component, props)
        .unwrap_or_else(|error| panic!("{component} should mount: {error}\n{source}"))
}

/// Every frame rendered while replaying `steps`, the initial render first.
fn replay(source: &str, component: &str, props: &Value, steps: &[Step]) -> Vec<String> {
    let mut app = mount(source, component, props.clone());
    let mut frames = vec![app.html.clone()];

    for step in steps {
        let frame = match step {
            Step::Click(handler) => app.click(*handler),
            Step::Props(props) => app.set_props(props.clone()),
        };
        frames.push(frame.unwrap_or_else(|error| panic!("{component} failed to update: {error}\n{source}")));
    }

    frames
}

/// Replays the original and the memoized component and requires identical output.
fn assert_same_behaviour(source: &str, component: &str, props: Value, steps: &[Step]) -> Vec<String> {
    let output = compiled(source);
    let original = replay(source, component, &props, steps);
    let memoized = replay(&output, component, &props, steps);

    assert_eq!(original, memoized, "memoized output diverged, compiled code:\n{output}");
    original
}

fn props(entries: Vec<(&str, Value)>) -> Value {
    Value::object(entries)
}

const COUNTER: &str = "function Counter() {
    const [count, setCount] = useState(0);
    const label = \"Count \" + count;
    return <div onClick={() => setCount(count + 1)}>{label}</div>;
}
";

#[test]
fn counter_counts_the_same_after_memoization() {
    let frames = assert_same_behaviour(
        COUNTER,
        "Counter",
        props(Vec::new()),
        &[Step::Click(0), Step::Click(0), Step::Click(0)],
    );

    assert_eq!(
        frames,
        [
            "<div>Count 0</div>",
            "<div>Count 1</div>",
            "<div>Count 2</div>",
            "<div>Count 3</div>",
        ]
    );
}

const DOUBLER: &str = "let expensiveCalls = 0;

function expensive(value) {
    expensiveCalls++;
    return value * 2;
}

function Doubler(props) {
    const [ticks, setTicks] = useState(0);
    const doubled = expensive(props.value);
    return <p onClick={() => setTicks(ticks + 1)}>{doubled} after {ticks}</p>;
}
";

#[test]
fn gated_work_only_reruns_when_its_input_changes() {
    let first = props(vec![("value", Value::Number(21.0))]);
    let second = props(vec![("value", Value::Number(5.0))]);

    let frames = assert_same_behaviour(
        DOUBLER,
        "Doubler",
        first.clone(),
        &[Step::Click(0), Step::Click(0), Step::Props(second.clone())],
    );
    assert_eq!(frames[2], "<p>42 after 2</p>");
    assert_eq!(frames[3], "<p>10 after 2</p>");

    let mut original = mount(DOUBLER, "Doubler", first.clone());
    let mut memoized = mount(&compiled(DOUBLER), "Doubler", first);
    for _ in 0..3 {
        original.click(0).expect("click should update");
        memoized.click(0).expect("click should update");
    }

    assert_eq!(format!("{:?}", original.global("expensiveCalls")), "4");
    assert_eq!(format!("{:?}", memoized.global("expensiveCalls")), "1");

    memoized.set_props(second).expect("new props should render");
    assert_eq!(format!("{:?}", memoized.global("expensiveCalls")), "2");
}

const GATE: &str = "function Gate(props) {
    if (!props.open) {
        return null;
    }
    const title = props.title;
    return <h1>{title}</h1>;
}
";

#[test]
fn early_returns_do_not_leave_stale_values_behind() {
    let open = |title: &str| props(vec![("open", Value::Bool(true)), ("title", Value::string(title))]);
    let closed = |title: &str| props(vec![("open", Value::Bool(false)), ("title", Value::string(title))]);

    let frames = assert_same_behaviour(
        GATE,
        "Gate",
        open("a"),
        &[Step::Props(closed("b")), Step::Props(open("b")), Step::Props(open("b"))],
    );

    assert_eq!(frames, ["<h1>a</h1>", "", "<h1>b</h1>", "<h1>b</h1>"]);
}

#[test]
fn lists_filter_and_render_the_same() {
    let source = "function TodoList(props) {
    const [showDone, setShowDone] = useState(true);
    const visible = props.todos.filter((todo) => showDone || !todo.done);
    return (
        <section>
            <button onClick={() => setShowDone(!showDone)}>toggle</button>
            <ul>{visible.map((todo) => <li key={todo.id}>{todo.text}</li>)}</ul>
        </section>
    );
}
";
    let todo = |id: f64, text: &str, done: bool| {
        props(vec![
            ("id", Value::Number(id)),
            ("text", Value::string(text)),
            ("done", Value::Bool(done)),
        ])
    };
    let todos = Value::array(vec![todo(1.0, "Write", true), todo(2.0, "Ship", false)]);

    let frames = assert_same_behaviour(
        source,
        "TodoList",
        props(vec![("todos", todos)]),
        &[Step::Click(0), Step::Click(0)],
    );

    assert_eq!(
        frames,
        [
            "<section><button>toggle</button><ul><li>Write</li><li>Ship</li></ul></section>",
            "<section><button>toggle</button><ul><li>Ship</li></ul></section>",
            "<section><button>toggle</button><ul><li>Write</li><li>Ship</li></ul></section>",
        ]
    );
}

#[test]
fn nested_components_and_hooks_keep_their_own_caches() {
    let source = "function useDouble(value) {
    const doubled = value * 2;
    return doubled;
}

function Label(props) {
    return <span>{props.text}</span>;
}

function App() {
    const [n, setN] = useState(1);
    const doubled = useDouble(n);
    const text = \"n=\" + doubled;
    return <div onClick={() => setN(n + 1)}><Label text={text} /></div>;
}
";

    let frames = assert_same_behaviour(source, "App", props(Vec::new()), &[Step::Click(0), Step::Click(0)]);

    assert_eq!(
        frames,
        [
            "<div><span>n=2</span></div>",
            "<div><span>n=4</span></div>",
            "<div><span>n=6</span></div>",
        ]
    );
}

#[test]
fn cache_writes_only_land_on_commit() {
    let source = "import { useCreateCache$unforget } from \"@react-unforget/runtime\";

const observed = [];

function Probe(props) {
    const [cache, commit, unset] = useCreateCache$unforget(1);
    observed.push(cache[0].n);
    cache[0].e(props.value);
    if (props.commit) {
        commit();
    }
    observed.push(cache[0].v === unset);
    return null;
}
";
    let step = |value: f64, commit: bool| props(vec![("value", Value::Number(value)), ("commit", Value::Bool(commit))]);

    let mut app = mount(source, "Probe", step(1.0, false));
    app.set_props(step(2.0, true)).expect("second render should run");
    app.set_props(step(3.0, false)).expect("third render should run");

    assert_eq!(
        format!("{:?}", app.global("observed")),
        "[true, true, true, false, false, false]"
    );
}

#[test]
fn effects_run_after_render_and_can_update_state() {
    let source = "function Loader() {
    const [status, setStatus] = useState(\"loading\");
    useEffect(() => {
        console.log(\"effect\");
        setStatus(\"ready\");
    }, []);
    return <p>{status}</p>;
}
";

    let app = mount(source, "Loader", props(Vec::new()));

    assert_eq!(app.html, "<p>ready</p>");
    assert_eq!(app.logs(), ["effect"]);
}
