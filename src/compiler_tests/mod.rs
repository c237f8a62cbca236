// End to end checks: components run before and after memoization in a small
// interpreter with a minimal React-like renderer, and what they render is compared.

pub(crate) mod js_eval;
pub(crate) mod react_runtime;

mod memoized_render_tests;
