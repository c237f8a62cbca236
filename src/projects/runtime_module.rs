use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::projects::settings::{CREATE_CACHE_EXPORT, RUNTIME_MODULE};
use std::fs;
use std::path::Path;

/// Reference implementation of the cache hook the generated code imports.
///
/// `useCreateCache$unforget(size)` returns `[slots, commit, unset]`. Each slot holds the
/// committed value `v`, reports `n` while nothing has been committed, and stages a new
/// value with `e`. Staged values only become visible after `commit()`, and a render that
/// throws before committing leaves its staged values behind to be cleared by the next call.
pub const RUNTIME_SOURCE: &str = r#"import { useRef } from "react";

const UNSET = Symbol("unforget.unset");

export function useCreateCache$unforget(size) {
    const ref = useRef(null);

    if (ref.current === null) {
        const staged = new Map();
        const slots = Array.from({ length: size }, (_, index) => ({
            v: UNSET,
            get n() {
                return this.v === UNSET;
            },
            e(value) {
                staged.set(index, value);
            },
        }));
        const commit = () => {
            staged.forEach((value, index) => {
                slots[index].v = value;
            });
            staged.clear();
        };
        ref.current = { slots, commit, staged };
    }

    ref.current.staged.clear();
    return [ref.current.slots, ref.current.commit, UNSET];
}
"#;

/// Writes the runtime module, creating parent directories as needed.
pub fn write_runtime_module(path: &Path) -> Result<(), CompilerError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| CompilerError::file_error(parent, format!("Could not create directory: {e}")))?;
    }

    fs::write(path, RUNTIME_SOURCE)
        .map_err(|e| CompilerError::file_error(path, format!("Could not write the runtime module: {e}")))
}

/// Where generated code expects to find the runtime, for the CLI summary.
pub fn runtime_import_hint() -> String {
    format!("import {{ {CREATE_CACHE_EXPORT} }} from \"{RUNTIME_MODULE}\";")
}

#[cfg(test)]
#[path = "tests/runtime_module_tests.rs"]
mod tests;
