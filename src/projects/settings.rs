use crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError;
use crate::compiler_frontend::memoization::driver::TransformOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "unforget.toml";

// Runtime contract
pub const RUNTIME_MODULE: &str = "@react-unforget/runtime";
pub const CREATE_CACHE_EXPORT: &str = "useCreateCache$unforget";

// Generated identifier bases. `generate_unique_name` appends a counter on collision.
pub const CACHE_NAME: &str = "$unforgetCache";
pub const COMMIT_NAME: &str = "$unforgetCommit";
pub const NULL_NAME: &str = "$unforgetNull";

pub const UNWRAPPED_TEMP: &str = "_unwrapped";
pub const UNWRAPPED_JSX_EXPRESSION: &str = "_unwrappedJsxExp";
pub const UNWRAPPED_JSX_ELEMENT: &str = "_unwrappedJsxEl";
pub const PROPS_TEMP: &str = "_props";
pub const SEGMENT_CALLABLE: &str = "_segment";
pub const UNUSED_BINDING: &str = "_unused";

// Slot properties
pub const SLOT_VALUE: &str = "v";
pub const SLOT_IS_UNSET: &str = "n";
pub const SLOT_ENQUEUE: &str = "e";

/// Method names that change the object they are called on.
pub const MUTATING_METHODS: [&str; 13] = [
    "push",
    "pop",
    "shift",
    "unshift",
    "splice",
    "sort",
    "reverse",
    "copyWithin",
    "fill",
    "set",
    "delete",
    "add",
    "clear",
];

pub const DEFAULT_OUT_DIR: &str = "unforget_out";
pub const DEFAULT_HOOK_PREFIX: &str = "use";

// Roughly one token per five bytes of JavaScript
pub const SRC_TO_TOKEN_RATIO: usize = 5;

// Quiet period before watch mode rebuilds
pub const WATCH_DEBOUNCE_MS: u64 = 150;

/// Settings read from `unforget.toml`. Every field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub transform: TransformSettings,
    pub runtime: RuntimeSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformSettings {
    pub throw_on_failure: bool,
    pub skip_components: Vec<String>,
    pub skip_components_with_mutation: bool,
    pub hook_prefixes: Vec<String>,
}

impl Default for TransformSettings {
    fn default() -> Self {
        TransformSettings {
            throw_on_failure: false,
            skip_components: Vec::new(),
            skip_components_with_mutation: false,
            hook_prefixes: vec![String::from(DEFAULT_HOOK_PREFIX)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSettings {
    pub module: String,
    pub create_cache_export: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        RuntimeSettings {
            module: String::from(RUNTIME_MODULE),
            create_cache_export: String::from(CREATE_CACHE_EXPORT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    pub out_dir: PathBuf,
    pub extensions: Vec<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            extensions: vec![String::from("js"), String::from("jsx")],
        }
    }
}

impl Config {
    pub fn from_toml(source: &str, path: &Path) -> Result<Config, CompilerError> {
        toml::from_str(source).map_err(|e| {
            CompilerError::new_config_error(format!("Could not read {CONFIG_FILE_NAME}: {e}"), path)
        })
    }

    /// Loads the config given explicitly, or the `unforget.toml` next to the input.
    /// A missing implicit config file just means the defaults.
    pub fn load(input: &Path, explicit: Option<&Path>) -> Result<Config, CompilerError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let dir = if input.is_dir() {
                    input
                } else {
                    input.parent().unwrap_or(Path::new(""))
                };

                let candidate = dir.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    return Ok(Config::default());
                }
                candidate
            }
        };

        let source = fs::read_to_string(&path)
            .map_err(|e| CompilerError::file_error(&path, format!("Could not read config file: {e}")))?;

        Config::from_toml(&source, &path)
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            throw_on_failure: self.transform.throw_on_failure,
            skip_components: self.transform.skip_components.clone(),
            skip_components_with_mutation: self.transform.skip_components_with_mutation,
            hook_prefixes: self.transform.hook_prefixes.clone(),
            runtime_module: self.runtime.module.clone(),
            create_cache_export: self.runtime.create_cache_export.clone(),
        }
    }

    /// Whether a file should be compiled, going by its extension.
    pub fn accepts_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| self.output.extensions.iter().any(|accepted| accepted == extension))
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
