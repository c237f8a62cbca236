use crate::compiler_frontend::compiler_messages::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::tokenizer::tokens::{CharPosition, TextLocation};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

// The final set of errors and warnings emitted for a build
#[derive(Debug, Default)]
pub struct CompilerMessages {
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<CompilerWarning>,
}

impl CompilerMessages {
    pub fn new() -> Self {
        CompilerMessages::default()
    }

    pub fn from_error(error: CompilerError) -> Self {
        CompilerMessages {
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    pub fn extend(&mut self, other: CompilerMessages) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum ErrorMetaDataKey {
    CompilationStage,
    ComponentName,

    // Optional suggestions
    PrimarySuggestion,
    FoundToken,

    // Dependency graph details
    DependencyFrom,
    DependencyTo,
}

/// Where an error happened. The scope is the file the error came from,
/// filled in by the caller that knows the path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorLocation {
    pub scope: PathBuf,
    pub start_pos: CharPosition,
    pub end_pos: CharPosition,
}

impl ErrorLocation {
    pub fn from_text_location(location: TextLocation) -> Self {
        ErrorLocation {
            scope: PathBuf::new(),
            start_pos: location.start_pos,
            end_pos: location.end_pos,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub msg: String,
    pub location: ErrorLocation,
    pub error_type: ErrorType,

    // Structured details for tooling and richer printing
    pub metadata: HashMap<ErrorMetaDataKey, String>,
}

impl CompilerError {
    pub fn new(msg: impl Into<String>, location: TextLocation, error_type: ErrorType) -> Self {
        CompilerError {
            msg: msg.into(),
            location: ErrorLocation::from_text_location(location),
            error_type,
            metadata: HashMap::new(),
        }
    }

    pub fn with_file_path(mut self, file_path: impl Into<PathBuf>) -> Self {
        self.location.scope = file_path.into();
        self
    }

    pub fn with_location(mut self, location: TextLocation) -> Self {
        self.location.start_pos = location.start_pos;
        self.location.end_pos = location.end_pos;
        self
    }

    pub fn with_metadata(mut self, key: ErrorMetaDataKey, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value.into());
        self
    }

    pub fn new_syntax_error(msg: impl Into<String>, location: TextLocation) -> Self {
        CompilerError::new(msg, location, ErrorType::Syntax)
    }

    /// Internal bug, not the user's fault
    pub fn new_compiler_error(msg: impl Into<String>) -> Self {
        CompilerError::new(msg, TextLocation::default(), ErrorType::Compiler)
    }

    pub fn new_config_error(msg: impl Into<String>, path: &Path) -> Self {
        CompilerError::new(msg, TextLocation::default(), ErrorType::Config).with_file_path(path)
    }

    pub fn file_error(path: &Path, msg: impl Into<String>) -> Self {
        CompilerError::new(msg, TextLocation::default(), ErrorType::File).with_file_path(path)
    }

    /// A member expression whose outermost property has no static name.
    pub fn rightmost_id_not_found(expression: &str) -> Self {
        CompilerError::new(
            format!("Could not find the rightmost identifier of '{expression}'"),
            TextLocation::default(),
            ErrorType::RightmostIdNotFound,
        )
    }

    /// An expression that is not rooted at a plain identifier.
    pub fn leftmost_id_not_found(expression: &str) -> Self {
        CompilerError::new(
            format!("Could not find the leftmost identifier of '{expression}'"),
            TextLocation::default(),
            ErrorType::LeftmostIdNotFound,
        )
    }

    pub fn circular_dependency(from: &str, to: &str, location: TextLocation) -> Self {
        CompilerError::new(
            format!("Circular dependency detected - from: {from} to: {to}"),
            location,
            ErrorType::CircularDependency,
        )
        .with_metadata(ErrorMetaDataKey::DependencyFrom, from)
        .with_metadata(ErrorMetaDataKey::DependencyTo, to)
    }

    pub fn component_variable_not_ensured(code: &str, location: TextLocation) -> Self {
        CompilerError::new(
            format!("Segment '{code}' could not be ensured as a component variable"),
            location,
            ErrorType::ComponentVariable,
        )
    }

    pub fn binding_not_found(name: &str, location: TextLocation) -> Self {
        CompilerError::new(
            format!("Binding '{name}' not found"),
            location,
            ErrorType::BindingNotFound,
        )
    }

    /// Hard failures of the dependency graph. These always abort the current component.
    pub fn is_graph_failure(&self) -> bool {
        matches!(
            self.error_type,
            ErrorType::CircularDependency | ErrorType::ComponentVariable | ErrorType::BindingNotFound
        )
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", error_type_to_str(&self.error_type), self.msg)
    }
}

impl std::error::Error for CompilerError {}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ErrorType {
    Syntax,

    // Structural resolution, callers that only want a name for a heuristic
    // treat these pessimistically
    RightmostIdNotFound,
    LeftmostIdNotFound,

    // Dependency graph consistency
    CircularDependency,
    ComponentVariable,
    BindingNotFound,

    File,
    Config,
    Compiler,
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::Syntax => "Syntax Error",
        ErrorType::RightmostIdNotFound => "Rightmost Identifier Not Found",
        ErrorType::LeftmostIdNotFound => "Leftmost Identifier Not Found",
        ErrorType::CircularDependency => "Circular Dependency",
        ErrorType::ComponentVariable => "Component Variable",
        ErrorType::BindingNotFound => "Binding Not Found",
        ErrorType::File => "File Error",
        ErrorType::Config => "Malformed Config",
        ErrorType::Compiler => "Compiler Bug",
    }
}

/// Returns a new CompilerError for malformed source.
///
/// Usage:
/// `return_syntax_error!("message", location, {
///     CompilationStage => "Parsing",
///     PrimarySuggestion => "Did you forget a closing brace?",
/// })`;
#[macro_export]
macro_rules! return_syntax_error {
    ($msg:expr, $loc:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $crate::compiler_frontend::compiler_messages::compiler_errors::ErrorLocation::from_text_location($loc),
            error_type: $crate::compiler_frontend::compiler_messages::compiler_errors::ErrorType::Syntax,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $(
                    map.insert(
                        $crate::compiler_frontend::compiler_messages::compiler_errors::ErrorMetaDataKey::$key,
                        String::from($value),
                    );
                )*
                map
            },
        })
    };
    ($msg:expr, $loc:expr) => {
        return Err($crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError::new_syntax_error($msg, $loc))
    };
}

/// Returns a new CompilerError for internal compiler bugs.
#[macro_export]
macro_rules! return_compiler_error {
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        return Err($crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError::new_compiler_error(
            format!($fmt, $($arg),+),
        ));
    }};
    ($msg:expr) => {{
        return Err($crate::compiler_frontend::compiler_messages::compiler_errors::CompilerError::new_compiler_error($msg));
    }};
}

/// Pushes the error onto a `CompilerMessages` and returns it from the enclosing function.
#[macro_export]
macro_rules! return_messages_with_err {
    ($messages:expr, $error:expr) => {{
        $messages.errors.push($error);
        return $messages;
    }};
}
