use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use saying::say;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct CompilerWarning {
    pub msg: String,
    pub location: TextLocation,
    pub warning_kind: WarningKind,
    pub file_path: PathBuf,
}

impl CompilerWarning {
    pub fn new(
        msg: impl Into<String>,
        location: TextLocation,
        warning_kind: WarningKind,
        file_path: PathBuf,
    ) -> CompilerWarning {
        CompilerWarning {
            msg: msg.into(),
            location,
            warning_kind,
            file_path,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WarningKind {
    ComponentSkippedByConfig,
    ComponentSkippedOnError,
    ComponentSkippedWithMutation,
    NothingToMemoize,
}

pub fn print_formatted_warning(w: CompilerWarning) {
    let file = w.file_path.display().to_string();
    let line = (w.location.start_pos.line_number + 1).to_string();
    say!(Yellow Bold "WARNING: ", Dark Magenta file, " line ", line);
    let kind = match w.warning_kind {
        WarningKind::ComponentSkippedByConfig => "skipped by configuration",
        WarningKind::ComponentSkippedOnError => "skipped after an error",
        WarningKind::ComponentSkippedWithMutation => "skipped for mutating locals",
        WarningKind::NothingToMemoize => "nothing to memoize",
    };
    say!(Yellow kind, ": ", w.msg);
}
