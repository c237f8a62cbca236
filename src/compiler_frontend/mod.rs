pub(crate) mod ast;
pub(crate) mod tokenizer;

pub(crate) mod codegen {
    pub(crate) mod js;
}

pub(crate) mod compiler_messages {
    pub(crate) mod compiler_dev_logging;
    pub(crate) mod compiler_errors;
    pub(crate) mod compiler_warnings;
    pub(crate) mod display_messages;
}
pub(crate) use compiler_messages::compiler_errors;
pub(crate) use compiler_messages::display_messages;

pub(crate) mod analysis;
pub(crate) mod memoization;

use crate::compiler_frontend::ast::ast::Ast;
use crate::compiler_frontend::ast::build_ast::build_ast;
use crate::compiler_frontend::codegen::js::emit_program;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::memoization::driver::{TransformOptions, TransformReport, transform_program};
use crate::compiler_frontend::tokenizer::tokenizer::tokenize;
use crate::compiler_frontend::tokenizer::tokens::FileTokens;
use crate::{ast_log, token_log};
use std::path::Path;

/// Flags change the behavior of the core compiler_frontend pipeline.
/// For the built-in CLI these are added as cli flags, but builders can decide how to choose flags
#[derive(PartialEq, Debug, Clone)]
pub enum Flag {
    DisableWarnings,
    DisableTimers,

    // Analyse and report without writing any output
    CheckOnly,
}

pub struct CompilerFrontend<'a> {
    pub(crate) options: &'a TransformOptions,
}

impl<'a> CompilerFrontend<'a> {
    pub(crate) fn new(options: &'a TransformOptions) -> Self {
        Self { options }
    }

    /// -----------------------------
    /// TOKENIZER
    /// -----------------------------
    pub fn source_to_tokens(&self, source_code: &str, module_path: &Path) -> Result<FileTokens, CompilerError> {
        let tokens = tokenize(source_code).map_err(|e| e.with_file_path(module_path))?;
        token_log!("Tokenized ", module_path.display().to_string(), " into ", #tokens.tokens.len(), " tokens");
        Ok(tokens)
    }

    /// -----------------------------
    /// AST CREATION
    /// -----------------------------
    pub fn tokens_to_ast(&self, mut tokens: FileTokens, module_path: &Path) -> Result<Ast, CompilerError> {
        let ast = build_ast(&mut tokens).map_err(|e| e.with_file_path(module_path))?;
        ast_log!("Built AST for ", module_path.display().to_string());
        Ok(ast)
    }

    /// -----------------------------
    /// MEMOIZATION
    /// -----------------------------
    /// Every component and hook of the file is analysed and rewritten in source order.
    /// A component that can not be transformed is left as it was, unless the options
    /// ask for the whole build to stop.
    pub fn memoize(&self, ast: &mut Ast, module_path: &Path) -> Result<TransformReport, CompilerError> {
        transform_program(ast, self.options).map_err(|e| e.with_file_path(module_path))
    }

    /// -----------------------------
    /// CODE GENERATION
    /// -----------------------------
    /// Unchanged top level statements are copied from the original source.
    pub fn ast_to_js(&self, ast: &Ast, source_code: &str) -> String {
        emit_program(ast, source_code)
    }
}
