//! # The built-in workflows the compiler ships with
//! The CLI drives builds, checks, graph dumps and the watcher.
//! Everything here sits on top of the compiler frontend and the build system.

// The basic compiler CLI
pub mod cli;

pub(crate) mod runtime_module;
pub mod settings;
pub(crate) mod watch;
