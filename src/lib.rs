pub(crate) mod build_system {
    pub(crate) mod build;
}
pub(crate) mod compiler_frontend;
pub mod projects;

#[cfg(test)]
mod compiler_tests;

pub use projects::cli::start_cli;
