//! Terminal front-end for the docente portal, built on `docente_core`.

pub mod app;
pub mod cli_args;
pub mod render;
