//! nci - terminal console for a self-hosted CI controller.
//!
//! Register repositories, map branches to build scripts, browse recent jobs
//! and edit settings without leaving the terminal.

pub mod config;
pub mod git;
pub mod store;
pub mod tui;
pub mod util;
