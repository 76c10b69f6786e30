//! CLI commands for daymerge

pub mod check;
pub mod dispatch;
pub mod list;
pub mod merge;
