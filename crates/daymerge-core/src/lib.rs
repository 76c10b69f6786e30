//! Daymerge Core Library
//!
//! Discovery, front-matter stripping, image resolution and the merge
//! pipeline behind the `daymerge` CLI.

pub mod assemble;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod images;
pub mod logging;
pub mod markdown;
pub mod note;
pub mod pipeline;
