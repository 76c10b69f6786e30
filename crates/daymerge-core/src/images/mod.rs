//! Image reference extraction, resolution and materialization
//!
//! - [`reference`]: find `![caption](path)` and `![[path]]` in note text
//! - [`resolver`]: search candidate directories for the referenced file
//! - [`materialize`]: copy into the shared asset directory and rewrite

pub mod materialize;
pub mod reference;
pub mod resolver;

pub use materialize::{AssetMaterializer, AssetNamer, ResolvedAsset};
pub use reference::{ImageReference, ReferenceExtractor, ReferenceSyntax, RegexExtractor};
pub use resolver::{ImageResolver, Resolution, SearchPolicy};
