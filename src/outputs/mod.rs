//! Output generation for the harvested question set.
//!
//! # Submodules
//!
//! - [`markdown`]: renders the question records to the single Markdown
//!   document that is the run's primary artifact
//! - [`links`]: optional side artifact listing one source URL per record
//!
//! Output failures here are the one class of error the pipeline treats as
//! fatal; everything upstream degrades per item instead.

pub mod links;
pub mod markdown;
