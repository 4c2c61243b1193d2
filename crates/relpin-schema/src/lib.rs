//! Term parsing, release templates, application resources, and descriptor rendering
//! for relpin.
//!
//! This crate is the pure data layer: the Erlang term subset (`Term`) with its `nom`
//! parser and printer, the release template model (`ReleaseTemplate`), `.app` resource
//! files (`AppResource`), version substitution (`ResolvedRelease`), and the
//! column-aligned descriptor writer (`render_descriptor`).

pub mod app;
pub mod release;
pub mod render;
pub mod resolved;
pub mod term;
pub mod types;

pub use app::{parse_app_file, parse_app_str, AppFileError, AppResource};
pub use release::{
    parse_release_file, parse_release_str, AppEntry, ReleaseError, ReleaseName, ReleaseTemplate,
    StartType,
};
pub use render::{app_rows, render_descriptor};
pub use resolved::{apply_substitutions, substitute, ResolvedRelease, Substitution};
pub use term::{format_atom, format_string, parse_term, parse_terms, Term, TermError};
pub use types::AppName;
