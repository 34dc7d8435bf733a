//! Padacioso - dead simple template-based intent matching
//!
//! Intents are registered as templates such as `"(what|which) time is it"`
//! or `"buy {item}"`. Each template is expanded into literal variants, and a
//! query is scored against every variant with a cased, uncased and optional
//! fuzzy pass. The best scoring intent wins and its captured slots are
//! returned as entities.

pub mod config;
pub mod container;
pub mod context;
pub mod entities;
pub mod error;
pub mod expand;
pub mod matcher;
pub mod pattern;
pub mod registry;
pub mod similarity;
pub mod types;

pub use config::{ConfidenceLevel, Config};
pub use container::IntentContainer;
pub use error::{Error, Result};
pub use expand::{clean_braces, expand, normalize_example, translate_padatious};
pub use pattern::{Conversion, Matcher, Types};
pub use similarity::fuzzy_match;
pub use types::{Entities, IntentMatch};

// Python bindings
#[cfg(feature = "extension-module")]
pub mod py;

#[cfg(feature = "extension-module")]
use pyo3::prelude::*;

#[cfg(feature = "extension-module")]
#[pymodule]
fn padacioso(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use py::*;
    m.add_class::<PyIntentContainer>()?;
    m.add_function(wrap_pyfunction!(py_expand, m)?)?;
    Ok(())
}
