//! Python bindings for the intent container using PyO3

use crate::config::Config;
use crate::container::IntentContainer;
use crate::expand::expand;
use crate::types::IntentMatch;
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde_json::Value;

fn to_py_err(e: crate::Error) -> PyErr {
    PyRuntimeError::new_err(e.to_string())
}

fn value_to_py(py: Python<'_>, value: &Value) -> PyObject {
    match value {
        Value::Null => py.None(),
        Value::Bool(b) => (*b).into_py(py),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into_py(py),
            None => n.as_f64().unwrap_or_default().into_py(py),
        },
        Value::String(s) => s.as_str().into_py(py),
        other => other.to_string().into_py(py),
    }
}

fn match_to_dict<'py>(py: Python<'py>, m: &IntentMatch) -> PyResult<Bound<'py, PyDict>> {
    let entities = PyDict::new_bound(py);
    for (slot, value) in &m.entities {
        entities.set_item(slot, value_to_py(py, value))?;
    }

    let dict = PyDict::new_bound(py);
    dict.set_item("name", m.name.as_deref())?;
    dict.set_item("entities", entities)?;
    if m.is_match() {
        dict.set_item("conf", m.confidence)?;
    }
    Ok(dict)
}

/// Expand a template into its literal variants (Python function)
#[pyfunction]
#[pyo3(name = "expand_parentheses")]
pub fn py_expand(template: &str) -> Vec<String> {
    expand(template)
}

/// Python wrapper for the intent container
#[pyclass(name = "IntentContainer")]
pub struct PyIntentContainer {
    inner: IntentContainer,
}

#[pymethods]
impl PyIntentContainer {
    #[new]
    #[pyo3(signature = (fuzz = false, n_workers = 4))]
    fn new(fuzz: bool, n_workers: usize) -> PyResult<Self> {
        let config = Config::default().with_fuzz(fuzz).with_workers(n_workers);
        let inner = IntentContainer::with_config(config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn add_intent(&mut self, name: &str, lines: Vec<String>) -> PyResult<()> {
        self.inner.add_intent(name, &lines).map_err(to_py_err)
    }

    fn remove_intent(&mut self, name: &str) {
        self.inner.remove_intent(name);
    }

    fn add_entity(&mut self, name: &str, lines: Vec<String>) -> PyResult<()> {
        self.inner.add_entity(name, &lines).map_err(to_py_err)
    }

    fn remove_entity(&mut self, name: &str) {
        self.inner.remove_entity(name);
    }

    #[pyo3(signature = (intent_name, context_name, context_val = None))]
    fn set_context(&mut self, intent_name: &str, context_name: &str, context_val: Option<&str>) {
        self.inner.set_context(intent_name, context_name, context_val);
    }

    fn unset_context(&mut self, intent_name: &str, context_name: &str) {
        self.inner.unset_context(intent_name, context_name);
    }

    fn require_context(&mut self, intent_name: &str, context_name: &str) {
        self.inner.require_context(intent_name, context_name);
    }

    fn unrequire_context(&mut self, intent_name: &str, context_name: &str) {
        self.inner.unrequire_context(intent_name, context_name);
    }

    fn exclude_context(&mut self, intent_name: &str, context_name: &str) {
        self.inner.exclude_context(intent_name, context_name);
    }

    fn unexclude_context(&mut self, intent_name: &str, context_name: &str) {
        self.inner.unexclude_context(intent_name, context_name);
    }

    fn exclude_keywords(&mut self, intent_name: &str, samples: Vec<String>) {
        self.inner.exclude_keywords(intent_name, &samples);
    }

    /// Best intent match for a query
    fn calc_intent<'py>(&self, py: Python<'py>, query: &str) -> PyResult<Bound<'py, PyDict>> {
        let inner = &self.inner;
        let result = py.allow_threads(|| inner.calc_intent(query));
        match_to_dict(py, &result)
    }

    /// All intents matching a query
    fn calc_intents<'py>(&self, py: Python<'py>, query: &str) -> PyResult<Vec<Bound<'py, PyDict>>> {
        let inner = &self.inner;
        let results: Vec<IntentMatch> = py.allow_threads(|| inner.calc_intents(query).collect());
        results.iter().map(|m| match_to_dict(py, m)).collect()
    }

    /// Expanded variants of an intent
    fn intent_samples(&self, name: &str) -> Option<Vec<String>> {
        self.inner.variants(name).map(<[String]>::to_vec)
    }

    fn intent_names(&self) -> Vec<String> {
        self.inner.intent_names()
    }
}
