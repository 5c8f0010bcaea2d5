//! Python adapter - run the engine over live Python objects
//!
//! `PyContext` implements the handle seam with `PyObject`: `dup` is
//! `clone_ref`, `close` is a drop. Usage errors surface as `SystemError`,
//! call errors as `TypeError`.

use crate::errors::{ArgError, ErrorKind};
use crate::object::{Context, Number, Slot};
use crate::parse::Parsed;
use pyo3::exceptions::{PySystemError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyFloat, PyLong, PyTuple};

pub struct PyContext<'py> {
    py: Python<'py>,
}

impl<'py> PyContext<'py> {
    pub fn new(py: Python<'py>) -> Self {
        Self { py }
    }

    pub fn py(&self) -> Python<'py> {
        self.py
    }
}

impl Context for PyContext<'_> {
    type Handle = PyObject;

    fn dup(&self, handle: &PyObject) -> PyObject {
        handle.clone_ref(self.py)
    }

    fn close(&self, handle: PyObject) {
        drop(handle);
    }

    fn is_null(&self, _handle: &PyObject) -> bool {
        // A PyObject always points at a live object
        false
    }

    fn number(&self, handle: &PyObject) -> Option<Number> {
        let any = handle.as_ref(self.py);

        if any.is_instance_of::<PyFloat>() {
            return any.extract::<f64>().ok().map(Number::Float);
        }
        if any.is_instance_of::<PyLong>() {
            if let Ok(v) = any.extract::<i128>() {
                return Some(Number::Int(v));
            }
            // float() of an int beyond f64 raises OverflowError
            let approx = any.extract::<f64>().unwrap_or_else(|_| {
                if any.lt(0i64).unwrap_or(false) {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            });
            return Some(Number::WideInt(approx));
        }
        None
    }

    fn long_from(&self, value: i64) -> PyObject {
        value.into_py(self.py)
    }

    fn float_from(&self, value: f64) -> PyObject {
        value.into_py(self.py)
    }
}

impl From<ArgError> for PyErr {
    fn from(err: ArgError) -> Self {
        match err.kind() {
            ErrorKind::Usage => PySystemError::new_err(err.to_string()),
            ErrorKind::Call => PyTypeError::new_err(err.to_string()),
        }
    }
}

/// Own every positional argument as a handle
pub fn collect_args(args: &PyTuple) -> Vec<PyObject> {
    args.iter().map(|arg| arg.into_py(args.py())).collect()
}

/// Flatten a `**kwargs` dict into `(name, value)` pairs
pub fn collect_kwargs(kwargs: Option<&PyDict>) -> PyResult<Vec<(String, PyObject)>> {
    let Some(dict) = kwargs else {
        return Ok(Vec::new());
    };

    dict.iter()
        .map(|(key, value)| Ok((key.extract::<String>()?, value.into_py(dict.py()))))
        .collect()
}

/// Python values for each slot, `None` for unset ones
pub fn slots_to_tuple(py: Python<'_>, parsed: Parsed<'_, PyContext<'_>>) -> Py<PyTuple> {
    let values: Vec<PyObject> = parsed
        .into_slots()
        .into_iter()
        .map(|slot| match slot {
            Slot::Unset => py.None(),
            Slot::Int(v) => v.into_py(py),
            Slot::Long(v) => v.into_py(py),
            Slot::Double(v) => v.into_py(py),
            Slot::Borrowed(handle) => handle.clone_ref(py),
            Slot::Owned(owned) => owned.into_raw(),
        })
        .collect();

    PyTuple::new(py, values).into()
}

#[pyfunction]
#[pyo3(name = "parse", signature = (fmt, *args))]
fn py_parse(py: Python<'_>, fmt: &str, args: &PyTuple) -> PyResult<Py<PyTuple>> {
    let ctx = PyContext::new(py);
    let handles = collect_args(args);
    let parsed = crate::parse_positional(&ctx, &handles, fmt)?;
    Ok(slots_to_tuple(py, parsed))
}

#[pyfunction]
#[pyo3(name = "parse_keywords", signature = (fmt, names, *args, **kwargs))]
fn py_parse_keywords(
    py: Python<'_>,
    fmt: &str,
    names: Vec<String>,
    args: &PyTuple,
    kwargs: Option<&PyDict>,
) -> PyResult<Py<PyTuple>> {
    let ctx = PyContext::new(py);
    let handles = collect_args(args);
    let pairs = collect_kwargs(kwargs)?;
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let parsed = crate::parse_keywords(&ctx, &handles, &pairs, fmt, &names)?;
    Ok(slots_to_tuple(py, parsed))
}

#[pymodule]
fn _argmarshal(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_parse, m)?)?;
    m.add_function(wrap_pyfunction!(py_parse_keywords, m)?)?;
    Ok(())
}
