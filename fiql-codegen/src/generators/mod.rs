//! Code generators for derive macros.

mod derive;

pub use derive::derive_filterable_impl;
