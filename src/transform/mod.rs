//! Transform module
//!
//! Field-level record transformations applied between fetch and
//! serialization: epoch-second dates to ISO-8601, numeric flags to
//! "Yes"/"No", and field renames from a static mapping or a per-run
//! dictionary fetched from a metadata endpoint.

mod dictionary;
mod rules;

pub use dictionary::{parse_dictionary, DictionarySource, FieldDictionary};
pub use rules::{epoch_to_iso, flag_to_yes_no, rename_fields, TransformChain, TransformRule};

#[cfg(test)]
mod tests;
