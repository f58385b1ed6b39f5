//! Built-in dictionaries.
//!
//! Built-ins are generated on first use from fixed parameters (see
//! [`generate_dictionary`]) and cached for the process lifetime. The same
//! tables can be exported with [`Dictionary::write_json`] and loaded back
//! with [`Dictionary::load_json`].

use crate::{generate_dictionary, Dictionary, DictionaryError};
use std::sync::OnceLock;

/// 5x5 inner bits, 50 markers, pairwise distance >= 8. Default for measurement.
pub const PARTSIZE_5X5_50: &str = "PARTSIZE_5X5_50";
/// 4x4 inner bits, 50 markers, pairwise distance >= 3.
pub const PARTSIZE_4X4_50: &str = "PARTSIZE_4X4_50";

struct BuiltinSpec {
    name: &'static str,
    marker_size: usize,
    count: usize,
    min_distance: u8,
}

const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: PARTSIZE_5X5_50,
        marker_size: 5,
        count: 50,
        min_distance: 8,
    },
    BuiltinSpec {
        name: PARTSIZE_4X4_50,
        marker_size: 4,
        count: 50,
        min_distance: 3,
    },
];

static CACHE: [OnceLock<Option<Dictionary>>; 2] = [OnceLock::new(), OnceLock::new()];

/// Names of all built-in dictionaries.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

/// Look up a built-in dictionary by name.
pub fn builtin_dictionary(name: &str) -> Option<Dictionary> {
    let idx = BUILTINS.iter().position(|b| b.name == name)?;
    CACHE[idx]
        .get_or_init(|| {
            let spec = &BUILTINS[idx];
            match generate_dictionary(spec.name, spec.marker_size, spec.count, spec.min_distance) {
                Ok(dict) => Some(dict),
                Err(err) => {
                    log::error!("built-in dictionary {} unavailable: {err}", spec.name);
                    None
                }
            }
        })
        .clone()
}

/// Like [`builtin_dictionary`] but reports unknown names as an error.
pub fn require_builtin(name: &str) -> Result<Dictionary, DictionaryError> {
    builtin_dictionary(name).ok_or_else(|| DictionaryError::UnknownBuiltin(name.to_string()))
}

/// The 5x5 dictionary used when nothing else is configured.
pub fn default_dictionary() -> Dictionary {
    builtin_dictionary(PARTSIZE_5X5_50).unwrap_or_else(|| Dictionary {
        name: PARTSIZE_5X5_50.to_string(),
        marker_size: 5,
        max_correction_bits: 0,
        codes: Vec::new(),
    })
}
