//! Dictionary metadata, validation, JSON I/O and deterministic generation.

use crate::matcher::rotate_code;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Errors produced while loading, validating or generating a dictionary.
#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("dictionary `{0}` has no codes")]
    EmptyDictionary(String),
    #[error("marker_size {marker_size} needs {bits} bits; at most 64 are supported")]
    MarkerTooLarge { marker_size: usize, bits: usize },
    #[error("code {code:#x} of marker {id} has bits outside the {marker_size}x{marker_size} grid")]
    CodeOutOfRange {
        id: usize,
        code: u64,
        marker_size: usize,
    },
    #[error("unknown built-in dictionary `{0}`; OpenCV tables can be loaded from an exported JSON file")]
    UnknownBuiltin(String),
    #[error("marker {id}: expected a {marker_size}x{marker_size} matrix of 0/1 values")]
    InvalidBitMatrix { id: usize, marker_size: usize },
    #[error("marker {id}: expected {expected} bytes, got {got}")]
    InvalidByteList {
        id: usize,
        expected: usize,
        got: usize,
    },
    #[error("only {generated} of {requested} codes found with distance >= {min_distance}")]
    GenerationExhausted {
        generated: usize,
        requested: usize,
        min_distance: u8,
    },
}

/// A square marker dictionary.
///
/// Each code holds the inner `marker_size x marker_size` bits in row-major
/// order (`idx = y * marker_size + x`) with **black = 1**. The black border
/// around the inner bits is not part of the code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    /// Human-readable name (for logging and reports).
    pub name: String,
    /// Number of inner bits per side.
    pub marker_size: usize,
    /// Maximum number of bit errors the dictionary can correct.
    pub max_correction_bits: u8,
    /// One code per marker id.
    pub codes: Vec<u64>,
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Code of marker `id`, if present.
    pub fn code(&self, id: u32) -> Option<u64> {
        self.codes.get(id as usize).copied()
    }

    /// Check structural constraints; loaded dictionaries go through this.
    pub fn validate(&self) -> Result<(), DictionaryError> {
        let bits = self.bit_count();
        if self.marker_size == 0 || bits > 64 {
            return Err(DictionaryError::MarkerTooLarge {
                marker_size: self.marker_size,
                bits,
            });
        }
        if self.codes.is_empty() {
            return Err(DictionaryError::EmptyDictionary(self.name.clone()));
        }
        let mask = bit_mask(bits);
        if let Some((id, &code)) = self.codes.iter().enumerate().find(|(_, &c)| c & !mask != 0) {
            return Err(DictionaryError::CodeOutOfRange {
                id,
                code,
                marker_size: self.marker_size,
            });
        }
        Ok(())
    }

    /// Smallest Hamming distance between any two markers under any rotation,
    /// including each marker against its own non-trivial rotations.
    pub fn min_distance(&self) -> Option<u32> {
        let n = self.marker_size;
        let self_dist = self
            .codes
            .iter()
            .flat_map(|&c| (1..4).map(move |r| (c ^ rotate_code(c, n, r)).count_ones()));
        let pair_dist = self.codes.iter().enumerate().flat_map(|(i, &a)| {
            self.codes[i + 1..]
                .iter()
                .flat_map(move |&b| (0..4).map(move |r| (a ^ rotate_code(b, n, r)).count_ones()))
        });
        self_dist.chain(pair_dist).min()
    }

    /// Load and validate a dictionary from a JSON file.
    ///
    /// Accepts this crate's format (`codes`) as well as an
    /// [`OpenCvDictionary`] export (`bits` or `bytes`).
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let raw = fs::read_to_string(path)?;
        let dict = match serde_json::from_str(&raw)? {
            DictionaryFile::Native(dict) => dict,
            DictionaryFile::OpenCv(export) => export.into_dictionary()?,
        };
        dict.validate()?;
        Ok(dict)
    }

    /// Write this dictionary to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DictionaryError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DictionaryFile {
    Native(Dictionary),
    OpenCv(OpenCvDictionary),
}

/// A dictionary as exported from OpenCV's `cv2.aruco` module.
///
/// OpenCV stores bits with **white = 1**; they are inverted on import. Give
/// either `bits` (one row-major inner matrix per marker, as returned by
/// `Dictionary.getBitsFromByteList`) or `bytes` (the rotation-0 plane of
/// `Dictionary.bytesList`, i.e. `bytesList[:, :, 0]`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OpenCvDictionary {
    pub name: String,
    pub marker_size: usize,
    /// Defaults to `(min_distance - 1) / 2` of the imported codes.
    #[serde(default)]
    pub max_correction_bits: Option<u8>,
    #[serde(default)]
    pub bits: Vec<Vec<Vec<u8>>>,
    #[serde(default)]
    pub bytes: Vec<Vec<u8>>,
}

impl OpenCvDictionary {
    pub fn into_dictionary(self) -> Result<Dictionary, DictionaryError> {
        let n = self.marker_size;
        let bits = n * n;
        if n == 0 || bits > 64 {
            return Err(DictionaryError::MarkerTooLarge {
                marker_size: n,
                bits,
            });
        }

        let codes = if self.bits.is_empty() {
            self.bytes
                .iter()
                .enumerate()
                .map(|(id, row)| code_from_opencv_bytes(id, row, n))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            self.bits
                .iter()
                .enumerate()
                .map(|(id, m)| code_from_opencv_bits(id, m, n))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut dict = Dictionary {
            name: self.name,
            marker_size: n,
            max_correction_bits: 0,
            codes,
        };
        dict.max_correction_bits = match self.max_correction_bits {
            Some(bits) => bits,
            None => dict
                .min_distance()
                .map_or(0, |d| (d.saturating_sub(1) / 2).min(u8::MAX as u32) as u8),
        };
        Ok(dict)
    }
}

fn code_from_opencv_bits(
    id: usize,
    matrix: &[Vec<u8>],
    marker_size: usize,
) -> Result<u64, DictionaryError> {
    let invalid = || DictionaryError::InvalidBitMatrix { id, marker_size };
    if matrix.len() != marker_size {
        return Err(invalid());
    }
    let mut code = 0u64;
    for (y, row) in matrix.iter().enumerate() {
        if row.len() != marker_size {
            return Err(invalid());
        }
        for (x, &v) in row.iter().enumerate() {
            match v {
                0 => code |= 1 << (y * marker_size + x),
                1 => {}
                _ => return Err(invalid()),
            }
        }
    }
    Ok(code)
}

/// OpenCV packs bits row-major, most significant bit first; a trailing
/// partial byte holds its bits right-aligned.
fn code_from_opencv_bytes(
    id: usize,
    bytes: &[u8],
    marker_size: usize,
) -> Result<u64, DictionaryError> {
    let bits = marker_size * marker_size;
    let expected = bits.div_ceil(8);
    if bytes.len() != expected {
        return Err(DictionaryError::InvalidByteList {
            id,
            expected,
            got: bytes.len(),
        });
    }
    let mut code = 0u64;
    for k in 0..bits {
        let byte = bytes[k / 8];
        let width = (bits - (k / 8) * 8).min(8);
        let white = (byte >> (width - 1 - k % 8)) & 1 == 1;
        if !white {
            code |= 1 << k;
        }
    }
    Ok(code)
}

fn bit_mask(bits: usize) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Odd 64-bit constant; multiplying by it permutes `0..2^bits` for any `bits`.
const CANDIDATE_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Build a dictionary by greedy selection over a fixed candidate sequence.
///
/// Candidate `i` is `i * CANDIDATE_MIX mod 2^bits`. A candidate is kept when
/// its black-bit count lies in the middle third, it differs from its own
/// rotations by at least `min_distance` bits, and it differs from every
/// rotation of every kept code by at least `min_distance` bits. The result
/// only depends on the arguments.
pub fn generate_dictionary(
    name: &str,
    marker_size: usize,
    count: usize,
    min_distance: u8,
) -> Result<Dictionary, DictionaryError> {
    let bits = marker_size * marker_size;
    if marker_size == 0 || bits > 64 {
        return Err(DictionaryError::MarkerTooLarge { marker_size, bits });
    }
    let mask = bit_mask(bits);
    let min_ones = (bits / 3) as u32;
    let max_ones = (bits - bits / 3) as u32;
    let d = min_distance as u32;

    // Rotations of every accepted code, flattened.
    let mut accepted_rotations: Vec<u64> = Vec::with_capacity(count * 4);
    let mut codes = Vec::with_capacity(count);
    let limit = if bits >= 64 { u64::MAX } else { 1u64 << bits };

    let mut i = 0u64;
    while codes.len() < count && i < limit {
        i += 1;
        let candidate = i.wrapping_mul(CANDIDATE_MIX) & mask;

        let ones = candidate.count_ones();
        if ones < min_ones || ones > max_ones {
            continue;
        }
        let rotations = [0u8, 1, 2, 3].map(|r| rotate_code(candidate, marker_size, r));
        if rotations[1..]
            .iter()
            .any(|&r| (candidate ^ r).count_ones() < d)
        {
            continue;
        }
        if accepted_rotations
            .iter()
            .any(|&a| (candidate ^ a).count_ones() < d)
        {
            continue;
        }

        codes.push(candidate);
        accepted_rotations.extend_from_slice(&rotations);
    }

    if codes.len() < count {
        return Err(DictionaryError::GenerationExhausted {
            generated: codes.len(),
            requested: count,
            min_distance,
        });
    }

    Ok(Dictionary {
        name: name.to_string(),
        marker_size,
        max_correction_bits: min_distance.saturating_sub(1) / 2,
        codes,
    })
}
