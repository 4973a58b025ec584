//! Canonical Z-Wave value addressing.
//!
//! Every channel a node exposes is addressed by the quadruple
//! `node-class-instance-index`, printed with `-` separators. The same string
//! is stored as `Channel::value_id` and accepted by `set`.

use std::fmt;
use std::str::FromStr;

/// A parsed `node-class-instance-index` value address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueAddress {
    pub node_id: i64,
    pub class_id: i64,
    pub instance: i64,
    pub index: i64,
}

impl ValueAddress {
    #[must_use]
    pub fn new(node_id: i64, class_id: i64, instance: i64, index: i64) -> Self {
        Self {
            node_id,
            class_id,
            instance,
            index,
        }
    }
}

impl fmt::Display for ValueAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.node_id, self.class_id, self.instance, self.index
        )
    }
}

impl FromStr for ValueAddress {
    type Err = AddressParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = input.split('-').collect();
        if segments.len() != 4 {
            return Err(AddressParseError::SegmentCount {
                input: input.to_string(),
                actual: segments.len(),
            });
        }

        let mut parsed = [0_i64; 4];
        for (slot, segment) in parsed.iter_mut().zip(&segments) {
            *slot = segment
                .parse()
                .map_err(|_| AddressParseError::BadSegment {
                    input: input.to_string(),
                    segment: (*segment).to_string(),
                })?;
        }

        Ok(Self {
            node_id: parsed[0],
            class_id: parsed[1],
            instance: parsed[2],
            index: parsed[3],
        })
    }
}

/// Details about why a value address string could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum AddressParseError {
    /// The address does not have exactly four `-`-separated segments.
    #[error("expected 4 segments in {input:?}, got {actual}")]
    SegmentCount { input: String, actual: usize },

    /// A segment is not a decimal integer.
    #[error("non-numeric segment {segment:?} in {input:?}")]
    BadSegment { input: String, segment: String },
}
