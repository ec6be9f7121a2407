use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use authconsole_core::AppError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::wire::lenient_string;

/// Page-scoped identity of one row inside one editable table.
///
/// The index doubles as the form-field namespace of the row
/// (`table[<row_index>][field]`) and is never shared by two live rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RowIndex(u32);

impl RowIndex {
    /// Creates a row index from its numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Display for RowIndex {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for RowIndex {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid row index '{value}'")))
    }
}

impl<'de> Deserialize<'de> for RowIndex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = lenient_string(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Returns the smallest non-negative index not held by any live row.
#[must_use]
pub fn allocate_row_index<I>(live: I) -> RowIndex
where
    I: IntoIterator<Item = RowIndex>,
{
    let taken: BTreeSet<u32> = live.into_iter().map(RowIndex::value).collect();

    let mut candidate = 0_u32;
    for value in taken {
        if value != candidate {
            break;
        }
        candidate = candidate.saturating_add(1);
    }

    RowIndex(candidate)
}
