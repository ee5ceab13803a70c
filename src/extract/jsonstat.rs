//! Multi-dimensional statistical tables in JSON-stat 2.0.
//!
//! Values arrive as one flat array in row-major order over the dimensions
//! listed in `id`, with cardinalities in `size`. Dimension order is read from
//! the response, never assumed.

use crate::error::CollectError;
use serde_derive::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub id: Vec<String>,
    pub size: Vec<usize>,
    pub dimension: HashMap<String, Dimension>,
    pub value: Values,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dimension {
    pub category: Category,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub index: Option<CategoryIndex>,
    #[serde(default)]
    pub label: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryIndex {
    Positions(HashMap<String, usize>),
    Ordered(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Values {
    Dense(Vec<Option<f64>>),
    Sparse(HashMap<String, Option<f64>>),
}

/// A category code and its display label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    pub code: String,
    pub label: String,
}

/// One period of the table: fuel members and their summed values, in
/// category order.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSlice {
    pub period: Member,
    pub values: Vec<(Member, f64)>,
}

impl Dataset {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CollectError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        Ok(serde_json::from_slice(bytes)?)
    }

    fn members(&self, position: usize) -> Result<Vec<Member>, CollectError> {
        let name = &self.id[position];
        let size = self.size[position];
        let category = &self
            .dimension
            .get(name)
            .ok_or_else(|| CollectError::structure(format!("no metadata for dimension '{}'", name)))?
            .category;

        let codes: Vec<String> = match (&category.index, &category.label) {
            (Some(CategoryIndex::Ordered(codes)), _) => codes.clone(),
            (Some(CategoryIndex::Positions(positions)), _) => {
                let mut slots: Vec<Option<String>> = vec![None; positions.len()];
                for (code, &at) in positions {
                    let slot = slots.get_mut(at).ok_or_else(|| {
                        CollectError::structure(format!("index {} out of range in '{}'", at, name))
                    })?;
                    *slot = Some(code.clone());
                }
                slots.into_iter().collect::<Option<Vec<_>>>().ok_or_else(|| {
                    CollectError::structure(format!("gaps in category index of '{}'", name))
                })?
            }
            // a single category may omit its index
            (None, Some(labels)) if labels.len() == 1 => labels.keys().cloned().collect(),
            (None, _) => {
                return Err(CollectError::structure(format!(
                    "no category index for dimension '{}'",
                    name
                )))
            }
        };

        if codes.len() != size {
            return Err(CollectError::structure(format!(
                "dimension '{}' declares size {} but lists {} categories",
                name,
                size,
                codes.len()
            )));
        }

        Ok(codes
            .into_iter()
            .map(|code| {
                let label = category
                    .label
                    .as_ref()
                    .and_then(|labels| labels.get(&code))
                    .cloned()
                    .unwrap_or_else(|| code.clone());
                Member { code, label }
            })
            .collect())
    }

    /// Pivots the table to period → fuel → value.
    ///
    /// Dimensions other than `fuel_dim` and `period_dim` are summed over.
    /// Null cells are skipped.
    pub fn by_period(&self, fuel_dim: &str, period_dim: &str) -> Result<Vec<PeriodSlice>, CollectError> {
        if self.id.len() != self.size.len() {
            return Err(CollectError::structure(format!(
                "{} dimension ids but {} sizes",
                self.id.len(),
                self.size.len()
            )));
        }
        let position = |name: &str| {
            self.id
                .iter()
                .position(|d| d == name)
                .ok_or_else(|| CollectError::structure(format!("dimension '{}' not in response", name)))
        };
        let fuel_at = position(fuel_dim)?;
        let period_at = position(period_dim)?;

        // every dimension must list as many categories as it declares
        let members = (0..self.id.len())
            .map(|at| self.members(at))
            .collect::<Result<Vec<_>, _>>()?;
        let fuels = members[fuel_at].clone();
        let periods = members[period_at].clone();

        let cells = self
            .size
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| CollectError::structure("table size overflows"))?;

        // row-major: the last dimension varies fastest
        let mut strides = vec![1usize; self.size.len()];
        for k in (0..self.size.len().saturating_sub(1)).rev() {
            strides[k] = strides[k + 1] * self.size[k + 1];
        }

        let mut sums: Vec<Vec<Option<f64>>> = vec![vec![None; fuels.len()]; periods.len()];
        let mut add = |flat: usize, value: f64| {
            let fuel = (flat / strides[fuel_at]) % self.size[fuel_at];
            let period = (flat / strides[period_at]) % self.size[period_at];
            let cell = &mut sums[period][fuel];
            *cell = Some(cell.unwrap_or(0.0) + value);
        };
        match &self.value {
            Values::Dense(values) => {
                if values.len() != cells {
                    return Err(CollectError::structure(format!(
                        "{} values for {} cells",
                        values.len(),
                        cells
                    )));
                }
                for (flat, value) in values.iter().enumerate() {
                    if let Some(value) = value {
                        add(flat, *value);
                    }
                }
            }
            Values::Sparse(values) => {
                for (position, value) in values {
                    let flat = position
                        .parse::<usize>()
                        .ok()
                        .filter(|&flat| flat < cells)
                        .ok_or_else(|| {
                            CollectError::structure(format!("value position '{}' out of range", position))
                        })?;
                    if let Some(value) = value {
                        add(flat, *value);
                    }
                }
            }
        }

        Ok(periods
            .into_iter()
            .zip(sums)
            .map(|(period, row)| PeriodSlice {
                period,
                values: fuels
                    .iter()
                    .cloned()
                    .zip(row)
                    .filter_map(|(fuel, value)| value.map(|v| (fuel, v)))
                    .collect(),
            })
            .collect())
    }
}
