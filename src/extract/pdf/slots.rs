//! Versioned slot layouts for country rows of press-release tables.
//!
//! Each fuel column publishes a (current period, prior period) pair, so a
//! layout of `n` slots expects `2n` counts. When a publisher prints a dash
//! for one fuel type the row loses that pair; the degraded variant of a
//! layout drops the slot and the count lands in the right place anyway.

use crate::error::CollectError;
use crate::model::{FuelCode, FuelTotals};

/// Counts published per slot.
const PAIR_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Fuel(FuelCode),
    /// Published but not kept, e.g. the row total
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotLayout {
    version: String,
    slots: Vec<Slot>,
    dropped: Option<FuelCode>,
}

impl SlotLayout {
    pub fn new(version: impl Into<String>, slots: Vec<Slot>) -> Self {
        Self {
            version: version.into(),
            slots,
            dropped: None,
        }
    }

    /// Declares the fuel type whose pair may be missing.
    pub fn with_dropped(mut self, code: FuelCode) -> Self {
        self.dropped = Some(code);
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn expected_tokens(&self) -> usize {
        self.slots.len() * PAIR_WIDTH
    }

    fn degraded(&self) -> Option<SlotLayout> {
        let code = self.dropped?;
        let slots: Vec<Slot> = self
            .slots
            .iter()
            .copied()
            .filter(|s| *s != Slot::Fuel(code))
            .collect();
        (slots.len() < self.slots.len()).then(|| SlotLayout {
            version: format!("{}-without-{}", self.version, code.as_str().to_lowercase()),
            slots,
            dropped: None,
        })
    }

    /// Keeps the current-period value of every fuel slot.
    ///
    /// `values` shorter than the layout leaves the trailing slots empty.
    pub fn assign(&self, values: &[u64]) -> FuelTotals {
        let mut totals = FuelTotals::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if let (Slot::Fuel(code), Some(value)) = (slot, values.get(index * PAIR_WIDTH)) {
                totals.add(*code, *value);
            }
        }
        totals
    }
}

/// Ordered layouts and their degraded variants.
#[derive(Debug, Clone)]
pub struct SlotPolicy {
    layouts: Vec<SlotLayout>,
}

impl SlotPolicy {
    pub fn new(layouts: Vec<SlotLayout>) -> Self {
        let layouts = layouts
            .into_iter()
            .flat_map(|layout| {
                let degraded = layout.degraded();
                std::iter::once(layout).chain(degraded)
            })
            .collect();
        Self { layouts }
    }

    /// Layouts of the monthly press-release country table.
    ///
    /// `2023` adds the LPG/CNG/other pair and a total pair to the `2020`
    /// table. Both may lose the hybrid pair.
    pub fn press_release() -> Self {
        use FuelCode::*;
        Self::new(vec![
            SlotLayout::new(
                "2023",
                vec![
                    Slot::Fuel(Bev),
                    Slot::Fuel(Phev),
                    Slot::Fuel(Hybrid),
                    Slot::Fuel(LpgCngOther),
                    Slot::Fuel(Gasoline),
                    Slot::Fuel(Diesel),
                    Slot::Skip,
                ],
            )
            .with_dropped(Hybrid),
            SlotLayout::new(
                "2020",
                vec![
                    Slot::Fuel(Bev),
                    Slot::Fuel(Phev),
                    Slot::Fuel(Hybrid),
                    Slot::Fuel(Gasoline),
                    Slot::Fuel(Diesel),
                ],
            )
            .with_dropped(Hybrid),
        ])
    }

    pub fn layouts(&self) -> &[SlotLayout] {
        &self.layouts
    }

    /// Picks the layout matching `count` exactly, else the widest one that fits.
    pub fn select(&self, count: usize) -> Result<&SlotLayout, CollectError> {
        if let Some(layout) = self.layouts.iter().find(|l| l.expected_tokens() == count) {
            return Ok(layout);
        }
        self.layouts
            .iter()
            .filter(|l| l.expected_tokens() <= count)
            .max_by_key(|l| l.expected_tokens())
            .ok_or_else(|| CollectError::InsufficientData {
                found: count,
                required: self
                    .layouts
                    .iter()
                    .map(SlotLayout::expected_tokens)
                    .min()
                    .unwrap_or_default(),
            })
    }
}
