//! Sequencer patterns: a tempo plus a 16-step on/off row per pad.
//!
//! Rows are fixed-length arrays, so a stored grid can never hold anything
//! but 16 steps. Grids from outside (storage, a pattern generator) arrive as
//! plain `Vec<bool>` rows and are shaped on the way in, either strictly
//! (reject anything off) or by coercion (truncate or pad with rests).

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigurationError;
use crate::kit::{Kit, PadId};

pub const STEPS: usize = 16;
pub const MIN_BPM: u32 = 40;
pub const MAX_BPM: u32 = 300;

pub type Grid = BTreeMap<PadId, [bool; STEPS]>;

/// Rows as they arrive from outside, any length.
pub type LooseGrid = BTreeMap<PadId, Vec<bool>>;

/// How to treat incoming rows of the wrong shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapePolicy {
    /// Wrong lengths, unknown pads and out-of-range tempos are errors
    Strict,
    /// Rows are truncated or padded to 16 steps, tempo is clamped and
    /// unknown pads are dropped
    Coerce,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PatternRecord", into = "PatternRecord"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerPattern {
    id: String,
    name: String,
    bpm: u32,
    grid: Grid,
}

/// Stored form of a pattern. Deserializing one coerces its shape.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRecord {
    pub id: String,
    pub name: String,
    pub bpm: u32,
    pub grid: LooseGrid,
}

impl TryFrom<PatternRecord> for SequencerPattern {
    type Error = ConfigurationError;

    fn try_from(record: PatternRecord) -> Result<Self, Self::Error> {
        SequencerPattern::from_rows(
            &record.id,
            &record.name,
            record.bpm,
            &record.grid,
            ShapePolicy::Coerce,
            None,
        )
    }
}

impl From<SequencerPattern> for PatternRecord {
    fn from(pattern: SequencerPattern) -> Self {
        Self {
            grid: pattern
                .grid
                .iter()
                .map(|(&pad, row)| (pad, row.to_vec()))
                .collect(),
            id: pattern.id,
            name: pattern.name,
            bpm: pattern.bpm,
        }
    }
}

pub fn check_bpm(bpm: u32) -> Result<u32, ConfigurationError> {
    if (MIN_BPM..=MAX_BPM).contains(&bpm) {
        Ok(bpm)
    } else {
        Err(ConfigurationError::TempoOutOfRange(bpm))
    }
}

fn check_step(step: usize) -> Result<usize, ConfigurationError> {
    if step < STEPS {
        Ok(step)
    } else {
        Err(ConfigurationError::StepOutOfRange(step))
    }
}

/// Shape one incoming row.
fn shape_row(pad: PadId, row: &[bool], policy: ShapePolicy) -> Result<[bool; STEPS], ConfigurationError> {
    if policy == ShapePolicy::Strict && row.len() != STEPS {
        return Err(ConfigurationError::StepCountMismatch {
            pad,
            len: row.len(),
        });
    }
    let mut shaped = [false; STEPS];
    for (dst, &src) in shaped.iter_mut().zip(row) {
        *dst = src;
    }
    Ok(shaped)
}

/// Shape a whole incoming grid, checking pads against `kit` when given.
/// Rows with no hits are left out.
pub fn shape_grid(
    rows: &LooseGrid,
    policy: ShapePolicy,
    kit: Option<&Kit>,
) -> Result<Grid, ConfigurationError> {
    let mut grid = Grid::new();
    for (&pad, row) in rows {
        if kit.is_some_and(|kit| !kit.contains(pad)) {
            match policy {
                ShapePolicy::Strict => return Err(ConfigurationError::UnknownPad(pad)),
                ShapePolicy::Coerce => {
                    debug!(pad, "dropping row for a pad the kit does not have");
                    continue;
                }
            }
        }
        let shaped = shape_row(pad, row, policy)?;
        if shaped.contains(&true) {
            grid.insert(pad, shaped);
        }
    }
    Ok(grid)
}

/// An empty 120 bpm pattern.
impl Default for SequencerPattern {
    fn default() -> Self {
        Self {
            id: "pattern-1".to_string(),
            name: "Pattern 1".to_string(),
            bpm: 120,
            grid: Grid::new(),
        }
    }
}

impl SequencerPattern {
    pub fn new(id: &str, name: &str, bpm: u32) -> Result<Self, ConfigurationError> {
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            bpm: check_bpm(bpm)?,
            grid: Grid::new(),
        })
    }

    /// Build from loose rows under `policy`.
    pub fn from_rows(
        id: &str,
        name: &str,
        bpm: u32,
        rows: &LooseGrid,
        policy: ShapePolicy,
        kit: Option<&Kit>,
    ) -> Result<Self, ConfigurationError> {
        let bpm = match policy {
            ShapePolicy::Strict => check_bpm(bpm)?,
            ShapePolicy::Coerce => bpm.clamp(MIN_BPM, MAX_BPM),
        };
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            bpm,
            grid: shape_grid(rows, policy, kit)?,
        })
    }

    /// Set a whole row. An all-rest row removes the pad from the grid.
    pub fn with_row(mut self, pad: PadId, row: [bool; STEPS]) -> Self {
        if row.contains(&true) {
            self.grid.insert(pad, row);
        } else {
            self.grid.remove(&pad);
        }
        self
    }

    /// Same grid and tempo under a new identity.
    pub fn renamed(mut self, id: &str, name: &str) -> Self {
        self.id = id.to_string();
        self.name = name.to_string();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: u32) -> Result<(), ConfigurationError> {
        self.bpm = check_bpm(bpm)?;
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Swap in an already-shaped grid.
    pub fn replace_grid(&mut self, mut grid: Grid) {
        grid.retain(|_, row| row.contains(&true));
        self.grid = grid;
    }

    pub fn is_set(&self, pad: PadId, step: usize) -> bool {
        self.grid
            .get(&pad)
            .and_then(|row| row.get(step))
            .copied()
            .unwrap_or(false)
    }

    /// Flip one step and return its new value.
    pub fn toggle_step(&mut self, pad: PadId, step: usize) -> Result<bool, ConfigurationError> {
        let on = !self.is_set(pad, step);
        self.set_step(pad, step, on)?;
        Ok(on)
    }

    /// Rows left with no hits are dropped, so edits that cancel out leave
    /// the grid as it was.
    pub fn set_step(&mut self, pad: PadId, step: usize, on: bool) -> Result<(), ConfigurationError> {
        let step = check_step(step)?;
        let row = self.grid.entry(pad).or_insert([false; STEPS]);
        row[step] = on;
        if !row.contains(&true) {
            self.grid.remove(&pad);
        }
        Ok(())
    }

    /// Turn every step off.
    pub fn clear(&mut self) {
        self.grid.clear();
    }

    /// Pads that fire on `step`.
    pub fn pads_at(&self, step: usize) -> impl Iterator<Item = PadId> + '_ {
        self.grid
            .iter()
            .filter(move |(_, row)| row.get(step).copied().unwrap_or(false))
            .map(|(&pad, _)| pad)
    }

    pub fn active_steps(&self) -> usize {
        self.grid.values().flatten().filter(|on| **on).count()
    }
}

/// Parse a row from `x` (hit) and anything else (rest).
pub fn row(steps: &str) -> [bool; STEPS] {
    let mut row = [false; STEPS];
    for (dst, c) in row.iter_mut().zip(steps.chars().filter(|c| !c.is_whitespace())) {
        *dst = c == 'x' || c == 'X';
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::factory_kit;

    fn loose(rows: &[(PadId, usize)]) -> LooseGrid {
        rows.iter()
            .map(|&(pad, len)| (pad, (0..len).map(|i| i % 4 == 0).collect()))
            .collect()
    }

    #[test]
    fn toggling_twice_restores_the_step() {
        let mut pattern = SequencerPattern::new("p", "Beat", 120)
            .unwrap()
            .with_row(0, row("x...x...x...x..."));
        let before = pattern.clone();

        for step in 0..STEPS {
            assert_eq!(pattern.toggle_step(0, step).unwrap(), !before.is_set(0, step));
            pattern.toggle_step(0, step).unwrap();
            assert_eq!(pattern, before);
        }
    }

    #[test]
    fn rest_rows_are_not_stored() {
        let plain = SequencerPattern::new("p", "Beat", 120)
            .unwrap()
            .with_row(0, row("x...x...x...x..."));
        let mut padded = plain.clone().with_row(3, row("................"));
        assert_eq!(padded, plain);

        padded.toggle_step(3, 5).unwrap();
        padded.toggle_step(3, 5).unwrap();
        assert_eq!(padded, plain);

        let rows = loose(&[(0, 16), (1, 0)]);
        let coerced =
            SequencerPattern::from_rows("p", "Beat", 120, &rows, ShapePolicy::Coerce, None)
                .unwrap();
        assert!(!coerced.grid().contains_key(&1));
        assert_eq!(coerced.grid().len(), 1);
    }

    #[test]
    fn step_index_is_bounded() {
        let mut pattern = SequencerPattern::new("p", "Beat", 120).unwrap();
        assert_eq!(
            pattern.toggle_step(0, 16),
            Err(ConfigurationError::StepOutOfRange(16))
        );
        assert!(pattern.grid().is_empty());
    }

    #[test]
    fn tempo_range_is_enforced() {
        assert!(SequencerPattern::new("p", "Slow", 39).is_err());
        assert!(SequencerPattern::new("p", "Fast", 301).is_err());
        let mut pattern = SequencerPattern::new("p", "Ok", 40).unwrap();
        assert!(pattern.set_bpm(300).is_ok());
        assert_eq!(pattern.set_bpm(0), Err(ConfigurationError::TempoOutOfRange(0)));
        assert_eq!(pattern.bpm(), 300);
    }

    #[test]
    fn strict_shape_rejects_short_rows() {
        let kit = factory_kit();
        let rows = loose(&[(0, 16), (1, 12), (2, 16)]);
        let err = shape_grid(&rows, ShapePolicy::Strict, Some(&kit));
        assert_eq!(
            err,
            Err(ConfigurationError::StepCountMismatch { pad: 1, len: 12 })
        );
    }

    #[test]
    fn strict_shape_rejects_unknown_pads() {
        let kit = factory_kit();
        let rows = loose(&[(0, 16), (99, 16)]);
        assert_eq!(
            shape_grid(&rows, ShapePolicy::Strict, Some(&kit)),
            Err(ConfigurationError::UnknownPad(99))
        );
    }

    #[test]
    fn coercion_truncates_and_pads() {
        let rows = loose(&[(0, 20), (1, 5)]);
        let pattern =
            SequencerPattern::from_rows("p", "Loose", 500, &rows, ShapePolicy::Coerce, None)
                .unwrap();

        assert_eq!(pattern.bpm(), MAX_BPM);
        assert_eq!(pattern.grid()[&0], row("x...x...x...x..."));
        assert_eq!(pattern.grid()[&1], row("x...x..........."));
    }

    #[test]
    fn pads_at_lists_hits() {
        let pattern = SequencerPattern::new("p", "Beat", 120)
            .unwrap()
            .with_row(0, row("x...x...x...x..."))
            .with_row(1, row("....x.......x..."));
        assert_eq!(pattern.pads_at(4).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(pattern.pads_at(0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(pattern.pads_at(1).count(), 0);
        assert_eq!(pattern.active_steps(), 6);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn stored_patterns_are_coerced_on_load() {
        let json = r#"{"id":"p1","name":"Old","bpm":120,"grid":{"0":[true,false,true]}}"#;
        let pattern: SequencerPattern = serde_json::from_str(json).unwrap();
        assert!(pattern.is_set(0, 0));
        assert!(pattern.is_set(0, 2));
        assert!(!pattern.is_set(0, 15));

        let back = serde_json::to_string(&pattern).unwrap();
        let again: SequencerPattern = serde_json::from_str(&back).unwrap();
        assert_eq!(again, pattern);
    }
}
