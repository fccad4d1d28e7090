//! Display cell map for the emulated rig.
//!
//! The rig's status display is addressed as 100 individually lit cells.
//! Update lines target one *group* of 8 consecutive cells and set all
//! eight from a bitmask: cell `8*g + i` is lit when bit `i` of the mask is
//! set. Cells never touched by an update stay unlit.
//!
//! Landmark cells (motor arrows, sensor activity markers) are named in
//! [`brickbridge_core::constants::cells`] so harnesses can assert on them
//! without knowing raw indices.
//!
//! # Examples
//!
//! ```
//! use brickbridge_emulator::DisplayPanel;
//! use brickbridge_protocol::DisplayUpdate;
//!
//! let mut panel = DisplayPanel::new();
//! panel.apply(&DisplayUpdate { group: 1, mask: 0x02 });
//!
//! assert!(panel.is_lit(9));
//! assert!(!panel.is_lit(8));
//! ```

use serde::{Deserialize, Serialize};

use brickbridge_core::constants::{DISPLAY_CELL_COUNT, DISPLAY_GROUP_SIZE};
use brickbridge_protocol::DisplayUpdate;

/// The full display cell map.
///
/// Cloning yields an independent snapshot; the bridge hands clones to the
/// harness so reads never alias the session's live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPanel {
    cells: Vec<bool>,
}

impl DisplayPanel {
    /// Create a panel with every cell unlit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: vec![false; DISPLAY_CELL_COUNT],
        }
    }

    /// Apply a group update, setting all 8 cells of the group from the mask.
    ///
    /// A group outside the cell map is a programming error: fatal in debug
    /// builds, ignored in release. The codec only produces single-digit
    /// groups, which always fit.
    pub fn apply(&mut self, update: &DisplayUpdate) {
        let start = update.group as usize * DISPLAY_GROUP_SIZE;
        debug_assert!(
            start + DISPLAY_GROUP_SIZE <= self.cells.len(),
            "display group {} outside cell map",
            update.group
        );
        if start + DISPLAY_GROUP_SIZE > self.cells.len() {
            return;
        }
        for i in 0..DISPLAY_GROUP_SIZE {
            self.cells[start + i] = update.mask & (1 << i) != 0;
        }
    }

    /// Whether the given cell is lit. Out-of-range indices read as unlit.
    #[must_use]
    pub fn is_lit(&self, cell: usize) -> bool {
        self.cells.get(cell).copied().unwrap_or(false)
    }

    /// Indices of all currently lit cells, ascending.
    #[must_use]
    pub fn lit_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, &lit)| lit.then_some(i))
            .collect()
    }

    /// Number of addressable cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; present for container-convention completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reset every cell to unlit.
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }
}

impl Default for DisplayPanel {
    fn default() -> Self {
        Self::new()
    }
}
