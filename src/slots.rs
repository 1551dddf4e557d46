use std::collections::HashMap;

use crate::grid::{Direction, Grid};
use crate::lexicon::Pattern;

pub type SlotId = usize;

/// A maximal run of at least two white cells in one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub direction: Direction,
    pub row: usize,
    pub col: usize,
    pub len: usize,
    pub cells: Vec<(usize, usize)>,
}

impl Slot {
    pub fn pattern(&self, grid: &Grid) -> Pattern {
        let letters: Vec<Option<char>> = self
            .cells
            .iter()
            .map(|&(r, c)| grid.get(r, c).letter())
            .collect();
        Pattern::new(&letters)
    }
}

/// One shared cell between an across slot and a down slot, recorded from the
/// point of view of the slot holding the adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other: SlotId,
    pub my_offset: usize,
    pub other_offset: usize,
}

/// All slots of a template plus their crossing adjacency, ordered by the
/// owning slot's offset.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotGraph {
    pub slots: Vec<Slot>,
    pub crossings: Vec<Vec<Crossing>>,
}

impl SlotGraph {
    pub fn extract(grid: &Grid) -> SlotGraph {
        let mut slots = Vec::new();
        for index in 0..grid.size() {
            scan_line(grid, Direction::Across, index, &mut slots);
        }
        let across_count = slots.len();
        for index in 0..grid.size() {
            scan_line(grid, Direction::Down, index, &mut slots);
        }

        let mut cell_to_across: HashMap<(usize, usize), (SlotId, usize)> = HashMap::new();
        for (id, slot) in slots.iter().enumerate().take(across_count) {
            for (offset, &cell) in slot.cells.iter().enumerate() {
                cell_to_across.insert(cell, (id, offset));
            }
        }

        let mut crossings = vec![Vec::new(); slots.len()];
        for (down_id, slot) in slots.iter().enumerate().skip(across_count) {
            for (down_offset, cell) in slot.cells.iter().enumerate() {
                if let Some(&(across_id, across_offset)) = cell_to_across.get(cell) {
                    crossings[across_id].push(Crossing {
                        other: down_id,
                        my_offset: across_offset,
                        other_offset: down_offset,
                    });
                    crossings[down_id].push(Crossing {
                        other: across_id,
                        my_offset: down_offset,
                        other_offset: across_offset,
                    });
                }
            }
        }
        for list in &mut crossings {
            list.sort_by_key(|crossing| crossing.my_offset);
        }

        SlotGraph { slots, crossings }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn crossing_count(&self, id: SlotId) -> usize {
        self.crossings[id].len()
    }

    pub fn crossings_of(&self, id: SlotId) -> &[Crossing] {
        &self.crossings[id]
    }
}

fn scan_line(grid: &Grid, direction: Direction, index: usize, slots: &mut Vec<Slot>) {
    let line = grid.line(direction, index);
    let mut start = 0;
    while start < line.len() {
        if line[start].is_black() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < line.len() && line[end].is_white() {
            end += 1;
        }
        if end - start >= 2 {
            let cells: Vec<(usize, usize)> = (start..end)
                .map(|offset| match direction {
                    Direction::Across => (index, offset),
                    Direction::Down => (offset, index),
                })
                .collect();
            let (row, col) = cells[0];
            slots.push(Slot {
                direction,
                row,
                col,
                len: end - start,
                cells,
            });
        }
        start = end + 1;
    }
}
