use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::{BlockId, BlockRegistry};

pub const MAX_STACK_SIZE: u8 = 64;
pub const HOTBAR_SLOTS: usize = 4;
const EMPTY_SLOT_LABEL: &str = "--";
const LABEL_LEN: usize = 4;

/// One stack per block type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    counts: BTreeMap<BlockId, u8>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_starting() -> Self {
        let mut inventory = Self::new();
        inventory.add(BlockId::GRASS, 20);
        inventory.add(BlockId::DIRT, 20);
        inventory.add(BlockId::STONE, 20);
        inventory.add(BlockId::WOOD, 10);
        inventory.add(BlockId::LEAVES, 5);
        inventory
    }

    pub fn count(&self, block: BlockId) -> u8 {
        self.counts.get(&block).copied().unwrap_or(0)
    }

    /// Returns how many of `amount` did not fit in the stack.
    pub fn add(&mut self, block: BlockId, amount: u8) -> u8 {
        if block.is_air() || amount == 0 {
            return amount;
        }
        let slot = self.counts.entry(block).or_insert(0);
        let space = MAX_STACK_SIZE.saturating_sub(*slot);
        let accepted = amount.min(space);
        *slot += accepted;
        amount - accepted
    }

    pub fn take_one(&mut self, block: BlockId) -> bool {
        match self.counts.get_mut(&block) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HotbarSlotView {
    pub label: String,
    pub quantity: u8,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hotbar {
    slots: [Option<BlockId>; HOTBAR_SLOTS],
    selected: usize,
}

impl Default for Hotbar {
    fn default() -> Self {
        Self {
            slots: [
                Some(BlockId::GRASS),
                Some(BlockId::DIRT),
                Some(BlockId::STONE),
                Some(BlockId::WOOD),
            ],
            selected: 0,
        }
    }
}

impl Hotbar {
    pub fn with_slots(slots: [Option<BlockId>; HOTBAR_SLOTS]) -> Self {
        Self { slots, selected: 0 }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Returns false and keeps the current selection when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.slots.len() {
            return false;
        }
        self.selected = index;
        true
    }

    /// Number keys are 1-based.
    pub fn select_key(&mut self, digit: u8) -> bool {
        match usize::from(digit).checked_sub(1) {
            Some(index) => self.select(index),
            None => false,
        }
    }

    pub fn selected_block(&self) -> Option<BlockId> {
        self.slots[self.selected]
    }

    pub fn view(&self, inventory: &Inventory, registry: &BlockRegistry) -> Vec<HotbarSlotView> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                let (label, quantity) = match slot {
                    Some(block) => (slot_label(registry.name(*block)), inventory.count(*block)),
                    None => (EMPTY_SLOT_LABEL.to_string(), 0),
                };
                HotbarSlotView {
                    label,
                    quantity,
                    selected: index == self.selected,
                }
            })
            .collect()
    }
}

fn slot_label(name: &str) -> String {
    name.chars().take(LABEL_LEN).collect::<String>().to_uppercase()
}
