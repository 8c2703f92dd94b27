//! Teenage Mutant Ninja Turtles.

use std::collections::HashSet;

use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::MemoryView;

use super::{TAP_START, never};

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    pub overworld_x: u16,
    pub overworld_y: u16,
    pub level_x: u16,
    /// 0 on the overworld.
    pub map_id: u16,
    pub boss_hp: u16,
    /// First of four consecutive turtle health bytes.
    pub turtle_hp: u16,
    pub lives: u16,
    pub in_game: u16,
    /// 1 on the character select screen.
    pub on_select: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            overworld_x: 0x0010,
            overworld_y: 0x0011,
            level_x: 0x00A0,
            map_id: 0x0020,
            boss_hp: 0x04D0,
            turtle_hp: 0x0077,
            lives: 0x0046,
            in_game: 0x003C,
            on_select: 0x0035,
        }
    }
}

const TURTLES: u16 = 4;
const STARTING_LIVES: u8 = 3;

#[derive(Debug, Clone, Default)]
pub struct Tmnt {
    pub ram: RamMap,
    visited: HashSet<(u8, u8)>,
}

impl Tmnt {
    /// Overworld tiles seen this episode.
    pub fn visited(&self) -> usize {
        self.visited.len()
    }
}

impl RewardPolicy for Tmnt {
    fn actions(&self) -> ActionTable {
        ActionTable::from([
            Buttons::NONE,
            Buttons::RIGHT,
            Buttons::LEFT,
            Buttons::UP,
            Buttons::DOWN,
            Buttons::A,
            Buttons::B,
            Buttons::A | Buttons::RIGHT,
            Buttons::A | Buttons::LEFT,
        ])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        let ram = self.ram;
        let mut reward = -0.01;
        if memory.get(ram.map_id) == 0 {
            let tile = (memory.get(ram.overworld_x), memory.get(ram.overworld_y));
            if self.visited.insert(tile) {
                reward += 0.5;
            }
        } else {
            reward += f64::from(memory.delta(ram.level_x).max(0));
        }
        if memory.prev(ram.boss_hp) > 0 && memory.get(ram.boss_hp) == 0 {
            reward += 50.0;
        }
        for addr in (0..TURTLES).map(|i| ram.turtle_hp + i) {
            if memory.get(addr) < memory.prev(addr) {
                reward -= if memory.get(addr) == 0 { 30.0 } else { 5.0 };
            }
        }
        reward / 100.0
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        memory.get(self.ram.lives) != STARTING_LIVES
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        if console.peek(self.ram.in_game) != 1 {
            self.skip_between_rounds(console)?;
        }
        Ok(())
    }

    fn did_step(&mut self, console: &mut Console) -> Result<()> {
        let flag = self.ram.on_select;
        if console.peek(flag) == 1 {
            console.skip_forward(&TAP_START, |c| c.peek(flag) != 1, never)?;
        }
        Ok(())
    }

    fn did_reset(&mut self, _console: &mut Console) -> Result<()> {
        self.visited.clear();
        Ok(())
    }

    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let flag = self.ram.in_game;
        console.skip_forward(&TAP_START, |c| c.peek(flag) == 1, never)
    }
}
