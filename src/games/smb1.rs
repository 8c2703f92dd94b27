//! Super Mario Bros.

use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::MemoryView;

use super::MASH_START;

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    pub current_page: u16,
    pub x_pos: u16,
    pub level: u16,
    pub world: u16,
    pub player_state: u16,
    pub game_mode: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            current_page: 0x006D,
            x_pos: 0x0086,
            level: 0x0760,
            world: 0x075F,
            player_state: 0x000E,
            game_mode: 0x0770,
        }
    }
}

const PLAYER_DIES: u8 = 0x06;
const MODE_IN_GAME: u8 = 0x01;

pub const TIME_PENALTY: f64 = -0.1;
pub const DEATH_REWARD: f64 = -20.0;

#[derive(Debug, Clone, Default)]
pub struct SuperMarioBros {
    pub ram: RamMap,
}

impl SuperMarioBros {
    pub fn new(ram: RamMap) -> Self {
        Self { ram }
    }

    fn in_game(&self, console: &Console) -> bool {
        console.peek(self.ram.game_mode) == MODE_IN_GAME
    }

    fn is_dead(&self, memory: &MemoryView<'_>) -> bool {
        memory.get(self.ram.player_state) == PLAYER_DIES
    }

    /// Horizontal progress in pixels, page changes included.
    pub fn pos_change(&self, memory: &MemoryView<'_>) -> i64 {
        i64::from(memory.delta(self.ram.current_page)) * 0x100
            + i64::from(memory.delta(self.ram.x_pos))
    }
}

impl RewardPolicy for SuperMarioBros {
    fn actions(&self) -> ActionTable {
        ActionTable::from([Buttons::RIGHT | Buttons::B, Buttons::RIGHT | Buttons::B | Buttons::A])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        if self.is_dead(memory) {
            return DEATH_REWARD;
        }
        TIME_PENALTY + self.pos_change(memory) as f64
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        self.is_dead(memory)
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        if !self.in_game(console) {
            self.skip_between_rounds(console)?;
        }
        Ok(())
    }

    fn did_step(&mut self, console: &mut Console) -> Result<()> {
        if self.in_game(console) {
            console.ensure_backup()?;
        }
        Ok(())
    }

    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let ram = self.ram;
        console.skip_forward(
            &MASH_START,
            |c| c.peek(ram.game_mode) == MODE_IN_GAME,
            |c| c.peek(ram.player_state) == PLAYER_DIES,
        )
    }
}
