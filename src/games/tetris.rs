use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::{Endian, MemoryView, Which};

use super::{MASH_START, never};

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    pub game_phase: u16,
    /// Score bytes, most significant first.
    pub score: [u16; 3],
    pub game_over: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            game_phase: 0x0048,
            score: [0x0053, 0x0054, 0x0055],
            game_over: 0x0058,
        }
    }
}

const GAME_OVER: u8 = 0x0A;

#[derive(Debug, Clone, Default)]
pub struct Tetris {
    pub ram: RamMap,
}

impl Tetris {
    fn in_game(&self, console: &Console) -> bool {
        console.peek(self.ram.game_phase) != 0
    }

    pub fn score(&self, memory: &MemoryView<'_>, which: Which) -> u64 {
        // Three bytes always fit.
        memory
            .read_multi_byte(&self.ram.score, Endian::Big, which)
            .unwrap_or_default()
    }

    pub fn score_change(&self, memory: &MemoryView<'_>) -> i64 {
        self.score(memory, Which::Current) as i64 - self.score(memory, Which::Previous) as i64
    }
}

impl RewardPolicy for Tetris {
    fn actions(&self) -> ActionTable {
        ActionTable::from([Buttons::NONE, Buttons::LEFT, Buttons::DOWN, Buttons::RIGHT, Buttons::A])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        -0.1 + self.score_change(memory) as f64
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        memory.get(self.ram.game_over) == GAME_OVER
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
        let phase = self.ram.game_phase;
        console.skip_forward(&MASH_START, |c| c.peek(phase) != 0, never)
    }
}
