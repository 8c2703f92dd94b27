//! Mario Bros.

use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::{MemoryView, Which};

use super::{MASH_START, never};

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    /// Packed BCD, most significant byte first.
    pub score: [u16; 3],
    pub lives: u16,
    /// Phase intro countdown.
    pub timer: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            score: [0x0095, 0x0096, 0x0097],
            lives: 0x0048,
            timer: 0x002D,
        }
    }
}

const FULL_LIVES: u8 = 2;

#[derive(Debug, Clone, Default)]
pub struct MarioBros {
    pub ram: RamMap,
}

impl MarioBros {
    pub fn score_change(&self, memory: &MemoryView<'_>) -> i64 {
        memory.read_bcd(&self.ram.score, Which::Current) as i64
            - memory.read_bcd(&self.ram.score, Which::Previous) as i64
    }
}

impl RewardPolicy for MarioBros {
    fn actions(&self) -> ActionTable {
        ActionTable::from([
            Buttons::NONE,
            Buttons::LEFT,
            Buttons::RIGHT,
            Buttons::A,
            Buttons::RIGHT | Buttons::A,
            Buttons::LEFT | Buttons::A,
        ])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        let reward = if memory.get(self.ram.lives) != FULL_LIVES {
            -20.0
        } else {
            -0.01 + self.score_change(memory) as f64
        };
        reward / 1e4
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        memory.get(self.ram.lives) == 1
    }

    /// Zeroes the intro countdown so phases start immediately.
    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        console.poke(self.ram.timer, 0);
        if console.peek(self.ram.lives) == 0 {
            self.skip_between_rounds(console)?;
        }
        Ok(())
    }

    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let lives = self.ram.lives;
        console.skip_forward(&MASH_START, |c| c.peek(lives) > 0, never)
    }
}
