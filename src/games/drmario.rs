//! Dr. Mario.

use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::{MemoryView, Which};

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    pub mode: u16,
    /// One decimal digit per byte, most significant first.
    pub score: [u16; 7],
    pub level: u16,
    pub virus_level: u16,
    pub pill_speed: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            mode: 0x0046,
            score: [0x072E, 0x072D, 0x072C, 0x072B, 0x072A, 0x0729, 0x0728],
            level: 0x0316,
            virus_level: 0x0096,
            pill_speed: 0x030B,
        }
    }
}

const MODE_PLAYING: u8 = 4;
const MODE_GAME_OVER: u8 = 7;

#[derive(Debug, Clone, Default)]
pub struct DrMario {
    pub ram: RamMap,
}

impl DrMario {
    pub fn score_change(&self, memory: &MemoryView<'_>) -> i64 {
        memory.read_digits(&self.ram.score, Which::Current) as i64
            - memory.read_digits(&self.ram.score, Which::Previous) as i64
    }

    fn game_over(&self, memory: &MemoryView<'_>) -> bool {
        memory.get(self.ram.mode) == MODE_GAME_OVER
    }
}

impl RewardPolicy for DrMario {
    fn actions(&self) -> ActionTable {
        ActionTable::from([Buttons::NONE, Buttons::LEFT, Buttons::DOWN, Buttons::RIGHT, Buttons::A])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        let mut reward = 0.01 + self.score_change(memory) as f64;
        if self.game_over(memory) {
            reward -= 20.0;
        }
        reward / 1e3
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        self.game_over(memory)
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        if console.peek(self.ram.mode) != MODE_PLAYING {
            self.skip_between_rounds(console)?;
        }
        Ok(())
    }

    /// Start through the menus, then wait out the level intro.
    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let mode = self.ram.mode;
        let game_over = |c: &Console| c.peek(mode) == MODE_GAME_OVER;
        let outcome = console.skip_forward(
            &[Buttons::START, Buttons::NONE],
            |c| c.peek(mode) > 1,
            game_over,
        )?;
        if outcome != SkipOutcome::Reached {
            return Ok(outcome);
        }
        console.skip_forward(&[Buttons::NONE], |c| c.peek(mode) == MODE_PLAYING, game_over)
    }
}
