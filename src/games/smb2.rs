//! Super Mario Bros. 2 (international release).

use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::{MemoryView, Ram};

use super::never;

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    /// 0 on title and menus.
    pub game_state: u16,
    pub x_page: u16,
    pub x_pos: u16,
    pub health: u16,
    pub lives: u16,
    /// 2 on game over, 3 at the end of a level.
    pub level_transition: u16,
    pub level: u16,
    pub area: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            game_state: 0x00CD,
            x_page: 0x0014,
            x_pos: 0x0028,
            health: 0x04C2,
            lives: 0x04ED,
            level_transition: 0x04EC,
            level: 0x0531,
            area: 0x04E7,
        }
    }
}

const GAME_OVER: u8 = 0x02;
const LEVEL_END: u8 = 0x03;

#[derive(Debug, Clone, Default)]
pub struct SuperMarioBros2 {
    pub ram: RamMap,
}

impl SuperMarioBros2 {
    /// Progress through level, area and screen folded into one ordered number.
    pub fn progress(&self, ram: &Ram) -> i64 {
        let byte = |addr: u16| i64::from(ram[usize::from(addr)]);
        byte(self.ram.level) * 100_000
            + byte(self.ram.area) * 10_000
            + byte(self.ram.x_page) * 256
            + byte(self.ram.x_pos)
    }
}

impl RewardPolicy for SuperMarioBros2 {
    fn actions(&self) -> ActionTable {
        ActionTable::from([
            Buttons::NONE,
            Buttons::LEFT,
            Buttons::RIGHT,
            Buttons::UP,
            Buttons::DOWN,
            Buttons::A,
            Buttons::B,
            Buttons::DOWN | Buttons::B,
            Buttons::RIGHT | Buttons::A,
            Buttons::RIGHT | Buttons::B,
            Buttons::LEFT | Buttons::A,
            Buttons::LEFT | Buttons::B,
        ])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        let progress = self.progress(memory.current()) - self.progress(memory.previous());
        let mut reward = progress.max(0) as f64;
        if memory.get(self.ram.health) < memory.prev(self.ram.health) {
            reward -= 25.0;
        }
        if memory.get(self.ram.level_transition) == LEVEL_END {
            reward += 100.0;
        }
        reward
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        memory.get(self.ram.level_transition) == GAME_OVER
            || memory.get(self.ram.lives) < memory.prev(self.ram.lives)
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        if console.peek(self.ram.game_state) == 0 {
            self.skip_between_rounds(console)?;
        }
        Ok(())
    }

    /// Start and A through the title and character select.
    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let state = self.ram.game_state;
        console.skip_forward(
            &[Buttons::START, Buttons::NONE, Buttons::A, Buttons::NONE],
            |c| c.peek(state) != 0,
            never,
        )
    }
}
