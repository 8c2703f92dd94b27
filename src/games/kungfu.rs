//! Kung Fu (Spartan X).

use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::{MemoryView, Which};

use super::{TAP_START, never};

// =============================================================================
// RAM Addresses
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    /// 1 while the attract-mode demo is running.
    pub attract: u16,
    pub in_play: u16,
    /// Starts at 0x30.
    pub player_hp: u16,
    /// 0 on the title menu.
    pub menu: u16,
    pub x_fine: u16,
    pub floor: u16,
    /// 0xFF while the death animation plays.
    pub dead: u16,
    /// Score digits, most significant first. The game keeps each byte in
    /// 0..=9, so only the low nibble is read.
    pub score: [u16; 4],
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            attract: 0x006B,
            in_play: 0x0390,
            player_hp: 0x04A6,
            menu: 0x005C,
            x_fine: 0x00D4,
            floor: 0x0058,
            dead: 0x038D,
            score: [0x0532, 0x0533, 0x0534, 0x0535],
        }
    }
}

// =============================================================================
// Reward Tuning Knobs
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct RewardConfig {
    pub time_penalty: f64,
    pub score_divisor: f64,
    pub death_penalty: f64,
    /// Larger per-frame jumps are screen wraps or glitches.
    pub max_movement_delta: i16,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            time_penalty: -0.01,
            score_divisor: 100.0,
            death_penalty: -100.0,
            max_movement_delta: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KungFu {
    pub ram: RamMap,
    pub reward_config: RewardConfig,
}

impl KungFu {
    fn in_menu(&self, console: &Console) -> bool {
        console.peek(self.ram.menu) == 0
    }

    pub fn x_change(&self, memory: &MemoryView<'_>) -> f64 {
        let change = memory.delta(self.ram.x_fine);
        if change.abs() == 255 {
            // 0x00 <-> 0xFF wrap is a single pixel.
            -f64::from(change.signum())
        } else if change.abs() > self.reward_config.max_movement_delta {
            0.0
        } else {
            f64::from(change)
        }
    }

    pub fn hp_change(&self, memory: &MemoryView<'_>) -> f64 {
        let change = memory.delta(self.ram.player_hp);
        if change > 0 || memory.get(self.ram.player_hp) == 0 {
            0.0
        } else {
            f64::from(change)
        }
    }

    pub fn score_change(&self, memory: &MemoryView<'_>) -> i64 {
        memory.read_digits(&self.ram.score, Which::Current) as i64
            - memory.read_digits(&self.ram.score, Which::Previous) as i64
    }

    fn is_dead(&self, memory: &MemoryView<'_>) -> bool {
        memory.get(self.ram.dead) != 0
    }
}

impl RewardPolicy for KungFu {
    fn actions(&self) -> ActionTable {
        ActionTable::from([
            Buttons::UP,
            Buttons::DOWN,
            Buttons::LEFT,
            Buttons::RIGHT,
            Buttons::B,
            Buttons::A,
        ])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        if memory.get(self.ram.attract) == 1 {
            return 0.0;
        }
        let rc = &self.reward_config;
        // Even floors run right to left.
        let movement = if memory.get(self.ram.floor).is_multiple_of(2) {
            -self.x_change(memory)
        } else {
            self.x_change(memory)
        };
        let mut reward = rc.time_penalty
            + movement
            + self.score_change(memory) as f64 / rc.score_divisor
            + self.hp_change(memory);
        if self.is_dead(memory) {
            reward += rc.death_penalty;
        }
        reward
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        self.is_dead(memory)
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        if self.in_menu(console) {
            self.skip_between_rounds(console)?;
        }
        Ok(())
    }

    fn did_step(&mut self, console: &mut Console) -> Result<()> {
        let in_play = console.memory().get(self.ram.in_play) != 0;
        if !self.in_menu(console) && in_play {
            console.ensure_backup()?;
        }
        Ok(())
    }

    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let menu = self.ram.menu;
        console.skip_forward(&TAP_START, |c| c.peek(menu) != 0, never)
    }
}
