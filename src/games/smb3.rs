//! Super Mario Bros. 3.
//!
//! Entering a level means walking the world map, so the skip loop follows a
//! fixed route keyed on Mario's map coordinates. The map coordinates live in
//! cartridge work RAM and are read live from the bus.

use tracing::warn;

use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;
use crate::snapshot::{MemoryView, Ram};

#[derive(Debug, Clone, Copy)]
pub struct RamMap {
    pub x_page: u16,
    pub x_pos: u16,
    /// 0 small, 1 super, 2 fire, 3 raccoon.
    pub power_up: u16,
    pub lives: u16,
    /// Non-zero while a level clock is running.
    pub level_timer: u16,
    /// 0x7F when full.
    pub p_meter: u16,
    /// Non-zero once the end-of-level card roulette starts.
    pub win_flag: u16,
    /// 0 inside a level.
    pub on_map: u16,
    pub map_y: u16,
    pub map_x: u16,
    pub world: u16,
    pub hit_timer: u16,
    pub dying: u16,
    pub title_state: u16,
}

impl Default for RamMap {
    fn default() -> Self {
        Self {
            x_page: 0x0075,
            x_pos: 0x0090,
            power_up: 0x00ED,
            lives: 0x0736,
            level_timer: 0x05EE,
            p_meter: 0x03DD,
            win_flag: 0x066F,
            on_map: 0x0014,
            map_y: 0x7976,
            map_x: 0x797A,
            world: 0x0727,
            hit_timer: 0x0552,
            dying: 0x00F1,
            title_state: 0x00DE,
        }
    }
}

impl RamMap {
    fn in_level(&self, console: &Console) -> bool {
        console.peek(self.on_map) == 0 && console.peek(self.level_timer) > 0
    }
}

/// Larger per-step jumps are screen transitions.
const MAX_X_CHANGE: i64 = 10;

#[derive(Debug, Clone, Copy)]
enum MapMove {
    /// Idle up to this many frames, stopping early once a level starts.
    Wait(u32),
    Press(Buttons),
}

use MapMove::{Press, Wait};

const IDLE: &[MapMove] = &[Press(Buttons::NONE)];

/// World 1 map route, keyed on `(map_x, map_y)`.
const WORLD_ONE_ROUTE: &[((u8, u8), &[MapMove])] = &[
    (
        (32, 64),
        &[
            Wait(240),
            Press(Buttons::RIGHT),
            Wait(60),
            Press(Buttons::UP),
            Wait(60),
            Press(Buttons::A),
            Press(Buttons::NONE),
        ],
    ),
    (
        (64, 32),
        &[Press(Buttons::NONE), Press(Buttons::RIGHT), Press(Buttons::NONE), Press(Buttons::A)],
    ),
    (
        (128, 32),
        &[Press(Buttons::NONE), Press(Buttons::RIGHT), Press(Buttons::NONE), Press(Buttons::A)],
    ),
    (
        (160, 32),
        &[
            Wait(960),
            Press(Buttons::RIGHT),
            Wait(120),
            Press(Buttons::DOWN),
            Wait(120),
            Press(Buttons::LEFT),
            Wait(120),
            Press(Buttons::A),
            Press(Buttons::NONE),
        ],
    ),
    (
        (160, 64),
        &[
            Wait(240),
            Press(Buttons::LEFT),
            Wait(60),
            Press(Buttons::DOWN),
            Wait(60),
            Press(Buttons::LEFT),
            Wait(60),
            Press(Buttons::A),
            Press(Buttons::NONE),
        ],
    ),
];

#[derive(Debug, Clone, Default)]
pub struct SuperMarioBros3 {
    pub ram: RamMap,
}

impl SuperMarioBros3 {
    pub fn position(&self, ram: &Ram) -> i64 {
        i64::from(ram[usize::from(self.ram.x_page)]) * 256
            + i64::from(ram[usize::from(self.ram.x_pos)])
    }

    fn is_dead(&self, memory: &MemoryView<'_>) -> bool {
        memory.get(self.ram.lives) < memory.prev(self.ram.lives) || memory.get(self.ram.dying) != 0
    }

    fn walk_map(&self, console: &mut Console) -> Result<()> {
        let ram = self.ram;
        let at = (console.peek(ram.map_x), console.peek(ram.map_y));
        let route = WORLD_ONE_ROUTE
            .iter()
            .find(|(pos, _)| *pos == at)
            .map(|(_, moves)| *moves)
            .unwrap_or(IDLE);
        for step in route {
            match *step {
                Wait(frames) => {
                    console.advance_until(frames, Buttons::NONE, |c| ram.in_level(c))?;
                }
                Press(buttons) => {
                    console.frame_advance(buttons)?;
                }
            }
        }
        Ok(())
    }
}

impl RewardPolicy for SuperMarioBros3 {
    fn actions(&self) -> ActionTable {
        ActionTable::from([
            Buttons::NONE,
            Buttons::LEFT,
            Buttons::RIGHT,
            Buttons::RIGHT | Buttons::B,
            Buttons::RIGHT | Buttons::A,
            Buttons::RIGHT | Buttons::B | Buttons::A,
            Buttons::A,
        ])
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        let mut x_change = self.position(memory.current()) - self.position(memory.previous());
        if x_change.abs() > MAX_X_CHANGE {
            x_change = 0;
        }
        let mut reward = -0.1 + x_change as f64;
        if self.is_dead(memory) {
            reward -= 20.0;
        }
        if memory.get(self.ram.win_flag) > 0 {
            reward += 50.0;
        }
        if memory.get(self.ram.p_meter) > memory.prev(self.ram.p_meter) {
            reward += 0.5;
        }
        reward
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        self.is_dead(memory)
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        if !self.ram.in_level(console) {
            self.skip_between_rounds(console)?;
        }
        Ok(())
    }

    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        let ram = self.ram;
        let start = console.total_frames();
        loop {
            if ram.in_level(console) {
                return Ok(SkipOutcome::Reached);
            }
            if console.peek(ram.dying) != 0 {
                return Ok(SkipOutcome::Aborted);
            }
            if let Some(limit) = console.skip_frame_limit() {
                if console.total_frames() - start >= limit {
                    warn!(limit, "map walk hit its frame limit");
                    return Ok(SkipOutcome::FrameLimit);
                }
            }
            if console.peek(ram.title_state) != 0 {
                console.frame_advance(Buttons::NONE)?;
                console.frame_advance(Buttons::START)?;
            } else if console.peek(ram.world) == 0 {
                self.walk_map(console)?;
            } else {
                console.frame_advance(Buttons::NONE)?;
            }
        }
    }
}
