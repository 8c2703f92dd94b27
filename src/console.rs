use tracing::{debug, info, warn};

#[cfg(feature = "window")]
use crate::display::Display;
use crate::emulator::{Emulator, SaveState};
use crate::error::Result;
use crate::input::Buttons;
use crate::snapshot::{MemoryView, RAM_SIZE, Snapshots};

/// Default guard for a single skip-forward loop: ten minutes of emulated time.
pub const DEFAULT_SKIP_FRAME_LIMIT: u64 = 36_000;

/// How a skip-forward loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    /// The target in-game condition holds.
    Reached,
    /// The termination check fired before the condition was met.
    Aborted,
    /// The loop ran out of its frame budget.
    FrameLimit,
}

/// The running machine as seen by the episode controller and policy hooks:
/// engine, RAM snapshots, and the single save-state slot.
pub struct Console {
    engine: Box<dyn Emulator>,
    snapshots: Snapshots,
    backup: Option<SaveState>,
    frames: u64,
    skip_frame_limit: Option<u64>,
    #[cfg(feature = "window")]
    display: Option<Display>,
}

impl Console {
    pub fn new(engine: Box<dyn Emulator>) -> Self {
        Self {
            engine,
            snapshots: Snapshots::new(),
            backup: None,
            frames: 0,
            skip_frame_limit: Some(DEFAULT_SKIP_FRAME_LIMIT),
            #[cfg(feature = "window")]
            display: None,
        }
    }

    pub fn set_skip_frame_limit(&mut self, limit: Option<u64>) {
        self.skip_frame_limit = limit;
    }

    pub fn skip_frame_limit(&self) -> Option<u64> {
        self.skip_frame_limit
    }

    #[cfg(feature = "window")]
    pub(crate) fn attach_display(&mut self, display: Display) {
        self.display = Some(display);
    }

    /// Sets the controller, runs exactly one frame and returns it.
    pub fn frame_advance(&mut self, buttons: Buttons) -> Result<&[u8]> {
        self.engine.set_controller(buttons);
        self.engine.step_frame()?;
        self.frames += 1;
        #[cfg(feature = "window")]
        if let Some(display) = self.display.as_mut() {
            display.present(self.engine.frame())?;
        }
        Ok(self.engine.frame())
    }

    pub fn frame(&self) -> &[u8] {
        self.engine.frame()
    }

    /// Total frames emulated by this instance, hooks included.
    pub fn total_frames(&self) -> u64 {
        self.frames
    }

    /// Live RAM byte, as of the last emulated frame.
    pub fn peek(&self, addr: u16) -> u8 {
        self.engine.peek(addr)
    }

    pub fn poke(&mut self, addr: u16, val: u8) {
        self.engine.poke(addr, val);
    }

    /// The committed current/previous snapshot pair.
    pub fn memory(&self) -> MemoryView<'_> {
        self.snapshots.view()
    }

    pub(crate) fn snapshots(&self) -> &Snapshots {
        &self.snapshots
    }

    /// Fills both snapshots with live RAM.
    pub(crate) fn capture(&mut self) {
        let mut ram = [0u8; RAM_SIZE];
        self.engine.read_ram(&mut ram);
        self.snapshots.fill(&ram);
    }

    /// Reads live RAM into the staging buffer without committing it.
    pub(crate) fn stage(&mut self) {
        self.engine.read_ram(self.snapshots.stage());
    }

    pub(crate) fn commit(&mut self) {
        self.snapshots.commit();
    }

    // =========================================================================
    // Save state
    // =========================================================================

    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    /// Captures the engine state, replacing any existing save state.
    pub fn backup(&mut self) -> Result<()> {
        self.backup = Some(self.engine.save_state()?);
        info!(frame = self.frames, "save state captured");
        Ok(())
    }

    /// Captures a save state only if none exists yet. Returns whether it did.
    pub fn ensure_backup(&mut self) -> Result<bool> {
        if self.has_backup() {
            return Ok(false);
        }
        self.backup()?;
        Ok(true)
    }

    /// Restores the save state if one exists. Returns whether it did.
    pub fn restore(&mut self) -> Result<bool> {
        match self.backup.as_ref() {
            Some(state) => {
                self.engine.load_state(state)?;
                debug!("restored save state");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn power_cycle(&mut self) -> Result<()> {
        debug!("power cycling engine");
        self.engine.power_cycle()
    }

    // =========================================================================
    // Skip-forward
    // =========================================================================

    /// Repeats `script` until `until` holds on live memory.
    ///
    /// Both predicates are checked before every cycle of the script, so a loop
    /// entered while `abort` already holds advances no frames.
    pub fn skip_forward<U, A>(
        &mut self,
        script: &[Buttons],
        mut until: U,
        mut abort: A,
    ) -> Result<SkipOutcome>
    where
        U: FnMut(&Console) -> bool,
        A: FnMut(&Console) -> bool,
    {
        let start = self.frames;
        loop {
            if until(&*self) {
                return Ok(SkipOutcome::Reached);
            }
            if abort(&*self) {
                debug!(frames = self.frames - start, "skip-forward aborted");
                return Ok(SkipOutcome::Aborted);
            }
            if let Some(limit) = self.skip_frame_limit {
                if self.frames - start >= limit {
                    warn!(limit, "skip-forward hit its frame limit");
                    return Ok(SkipOutcome::FrameLimit);
                }
            }
            if script.is_empty() {
                self.frame_advance(Buttons::NONE)?;
            }
            for &buttons in script {
                self.frame_advance(buttons)?;
            }
        }
    }

    /// Holds `buttons` for up to `frames` frames, stopping early once `until` holds.
    /// Returns the number of frames advanced.
    pub fn advance_until<U>(&mut self, frames: u32, buttons: Buttons, mut until: U) -> Result<u32>
    where
        U: FnMut(&Console) -> bool,
    {
        for n in 0..frames {
            self.frame_advance(buttons)?;
            if until(&*self) {
                return Ok(n + 1);
            }
        }
        Ok(frames)
    }
}
