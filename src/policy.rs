use crate::console::{Console, SkipOutcome};
use crate::error::Result;
use crate::input::ActionTable;
use crate::snapshot::MemoryView;

/// Per-game reward and termination capability set.
///
/// `reward` and `done` see the snapshot pair for the step being evaluated
/// (memory after this frame vs. memory after the previous step). Hooks get the
/// live [`Console`] and default to no-ops.
pub trait RewardPolicy {
    /// Controller inputs the agent chooses between.
    fn actions(&self) -> ActionTable {
        ActionTable::default()
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64;

    fn done(&mut self, _memory: &MemoryView<'_>) -> bool {
        false
    }

    /// Runs before the agent's action is applied.
    fn will_step(&mut self, _console: &mut Console) -> Result<()> {
        Ok(())
    }

    /// Runs after the step's snapshots are committed.
    fn did_step(&mut self, _console: &mut Console) -> Result<()> {
        Ok(())
    }

    fn will_reset(&mut self, _console: &mut Console) -> Result<()> {
        Ok(())
    }

    /// Runs after the engine is restored or power cycled, before the first frame.
    fn did_reset(&mut self, _console: &mut Console) -> Result<()> {
        Ok(())
    }

    /// Drives the console through non-interactive screens.
    fn skip_between_rounds(&mut self, _console: &mut Console) -> Result<SkipOutcome> {
        Ok(SkipOutcome::Reached)
    }
}

impl<P: RewardPolicy + ?Sized> RewardPolicy for Box<P> {
    fn actions(&self) -> ActionTable {
        (**self).actions()
    }

    fn reward(&mut self, memory: &MemoryView<'_>) -> f64 {
        (**self).reward(memory)
    }

    fn done(&mut self, memory: &MemoryView<'_>) -> bool {
        (**self).done(memory)
    }

    fn will_step(&mut self, console: &mut Console) -> Result<()> {
        (**self).will_step(console)
    }

    fn did_step(&mut self, console: &mut Console) -> Result<()> {
        (**self).did_step(console)
    }

    fn will_reset(&mut self, console: &mut Console) -> Result<()> {
        (**self).will_reset(console)
    }

    fn did_reset(&mut self, console: &mut Console) -> Result<()> {
        (**self).did_reset(console)
    }

    fn skip_between_rounds(&mut self, console: &mut Console) -> Result<SkipOutcome> {
        (**self).skip_between_rounds(console)
    }
}
