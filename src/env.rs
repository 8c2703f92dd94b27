use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::console::{Console, DEFAULT_SKIP_FRAME_LIMIT};
use crate::emulator::{Emulator, FRAME_CHANNELS, FRAME_HEIGHT, FRAME_WIDTH, TetanesEmulator};
use crate::error::{EnvError, Result};
use crate::input::{ActionTable, Buttons};
use crate::policy::RewardPolicy;

/// Free-form step/reset metadata.
pub type Info = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RenderMode {
    /// No display surface; frames are only returned as observations.
    #[default]
    Headless,
    /// Every emulated frame is also shown in a window.
    Windowed,
}

impl FromStr for RenderMode {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "headless" | "rgb_array" => Ok(Self::Headless),
            "windowed" | "human" => Ok(Self::Windowed),
            other => Err(EnvError::Config(format!(
                "invalid render mode '{other}', expected 'headless' or 'windowed'"
            ))),
        }
    }
}

impl TryFrom<String> for RenderMode {
    type Error = EnvError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RenderMode> for String {
    fn from(mode: RenderMode) -> Self {
        match mode {
            RenderMode::Headless => "headless".into(),
            RenderMode::Windowed => "windowed".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub render_mode: RenderMode,
    /// Target steps per second; non-positive means unlimited.
    pub fps_limit: i32,
    /// Steps allowed per episode; negative means unlimited.
    pub max_episode_length: i64,
    pub reward_min: Option<f64>,
    pub reward_max: Option<f64>,
    /// Frame budget for one skip-forward loop; `None` lets it run until its condition holds.
    pub skip_frame_limit: Option<u64>,
    /// Report the episode-length limit through `truncated` instead of `terminated`.
    pub report_truncation: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Headless,
            fps_limit: -1,
            max_episode_length: -1,
            reward_min: None,
            reward_max: None,
            skip_frame_limit: Some(DEFAULT_SKIP_FRAME_LIMIT),
            report_truncation: false,
        }
    }
}

impl EnvConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EnvError::Config(format!("failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| EnvError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    fn clamp_reward(&self, reward: f64) -> f64 {
        let reward = self.reward_min.map_or(reward, |min| reward.max(min));
        self.reward_max.map_or(reward, |max| reward.min(max))
    }
}

// =============================================================================
// Frame rate limiting
// =============================================================================

/// Sleeps out whatever is left of the per-step budget since the last step.
struct FrameLimiter {
    budget: Option<Duration>,
    last: Instant,
}

impl FrameLimiter {
    fn new(fps_limit: i32) -> Self {
        let budget = u64::try_from(fps_limit)
            .ok()
            .filter(|&fps| fps > 0)
            .map(|fps| Duration::from_nanos(1_000_000_000 / fps));
        Self {
            budget,
            last: Instant::now(),
        }
    }

    fn wait(&mut self) {
        let Some(budget) = self.budget else {
            return;
        };
        let elapsed = self.last.elapsed();
        if elapsed < budget {
            std::thread::sleep(budget - elapsed);
        }
        self.last = Instant::now();
    }
}

// =============================================================================
// Observation & step result
// =============================================================================

/// One rendered frame, `FRAME_HEIGHT x FRAME_WIDTH x 3` RGB bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    pub const SHAPE: (usize, usize, usize) = (FRAME_HEIGHT, FRAME_WIDTH, FRAME_CHANNELS);

    fn from_slice(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// RGB at row `y`, column `x`; `None` outside the frame.
    pub fn pixel(&self, y: usize, x: usize) -> Option<[u8; 3]> {
        if y >= FRAME_HEIGHT || x >= FRAME_WIDTH {
            return None;
        }
        let i = (y * FRAME_WIDTH + x) * FRAME_CHANNELS;
        self.data.get(i..i + FRAME_CHANNELS)?.try_into().ok()
    }
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Frame,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    Uninitialized,
    Ready,
    Running,
    Done,
}

// =============================================================================
// NES Environment
// =============================================================================

pub struct NesEnv<P> {
    console: Console,
    policy: P,
    actions: ActionTable,
    config: EnvConfig,
    state: EpisodeState,
    episode_frame_count: u64,
    limiter: FrameLimiter,
    rng: SmallRng,
}

impl<P: RewardPolicy> NesEnv<P> {
    pub fn new(engine: Box<dyn Emulator>, policy: P, config: EnvConfig) -> Result<Self> {
        let mut console = Console::new(engine);
        console.set_skip_frame_limit(config.skip_frame_limit);
        if config.render_mode == RenderMode::Windowed {
            Self::attach_window(&mut console)?;
        }
        let actions = policy.actions();
        Ok(Self {
            console,
            policy,
            actions,
            limiter: FrameLimiter::new(config.fps_limit),
            config,
            state: EpisodeState::Uninitialized,
            episode_frame_count: 0,
            rng: SmallRng::from_os_rng(),
        })
    }

    /// Builds an environment over a ROM file emulated by tetanes-core.
    pub fn from_rom(rom_path: impl AsRef<Path>, policy: P, config: EnvConfig) -> Result<Self> {
        let engine = TetanesEmulator::new(rom_path.as_ref())?;
        Self::new(Box::new(engine), policy, config)
    }

    #[cfg(feature = "window")]
    fn attach_window(console: &mut Console) -> Result<()> {
        console.attach_display(crate::display::Display::open("nes-gym")?);
        Ok(())
    }

    #[cfg(not(feature = "window"))]
    fn attach_window(_console: &mut Console) -> Result<()> {
        Err(EnvError::Config(
            "windowed render mode requires the `window` feature".into(),
        ))
    }

    /// Restores the save state (or power cycles) and returns the first frame.
    pub fn reset(&mut self, seed: Option<u64>, _options: Option<&Info>) -> Result<(Frame, Info)> {
        if let Some(seed) = seed {
            self.rng = SmallRng::seed_from_u64(seed);
        }

        self.policy.will_reset(&mut self.console)?;
        let restored = self.console.restore()?;
        if !restored {
            self.console.power_cycle()?;
        }
        self.episode_frame_count = 0;
        self.policy.did_reset(&mut self.console)?;

        let observation = Frame::from_slice(self.console.frame_advance(Buttons::NONE)?);
        self.console.capture();
        self.state = EpisodeState::Ready;
        debug!(
            restored,
            frames = self.console.total_frames(),
            "episode reset"
        );
        Ok((observation, Info::new()))
    }

    /// Applies one action for one frame.
    pub fn step(&mut self, action: usize) -> Result<StepResult> {
        match self.state {
            EpisodeState::Uninitialized => {
                return Err(EnvError::InvalidState("cannot step before the first reset"));
            }
            EpisodeState::Done => {
                return Err(EnvError::InvalidState(
                    "cannot step in a done environment, call reset first",
                ));
            }
            EpisodeState::Ready | EpisodeState::Running => {}
        }
        let buttons = self.actions.get(action)?;

        self.policy.will_step(&mut self.console)?;

        let observation = Frame::from_slice(self.console.frame_advance(buttons)?);
        self.console.stage();
        let (reward, policy_done) = {
            let memory = self.console.snapshots().pending();
            (self.policy.reward(&memory), self.policy.done(&memory))
        };
        let length_exceeded = self.max_len_exceeded();
        self.console.commit();
        self.episode_frame_count += 1;

        let reward = self.config.clamp_reward(reward);
        self.limiter.wait();

        self.policy.did_step(&mut self.console)?;

        let (terminated, truncated) = if self.config.report_truncation {
            (policy_done, length_exceeded && !policy_done)
        } else {
            (policy_done || length_exceeded, false)
        };
        self.state = if terminated || truncated {
            EpisodeState::Done
        } else {
            EpisodeState::Running
        };
        trace!(
            action,
            %buttons,
            reward,
            terminated,
            truncated,
            frame = self.episode_frame_count,
            "step"
        );

        Ok(StepResult {
            observation,
            reward,
            terminated,
            truncated,
            info: Info::new(),
        })
    }

    fn max_len_exceeded(&self) -> bool {
        u64::try_from(self.config.max_episode_length)
            .is_ok_and(|max| self.episode_frame_count > max)
    }

    pub fn sample_action(&mut self) -> usize {
        self.actions.sample(&mut self.rng)
    }

    pub fn action_table(&self) -> &ActionTable {
        &self.actions
    }

    /// Steps taken since the last reset.
    pub fn frame_count(&self) -> u64 {
        self.episode_frame_count
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == EpisodeState::Done
    }

    pub fn has_backup(&self) -> bool {
        self.console.has_backup()
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_mode_parses_known_names() {
        assert_eq!("headless".parse::<RenderMode>().unwrap(), RenderMode::Headless);
        assert_eq!("rgb_array".parse::<RenderMode>().unwrap(), RenderMode::Headless);
        assert_eq!("human".parse::<RenderMode>().unwrap(), RenderMode::Windowed);
        assert!(matches!("rgb".parse::<RenderMode>(), Err(EnvError::Config(_))));
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let config: EnvConfig =
            serde_json::from_str(r#"{ "fps_limit": 60, "render_mode": "headless" }"#).unwrap();
        assert_eq!(config.fps_limit, 60);
        assert_eq!(config.max_episode_length, -1);
        assert_eq!(config.skip_frame_limit, Some(DEFAULT_SKIP_FRAME_LIMIT));
        assert!(!config.report_truncation);
    }

    #[test]
    fn config_rejects_unknown_render_mode() {
        let parsed = serde_json::from_str::<EnvConfig>(r#"{ "render_mode": "vga" }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn reward_clamps_to_configured_range() {
        let config = EnvConfig {
            reward_min: Some(-1.0),
            reward_max: Some(2.0),
            ..Default::default()
        };
        assert_eq!(config.clamp_reward(-10.0), -1.0);
        assert_eq!(config.clamp_reward(10.0), 2.0);
        assert_eq!(config.clamp_reward(0.5), 0.5);
        assert_eq!(EnvConfig::default().clamp_reward(f64::MAX), f64::MAX);
    }

    #[test]
    fn limiter_is_inert_without_target() {
        assert!(FrameLimiter::new(0).budget.is_none());
        assert!(FrameLimiter::new(-5).budget.is_none());
        assert_eq!(
            FrameLimiter::new(50).budget,
            Some(Duration::from_millis(20))
        );
    }
}
