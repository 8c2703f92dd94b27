mod common;

use common::{Recorder, WalkRight, X};
use nes_gym::games::{Excitebike, MarioBros};
use nes_gym::{EnvConfig, EnvError, EpisodeState, LexicographicReward, RewardPolicy, SkipOutcome};

#[test]
fn step_before_reset_is_rejected() {
    let mut env = common::env(WalkRight::until(10), EnvConfig::default());
    assert_eq!(env.state(), EpisodeState::Uninitialized);
    assert!(matches!(env.step(0), Err(EnvError::InvalidState(_))));
}

#[test]
fn step_after_done_is_rejected_until_reset() {
    let mut env = common::env(WalkRight::until(1), EnvConfig::default());
    env.reset(None, None).unwrap();
    assert!(env.step(1).unwrap().terminated);
    assert!(env.is_done());
    assert!(matches!(env.step(0), Err(EnvError::InvalidState(_))));

    env.reset(None, None).unwrap();
    assert_eq!(env.state(), EpisodeState::Ready);
    assert!(env.step(0).is_ok());
    assert_eq!(env.state(), EpisodeState::Running);
}

#[test]
fn out_of_range_action_is_an_error() {
    let mut env = common::env(WalkRight::until(10), EnvConfig::default());
    env.reset(None, None).unwrap();
    match env.step(2) {
        Err(EnvError::ActionOutOfRange { index, len }) => {
            assert_eq!(index, 2);
            assert_eq!(len, 2);
        }
        other => panic!("expected ActionOutOfRange, got {other:?}"),
    }
    assert_eq!(env.frame_count(), 0);
    env.step(0).unwrap();
    assert_eq!(env.frame_count(), 1);
}

#[test]
fn ten_right_steps_match_ground_truth() {
    let mut env = common::env(WalkRight::until(10), EnvConfig::default());
    env.reset(Some(7), None).unwrap();

    let mut xs = vec![env.console().memory().get(X)];
    for _ in 0..10 {
        let result = env.step(1).unwrap();
        let x = env.console().memory().get(X);
        let last = *xs.last().unwrap();
        xs.push(x);

        assert!(!result.truncated);
        assert_eq!(result.terminated, x >= 10);
        assert_eq!(result.reward, f64::from(x) - f64::from(last));
    }
    assert_eq!(env.frame_count(), 10);
    assert_eq!(xs, (0..=10).collect::<Vec<u8>>());
    assert!(env.is_done());
}

#[test]
fn length_limit_terminates_on_the_step_after_it_is_exceeded() {
    let config = EnvConfig {
        max_episode_length: 3,
        ..EnvConfig::default()
    };
    let mut env = common::env(WalkRight::until(u8::MAX), config);
    env.reset(None, None).unwrap();
    for step in 1..=4 {
        let result = env.step(0).unwrap();
        assert!(!result.terminated, "step {step} terminated early");
    }
    let result = env.step(0).unwrap();
    assert!(result.terminated);
    assert!(!result.truncated);
    assert_eq!(env.frame_count(), 5);
}

#[test]
fn length_limit_can_report_truncation() {
    let config = EnvConfig {
        max_episode_length: 3,
        report_truncation: true,
        ..EnvConfig::default()
    };
    let mut env = common::env(WalkRight::until(u8::MAX), config);
    env.reset(None, None).unwrap();
    for _ in 1..=4 {
        assert!(!env.step(0).unwrap().truncated);
    }
    let result = env.step(0).unwrap();
    assert!(result.truncated);
    assert!(!result.terminated);
    assert!(env.is_done());
}

#[test]
fn previous_snapshot_trails_current_by_one_step() {
    let mut env = common::env(WalkRight::until(u8::MAX), EnvConfig::default());
    env.reset(None, None).unwrap();
    let mut last = *env.console().memory().current();
    for action in [1, 1, 0, 1] {
        env.step(action).unwrap();
        let memory = env.console().memory();
        assert_eq!(memory.previous(), &last);
        assert_eq!(memory.delta(common::TICK), 1);
        last = *memory.current();
    }
}

#[test]
fn reset_restores_the_save_state() {
    let policy = WalkRight {
        limit: 5,
        backup_at: Some(2),
    };
    let mut env = common::env(policy, EnvConfig::default());
    env.reset(None, None).unwrap();
    assert!(!env.has_backup());
    for _ in 0..5 {
        env.step(1).unwrap();
    }
    assert!(env.has_backup());
    assert!(env.is_done());

    let (first, _) = env.reset(None, None).unwrap();
    let memory = env.console().memory();
    assert_eq!(memory.get(X), 2);
    assert_eq!(memory.prev(X), 2);
    // saved at tick 3, plus the reset's idle frame
    assert_eq!(first.pixel(0, 0), Some([4, 4, 4]));
    let first_ram = *memory.current();
    assert_eq!(env.step(1).unwrap().reward, 1.0);

    let (second, _) = env.reset(None, None).unwrap();
    assert_eq!(second, first);
    assert_eq!(env.console().memory().current(), &first_ram);
    assert_eq!(env.console().memory().previous(), &first_ram);
}

#[test]
fn reset_without_backup_power_cycles() {
    let mut env = common::env(WalkRight::until(3), EnvConfig::default());
    env.reset(None, None).unwrap();
    for _ in 0..3 {
        env.step(1).unwrap();
    }
    env.reset(None, None).unwrap();
    assert_eq!(env.console().memory().get(X), 0);
    assert_eq!(env.console().peek(common::TICK), 1);
}

#[test]
fn hooks_run_in_order() {
    let mut env = common::env(Recorder::default(), EnvConfig::default());
    env.reset(None, None).unwrap();
    assert_eq!(env.policy().calls, ["will_reset", "did_reset"]);

    env.policy_mut().calls.clear();
    env.step(1).unwrap();
    assert_eq!(env.policy().calls, ["will_step", "reward", "done", "did_step"]);
}

#[test]
fn rewards_are_clamped() {
    let config = EnvConfig {
        reward_max: Some(0.5),
        ..EnvConfig::default()
    };
    let mut env = common::env(WalkRight::until(10), config);
    env.reset(None, None).unwrap();
    assert_eq!(env.step(1).unwrap().reward, 0.5);
}

#[test]
fn observation_is_the_rendered_frame() {
    let mut env = common::env(WalkRight::until(10), EnvConfig::default());
    let (first, info) = env.reset(None, None).unwrap();
    assert!(info.is_empty());
    assert_eq!(first.pixel(0, 0), Some([1, 1, 1]));
    let frame = env.step(0).unwrap().observation;
    assert_eq!(frame.as_bytes().len(), 256 * 240 * 3);
    assert_eq!(frame.pixel(239, 255), Some([2, 2, 2]));
    assert_eq!(frame.pixel(240, 0), None);
    assert_eq!(frame.pixel(0, 256), None);
}

#[test]
fn lexicographic_objectives_drive_the_reward() {
    let policy = LexicographicReward::new("1 0x10".parse().unwrap());
    let mut env = common::env(policy, EnvConfig::default());
    env.reset(None, None).unwrap();

    // generic actions: 0 none, 1 right, 2 left
    assert_eq!(env.step(1).unwrap().reward, 0.0);
    assert_eq!(env.step(1).unwrap().reward, 1.0);
    assert_eq!(env.step(0).unwrap().reward, 0.0);
    let result = env.step(2).unwrap();
    assert_eq!(result.reward, -1.0);
    assert!(!result.terminated);
}

#[test]
fn seeded_sampling_is_reproducible() {
    let mut a = common::env(WalkRight::until(u8::MAX), EnvConfig::default());
    let mut b = common::env(WalkRight::until(u8::MAX), EnvConfig::default());
    a.reset(Some(42), None).unwrap();
    b.reset(Some(42), None).unwrap();
    let sa: Vec<usize> = (0..32).map(|_| a.sample_action()).collect();
    let sb: Vec<usize> = (0..32).map(|_| b.sample_action()).collect();
    assert_eq!(sa, sb);
    assert!(sa.iter().all(|&i| i < 2));
}

#[test]
fn skip_loops_respect_the_configured_frame_limit() {
    let config = EnvConfig {
        skip_frame_limit: Some(8),
        ..EnvConfig::default()
    };
    // Lives never become non-zero on the scripted console.
    let mut env = common::env(MarioBros::default(), config);
    env.reset(None, None).unwrap();
    assert_eq!(env.console().total_frames(), 1);

    env.step(0).unwrap();
    assert_eq!(env.console().total_frames(), 1 + 8 + 1);
    let outcome = MarioBros::default()
        .skip_between_rounds(env.console_mut())
        .unwrap();
    assert_eq!(outcome, SkipOutcome::FrameLimit);
}

#[test]
fn excitebike_cold_start_walks_the_menus() {
    let mut env = common::env(Excitebike::default(), EnvConfig::default());
    env.reset(None, None).unwrap();
    assert_eq!(env.console().total_frames(), 60 + 1);
    assert_eq!(env.policy().finish_time(), None);
}
