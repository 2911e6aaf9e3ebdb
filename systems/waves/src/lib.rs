#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave orchestration: spawn queues, spawn pacing and end of run rewards.

use std::{collections::VecDeque, time::Duration};

use hearthguard_core::{BossFlag, EnemyKind, WaveCount, WaveDefinition};
use log::warn;
use rand::{seq::SliceRandom, Rng};

/// Number of scripted waves in the built-in table.
pub const DEFAULT_WAVE_COUNT: usize = 10;

const fn count(kind: EnemyKind, count: u32) -> WaveCount {
    WaveCount { kind, count }
}

fn wave(
    wolves: u32,
    boars: u32,
    crows: u32,
    trolls: u32,
    delay_secs: f32,
    boss: BossFlag,
) -> WaveDefinition {
    let counts = [
        count(EnemyKind::Wolf, wolves),
        count(EnemyKind::Boar, boars),
        count(EnemyKind::Crow, crows),
        count(EnemyKind::Troll, trolls),
    ]
    .into_iter()
    .filter(|entry| entry.count > 0)
    .collect();
    WaveDefinition {
        counts,
        delay_secs,
        boss,
    }
}

/// Built-in ten night campaign.
#[must_use]
pub fn default_wave_table() -> Vec<WaveDefinition> {
    vec![
        wave(4, 0, 0, 0, 2.0, BossFlag::None),
        wave(5, 2, 0, 0, 1.8, BossFlag::None),
        wave(6, 2, 2, 0, 1.6, BossFlag::None),
        wave(6, 3, 3, 1, 1.5, BossFlag::None),
        wave(5, 3, 3, 1, 1.5, BossFlag::Fox),
        wave(8, 4, 4, 2, 1.3, BossFlag::None),
        wave(8, 5, 5, 2, 1.2, BossFlag::None),
        wave(10, 5, 6, 3, 1.1, BossFlag::Raven),
        wave(12, 6, 6, 4, 1.0, BossFlag::None),
        wave(12, 8, 8, 5, 0.9, BossFlag::Both),
    ]
}

/// Looks up a wave, clamping the number into the table.
///
/// Wave numbers are 1-based. Returns `None` only for an empty table.
#[must_use]
pub fn wave_definition(table: &[WaveDefinition], wave: u32) -> Option<&WaveDefinition> {
    if table.is_empty() {
        warn!("wave table is empty, wave {wave} has no definition");
        return None;
    }
    let index = (wave.max(1) as usize - 1).min(table.len() - 1);
    if index + 1 != wave as usize {
        warn!("wave {wave} clamped to {} of {}", index + 1, table.len());
    }
    table.get(index)
}

/// Builds the spawn order for a wave.
///
/// Regular enemies are shuffled with `rng`; the wave's bosses follow every
/// regular enemy. Boss archetypes listed among the regular counts are ignored,
/// as are zero counts.
pub fn create_wave_spawn_queue<R: Rng + ?Sized>(
    table: &[WaveDefinition],
    wave: u32,
    rng: &mut R,
) -> VecDeque<EnemyKind> {
    let Some(definition) = wave_definition(table, wave) else {
        return VecDeque::new();
    };

    let mut regulars = Vec::new();
    for entry in &definition.counts {
        if entry.kind.is_boss() {
            warn!("wave {wave} lists boss {:?} as a regular enemy, skipping", entry.kind);
            continue;
        }
        regulars.extend(std::iter::repeat(entry.kind).take(entry.count as usize));
    }
    if regulars.is_empty() && definition.boss == BossFlag::None {
        warn!("wave {wave} defines no enemies");
    }
    regulars.shuffle(rng);

    let mut queue: VecDeque<EnemyKind> = regulars.into();
    queue.extend(definition.boss.bosses().iter().copied());
    queue
}

/// Paces a wave's spawn queue, releasing one enemy per interval.
///
/// The first enemy is released on the first advance after [`start`].
///
/// [`start`]: WaveSpawner::start
#[derive(Clone, Debug, Default)]
pub struct WaveSpawner {
    queue: VecDeque<EnemyKind>,
    interval: Duration,
    accumulator: Duration,
}

impl WaveSpawner {
    /// Creates an idle spawner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pending queue and restarts pacing.
    ///
    /// The first enemy leaves on the next [`advance`](Self::advance); the
    /// n-th leaves once `n * delay` has accumulated since the start, so
    /// the time that advance covers counts toward the second release.
    /// Negative or non-finite delays release the whole queue at once.
    pub fn start(&mut self, queue: VecDeque<EnemyKind>, delay_secs: f32) {
        self.interval =
            Duration::try_from_secs_f32(delay_secs.max(0.0)).unwrap_or(Duration::ZERO);
        self.accumulator = self.interval;
        self.queue = queue;
    }

    /// Advances pacing by `dt` and pushes every enemy due into `out`.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<EnemyKind>) {
        if self.queue.is_empty() {
            self.accumulator = Duration::ZERO;
            return;
        }
        if self.interval.is_zero() {
            out.extend(self.queue.drain(..));
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        while self.accumulator >= self.interval {
            let Some(kind) = self.queue.pop_front() else {
                break;
            };
            self.accumulator -= self.interval;
            out.push(kind);
        }
    }

    /// Number of enemies still waiting to spawn.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Reports whether every queued enemy has spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every pending enemy.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.accumulator = Duration::ZERO;
    }
}

/// Skill points earned at the end of a run.
///
/// Victory pays `score / 5 + wave * 10`; defeat pays `score / 10 + wave * 5`.
#[must_use]
pub const fn calculate_reward(score: u32, wave: u32, victory: bool) -> u32 {
    if victory {
        score / 5 + wave.saturating_mul(10)
    } else {
        score / 10 + wave.saturating_mul(5)
    }
}
