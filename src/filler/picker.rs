//! Filler clip selection.

use onair_common::{Channel, ChannelFillerList, FillerListId, Program};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::continuity::PlayHistory;

/// A clip chosen to fill a gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFiller {
    pub program: Program,
    pub filler_list_id: FillerListId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillerPick {
    pub filler: Option<PickedFiller>,
    /// Shortest wait until a rejected candidate becomes eligible, if any.
    pub minimum_wait_ms: Option<i64>,
}

impl FillerPick {
    pub fn none() -> Self {
        Self {
            filler: None,
            minimum_wait_ms: None,
        }
    }
}

/// Chooses filler clips for flex gaps.
pub trait FillerPicker: Send + Sync {
    /// Pick a clip no longer than `required_ms` from `candidates`.
    fn pick_filler(
        &self,
        channel: &Channel,
        candidates: &[ChannelFillerList],
        required_ms: i64,
        now_ms: i64,
        history: &dyn PlayHistory,
    ) -> FillerPick;
}

/// Weighted random choice among clips that are off cooldown.
///
/// A filler list is skipped while less than its `cooldown_ms` has passed
/// since one of its clips last finished on the channel. A clip is skipped
/// while less than the channel's `filler_repeat_cooldown_ms` has passed since
/// it last finished. Each remaining clip is weighted by its list's weight.
pub struct WeightedFillerPicker {
    rng: Mutex<StdRng>,
}

impl WeightedFillerPicker {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic picker for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for WeightedFillerPicker {
    fn default() -> Self {
        Self::new()
    }
}

fn shorten(wait: &mut Option<i64>, candidate_ms: i64) {
    *wait = Some(wait.map_or(candidate_ms, |w| w.min(candidate_ms)));
}

impl FillerPicker for WeightedFillerPicker {
    fn pick_filler(
        &self,
        channel: &Channel,
        candidates: &[ChannelFillerList],
        required_ms: i64,
        now_ms: i64,
        history: &dyn PlayHistory,
    ) -> FillerPick {
        let mut rng = self.rng.lock();
        let mut pick: Option<PickedFiller> = None;
        let mut total_weight: u64 = 0;
        let mut minimum_wait_ms: Option<i64> = None;

        for list in candidates {
            if list.weight == 0 {
                continue;
            }

            if let Some(last) = history.filler_last_played(channel.id, list.filler_list_id) {
                let since = now_ms - last;
                if since < list.cooldown_ms {
                    shorten(&mut minimum_wait_ms, list.cooldown_ms - since);
                    continue;
                }
            }

            for clip in &list.programs {
                if !clip.is_playable() || clip.duration_ms > required_ms {
                    continue;
                }

                if let Some(last) = history.program_last_played(channel.id, clip.id) {
                    let since = now_ms - last;
                    if since < channel.filler_repeat_cooldown_ms {
                        let wait = channel.filler_repeat_cooldown_ms - since;
                        // Only worth waiting for if the clip still fits afterwards.
                        if wait + clip.duration_ms <= required_ms {
                            shorten(&mut minimum_wait_ms, wait);
                        }
                        continue;
                    }
                }

                let weight = u64::from(list.weight);
                total_weight += weight;
                if rng.gen_range(0..total_weight) < weight {
                    pick = Some(PickedFiller {
                        program: clip.clone(),
                        filler_list_id: list.filler_list_id,
                    });
                }
            }
        }

        FillerPick {
            filler: pick,
            minimum_wait_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onair_common::{ChannelId, OfflineSettings, ProgramId, ProgramKind};
    use std::collections::HashMap;

    #[derive(Default)]
    struct History {
        programs: HashMap<ProgramId, i64>,
        fillers: HashMap<FillerListId, i64>,
    }

    impl PlayHistory for History {
        fn program_last_played(&self, _channel: ChannelId, program: ProgramId) -> Option<i64> {
            self.programs.get(&program).copied()
        }

        fn filler_last_played(&self, _channel: ChannelId, list: FillerListId) -> Option<i64> {
            self.fillers.get(&list).copied()
        }
    }

    fn channel(filler_repeat_cooldown_ms: i64) -> Channel {
        Channel {
            id: ChannelId::new(),
            number: 1,
            name: "Test".to_string(),
            start_time_ms: 0,
            duration_ms: 1_000_000,
            offline: OfflineSettings::default(),
            filler_repeat_cooldown_ms,
        }
    }

    fn clip(duration_ms: i64) -> Program {
        Program {
            id: ProgramId::new(),
            title: format!("Bumper {}", duration_ms),
            duration_ms,
            location: format!("/filler/{}.mp4", duration_ms),
            kind: ProgramKind::Other,
        }
    }

    fn list(weight: u32, cooldown_ms: i64, programs: Vec<Program>) -> ChannelFillerList {
        ChannelFillerList {
            filler_list_id: FillerListId::new(),
            weight,
            cooldown_ms,
            programs,
        }
    }

    #[test]
    fn test_picks_only_fitting_clips() {
        let picker = WeightedFillerPicker::with_seed(7);
        let short = clip(20_000);
        let lists = vec![list(1, 0, vec![clip(90_000), short.clone(), clip(120_000)])];

        for _ in 0..20 {
            let pick = picker.pick_filler(&channel(0), &lists, 30_000, 1_000_000, &History::default());
            assert_eq!(pick.filler.unwrap().program.id, short.id);
        }
    }

    #[test]
    fn test_nothing_fits() {
        let picker = WeightedFillerPicker::with_seed(7);
        let lists = vec![list(1, 0, vec![clip(90_000)])];
        let pick = picker.pick_filler(&channel(0), &lists, 30_000, 1_000_000, &History::default());
        assert_eq!(pick, FillerPick::none());
    }

    #[test]
    fn test_list_cooldown_reports_wait() {
        let picker = WeightedFillerPicker::with_seed(7);
        let cooling = list(1, 60_000, vec![clip(10_000)]);
        let mut history = History::default();
        history.fillers.insert(cooling.filler_list_id, 1_000_000 - 15_000);

        let pick = picker.pick_filler(&channel(0), &[cooling], 300_000, 1_000_000, &history);
        assert!(pick.filler.is_none());
        assert_eq!(pick.minimum_wait_ms, Some(45_000));
    }

    #[test]
    fn test_clip_repeat_cooldown() {
        let picker = WeightedFillerPicker::with_seed(7);
        let recent = clip(10_000);
        let fresh = clip(10_000);
        let lists = vec![list(1, 0, vec![recent.clone(), fresh.clone()])];
        let mut history = History::default();
        history.programs.insert(recent.id, 1_000_000 - 5_000);

        for _ in 0..20 {
            let pick = picker.pick_filler(&channel(60_000), &lists, 300_000, 1_000_000, &history);
            assert_eq!(pick.filler.unwrap().program.id, fresh.id);
        }
    }

    #[test]
    fn test_clip_wait_ignored_when_it_cannot_fit() {
        let picker = WeightedFillerPicker::with_seed(7);
        let recent = clip(10_000);
        let lists = vec![list(1, 0, vec![recent.clone()])];
        let mut history = History::default();
        history.programs.insert(recent.id, 1_000_000 - 5_000);

        // 55s wait plus a 10s clip does not fit in 30s.
        let pick = picker.pick_filler(&channel(60_000), &lists, 30_000, 1_000_000, &history);
        assert_eq!(pick, FillerPick::none());
    }

    #[test]
    fn test_weights_bias_selection() {
        let picker = WeightedFillerPicker::with_seed(42);
        let heavy = list(9, 0, vec![clip(10_000)]);
        let light = list(1, 0, vec![clip(10_000)]);
        let heavy_id = heavy.filler_list_id;
        let lists = vec![heavy, light];

        let heavy_picks = (0..1_000)
            .filter(|_| {
                picker
                    .pick_filler(&channel(0), &lists, 60_000, 1_000_000, &History::default())
                    .filler
                    .is_some_and(|f| f.filler_list_id == heavy_id)
            })
            .count();
        assert!(heavy_picks > 800, "heavy list picked {} times", heavy_picks);
    }

    #[test]
    fn test_zero_weight_is_never_picked() {
        let picker = WeightedFillerPicker::with_seed(1);
        let lists = vec![list(0, 0, vec![clip(10_000)])];
        let pick = picker.pick_filler(&channel(0), &lists, 60_000, 1_000_000, &History::default());
        assert!(pick.filler.is_none());
    }
}
