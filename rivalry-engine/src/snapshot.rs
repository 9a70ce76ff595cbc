//! Weekly improvement snapshots built from raw workout logs.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::constants::{CONSISTENCY_MAX, DEFAULT_TARGET_WORKOUTS_PER_WEEK, DEFAULT_TOP_GAINS_LIMIT};
use crate::numbers::{finite_or_zero, round_f64_to_u32};
use crate::workout::{RecordBook, WorkoutHistory, WorkoutSession};

/// Weight gained on one exercise between the two windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseGain {
    pub exercise: String,
    pub gain: f64,
}

pub type GainList = SmallVec<[ExerciseGain; DEFAULT_TOP_GAINS_LIMIT]>;

/// Normalized weekly performance summary for one party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ImprovementSnapshot {
    pub volume_this_week: f64,
    pub volume_last_week: f64,
    pub workouts_this_week: u32,
    pub workouts_last_week: u32,
    pub prs_this_week: u32,
    #[serde(default)]
    pub prs_last_week: u32,
    pub consistency_score: u32,
    #[serde(default)]
    pub top_exercise_gains: GainList,
}

impl ImprovementSnapshot {
    /// Snapshot from already-aggregated counts, with consistency derived
    /// against the default weekly target.
    #[must_use]
    pub fn from_counts(
        volume_this_week: f64,
        volume_last_week: f64,
        workouts_this_week: u32,
        workouts_last_week: u32,
        prs_this_week: u32,
    ) -> Self {
        Self {
            volume_this_week: non_negative(volume_this_week),
            volume_last_week: non_negative(volume_last_week),
            workouts_this_week,
            workouts_last_week,
            prs_this_week,
            prs_last_week: 0,
            consistency_score: consistency_score(
                workouts_this_week,
                DEFAULT_TARGET_WORKOUTS_PER_WEEK,
            ),
            top_exercise_gains: GainList::new(),
        }
    }

    #[must_use]
    pub const fn with_prs_last_week(mut self, prs_last_week: u32) -> Self {
        self.prs_last_week = prs_last_week;
        self
    }

    /// Build from a loaded history using explicit tuning.
    #[must_use]
    pub fn from_history(history: &WorkoutHistory, target: u32, top_gains_limit: usize) -> Self {
        build_snapshot_with_limit(
            &history.current_week,
            &history.previous_week,
            &history.current_records,
            &history.previous_records,
            target,
            top_gains_limit,
        )
    }

    /// True when the party did nothing in either window.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.volume_this_week <= 0.0
            && self.volume_last_week <= 0.0
            && self.workouts_this_week == 0
            && self.workouts_last_week == 0
            && self.prs_this_week == 0
    }

    /// Force volumes to finite non-negative values; used on snapshots that
    /// did not come out of the builder.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.volume_this_week = non_negative(self.volume_this_week);
        self.volume_last_week = non_negative(self.volume_last_week);
        self.consistency_score = self.consistency_score.min(CONSISTENCY_MAX);
        self
    }
}

fn non_negative(value: f64) -> f64 {
    finite_or_zero(value).max(0.0)
}

/// `workouts / target` as a 0-100 percentage.
#[must_use]
pub fn consistency_score(workouts: u32, target: u32) -> u32 {
    if target == 0 {
        return if workouts > 0 { CONSISTENCY_MAX } else { 0 };
    }
    let pct = f64::from(workouts) / f64::from(target) * 100.0;
    round_f64_to_u32(pct).min(CONSISTENCY_MAX)
}

/// Build a snapshot for two adjacent weeks.
///
/// PRs count exercises whose best lift this week strictly beats the record
/// book as it stood before the week. An exercise absent from the book
/// counts as a new best.
#[must_use]
pub fn build_improvement_snapshot(
    current_week: &[WorkoutSession],
    previous_week: &[WorkoutSession],
    current_records: &RecordBook,
    previous_records: &RecordBook,
    target_workouts_per_week: u32,
) -> ImprovementSnapshot {
    build_snapshot_with_limit(
        current_week,
        previous_week,
        current_records,
        previous_records,
        target_workouts_per_week,
        DEFAULT_TOP_GAINS_LIMIT,
    )
}

fn build_snapshot_with_limit(
    current_week: &[WorkoutSession],
    previous_week: &[WorkoutSession],
    current_records: &RecordBook,
    previous_records: &RecordBook,
    target_workouts_per_week: u32,
    top_gains_limit: usize,
) -> ImprovementSnapshot {
    let this_week = WeekTotals::collect(current_week);
    let last_week = WeekTotals::collect(previous_week);

    ImprovementSnapshot {
        volume_this_week: non_negative(this_week.volume),
        volume_last_week: non_negative(last_week.volume),
        workouts_this_week: this_week.workouts,
        workouts_last_week: last_week.workouts,
        prs_this_week: this_week.count_prs(current_records),
        prs_last_week: last_week.count_prs(previous_records),
        consistency_score: consistency_score(this_week.workouts, target_workouts_per_week),
        top_exercise_gains: top_gains(&this_week, &last_week, top_gains_limit),
    }
}

#[derive(Debug, Default)]
struct WeekTotals {
    volume: f64,
    workouts: u32,
    max_by_exercise: BTreeMap<String, f64>,
}

impl WeekTotals {
    fn collect(sessions: &[WorkoutSession]) -> Self {
        let mut totals = Self::default();
        for session in sessions.iter().filter(|s| s.completed) {
            totals.workouts = totals.workouts.saturating_add(1);
            totals.volume += session.volume();
            for exercise in &session.exercises {
                if let Some(max) = exercise.max_weight() {
                    totals
                        .max_by_exercise
                        .entry(exercise.exercise_id.clone())
                        .and_modify(|best| *best = best.max(max))
                        .or_insert(max);
                }
            }
        }
        totals
    }

    fn count_prs(&self, records: &RecordBook) -> u32 {
        let count = self
            .max_by_exercise
            .iter()
            .filter(|(id, max)| **max > 0.0 && records.best(id).is_none_or(|best| **max > best))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

fn top_gains(this_week: &WeekTotals, last_week: &WeekTotals, limit: usize) -> GainList {
    let mut gains: Vec<ExerciseGain> = this_week
        .max_by_exercise
        .iter()
        .filter_map(|(id, now)| {
            let before = last_week.max_by_exercise.get(id)?;
            let gain = now - before;
            (gain > 0.0).then(|| ExerciseGain {
                exercise: id.clone(),
                gain,
            })
        })
        .collect();
    gains.sort_by(|a, b| {
        b.gain
            .total_cmp(&a.gain)
            .then_with(|| a.exercise.cmp(&b.exercise))
    });
    gains.truncate(limit);
    gains.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::{ExerciseLog, SetLog};
    use chrono::{TimeZone, Utc};

    fn session(id: &str, lifts: &[(&str, f64, u32)]) -> WorkoutSession {
        let exercises = lifts
            .iter()
            .map(|(ex, w, r)| ExerciseLog::new(*ex, vec![SetLog::new(*w, *r)]))
            .collect();
        WorkoutSession::new(id, Utc.with_ymd_and_hms(2026, 10, 14, 7, 0, 0).unwrap(), exercises)
    }

    #[test]
    fn empty_weeks_build_zero_snapshot() {
        let snap = build_improvement_snapshot(&[], &[], &RecordBook::new(), &RecordBook::new(), 4);
        assert_eq!(snap, ImprovementSnapshot::default());
        assert!(snap.is_idle());
    }

    #[test]
    fn volume_sums_weight_times_reps() {
        let current = vec![
            session("a", &[("squat", 100.0, 5), ("bench", 60.0, 10)]),
            session("b", &[]),
        ];
        let snap =
            build_improvement_snapshot(&current, &[], &RecordBook::new(), &RecordBook::new(), 4);
        assert!((snap.volume_this_week - 1_100.0).abs() < 1e-9);
        assert_eq!(snap.workouts_this_week, 2);
        assert_eq!(snap.consistency_score, 50);
    }

    #[test]
    fn prs_require_strictly_heavier_lifts() {
        let records: RecordBook = [
            ("squat".to_string(), 100.0),
            ("bench".to_string(), 70.0),
        ]
        .into_iter()
        .collect();
        let current = vec![session(
            "a",
            &[("squat", 100.0, 3), ("bench", 72.5, 3), ("row", 50.0, 8)],
        )];
        let snap = build_improvement_snapshot(&current, &[], &records, &RecordBook::new(), 4);
        // bench beats its record, row has no record yet, squat only matches.
        assert_eq!(snap.prs_this_week, 2);
    }

    #[test]
    fn prs_last_week_use_previous_records() {
        let previous_records: RecordBook = [("squat".to_string(), 90.0)].into_iter().collect();
        let previous = vec![session("p", &[("squat", 95.0, 3)])];
        let snap =
            build_improvement_snapshot(&[], &previous, &RecordBook::new(), &previous_records, 4);
        assert_eq!(snap.prs_last_week, 1);
        assert_eq!(snap.workouts_last_week, 1);
    }

    #[test]
    fn consistency_caps_at_hundred() {
        assert_eq!(consistency_score(6, 4), 100);
        assert_eq!(consistency_score(3, 4), 75);
        assert_eq!(consistency_score(1, 3), 33);
        assert_eq!(consistency_score(0, 0), 0);
        assert_eq!(consistency_score(2, 0), 100);
    }

    #[test]
    fn top_gains_sorted_and_limited() {
        let previous = vec![session(
            "p",
            &[("squat", 100.0, 3), ("bench", 70.0, 3), ("row", 60.0, 3), ("press", 40.0, 3)],
        )];
        let current = vec![session(
            "c",
            &[
                ("squat", 110.0, 3),
                ("bench", 72.5, 3),
                ("row", 65.0, 3),
                ("press", 39.0, 3),
                ("curl", 20.0, 3),
            ],
        )];
        let snap = build_improvement_snapshot(
            &current,
            &previous,
            &RecordBook::new(),
            &RecordBook::new(),
            4,
        );
        let names: Vec<_> = snap
            .top_exercise_gains
            .iter()
            .map(|g| g.exercise.as_str())
            .collect();
        assert_eq!(names, vec!["squat", "row", "bench"]);
        assert!((snap.top_exercise_gains[0].gain - 10.0).abs() < 1e-9);
    }

    #[test]
    fn top_gains_empty_without_overlap() {
        let previous = vec![session("p", &[("squat", 100.0, 3)])];
        let current = vec![session("c", &[("bench", 70.0, 3)])];
        let snap = build_improvement_snapshot(
            &current,
            &previous,
            &RecordBook::new(),
            &RecordBook::new(),
            4,
        );
        assert!(snap.top_exercise_gains.is_empty());
    }

    #[test]
    fn sanitized_clears_negative_volume() {
        let snap = ImprovementSnapshot {
            volume_this_week: -50.0,
            volume_last_week: f64::NAN,
            consistency_score: 140,
            ..ImprovementSnapshot::default()
        }
        .sanitized();
        assert!(snap.volume_this_week.abs() < f64::EPSILON);
        assert!(snap.volume_last_week.abs() < f64::EPSILON);
        assert_eq!(snap.consistency_score, 100);
    }
}
