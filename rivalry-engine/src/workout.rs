//! Recorded training data as consumed by the snapshot builder.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::week::WeekKey;

/// One working set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SetLog {
    pub weight: f64,
    pub reps: u32,
}

impl SetLog {
    #[must_use]
    pub const fn new(weight: f64, reps: u32) -> Self {
        Self { weight, reps }
    }

    /// Weight moved by this set. Negative or non-finite weights count as zero.
    #[must_use]
    pub fn volume(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight * f64::from(self.reps)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExerciseLog {
    pub exercise_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sets: Vec<SetLog>,
}

impl ExerciseLog {
    #[must_use]
    pub fn new(exercise_id: impl Into<String>, sets: Vec<SetLog>) -> Self {
        let exercise_id = exercise_id.into();
        Self {
            name: exercise_id.clone(),
            exercise_id,
            sets,
        }
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(SetLog::volume).sum()
    }

    /// Heaviest weight lifted for at least one rep.
    #[must_use]
    pub fn max_weight(&self) -> Option<f64> {
        self.sets
            .iter()
            .filter(|set| set.reps > 0 && set.weight.is_finite())
            .map(|set| set.weight)
            .fold(None, |best, w| Some(best.map_or(w, |b: f64| b.max(w))))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    pub performed_at: DateTime<Utc>,
    #[serde(default = "WorkoutSession::default_completed")]
    pub completed: bool,
    #[serde(default)]
    pub exercises: Vec<ExerciseLog>,
}

impl WorkoutSession {
    const fn default_completed() -> bool {
        true
    }

    #[must_use]
    pub fn new(
        id: impl Into<String>,
        performed_at: DateTime<Utc>,
        exercises: Vec<ExerciseLog>,
    ) -> Self {
        Self {
            id: id.into(),
            performed_at,
            completed: true,
            exercises,
        }
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        self.exercises.iter().map(ExerciseLog::volume).sum()
    }
}

/// Best weight ever recorded per exercise id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RecordBook(BTreeMap<String, f64>);

impl RecordBook {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn best(&self, exercise_id: &str) -> Option<f64> {
        self.0.get(exercise_id).copied()
    }

    /// Record a lift, keeping the heavier of the stored and new weight.
    /// Returns `true` when the lift set a new best.
    pub fn record(&mut self, exercise_id: &str, weight: f64) -> bool {
        if !weight.is_finite() || weight <= 0.0 {
            return false;
        }
        match self.0.get_mut(exercise_id) {
            Some(best) if *best >= weight => false,
            Some(best) => {
                *best = weight;
                true
            }
            None => {
                self.0.insert(exercise_id.to_string(), weight);
                true
            }
        }
    }

    /// Fold every completed session into the book.
    pub fn absorb<'a, I>(&mut self, sessions: I)
    where
        I: IntoIterator<Item = &'a WorkoutSession>,
    {
        for session in sessions.into_iter().filter(|s| s.completed) {
            for exercise in &session.exercises {
                if let Some(max) = exercise.max_weight() {
                    self.record(&exercise.exercise_id, max);
                }
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(id, w)| (id.as_str(), *w))
    }
}

impl FromIterator<(String, f64)> for RecordBook {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        let mut book = Self::new();
        for (id, weight) in iter {
            book.record(&id, weight);
        }
        book
    }
}

/// Two adjacent weeks of training plus the record books as they stood
/// before each of those weeks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkoutHistory {
    #[serde(default)]
    pub current_week: Vec<WorkoutSession>,
    #[serde(default)]
    pub previous_week: Vec<WorkoutSession>,
    /// All-time bests before the current week started.
    #[serde(default)]
    pub current_records: RecordBook,
    /// All-time bests before the previous week started.
    #[serde(default)]
    pub previous_records: RecordBook,
}

impl WorkoutHistory {
    /// Slice a raw training log into the windows around `week`.
    ///
    /// Incomplete sessions and sessions after the end of `week` are ignored.
    #[must_use]
    pub fn from_sessions(sessions: &[WorkoutSession], week: WeekKey) -> Self {
        let previous = week.previous();
        let mut ordered: Vec<&WorkoutSession> =
            sessions.iter().filter(|s| s.completed).collect();
        ordered.sort_by_key(|s| s.performed_at);

        let mut previous_records = RecordBook::new();
        previous_records.absorb(
            ordered
                .iter()
                .copied()
                .filter(|s| s.performed_at < previous.start()),
        );
        let previous_week: Vec<WorkoutSession> = ordered
            .iter()
            .copied()
            .filter(|s| previous.contains(s.performed_at))
            .cloned()
            .collect();
        let mut current_records = previous_records.clone();
        current_records.absorb(previous_week.iter());
        let current_week = ordered
            .iter()
            .copied()
            .filter(|s| week.contains(s.performed_at))
            .cloned()
            .collect();

        Self {
            current_week,
            previous_week,
            current_records,
            previous_records,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current_week.is_empty() && self.previous_week.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(id: &str, y: i32, m: u32, d: u32, lifts: &[(&str, f64, u32)]) -> WorkoutSession {
        let exercises = lifts
            .iter()
            .map(|(ex, w, r)| ExerciseLog::new(*ex, vec![SetLog::new(*w, *r)]))
            .collect();
        WorkoutSession::new(id, Utc.with_ymd_and_hms(y, m, d, 7, 0, 0).unwrap(), exercises)
    }

    #[test]
    fn set_volume_ignores_bad_weights() {
        assert!((SetLog::new(100.0, 5).volume() - 500.0).abs() < f64::EPSILON);
        assert!(SetLog::new(-20.0, 5).volume().abs() < f64::EPSILON);
        assert!(SetLog::new(f64::NAN, 5).volume().abs() < f64::EPSILON);
    }

    #[test]
    fn max_weight_skips_zero_rep_sets() {
        let ex = ExerciseLog::new(
            "squat",
            vec![SetLog::new(140.0, 0), SetLog::new(120.0, 3), SetLog::new(110.0, 5)],
        );
        assert_eq!(ex.max_weight(), Some(120.0));
        assert_eq!(ExerciseLog::new("squat", vec![]).max_weight(), None);
    }

    #[test]
    fn record_book_only_moves_up() {
        let mut book = RecordBook::new();
        assert!(book.record("bench", 80.0));
        assert!(!book.record("bench", 80.0));
        assert!(!book.record("bench", 75.0));
        assert!(book.record("bench", 82.5));
        assert_eq!(book.best("bench"), Some(82.5));
        assert!(!book.record("bench", -1.0));
    }

    #[test]
    fn history_splits_windows_and_records() {
        let week = WeekKey::new(2026, 42).unwrap(); // Oct 12 - Oct 18
        let sessions = vec![
            session("old", 2026, 9, 30, &[("bench", 90.0, 3)]),
            session("prev", 2026, 10, 7, &[("bench", 95.0, 3)]),
            session("cur", 2026, 10, 14, &[("bench", 100.0, 3)]),
            session("future", 2026, 10, 21, &[("bench", 120.0, 3)]),
        ];
        let history = WorkoutHistory::from_sessions(&sessions, week);
        assert_eq!(history.current_week.len(), 1);
        assert_eq!(history.previous_week.len(), 1);
        assert_eq!(history.previous_records.best("bench"), Some(90.0));
        assert_eq!(history.current_records.best("bench"), Some(95.0));
    }

    #[test]
    fn history_ignores_incomplete_sessions() {
        let week = WeekKey::new(2026, 42).unwrap();
        let mut skipped = session("skipped", 2026, 10, 13, &[("deadlift", 200.0, 1)]);
        skipped.completed = false;
        let history = WorkoutHistory::from_sessions(&[skipped], week);
        assert!(history.is_empty());
    }
}
