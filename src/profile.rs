//! Derived data for the student profile view.
//!
//! Everything here is a pure function of a [`Student`] that has been
//! enriched with contests and problem statistics.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::model::{Contest, Period, PeriodStats, ProblemStats, Student};

/// Default window for the contest chart, in days.
pub const DEFAULT_CONTEST_WINDOW_DAYS: i64 = 365;

/// Windows offered by the contest chart filter, in days.
pub const CONTEST_FILTER_DAYS: [i64; 3] = [30, 90, DEFAULT_CONTEST_WINDOW_DAYS];

/// Windows offered by the problem statistics filter, in days.
pub const PROBLEM_FILTER_DAYS: [u32; 3] = [7, 30, 90];

/// Codeforces rating tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingTier {
    Newbie,
    Pupil,
    Specialist,
    Expert,
    CandidateMaster,
    Master,
    Grandmaster,
}

impl RatingTier {
    pub fn from_rating(rating: i32) -> Self {
        match rating {
            r if r >= 2400 => RatingTier::Grandmaster,
            r if r >= 2100 => RatingTier::Master,
            r if r >= 1900 => RatingTier::CandidateMaster,
            r if r >= 1600 => RatingTier::Expert,
            r if r >= 1400 => RatingTier::Specialist,
            r if r >= 1200 => RatingTier::Pupil,
            _ => RatingTier::Newbie,
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RatingTier::Newbie => "Newbie",
            RatingTier::Pupil => "Pupil",
            RatingTier::Specialist => "Specialist",
            RatingTier::Expert => "Expert",
            RatingTier::CandidateMaster => "Candidate Master",
            RatingTier::Master => "Master",
            RatingTier::Grandmaster => "Grandmaster",
        }
    }
}

/// One bar of the rating distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionBar {
    pub range: &'static str,
    pub count: u32,
}

/// Rating-distribution bars with zero counts left out.
pub fn distribution_bars(stats: &ProblemStats) -> Vec<DistributionBar> {
    stats
        .rating_distribution
        .buckets()
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(range, count)| DistributionBar { range, count })
        .collect()
}

/// Contests on or after `today - days`. A window reaching past the
/// earliest representable date keeps every contest.
pub fn contests_within(contests: &[Contest], days: i64, today: NaiveDate) -> Vec<&Contest> {
    let start = Duration::try_days(days)
        .and_then(|window| today.checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN);
    contests.iter().filter(|c| c.date >= start).collect()
}

/// A point on the contest rating chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub rating: i32,
    pub name: String,
}

/// Chart points in date order.
pub fn rating_series<'a>(contests: impl IntoIterator<Item = &'a Contest>) -> Vec<ChartPoint> {
    let mut points: Vec<_> = contests
        .into_iter()
        .map(|c| ChartPoint {
            date: c.date,
            rating: c.rating,
            name: c.name.clone(),
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

/// One heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub count: u32,
}

/// Daily submission counts over all time.
pub fn heatmap(stats: &PeriodStats) -> Vec<HeatmapCell> {
    stats
        .get(Period::AllTime)
        .map(|s| {
            s.daily_submissions
                .iter()
                .map(|d| HeatmapCell {
                    date: d.date,
                    count: d.count,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Everything the profile view renders for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub student: Student,
    pub tier: RatingTier,
    pub max_tier: RatingTier,
    pub period: Period,
    pub stats: Option<ProblemStats>,
    pub distribution: Vec<DistributionBar>,
    pub rating_chart: Vec<ChartPoint>,
    pub heatmap: Vec<HeatmapCell>,
}

impl ProfileView {
    /// Build the view for `period`, charting contests from the last
    /// `contest_days` days.
    pub fn build(student: Student, period: Period, contest_days: i64, today: NaiveDate) -> Self {
        let stats = student
            .problem_stats
            .as_ref()
            .and_then(|s| s.get(period))
            .cloned();
        let distribution = stats.as_ref().map(distribution_bars).unwrap_or_default();
        let rating_chart = rating_series(contests_within(&student.contests, contest_days, today));
        let cells = student.problem_stats.as_ref().map(heatmap).unwrap_or_default();

        Self {
            tier: RatingTier::from_rating(student.current_rating),
            max_tier: RatingTier::from_rating(student.max_rating),
            period,
            stats,
            distribution,
            rating_chart,
            heatmap: cells,
            student,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DailySubmission, RatingDistribution};
    use std::collections::BTreeMap;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contest(name: &str, date: NaiveDate, rating: i32) -> Contest {
        Contest {
            name: name.to_string(),
            date,
            rating,
            rank: 100,
            unsolved: 1,
        }
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(RatingTier::from_rating(800), RatingTier::Newbie);
        assert_eq!(RatingTier::from_rating(1199), RatingTier::Newbie);
        assert_eq!(RatingTier::from_rating(1200), RatingTier::Pupil);
        assert_eq!(RatingTier::from_rating(1400), RatingTier::Specialist);
        assert_eq!(RatingTier::from_rating(1600), RatingTier::Expert);
        assert_eq!(RatingTier::from_rating(1900), RatingTier::CandidateMaster);
        assert_eq!(RatingTier::from_rating(2100), RatingTier::Master);
        assert_eq!(RatingTier::from_rating(3500), RatingTier::Grandmaster);
    }

    #[test]
    fn test_distribution_skips_empty_buckets() {
        let stats = ProblemStats {
            rating_distribution: RatingDistribution {
                rating800: 4,
                rating1500: 2,
                rating_unknown: 1,
                ..Default::default()
            },
            ..Default::default()
        };

        let bars = distribution_bars(&stats);

        let ranges: Vec<_> = bars.iter().map(|b| b.range).collect();
        assert_eq!(ranges, ["800", "1500", "Unknown"]);
    }

    #[test]
    fn test_contests_within_window_sorted() {
        let today = day(2024, 6, 1);
        let contests = vec![
            contest("late", day(2024, 5, 20), 1500),
            contest("old", day(2023, 1, 1), 1100),
            contest("early", day(2024, 5, 1), 1450),
        ];

        let series = rating_series(contests_within(&contests, 90, today));

        let names: Vec<_> = series.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["early", "late"]);
    }

    #[test]
    fn test_huge_contest_window_keeps_everything() {
        let today = day(2024, 6, 1);
        let contests = vec![contest("old", day(1990, 1, 1), 1100)];

        assert_eq!(contests_within(&contests, i64::MAX, today).len(), 1);
    }

    #[test]
    fn test_heatmap_uses_all_time_bucket() {
        let mut map = BTreeMap::new();
        map.insert(
            Period::AllTime,
            ProblemStats {
                daily_submissions: vec![DailySubmission {
                    date: day(2024, 1, 2),
                    count: 5,
                    accepted: 3,
                }],
                ..Default::default()
            },
        );
        map.insert(Period::Days7, ProblemStats::default());

        let cells = heatmap(&PeriodStats::new(map));

        assert_eq!(
            cells,
            vec![HeatmapCell {
                date: day(2024, 1, 2),
                count: 5
            }]
        );
    }
}
