// 🏆 Leaderboard - contestants ordered by percentage of body weight lost

use crate::contestant::ContestantRecord;
use crate::store::Snapshot;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Text shown when nobody is registered
pub const NO_CONTESTANTS: &str = "No contestants found";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedContestant {
    /// 1-based position
    pub rank: usize,
    pub name: String,
    #[serde(flatten)]
    pub record: ContestantRecord,
}

/// Result of a ranking query; an empty registry is its own case
#[derive(Debug, Clone, PartialEq)]
pub enum Leaderboard {
    NoContestants,
    Ranked(Vec<RankedContestant>),
}

impl Leaderboard {
    /// Stable sort by `percentage_lost`, highest first. Ties keep snapshot order.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        if snapshot.is_empty() {
            return Leaderboard::NoContestants;
        }

        let mut entries: Vec<(&String, &ContestantRecord)> = snapshot.iter().collect();
        entries.sort_by(|(_, a), (_, b)| {
            b.percentage_lost
                .partial_cmp(&a.percentage_lost)
                .unwrap_or(Ordering::Equal)
        });

        Leaderboard::Ranked(
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (name, record))| RankedContestant {
                    rank: i + 1,
                    name: name.clone(),
                    record: record.clone(),
                })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Leaderboard::NoContestants)
    }

    pub fn entries(&self) -> &[RankedContestant] {
        match self {
            Leaderboard::NoContestants => &[],
            Leaderboard::Ranked(entries) => entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn get(&self, index: usize) -> Option<&RankedContestant> {
        self.entries().get(index)
    }
}

impl fmt::Display for Leaderboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = match self {
            Leaderboard::NoContestants => return f.write_str(NO_CONTESTANTS),
            Leaderboard::Ranked(entries) => entries,
        };

        for entry in entries {
            let r = &entry.record;
            writeln!(f, "{}. {}", entry.rank, entry.name)?;
            writeln!(
                f,
                "   Starting: {:.1} lbs | Current: {:.1} lbs",
                r.starting_weight, r.current_weight
            )?;
            writeln!(
                f,
                "   Lost: {:.1} lbs ({:.1}%)",
                r.weight_lost, r.percentage_lost
            )?;
            writeln!(f, "   Age: {}", r.age)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_percentage(pct: f64) -> ContestantRecord {
        let mut record = ContestantRecord::new("1990-01-01".to_string(), 36, 200.0);
        record.set_derived(pct * 2.0, pct);
        record
    }

    fn snapshot(entries: &[(&str, f64)]) -> Snapshot {
        entries
            .iter()
            .map(|(name, pct)| (name.to_string(), with_percentage(*pct)))
            .collect()
    }

    #[test]
    fn test_empty_snapshot_is_no_contestants() {
        let board = Leaderboard::from_snapshot(&Snapshot::new());

        assert!(board.is_empty());
        assert_eq!(board.to_string(), "No contestants found");
    }

    #[test]
    fn test_sorted_descending_with_ranks() {
        let board = Leaderboard::from_snapshot(&snapshot(&[("A", 10.0), ("B", 30.0), ("C", 20.0)]));

        let order: Vec<(usize, &str)> = board
            .entries()
            .iter()
            .map(|e| (e.rank, e.name.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "B"), (2, "C"), (3, "A")]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let board = Leaderboard::from_snapshot(&snapshot(&[
            ("First", 5.0),
            ("Leader", 9.0),
            ("Second", 5.0),
            ("Third", 5.0),
        ]));

        let names: Vec<&str> = board.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Leader", "First", "Second", "Third"]);
    }

    #[test]
    fn test_negative_percentages_rank_last() {
        let board = Leaderboard::from_snapshot(&snapshot(&[("Gainer", -20.0), ("Flat", 0.0)]));

        assert_eq!(board.get(0).unwrap().name, "Flat");
        assert_eq!(board.get(1).unwrap().name, "Gainer");
    }

    #[test]
    fn test_report_layout() {
        let mut record = ContestantRecord::new("1990-01-01".to_string(), 36, 200.0);
        record.current_weight = 180.0;
        record.set_derived(20.0, 10.0);
        let mut snap = Snapshot::new();
        snap.insert("Alice".to_string(), record);

        let text = Leaderboard::from_snapshot(&snap).to_string();
        assert_eq!(
            text,
            "1. Alice\n   Starting: 200.0 lbs | Current: 180.0 lbs\n   Lost: 20.0 lbs (10.0%)\n   Age: 36\n\n"
        );
    }

    #[test]
    fn test_ranked_entry_serializes_flat() {
        let board = Leaderboard::from_snapshot(&snapshot(&[("A", 10.0)]));
        let json = serde_json::to_value(board.get(0).unwrap()).unwrap();

        assert_eq!(json["rank"], 1);
        assert_eq!(json["name"], "A");
        assert_eq!(json["percentage_lost"], 10.0);
    }
}
