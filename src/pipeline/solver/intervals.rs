//! Merged statistics of every run of consecutive prebins

use super::super::stats::calculate_woe_iv;

/// Prebins `start..=end` taken together as one candidate final bin
#[derive(Debug, Clone)]
pub(super) struct Interval {
    pub start: usize,
    pub end: usize,
    pub count: f64,
    pub woe: f64,
    pub iv: f64,
}

impl Interval {
    pub fn contains(&self, prebin: usize) -> bool {
        self.start <= prebin && prebin <= self.end
    }
}

/// Upper-triangular table of all `n(n+1)/2` intervals, stored row by row
#[derive(Debug)]
pub(super) struct IntervalTable {
    prebins: usize,
    intervals: Vec<Interval>,
}

impl IntervalTable {
    pub fn build(prebins: &[(f64, f64)], total_events: f64, total_non_events: f64) -> Self {
        let n = prebins.len();
        let prefix: Vec<(f64, f64)> = std::iter::once((0.0, 0.0))
            .chain(prebins.iter().scan((0.0, 0.0), |acc, &(events, non_events)| {
                acc.0 += events;
                acc.1 += non_events;
                Some(*acc)
            }))
            .collect();

        let intervals = (0..n)
            .flat_map(|start| (start..n).map(move |end| (start, end)))
            .map(|(start, end)| {
                let events = prefix[end + 1].0 - prefix[start].0;
                let non_events = prefix[end + 1].1 - prefix[start].1;
                let (woe, iv) = calculate_woe_iv(events, non_events, total_events, total_non_events);
                Interval {
                    start,
                    end,
                    count: events + non_events,
                    woe,
                    iv,
                }
            })
            .collect();

        Self { prebins: n, intervals }
    }

    pub fn prebins(&self) -> usize {
        self.prebins
    }

    pub fn get(&self, start: usize, end: usize) -> &Interval {
        let row_offset = start * self.prebins - start * start.saturating_sub(1) / 2;
        &self.intervals[row_offset + end - start]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREBINS: [(f64, f64); 3] = [(5.0, 15.0), (10.0, 10.0), (15.0, 5.0)];

    #[test]
    fn test_table_holds_every_interval() {
        let table = IntervalTable::build(&PREBINS, 30.0, 30.0);
        assert_eq!(table.iter().count(), 6);

        for start in 0..3 {
            for end in start..3 {
                let interval = table.get(start, end);
                assert_eq!((interval.start, interval.end), (start, end));
            }
        }
    }

    #[test]
    fn test_merged_counts_and_woe() {
        let table = IntervalTable::build(&PREBINS, 30.0, 30.0);

        assert_eq!(table.get(0, 0).count, 20.0);
        assert_eq!(table.get(0, 1).count, 40.0);
        assert!(table.get(1, 2).contains(2));
        assert!(!table.get(1, 2).contains(0));

        let all = table.get(0, 2);
        assert_eq!(all.count, 60.0);
        assert!(all.woe.abs() < 1e-12, "the whole population has zero WoE");
    }

    #[test]
    fn test_interval_iv_is_non_negative() {
        let table = IntervalTable::build(&PREBINS, 30.0, 30.0);
        assert!(table.iter().all(|interval| interval.iv >= 0.0));
    }
}
