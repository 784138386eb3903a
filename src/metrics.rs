//! Summary statistics over a derived table (full or filtered)
//!
//! Missing values are excluded from every aggregate. Statistics that cannot
//! be computed come back as `None`.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::table::{columns, ClassOrdinal, PerformanceClass, Table};

/// Round half-to-even at `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Pearson correlation of paired samples.
///
/// `None` with fewer than two pairs or when either side is constant.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let constant = |pick: fn(&(f64, f64)) -> f64| {
        let first = pick(&pairs[0]);
        pairs.iter().all(|p| pick(p) == first)
    };
    if constant(|p| p.0) || constant(|p| p.1) {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

/// Most frequent value; ties go to the value seen first
pub fn mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    let best = counts.iter().map(|(_, n)| *n).max()?;
    counts
        .into_iter()
        .find(|(_, n)| *n == best)
        .map(|(v, _)| v.to_string())
}

fn present(table: &Table, name: &str) -> Vec<f64> {
    table
        .numbers(name)
        .map(|v| v.into_iter().flatten().collect())
        .unwrap_or_default()
}

// =============================================================================
// KPIs
// =============================================================================

/// Headline numbers for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub students: usize,
    pub mean_engagement: Option<f64>,
    pub median_engagement: Option<f64>,
    pub engagement_class_corr: Option<f64>,
    pub most_common_topic: Option<String>,
    pub most_common_class: Option<String>,
    /// Share of students in the `Above_7` absence bucket
    pub absence_above_7_share: Option<f64>,
}

pub fn kpis(table: &Table) -> Kpis {
    let scores = present(table, columns::ENGAGEMENT_SCORE);
    Kpis {
        students: table.len(),
        mean_engagement: mean(&scores).map(|v| round_to(v, 2)),
        median_engagement: median(&scores).map(|v| round_to(v, 2)),
        engagement_class_corr: engagement_class_corr(table),
        most_common_topic: most_common(table, columns::TOPIC),
        most_common_class: most_common(table, columns::CLASS),
        absence_above_7_share: absence_above_7_share(table),
    }
}

/// Correlation between engagement score and class ordinal, 3 decimals.
/// Rows with a missing score or an unrecognized class are left out.
pub fn engagement_class_corr(table: &Table) -> Option<f64> {
    let scores = table.numbers(columns::ENGAGEMENT_SCORE)?;
    let ordinals = table.class_ordinals()?;
    let pairs: Vec<(f64, f64)> = scores
        .into_iter()
        .zip(ordinals)
        .filter_map(|(score, ordinal)| match (score, ordinal?) {
            (Some(s), ClassOrdinal::Known(class)) => Some((s, f64::from(class.code()))),
            _ => None,
        })
        .collect();
    pearson(&pairs).map(|r| round_to(r, 3))
}

fn most_common(table: &Table, name: &str) -> Option<String> {
    let values = table.texts(name)?;
    mode(values.into_iter().flatten())
}

fn absence_above_7_share(table: &Table) -> Option<f64> {
    let flags: Vec<f64> = table
        .texts(columns::ABSENCE_DAYS)?
        .into_iter()
        .filter_map(|v| match v {
            Some("Above_7") => Some(1.0),
            Some("Under_7") => Some(0.0),
            _ => None,
        })
        .collect();
    mean(&flags).map(|v| round_to(v, 2))
}

// =============================================================================
// Group-bys
// =============================================================================

/// Mean engagement and behavioral counts for one performance class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub class: PerformanceClass,
    pub students: usize,
    pub engagement_score: Option<f64>,
    pub raised_hands: Option<f64>,
    pub visited_resources: Option<f64>,
    pub announcements_view: Option<f64>,
    pub discussion: Option<f64>,
}

/// Class of every row, from `class_ordinal` if present, else the `Class` labels
pub fn row_classes(table: &Table) -> Option<Vec<Option<PerformanceClass>>> {
    if let Some(ordinals) = table.class_ordinals() {
        return Some(
            ordinals
                .into_iter()
                .map(|o| o.and_then(ClassOrdinal::class))
                .collect(),
        );
    }
    let labels = table.texts(columns::CLASS)?;
    Some(
        labels
            .into_iter()
            .map(|l| l.and_then(PerformanceClass::parse))
            .collect(),
    )
}

/// Per-class means, 2 decimals, in Low/Medium/High order.
/// Classes with no rows in the table are omitted.
pub fn by_class(table: &Table) -> Vec<ClassSummary> {
    let Some(classes) = row_classes(table) else {
        return Vec::new();
    };
    let column_mean = |name: &str, class: PerformanceClass| -> Option<f64> {
        let values: Vec<f64> = table
            .numbers(name)?
            .into_iter()
            .zip(&classes)
            .filter(|(_, c)| **c == Some(class))
            .filter_map(|(v, _)| v)
            .collect();
        mean(&values).map(|v| round_to(v, 2))
    };

    PerformanceClass::ALL
        .into_iter()
        .filter_map(|class| {
            let students = classes.iter().filter(|c| **c == Some(class)).count();
            if students == 0 {
                return None;
            }
            Some(ClassSummary {
                class,
                students,
                engagement_score: column_mean(columns::ENGAGEMENT_SCORE, class),
                raised_hands: column_mean(columns::RAISED_HANDS, class),
                visited_resources: column_mean(columns::VISITED_RESOURCES, class),
                announcements_view: column_mean(columns::ANNOUNCEMENTS_VIEW, class),
                discussion: column_mean(columns::DISCUSSION, class),
            })
        })
        .collect()
}

/// Mean engagement for one topic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicSummary {
    pub topic: String,
    pub students: usize,
    pub mean_engagement: Option<f64>,
}

/// Per-topic mean engagement, highest first, optionally the top `top_n`.
/// Topics without any score sort last; ties break on topic name.
pub fn by_topic(table: &Table, top_n: Option<usize>) -> Vec<TopicSummary> {
    let Some(topics) = table.texts(columns::TOPIC) else {
        return Vec::new();
    };
    let scores = table
        .numbers(columns::ENGAGEMENT_SCORE)
        .unwrap_or_else(|| vec![None; table.len()]);

    let mut groups: BTreeMap<&str, (usize, Vec<f64>)> = BTreeMap::new();
    for (topic, score) in topics.into_iter().zip(scores) {
        let Some(topic) = topic else { continue };
        let entry = groups.entry(topic).or_default();
        entry.0 += 1;
        entry.1.extend(score);
    }

    let mut summaries: Vec<TopicSummary> = groups
        .into_iter()
        .map(|(topic, (students, values))| TopicSummary {
            topic: topic.to_string(),
            students,
            mean_engagement: mean(&values).map(|v| round_to(v, 2)),
        })
        .collect();
    // BTreeMap order is by name, and the sort is stable
    summaries.sort_by(|a, b| match (a.mean_engagement, b.mean_engagement) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    if let Some(n) = top_n {
        summaries.truncate(n);
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::clean_and_engineer;
    use crate::table::Cell;

    fn derived(rows: &[(&str, &str, u32)]) -> Table {
        let headers = vec!["Topic".to_string(), "Class".to_string(), "raisedhands".to_string()];
        let rows = rows
            .iter()
            .map(|(t, c, h)| vec![Cell::text(*t), Cell::text(*c), Cell::text(h.to_string())])
            .collect();
        clean_and_engineer(Table::from_rows(headers, rows))
    }

    #[test]
    fn test_round_to_half_even() {
        // Exact binary ties go to the even neighbour
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.625, 2), 0.62);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round_to(33.3333, 2), 33.33);
    }

    #[test]
    fn test_mean_and_median() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_pearson() {
        let perfect = [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        assert_eq!(pearson(&perfect), Some(1.0));
        let inverse = [(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)];
        assert_eq!(pearson(&inverse), Some(-1.0));
        assert_eq!(pearson(&[(1.0, 1.0)]), None);
        assert_eq!(pearson(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)]), None);
    }

    #[test]
    fn test_mode_prefers_first_seen_on_tie() {
        assert_eq!(mode(["b", "a", "a", "b"]), Some("b".to_string()));
        assert_eq!(mode(["x", "y", "y"]), Some("y".to_string()));
        assert_eq!(mode(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_kpis() {
        let table = derived(&[("Math", "L", 0), ("Math", "M", 50), ("IT", "H", 100)]);
        let k = kpis(&table);
        assert_eq!(k.students, 3);
        assert_eq!(k.mean_engagement, Some(50.0));
        assert_eq!(k.median_engagement, Some(50.0));
        assert_eq!(k.engagement_class_corr, Some(1.0));
        assert_eq!(k.most_common_topic.as_deref(), Some("Math"));
        // Every class appears once, so the first one seen wins
        assert_eq!(k.most_common_class.as_deref(), Some("L"));
        assert_eq!(k.absence_above_7_share, None);
    }

    #[test]
    fn test_most_common_class_uses_canonical_labels() {
        let table = derived(&[("Math", "L", 3), ("IT", "high", 9), ("IT", "H", 7), ("Math", "M", 4)]);
        assert_eq!(kpis(&table).most_common_class.as_deref(), Some("H"));
    }

    #[test]
    fn test_corr_undefined_with_single_class() {
        let table = derived(&[("Math", "M", 1), ("IT", "M", 9), ("IT", "M", 4)]);
        assert_eq!(kpis(&table).engagement_class_corr, None);
    }

    #[test]
    fn test_corr_ignores_unrecognized_class() {
        // Only one usable pair once the unrecognized row is dropped
        let table = derived(&[("Math", "L", 0), ("Math", "?", 70)]);
        assert_eq!(engagement_class_corr(&table), None);
        let table = derived(&[("Math", "L", 0), ("Math", "?", 70), ("IT", "H", 100), ("IT", "M", 40)]);
        assert!(engagement_class_corr(&table).is_some());
    }

    #[test]
    fn test_absence_share() {
        let headers = vec!["StudentAbsenceDays".to_string()];
        let rows = ["Under-7", "Above-7", "Above-7", "Under-7"]
            .iter()
            .map(|v| vec![Cell::text(*v)])
            .collect();
        let table = clean_and_engineer(Table::from_rows(headers, rows));
        assert_eq!(kpis(&table).absence_above_7_share, Some(0.5));
    }

    #[test]
    fn test_by_class_keeps_order_and_skips_absent() {
        let table = derived(&[("Math", "H", 100), ("Math", "L", 0), ("IT", "L", 20)]);
        let groups = by_class(&table);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].class, PerformanceClass::Low);
        assert_eq!(groups[0].students, 2);
        assert_eq!(groups[0].engagement_score, Some(10.0));
        assert_eq!(groups[0].raised_hands, Some(10.0));
        assert_eq!(groups[0].discussion, None);
        assert_eq!(groups[1].class, PerformanceClass::High);
    }

    #[test]
    fn test_by_topic_descending_and_truncated() {
        let table = derived(&[
            ("Math", "L", 0),
            ("IT", "M", 100),
            ("Arabic", "H", 50),
            ("IT", "M", 50),
        ]);
        let all = by_topic(&table, None);
        let names: Vec<&str> = all.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(names, vec!["IT", "Arabic", "Math"]);
        assert_eq!(all[0].mean_engagement, Some(75.0));
        assert_eq!(all[0].students, 2);

        let top = by_topic(&table, Some(1));
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].topic, "IT");
    }

    #[test]
    fn test_missing_columns_give_empty_groups() {
        let table = Table::from_rows(vec!["gender".to_string()], vec![vec![Cell::text("M")]]);
        assert!(by_class(&table).is_empty());
        assert!(by_topic(&table, Some(5)).is_empty());
        let k = kpis(&table);
        assert_eq!(k.students, 1);
        assert_eq!(k.mean_engagement, None);
        assert_eq!(k.engagement_class_corr, None);
    }
}
