//! Ordered rule cascade over a cluster's temporal statistics
//!
//! Rules are tried top to bottom and the first one whose predicate holds
//! decides the label. Conditions overlap (a December-heavy cluster active in
//! only two months satisfies both the December rule and the one-time rule), so
//! the order of [`RULES`] determines the outcome.

use super::profile::ClusterTemporalStats;
use crate::config::analysis::ClassificationThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Temporal category of a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalLabel {
    /// Steady presence across the year: a landmark
    Permanent,
    /// Seasonal concentration that repeats: a festival or tourist season
    Recurring,
    /// A single dominant month with little else: an ephemeral happening
    OneTime,
}

impl TemporalLabel {
    pub const ALL: [TemporalLabel; 3] = [
        TemporalLabel::Permanent,
        TemporalLabel::Recurring,
        TemporalLabel::OneTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalLabel::Permanent => "permanent",
            TemporalLabel::Recurring => "recurring",
            TemporalLabel::OneTime => "one_time",
        }
    }
}

impl fmt::Display for TemporalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Predicate = fn(&ClusterTemporalStats, &ClassificationThresholds) -> bool;

/// One step of the cascade
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub label: TemporalLabel,
    /// Human-readable condition using the default thresholds
    pub condition: &'static str,
    predicate: Predicate,
}

impl Rule {
    pub fn applies(&self, stats: &ClusterTemporalStats, t: &ClassificationThresholds) -> bool {
        (self.predicate)(stats, t)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish()
    }
}

fn december(s: &ClusterTemporalStats, t: &ClassificationThresholds) -> bool {
    s.december_ratio > t.december_ratio
}

fn summer(s: &ClusterTemporalStats, t: &ClassificationThresholds) -> bool {
    s.summer_ratio > t.summer_ratio
}

fn single_spike(s: &ClusterTemporalStats, t: &ClassificationThresholds) -> bool {
    s.peak_ratio > t.one_time_peak_ratio
        && s.months_with_activity <= t.one_time_max_active_months as usize
}

fn variable_with_peak(s: &ClusterTemporalStats, t: &ClassificationThresholds) -> bool {
    s.month_cv > t.variable_cv && s.peak_ratio > t.variable_peak_ratio
}

fn steady(s: &ClusterTemporalStats, t: &ClassificationThresholds) -> bool {
    s.month_cv < t.steady_cv && s.months_with_activity >= t.steady_min_active_months as usize
}

fn multi_year(s: &ClusterTemporalStats, t: &ClassificationThresholds) -> bool {
    s.n_years >= t.multi_year_min_years as usize && s.month_cv < t.multi_year_max_cv
}

fn residual_peak(s: &ClusterTemporalStats, t: &ClassificationThresholds) -> bool {
    s.peak_ratio > t.residual_peak_ratio
}

/// The cascade, in evaluation order
pub const RULES: [Rule; 7] = [
    Rule {
        name: "december",
        label: TemporalLabel::Recurring,
        condition: "december_ratio > 0.25",
        predicate: december,
    },
    Rule {
        name: "summer",
        label: TemporalLabel::Recurring,
        condition: "summer_ratio > 0.35",
        predicate: summer,
    },
    Rule {
        name: "single_spike",
        label: TemporalLabel::OneTime,
        condition: "peak_ratio > 0.5 and months_with_activity <= 3",
        predicate: single_spike,
    },
    Rule {
        name: "variable_with_peak",
        label: TemporalLabel::Recurring,
        condition: "month_cv > 1.0 and peak_ratio > 0.35",
        predicate: variable_with_peak,
    },
    Rule {
        name: "steady",
        label: TemporalLabel::Permanent,
        condition: "month_cv < 0.8 and months_with_activity >= 6",
        predicate: steady,
    },
    Rule {
        name: "multi_year",
        label: TemporalLabel::Permanent,
        condition: "n_years >= 5 and month_cv < 1.2",
        predicate: multi_year,
    },
    Rule {
        name: "residual_peak",
        label: TemporalLabel::Recurring,
        condition: "peak_ratio > 0.3",
        predicate: residual_peak,
    },
];

/// Name reported when no rule fires
pub const DEFAULT_RULE: &str = "default";
/// Label assigned when no rule fires
pub const DEFAULT_LABEL: TemporalLabel = TemporalLabel::Permanent;

/// Label and the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub label: TemporalLabel,
    pub rule: &'static str,
}

/// Classify one cluster; a pure function of its statistics
pub fn classify(stats: &ClusterTemporalStats, thresholds: &ClassificationThresholds) -> Verdict {
    RULES
        .iter()
        .find(|rule| rule.applies(stats, thresholds))
        .map(|rule| Verdict {
            label: rule.label,
            rule: rule.name,
        })
        .unwrap_or(Verdict {
            label: DEFAULT_LABEL,
            rule: DEFAULT_RULE,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> ClusterTemporalStats {
        ClusterTemporalStats {
            total_photos: 100,
            n_years: 2,
            month_cv: 0.9,
            months_with_activity: 5,
            peak_ratio: 0.2,
            ..ClusterTemporalStats::default()
        }
    }

    fn label_of(s: &ClusterTemporalStats) -> TemporalLabel {
        classify(s, &ClassificationThresholds::default()).label
    }

    #[test]
    fn test_december_rule_precedes_one_time_rule() {
        let s = ClusterTemporalStats {
            december_ratio: 0.3,
            months_with_activity: 2,
            peak_ratio: 0.6,
            ..stats()
        };
        assert!(single_spike(&s, &ClassificationThresholds::default()));
        let verdict = classify(&s, &ClassificationThresholds::default());
        assert_eq!(verdict.label, TemporalLabel::Recurring);
        assert_eq!(verdict.rule, "december");
    }

    #[test]
    fn test_each_rule_fires() {
        let cases = [
            (
                ClusterTemporalStats {
                    december_ratio: 0.26,
                    ..stats()
                },
                "december",
            ),
            (
                ClusterTemporalStats {
                    summer_ratio: 0.36,
                    ..stats()
                },
                "summer",
            ),
            (
                ClusterTemporalStats {
                    peak_ratio: 1.0,
                    months_with_activity: 1,
                    ..stats()
                },
                "single_spike",
            ),
            (
                ClusterTemporalStats {
                    month_cv: 1.5,
                    peak_ratio: 0.4,
                    months_with_activity: 6,
                    ..stats()
                },
                "variable_with_peak",
            ),
            (
                ClusterTemporalStats {
                    month_cv: 0.5,
                    months_with_activity: 12,
                    ..stats()
                },
                "steady",
            ),
            (
                ClusterTemporalStats {
                    n_years: 6,
                    month_cv: 1.1,
                    ..stats()
                },
                "multi_year",
            ),
            (
                ClusterTemporalStats {
                    peak_ratio: 0.31,
                    ..stats()
                },
                "residual_peak",
            ),
            (stats(), DEFAULT_RULE),
        ];
        for (s, expected) in cases {
            assert_eq!(
                classify(&s, &ClassificationThresholds::default()).rule,
                expected,
                "{:?}",
                s
            );
        }
    }

    #[test]
    fn test_thresholds_are_strict() {
        // exactly at the December threshold does not fire
        let s = ClusterTemporalStats { december_ratio: 0.25, ..stats() };
        assert_ne!(classify(&s, &ClassificationThresholds::default()).rule, "december");
    }

    #[test]
    fn test_one_time_single_month() {
        let s = ClusterTemporalStats {
            total_photos: 50,
            n_years: 1,
            peak_ratio: 1.0,
            months_with_activity: 1,
            month_cv: 11f64.sqrt(),
            ..ClusterTemporalStats::default()
        };
        assert_eq!(label_of(&s), TemporalLabel::OneTime);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let s = ClusterTemporalStats { summer_ratio: 0.2, peak_ratio: 0.32, ..stats() };
        let first = label_of(&s);
        for _ in 0..10 {
            assert_eq!(label_of(&s), first);
        }
    }

    #[test]
    fn test_overridden_thresholds() {
        let s = ClusterTemporalStats { december_ratio: 0.3, ..stats() };
        let strict = ClassificationThresholds {
            december_ratio: 0.5,
            ..ClassificationThresholds::default()
        };
        assert_eq!(classify(&s, &ClassificationThresholds::default()).rule, "december");
        assert_eq!(classify(&s, &strict).rule, DEFAULT_RULE);
    }

    #[test]
    fn test_labels_serialize_snake_case() {
        assert_eq!(serde_json::to_value(TemporalLabel::OneTime).unwrap(), "one_time");
        assert_eq!(TemporalLabel::Permanent.to_string(), "permanent");
    }
}
