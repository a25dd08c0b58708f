//! Corpus aggregation.
//!
//! A [`CorpusSummary`] is a bag of keyed sums, so folding reports is
//! associative and commutative: partial summaries built on different threads
//! can be [`merge`](CorpusSummary::merge)d in any order. Percentages only exist
//! on the [`FinalSummary`] produced by [`finalize`](CorpusSummary::finalize)
//! once every report has been folded in.

use crate::finding::{RepositoryReport, Severity};
use crate::rules;
use std::collections::BTreeMap;

/// Running counts for one rule code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTally {
    /// Repositories where the rule triggered.
    pub count: usize,
    /// Repositories that had the rule's target property.
    pub applicable: usize,
    /// Triggered repositories per target language.
    pub languages: BTreeMap<String, usize>,
}

impl RuleTally {
    fn merge(&mut self, other: RuleTally) {
        self.count += other.count;
        self.applicable += other.applicable;
        for (lang, n) in other.languages {
            *self.languages.entry(lang).or_default() += n;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusSummary {
    pub total_repositories: usize,
    pub repositories_with_target_languages: usize,
    pub total_pitfalls: usize,
    pub total_warnings: usize,
    pub tallies: BTreeMap<String, RuleTally>,
}

impl CorpusSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of a single repository.
    pub fn from_report(report: &RepositoryReport) -> Self {
        let (total_pitfalls, total_warnings) = report.count_by_severity();
        let tallies = report
            .findings
            .iter()
            .map(|f| {
                let languages = if f.triggered {
                    report
                        .language_tags
                        .iter()
                        .map(|l| (l.clone(), 1))
                        .collect()
                } else {
                    BTreeMap::new()
                };
                let tally = RuleTally {
                    count: usize::from(f.triggered),
                    applicable: usize::from(f.applicable),
                    languages,
                };
                (f.code.clone(), tally)
            })
            .collect();

        CorpusSummary {
            total_repositories: 1,
            repositories_with_target_languages: usize::from(!report.language_tags.is_empty()),
            total_pitfalls,
            total_warnings,
            tallies,
        }
    }

    /// Folds one more report in.
    pub fn fold(self, report: &RepositoryReport) -> Self {
        self.merge(Self::from_report(report))
    }

    /// Combines two partial summaries.
    pub fn merge(mut self, other: Self) -> Self {
        self.total_repositories += other.total_repositories;
        self.repositories_with_target_languages += other.repositories_with_target_languages;
        self.total_pitfalls += other.total_pitfalls;
        self.total_warnings += other.total_warnings;
        for (code, tally) in other.tallies {
            self.tallies.entry(code).or_default().merge(tally);
        }
        self
    }

    /// Computes percentages. One row per catalogue rule, in catalogue order.
    pub fn finalize(&self) -> FinalSummary {
        let rows = rules::all_rules()
            .iter()
            .map(|rule| {
                let tally = self.tallies.get(rule.code).cloned().unwrap_or_default();
                SummaryRow {
                    code: rule.code.to_string(),
                    severity: rule.severity,
                    description: rule.description.to_string(),
                    count: tally.count,
                    repositories_with_property: tally.applicable,
                    percentage: percentage(tally.count, tally.applicable),
                    corpus_percentage: percentage(tally.count, self.total_repositories),
                    languages: tally.languages,
                }
            })
            .collect();

        FinalSummary {
            total_repositories: self.total_repositories,
            repositories_with_target_languages: self.repositories_with_target_languages,
            total_pitfalls: self.total_pitfalls,
            total_warnings: self.total_warnings,
            rows,
        }
    }
}

/// `count / denominator * 100`, two decimals, `0.0` on an empty denominator.
pub fn percentage(count: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round2(count as f64 / denominator as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub code: String,
    pub severity: Severity,
    pub description: String,
    pub count: usize,
    pub repositories_with_property: usize,
    pub percentage: f64,
    pub corpus_percentage: f64,
    pub languages: BTreeMap<String, usize>,
}

/// A finalized corpus summary.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalSummary {
    pub total_repositories: usize,
    pub repositories_with_target_languages: usize,
    pub total_pitfalls: usize,
    pub total_warnings: usize,
    pub rows: Vec<SummaryRow>,
}

impl FinalSummary {
    pub fn row(&self, code: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.code == code)
    }
}
