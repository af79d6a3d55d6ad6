use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gasto_core::{CategoryId, Expense};

use crate::util::similarity_ratio;

/// Minimum fuzzy confidence (0–100) a rule must reach to categorize an
/// expense.
pub const DEFAULT_FUZZY_THRESHOLD: u8 = 80;

/// A fuzzy candidate scoring at or above this is accepted without scanning
/// the remaining rules. Regex hits (confidence 100) always qualify.
const SHORT_CIRCUIT_CONFIDENCE: u8 = 95;

/// Suggestions use a lower floor than automatic categorization; a human
/// reviews them before any rule is created.
const SUGGESTION_THRESHOLD: u8 = 60;

/// A user-defined merchant matching rule. Lifecycle (create/update/delete)
/// belongs to the rule-management collaborator; the matcher only reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRule {
    pub pattern: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub is_regex: bool,
    /// Higher priority rules are evaluated first; ties keep input order.
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_priority() -> i32 {
    1
}

fn default_active() -> bool {
    true
}

impl MerchantRule {
    pub fn new(pattern: &str, category_id: CategoryId) -> Self {
        MerchantRule {
            pattern: pattern.to_string(),
            category_id,
            is_regex: false,
            priority: default_priority(),
            active: default_active(),
        }
    }

    pub fn regex(pattern: &str, category_id: CategoryId) -> Self {
        MerchantRule {
            is_regex: true,
            ..MerchantRule::new(pattern, category_id)
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// The matcher's sole output: either a category with a normalized confidence,
/// or nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub category_id: Option<CategoryId>,
    pub auto_categorized: bool,
    /// Normalized to [0, 1] when a category was assigned.
    pub confidence: Option<f64>,
}

impl MatchResult {
    pub fn no_match() -> Self {
        MatchResult {
            category_id: None,
            auto_categorized: false,
            confidence: None,
        }
    }
}

/// A candidate rule for human-assisted rule creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSuggestion {
    pub pattern: String,
    pub category_id: CategoryId,
    pub confidence: f64,
    pub is_regex: bool,
}

/// Aggregate result of a batch recategorization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecategorizeOutcome {
    pub total: usize,
    pub categorized: usize,
    pub remaining: usize,
    /// Percentage of the batch that was categorized; 0.0 for an empty batch.
    pub success_rate: f64,
}

/// Internal pairing of a rule with its precompiled regex. `regex` stays
/// `None` for fuzzy rules and for patterns that failed to compile; the latter
/// score 0 rather than aborting the scan.
struct CompiledRule {
    rule: MerchantRule,
    regex: Option<Regex>,
}

/// Scores merchant strings against an ordered rule set.
///
/// Construction filters inactive rules, stable-sorts by descending priority
/// (so among equal priorities the input order decides), and compiles regex
/// patterns once. After that every operation is a pure read.
pub struct CategoryMatcher {
    rules: Vec<CompiledRule>,
    fuzzy_threshold: u8,
}

impl CategoryMatcher {
    pub fn new(rules: Vec<MerchantRule>) -> Self {
        let mut compiled: Vec<CompiledRule> = rules
            .into_iter()
            .filter(|rule| rule.active)
            .map(|rule| {
                let regex = if rule.is_regex {
                    let built = RegexBuilder::new(&rule.pattern)
                        .case_insensitive(true)
                        .build();
                    if built.is_err() {
                        warn!("Invalid regex pattern '{}', rule scores 0", rule.pattern);
                    }
                    built.ok()
                } else {
                    None
                };
                CompiledRule { rule, regex }
            })
            .collect();
        // Stable: equal priorities keep their input order.
        compiled.sort_by(|a, b| b.rule.priority.cmp(&a.rule.priority));
        CategoryMatcher {
            rules: compiled,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    pub fn with_fuzzy_threshold(mut self, threshold: u8) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// Find the best rule for a merchant string.
    ///
    /// Best-match tracking is strictly-greater-than: on a raw confidence tie
    /// the earliest candidate wins, which combined with the priority ordering
    /// prefers higher-priority rules. A candidate at or above the
    /// short-circuit confidence ends the scan immediately; nothing later can
    /// strictly beat it.
    pub fn categorize(&self, merchant: &str) -> MatchResult {
        let mut best: Option<&CompiledRule> = None;
        let mut best_confidence = 0u8;

        for cr in &self.rules {
            let confidence = self.match_confidence(cr, merchant);

            if confidence > best_confidence && confidence >= self.fuzzy_threshold {
                best = Some(cr);
                best_confidence = confidence;

                if confidence >= SHORT_CIRCUIT_CONFIDENCE {
                    break;
                }
            }
        }

        match best {
            Some(cr) => {
                debug!(
                    "Matched '{}' against '{}' at confidence {}",
                    merchant, cr.rule.pattern, best_confidence
                );
                MatchResult {
                    category_id: Some(cr.rule.category_id),
                    auto_categorized: true,
                    confidence: Some(f64::from(best_confidence) / 100.0),
                }
            }
            None => MatchResult::no_match(),
        }
    }

    /// Confidence in [0, 100] for one rule: regex hit = 100, regex miss or
    /// invalid pattern = 0, otherwise the fuzzy similarity of the lowercased
    /// strings.
    fn match_confidence(&self, cr: &CompiledRule, merchant: &str) -> u8 {
        if cr.rule.is_regex {
            match &cr.regex {
                Some(re) if re.is_match(merchant) => 100,
                _ => 0,
            }
        } else {
            similarity_ratio(&merchant.to_lowercase(), &cr.rule.pattern.to_lowercase())
        }
    }

    /// Rank existing rule patterns by fuzzy similarity to a merchant string.
    /// Regex rules are scored by their pattern text like any other; the
    /// `is_regex` flag is carried through so the reviewer can tell them
    /// apart. No short circuit here — every rule is considered.
    pub fn suggest_rules(&self, merchant: &str, limit: usize) -> Vec<RuleSuggestion> {
        let merchant_lower = merchant.to_lowercase();

        let mut suggestions: Vec<RuleSuggestion> = self
            .rules
            .iter()
            .filter_map(|cr| {
                let score = similarity_ratio(&merchant_lower, &cr.rule.pattern.to_lowercase());
                (score > SUGGESTION_THRESHOLD).then(|| RuleSuggestion {
                    pattern: cr.rule.pattern.clone(),
                    category_id: cr.rule.category_id,
                    confidence: f64::from(score) / 100.0,
                    is_regex: cr.rule.is_regex,
                })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        suggestions.truncate(limit);
        suggestions
    }

    /// Run [`Self::categorize`] over every uncategorized expense in the
    /// slice, recording category, auto flag, and confidence on each success.
    /// Expenses that already carry a category are neither counted nor
    /// touched; failures are left untouched for the next pass. The caller
    /// owns committing the mutated records.
    pub fn recategorize_all(&self, expenses: &mut [Expense]) -> RecategorizeOutcome {
        let mut total = 0usize;
        let mut categorized = 0usize;

        for expense in expenses.iter_mut().filter(|e| !e.is_categorized()) {
            total += 1;
            let result = self.categorize(&expense.merchant);
            if let (Some(category_id), Some(confidence)) = (result.category_id, result.confidence)
            {
                expense.set_auto_category(category_id, confidence);
                categorized += 1;
            }
        }

        RecategorizeOutcome {
            total,
            categorized,
            remaining: total - categorized,
            success_rate: if total > 0 {
                categorized as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}
