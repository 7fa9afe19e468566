//! Ranked, domain-capped, multi-tier selection.
//!
//! Phases run in order and each only runs while the pick list is short of the target:
//! 1. rank scored candidates (stable, best first)
//! 2. capped pass: at most `domain_cap` picks per display domain
//! 3. top-up pass: same ranking, cap ignored
//! 4. title-only tier: every raw feed item re-scored on its title and hint, no network

use std::collections::{HashMap, HashSet};

use crate::models::{display_domain, FeedItem, PickedItem, ScoredCandidate, SelectionTier};
use crate::observe::RunObserver;
use crate::scoring::{is_admissible, score_weirdness};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionLimits {
    pub target_count: usize,
    pub domain_cap: usize,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            target_count: common::DEFAULT_TARGET_COUNT,
            domain_cap: common::DEFAULT_DOMAIN_CAP,
        }
    }
}

/// Sort best-first. Ties keep collection order (`sort_by` is stable).
pub fn rank(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates
}

/// Score every raw item on its title and summary hint (title when the hint is empty).
/// Items below the admission threshold are dropped.
pub fn title_only_candidates(items: &[FeedItem]) -> Vec<ScoredCandidate> {
    items
        .iter()
        .filter_map(|item| {
            let body = if item.summary_hint.is_empty() {
                item.title.clone()
            } else {
                item.summary_hint.clone()
            };
            let score = score_weirdness(&item.title, &body);
            is_admissible(score).then(|| ScoredCandidate {
                score,
                item: item.clone(),
                body,
            })
        })
        .collect()
}

/// Accumulates picks for one selector run.
struct Picks {
    target: usize,
    picked: Vec<PickedItem>,
    links: HashSet<String>,
    per_domain: HashMap<String, usize>,
}

impl Picks {
    fn new(target: usize) -> Self {
        Self {
            target,
            picked: Vec::with_capacity(target),
            links: HashSet::new(),
            per_domain: HashMap::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.picked.len() >= self.target
    }

    fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    fn domain_count(&self, domain: &str) -> usize {
        self.per_domain.get(domain).copied().unwrap_or(0)
    }

    fn admit(&mut self, candidate: &ScoredCandidate, tier: SelectionTier) {
        self.links.insert(candidate.item.link.clone());
        *self
            .per_domain
            .entry(display_domain(&candidate.item.link))
            .or_insert(0) += 1;
        self.picked.push(PickedItem {
            item: candidate.item.clone(),
            body: candidate.body.clone(),
            tier,
        });
    }
}

pub struct Selector<'a> {
    limits: SelectionLimits,
    observer: &'a dyn RunObserver,
}

impl<'a> Selector<'a> {
    pub fn new(limits: SelectionLimits, observer: &'a dyn RunObserver) -> Self {
        Self { limits, observer }
    }

    /// Pick up to `target_count` items. `candidates` must already be filtered to admissible
    /// scores; `raw_items` feeds the title-only tier.
    pub fn select(&self, candidates: Vec<ScoredCandidate>, raw_items: &[FeedItem]) -> Vec<PickedItem> {
        let mut picks = Picks::new(self.limits.target_count);
        let ranked = rank(candidates);

        for candidate in &ranked {
            if picks.is_full() {
                break;
            }
            if picks.contains(&candidate.item.link) {
                continue;
            }
            let domain = display_domain(&candidate.item.link);
            if picks.domain_count(&domain) >= self.limits.domain_cap {
                continue;
            }
            picks.admit(candidate, SelectionTier::Capped);
        }
        self.phase_complete(SelectionTier::Capped, &picks);

        if !picks.is_full() {
            for candidate in &ranked {
                if picks.is_full() {
                    break;
                }
                if !picks.contains(&candidate.item.link) {
                    picks.admit(candidate, SelectionTier::TopUp);
                }
            }
            self.phase_complete(SelectionTier::TopUp, &picks);
        }

        if !picks.is_full() {
            let fallback = rank(title_only_candidates(raw_items));
            for candidate in &fallback {
                if picks.is_full() {
                    break;
                }
                if !picks.contains(&candidate.item.link) {
                    picks.admit(candidate, SelectionTier::TitleOnly);
                }
            }
            self.phase_complete(SelectionTier::TitleOnly, &picks);
        }

        if !picks.is_full() {
            self.observer.event(
                "selection_shortfall",
                &[
                    ("picked", picks.picked.len().to_string()),
                    ("target", self.limits.target_count.to_string()),
                ],
            );
        }

        picks.picked
    }

    fn phase_complete(&self, tier: SelectionTier, picks: &Picks) {
        self.observer.event(
            "phase_complete",
            &[
                ("phase", tier.as_str().to_string()),
                ("picked", picks.picked.len().to_string()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::RecordingObserver;

    fn candidate(score: i32, link: &str) -> ScoredCandidate {
        ScoredCandidate {
            score,
            item: FeedItem::new(format!("item {link}"), link, ""),
            body: format!("body of {link}"),
        }
    }

    fn count_domain(picked: &[PickedItem], domain: &str) -> usize {
        picked
            .iter()
            .filter(|p| display_domain(&p.item.link) == domain)
            .count()
    }

    fn links(picked: &[PickedItem]) -> Vec<&str> {
        picked.iter().map(|p| p.item.link.as_str()).collect()
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let ranked = rank(vec![
            candidate(2, "https://a.test/1"),
            candidate(5, "https://a.test/2"),
            candidate(2, "https://a.test/3"),
            candidate(5, "https://a.test/4"),
        ]);
        let order: Vec<_> = ranked.iter().map(|c| c.item.link.as_str()).collect();
        assert_eq!(
            order,
            vec!["https://a.test/2", "https://a.test/4", "https://a.test/1", "https://a.test/3"]
        );
    }

    #[test]
    fn test_three_domains_respect_cap() {
        let observer = RecordingObserver::default();
        let mut candidates = Vec::new();
        for n in 0..4 {
            for domain in ["one.test", "two.test", "three.test"] {
                candidates.push(candidate(3 + n, &format!("https://{domain}/{n}")));
            }
        }

        let picked = Selector::new(SelectionLimits::default(), &observer).select(candidates, &[]);

        assert_eq!(picked.len(), 5);
        for domain in ["one.test", "two.test", "three.test"] {
            assert!(count_domain(&picked, domain) <= 2, "{domain} over cap");
        }
        assert!(picked.iter().all(|p| p.tier == SelectionTier::Capped));
        assert!(!observer.has_event("selection_shortfall"));
    }

    #[test]
    fn test_single_domain_tops_up_past_cap() {
        let observer = RecordingObserver::default();
        let candidates: Vec<_> = (0..10)
            .map(|n| candidate(10 - n, &format!("https://www.solo.test/{n}")))
            .collect();

        let picked = Selector::new(SelectionLimits::default(), &observer).select(candidates, &[]);

        assert_eq!(picked.len(), 5);
        let tiers: Vec<_> = picked.iter().map(|p| p.tier).collect();
        assert_eq!(
            tiers,
            vec![
                SelectionTier::Capped,
                SelectionTier::Capped,
                SelectionTier::TopUp,
                SelectionTier::TopUp,
                SelectionTier::TopUp,
            ]
        );
        assert_eq!(
            links(&picked),
            vec![
                "https://www.solo.test/0",
                "https://www.solo.test/1",
                "https://www.solo.test/2",
                "https://www.solo.test/3",
                "https://www.solo.test/4",
            ]
        );
    }

    #[test]
    fn test_top_up_prefers_rank_over_domain_spread() {
        let observer = RecordingObserver::default();
        let candidates = vec![
            candidate(9, "https://big.test/1"),
            candidate(8, "https://big.test/2"),
            candidate(7, "https://big.test/3"),
            candidate(1, "https://small.test/1"),
        ];
        let limits = SelectionLimits { target_count: 4, domain_cap: 2 };

        let picked = Selector::new(limits, &observer).select(candidates, &[]);

        // capped pass takes big/1, big/2, small/1; top-up then adds big/3
        assert_eq!(
            links(&picked),
            vec![
                "https://big.test/1",
                "https://big.test/2",
                "https://small.test/1",
                "https://big.test/3",
            ]
        );
    }

    #[test]
    fn test_title_only_tier_fills_remaining_slots() {
        let observer = RecordingObserver::default();
        let candidates = vec![candidate(4, "https://a.test/full")];
        let raw = vec![
            FeedItem::new("Quarterly earnings update", "https://b.test/dull", ""),
            FeedItem::new("Haunted vending machine", "https://b.test/odd", ""),
            FeedItem::new("Duplicate of picked", "https://a.test/full", "a goat and a llama"),
            FeedItem::new("Plain title", "https://c.test/hint", "a llama escaped from the zoo"),
        ];
        let limits = SelectionLimits { target_count: 5, domain_cap: 2 };

        let picked = Selector::new(limits, &observer).select(candidates, &raw);

        assert_eq!(
            links(&picked),
            vec!["https://a.test/full", "https://c.test/hint", "https://b.test/odd"]
        );
        assert_eq!(picked[1].tier, SelectionTier::TitleOnly);
        assert_eq!(picked[1].body, "a llama escaped from the zoo");
        assert_eq!(picked[2].body, "Haunted vending machine");
        for p in &picked {
            assert!(score_weirdness(&p.item.title, &p.body) >= 1);
        }
        assert!(observer.has_event("selection_shortfall"));
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let observer = RecordingObserver::default();
        let picked = Selector::new(SelectionLimits::default(), &observer).select(Vec::new(), &[]);
        assert!(picked.is_empty());
        assert!(observer.has_event("selection_shortfall"));
    }

    #[test]
    fn test_duplicate_links_never_picked_twice() {
        let observer = RecordingObserver::default();
        let candidates = vec![
            candidate(5, "https://a.test/same"),
            candidate(4, "https://a.test/same"),
            candidate(3, "https://b.test/other"),
        ];

        let picked = Selector::new(SelectionLimits::default(), &observer).select(candidates, &[]);

        let unique: HashSet<_> = picked.iter().map(|p| p.item.link.clone()).collect();
        assert_eq!(unique.len(), picked.len());
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let observer = RecordingObserver::default();
        let build = || -> Vec<ScoredCandidate> {
            (0..12)
                .map(|n| candidate((n % 3) as i32 + 1, &format!("https://d{}.test/{n}", n % 4)))
                .collect()
        };
        let selector = Selector::new(SelectionLimits::default(), &observer);

        let first = selector.select(build(), &[]);
        let second = selector.select(build(), &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_phase_events_only_for_phases_that_ran() {
        let observer = RecordingObserver::default();
        let candidates: Vec<_> = (0..5)
            .map(|n| candidate(2, &format!("https://d{n}.test/x")))
            .collect();

        Selector::new(SelectionLimits::default(), &observer).select(candidates, &[]);

        let phases: Vec<String> = observer
            .events_named("phase_complete")
            .into_iter()
            .filter_map(|fields| fields.get("phase").cloned())
            .collect();
        assert_eq!(phases, vec!["capped".to_string()]);
    }
}
