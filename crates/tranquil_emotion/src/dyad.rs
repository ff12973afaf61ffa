//! Dyad detection - combining primary emotions into secondary ones
//!
//! Every unordered pair of selected emotions is looked up in the rule table.
//! A hit becomes a [`DetectedDyad`] whose strength is the sum of the two
//! intensities. The result is ranked strongest first; equal strengths keep
//! the order the rule table lists them in, so identical inputs always produce
//! identical output.

use tranquil_core::{DetectedDyad, DyadRule, EmotionId, SelectedEmotion};

/// Detect combination emotions in a check-in.
///
/// Fewer than two selections, or pairs without a rule, simply yield nothing.
pub fn detect(selections: &[SelectedEmotion], rules: &[DyadRule]) -> Vec<DetectedDyad> {
    if selections.len() < 2 {
        return Vec::new();
    }

    // (rule index, strength, components)
    let mut hits: Vec<(usize, u8, &EmotionId, &EmotionId)> = Vec::new();

    for (i, x) in selections.iter().enumerate() {
        for y in &selections[i + 1..] {
            if x.emotion_id == y.emotion_id {
                continue;
            }
            let Some(index) = rules
                .iter()
                .position(|rule| rule.matches(&x.emotion_id, &y.emotion_id))
            else {
                continue;
            };
            let strength = x.intensity.get() + y.intensity.get();

            // A caller that repeats an emotion can hit the same rule twice.
            match hits.iter_mut().find(|(seen, ..)| *seen == index) {
                Some(hit) if hit.1 >= strength => {}
                Some(hit) => *hit = (index, strength, &x.emotion_id, &y.emotion_id),
                None => hits.push((index, strength, &x.emotion_id, &y.emotion_id)),
            }
        }
    }

    hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    hits.into_iter()
        .map(|(index, strength, first, second)| {
            let rule = &rules[index];
            tracing::trace!("Detected dyad {} ({}+{}) strength {}", rule.result, first, second, strength);
            DetectedDyad {
                result: rule.result.clone(),
                label: rule.label.clone(),
                description: rule.description.clone(),
                strength,
                components: (first.clone(), second.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tranquil_core::{Catalog, DyadKind, Intensity};

    fn sel(id: &str, level: u8) -> SelectedEmotion {
        SelectedEmotion::new(id, Intensity::new(level).unwrap())
    }

    fn rule(a: &str, b: &str, result: &str) -> DyadRule {
        DyadRule::new(a, b, result, result, "", DyadKind::Primary)
    }

    #[test]
    fn test_joy_trust_is_love() {
        let rules = vec![rule("joy", "trust", "love")];
        let dyads = detect(&[sel("joy", 4), sel("trust", 3)], &rules);
        assert_eq!(dyads.len(), 1);
        assert_eq!(dyads[0].result, "love");
        assert_eq!(dyads[0].strength, 7);
        assert_eq!(
            dyads[0].components,
            (EmotionId::from("joy"), EmotionId::from("trust"))
        );
    }

    #[test]
    fn test_pair_order_does_not_matter() {
        let rules = vec![rule("joy", "trust", "love")];
        let dyads = detect(&[sel("trust", 3), sel("joy", 4)], &rules);
        assert_eq!(dyads.len(), 1);
        assert_eq!(dyads[0].result, "love");
        assert_eq!(
            dyads[0].components,
            (EmotionId::from("trust"), EmotionId::from("joy"))
        );
    }

    #[test]
    fn test_fewer_than_two_selections() {
        let catalog = Catalog::builtin();
        assert!(detect(&[], catalog.dyads()).is_empty());
        assert!(detect(&[sel("joy", 5)], catalog.dyads()).is_empty());
    }

    #[test]
    fn test_unmatched_pairs_emit_nothing() {
        let catalog = Catalog::builtin();
        // Opposites on the wheel have no dyad
        assert!(detect(&[sel("joy", 5), sel("sadness", 5)], catalog.dyads()).is_empty());
        // Check-in states don't take part in dyads
        assert!(detect(&[sel("tired", 2), sel("anxious", 4)], catalog.dyads()).is_empty());
    }

    #[test]
    fn test_sorted_by_strength_then_table_order() {
        let catalog = Catalog::builtin();
        let selections = [sel("joy", 2), sel("trust", 2), sel("fear", 5)];
        let dyads = detect(&selections, catalog.dyads());
        let results: Vec<_> = dyads.iter().map(|d| d.result.as_str()).collect();
        // trust+fear=7 and joy+fear=7 tie; submission precedes guilt in the table
        assert_eq!(results, vec!["submission", "guilt", "love"]);
        assert_eq!(dyads[0].strength, 7);
        assert_eq!(dyads[2].strength, 4);
    }

    #[test]
    fn test_self_pair_never_evaluated() {
        let rules = vec![rule("joy", "joy", "bliss")];
        assert!(detect(&[sel("joy", 5), sel("joy", 5)], &rules).is_empty());
    }

    #[test]
    fn test_duplicate_rule_first_wins() {
        let rules = vec![rule("joy", "trust", "love"), rule("trust", "joy", "adoration")];
        let dyads = detect(&[sel("joy", 1), sel("trust", 1)], &rules);
        assert_eq!(dyads.len(), 1);
        assert_eq!(dyads[0].result, "love");
    }

    #[test]
    fn test_repeated_emotion_reports_strongest_hit_once() {
        let rules = vec![rule("joy", "trust", "love")];
        let dyads = detect(&[sel("joy", 1), sel("trust", 2), sel("joy", 5)], &rules);
        assert_eq!(dyads.len(), 1);
        assert_eq!(dyads[0].strength, 7);
    }

    #[test]
    fn test_idempotent() {
        let catalog = Catalog::builtin();
        let selections = [
            sel("anger", 3),
            sel("anticipation", 4),
            sel("joy", 4),
            sel("trust", 1),
        ];
        let first = detect(&selections, catalog.dyads());
        let second = detect(&selections, catalog.dyads());
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
