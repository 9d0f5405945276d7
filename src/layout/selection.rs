//! Weighted word selection from the curated word sets.

use std::collections::HashSet;

use rand::{Rng, seq::SliceRandom};

use crate::{dao::models::WordSetEntity, layout::WordClue};

/// Number of words drawn from a set: `round(weighting * size * size / 2)`.
pub fn quota(weighting: u8, size: u32) -> usize {
    (f64::from(weighting) * f64::from(size) * f64::from(size) / 2.0).round() as usize
}

/// Draw words from every set according to its weighting.
///
/// Each set is shuffled and contributes at most [`quota`] words, never more than it holds.
/// Answers are uppercased; an answer already drawn from an earlier set is skipped.
pub fn select_words<R>(sets: &[WordSetEntity], size: u32, rng: &mut R) -> Vec<WordClue>
where
    R: Rng + ?Sized,
{
    let mut seen = HashSet::new();
    let mut selected = Vec::new();

    for set in sets {
        let take = quota(set.weighting, size).min(set.words.len());
        let mut words = set.words.clone();
        words.shuffle(rng);

        for word in words.into_iter().take(take) {
            let answer = word.word.trim().to_uppercase();
            if answer.is_empty() || !seen.insert(answer.clone()) {
                continue;
            }
            selected.push(WordClue {
                answer,
                clue: word.clue,
            });
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::WordEntity;
    use rand::{SeedableRng, rngs::StdRng};
    use uuid::Uuid;

    fn set(name: &str, weighting: u8, words: &[&str]) -> WordSetEntity {
        WordSetEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            weighting,
            words: words
                .iter()
                .map(|word| WordEntity {
                    word: (*word).into(),
                    clue: format!("clue {word}"),
                })
                .collect(),
        }
    }

    #[test]
    fn quota_rounds_half_up() {
        assert_eq!(quota(1, 10), 50);
        assert_eq!(quota(1, 3), 5);
        assert_eq!(quota(2, 15), 225);
    }

    #[test]
    fn selection_is_capped_by_set_length() {
        let sets = vec![set("animals", 1, &["cat", "dog", "owl"])];
        let mut rng = StdRng::seed_from_u64(7);
        let words = select_words(&sets, 10, &mut rng);
        assert_eq!(words.len(), 3);
        assert!(words.iter().all(|word| word.answer.chars().all(|c| c.is_ascii_uppercase())));
    }

    #[test]
    fn selection_respects_small_quotas() {
        // quota(1, 1) rounds 0.5 up to a single word per set.
        let sets = vec![
            set("animals", 1, &["cat", "dog", "owl"]),
            set("colours", 1, &["red", "tan"]),
        ];
        let mut rng = StdRng::seed_from_u64(42);
        let words = select_words(&sets, 1, &mut rng);
        assert_eq!(words.len(), 2);
        assert!(["CAT", "DOG", "OWL"].contains(&words[0].answer.as_str()));
        assert!(["RED", "TAN"].contains(&words[1].answer.as_str()));
    }

    #[test]
    fn duplicate_answers_across_sets_are_drawn_once() {
        let sets = vec![set("a", 5, &["cat"]), set("b", 5, &["CAT", "emu"])];
        let mut rng = StdRng::seed_from_u64(1);
        let mut answers: Vec<_> = select_words(&sets, 10, &mut rng)
            .into_iter()
            .map(|word| word.answer)
            .collect();
        answers.sort();
        assert_eq!(answers, vec!["CAT", "EMU"]);
    }

    #[test]
    fn empty_sets_select_nothing() {
        let sets = vec![set("empty", 100, &[])];
        let mut rng = StdRng::seed_from_u64(3);
        assert!(select_words(&sets, 30, &mut rng).is_empty());
    }
}
