use rand::seq::SliceRandom;
use rand::Rng;

use super::dataset::RawRecord;
use super::QuestionItem;
use crate::study::DatasetColumns;

/// Turns dataset rows into the questionnaire sequence.
pub struct SequenceBuilder<'a> {
    prompt_template: &'a str,
    columns: &'a DatasetColumns,
}

impl<'a> SequenceBuilder<'a> {
    pub fn new(prompt_template: &'a str, columns: &'a DatasetColumns) -> Self {
        Self {
            prompt_template,
            columns,
        }
    }

    /// Maps one row to a question; rows without source text are skipped.
    pub fn item_for(&self, record: &RawRecord) -> Option<QuestionItem> {
        let source = record
            .get(&self.columns.source)
            .filter(|text| !text.trim().is_empty())?;
        let label = record.get(&self.columns.label).unwrap_or_default();

        Some(QuestionItem::new(
            render_prompt(self.prompt_template, source, label),
            record
                .get(&self.columns.conversation)
                .unwrap_or_default()
                .to_string(),
            record.get(&self.columns.note).unwrap_or_default().to_string(),
        ))
    }

    /// Dataset items plus every attention check, in one random order.
    pub fn build<R: Rng + ?Sized>(
        &self,
        records: &[RawRecord],
        attention_checks: &[QuestionItem],
        rng: &mut R,
    ) -> Vec<QuestionItem> {
        let mut items: Vec<QuestionItem> =
            records.iter().filter_map(|r| self.item_for(r)).collect();
        items.extend_from_slice(attention_checks);
        shuffle(&mut items, rng);
        items
    }
}

pub fn render_prompt(template: &str, source: &str, label: &str) -> String {
    template.replace("{source}", source).replace("{label}", label)
}

/// Uniform Fisher-Yates shuffle.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn attention(statement: &str) -> QuestionItem {
        QuestionItem::attention_check(
            "Please determine if the following statement is true or false.".to_string(),
            statement.to_string(),
            String::new(),
            "True".to_string(),
        )
    }

    fn records() -> Vec<RawRecord> {
        vec![
            record(&[("original_data", "great job"), ("conversation", "A: x\nB: great job")]),
            record(&[("original_data", ""), ("conversation", "A: empty")]),
            record(&[("original_data", "   \t"), ("conversation", "A: blank")]),
            record(&[("conversation", "A: no source column")]),
            record(&[
                ("original_data", "sure, whatever"),
                ("conversation", "A: y"),
                ("label_type", "vaccines"),
                ("note", "context matters"),
            ]),
        ]
    }

    #[test]
    fn skips_rows_without_source_text() {
        let columns = DatasetColumns::default();
        let builder = SequenceBuilder::new("\"{source}\"", &columns);
        let mut rng = StdRng::seed_from_u64(1);

        let items = builder.build(&records(), &[], &mut rng);
        let mut prompts: Vec<_> = items.iter().map(|i| i.prompt_text.as_str()).collect();
        prompts.sort_unstable();
        assert_eq!(prompts, ["\"great job\"", "\"sure, whatever\""]);
    }

    #[test]
    fn length_is_kept_rows_plus_attention_checks() {
        let columns = DatasetColumns::default();
        let builder = SequenceBuilder::new("{source}", &columns);
        let checks = vec![attention("1 + 1 = 2"), attention("Please select 'True'.")];
        let mut rng = StdRng::seed_from_u64(2);

        let items = builder.build(&records(), &checks, &mut rng);
        assert_eq!(items.len(), 2 + checks.len());
        for check in &checks {
            assert!(items.contains(check));
        }
        assert_eq!(items.iter().filter(|i| i.is_attention_check).count(), 2);

        let only_checks = builder.build(&[], &checks, &mut rng);
        assert_eq!(only_checks.len(), checks.len());
    }

    #[test]
    fn fills_template_label_and_note() {
        let columns = DatasetColumns::default();
        let builder = SequenceBuilder::new("Stance on \"{label}\" when saying \"{source}\"?", &columns);

        let item = builder.item_for(&records()[4]).unwrap();
        assert_eq!(item.prompt_text, "Stance on \"vaccines\" when saying \"sure, whatever\"?");
        assert_eq!(item.statement_text, "A: y");
        assert_eq!(item.note, "context matters");
        assert!(!item.is_attention_check);
        assert_eq!(item.correct_answer, None);

        let item = builder.item_for(&records()[0]).unwrap();
        assert_eq!(item.prompt_text, "Stance on \"\" when saying \"great job\"?");
        assert_eq!(item.note, "");
    }

    #[test]
    fn custom_columns_are_respected() {
        let columns = DatasetColumns {
            source: "utterance".to_string(),
            conversation: "dialogue".to_string(),
            label: "topic".to_string(),
            note: "comment".to_string(),
        };
        let builder = SequenceBuilder::new("{source}/{label}", &columns);
        let item = builder
            .item_for(&record(&[
                ("utterance", "thanks a lot"),
                ("dialogue", "B: thanks a lot"),
                ("topic", "help"),
            ]))
            .unwrap();
        assert_eq!(item.prompt_text, "thanks a lot/help");
        assert_eq!(item.statement_text, "B: thanks a lot");

        assert!(builder
            .item_for(&record(&[("original_data", "ignored")]))
            .is_none());
    }

    // Chi-square over the element x position table; (n-1)^2 degrees of freedom.
    #[test]
    fn every_element_lands_in_every_position_uniformly() {
        const N: usize = 5;
        const TRIALS: usize = 50_000;
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut counts = [[0u32; N]; N];

        for _ in 0..TRIALS {
            let mut items: Vec<usize> = (0..N).collect();
            shuffle(&mut items, &mut rng);
            for (position, &element) in items.iter().enumerate() {
                counts[element][position] += 1;
            }
        }

        let expected = TRIALS as f64 / N as f64;
        let chi_square: f64 = counts
            .iter()
            .flatten()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();

        // 99.9th percentile of chi-square with 16 degrees of freedom
        assert!(chi_square < 39.25, "chi-square {chi_square:.2}");
    }

    fn permutation_chi_square(shuffler: impl Fn(&mut Vec<usize>, &mut StdRng)) -> f64 {
        const TRIALS: usize = 60_000;
        let permutations: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let mut counts = [0u32; 6];
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..TRIALS {
            let mut items = vec![0, 1, 2];
            shuffler(&mut items, &mut rng);
            let index = permutations
                .iter()
                .position(|p| p[..] == items[..])
                .unwrap();
            counts[index] += 1;
        }

        let expected = TRIALS as f64 / 6.0;
        counts
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum()
    }

    #[test]
    fn all_permutations_are_equally_likely() {
        let chi_square = permutation_chi_square(|items, rng| shuffle(items, rng));
        // 99.9th percentile with 5 degrees of freedom
        assert!(chi_square < 20.52, "chi-square {chi_square:.2}");
    }

    #[test]
    fn naive_swap_shuffle_is_detected_as_biased() {
        let chi_square = permutation_chi_square(|items, rng| {
            let len = items.len();
            for i in 0..len {
                items.swap(i, rng.gen_range(0..len));
            }
        });
        assert!(chi_square > 20.52, "chi-square {chi_square:.2}");
    }
}
