use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// Where the session draws its questions from. The spare pool backs the
/// question-switch event; sources without one hand out main-pool questions.
pub trait QuestionSource {
    fn next_question(&mut self) -> Option<Question>;

    fn next_spare(&mut self) -> Option<Question> {
        self.next_question()
    }

    fn is_exhausted(&self) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("failed to read question file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse question file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("only {found} usable questions, need at least {needed}")]
    TooFew { found: usize, needed: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankConfig {
    /// Share of the main pool that gets an event tile on the board.
    pub event_ratio: f64,
    /// Share of the load held back as spares for question switches.
    pub spare_ratio: f64,
    pub min_required: usize,
    pub seed: u64,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            event_ratio: 0.2,
            spare_ratio: 0.3,
            min_required: 9,
            seed: 42,
        }
    }
}

/// On-disk question representation. Answers come in two spellings, a bare
/// option index or a letter (`"A"`..), and both normalize to an index.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    answer: RawAnswer,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAnswer {
    Index(usize),
    Letter(String),
}

/// JSON-backed question source. Questions are shuffled once at load with the
/// config seed, split into a main and a spare pool, and then dealt in order
/// through two cursors. Board sizing is derived from the main pool.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    used: Vec<Question>,
    spare: Vec<Question>,
    used_cursor: usize,
    spare_cursor: usize,
    config: BankConfig,
}

impl QuestionBank {
    pub fn load(path: impl AsRef<Path>, config: BankConfig) -> Result<Self, BankError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text, config)
    }

    pub fn from_json(text: &str, config: BankConfig) -> Result<Self, BankError> {
        let raw: Vec<RawQuestion> = serde_json::from_str(text)?;
        let mut questions: Vec<Question> = raw
            .into_iter()
            .enumerate()
            .filter_map(|(id, raw)| normalize(id as u32, raw))
            .collect();
        if questions.len() < config.min_required {
            return Err(BankError::TooFew {
                found: questions.len(),
                needed: config.min_required,
            });
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        questions.shuffle(&mut rng);
        let spare_count = (questions.len() as f64 * config.spare_ratio) as usize;
        let used_count = questions.len() - spare_count;
        let spare = questions.split_off(used_count);

        Ok(Self {
            used: questions,
            spare,
            used_cursor: 0,
            spare_cursor: 0,
            config,
        })
    }

    /// Smallest square board with one cell per main-pool question.
    pub fn board_size(&self) -> usize {
        (self.used.len() as f64).sqrt().ceil() as usize
    }

    pub fn event_cell_count(&self) -> usize {
        ((self.used.len() as f64 * self.config.event_ratio) as usize).min(self.used.len())
    }

    pub fn remaining_used(&self) -> usize {
        self.used.len() - self.used_cursor
    }

    pub fn remaining_spare(&self) -> usize {
        self.spare.len() - self.spare_cursor
    }
}

impl QuestionSource for QuestionBank {
    /// Deals from the main pool, then falls through to the spares once the
    /// main pool runs dry.
    fn next_question(&mut self) -> Option<Question> {
        if self.used_cursor < self.used.len() {
            let question = self.used[self.used_cursor].clone();
            self.used_cursor += 1;
            return Some(question);
        }
        self.next_spare()
    }

    fn next_spare(&mut self) -> Option<Question> {
        if self.spare_cursor < self.spare.len() {
            let question = self.spare[self.spare_cursor].clone();
            self.spare_cursor += 1;
            return Some(question);
        }
        None
    }

    fn is_exhausted(&self) -> bool {
        self.used_cursor >= self.used.len() && self.spare_cursor >= self.spare.len()
    }
}

fn normalize(id: u32, raw: RawQuestion) -> Option<Question> {
    if raw.options.len() < 2 {
        return None;
    }
    let correct_index = match raw.answer {
        RawAnswer::Index(index) if index < raw.options.len() => index,
        RawAnswer::Index(_) => return None,
        RawAnswer::Letter(letter) => {
            let first = letter.trim().to_ascii_uppercase().chars().next()?;
            let index = (first as usize).checked_sub('A' as usize)?;
            if index >= raw.options.len() {
                return None;
            }
            index
        }
    };
    Some(Question {
        id,
        prompt: raw.question,
        options: raw.options,
        correct_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_json(count: usize) -> String {
        let entries: Vec<String> = (0..count)
            .map(|i| {
                format!(
                    r#"{{"question": "Q{i}?", "options": ["a", "b", "c", "d"], "answer": {}}}"#,
                    i % 4
                )
            })
            .collect();
        format!("[{}]", entries.join(","))
    }

    fn small_config() -> BankConfig {
        BankConfig {
            min_required: 4,
            ..BankConfig::default()
        }
    }

    #[test]
    fn letter_and_index_answers_normalize_alike() {
        let text = r#"[
            {"question": "One?", "options": ["x", "y", "z"], "answer": 2},
            {"question": "Two?", "options": ["x", "y", "z"], "answer": "c"},
            {"question": "Three?", "options": ["x", "y"], "answer": " B "},
            {"question": "Four?", "options": ["x", "y"], "answer": "A"}
        ]"#;
        let bank = QuestionBank::from_json(text, small_config()).unwrap();
        let mut all: Vec<Question> = bank.used.clone();
        all.extend(bank.spare.clone());
        all.sort_by_key(|q| q.id);
        assert_eq!(all[0].correct_index, 2);
        assert_eq!(all[1].correct_index, 2);
        assert_eq!(all[2].correct_index, 1);
        assert_eq!(all[3].correct_index, 0);
    }

    #[test]
    fn unusable_entries_are_dropped() {
        let text = r#"[
            {"question": "Short?", "options": ["only"], "answer": 0},
            {"question": "Wide?", "options": ["x", "y"], "answer": 5},
            {"question": "Far?", "options": ["x", "y"], "answer": "Z"},
            {"question": "Ok1?", "options": ["x", "y"], "answer": 0},
            {"question": "Ok2?", "options": ["x", "y"], "answer": 1},
            {"question": "Ok3?", "options": ["x", "y"], "answer": "b"},
            {"question": "Ok4?", "options": ["x", "y"], "answer": "a"}
        ]"#;
        let bank = QuestionBank::from_json(text, small_config()).unwrap();
        assert_eq!(bank.used.len() + bank.spare.len(), 4);
    }

    #[test]
    fn too_few_questions_is_an_error() {
        let err = QuestionBank::from_json(&bank_json(5), BankConfig::default()).unwrap_err();
        match err {
            BankError::TooFew { found, needed } => {
                assert_eq!(found, 5);
                assert_eq!(needed, 9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pools_split_by_spare_ratio() {
        let bank = QuestionBank::from_json(&bank_json(20), small_config()).unwrap();
        assert_eq!(bank.spare.len(), 6);
        assert_eq!(bank.used.len(), 14);
    }

    #[test]
    fn board_is_sized_from_the_main_pool() {
        let bank = QuestionBank::from_json(&bank_json(20), small_config()).unwrap();
        assert_eq!(bank.board_size(), 4, "ceil(sqrt(14))");
        assert_eq!(bank.event_cell_count(), 2, "floor(14 * 0.2)");
    }

    #[test]
    fn main_pool_falls_through_to_spares() {
        let mut bank = QuestionBank::from_json(&bank_json(10), small_config()).unwrap();
        assert_eq!(bank.used.len(), 7);
        assert_eq!(bank.spare.len(), 3);

        for _ in 0..7 {
            assert!(bank.next_question().is_some());
        }
        assert_eq!(bank.remaining_used(), 0);
        assert!(bank.next_question().is_some(), "spares back the main draw");
        assert_eq!(bank.remaining_spare(), 2);
    }

    #[test]
    fn spare_draw_never_touches_the_main_pool() {
        let mut bank = QuestionBank::from_json(&bank_json(10), small_config()).unwrap();
        for _ in 0..3 {
            assert!(bank.next_spare().is_some());
        }
        assert_eq!(bank.next_spare(), None);
        assert_eq!(bank.remaining_used(), 7);
        assert!(!bank.is_exhausted());
    }

    #[test]
    fn exhaustion_needs_both_pools_empty() {
        let mut bank = QuestionBank::from_json(&bank_json(10), small_config()).unwrap();
        while bank.next_question().is_some() {}
        assert!(bank.is_exhausted());
        assert_eq!(bank.remaining_used(), 0);
        assert_eq!(bank.remaining_spare(), 0);
    }

    #[test]
    fn shuffle_is_seed_stable() {
        let a = QuestionBank::from_json(&bank_json(12), small_config()).unwrap();
        let b = QuestionBank::from_json(&bank_json(12), small_config()).unwrap();
        let ids = |bank: &QuestionBank| bank.used.iter().map(|q| q.id).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
    }
}
