use std::collections::HashMap;
use std::time::Duration;

use crate::game::GameSession;
use crate::types::Symbol;

#[derive(Debug, Default, Clone)]
pub struct GameStats {
    pub wins: HashMap<Symbol, u32>,
    pub draws: u32,
    pub cells_by_symbol: HashMap<Symbol, Vec<u32>>,
    pub games: u32,
    pub total_events: u64,
    pub total_rounds: u64,
    pub total_duration: Duration,
}

impl GameStats {
    pub fn new() -> Self {
        Self {
            wins: HashMap::new(),
            draws: 0,
            cells_by_symbol: HashMap::new(),
            games: 0,
            total_events: 0,
            total_rounds: 0,
            total_duration: Duration::ZERO,
        }
    }

    pub fn record_game(&mut self, session: &GameSession, duration: Duration) {
        self.games += 1;
        self.total_duration += duration;
        self.total_events += session.history().len() as u64;
        self.total_rounds += session.turns().match_log().len() as u64;

        match session.winner() {
            Some(winner) => *self.wins.entry(winner).or_insert(0) += 1,
            None if session.finished() => self.draws += 1,
            None => {}
        }

        for player in session.turns().players() {
            self.cells_by_symbol
                .entry(player.symbol)
                .or_insert_with(Vec::new)
                .push(player.score);
        }
    }

    pub fn get_avg_events(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_events as f64 / self.games as f64
    }

    pub fn get_avg_rounds(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_rounds as f64 / self.games as f64
    }

    pub fn get_avg_duration(&self) -> Duration {
        if self.games == 0 {
            return Duration::ZERO;
        }
        self.total_duration / self.games
    }

    pub fn get_avg_cells(&self, symbol: Symbol) -> f64 {
        match self.cells_by_symbol.get(&symbol) {
            Some(results) if !results.is_empty() => {
                results.iter().map(|n| *n as f64).sum::<f64>() / results.len() as f64
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::questions::{Question, QuestionSource};

    struct OneQuestion;

    impl QuestionSource for OneQuestion {
        fn next_question(&mut self) -> Option<Question> {
            Some(Question {
                id: 1,
                prompt: "?".to_string(),
                options: vec!["a".to_string(), "b".to_string()],
                correct_index: 0,
            })
        }

        fn is_exhausted(&self) -> bool {
            false
        }
    }

    #[test]
    fn unfinished_games_count_neither_win_nor_draw() {
        let config = GameConfig {
            event_cells: 0,
            ..GameConfig::default()
        };
        let session = GameSession::new(config, Box::new(OneQuestion));

        let mut stats = GameStats::new();
        stats.record_game(&session, Duration::from_millis(10));

        assert_eq!(stats.games, 1);
        assert_eq!(stats.draws, 0);
        assert!(stats.wins.is_empty());
        assert_eq!(stats.get_avg_duration(), Duration::from_millis(10));
    }

    #[test]
    fn averages_survive_zero_games() {
        let stats = GameStats::new();
        assert_eq!(stats.get_avg_rounds(), 0.0);
        assert_eq!(stats.get_avg_cells(Symbol::new('A')), 0.0);
    }
}
