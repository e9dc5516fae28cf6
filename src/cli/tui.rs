use std::io::{self, Stdout, stdout};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::Frame;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::board::{Cell, Position};
use crate::cli::board_display::cell_glyph;
use crate::cli::log::describe;
use crate::game::{GameError, GameSession, Phase, StepOutcome};
use crate::types::{AskTeam, Category, Symbol, TurnDirection};

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Answer window in seconds. Events may grant bonus seconds on top; an
/// expired window scores as a miss.
pub const BASE_SECONDS: u64 = 15;

pub struct TuiApp {
    session: GameSession,
    cursor: Position,
    status: String,
    show_help: bool,
    should_quit: bool,
    deadline: Option<Instant>,
    timed_question: Option<u32>,
    game_state_scroll: u16,
    history_scroll: u16,
    game_state_max_scroll: u16,
    history_max_scroll: u16,
}

impl TuiApp {
    pub fn new(session: GameSession) -> Self {
        Self {
            session,
            cursor: Position::new(0, 0),
            status: String::new(),
            show_help: false,
            should_quit: false,
            deadline: None,
            timed_question: None,
            game_state_scroll: 0,
            history_scroll: 0,
            game_state_max_scroll: 0,
            history_max_scroll: 0,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?; // clear cargo/run output before first draw

        let result = loop {
            if self.should_quit {
                break Ok(());
            }

            self.tick_timer();
            terminal.draw(|f| self.render(f))?;

            if crossterm::event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key) {
                        break Ok(());
                    }
                }
            }
        };

        // Always cleanup terminal state
        let _ = terminal.clear();
        let _ = disable_raw_mode();
        let _ = execute!(terminal.backend_mut(), DisableMouseCapture);
        let _ = terminal.show_cursor();

        result
    }

    /// Runs one engine primitive and surfaces the outcome on the status line.
    fn apply<F>(&mut self, op: F)
    where
        F: FnOnce(&mut GameSession) -> Result<StepOutcome, GameError>,
    {
        match op(&mut self.session) {
            Ok(outcome) => {
                if let Some(event) = outcome.events.last() {
                    self.status = describe(event);
                }
            }
            Err(err) => {
                self.status = err.to_string();
            }
        }
    }

    /// Arms the countdown when a new question opens and force-submits a miss
    /// once it runs out. Re-arms per question id, so a second question of the
    /// same activation gets a fresh window.
    fn tick_timer(&mut self) {
        let (id, extra) = match self.session.pending_question() {
            Some(pending) => (pending.question.id, pending.extra_seconds as u64),
            None => {
                self.deadline = None;
                self.timed_question = None;
                return;
            }
        };

        if self.timed_question != Some(id) {
            self.timed_question = Some(id);
            self.deadline = Some(Instant::now() + Duration::from_secs(BASE_SECONDS + extra));
            return;
        }

        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.status = "Time is up".to_string();
                self.apply(|session| session.submit_answer(false));
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            let is_shift = key.modifiers.contains(KeyModifiers::SHIFT);
            match key.code {
                KeyCode::Up => {
                    if is_shift {
                        self.adjust_history_scroll(-1);
                    } else {
                        self.adjust_game_state_scroll(-1);
                    }
                    return false;
                }
                KeyCode::Down => {
                    if is_shift {
                        self.adjust_history_scroll(1);
                    } else {
                        self.adjust_game_state_scroll(1);
                    }
                    return false;
                }
                KeyCode::PageUp => {
                    if is_shift {
                        self.adjust_history_scroll(-5);
                    } else {
                        self.adjust_game_state_scroll(-5);
                    }
                    return false;
                }
                KeyCode::PageDown => {
                    if is_shift {
                        self.adjust_history_scroll(5);
                    } else {
                        self.adjust_game_state_scroll(5);
                    }
                    return false;
                }
                _ => {}
            }
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                return true;
            }
            KeyCode::Char('h') => {
                self.show_help = !self.show_help;
                return false;
            }
            _ => {}
        }

        match self.session.phase() {
            Phase::AwaitingActivation => self.handle_board_key(key, false),
            Phase::TargetSelection => self.handle_board_key(key, true),
            Phase::EventIntro => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.apply(|session| session.confirm());
                }
            }
            Phase::ConfirmTarget => match key.code {
                KeyCode::Enter => self.apply(|session| session.confirm()),
                KeyCode::Backspace => self.apply(|session| session.cancel()),
                _ => {}
            },
            Phase::QuestionOpen => self.handle_question_key(key),
            Phase::Finished { .. } => {}
        }
        false
    }

    fn handle_board_key(&mut self, key: KeyEvent, selecting: bool) {
        match key.code {
            KeyCode::Up => self.move_cursor(-1, 0),
            KeyCode::Down => self.move_cursor(1, 0),
            KeyCode::Left => self.move_cursor(0, -1),
            KeyCode::Right => self.move_cursor(0, 1),
            KeyCode::Enter => {
                let pos = self.cursor;
                if selecting {
                    self.apply(|session| session.select_target(pos));
                } else {
                    self.apply(|session| session.activate(pos));
                }
            }
            KeyCode::Backspace if selecting => {
                self.apply(|session| session.cancel());
            }
            _ => {}
        }
    }

    fn handle_question_key(&mut self, key: KeyEvent) {
        let (option_count, correct_index, disabled, can_reroll) =
            match self.session.pending_question() {
                Some(pending) => (
                    pending.question.options.len(),
                    pending.question.correct_index,
                    pending.disabled_options.clone(),
                    pending.can_reroll,
                ),
                None => return,
            };

        match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                let choice = c as usize - '1' as usize;
                if choice < option_count && !disabled.contains(&choice) {
                    let was_correct = choice == correct_index;
                    self.apply(|session| session.submit_answer(was_correct));
                }
            }
            KeyCode::Char('s') if can_reroll => {
                self.apply(|session| session.cancel());
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, drow: isize, dcol: isize) {
        let size = self.session.board().size() as isize;
        let row = (self.cursor.row as isize + drow).clamp(0, size - 1);
        let col = (self.cursor.col as isize + dcol).clamp(0, size - 1);
        self.cursor = Position::new(row as usize, col as usize);
    }

    fn cursor_active(&self) -> bool {
        matches!(
            self.session.phase(),
            Phase::AwaitingActivation | Phase::TargetSelection
        )
    }

    fn render(&mut self, f: &mut Frame<'_>) {
        let area = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(20),   // Main content
                Constraint::Length(3), // Help/status bar
            ])
            .split(area);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(60), // Board
                Constraint::Percentage(40), // Game info and interaction
            ])
            .split(chunks[0]);

        self.render_board(f, main_chunks[0]);
        self.render_right_panel(f, main_chunks[1]);
        self.render_status_bar(f, chunks[1]);
    }

    fn render_board(&self, f: &mut Frame<'_>, area: Rect) {
        let board = self.session.board();
        let mut lines: Vec<Line<'_>> = Vec::new();

        let mut header = vec![Span::raw("    ")];
        for col in 0..board.size() {
            header.push(Span::styled(
                format!("{col:>3}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(header));

        for row in 0..board.size() {
            let mut spans = vec![Span::styled(
                format!("{row:>3} "),
                Style::default().fg(Color::DarkGray),
            )];
            for col in 0..board.size() {
                let pos = Position::new(row, col);
                let Some(cell) = board.cell(pos) else { continue };
                let marker = if cell.protected { '*' } else { ' ' };
                spans.push(Span::styled(
                    format!(" {}{}", cell_glyph(cell), marker),
                    self.style_for_cell(pos, cell),
                ));
            }
            lines.push(Line::from(spans));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Board")
            .title_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );

        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    fn render_right_panel(&mut self, f: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(35), // Game state
                Constraint::Percentage(35), // Phase interaction
                Constraint::Percentage(30), // History
            ])
            .split(area);

        self.render_game_state(f, chunks[0]);
        self.render_interaction(f, chunks[1]);
        self.render_history_panel(f, chunks[2]);
    }

    fn render_game_state(&mut self, f: &mut Frame<'_>, area: Rect) {
        let turns = self.session.turns();

        let mut lines: Vec<Line<'_>> = vec![Line::from(vec![
            Span::raw("Round "),
            Span::styled(
                format!("{}", turns.match_log().len() + 1),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ])];

        for (idx, player) in turns.players().iter().enumerate() {
            let is_current = idx == turns.current_index();
            let marker = if is_current { "> " } else { "  " };
            let color = symbol_color(player.symbol);

            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{} ({})", player.name, player.symbol),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]));
            lines.push(Line::from(vec![
                Span::raw("  Cells: "),
                Span::styled(
                    format!("{}", player.score),
                    Style::default().fg(Color::Green),
                ),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(format!("Win length: {}", turns.win_length())));
        if turns.direction() == TurnDirection::Reverse {
            lines.push(Line::from(Span::styled(
                "Turn order reversed",
                Style::default().fg(Color::Yellow),
            )));
        }
        if let Some(symbol) = turns.pending_skip() {
            lines.push(Line::from(vec![
                Span::raw("Skip armed for "),
                Span::styled(
                    symbol.to_string(),
                    Style::default().fg(symbol_color(symbol)),
                ),
            ]));
        }

        let block = Block::default().borders(Borders::ALL).title("Game State");

        let viewport_height = area.height.saturating_sub(2);
        let content_height = lines.len() as u16;
        let max_scroll = content_height.saturating_sub(viewport_height);
        self.game_state_max_scroll = max_scroll;
        if self.game_state_scroll > max_scroll {
            self.game_state_scroll = max_scroll;
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.game_state_scroll, 0));

        f.render_widget(paragraph, area);
    }

    fn render_interaction(&self, f: &mut Frame<'_>, area: Rect) {
        let mut lines: Vec<Line<'_>> = Vec::new();

        match self.session.phase() {
            Phase::AwaitingActivation => {
                let symbol = self.session.turns().current_symbol();
                lines.push(Line::from(vec![
                    Span::styled(
                        symbol.to_string(),
                        Style::default()
                            .fg(symbol_color(symbol))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" to act"),
                ]));
                lines.push(Line::from(""));
                lines.push(Line::from(format!("Cursor: {}", self.cursor)));
                if let Some(cell) = self.session.board().cell(self.cursor) {
                    lines.push(Line::from(format!("  {}", cell_summary(cell))));
                }
                lines.push(Line::from(""));
                lines.push(Line::from("Arrows move, Enter opens the cell."));
            }
            Phase::EventIntro => {
                if let Some(ctx) = self.session.active_event() {
                    let info = ctx.kind.info();
                    lines.push(Line::from(vec![
                        Span::styled(
                            ctx.category.to_string(),
                            Style::default()
                                .fg(category_color(ctx.category))
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(" event"),
                    ]));
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        info.title,
                        Style::default().add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(info.desc));
                }
                lines.push(Line::from(""));
                lines.push(Line::from("Enter: continue"));
            }
            Phase::TargetSelection => {
                lines.push(Line::from("Pick a highlighted enemy cell."));
                lines.push(Line::from(format!(
                    "Candidates: {}",
                    self.session.candidates().len()
                )));
                if let Some(request) = self
                    .session
                    .active_event()
                    .and_then(|ctx| ctx.target_request())
                {
                    lines.push(Line::from(format!(
                        "Picked {} of {}",
                        request.selected.len(),
                        request.count
                    )));
                }
                lines.push(Line::from(""));
                lines.push(Line::from("Arrows move, Enter picks, Backspace restarts."));
            }
            Phase::ConfirmTarget => {
                lines.push(Line::from("Confirm targets:"));
                if let Some(request) = self
                    .session
                    .active_event()
                    .and_then(|ctx| ctx.target_request())
                {
                    for pos in &request.selected {
                        lines.push(Line::from(format!("  {pos}")));
                    }
                }
                lines.push(Line::from(""));
                lines.push(Line::from("Enter: confirm   Backspace: re-pick"));
            }
            Phase::QuestionOpen => {
                if let Some(pending) = self.session.pending_question() {
                    let mut header = vec![
                        Span::raw("Answering: "),
                        Span::styled(
                            pending.symbol.to_string(),
                            Style::default()
                                .fg(symbol_color(pending.symbol))
                                .add_modifier(Modifier::BOLD),
                        ),
                    ];
                    if pending.ask == AskTeam::Opponent {
                        header.push(Span::styled(
                            " (opponent question)",
                            Style::default().fg(Color::Yellow),
                        ));
                    }
                    lines.push(Line::from(header));

                    if let Some(deadline) = self.deadline {
                        let left = deadline
                            .saturating_duration_since(Instant::now())
                            .as_secs();
                        let color = if left <= 5 { Color::Red } else { Color::Green };
                        lines.push(Line::from(vec![
                            Span::raw("Time left: "),
                            Span::styled(format!("{left}s"), Style::default().fg(color)),
                        ]));
                    }

                    lines.push(Line::from(""));
                    lines.push(Line::from(pending.question.prompt.clone()));
                    lines.push(Line::from(""));
                    for (idx, option) in pending.question.options.iter().enumerate() {
                        let style = if pending.disabled_options.contains(&idx) {
                            Style::default()
                                .fg(Color::DarkGray)
                                .add_modifier(Modifier::CROSSED_OUT)
                        } else {
                            Style::default()
                        };
                        lines.push(Line::from(Span::styled(
                            format!("{}. {}", idx + 1, option),
                            style,
                        )));
                    }
                    if pending.can_reroll {
                        lines.push(Line::from(""));
                        lines.push(Line::from(Span::styled(
                            "s: switch to a different question",
                            Style::default().fg(Color::Cyan),
                        )));
                    }
                }
            }
            Phase::Finished { winner } => {
                lines.push(Line::from(""));
                match winner {
                    Some(symbol) => lines.push(Line::from(Span::styled(
                        format!("{symbol} wins the match!"),
                        Style::default()
                            .fg(symbol_color(symbol))
                            .add_modifier(Modifier::BOLD),
                    ))),
                    None => lines.push(Line::from(Span::styled(
                        "Match over, no winner.",
                        Style::default().add_modifier(Modifier::BOLD),
                    ))),
                }
                lines.push(Line::from(""));
                lines.push(Line::from("q: quit"));
            }
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Play"))
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    fn render_history_panel(&mut self, f: &mut Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("History");

        let mut lines: Vec<Line<'_>> = Vec::new();
        if self.session.history().is_empty() {
            lines.push(Line::from("Nothing has happened yet."));
        } else {
            for (idx, event) in self.session.history().iter().enumerate() {
                lines.push(Line::from(format!("#{} {}", idx + 1, describe(event))));
            }
        }

        let viewport_height = area.height.saturating_sub(2);
        let content_height = lines.len() as u16;
        let max_scroll = content_height.saturating_sub(viewport_height);
        self.history_max_scroll = max_scroll;
        self.ensure_history_scroll_from_bottom(viewport_height, content_height);

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.history_scroll, 0));

        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame<'_>, area: Rect) {
        let text = if self.show_help {
            "Arrows: move | Enter: open/confirm | 1-9: answer | s: switch question | \
             Backspace: back | Ctrl+Up/Down: state scroll | Ctrl+Shift+Up/Down: history \
             scroll | h: help | q/Esc: quit"
                .to_string()
        } else if self.status.is_empty() {
            "Press 'h' for the key reference".to_string()
        } else {
            format!("{} | 'h' for help", self.status)
        };

        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::White))
            .alignment(Alignment::Center);

        f.render_widget(paragraph, area);
    }

    fn style_for_cell(&self, pos: Position, cell: &Cell) -> Style {
        let mut style = if let Some(symbol) = cell.owner {
            Style::default()
                .fg(symbol_color(symbol))
                .add_modifier(Modifier::BOLD)
        } else if cell.blocked {
            Style::default().fg(Color::DarkGray)
        } else if let Some(category) = cell.category {
            Style::default().fg(category_color(category))
        } else {
            Style::default()
        };

        if self.session.phase() == Phase::TargetSelection
            && self.session.candidates().contains(&pos)
        {
            style = style.bg(Color::DarkGray);
        }
        if self.session.active_cell() == Some(pos) {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if self.cursor_active() && pos == self.cursor {
            style = style.bg(Color::Yellow).fg(Color::Black);
        }
        style
    }

    fn adjust_game_state_scroll(&mut self, delta: i16) {
        Self::adjust_scroll(
            &mut self.game_state_scroll,
            self.game_state_max_scroll,
            delta,
        );
    }

    fn adjust_history_scroll(&mut self, delta: i16) {
        Self::adjust_scroll(&mut self.history_scroll, self.history_max_scroll, delta);
    }

    fn adjust_scroll(current: &mut u16, max_scroll: u16, delta: i16) {
        let current_val = *current as i32 + delta as i32;
        let clamped = current_val.clamp(0, max_scroll as i32);
        *current = clamped as u16;
    }

    fn ensure_history_scroll_from_bottom(&mut self, viewport_height: u16, content_height: u16) {
        if content_height <= viewport_height {
            self.history_scroll = 0;
        } else if self.history_scroll == 0 || self.history_scroll >= self.history_max_scroll {
            self.history_scroll = self.history_max_scroll;
        }
    }
}

fn cell_summary(cell: &Cell) -> String {
    let base = if cell.blocked {
        "blocked".to_string()
    } else if let Some(symbol) = cell.owner {
        format!("owned by {symbol}")
    } else if let Some(category) = cell.category {
        format!("{category} event cell")
    } else {
        "free".to_string()
    };
    if cell.protected {
        format!("{base}, protected")
    } else {
        base
    }
}

fn symbol_color(symbol: Symbol) -> Color {
    match symbol.as_char() {
        'A' => Color::Red,
        'B' => Color::Blue,
        'C' => Color::Magenta,
        'D' => Color::White,
        'E' => Color::Green,
        'F' => Color::Cyan,
        _ => Color::Gray,
    }
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Bonus => Color::Green,
        Category::Warning => Color::Yellow,
        Category::Challenge => Color::Cyan,
        Category::Danger => Color::Red,
        Category::Special => Color::Magenta,
    }
}
