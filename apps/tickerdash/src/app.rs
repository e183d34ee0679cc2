use crate::logging::SharedLogStore;
use crate::tasks::{SeriesView, TaskEvent, TaskKind, TaskRunner};
use crossterm::event::{Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tickerdash_application::chat::ChatReply;
use tickerdash_domain::value_objects::symbol::Symbol;

const MAX_CHAT_LINES: usize = 200;
const MAX_SELECTION_WINDOW: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    AddTicker,
    Chat,
}

/// Single-line editor. `cursor` is a byte offset on a char boundary.
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn new(value: String) -> Self {
        let cursor = value.len();
        Self { value, cursor }
    }

    pub fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) {
        let Some(prev) = self.value[..self.cursor].chars().next_back() else {
            return;
        };
        self.cursor -= prev.len_utf8();
        self.value.remove(self.cursor);
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.value.remove(self.cursor);
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.value[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.value[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub text: String,
    pub from_user: bool,
}

pub struct App {
    pub mode: InputMode,
    pub input: TextInput,

    pub series: Vec<SeriesView>,
    pub cursor: usize,
    pub marked: Vec<Symbol>,
    pub selection_window: usize,

    pub chat: VecDeque<ChatLine>,
    pub status: Option<Result<String, String>>,
    pub refresh_note: Option<String>,
    pub pending: usize,

    pub logs: SharedLogStore,
    pub log_scroll: usize,

    pub task_runner: TaskRunner,
    pub dirty: bool,
    refresh_every: Duration,
    last_refresh: Instant,
}

impl App {
    pub fn new(
        logs: SharedLogStore,
        task_runner: TaskRunner,
        refresh_every: Duration,
    ) -> Self {
        Self {
            mode: InputMode::Normal,
            input: TextInput::new(String::new()),
            series: Vec::new(),
            cursor: 0,
            marked: Vec::new(),
            selection_window: 1,
            chat: VecDeque::new(),
            status: None,
            refresh_note: None,
            pending: 0,
            logs,
            log_scroll: 0,
            task_runner,
            dirty: true,
            refresh_every,
            last_refresh: Instant::now(),
        }
    }

    pub fn spawn_input_reader(&self, tx: tokio::sync::mpsc::UnboundedSender<TaskEvent>) {
        std::thread::spawn(move || {
            while let Ok(event) = crossterm::event::read() {
                let _ = tx.send(TaskEvent::Input(event));
            }
        });
    }

    /// Fires the periodic refresh once `refresh_every` has passed.
    pub fn on_tick(&mut self) {
        if self.last_refresh.elapsed() < self.refresh_every {
            return;
        }
        self.last_refresh = Instant::now();
        if !self.series.is_empty() {
            self.task_runner.refresh();
        }
    }

    pub fn on_event(&mut self, event: TaskEvent) -> Result<bool, String> {
        match event {
            TaskEvent::Input(ct) => self.on_input(ct),
            TaskEvent::View(series) => {
                self.series = series;
                self.cursor = self.cursor.min(self.series.len().saturating_sub(1));
                self.dirty = true;
                Ok(false)
            }
            TaskEvent::Chat(reply) => {
                self.push_chat(reply);
                self.dirty = true;
                Ok(false)
            }
            TaskEvent::TaskFinished(kind, result) => {
                if kind == TaskKind::Refresh {
                    self.refresh_note = result.ok();
                } else {
                    self.pending = self.pending.saturating_sub(1);
                    self.status = Some(result);
                }
                self.dirty = true;
                Ok(false)
            }
        }
    }

    pub fn marked_in_watchlist_order(&self) -> Vec<Symbol> {
        self.series
            .iter()
            .filter(|s| self.marked.contains(&s.symbol))
            .map(|s| s.symbol.clone())
            .collect()
    }

    fn push_chat(&mut self, reply: ChatReply) {
        self.chat.push_back(ChatLine {
            text: reply.user_line,
            from_user: true,
        });
        self.chat.push_back(ChatLine {
            text: reply.reply_line,
            from_user: false,
        });
        while self.chat.len() > MAX_CHAT_LINES {
            self.chat.pop_front();
        }
    }

    fn on_input(&mut self, event: CtEvent) -> Result<bool, String> {
        match event {
            CtEvent::Key(key) if key.kind != KeyEventKind::Release => self.on_key(key),
            CtEvent::Resize(_, _) => {
                self.dirty = true;
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Result<bool, String> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }
        self.dirty = true;
        match self.mode {
            InputMode::Normal => self.handle_normal_keys(key),
            InputMode::AddTicker | InputMode::Chat => {
                self.handle_input_keys(key);
                Ok(false)
            }
        }
    }

    fn handle_normal_keys(&mut self, key: KeyEvent) -> Result<bool, String> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('a') => self.enter_mode(InputMode::AddTicker),
            KeyCode::Char('c') => self.enter_mode(InputMode::Chat),
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                self.cursor = (self.cursor + 1).min(self.series.len().saturating_sub(1));
            }
            KeyCode::Char(' ') => self.toggle_marked(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.selection_window = (self.selection_window + 1).min(MAX_SELECTION_WINDOW);
            }
            KeyCode::Char('-') => {
                self.selection_window = self.selection_window.saturating_sub(1).max(1);
            }
            KeyCode::Char('w') => {
                self.pending += 1;
                self.status = Some(Ok("sending selection...".to_string()));
                self.task_runner
                    .send_selection(self.marked_in_watchlist_order(), self.selection_window);
            }
            KeyCode::Char('e') => {
                self.pending += 1;
                self.task_runner.export();
            }
            KeyCode::Char('r') => {
                self.last_refresh = Instant::now();
                if !self.task_runner.refresh() {
                    self.status = Some(Ok("refresh already running".to_string()));
                }
            }
            KeyCode::PageUp => self.log_scroll = self.log_scroll.saturating_add(5),
            KeyCode::PageDown => self.log_scroll = self.log_scroll.saturating_sub(5),
            _ => self.dirty = false,
        }
        Ok(false)
    }

    fn handle_input_keys(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input.take();
                self.mode = InputMode::Normal;
            }
            KeyCode::Enter => self.submit_input(),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Char(ch) => self.input.insert_char(ch),
            _ => {}
        }
    }

    fn enter_mode(&mut self, mode: InputMode) {
        self.input.take();
        self.mode = mode;
    }

    fn toggle_marked(&mut self) {
        let Some(symbol) = self.series.get(self.cursor).map(|s| s.symbol.clone()) else {
            return;
        };
        if let Some(idx) = self.marked.iter().position(|m| *m == symbol) {
            self.marked.remove(idx);
        } else {
            self.marked.push(symbol);
        }
    }

    fn submit_input(&mut self) {
        let value = self.input.take();
        let mode = std::mem::replace(&mut self.mode, InputMode::Normal);
        match mode {
            InputMode::AddTicker => {
                self.pending += 1;
                self.status = Some(Ok(format!("looking up {}...", value.trim())));
                self.task_runner.add_ticker(value);
            }
            InputMode::Chat if !value.trim().is_empty() => self.task_runner.chat(value),
            _ => {}
        }
    }
}
