pub mod event;
pub mod render;

use crate::app::model::{Status, TestHandle};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;
use std::time::Duration;

use self::event::{Command, Message};

const RUNNING_TEXT: &str = "Test running...";
/// Rows taken by borders, title and footer around the detail text.
const DETAIL_CHROME: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    List,
    Detail,
    #[allow(dead_code)]
    Input,
}

/// What detail mode shows for the open test.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub identity: String,
    pub status: Status,
    pub body: String,
}

#[derive(Debug)]
pub struct View {
    tests: Vec<TestHandle>,
    mode: Mode,
    table: TableState,
    chosen: Option<TestHandle>,
    scroll: u16,
    height: u16,
    input: String,
    updating: bool,
    redraw: bool,
    redraw_interval: Duration,
}

impl View {
    pub fn new(tests: Vec<TestHandle>, redraw_interval: Duration) -> Self {
        let mut table = TableState::default();
        table.select(Some(0));
        Self {
            tests,
            mode: Mode::List,
            table,
            chosen: None,
            scroll: 0,
            height: 24,
            input: String::new(),
            updating: false,
            redraw: true,
            redraw_interval,
        }
    }

    pub fn update(&mut self, message: Message) -> Command {
        match message {
            Message::Quit => return Command::Quit,
            Message::Key(key)
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c') =>
            {
                return Command::Quit
            }
            Message::Resize(_, height) => {
                self.height = height;
                self.redraw = true;
                return Command::None;
            }
            Message::Tick => {
                self.updating = false;
                self.redraw = true;
                return Command::None;
            }
            Message::TestUpdated => return self.test_updated(),
            _ => {}
        }
        match self.mode {
            Mode::List => self.update_list(message),
            Mode::Detail => self.update_detail(message),
            Mode::Input => self.update_input(message),
        }
    }

    /// Redraws at once, then holds further redraws back until the next tick.
    fn test_updated(&mut self) -> Command {
        if self.updating {
            return Command::None;
        }
        self.updating = true;
        self.redraw = true;
        Command::Tick(self.redraw_interval)
    }

    fn update_list(&mut self, message: Message) -> Command {
        let key = match message {
            Message::Key(key) => key,
            Message::Open => {
                self.updating = false;
                self.redraw = true;
                return Command::None;
            }
            _ => return Command::None,
        };
        self.redraw = true;
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(test) = self.highlighted() {
                    self.mode = Mode::Detail;
                    self.chosen = Some(test);
                    return self.update(Message::Open);
                }
            }
            KeyCode::Char('r') => return self.rerun(),
            KeyCode::Char('R') => return Command::RunAll(self.tests.clone()),
            KeyCode::Char('d') | KeyCode::Char('x') => {
                let cursor = self.cursor();
                if self.remove(cursor) && cursor > 0 {
                    self.table.select(Some(cursor - 1));
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.select(self.cursor().saturating_sub(1)),
            KeyCode::Down | KeyCode::Char('j') => self.select(self.cursor() + 1),
            KeyCode::Home => self.select(0),
            KeyCode::End => self.select(self.tests.len().saturating_sub(1)),
            KeyCode::Char('q') => return Command::Quit,
            _ => {}
        }
        Command::None
    }

    fn update_detail(&mut self, message: Message) -> Command {
        let key = match message {
            Message::Key(key) => key,
            Message::Open => {
                self.scroll = 0;
                self.redraw = true;
                return Command::None;
            }
            _ => return Command::None,
        };
        self.redraw = true;
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.mode = Mode::List;
                self.chosen = None;
                return self.update(Message::Open);
            }
            KeyCode::Char('r') => return self.rerun(),
            KeyCode::Down | KeyCode::Char('j') => {
                let cursor = self.cursor();
                if cursor + 1 < self.tests.len() {
                    self.select(cursor + 1);
                    self.chosen = self.highlighted();
                }
                return self.update(Message::Open);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let cursor = self.cursor();
                if cursor > 0 {
                    self.select(cursor - 1);
                    self.chosen = self.highlighted();
                }
                return self.update(Message::Open);
            }
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(self.page()),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(self.page()),
            KeyCode::Home => self.scroll = 0,
            _ => {}
        }
        Command::None
    }

    fn update_input(&mut self, message: Message) -> Command {
        if let Message::Key(KeyEvent { code, .. }) = message {
            match code {
                KeyCode::Char(c) => self.input.push(c),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                _ => {}
            }
            self.redraw = true;
        }
        Command::None
    }

    fn rerun(&self) -> Command {
        match self.highlighted() {
            Some(test) => Command::Run(test),
            None => Command::None,
        }
    }

    fn highlighted(&self) -> Option<TestHandle> {
        self.tests.get(self.cursor()).cloned()
    }

    fn select(&mut self, index: usize) {
        let last = self.tests.len().saturating_sub(1);
        self.table.select(Some(index.min(last)));
    }

    fn page(&self) -> u16 {
        self.height.saturating_sub(DETAIL_CHROME).max(1)
    }

    /// Drops row `index`, keeping the others in order.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.tests.len() {
            return false;
        }
        let removed = self.tests.remove(index);
        debug!("Removed {} from the list", lock!(removed));
        true
    }

    pub fn cursor(&self) -> usize {
        self.table.selected().unwrap_or(0)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn table_state(&mut self) -> &mut TableState {
        &mut self.table
    }

    /// Consumes the pending redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.redraw, false)
    }

    /// `(identity, status)` for every row, in list order.
    pub fn rows(&self) -> Vec<(String, Status)> {
        self.tests
            .iter()
            .map(|handle| {
                let test = lock!(handle);
                (test.to_string(), test.status)
            })
            .collect()
    }

    pub fn detail(&self) -> Option<Detail> {
        let chosen = self.chosen.as_ref()?;
        let test = lock!(chosen);
        let body = match test.status {
            Status::Running => RUNNING_TEXT.to_owned(),
            _ => test.results.join("\n"),
        };
        Some(Detail {
            identity: test.to_string(),
            status: test.status,
            body,
        })
    }

    /// Number of tests in each status that has any, in [`Status::ALL`] order.
    pub fn counts(&self) -> Vec<(Status, usize)> {
        let rows = self.rows();
        Status::ALL
            .iter()
            .map(|status| (*status, rows.iter().filter(|(_, s)| s == status).count()))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}
