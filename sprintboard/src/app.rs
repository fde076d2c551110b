//! Application state and input handling.
//!
//! `App` never touches the task store. Typed lines become [`Command`]s that
//! the event loop hands to the reconciler; everything the board reports back
//! arrives through [`App::apply_event`].

use std::collections::VecDeque;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use sprintboard_proto::task::{NewTask, Priority, Task, TaskId, TaskStatus};

use crate::board::{BoardEvent, FilterState, LoadState, PriorityFilter, TaskStore, VisibleSet};

/// How many notifications are kept for display.
const MAX_NOTICES: usize = 5;

/// A board operation requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move a task to another column.
    Move {
        /// Task to move.
        id: TaskId,
        /// Destination column.
        status: TaskStatus,
    },
    /// Revert the last move.
    Undo,
    /// Create a task from the submitted form.
    Create(NewTask),
    /// Delete a task.
    Delete(TaskId),
}

/// The task creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Title as typed.
    pub title: String,
    /// Description as typed.
    pub description: String,
    /// Selected priority.
    pub priority: Priority,
}

impl Draft {
    fn to_new_task(&self) -> NewTask {
        let mut new = NewTask::new(self.title.clone()).with_priority(self.priority);
        if !self.description.trim().is_empty() {
            new = new.with_description(self.description.clone());
        }
        new
    }
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    /// Current text input.
    pub input: String,
    /// Cursor position in `input` (byte offset on a char boundary).
    pub cursor_position: usize,
    /// Search text and priority filter.
    pub filter: FilterState,
    /// Open creation form, if any.
    pub draft: Option<Draft>,
    /// Recent notifications, oldest first.
    pub notices: VecDeque<String>,
    /// Task whose move can currently be undone.
    pub undo_offer: Option<TaskId>,
    /// Progress of the initial fetch.
    pub load: LoadState,
    /// Show task ids in the columns.
    pub show_ids: bool,
    /// Show the command reference.
    pub show_help: bool,
    /// Whether the app should quit.
    pub should_quit: bool,
    visible: VisibleSet,
}

impl App {
    /// Creates the initial state: loading, no filter, no form.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: String::new(),
            cursor_position: 0,
            filter: FilterState::default(),
            draft: None,
            notices: VecDeque::new(),
            undo_offer: None,
            load: LoadState::Loading,
            show_ids: true,
            show_help: false,
            should_quit: false,
            visible: VisibleSet::new(),
        }
    }

    /// Sets whether task ids are shown.
    #[must_use]
    pub const fn with_show_ids(mut self, show_ids: bool) -> Self {
        self.show_ids = show_ids;
        self
    }

    /// The visible set for `store` under the current filter, memoized.
    pub fn visible<'a>(&'a mut self, store: &TaskStore) -> &'a [Task] {
        self.visible.get(store, &self.filter)
    }

    /// How many times the visible set has been rebuilt.
    #[must_use]
    pub const fn visible_recomputations(&self) -> usize {
        self.visible.recomputations()
    }

    /// Latest notification, if any.
    #[must_use]
    pub fn latest_notice(&self) -> Option<&str> {
        self.notices.back().map(String::as_str)
    }

    /// Queues a notification, dropping the oldest past the limit.
    pub fn push_notice(&mut self, text: impl Into<String>) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(text.into());
    }

    /// Applies a board notification to the view state.
    pub fn apply_event(&mut self, event: &BoardEvent) {
        match event {
            BoardEvent::Changed { .. } => {}
            BoardEvent::Loaded { .. } => self.load = LoadState::Ready,
            BoardEvent::LoadFailed { message } => self.load = LoadState::Failed(message.clone()),
            BoardEvent::UndoOffered { task_id } => self.undo_offer = Some(task_id.clone()),
            BoardEvent::UndoWithdrawn { task_id, .. } => {
                if self.undo_offer.as_ref() == Some(task_id) {
                    self.undo_offer = None;
                }
            }
            BoardEvent::Notice(notice) => self.push_notice(notice.to_string()),
        }
    }

    /// Handles a key event, returning a command when one was entered.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Command> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                None
            }
            (KeyCode::Char('z'), KeyModifiers::CONTROL) => Some(Command::Undo),
            (KeyCode::Esc, _) => {
                if self.draft.is_some() {
                    self.draft = None;
                } else {
                    self.clear_input();
                }
                None
            }
            (KeyCode::Enter, _) => {
                let line = std::mem::take(&mut self.input);
                self.cursor_position = 0;
                self.handle_line(&line)
            }
            (KeyCode::Char(c), _) => {
                self.enter_char(c);
                None
            }
            (KeyCode::Backspace, _) => {
                self.delete_char();
                None
            }
            (KeyCode::Left, _) => {
                self.move_cursor_left();
                None
            }
            (KeyCode::Right, _) => {
                self.move_cursor_right();
                None
            }
            (KeyCode::Home, _) => {
                self.cursor_position = 0;
                None
            }
            (KeyCode::End, _) => {
                self.cursor_position = self.input.len();
                None
            }
            _ => None,
        }
    }

    /// Parses one typed line.
    ///
    /// View-only commands (filter, form editing, help) are applied here;
    /// board operations are returned for dispatch.
    pub fn handle_line(&mut self, line: &str) -> Option<Command> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        match word.to_ascii_lowercase().as_str() {
            "" => None,
            "move" | "mv" => self.parse_move(rest),
            "undo" => Some(Command::Undo),
            "rm" | "delete" => {
                if rest.is_empty() {
                    self.push_notice("Usage: rm <id>");
                    None
                } else {
                    Some(Command::Delete(TaskId::new(rest)))
                }
            }
            "new" => {
                self.draft = Some(Draft {
                    title: rest.to_string(),
                    ..Draft::default()
                });
                None
            }
            "title" => self.edit_draft(|d| d.title = rest.to_string()),
            "desc" => self.edit_draft(|d| d.description = rest.to_string()),
            "priority" => match rest.parse::<Priority>() {
                Ok(p) => self.edit_draft(|d| d.priority = p),
                Err(e) => {
                    self.push_notice(e.to_string());
                    None
                }
            },
            "submit" => self.submit_draft(),
            "cancel" => {
                self.draft = None;
                None
            }
            "search" => {
                self.filter.search = rest.to_string();
                None
            }
            "filter" => {
                match rest.parse::<PriorityFilter>() {
                    Ok(p) => self.filter.priority = p,
                    Err(e) => self.push_notice(e.to_string()),
                }
                None
            }
            "ids" => {
                self.show_ids = !self.show_ids;
                None
            }
            "help" | "?" => {
                self.show_help = !self.show_help;
                None
            }
            "quit" | "q" | "exit" => {
                self.should_quit = true;
                None
            }
            other => {
                self.push_notice(format!("Unknown command: {other} (type `help`)"));
                None
            }
        }
    }

    fn parse_move(&mut self, rest: &str) -> Option<Command> {
        let Some((id, column)) = rest.split_once(char::is_whitespace) else {
            self.push_notice("Usage: move <id> <todo|inprogress|done>");
            return None;
        };
        match column.trim().parse::<TaskStatus>() {
            Ok(status) => Some(Command::Move {
                id: TaskId::new(id),
                status,
            }),
            Err(e) => {
                self.push_notice(e.to_string());
                None
            }
        }
    }

    fn edit_draft(&mut self, edit: impl FnOnce(&mut Draft)) -> Option<Command> {
        match self.draft.as_mut() {
            Some(draft) => edit(draft),
            None => self.push_notice("No task form open. Type `new` first."),
        }
        None
    }

    /// Closes the form and requests a create. A blank title keeps the form
    /// open and sends nothing.
    fn submit_draft(&mut self) -> Option<Command> {
        let Some(draft) = self.draft.as_ref() else {
            self.push_notice("No task form open. Type `new` first.");
            return None;
        };
        if draft.title.trim().is_empty() {
            return None;
        }
        let new = draft.to_new_task();
        self.draft = None;
        Some(Command::Create(new))
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
    }

    fn enter_char(&mut self, c: char) {
        self.input.insert(self.cursor_position, c);
        self.cursor_position += c.len_utf8();
    }

    fn delete_char(&mut self) {
        if let Some((idx, _)) = self.input[..self.cursor_position].char_indices().next_back() {
            self.input.remove(idx);
            self.cursor_position = idx;
        }
    }

    fn move_cursor_left(&mut self) {
        if let Some((idx, _)) = self.input[..self.cursor_position].char_indices().next_back() {
            self.cursor_position = idx;
        }
    }

    fn move_cursor_right(&mut self) {
        if let Some(c) = self.input[self.cursor_position..].chars().next() {
            self.cursor_position += c.len_utf8();
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
