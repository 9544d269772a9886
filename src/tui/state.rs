use crate::model::{SavedRecipe, ViewState};
use crate::orchestrator::UiCommand;
use crate::session::Session;
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};

/// Which compose form field is receiving keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Quantity,
}

/// Everything the UI thread owns. The session is only mutated here.
pub struct UiState {
    pub session: Session,
    pub base_url: String,
    pub info: String,
    pub show_help: bool,

    // Compose form
    pub editing: Option<FormField>,
    pub name_input: String,
    pub quantity_input: String,
    pub ingredient_selected: usize,

    // Library list
    pub library_selected: usize,
    pub library_scroll_offset: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            session: Session::new(),
            base_url: String::new(),
            info: String::new(),
            show_help: false,
            editing: None,
            name_input: String::new(),
            quantity_input: String::new(),
            ingredient_selected: 0,
            library_selected: 0,
            library_scroll_offset: 0,
        }
    }
}

impl UiState {
    pub fn active_view(&self) -> ViewState {
        self.session.view.active()
    }

    pub fn selected_recipe(&self) -> Option<&SavedRecipe> {
        self.session.library.get(self.library_selected)
    }

    /// Keep both selections inside their lists after any mutation.
    pub fn clamp_selection(&mut self) {
        let n = self.session.ingredients.len();
        if self.ingredient_selected >= n {
            self.ingredient_selected = n.saturating_sub(1);
        }
        let n = self.session.library.len();
        if self.library_selected >= n {
            self.library_selected = n.saturating_sub(1);
        }
        if self.library_scroll_offset > self.library_selected {
            self.library_scroll_offset = self.library_selected;
        }
    }

    pub fn input_mut(&mut self) -> Option<&mut String> {
        match self.editing? {
            FormField::Name => Some(&mut self.name_input),
            FormField::Quantity => Some(&mut self.quantity_input),
        }
    }

    /// Add the form's ingredient. The form is kept when the name is blank so
    /// the user can fix it.
    pub fn submit_form(&mut self) {
        let quantity = Some(self.quantity_input.clone());
        match self.session.ingredients.add(self.name_input.clone(), quantity) {
            Ok(idx) => {
                self.info = format!("Added: {}", self.session.ingredients.as_slice()[idx]);
                self.ingredient_selected = idx;
                self.name_input.clear();
                self.quantity_input.clear();
                self.editing = None;
            }
            Err(e) => {
                self.info = e.to_string();
                self.editing = Some(FormField::Name);
            }
        }
    }

    pub fn remove_selected_ingredient(&mut self) {
        if let Some(removed) = self.session.ingredients.remove(self.ingredient_selected) {
            self.info = format!("Removed: {removed}");
        }
        self.clamp_selection();
    }

    pub fn start_generate(&mut self) -> Option<UiCommand> {
        match self.session.begin_generate() {
            Ok(ticket) => {
                self.info = "Generating…".into();
                Some(UiCommand::Generate(ticket))
            }
            Err(e) => {
                self.info = e.to_string();
                None
            }
        }
    }

    pub fn start_save(&mut self) -> Option<UiCommand> {
        match self.session.begin_save() {
            Ok(ticket) => {
                self.info = "Saving…".into();
                Some(UiCommand::Save(ticket))
            }
            Err(e) => {
                self.info = e.to_string();
                None
            }
        }
    }

    pub fn start_delete_selected(&mut self) -> Option<UiCommand> {
        let id = self.selected_recipe()?.id.clone();
        self.info = format!("Deleting {id}…");
        Some(UiCommand::Delete(self.session.begin_delete(id)))
    }

    pub fn start_refresh(&mut self) -> UiCommand {
        self.info = "Refreshing…".into();
        UiCommand::Refresh(self.session.begin_refresh())
    }

    pub fn select_view(&mut self, view: ViewState) -> Option<UiCommand> {
        let refresh = self.session.select_view(view)?;
        self.library_selected = 0;
        self.library_scroll_offset = 0;
        Some(UiCommand::Refresh(refresh))
    }

    pub fn toggle_view(&mut self) -> Option<UiCommand> {
        let next = match self.active_view() {
            ViewState::Compose => ViewState::Library,
            ViewState::Library => ViewState::Compose,
        };
        self.select_view(next)
    }
}

pub fn key_hint(key: &'static str, label: &'static str) -> Vec<Span<'static>> {
    vec![
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(format!(": {label}  ")),
    ]
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}
