mod export;
mod help;
mod state;

use crate::backend::{HttpBackend, RecipeBackend};
use crate::cli::{build_config, Cli};
use crate::library::LibraryStatus;
use crate::model::{GeneratedRecipe, ViewState};
use crate::orchestrator::{self, AppEvent, UiCommand};
use crate::workflow::WorkflowPhase;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{key_hint, push_wrapped_status_kv, FormField, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let backend: Arc<dyn RecipeBackend> = Arc::new(HttpBackend::new(&cfg)?);

    // Unbounded channels keep the UI thread from ever blocking on a send.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let base_url = cfg.base_url.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(base_url, event_rx, cmd_tx));

    let res = orchestrator::run_controller(backend, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

fn send(cmd_tx: &UnboundedSender<UiCommand>, cmd: Option<UiCommand>) {
    if let Some(cmd) = cmd {
        debug!(?cmd, "sending command");
        let _ = cmd_tx.send(cmd);
    }
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    base_url: String,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        base_url,
        info: "Press 'a' to add an ingredient, '?' for help".into(),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    let res = loop {
        // Drain completions without blocking; each is applied exactly once.
        while let Ok(ev) = event_rx.try_recv() {
            let applied = orchestrator::apply_event(&mut state.session, ev);
            if let Some(msg) = applied.message {
                state.info = msg;
            }
            send(&cmd_tx, applied.follow_up);
            state.clamp_selection();
            dirty = true;
        }

        if dirty || last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
            dirty = false;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                dirty = true;
                if handle_key(&mut state, k, &cmd_tx) {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// Apply one key press. Returns true when the user asked to quit.
fn handle_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) -> bool {
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        return true;
    }

    if state.editing.is_some() {
        handle_form_key(state, k.code);
        return false;
    }

    match k.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => state.show_help = !state.show_help,
        KeyCode::Esc => state.show_help = false,
        KeyCode::Tab => {
            let cmd = state.toggle_view();
            send(cmd_tx, cmd);
        }
        KeyCode::Char('1') => {
            let cmd = state.select_view(ViewState::Compose);
            send(cmd_tx, cmd);
        }
        KeyCode::Char('2') => {
            let cmd = state.select_view(ViewState::Library);
            send(cmd_tx, cmd);
        }
        code => match state.active_view() {
            ViewState::Compose => handle_compose_key(state, code, cmd_tx),
            ViewState::Library => handle_library_key(state, code, cmd_tx),
        },
    }
    false
}

fn handle_form_key(state: &mut UiState, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            state.editing = None;
            state.name_input.clear();
            state.quantity_input.clear();
            state.info = "Cancelled".into();
        }
        KeyCode::Tab => {
            state.editing = match state.editing {
                Some(FormField::Name) => Some(FormField::Quantity),
                _ => Some(FormField::Name),
            };
        }
        KeyCode::Enter => match state.editing {
            Some(FormField::Name) => state.editing = Some(FormField::Quantity),
            _ => state.submit_form(),
        },
        KeyCode::Backspace => {
            if let Some(input) = state.input_mut() {
                input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(input) = state.input_mut() {
                input.push(c);
            }
        }
        _ => {}
    }
}

fn handle_compose_key(state: &mut UiState, code: KeyCode, cmd_tx: &UnboundedSender<UiCommand>) {
    match code {
        KeyCode::Char('a') => {
            state.editing = Some(FormField::Name);
            state.info = "Name, Enter, quantity (optional), Enter".into();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.ingredient_selected = state.ingredient_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.ingredient_selected + 1 < state.session.ingredients.len() {
                state.ingredient_selected += 1;
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => state.remove_selected_ingredient(),
        KeyCode::Char('x') => {
            state.session.ingredients.clear();
            state.clamp_selection();
            state.info = "Ingredient list cleared".into();
        }
        KeyCode::Char('g') => {
            let cmd = state.start_generate();
            send(cmd_tx, cmd);
        }
        KeyCode::Char('s') => {
            let cmd = state.start_save();
            send(cmd_tx, cmd);
        }
        _ => {}
    }
}

fn handle_library_key(state: &mut UiState, code: KeyCode, cmd_tx: &UnboundedSender<UiCommand>) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => {
            if state.library_selected > 0 {
                state.library_selected -= 1;
                if state.library_selected < state.library_scroll_offset {
                    state.library_scroll_offset = state.library_selected;
                }
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.library_selected + 1 < state.session.library.len() {
                state.library_selected += 1;
            }
        }
        KeyCode::Char('r') => {
            let cmd = state.start_refresh();
            send(cmd_tx, Some(cmd));
        }
        KeyCode::Char('d') => {
            let cmd = state.start_delete_selected();
            send(cmd_tx, cmd);
        }
        KeyCode::Char('e') => {
            if let Some(r) = state.selected_recipe() {
                state.info = match export::export_recipe_json(r) {
                    Ok(p) => format!("Exported JSON: {}", p.display()),
                    Err(e) => format!("JSON export failed: {e:#}"),
                };
            }
        }
        KeyCode::Char('y') => {
            if let Some(r) = state.selected_recipe() {
                state.info = match export::copy_recipe_to_clipboard(r) {
                    Ok(()) => format!("✓ Copied to clipboard: {}", r.dish_name()),
                    Err(e) => format!("Clipboard copy failed: {e:#}"),
                };
            }
        }
        _ => {}
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(4),
            ]
            .as_ref(),
        )
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from(ViewState::Compose.title()),
        Line::from(ViewState::Library.title()),
    ])
    .select(state.active_view().index())
    .block(Block::default().borders(Borders::ALL).title("recipe-cli"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    if state.show_help {
        help::draw_help(chunks[1], f);
    } else {
        match state.active_view() {
            ViewState::Compose => draw_compose(chunks[1], f, state),
            ViewState::Library => draw_library(chunks[1], f, state),
        }
    }

    draw_status(chunks[2], f, state);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines = Vec::new();
    push_wrapped_status_kv(&mut lines, "Info", &state.info, area.width);
    push_wrapped_status_kv(&mut lines, "Backend", &state.base_url, area.width);
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

fn phase_label(phase: WorkflowPhase) -> (&'static str, Color) {
    match phase {
        WorkflowPhase::Idle => ("Idle", Color::Gray),
        WorkflowPhase::Generating => ("Generating…", Color::Yellow),
        WorkflowPhase::Ready => ("Ready to save", Color::Green),
        WorkflowPhase::Saving => ("Saving…", Color::Yellow),
        WorkflowPhase::Failed => ("Failed", Color::Red),
    }
}

fn recipe_lines(recipe: &GeneratedRecipe) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            recipe.dish_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Ingredients", Style::default().fg(Color::Cyan))),
    ];
    for ing in &recipe.ingredients {
        lines.push(Line::from(format!("  • {ing}")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Instructions",
        Style::default().fg(Color::Cyan),
    )));
    for (i, step) in recipe.instructions.iter().enumerate() {
        lines.push(Line::from(format!("  {}. {}", i + 1, step)));
    }
    lines
}

fn draw_compose(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)].as_ref())
        .split(cols[0]);

    // Pending ingredients
    let ingredients = &state.session.ingredients;
    let mut lines: Vec<Line> = Vec::new();
    if ingredients.is_empty() {
        lines.push(Line::from(Span::styled(
            "No ingredients yet. Press 'a' to add one.",
            Style::default().fg(Color::Gray),
        )));
    }
    for (i, ing) in ingredients.iter().enumerate() {
        let selected = state.editing.is_none() && i == state.ingredient_selected;
        let style = if selected {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!("{:>2}. {ing}", i + 1), style)));
    }
    let title = format!("Ingredients ({})", ingredients.len());
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title)),
        left[0],
    );

    // Add form
    let field = |label: &'static str, value: &str, active: bool| {
        let style = if active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if active { "▏" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:<9}"), style),
            Span::raw(format!("{value}{cursor}")),
        ])
    };
    let form = Paragraph::new(vec![
        field("Name", &state.name_input, state.editing == Some(FormField::Name)),
        field(
            "Quantity",
            &state.quantity_input,
            state.editing == Some(FormField::Quantity),
        ),
    ])
    .block(Block::default().borders(Borders::ALL).title("Add ingredient"));
    f.render_widget(form, left[1]);

    // Candidate recipe
    let workflow = &state.session.workflow;
    let (label, color) = phase_label(workflow.phase());
    let mut lines = vec![Line::from(vec![
        Span::styled("State: ", Style::default().fg(Color::Gray)),
        Span::styled(label, Style::default().fg(color)),
    ])];
    if let Some(e) = workflow.last_error() {
        lines.push(Line::from(Span::styled(
            e.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(""));
    match workflow.candidate() {
        Some(recipe) => lines.extend(recipe_lines(recipe)),
        None => lines.push(Line::from(Span::styled(
            "No recipe generated yet.",
            Style::default().fg(Color::Gray),
        ))),
    }
    lines.push(Line::from(""));
    let mut hints = Vec::new();
    hints.extend(key_hint("a", "add"));
    hints.extend(key_hint("d", "remove"));
    hints.extend(key_hint("g", "generate"));
    if workflow.candidate().is_some() {
        hints.extend(key_hint("s", "save"));
    }
    lines.push(Line::from(hints));
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Recipe")),
        cols[1],
    );
}

fn refreshed_label(state: &UiState) -> Option<String> {
    let at = state.session.library.refreshed_at()?;
    let offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    at.to_offset(offset)
        .format(time::macros::format_description!("[hour]:[minute]:[second]"))
        .ok()
}

fn draw_library(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let library = &state.session.library;
    let message = match library.status() {
        LibraryStatus::NotLoaded => Some((
            match library.last_error() {
                Some(e) => format!("Could not load saved recipes: {e}. Press 'r' to retry."),
                None => "Saved recipes not loaded. Press 'r' to load.".to_string(),
            },
            Color::Red,
        )),
        LibraryStatus::Loading => Some(("Loading saved recipes…".to_string(), Color::Yellow)),
        LibraryStatus::Empty => Some(("No saved recipes yet.".to_string(), Color::Gray)),
        LibraryStatus::Recipes(_) => None,
    };
    if let Some((text, color)) = message {
        let p = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
            .block(Block::default().borders(Borders::ALL).title("Saved recipes"));
        f.render_widget(p, area);
        return;
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(area);

    let max_items = (cols[0].height as usize).saturating_sub(2).max(1);
    // Keep the selection visible
    let scroll_offset = {
        let mut offset = state.library_scroll_offset;
        if state.library_selected < offset {
            offset = state.library_selected;
        } else if state.library_selected >= offset + max_items {
            offset = state.library_selected + 1 - max_items;
        }
        offset
    };

    let lines: Vec<Line> = library
        .recipes()
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(max_items)
        .map(|(i, r)| {
            let style = if i == state.library_selected {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(Span::styled(r.dish_name().to_string(), style))
        })
        .collect();
    let mut title = format!("Saved recipes ({}/{})", state.library_selected + 1, library.len());
    if library.is_loading() {
        title.push_str(" ⟳");
    } else if let Some(at) = refreshed_label(state) {
        title.push_str(&format!(" @ {at}"));
    }
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title)),
        cols[0],
    );

    let mut detail = Vec::new();
    if let Some(r) = state.selected_recipe() {
        detail.push(Line::from(vec![
            Span::styled("id: ", Style::default().fg(Color::Gray)),
            Span::raw(r.id.clone()),
        ]));
        detail.extend(recipe_lines(&r.recipe));
    }
    detail.push(Line::from(""));
    let mut hints = Vec::new();
    hints.extend(key_hint("r", "refresh"));
    hints.extend(key_hint("d", "delete"));
    hints.extend(key_hint("e", "export"));
    hints.extend(key_hint("y", "copy"));
    detail.push(Line::from(hints));
    f.render_widget(
        Paragraph::new(detail)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Details")),
        cols[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use crate::model::{Ingredient, SavedRecipe};

    fn press(state: &mut UiState, tx: &UnboundedSender<UiCommand>, code: KeyCode) -> bool {
        handle_key(state, KeyEvent::new(code, KeyModifiers::NONE), tx)
    }

    fn type_text(state: &mut UiState, tx: &UnboundedSender<UiCommand>, text: &str) {
        for c in text.chars() {
            press(state, tx, KeyCode::Char(c));
        }
    }

    #[test]
    fn form_keys_add_an_ingredient() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        press(&mut state, &tx, KeyCode::Char('a'));
        type_text(&mut state, &tx, "flour");
        press(&mut state, &tx, KeyCode::Enter);
        type_text(&mut state, &tx, "2 cups");
        press(&mut state, &tx, KeyCode::Enter);
        assert_eq!(state.session.ingredients.display_lines(), ["2 cups of flour"]);
        // 'q' typed in the form is text, not quit
        press(&mut state, &tx, KeyCode::Char('a'));
        assert!(!press(&mut state, &tx, KeyCode::Char('q')));
        assert_eq!(state.name_input, "q");
    }

    #[test]
    fn generate_key_sends_one_command_and_rejects_overlap() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        state.session.ingredients.add("egg", None).unwrap();
        press(&mut state, &tx, KeyCode::Char('g'));
        press(&mut state, &tx, KeyCode::Char('g'));
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Generate(_))));
        assert!(rx.try_recv().is_err());
        assert_eq!(
            state.info,
            "cannot generate recipe while another request is in flight"
        );
    }

    #[test]
    fn tab_into_library_refreshes_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        press(&mut state, &tx, KeyCode::Tab);
        press(&mut state, &tx, KeyCode::Char('2'));
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Refresh(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn save_flow_through_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        state.session.ingredients.add("egg", None).unwrap();
        press(&mut state, &tx, KeyCode::Char('g'));
        let Ok(UiCommand::Generate(g)) = rx.try_recv() else {
            panic!("expected generate command");
        };
        let recipe = GeneratedRecipe {
            dish_name: "Omelette".into(),
            ingredients: vec![Ingredient::new("egg", Some("2".into()))],
            instructions: vec!["Whisk".into(), "Fry".into()],
        };
        orchestrator::apply_event(
            &mut state.session,
            AppEvent::Generated {
                seq: g.seq,
                result: Ok(recipe.clone()),
            },
        );

        press(&mut state, &tx, KeyCode::Char('s'));
        let Ok(UiCommand::Save(s)) = rx.try_recv() else {
            panic!("expected save command");
        };
        let applied = orchestrator::apply_event(
            &mut state.session,
            AppEvent::Saved {
                seq: s.seq,
                result: Ok(SavedRecipe {
                    id: "42".into(),
                    recipe,
                }),
            },
        );
        assert_eq!(state.active_view(), ViewState::Library);
        assert!(matches!(applied.follow_up, Some(UiCommand::Refresh(_))));
    }

    #[test]
    fn library_delete_targets_selected_recipe() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        press(&mut state, &tx, KeyCode::Tab);
        let Ok(UiCommand::Refresh(t)) = rx.try_recv() else {
            panic!("expected refresh command");
        };
        let list = ["1", "2"]
            .iter()
            .map(|id| SavedRecipe {
                id: id.to_string(),
                recipe: GeneratedRecipe {
                    dish_name: format!("Dish {id}"),
                    ingredients: vec![],
                    instructions: vec![],
                },
            })
            .collect();
        state.session.finish_refresh(t, Ok(list)).unwrap();
        press(&mut state, &tx, KeyCode::Char('j'));
        press(&mut state, &tx, KeyCode::Char('d'));
        match rx.try_recv() {
            Ok(UiCommand::Delete(d)) => assert_eq!(d.id, "2"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn failed_refresh_keeps_library_usable() {
        let mut state = UiState::default();
        let t = state.session.select_view(ViewState::Library).unwrap();
        let applied = orchestrator::apply_event(
            &mut state.session,
            AppEvent::Refreshed {
                ticket: t,
                result: Err(CollaboratorError::Transport {
                    operation: crate::error::Operation::ListRecipes,
                    message: "connection refused".into(),
                }),
            },
        );
        assert!(applied
            .message
            .as_deref()
            .is_some_and(|m| m.starts_with("Refresh failed")));
        assert_eq!(state.session.library.status(), LibraryStatus::NotLoaded);
    }

    #[test]
    fn ctrl_c_quits_even_while_editing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut state = UiState {
            editing: Some(FormField::Name),
            ..Default::default()
        };
        assert!(handle_key(
            &mut state,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &tx
        ));
    }
}
