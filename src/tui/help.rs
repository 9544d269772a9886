use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn bind(key: &'static str, pad: usize, label: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(format!("{}{}", " ".repeat(pad), label)),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        bind("tab", 9, "Switch Compose / Library"),
        bind("1 / 2", 7, "Go to Compose / Library"),
        bind("?", 11, "Toggle this help"),
        Line::from(""),
        Line::from("Compose:"),
        bind("a", 11, "Add ingredient (Enter: next field / add, Esc: cancel)"),
        bind("↑/↓ j/k", 5, "Select ingredient"),
        bind("d", 11, "Remove selected ingredient"),
        bind("x", 11, "Clear ingredient list"),
        bind("g", 11, "Generate recipe"),
        bind("s", 11, "Save generated recipe"),
        Line::from(""),
        Line::from("Library:"),
        bind("↑/↓ j/k", 5, "Navigate"),
        bind("r", 11, "Refresh"),
        bind("d", 11, "Delete selected"),
        bind("e", 11, "Export selected as JSON"),
        bind("y", 11, "Copy selected recipe to clipboard"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
