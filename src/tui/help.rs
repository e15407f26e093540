use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{key:<12}"), Style::default().fg(Color::Magenta)),
        Span::raw(desc),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, log_path: Option<&str>) {
    let mut lines = vec![
        Line::from("Keybinds:"),
        key_line("q / Ctrl-C", "Quit"),
        key_line("o", "Select dataset file"),
        key_line("r", "Run analysis"),
        key_line("x", "Cancel running analysis"),
        key_line("e", "Download report (raman_analysis_report.json)"),
        key_line("y", "Copy report path to clipboard"),
        key_line("tab", "Switch tabs"),
        key_line("?", "Show this help"),
        Line::from(""),
        Line::from("Parameters tab:"),
        key_line("↑/↓ or j/k", "Select parameter"),
        key_line("enter", "Edit / commit value"),
        key_line("esc", "Discard edit"),
        Line::from(""),
        Line::from(Span::styled(
            "Results are simulated: metrics are fixed and importances are random.",
            Style::default().fg(Color::Gray),
        )),
    ];
    if let Some(p) = log_path {
        lines.push(Line::from(vec![
            Span::styled("Log file: ", Style::default().fg(Color::Gray)),
            Span::raw(p.to_string()),
        ]));
    }
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
