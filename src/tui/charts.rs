use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};

use super::state::UiState;
use crate::metrics;
use crate::model::{ComparisonSummary, MethodResult, RunState};

pub const VIP_COLOR: Color = Color::Blue;
pub const CNN_COLOR: Color = Color::Magenta;

/// Number of importance bars shown per method.
const IMPORTANCE_BARS: usize = 10;

pub fn draw_progress(f: &mut Frame, area: Rect, state: &UiState) {
    let label = match &state.run_state {
        RunState::Idle => "Idle".to_string(),
        RunState::Running { progress, message } => format!("{progress}%  {message}"),
        RunState::Complete => "Complete".to_string(),
    };
    let color = match state.run_state {
        RunState::Complete => Color::Green,
        _ => Color::Cyan,
    };
    let g = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Analysis"))
        .gauge_style(Style::default().fg(color))
        .percent(u16::from(state.progress()))
        .label(label);
    f.render_widget(g, area);
}

pub fn draw_method_card(
    f: &mut Frame,
    area: Rect,
    m: &MethodResult,
    stability: f64,
    color: Color,
    is_winner: bool,
) {
    let mut title = vec![Span::styled(
        m.method.clone(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if is_winner {
        title.push(Span::styled(" ★ winner", Style::default().fg(Color::Yellow)));
    }

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Accuracy: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{:.1}%", m.accuracy * 100.0)),
        ]),
        Line::from(vec![
            Span::styled("AUC:      ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{:.3}", m.auc)),
        ]),
        Line::from(vec![
            Span::styled("Stability:", Style::default().fg(Color::Gray)),
            Span::raw(format!(" {:.2}", stability)),
        ]),
    ];
    if let Some(s) = metrics::compute_fold_stats(&m.cv_scores) {
        lines.push(Line::from(vec![
            Span::styled("CV:       ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{:.3} ± {:.3}", s.mean, s.stddev)),
        ]));
    }
    let top: Vec<String> = m.top_features.iter().map(|w| w.to_string()).collect();
    lines.push(Line::from(vec![
        Span::styled("Top cm⁻¹: ", Style::default().fg(Color::Gray)),
        Span::raw(top.join(", ")),
    ]));

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Line::from(title)),
    );
    f.render_widget(p, area);
}

pub fn draw_comparison(f: &mut Frame, area: Rect, c: &ComparisonSummary) {
    let (verdict, color) = if c.is_significant {
        ("significant", Color::Green)
    } else {
        ("not significant", Color::Yellow)
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("p-value: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{:.3} ", c.p_value)),
            Span::styled(format!("({verdict})"), Style::default().fg(color)),
        ]),
        Line::from(vec![
            Span::styled("Winner:  ", Style::default().fg(Color::Gray)),
            Span::styled(
                c.winner.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Statistical comparison"),
    );
    f.render_widget(p, area);
}

/// Vertical bars of per-fold accuracy.
pub fn draw_cv_chart(f: &mut Frame, area: Rect, m: &MethodResult, color: Color) {
    let bars: Vec<Bar> = m
        .cv_scores
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Bar::default()
                .value((s * 1000.0).round() as u64)
                .label(Line::from(format!("F{}", i + 1)))
                .text_value(format!("{:.3}", s))
                .style(Style::default().fg(color))
        })
        .collect();
    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{}: CV accuracy", m.method)),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(7)
        .bar_gap(1)
        .max(1000);
    f.render_widget(chart, area);
}

/// Horizontal bars of the strongest importance scores.
pub fn draw_importance(f: &mut Frame, area: Rect, m: &MethodResult, color: Color) {
    let bars: Vec<Bar> = metrics::top_k_indices(&m.feature_importance, IMPORTANCE_BARS)
        .into_iter()
        .map(|i| {
            let v = m.feature_importance[i];
            Bar::default()
                .value((v * 100.0).round() as u64)
                .label(Line::from(format!("#{:02}", i + 1)))
                .text_value(format!("{:.2}", v))
                .style(Style::default().fg(color))
        })
        .collect();
    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{}: feature importance", m.method)),
        )
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .max(100);
    f.render_widget(chart, area);
}

pub fn draw_features(f: &mut Frame, area: Rect, state: &UiState) {
    let Some(bundle) = state.bundle.as_ref() else {
        let p = Paragraph::new("No results yet. Run an analysis with 'r'.")
            .block(Block::default().borders(Borders::ALL).title("Features"));
        f.render_widget(p, area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    draw_cv_chart(f, top[0], &bundle.vip_results, VIP_COLOR);
    draw_cv_chart(f, top[1], &bundle.cnn_results, CNN_COLOR);
    draw_importance(f, bottom[0], &bundle.vip_results, VIP_COLOR);
    draw_importance(f, bottom[1], &bundle.cnn_results, CNN_COLOR);
}
