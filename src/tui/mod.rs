mod charts;
mod export;
mod help;
mod state;

use crate::cli::{build_config, queue_initial_commands, Cli};
use crate::model::{AnalysisEvent, AnalysisParameters, ParamField, UploadedDataset};
use crate::orchestrator::{self, RunController, UiCommand};
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
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs},
    Terminal,
};
use state::{apply_event, InputMode, UiState, TAB_TITLES};
use std::{io, path::PathBuf, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use charts::{CNN_COLOR, VIP_COLOR};
use export::{copy_to_clipboard, display_path};
use help::draw_help;

pub async fn run(args: Cli) -> Result<()> {
    let log_path = crate::logging::init_file("info").ok();
    let cfg = build_config(&args);

    // Unbounded channels: the UI thread never blocks the controller and vice versa.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AnalysisEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let mut controller = RunController::new(AnalysisParameters::default(), event_tx);

    // Resolve the dataset before taking over the terminal so errors print normally.
    queue_initial_commands(&args, &cmd_tx)?;
    if args.run_on_launch {
        let _ = cmd_tx.send(UiCommand::StartRun);
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let log_display = log_path.map(|p| p.display().to_string());
    let ui_handle = std::thread::spawn(move || run_threaded(log_display, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&cfg, &mut controller, cmd_rx).await;

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

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    log_path: Option<String>,
    mut event_rx: UnboundedReceiver<AnalysisEvent>,
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
        log_path,
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
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

/// Handle one key press. Returns `true` when the user asked to quit.
fn handle_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) -> bool {
    if k.modifiers == KeyModifiers::CONTROL && k.code == KeyCode::Char('c') {
        return true;
    }

    // Text entry swallows keys until committed or discarded.
    match std::mem::replace(&mut state.input, InputMode::Normal) {
        InputMode::DatasetPath(mut buf) => {
            match k.code {
                KeyCode::Enter => submit_dataset_path(state, &buf, cmd_tx),
                KeyCode::Esc => state.set_info("Dataset selection cancelled".into(), false),
                KeyCode::Backspace => {
                    buf.pop();
                    state.input = InputMode::DatasetPath(buf);
                }
                KeyCode::Char(c) => {
                    buf.push(c);
                    state.input = InputMode::DatasetPath(buf);
                }
                _ => state.input = InputMode::DatasetPath(buf),
            }
            return false;
        }
        InputMode::EditParam { field, mut buffer } => {
            match k.code {
                KeyCode::Enter => {
                    let _ = cmd_tx.send(UiCommand::UpdateParameter {
                        name: field.name().to_string(),
                        raw: buffer,
                    });
                }
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    buffer.pop();
                    state.input = InputMode::EditParam { field, buffer };
                }
                KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E') => {
                    buffer.push(c);
                    state.input = InputMode::EditParam { field, buffer };
                }
                _ => state.input = InputMode::EditParam { field, buffer },
            }
            return false;
        }
        InputMode::Normal => {}
    }

    match k.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('o') => {
            state.input = InputMode::DatasetPath(String::new());
            state.set_info("Enter dataset path, then press Enter".into(), false);
        }
        KeyCode::Char('r') => {
            let _ = cmd_tx.send(UiCommand::StartRun);
        }
        KeyCode::Char('x') => {
            if state.run_state.is_running() {
                state.set_info("Cancelling…".into(), false);
                let _ = cmd_tx.send(UiCommand::Cancel);
            }
        }
        KeyCode::Char('e') => {
            if state.bundle.is_some() {
                let _ = cmd_tx.send(UiCommand::ExportReport);
            } else {
                state.set_info("No completed analysis to export yet.".into(), false);
            }
        }
        KeyCode::Char('y') => match state.last_exported_path.clone() {
            Some(path) => match copy_to_clipboard(&path) {
                Ok(_) => state.set_info(
                    format!("✓ Copied to clipboard: {}", display_path(&path)),
                    false,
                ),
                Err(e) => state.set_info(format!("Clipboard copy failed: {e:#}"), true),
            },
            None => state.set_info("No report downloaded yet. Press 'e' first.".into(), false),
        },
        KeyCode::Tab => state.tab = (state.tab + 1) % TAB_TITLES.len(),
        KeyCode::Char('?') => state.tab = TAB_TITLES.len() - 1,
        KeyCode::Up | KeyCode::Char('k') if state.tab == 2 => state.select_prev_param(),
        KeyCode::Down | KeyCode::Char('j') if state.tab == 2 => state.select_next_param(),
        KeyCode::Enter if state.tab == 2 => {
            let field = state.selected_field();
            state.input = InputMode::EditParam {
                field,
                buffer: state.parameters.display_value(field),
            };
        }
        _ => {}
    }
    false
}

fn submit_dataset_path(state: &mut UiState, raw: &str, cmd_tx: &UnboundedSender<UiCommand>) {
    let path = PathBuf::from(raw.trim());
    match UploadedDataset::from_path(&path) {
        Ok(ds) => {
            let _ = cmd_tx.send(UiCommand::SelectDataset(ds));
        }
        Err(e) => {
            state.set_info(format!("Could not select dataset: {e:#}"), true);
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let tabs = Tabs::new(TAB_TITLES.iter().map(|t| Line::from(*t)).collect::<Vec<_>>())
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("raman-compare"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_overview(chunks[1], f, state),
        1 => charts::draw_features(f, chunks[1], state),
        2 => draw_parameters(chunks[1], f, state),
        _ => draw_help(chunks[1], f, state.log_path.as_deref()),
    }

    draw_status(chunks[2], f, state);
}

fn draw_overview(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(area);

    let dataset_line = match &state.dataset {
        Some(ds) => Line::from(vec![
            Span::styled("Dataset: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{} ({:.2} MB)", ds.name, ds.size_mb())),
        ]),
        None => Line::from(Span::styled(
            "No dataset selected (press 'o')",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(
        Paragraph::new(dataset_line).block(Block::default().borders(Borders::ALL).title("Input")),
        rows[0],
    );

    charts::draw_progress(f, rows[1], state);

    let Some(bundle) = state.bundle.as_ref() else {
        let p = Paragraph::new("Results appear here once an analysis completes.")
            .block(Block::default().borders(Borders::ALL).title("Results"));
        f.render_widget(p, rows[2]);
        return;
    };

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);
    let winner = bundle.comparison.winner.as_str();
    charts::draw_method_card(
        f,
        cards[0],
        &bundle.vip_results,
        bundle.comparison.stability.vip,
        VIP_COLOR,
        bundle.vip_results.method == winner,
    );
    charts::draw_method_card(
        f,
        cards[1],
        &bundle.cnn_results,
        bundle.comparison.stability.cnn,
        CNN_COLOR,
        bundle.cnn_results.method == winner,
    );
    charts::draw_comparison(f, rows[3], &bundle.comparison);
}

fn draw_parameters(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let items: Vec<ListItem> = ParamField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let value = match &state.input {
                InputMode::EditParam { field: editing, buffer } if editing == field => {
                    format!("{buffer}_")
                }
                _ => state.parameters.display_value(*field),
            };
            let style = if i == state.param_selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<22}", field.label()), style),
                Span::raw(value),
            ]))
        })
        .collect();

    let title = match state.result_parameters {
        Some(p) if p != state.parameters => "Parameters (changed since last run)",
        _ => "Parameters",
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let line = match &state.input {
        InputMode::DatasetPath(buf) => Line::from(vec![
            Span::styled("Dataset path: ", Style::default().fg(Color::Cyan)),
            Span::raw(format!("{buf}_")),
        ]),
        _ => {
            let color = if state.info_is_error {
                Color::Red
            } else {
                Color::White
            };
            Line::from(Span::styled(state.info.clone(), Style::default().fg(color)))
        }
    };
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Status")),
        area,
    );
}
