use std::io::IsTerminal;

use colored::Colorize;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use super::{load, parse_level, resolve_source};
use crate::error::Result;
use crate::fmt::amount;
use crate::models::{Level, Record};
use crate::reports::{self, Slice};
use crate::settings::{load_settings, Settings};
use crate::sort::SortKey;
use crate::tui::{run_view, ScreenView, ViewAction, FOOTER_STYLE, HEADER_STYLE};

const BAR_WIDTH: usize = 40;

/// Levels worth charting; Summary rows are totals, not allocations.
const CHART_LEVELS: [Level; 5] = [
    Level::Department,
    Level::Agency,
    Level::SubAgency,
    Level::SpecialPurposeFund,
    Level::SpfAgency,
];

fn next_in<T: PartialEq + Clone>(items: &[T], current: &T) -> T {
    let pos = items.iter().position(|x| x == current).unwrap_or(0);
    items[(pos + 1) % items.len()].clone()
}

/// Horizontal text bars scaled to the largest slice.
pub fn render_text(slices: &[Slice], title: &str, unit: &str) -> String {
    let mut out = format!("{} ({unit})\n", title.bold());
    if slices.is_empty() {
        out.push_str("No rows at this level.\n");
        return out;
    }
    let max = slices.iter().map(|s| s.value.abs()).fold(0.0_f64, f64::max);
    let label_width = slices.iter().map(|s| s.label.chars().count()).max().unwrap_or(0);
    for s in slices {
        let len = if max > 0.0 {
            ((s.value.abs() / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let bar = "\u{2588}".repeat(len);
        let bar = if s.value < 0.0 { bar.red() } else { bar.cyan() };
        out.push_str(&format!(
            "{:<label_width$}  {bar} {}\n",
            s.label,
            amount(s.value)
        ));
    }
    out
}

fn title(level: &Level, key: SortKey, n: usize) -> String {
    format!("Top {n} {level} rows by {key}")
}

pub struct ChartView {
    records: Vec<Record>,
    settings: Settings,
    level: Level,
    key: SortKey,
    top: usize,
}

impl ChartView {
    pub fn new(records: Vec<Record>, settings: Settings, level: Level, key: SortKey, top: usize) -> Self {
        Self {
            records,
            settings,
            level,
            key,
            top,
        }
    }

    fn slices(&self, label_width: usize) -> Vec<Slice> {
        reports::top_slices(&self.records, &self.level, self.key, self.top, label_width)
    }
}

impl ScreenView for ChartView {
    fn draw(&mut self, frame: &mut Frame) {
        let [title_area, chart_area, keys_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(
            Paragraph::new(format!(
                "{} ({})",
                title(&self.level, self.key, self.top),
                self.settings.unit_label
            ))
            .style(HEADER_STYLE),
            title_area,
        );

        let slices = self.slices(self.settings.name_width.min(28));
        let bars: Vec<Bar> = slices
            .iter()
            .map(|s| {
                let color = if s.label == reports::OTHERS_LABEL {
                    Color::DarkGray
                } else {
                    Color::Cyan
                };
                Bar::default()
                    .value(s.value.abs().round() as u64)
                    .label(Line::from(s.label.clone()))
                    .text_value(amount(s.value))
                    .style(Style::default().fg(color))
            })
            .collect();

        let chart = BarChart::default()
            .block(Block::default().borders(Borders::ALL))
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, chart_area);

        frame.render_widget(
            Paragraph::new("l:level  s:amount column  q:quit").style(FOOTER_STYLE),
            keys_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Char('l') => self.level = next_in(&CHART_LEVELS, &self.level),
            KeyCode::Char('s') => self.key = next_in(&SortKey::ALL, &self.key),
            _ => {}
        }
        ViewAction::Continue
    }
}

pub fn run(
    source: Option<&str>,
    level: Option<&str>,
    sort: Option<&str>,
    top: Option<usize>,
    text: bool,
) -> Result<()> {
    let settings = load_settings();
    let level = parse_level(level)?.unwrap_or(Level::Department);
    let key: SortKey = match sort {
        Some(s) => s.parse()?,
        None => SortKey::Senate,
    };
    let top = top.unwrap_or(settings.top_n);
    let dataset = load(&resolve_source(source));

    if text || !std::io::stdout().is_terminal() {
        let slices = reports::top_slices(&dataset.records, &level, key, top, settings.name_width);
        print!("{}", render_text(&slices, &title(&level, key, top), &settings.unit_label));
        return Ok(());
    }

    let mut view = ChartView::new(dataset.records, settings, level, key, top);
    run_view(&mut view)
}
