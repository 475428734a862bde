use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    DefaultTerminal, Frame,
};

use crate::error::Result;
use crate::export::{self, ExportFormat};
use crate::fmt::{money, truncate};
use crate::loader::{BackgroundLoad, Dataset};
use crate::models::Level;
use crate::reports::{self, Totals, TotalsBasis};
use crate::settings::Settings;
use crate::sort::SortKey;
use crate::tui::{self, FOOTER_STYLE, HEADER_STYLE, PLACEHOLDER_STYLE, SELECTED_STYLE};
use crate::view::{self, Derived, ViewState, VisibleRow};

const PAGE_SIZE: usize = 20;
const CHART_HEIGHT: u16 = 12;
const POLL_INTERVAL: Duration = Duration::from_millis(200);

enum BrowseMode {
    Normal,
    Search { input: String, previous: String },
}

pub enum BrowseAction {
    Continue,
    Close,
    Export(ExportFormat),
    Reload,
}

pub struct BudgetBrowser {
    dataset: Dataset,
    settings: Settings,
    state: ViewState,
    derived: Derived,
    totals: Totals,
    offset: usize,
    cursor: usize,
    visible_count: usize,
    mode: BrowseMode,
    show_chart: bool,
    status_message: Option<String>,
    loads: BackgroundLoad,
    table_state: TableState,
}

impl BudgetBrowser {
    pub fn new(dataset: Dataset, settings: Settings, state: ViewState) -> Self {
        let derived = view::derive(&dataset.records, &state);
        let totals = reports::totals(&derived.filtered);
        let status_message = dataset
            .load_error
            .as_ref()
            .map(|e| format!("Load failed: {e}"));
        Self {
            dataset,
            settings,
            state,
            derived,
            totals,
            offset: 0,
            cursor: 0,
            visible_count: PAGE_SIZE,
            mode: BrowseMode::Normal,
            show_chart: false,
            status_message,
            loads: BackgroundLoad::new(),
            table_state: TableState::default(),
        }
    }

    fn selected_row(&self) -> Option<&VisibleRow> {
        self.derived.rows.get(self.cursor)
    }

    /// Replace the view state and recompute everything derived from it.
    fn set_state(&mut self, state: ViewState) {
        self.state = state;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.derived = view::derive(&self.dataset.records, &self.state);
        self.totals = reports::totals(&self.derived.filtered);
        let len = self.derived.rows.len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
        self.offset = self.offset.min(self.cursor);
    }

    fn apply_dataset(&mut self, dataset: Dataset) {
        self.status_message = Some(match &dataset.load_error {
            Some(e) => format!("Reload failed: {e}"),
            None => format!("Reloaded {} rows", dataset.records.len()),
        });
        self.dataset = dataset;
        self.recompute();
    }

    pub fn export_rows(&self) -> Vec<crate::models::Record> {
        export::rows_for(&self.dataset.records, &self.state)
    }

    fn export(&mut self, format: ExportFormat) -> Result<PathBuf> {
        let path = export::default_path(&self.settings.export_dir(), format);
        export::write_export(&self.export_rows(), format, &path)?;
        Ok(path)
    }

    pub fn run(&mut self) -> Result<()> {
        tui::install_panic_hook();
        let mut terminal = ratatui::init();
        let result = self.event_loop(&mut terminal);
        // Anything still loading belongs to a view that no longer exists.
        self.loads.cancel();
        ratatui::restore();
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw_frame(frame))?;

            if let Some(dataset) = self.loads.poll() {
                self.apply_dataset(dataset);
                continue;
            }

            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
            {
                if kind != KeyEventKind::Press {
                    continue;
                }
                if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
                    break;
                }

                match self.handle_key_event(code) {
                    BrowseAction::Close => break,
                    BrowseAction::Continue => {}
                    BrowseAction::Export(format) => match self.export(format) {
                        Ok(path) => {
                            self.status_message = Some(format!("Wrote {}", path.display()));
                        }
                        Err(e) => self.status_message = Some(format!("Export failed: {e}")),
                    },
                    BrowseAction::Reload => {
                        let generation = self.loads.start(self.dataset.source.clone());
                        tracing::debug!("Reload {generation} started for {}", self.dataset.source);
                        self.status_message = Some(format!("Loading {}\u{2026}", self.dataset.source));
                    }
                }
            }
        }
        Ok(())
    }

    /// Handle a key event. Returns a BrowseAction indicating what the caller should do.
    pub fn handle_key_event(&mut self, code: KeyCode) -> BrowseAction {
        if matches!(self.mode, BrowseMode::Search { .. }) {
            self.handle_search_key(code);
            return BrowseAction::Continue;
        }
        self.status_message = None;

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return BrowseAction::Close,
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::PageDown => self.move_cursor(self.visible_count as isize),
            KeyCode::PageUp => self.move_cursor(-(self.visible_count as isize)),
            KeyCode::Home => {
                self.cursor = 0;
                self.offset = 0;
            }
            KeyCode::End => {
                self.cursor = self.derived.rows.len().saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(None),
            KeyCode::Right => self.toggle_selected(Some(true)),
            KeyCode::Left => self.toggle_selected(Some(false)),
            KeyCode::Char('/') => {
                self.mode = BrowseMode::Search {
                    input: self.state.search.clone(),
                    previous: self.state.search.clone(),
                };
            }
            KeyCode::Char('l') => {
                let next = self.state.next_level();
                self.set_state(self.state.clone().with_level(next));
            }
            KeyCode::Char(c @ '1'..='5') => {
                let idx = c as usize - '1' as usize;
                self.set_state(self.state.clone().click_sort(SortKey::ALL[idx]));
            }
            KeyCode::Char('0') => self.set_state(self.state.clone().with_sort(None)),
            KeyCode::Char('e') => {
                let state = self.state.clone().expand_all(&self.derived.tree);
                self.set_state(state);
            }
            KeyCode::Char('c') => self.set_state(self.state.clone().collapse_all()),
            KeyCode::Char('g') => self.show_chart = !self.show_chart,
            KeyCode::Char('x') => return BrowseAction::Export(ExportFormat::Csv),
            KeyCode::Char('J') => return BrowseAction::Export(ExportFormat::Json),
            KeyCode::Char('r') => return BrowseAction::Reload,
            _ => {}
        }
        BrowseAction::Continue
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        let BrowseMode::Search { input, previous } = &mut self.mode else {
            return;
        };
        match code {
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => {
                self.mode = BrowseMode::Normal;
                return;
            }
            KeyCode::Esc => {
                let restored = previous.clone();
                self.mode = BrowseMode::Normal;
                self.set_state(self.state.clone().with_search(restored));
                return;
            }
            _ => return,
        }
        // Search narrows live as the user types.
        let term = input.clone();
        self.cursor = 0;
        self.offset = 0;
        self.set_state(self.state.clone().with_search(term));
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.derived.rows.len();
        if len == 0 {
            return;
        }
        let target = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = target as usize;
    }

    /// `Some(true)` expands, `Some(false)` collapses, `None` toggles.
    fn toggle_selected(&mut self, want_open: Option<bool>) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let Some(key) = row.key.clone() else {
            return;
        };
        if !row.expandable {
            return;
        }
        if want_open.is_some_and(|open| open == row.expanded) {
            return;
        }
        self.set_state(self.state.clone().toggle(key));
    }

    fn keep_cursor_visible(&mut self) {
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.visible_count {
            self.offset = self.cursor + 1 - self.visible_count;
        }
    }

    fn name_cell(&self, row: &VisibleRow, width: usize) -> Cell<'static> {
        let marker = if !row.expandable {
            "  "
        } else if row.expanded {
            "\u{25be} "
        } else {
            "\u{25b8} "
        };
        let indent = "  ".repeat(row.depth);
        let budget = width.saturating_sub(indent.len() + 2).min(self.settings.name_width);
        let name = truncate(row.record.display_name(), budget);
        let text = format!("{indent}{marker}{name}");
        if row.placeholder {
            Cell::from(Span::styled(text, PLACEHOLDER_STYLE))
        } else {
            Cell::from(text)
        }
    }

    fn totals_line(&self) -> String {
        let sym = &self.settings.currency_symbol;
        let basis = match &self.totals.basis {
            TotalsBasis::SummaryRow => "from total row".to_string(),
            TotalsBasis::Computed(level) => format!("sum of {level} rows"),
            TotalsBasis::Empty => "no data".to_string(),
        };
        format!(
            "House {}  Senate {}  Net {}  ({}, {basis})",
            money(self.totals.house, sym),
            money(self.totals.senate, sym),
            money(self.totals.net, sym),
            self.settings.unit_label,
        )
    }

    /// Draw the browser into the given frame.
    pub fn draw_frame(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let narrow = area.width < 100;
        let chart_height = if self.show_chart { CHART_HEIGHT } else { 0 };

        let [title_area, totals_area, table_area, chart_area, status_area, keys_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(chart_height),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(format!("Budget: {}", self.dataset.source)).style(HEADER_STYLE),
            title_area,
        );
        frame.render_widget(Paragraph::new(self.totals_line()), totals_area);

        let header_overhead = 2u16;
        self.visible_count = (table_area.height.saturating_sub(header_overhead) as usize).max(1);
        self.keep_cursor_visible();

        let amount_cols: Vec<SortKey> = if narrow {
            vec![SortKey::Senate, SortKey::Net]
        } else {
            SortKey::ALL.to_vec()
        };
        let name_width = table_area
            .width
            .saturating_sub(amount_cols.len() as u16 * 15 + 12) as usize;

        let rendered_rows: Vec<Row> = self
            .derived
            .rows
            .iter()
            .skip(self.offset)
            .take(self.visible_count)
            .map(|row| {
                let mut cells = vec![
                    self.name_cell(row, name_width),
                    Cell::from(row.record.display_code().to_string()),
                ];
                for key in &amount_cols {
                    let value = reports::chart_value(&row.record, *key);
                    cells.push(match key {
                        SortKey::Net | SortKey::Increase => Cell::from(tui::delta_span(value)),
                        _ => Cell::from(tui::amount_span(value)),
                    });
                }
                Row::new(cells)
            })
            .collect();

        let mut widths = vec![Constraint::Fill(1), Constraint::Length(10)];
        widths.extend(amount_cols.iter().map(|_| Constraint::Length(14)));

        let mut header_cells = vec!["Name".to_string(), "Code".to_string()];
        for key in &amount_cols {
            let arrow = match self.state.sort {
                Some(s) if s.key == *key => s.direction.arrow(),
                _ => "",
            };
            header_cells.push(format!("{}{arrow}", key.label()));
        }

        self.table_state.select(if self.derived.rows.is_empty() {
            None
        } else {
            Some(self.cursor - self.offset)
        });
        let table = Table::new(rendered_rows, widths)
            .header(Row::new(header_cells).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);

        if self.show_chart {
            self.draw_chart(frame, chart_area);
        }

        let filters = self.state.describe();
        let mut status = format!(
            "Rows {} of {} shown | {} departments, {} agencies",
            self.derived.rows.len(),
            self.derived.filtered.len(),
            self.derived.tree.departments.len(),
            self.derived.tree.agency_count(),
        );
        if self.loads.is_pending() {
            status.push_str(" | loading\u{2026}");
        }
        if !filters.is_empty() {
            status.push_str(&format!(" | {filters}"));
        }
        if let Some(msg) = &self.status_message {
            status.push_str(&format!(" | {msg}"));
        }
        let (status, _) = tui::wrap_text(&status, area.width as usize);
        frame.render_widget(
            Paragraph::new(status.lines().next().unwrap_or("").to_string()).style(FOOTER_STYLE),
            status_area,
        );

        let keys_widget = match &self.mode {
            BrowseMode::Normal => Paragraph::new(
                "\u{2191}/\u{2193}:move  Enter:expand  /:search  l:level  1-5:sort  e/c:expand/collapse all  g:chart  x/J:export  r:reload  q:quit",
            )
            .style(FOOTER_STYLE),
            BrowseMode::Search { input, .. } => {
                Paragraph::new(format!("Search names: {input}\u{2588}  (Enter=keep, Esc=cancel)"))
            }
        };
        frame.render_widget(keys_widget, keys_area);
    }

    fn draw_chart(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let key = self.state.sort.map(|s| s.key).unwrap_or(SortKey::Senate);
        let level = match &self.state.level {
            Some(l) if *l != Level::Summary => l.clone(),
            _ => Level::Department,
        };
        let slices = reports::top_slices(
            &self.derived.filtered,
            &level,
            key,
            self.settings.top_n,
            12,
        );
        let bars: Vec<Bar> = slices
            .iter()
            .map(|s| {
                Bar::default()
                    .value(s.value.max(0.0).round() as u64)
                    .label(Line::from(s.label.clone()))
                    .text_value(crate::fmt::amount(s.value))
            })
            .collect();
        let block = Block::default()
            .borders(Borders::TOP)
            .title(format!(" Top {} by {key} ", level))
            .style(Style::default().fg(Color::Gray));
        let chart = BarChart::default()
            .block(block)
            .bar_width(12)
            .bar_gap(1)
            .bar_style(Style::default().fg(Color::Cyan))
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }
}
