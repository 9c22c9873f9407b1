//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, Paragraph};

use super::runtime::App;
use super::style;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // header
            Constraint::Length(10), // monthly coverage
            Constraint::Min(10),    // hourly profile
            Constraint::Length(6),  // summary
            Constraint::Length(1),  // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_coverage(frame, app, chunks[1]);
    render_profile(frame, app, chunks[2]);
    render_summary(frame, app, chunks[3]);
    render_footer(frame, chunks[4]);
}

/// Header bar: selected group, hourly mode, consistency state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let group = app.selected_group().unwrap_or("-");
    let mut spans = vec![
        Span::styled(
            " RE100 ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(group, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " │ hourly={} │ {} month(s) ",
            app.hourly_mode.label(),
            app.snapshot.summary.months,
        )),
    ];
    if app.mismatches > 0 {
        spans.push(Span::styled(
            format!("│ {} consistency mismatch(es) ", app.mismatches),
            Style::default().fg(style::WARN_FG).add_modifier(Modifier::BOLD),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Monthly coverage bars, colored by band.
fn render_coverage(frame: &mut Frame, app: &App, area: Rect) {
    let bars: Vec<Bar> = app
        .monthly_coverage()
        .into_iter()
        .map(|(month, pct)| {
            Bar::default()
                .label(Line::from(month))
                .value(pct.round() as u64)
                .text_value(format!("{pct:.0}%"))
                .style(Style::default().fg(style::coverage_color(pct)))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(" Monthly Coverage (%) ")
                .borders(Borders::ALL),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(7)
        .bar_gap(1)
        .max(100);
    frame.render_widget(chart, area);
}

/// Hour-of-day supply of the selected group against total demand.
fn render_profile(frame: &mut Frame, app: &App, area: Rect) {
    let supply = app.supply_points();
    let demand = app.demand_points();
    let y_bounds = style::auto_bounds_y(&supply, &demand);
    let supply_name = app.selected_group().unwrap_or("supply").to_string();

    let datasets = vec![
        Dataset::default()
            .name(supply_name)
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::SUPPLY_COLOR))
            .data(&supply),
        Dataset::default()
            .name("demand")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::DEMAND_COLOR))
            .data(&demand),
    ];

    let y_label_lo = format!("{:.1}", y_bounds[0]);
    let y_label_hi = format!("{:.1}", y_bounds[1]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" Hourly Profile ({}) ", app.hourly_mode.label()))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("hour")
                .bounds([0.0, 23.0])
                .labels(vec!["0", "6", "12", "18", "23"]),
        )
        .y_axis(
            Axis::default()
                .title("GWh")
                .bounds(y_bounds)
                .labels(vec![y_label_lo, y_label_hi]),
        );

    frame.render_widget(chart, area);
}

/// Headline figures from the summary report.
fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let s = &app.snapshot.summary;
    let by_subtype = s
        .generation_by_subtype
        .iter()
        .map(|(k, v)| format!("{k}={v:.1}"))
        .collect::<Vec<_>>()
        .join("  ");
    let lines = vec![
        Line::from(format!(
            "  supply={:>10.1} GWh  demand={:>10.1} GWh  coverage={:>5.1}%",
            s.total_supply_gwh, s.total_demand_gwh, s.coverage_rate_pct,
        )),
        Line::from(format!("  {by_subtype}")),
        Line::from(format!(
            "  mean monthly={:>5.1}%  peak external={:.1} GWh  storage={:.1} GWh",
            s.mean_monthly_coverage_pct, s.peak_external_power_gwh, s.storage_capacity_gwh,
        )),
        Line::from(format!(
            "  readings={}  skipped={}",
            app.snapshot.ingest.accepted,
            app.snapshot.ingest.skipped(),
        )),
    ];

    let block = Block::default().title(" Summary ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  m:Mean/Sum  Tab:Next group  Shift+Tab:Previous group",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::engine::{AggregationOptions, IngestOptions, ReadingStore, run};
    use crate::sample::{SampleOptions, generate};
    use crate::snapshot::AggregateSnapshot;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn renders_sample_snapshot() {
        let opts = SampleOptions {
            days: 3,
            ..SampleOptions::default()
        };
        let (store, report) = ReadingStore::ingest(generate(&opts).unwrap(), &IngestOptions::default());
        let app = App::new(run(&store, report, &AggregationOptions::default()));
        let screen = draw(&app);
        assert!(screen.contains("Monthly Coverage"));
        assert!(screen.contains("Hourly Profile (mean)"));
        assert!(screen.contains("solar"));
    }

    #[test]
    fn renders_empty_snapshot() {
        let screen = draw(&App::new(AggregateSnapshot::default()));
        assert!(screen.contains("Summary"));
    }
}
