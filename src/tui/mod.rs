//! Terminal dashboard over a finished snapshot.
//!
//! Feature-gated behind `tui`. Launch with `--tui` on the CLI.

mod controls;
mod layout;
/// Dashboard state.
pub mod runtime;
mod style;

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::snapshot::AggregateSnapshot;
use runtime::App;

/// How long to wait for input before redrawing.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opens the dashboard for `snapshot` and blocks until the user quits.
///
/// Sets up the terminal (raw mode, alternate screen), runs the event loop,
/// and restores the terminal on exit.
///
/// # Errors
///
/// Returns an `io::Error` if the terminal cannot be set up or drawn.
pub fn run(snapshot: AggregateSnapshot, mismatches: usize) -> io::Result<()> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e);
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            let _ = disable_raw_mode();
            return Err(e);
        }
    };

    let mut app = App::new(snapshot);
    app.mismatches = mismatches;
    let result = event_loop(&mut terminal, &mut app);

    // Always restore terminal state.
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    result
}

/// Core event loop: draw, then wait for a key.
fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|frame| layout::render(frame, app))?;

        if app.quit {
            return Ok(());
        }

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                controls::handle_key(app, key);
            }
        }
    }
}
