use crate::animation::RandomHold;
use crate::config::Settings;
use crate::input::{collect_input_nonblocking, map_event_to_action, LineBuffer, PlayerAction};
use crate::render::{draw_screen, Palette, Terminal};
use crate::session::Session;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub(crate) struct App {
    settings: Settings,
    session: Session,
    line: LineBuffer,
    palette: Palette,
    should_quit: bool,
}

impl App {
    pub(crate) fn new(settings: Settings) -> Self {
        let rules = settings.rules();
        let holds = RandomHold::new(&rules, settings.seed);
        let session = Session::new(rules, Box::new(holds));
        let palette = Palette::new(settings.enable_color);
        Self {
            settings,
            session,
            line: LineBuffer::default(),
            palette,
            should_quit: false,
        }
    }

    /// Routes one key action into the session.
    pub(crate) fn apply(&mut self, action: PlayerAction) {
        match action {
            PlayerAction::Char(ch) => self.line.push(ch),
            PlayerAction::Backspace => self.line.backspace(),
            PlayerAction::Submit => {
                // the line is cleared whether or not the command was valid
                let text = self.line.take();
                self.session.submit_command(&text);
            }
            PlayerAction::Restart => {
                self.line.clear();
                self.session.restart();
            }
            PlayerAction::Quit => self.should_quit = true,
        }
    }

    fn run(&mut self, term: &mut Terminal) -> anyhow::Result<()> {
        let fps = self.settings.fps();
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            term.resize_if_needed()?;

            // input
            let events = collect_input_nonblocking(frame_dt)?;
            for ev in events {
                if let Some(action) = map_event_to_action(self.session.phase(), ev) {
                    self.apply(action);
                    if self.should_quit {
                        break;
                    }
                }
            }

            // timers
            let now = Instant::now();
            self.session.advance(now.saturating_duration_since(last_frame));
            last_frame = now;

            // render
            let st = self.session.display_state();
            draw_screen(
                &mut term.cur,
                &st,
                self.line.as_str(),
                self.session.commands(),
                &self.palette,
            );
            term.present(true)?;

            // frame cap
            spin_sleep(frame_dt, Instant::now());
        }
        Ok(())
    }
}

pub(crate) fn run(settings: Settings) -> anyhow::Result<()> {
    info!(?settings, "starting");
    let mut app = App::new(settings);
    let mut term = Terminal::begin()?;
    let result = app.run(&mut term);
    // restore the terminal even if the loop failed
    let restored = term.end();
    debug!(elapsed_ms = app.session.elapsed().as_millis() as u64, "quit");
    first_error(result, restored)
}

/// The loop's error wins; a restore failure behind it only gets logged.
fn first_error(result: anyhow::Result<()>, restored: anyhow::Result<()>) -> anyhow::Result<()> {
    if let (Err(_), Err(e)) = (&result, &restored) {
        error!(error = %e, "terminal restore failed");
    }
    result.and(restored)
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
