use crate::animation::Frame;
use crate::command::CommandSet;
use crate::session::DisplayState;
use crossterm::{
    cursor, execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell { bg, ..Cell::default() };
        }
    }
    #[cfg(test)]
    pub(crate) fn row(&self, y: u16) -> String {
        (0..self.w).map(|x| self.cells[self.idx(x, y)].ch).collect()
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    /// Writes the cells that differ from the last presented frame.
    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = false;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                if last_bold != c.bold {
                    let attr = if c.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = c.bold;
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Cat frames
------------------------------ */

const OPEN: [&str; 9] = [
    "      /\\_/\\",
    "     / o o \\           _ ",
    "   >( \\_Y_/ )<        | |",
    "      =====           / /",
    "    /   o  \\_________/ /",
    "    |                  |",
    "    |  /\\   _____      |",
    "    | |  | |     | | | |",
    "    |_|  |_|     |_| |_|",
];

const BLINK: [&str; 9] = [
    "      /\\_/\\",
    "     / > < \\           _ ",
    "   >( \\_Y_/ )<        | |",
    "      =====           / /",
    "    /   o  \\_________/ /",
    "    |                  |",
    "    |  /\\   _____      |",
    "    | |  | |     | | | |",
    "    |_|  |_|     |_| |_|",
];

const DEAD: [&str; 9] = [
    "      /\\_/\\",
    "     / X X \\           _ ",
    "   >(  _Y_  )<        | |",
    "      =====           / /",
    "    /   o  \\_________/ /",
    "    |                  |",
    "    |  /\\   _____      |",
    "    | |  | |     | | | |",
    "    |_|  |_|     |_| |_|",
];

const DANCE_RIGHT: [&str; 9] = [
    "        /\\_/\\",
    "       / u u \\           _ ",
    "     >( \\_Y_/ )<        | |",
    "       =====           / /",
    "     /   o  \\_________/ /",
    "     |                  |",
    "     |  /\\   _____      |",
    "     | |  |_|     |_| | |",
    "     |_|              |_|",
];

const DANCE_LEFT: [&str; 9] = [
    "     /\\_/\\",
    "    / u u \\           _ ",
    "  >( \\_Y_/ )<        | |",
    "     =====           / /",
    "   /   o  \\_________/ /",
    "   |                  |",
    "   |  /\\   _____      |",
    "   |_|  | |     | | |_|",
    "        |_|     |_|    ",
];

pub(crate) fn frame_art(frame: Frame) -> &'static [&'static str] {
    match frame {
        Frame::Open => &OPEN,
        Frame::Blink => &BLINK,
        Frame::Dead => &DEAD,
        Frame::DanceRight => &DANCE_RIGHT,
        Frame::DanceLeft => &DANCE_LEFT,
    }
}

/* -----------------------------
   Screen layout
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    draw_styled(buf, x, y, s, fg, bg, false);
}

fn draw_styled(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color, bold: bool) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg, bold });
    }
}

pub(crate) struct Palette {
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) accent: Color,
    pub(crate) alert: Color,
}

impl Palette {
    pub(crate) fn new(enable_color: bool) -> Self {
        if enable_color {
            Self {
                fg: Color::Green,
                bg: Color::Black,
                accent: Color::Yellow,
                alert: Color::Red,
            }
        } else {
            Self {
                fg: Color::White,
                bg: Color::Black,
                accent: Color::White,
                alert: Color::White,
            }
        }
    }
}

/// Lays out the whole window: meters, cat, message, game-over banner and
/// the command line.
pub(crate) fn draw_screen(
    buf: &mut CellBuffer,
    st: &DisplayState,
    input: &str,
    commands: CommandSet,
    pal: &Palette,
) {
    buf.clear(pal.bg);
    let x0 = 2u16;
    let bottom = buf.h.saturating_sub(1);

    draw_styled(buf, x0, 0, "DIGI-CAT", pal.accent, pal.bg, true);

    draw_text(buf, x0, 2, &format!("Hunger:    {}", st.hunger_bar()), pal.fg, pal.bg);
    draw_text(buf, x0, 3, &format!("Happiness: {}", st.happiness_bar()), pal.fg, pal.bg);

    let art_y = 5u16;
    let art = frame_art(st.frame);
    let art_fg = if st.is_game_over { pal.alert } else { pal.fg };
    for (i, line) in art.iter().enumerate() {
        draw_text(buf, x0 + 4, art_y + i as u16, line, art_fg, pal.bg);
    }

    let msg_y = art_y + art.len() as u16 + 1;
    if !st.message.is_empty() {
        draw_text(buf, x0, msg_y, &st.message, pal.accent, pal.bg);
    }

    if st.is_game_over {
        draw_styled(buf, x0, msg_y + 2, "Game Over", pal.alert, pal.bg, true);
        draw_text(buf, x0, msg_y + 3, "Press Enter or R to restart", pal.fg, pal.bg);
    } else {
        draw_text(
            buf,
            x0,
            bottom.saturating_sub(1),
            &format!("Enter command: {input}_"),
            pal.fg,
            pal.bg,
        );
    }

    let legend: Vec<String> = commands.words().iter().map(|w| format!("<{w}>")).collect();
    draw_text(
        buf,
        x0,
        bottom,
        &format!("Commands: {}   (Esc quits)", legend.join(" ")),
        pal.fg,
        pal.bg,
    );
}
