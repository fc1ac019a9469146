use std::io::{self, Write};

use colored::Colorize;

use crate::observer::{SeatView, TableSnapshot};

pub trait Render {
    /// Draws the table while dinner is still going.
    fn frame(&mut self, snapshot: &TableSnapshot) -> io::Result<()>;

    /// Draws the table one last time after everyone has finished.
    fn finish(&mut self, snapshot: &TableSnapshot) -> io::Result<()>;
}

impl<R: Render + ?Sized> Render for &mut R {
    fn frame(&mut self, snapshot: &TableSnapshot) -> io::Result<()> {
        (**self).frame(snapshot)
    }

    fn finish(&mut self, snapshot: &TableSnapshot) -> io::Result<()> {
        (**self).finish(snapshot)
    }
}

/// Draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Render for Silent {
    fn frame(&mut self, _snapshot: &TableSnapshot) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self, _snapshot: &TableSnapshot) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// ASCII table
// =============================================================================

/// One seat as three glyphs: left fork, philosopher, right fork.
/// The flag says whether the glyph is a fork in hand.
fn seat_glyphs(seat: &SeatView) -> [(char, bool); 3] {
    let left = if seat.has_left { '/' } else { '|' };
    let right = if seat.has_right { '\\' } else { '|' };
    [(left, seat.has_left), ('O', false), (right, seat.has_right)]
}

/// The table row without colours, e.g. `| |O|/O\|O| |` for three seats.
pub fn plain_row(snapshot: &TableSnapshot) -> String {
    let mut row = String::from("| ");
    for seat in &snapshot.seats {
        row.extend(seat_glyphs(seat).iter().map(|(glyph, _)| *glyph));
    }
    row.push_str(" |");
    row
}

fn coloured_row(snapshot: &TableSnapshot) -> String {
    let mut row = String::from("| ");
    for seat in &snapshot.seats {
        for (glyph, held) in seat_glyphs(seat) {
            let glyph = glyph.to_string();
            let painted = if held { glyph.red() } else { glyph.green() };
            row.push_str(&painted.to_string());
        }
    }
    row.push_str(" |");
    row
}

/// Redraws a row of philosophers and forks in place.
///
/// ```text
///  _________________
/// |                 |
/// | |O||O|/O\|O||O| |
///  `---------------´
/// ```
pub struct TableArt<W: Write> {
    out: W,
    started: bool,
    colour: bool,
}

impl<W: Write> TableArt<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: false,
            colour: true,
        }
    }

    /// Same drawing without ANSI colours.
    pub fn plain(out: W) -> Self {
        Self {
            colour: false,
            ..Self::new(out)
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn header(&mut self, seats: usize) -> io::Result<()> {
        let width = 3 * seats + 2;
        writeln!(self.out, " {}", "_".repeat(width))?;
        writeln!(self.out, "|{}|", " ".repeat(width))?;
        self.started = true;
        Ok(())
    }

    fn row(&self, snapshot: &TableSnapshot) -> String {
        if self.colour {
            coloured_row(snapshot)
        } else {
            plain_row(snapshot)
        }
    }
}

impl<W: Write> Render for TableArt<W> {
    fn frame(&mut self, snapshot: &TableSnapshot) -> io::Result<()> {
        if !self.started {
            self.header(snapshot.seats.len())?;
        }
        let row = self.row(snapshot);
        write!(self.out, "\r{row}")?;
        self.out.flush()
    }

    fn finish(&mut self, snapshot: &TableSnapshot) -> io::Result<()> {
        if !self.started {
            self.header(snapshot.seats.len())?;
        }
        let row = self.row(snapshot);
        writeln!(self.out, "\r{row}")?;
        writeln!(self.out, " `{}´", "-".repeat(3 * snapshot.seats.len()))?;
        self.out.flush()
    }
}
