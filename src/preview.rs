//! ASCII preview rendering in the terminal.
//!
//! Each captured frame is converted to grayscale, downsampled to a character
//! grid that fits the terminal, and mapped onto a 10-level density ramp. The
//! grid is drawn on the alternate screen with a status line on the bottom row.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};

use crate::source::Frame;

/// Density ramp ordered from darkest to brightest. Works well on dark
/// terminals; use `invert` on light ones.
pub const DENSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal characters are roughly twice as tall as they are wide.
const CHAR_ASPECT: f32 = 2.0;

/// Stateful preview renderer.
///
/// Holds reusable conversion buffers so the per-frame path does not allocate,
/// and remembers the last grid size so the screen is only cleared when the
/// layout changes (terminal resize or first frame).
pub struct Preview {
    mirror: bool,
    invert: bool,
    gray: Vec<u8>,
    cells: Vec<u8>,
    chars: Vec<char>,
    row: String,
    last_grid: Option<(u16, u16)>,
}

impl Preview {
    pub fn new(mirror: bool, invert: bool) -> Self {
        Self {
            mirror,
            invert,
            gray: Vec::new(),
            cells: Vec::new(),
            chars: Vec::new(),
            row: String::new(),
            last_grid: None,
        }
    }

    /// Draw one frame plus the status line.
    ///
    /// Mirroring applies to the preview only; callers save the frame exactly
    /// as it was read.
    pub fn render(&mut self, out: &mut impl Write, frame: &Frame, status: &str) -> io::Result<()> {
        let (term_cols, term_rows) = terminal::size().unwrap_or((80, 24));
        let grid_rows_max = term_rows.saturating_sub(1); // bottom row is the status line
        let (cols, rows) = fit_dimensions(frame.width, frame.height, term_cols, grid_rows_max);

        if cols == 0 || rows == 0 {
            return self.draw_status(out, status, term_cols, term_rows);
        }

        to_grayscale_into(frame, &mut self.gray);
        downsample_into(
            &self.gray,
            frame.width,
            frame.height,
            cols,
            rows,
            &mut self.cells,
        );
        map_to_chars_into(&self.cells, self.invert, &mut self.chars);

        if self.last_grid != Some((cols, rows)) {
            queue!(out, Clear(ClearType::All))?;
            self.last_grid = Some((cols, rows));
        }

        // Center the grid in the available area
        let x_off = (term_cols - cols) / 2;
        let y_off = (grid_rows_max - rows) / 2;

        for y in 0..rows {
            self.row.clear();
            let start = y as usize * cols as usize;
            let line = &self.chars[start..start + cols as usize];
            if self.mirror {
                self.row.extend(line.iter().rev());
            } else {
                self.row.extend(line.iter());
            }
            queue!(out, MoveTo(x_off, y_off + y), Print(&self.row))?;
        }

        self.draw_status(out, status, term_cols, term_rows)
    }

    fn draw_status(
        &mut self,
        out: &mut impl Write,
        status: &str,
        term_cols: u16,
        term_rows: u16,
    ) -> io::Result<()> {
        self.row.clear();
        self.row.extend(status.chars().take(term_cols as usize));
        while self.row.chars().count() < term_cols as usize {
            self.row.push(' ');
        }
        queue!(
            out,
            MoveTo(0, term_rows.saturating_sub(1)),
            Print(&self.row)
        )?;
        out.flush()
    }
}

/// Compute a character grid size that fits the limits and displays the frame
/// with its original aspect ratio, compensating for tall terminal cells.
fn fit_dimensions(img_width: u32, img_height: u32, max_cols: u16, max_rows: u16) -> (u16, u16) {
    if img_width == 0 || img_height == 0 || max_cols == 0 || max_rows == 0 {
        return (0, 0);
    }

    let img_aspect = img_width as f32 / img_height as f32;

    // Displayed aspect of a cols x rows grid is cols / (rows * CHAR_ASPECT).
    let mut cols = max_cols as f32;
    let mut rows = cols / (img_aspect * CHAR_ASPECT);
    if rows > max_rows as f32 {
        rows = max_rows as f32;
        cols = rows * img_aspect * CHAR_ASPECT;
    }

    let cols = (cols as u16).clamp(1, max_cols);
    let rows = (rows as u16).clamp(1, max_rows);
    (cols, rows)
}

/// ITU-R BT.601 luminance, integer math in the per-frame path.
fn to_grayscale_into(frame: &Frame, buffer: &mut Vec<u8>) {
    buffer.clear();
    buffer.reserve((frame.width * frame.height) as usize);

    for rgb in frame.data.chunks_exact(3) {
        let r = rgb[0] as u32;
        let g = rgb[1] as u32;
        let b = rgb[2] as u32;
        buffer.push(((299 * r + 587 * g + 114 * b) / 1000) as u8);
    }
}

/// Average the brightness of the pixels under each character cell.
fn downsample_into(
    gray: &[u8],
    img_width: u32,
    img_height: u32,
    cols: u16,
    rows: u16,
    buffer: &mut Vec<u8>,
) {
    buffer.clear();
    if cols == 0 || rows == 0 || img_width == 0 || img_height == 0 || gray.is_empty() {
        return;
    }
    buffer.reserve(cols as usize * rows as usize);

    let cell_w = img_width as f32 / cols as f32;
    let cell_h = img_height as f32 / rows as f32;

    for cy in 0..rows {
        for cx in 0..cols {
            let start_x = (cx as f32 * cell_w) as u32;
            let end_x = ((cx + 1) as f32 * cell_w) as u32;
            let start_y = (cy as f32 * cell_h) as u32;
            let end_y = ((cy + 1) as f32 * cell_h) as u32;

            let mut sum = 0u32;
            let mut count = 0u32;
            for py in start_y..end_y {
                for px in start_x..end_x {
                    let idx = (py * img_width + px) as usize;
                    if idx < gray.len() {
                        sum += gray[idx] as u32;
                        count += 1;
                    }
                }
            }
            buffer.push(if count > 0 { (sum / count) as u8 } else { 0 });
        }
    }
}

/// Map brightness values onto [`DENSITY_RAMP`].
fn map_to_chars_into(cells: &[u8], invert: bool, buffer: &mut Vec<char>) {
    buffer.clear();
    buffer.reserve(cells.len());

    let levels = DENSITY_RAMP.len();
    for &b in cells {
        let b = if invert { 255 - b } else { b };
        let idx = (b as usize * (levels - 1)) / 255;
        buffer.push(DENSITY_RAMP[idx]);
    }
}
