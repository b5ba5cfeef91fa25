/// ASCII line rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use wf3d_core::LineDrawer;

/// Marker for segment endpoints
const ENDPOINT: char = 'o';

/// Character grid that wireframe segments are rasterized into
pub struct AsciiCanvas {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl AsciiCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![' '; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.cells.fill(' ');
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![' '; width * height];
    }

    /// Character at column `x` of row `y`, counting rows from the top
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x])
    }

    /// Plot at device coordinates (origin bottom-left)
    fn plot(&mut self, x: f64, y: f64, c: char) {
        if self.width == 0 || self.height == 0 || !x.is_finite() || !y.is_finite() {
            return;
        }
        let col = x.floor() as i64;
        let row = y.floor() as i64;
        // the far edges of the surface belong to the last cell
        let col = if col == self.width as i64 { col - 1 } else { col };
        let row = if row == self.height as i64 { row - 1 } else { row };
        if col < 0 || row < 0 || col >= self.width as i64 || row >= self.height as i64 {
            return;
        }
        let idx = (self.height - 1 - row as usize) * self.width + col as usize;
        // endpoints win over line bodies
        if self.cells[idx] != ENDPOINT {
            self.cells[idx] = c;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.cells[y * self.width + x];
                let color = match c {
                    ENDPOINT => Color::Red,
                    ' ' => Color::Reset,
                    _ => Color::White,
                };
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Glyph that best follows a segment's slope on screen
fn glyph(dx: f64, dy: f64) -> char {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ay <= ax * 0.4 {
        '-'
    } else if ax <= ay * 0.4 {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '/'
    } else {
        '\\'
    }
}

impl LineDrawer for AsciiCanvas {
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let (dx, dy) = (x2 - x1, y2 - y1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0);
        if !steps.is_finite() {
            return;
        }
        let c = glyph(dx, dy);
        let steps = steps as usize;
        for i in 1..steps {
            let t = i as f64 / steps as f64;
            self.plot(x1 + dx * t, y1 + dy * t, c);
        }
        self.plot(x1, y1, ENDPOINT);
        self.plot(x2, y2, ENDPOINT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(canvas: &AsciiCanvas, y: usize) -> String {
        (0..canvas.width()).filter_map(|x| canvas.cell(x, y)).collect()
    }

    #[test]
    fn test_horizontal_line_bottom_row() {
        let mut canvas = AsciiCanvas::new(8, 4);
        canvas.draw_line(0.5, 0.5, 6.5, 0.5);
        // device y = 0 is the last terminal row
        assert_eq!(row(&canvas, 3), "o-----o ");
        assert_eq!(row(&canvas, 0), "        ");
    }

    #[test]
    fn test_diagonal_glyphs() {
        let mut canvas = AsciiCanvas::new(4, 4);
        canvas.draw_line(0.5, 0.5, 3.5, 3.5);
        assert_eq!(canvas.cell(0, 3), Some('o'));
        assert_eq!(canvas.cell(1, 2), Some('/'));
        assert_eq!(canvas.cell(3, 0), Some('o'));

        canvas.clear();
        canvas.draw_line(0.5, 3.5, 3.5, 0.5);
        assert_eq!(canvas.cell(1, 1), Some('\\'));
    }

    #[test]
    fn test_far_edge_and_outside_points() {
        let mut canvas = AsciiCanvas::new(4, 2);
        canvas.draw_line(4.0, 2.0, 4.0, 2.0);
        assert_eq!(canvas.cell(3, 0), Some('o'));
        canvas.draw_line(-3.0, -3.0, -1.0, -1.0);
        assert_eq!(canvas.cells.iter().filter(|&&c| c != ' ').count(), 1);
    }

    #[test]
    fn test_draw_writes_every_row() {
        let mut canvas = AsciiCanvas::new(3, 2);
        canvas.draw_line(0.0, 0.0, 2.5, 0.0);
        let mut out = Vec::new();
        canvas.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\r\n").count(), 2);
        assert!(text.contains('o'));
    }
}
