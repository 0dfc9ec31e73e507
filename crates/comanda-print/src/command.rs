//! The printer command model.
//!
//! The composer speaks in these commands; transports turn them into bytes.
//! Keeping the two apart is what lets the ticket layout be tested without a
//! printer.

use serde::Serialize;

use crate::logo::Logo;

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One cell of a column row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub text: String,
    pub width: usize,
    pub align: Align,
}

impl Column {
    pub fn left(text: impl Into<String>, width: usize) -> Self {
        Column {
            text: text.into(),
            width,
            align: Align::Left,
        }
    }

    pub fn right(text: impl Into<String>, width: usize) -> Self {
        Column {
            text: text.into(),
            width,
            align: Align::Right,
        }
    }

    /// Cell padded or truncated to exactly `width` characters.
    pub fn render(&self) -> String {
        match self.align {
            Align::Left => comanda_core::text::fit_left(&self.text, self.width),
            Align::Right => comanda_core::text::fit_right(&self.text, self.width),
            Align::Center => {
                let text: String = self.text.chars().take(self.width).collect();
                format!("{:^width$}", text, width = self.width)
            }
        }
    }
}

/// Renders a row of cells as one line.
pub fn render_row(columns: &[Column]) -> String {
    columns.iter().map(Column::render).collect()
}

/// A printer instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintCommand {
    Image(Logo),
    Align(Align),
    /// One line of text. Empty text prints a blank line.
    Text(String),
    Columns(Vec<Column>),
    /// Blank lines before the cut.
    Feed(u8),
    Cut,
}
