//! Tab-separated dumps of the printable area

use std::io::{self, Write};

use crate::sheet::{CellView, Sheet};
use gridcalc_core::Position;

impl Sheet {
    /// Write every cell's value, one line per row of the printable area
    ///
    /// Columns are separated by a tab; absent cells print nothing. Numbers use
    /// the shortest form that round-trips and errors print as their code.
    pub fn print_values<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.print_with(writer, |cell| cell.value().to_string())
    }

    /// Write every cell's text, one line per row of the printable area
    pub fn print_texts<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.print_with(writer, |cell| cell.text())
    }

    fn print_with<W, F>(&self, writer: &mut W, render: F) -> io::Result<()>
    where
        W: Write,
        F: Fn(&CellView<'_>) -> String,
    {
        let size = self.printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    writer.write_all(b"\t")?;
                }
                // Positions inside the printable area are always in bounds
                if let Ok(Some(cell)) = self.get_cell(Position::new(row, col)) {
                    writer.write_all(render(&cell).as_bytes())?;
                }
            }
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}
