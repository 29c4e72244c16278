//! Cell positions and sheet sizes

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell coordinate (0-based row and column)
///
/// Positions order row-major, so sorted sets of positions iterate the same
/// way a sheet is printed. A position may be constructed outside the sheet;
/// [`Position::is_valid`] tells whether it names a real slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Row index (0-based internally, 1-based in display)
    pub row: i32,
    /// Column index (0-based, A=0, B=1, ...)
    pub col: i32,
}

impl Position {
    /// The canonical invalid position
    pub const NONE: Position = Position { row: -1, col: -1 };

    /// Create a new position
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Check whether the position lies inside the sheet
    pub fn is_valid(&self) -> bool {
        self.row >= 0 && self.col >= 0 && self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Parse a position from A1-style notation
    ///
    /// Text that has the shape of an address but names a cell outside the
    /// sheet (for example `A0`) parses to an invalid position rather than an
    /// error, so a formula referencing it can be rejected as an invalid
    /// reference.
    ///
    /// # Examples
    /// ```
    /// use gridcalc_core::Position;
    ///
    /// let pos = Position::parse("A1").unwrap();
    /// assert_eq!(pos, Position::new(0, 0));
    ///
    /// let pos = Position::parse("AA12").unwrap();
    /// assert_eq!(pos, Position::new(11, 26));
    ///
    /// assert!(!Position::parse("A0").unwrap().is_valid());
    /// assert!(Position::parse("1A").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let letters = bytes.iter().take_while(|b| b.is_ascii_uppercase()).count();

        if letters == 0 {
            return Err(Error::InvalidAddress(format!("no column letters in '{}'", s)));
        }

        let digits = &s[letters..];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }

        let col = Self::letters_to_column(&s[..letters]);
        let row = digits
            .parse::<i64>()
            .map(|n| n - 1)
            .unwrap_or(i64::MAX)
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;

        Ok(Self { row, col })
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: i32) -> String {
        let mut result = String::new();
        let mut n = i64::from(col) + 1;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert uppercase column letters to an index (A = 0, Z = 25, AA = 26)
    ///
    /// Saturates at `i32::MAX` for absurdly long letter runs; such a column is
    /// never valid anyway.
    fn letters_to_column(letters: &str) -> i32 {
        let mut col: i64 = 0;
        for b in letters.bytes() {
            col = col * 26 + i64::from(b - b'A' + 1);
            if col > i64::from(i32::MAX) {
                return i32::MAX;
            }
        }
        (col - 1) as i32
    }

    /// Format as A1-style string, or an empty string for invalid positions
    pub fn to_a1_string(&self) -> String {
        if !self.is_valid() {
            return String::new();
        }
        format!("{}{}", Self::column_to_letters(self.col), self.row + 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Dimensions of a rectangular area anchored at A1
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

impl Size {
    /// Create a new size
    pub const fn new(rows: i32, cols: i32) -> Self {
        Self { rows, cols }
    }

    /// Check whether the area contains no cells
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Check whether a position falls inside the area
    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.col >= 0 && pos.row < self.rows && pos.col < self.cols
    }

    /// Smallest size that covers both this area and the given position
    pub fn extend_to(&self, pos: Position) -> Size {
        Size {
            rows: self.rows.max(pos.row + 1),
            cols: self.cols.max(pos.col + 1),
        }
    }
}
