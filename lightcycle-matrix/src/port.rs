//! Common interface for the two halves of the matrix.

/// One half of the key matrix.
///
/// Both halves share the same row numbering. Column samples are active-high
/// (bit set = key pressed) with bit `i` holding the half's column `i`.
pub trait HalfPort {
    type Error;

    /// Configure pin directions and pull-ups, leaving all rows inactive.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Drive `row` low and all other rows high.
    fn select_row(&mut self, row: usize) -> Result<(), Self::Error>;

    /// Drive all rows high.
    fn unselect_rows(&mut self) -> Result<(), Self::Error>;

    /// Sample the column inputs.
    fn read_columns(&mut self) -> Result<u8, Self::Error>;
}
