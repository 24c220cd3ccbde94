//! Printable pin map of both halves.

use lightcycle_matrix::{mcp23018, teensy, COLS, COLS_PER_HALF, ROWS};

/// Pin driving `row` on (left, right) half.
pub fn row_pins(row: usize) -> (String, String) {
    let left = format!("GPB{}", row);
    let bit = teensy::row_bit(row).trailing_zeros();
    (left, format!("PF{}", bit))
}

/// Pin reading `col`.
pub fn column_pin(col: usize) -> String {
    if col < COLS_PER_HALF {
        format!("GPA{}", col + mcp23018::COLUMN_SHIFT as usize)
    } else {
        match col - COLS_PER_HALF {
            c @ 0..=3 => format!("PB{}", c),
            c => format!("PD{}", c - 2),
        }
    }
}

pub fn print() {
    println!("Rows (active low, both halves):");
    for row in 0..ROWS {
        let (left, right) = row_pins(row);
        println!("  row {}  MCP23018 {:<5} Teensy {}", row, left, right);
    }
    println!("Columns (pull-up inputs):");
    for col in 0..COLS {
        let side = if col < COLS_PER_HALF { "MCP23018" } else { "Teensy  " };
        println!("  col {:>2}  {} {}", col, side, column_pin(col));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_pins() {
        assert_eq!(row_pins(0), ("GPB0".to_string(), "PF0".to_string()));
        assert_eq!(row_pins(2), ("GPB2".to_string(), "PF4".to_string()));
        assert_eq!(row_pins(4), ("GPB4".to_string(), "PF6".to_string()));
    }

    #[test]
    fn test_column_pins() {
        let pins: Vec<String> = (0..COLS).map(column_pin).collect();
        assert_eq!(
            pins,
            [
                "GPA1", "GPA2", "GPA3", "GPA4", "GPA5", "GPA6", "PB0", "PB1", "PB2", "PB3", "PD2",
                "PD3"
            ]
        );
    }
}
