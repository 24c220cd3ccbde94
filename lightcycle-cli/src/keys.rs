use anyhow::{bail, Context, Result};
use lightcycle_matrix::{COLS, ROWS};

/// Parse a key position written as `ROW,COL`.
///
/// Both parts are decimal; the column may also be a single hex digit
/// (`A`, `B`) as in the matrix dump header.
pub fn parse_key(input: &str) -> Result<(usize, usize)> {
    let Some((row, col)) = input.split_once(',') else {
        bail!("expected ROW,COL, got {:?}", input);
    };

    let row: usize = row
        .trim()
        .parse()
        .with_context(|| format!("invalid row {:?}", row))?;
    let col = parse_column(col.trim()).with_context(|| format!("invalid column {:?}", col))?;

    if row >= ROWS {
        bail!("row {} out of range (0-{})", row, ROWS - 1);
    }
    if col >= COLS {
        bail!("column {} out of range (0-{})", col, COLS - 1);
    }
    Ok((row, col))
}

fn parse_column(input: &str) -> Result<usize> {
    if let Ok(col) = input.parse() {
        return Ok(col);
    }
    match input.chars().collect::<Vec<_>>().as_slice() {
        [c] if c.is_ascii_hexdigit() => Ok(c.to_digit(16).unwrap_or_default() as usize),
        _ => bail!("not a column number"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_key("2,7").unwrap(), (2, 7));
        assert_eq!(parse_key(" 4 , 11 ").unwrap(), (4, 11));
    }

    #[test]
    fn test_parse_hex_column() {
        assert_eq!(parse_key("0,B").unwrap(), (0, 11));
        assert_eq!(parse_key("3,a").unwrap(), (3, 10));
    }

    #[test]
    fn test_missing_separator() {
        assert!(parse_key("27").is_err());
    }

    #[test]
    fn test_out_of_range() {
        assert!(parse_key("5,0").is_err());
        assert!(parse_key("0,12").is_err());
        assert!(parse_key("0,F").is_err());
    }

    #[test]
    fn test_garbage() {
        assert!(parse_key("x,1").is_err());
        assert!(parse_key("1,zz").is_err());
    }
}
