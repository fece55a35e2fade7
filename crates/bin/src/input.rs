//! Reading observation matrices from CSV.

use crate::error::CliError;
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read a numeric CSV file into a matrix, one CSV row per matrix row
pub(crate) fn read_csv_file(path: &Path, has_header: bool) -> Result<Array2<f64>, CliError> {
    let file = File::open(path)?;
    let matrix = read_csv(file, has_header)?;
    debug!(path = %path.display(), rows = matrix.nrows(), columns = matrix.ncols(), "read observations");
    Ok(matrix)
}

/// Parse numeric CSV from any reader
pub(crate) fn read_csv<R: Read>(reader: R, has_header: bool) -> Result<Array2<f64>, CliError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut values = Vec::new();
    let mut n_rows = 0;
    let mut n_columns = 0;

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        for (idx, field) in record.iter().enumerate() {
            let value = field.parse::<f64>().map_err(|_| CliError::Parse {
                line,
                column: idx + 1,
                value: field.to_string(),
            })?;
            values.push(value);
        }
        n_columns = record.len();
        n_rows += 1;
    }

    if n_rows == 0 {
        return Err(CliError::EmptyInput);
    }
    Ok(Array2::from_shape_vec((n_rows, n_columns), values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_read_with_header() {
        let input = "a, b\n1.0, 2.0\n3.5, -4\n";
        let matrix = read_csv(input.as_bytes(), true).unwrap();
        assert_eq!(matrix, array![[1.0, 2.0], [3.5, -4.0]]);
    }

    #[test]
    fn test_read_without_header() {
        let input = "1,2,3\n4,5,6\n";
        let matrix = read_csv(input.as_bytes(), false).unwrap();
        assert_eq!(matrix.dim(), (2, 3));
        assert_eq!(matrix[[1, 2]], 6.0);
    }

    #[test]
    fn test_bad_field_reports_position() {
        let input = "x,y\n1,2\n3,abc\n";
        match read_csv(input.as_bytes(), true) {
            Err(CliError::Parse {
                line,
                column,
                value,
            }) => {
                assert_eq!(line, 3);
                assert_eq!(column, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let input = "1,2\n3\n";
        assert!(matches!(
            read_csv(input.as_bytes(), false),
            Err(CliError::Csv(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            read_csv("a,b\n".as_bytes(), true),
            Err(CliError::EmptyInput)
        ));
    }
}
