use super::IoError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Writes `records` as CSV with a header row derived from the record's field names.
pub fn write_records<W: Write, T: Serialize>(writer: W, records: &[T]) -> Result<(), IoError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_records_to_path<T: Serialize>(path: &Path, records: &[T]) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })?;
    write_records(std::io::BufWriter::new(file), records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        charge: i32,
        concentration: f64,
    }

    #[test]
    fn header_and_rows_are_written() {
        let rows = [
            Row {
                name: "vac_O",
                charge: 2,
                concentration: 1.5e20,
            },
            Row {
                name: "vac_O",
                charge: 0,
                concentration: 3.0e18,
            },
        ];
        let mut buffer = Vec::new();
        write_records(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "name,charge,concentration");
        let fields: Vec<_> = lines[1].split(',').collect();
        assert_eq!(fields[..2], ["vac_O", "2"]);
        assert_eq!(fields[2].parse::<f64>().unwrap(), 1.5e20);
        assert_eq!(lines.len(), 3);
    }
}
