use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::pipeline::catalog::PropertyMatrix;
use crate::pipeline::offsets::OffsetTable;
use crate::pipeline::properties;

/// Header of the offset table.
pub const OFFSET_HEADER: &str = "| offset in file | length |";

/// Format like C's `%.6e`: six decimals, signed exponent of at least two
/// digits (`1.234560e+10`, `5.000000e-03`).
pub fn format_sci(value: f32) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let s = format!("{value:.6e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s,
    }
}

/// Open `path` for writing and emit the `# `-prefixed header line, then hand
/// the rest of the file to a space-delimited CSV writer.
fn table_writer(path: &Path, header: &str) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "# {header}").with_context(|| format!("writing {}", path.display()))?;
    Ok(csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out))
}

/// Write the offset table: one `start length` line per realization.
pub fn write_offset_table(path: &Path, offsets: &OffsetTable) -> Result<()> {
    let mut writer = table_writer(path, OFFSET_HEADER)?;
    for entry in offsets.entries() {
        writer
            .write_record([entry.start.to_string(), entry.len.to_string()])
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer.flush().with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// Write the galaxy table: one line of 17 `%.6e` values per galaxy.
pub fn write_property_matrix(path: &Path, matrix: &PropertyMatrix) -> Result<()> {
    let mut writer = table_writer(path, &properties::header())?;
    for row in matrix.iter_rows() {
        writer
            .write_record(row.iter().map(|&v| format_sci(v)))
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer.flush().with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::N_PROPERTIES;

    #[test]
    fn sci_format_matches_printf() {
        assert_eq!(format_sci(0.0), "0.000000e+00");
        assert_eq!(format_sci(1.5e10), "1.500000e+10");
        assert_eq!(format_sci(0.005), "5.000000e-03");
        assert_eq!(format_sci(-21.25), "-2.125000e+01");
        assert_eq!(format_sci(1e-30), "1.000000e-30");
        assert_eq!(format_sci(f32::NAN), "nan");
        assert_eq!(format_sci(f32::NEG_INFINITY), "-inf");
    }

    #[test]
    fn offset_table_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.txt");
        let mut offsets = OffsetTable::new();
        offsets.push(2);
        offsets.push(0);
        offsets.push(5);

        write_offset_table(&path, &offsets).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "# | offset in file | length |\n0 2\n2 0\n2 5\n");
    }

    #[test]
    fn galaxy_table_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("galaxies.txt");
        write_property_matrix(&path, &PropertyMatrix::zeros(2)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("# | gas mass"));
        let fields: Vec<&str> = lines[1].split(' ').collect();
        assert_eq!(fields.len(), N_PROPERTIES);
        assert!(fields.iter().all(|f| *f == "0.000000e+00"));
    }
}
