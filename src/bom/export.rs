use std::fs::File;
use std::io::{self,Write};
use std::path::Path;

use anyhow::Context;
use log::warn;

use crate::bom::generate::BomRow;

/// Write the row sequence as CSV to `out`.
///
/// The header is the first row's key set, in that row's key order, and the
/// rows are written in the order the generator returned them.  A key
/// missing from a later row serializes as an empty field; keys not in the
/// header are ignored.
///
/// When the generator produced no rows there is no first row to take the
/// header from, so the configured column names in `fallback_header` are
/// written instead and the output is a header-only CSV.
pub fn write_rows<W : Write>(out : W, rows : &[BomRow], fallback_header : &[&str]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    match rows.first() {
        None => {
            warn!("The generator returned no rows; writing a header-only CSV");
            writer.write_record(fallback_header)?;
        }
        Some(first) => {
            let header : Vec<&str> = first.keys().map(String::as_str).collect();
            writer.write_record(&header)?;
            for row in rows {
                let fields = header.iter()
                    .map(|name| row.get(*name).map(String::as_str).unwrap_or(""));
                writer.write_record(fields)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Serialize the rows to `output_file`, or to standard output when no path
/// was given.
///
/// A named output file is created (truncating any previous content) and
/// the handle is scoped to this function, so it is closed on every exit
/// path, including an error partway through the rows.
pub fn export_rows(rows : &[BomRow], fallback_header : &[&str], output_file : Option<&Path>) -> anyhow::Result<()> {
    match output_file {
        Some(path) => {
            let f = File::create(path)
                .with_context(|| format!("Failed to create output file '{}'", path.display()))?;
            write_rows(f, rows, fallback_header)
        }
        None => {
            let stdout = io::stdout();
            write_rows(stdout.lock(), rows, fallback_header)
        }
    }
}
