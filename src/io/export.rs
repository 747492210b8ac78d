//! CSV export of committed period records.

use std::io::Write;
use std::path::Path;

use crate::driver::PeriodRecord;

/// Column order of the exported CSV.
pub const CSV_HEADER: [&str; 11] = [
    "period",
    "price",
    "system_production_kw",
    "system_load_kw",
    "net_export_kw",
    "decided_charge_kw",
    "decided_discharge_kw",
    "decided_soc",
    "realized_soc",
    "realized_power_kw",
    "temp_c",
];

/// Writes period records as CSV to any writer.
///
/// # Errors
///
/// Returns the underlying CSV or I/O error.
pub fn write_records<W: Write>(records: &[PeriodRecord], writer: W) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(CSV_HEADER)?;
    for r in records {
        w.write_record(&[
            r.period.to_string(),
            format!("{:.6}", r.price),
            format!("{:.3}", r.system_production),
            format!("{:.3}", r.system_load),
            format!("{:.3}", r.net_export),
            format!("{:.3}", r.decided_charge),
            format!("{:.3}", r.decided_discharge),
            format!("{:.6}", r.decided_soc),
            format!("{:.6}", r.realized_soc),
            format!("{:.3}", r.realized_power_kw),
            r.temp_c.map_or(String::new(), |t| format!("{t:.2}")),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Writes period records to a CSV file at `path`.
///
/// # Errors
///
/// Returns the underlying CSV or I/O error.
pub fn export_records(records: &[PeriodRecord], path: &Path) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_records(records, file)
}

#[cfg(test)]
mod tests {
    use super::{CSV_HEADER, write_records};
    use crate::driver::PeriodRecord;

    fn record(period: usize) -> PeriodRecord {
        PeriodRecord {
            period,
            price: 0.05,
            system_production: 500.0,
            system_load: 100.0,
            net_export: 400.0,
            decided_charge: 0.0,
            decided_discharge: 100.0,
            decided_soc: 0.4,
            realized_soc: 0.39,
            realized_power_kw: 100.0,
            temp_c: Some(25.0),
        }
    }

    #[test]
    fn header_row_comes_first() {
        let mut buf = Vec::new();
        write_records(&[record(0)], &mut buf).expect("in-memory write");
        let text = String::from_utf8(buf).expect("valid utf-8");
        let first = text.lines().next().expect("non-empty output");
        assert_eq!(first, CSV_HEADER.join(","));
    }

    #[test]
    fn one_line_per_record_plus_header() {
        let records: Vec<_> = (0..5).map(record).collect();
        let mut buf = Vec::new();
        write_records(&records, &mut buf).expect("in-memory write");
        let text = String::from_utf8(buf).expect("valid utf-8");
        assert_eq!(text.lines().count(), 6);
        assert!(text.lines().nth(1).expect("data row").starts_with("0,0.050000,"));
    }

    #[test]
    fn missing_temperature_exports_an_empty_field() {
        let mut r = record(0);
        r.temp_c = None;
        let mut buf = Vec::new();
        write_records(&[r], &mut buf).expect("in-memory write");
        let text = String::from_utf8(buf).expect("valid utf-8");
        assert!(text.lines().nth(1).expect("data row").ends_with(','));
    }
}
