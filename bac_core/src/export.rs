//! CSV export of a sampled decay curve.

use crate::curve::DecayCurve;
use crate::Result;
use std::io::Write;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CurveRow {
    hours: f64,
    bac: f64,
    band: &'static str,
}

/// Write the curve as `hours,bac,band` rows with a header line
///
/// Returns the number of rows written.
pub fn write_curve_csv<W: Write>(curve: &DecayCurve, writer: W) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);

    for point in curve.points() {
        writer.serialize(CurveRow {
            hours: point.hours,
            bac: point.bac,
            band: point.band().as_str(),
        })?;
    }

    writer.flush()?;
    tracing::debug!("Wrote {} curve rows", curve.len());
    Ok(curve.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::sample_decay_curve;

    #[test]
    fn test_writes_header_and_rows() {
        let curve = sample_decay_curve(0.2, 10.0, 0.02, 3);
        let mut buffer = Vec::new();

        let rows = write_curve_csv(&curve, &mut buffer).unwrap();
        assert_eq!(rows, 3);

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "hours,bac,band");
        assert_eq!(lines[1], "0.0,0.2,red");
        assert_eq!(lines[2], "5.0,0.1,yellow");
        assert_eq!(lines[3], "10.0,0.0,green");
    }

    #[test]
    fn test_empty_curve_writes_nothing() {
        let mut buffer = Vec::new();
        let rows = write_curve_csv(&DecayCurve::default(), &mut buffer).unwrap();
        assert_eq!(rows, 0);
    }
}
