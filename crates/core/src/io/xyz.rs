//! XYZ text point files
//!
//! One point per line: `x y [attr ...]`, separated by tabs, commas,
//! semicolons or spaces. A non-numeric first line is read as a header that
//! names the columns. Blank lines, `#` comments, `*` part separators and
//! single-number point-count lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};

/// Read an XYZ file into point features
pub fn read_xyz<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let file = File::open(path.as_ref())?;
    read_xyz_from(BufReader::new(file))
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_column_name(index: usize) -> String {
    match index {
        0 => "X".to_string(),
        1 => "Y".to_string(),
        2 => "Z".to_string(),
        i => format!("F{}", i + 1),
    }
}

/// Read XYZ records from any buffered reader
pub fn read_xyz_from<R: BufRead>(reader: R) -> Result<FeatureCollection> {
    let mut features = FeatureCollection::new();
    let mut header: Option<Vec<String>> = None;
    let mut seen_content = false;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('*') {
            continue;
        }

        let fields = split_fields(trimmed);
        if fields.len() == 1 && fields[0].parse::<u64>().is_ok() {
            continue;
        }

        let x = fields.first().and_then(|s| s.parse::<f64>().ok());
        let y = fields.get(1).and_then(|s| s.parse::<f64>().ok());

        let (x, y) = match (x, y) {
            (Some(x), Some(y)) => (x, y),
            _ if !seen_content => {
                header = Some(fields.iter().map(|s| s.to_string()).collect());
                seen_content = true;
                continue;
            }
            _ => {
                return Err(Error::Parse {
                    line: line_no,
                    reason: format!("expected numeric x and y, got '{}'", trimmed),
                })
            }
        };
        seen_content = true;

        let mut feature = Feature::point(x, y);
        for (col, raw) in fields.iter().enumerate().skip(2) {
            let name = header
                .as_ref()
                .and_then(|h| h.get(col).cloned())
                .unwrap_or_else(|| default_column_name(col));
            let value = match raw.parse::<f64>() {
                Ok(v) => AttributeValue::Float(v),
                Err(_) => AttributeValue::String(raw.to_string()),
            };
            feature.set_property(name, value);
        }
        features.push(feature);
    }

    tracing::debug!(points = features.len(), "read XYZ records");
    Ok(features)
}

/// Which attributes follow the coordinates on each exported line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XyzFields {
    /// One named attribute; features without it are skipped
    Single(String),
    /// Every attribute of the collection, in [`FeatureCollection::field_names`] order
    All,
}

/// Line written before each geometry part
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PartSeparator {
    #[default]
    None,
    /// A line holding `*`
    Asterisk,
    /// A line holding the part's vertex count
    PointCount,
}

/// Options for writing XYZ files
#[derive(Debug, Clone)]
pub struct XyzOptions {
    pub fields: XyzFields,
    /// Write a `X Y <fields>` header line
    pub header: bool,
    pub separator: PartSeparator,
}

impl XyzOptions {
    /// Single attribute, header line, no part separators
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            fields: XyzFields::Single(name.into()),
            header: true,
            separator: PartSeparator::None,
        }
    }
}

/// Write every vertex of every feature as tab separated `x y value...` lines.
///
/// Returns the number of vertex records written.
pub fn write_xyz<P: AsRef<Path>>(features: &FeatureCollection, path: P, options: &XyzOptions) -> Result<usize> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    let written = write_xyz_to(features, &mut writer, options)?;
    writer.flush()?;
    Ok(written)
}

/// Text for one exported value; missing and null values become `NaN` so
/// columns stay aligned
fn field_text(value: Option<&AttributeValue>) -> String {
    match value {
        None | Some(AttributeValue::Null) => "NaN".to_string(),
        Some(v) => v.to_string(),
    }
}

/// Write XYZ records to any writer
pub fn write_xyz_to<W: Write>(features: &FeatureCollection, writer: &mut W, options: &XyzOptions) -> Result<usize> {
    let (columns, required) = match &options.fields {
        XyzFields::Single(field) => {
            if !features.is_empty() && features.iter().all(|f| f.get_property(field).is_none()) {
                return Err(Error::InvalidParameter {
                    name: "field",
                    value: field.clone(),
                    reason: "attribute not present on any feature".into(),
                });
            }
            (vec![field.clone()], true)
        }
        XyzFields::All => (features.field_names(), false),
    };

    if options.header {
        write!(writer, "X\tY")?;
        for name in &columns {
            write!(writer, "\t{}", name)?;
        }
        writeln!(writer)?;
    }

    let mut written = 0;
    for feature in features.iter() {
        if required && columns.iter().any(|c| feature.get_property(c).is_none()) {
            continue;
        }
        let values: Vec<String> = columns.iter().map(|c| field_text(feature.get_property(c))).collect();

        for part in feature.parts() {
            match options.separator {
                PartSeparator::None => {}
                PartSeparator::Asterisk => writeln!(writer, "*")?,
                PartSeparator::PointCount => writeln!(writer, "{}", part.len())?,
            }
            for c in part {
                write!(writer, "{}\t{}", c.x, c.y)?;
                for v in &values {
                    write!(writer, "\t{}", v)?;
                }
                writeln!(writer)?;
                written += 1;
            }
        }
    }

    tracing::debug!(points = written, "wrote XYZ records");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, MultiLineString};
    use std::io::Cursor;

    #[test]
    fn test_read_with_header() {
        let text = "X\tY\tELEV\tNAME\n0\t0\t10.5\tA\n1,2,20,B\n\n# comment\n3 4 30 C\n";
        let fc = read_xyz_from(Cursor::new(text)).unwrap();

        assert_eq!(fc.len(), 3);
        let f = &fc.features[1];
        assert_eq!(f.coords()[0].x, 1.0);
        assert_eq!(f.coords()[0].y, 2.0);
        assert_eq!(f.get_property("ELEV"), Some(&AttributeValue::Float(20.0)));
        assert_eq!(f.get_property("NAME"), Some(&AttributeValue::String("B".into())));
    }

    #[test]
    fn test_read_without_header_uses_default_names() {
        let text = "*\n3\n0 0 1 7\n1 0 2 8\n0 1 3 9\n";
        let fc = read_xyz_from(Cursor::new(text)).unwrap();

        assert_eq!(fc.len(), 3);
        assert_eq!(fc.field_names(), vec!["F4".to_string(), "Z".to_string()]);
        assert_eq!(fc.features[2].get_property("Z").and_then(|v| v.as_f64()), Some(3.0));
    }

    #[test]
    fn test_read_reports_bad_line() {
        let text = "0 0 1\nfoo bar 2\n";
        let err = read_xyz_from(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_write_then_read() {
        let fc: FeatureCollection = vec![
            Feature::point(0.5, 1.5).with_property("Z", AttributeValue::Float(3.25)),
            Feature::point(2.0, 4.0),
            Feature::point(5.0, 6.0).with_property("Z", AttributeValue::Int(7)),
        ]
        .into_iter()
        .collect();

        let mut buf = Vec::new();
        let written = write_xyz_to(&fc, &mut buf, &XyzOptions::field("Z")).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("X\tY\tZ\n"));

        let back = read_xyz_from(Cursor::new(text)).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.features[1].get_property("Z").and_then(|v| v.as_f64()), Some(7.0));
    }

    #[test]
    fn test_write_unknown_field() {
        let fc: FeatureCollection = vec![Feature::point(0.0, 0.0)].into_iter().collect();
        let mut buf = Vec::new();
        let options = XyzOptions {
            header: false,
            ..XyzOptions::field("Z")
        };
        assert!(write_xyz_to(&fc, &mut buf, &options).is_err());
    }

    #[test]
    fn test_write_part_separators() {
        let lines = MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 2.0, y: 2.0), (x: 3.0, y: 2.0), (x: 3.0, y: 3.0)],
        ]);
        let fc: FeatureCollection = vec![
            Feature::new(lines.into()).with_property("Z", AttributeValue::Float(5.0)),
            Feature::point(9.0, 9.0).with_property("Z", AttributeValue::Float(6.0)),
        ]
        .into_iter()
        .collect();

        let mut buf = Vec::new();
        let options = XyzOptions {
            separator: PartSeparator::PointCount,
            ..XyzOptions::field("Z")
        };
        assert_eq!(write_xyz_to(&fc, &mut buf, &options).unwrap(), 6);
        let text = String::from_utf8(buf).unwrap();
        let counts: Vec<&str> = text.lines().filter(|l| !l.contains('\t')).collect();
        assert_eq!(counts, vec!["2", "3", "1"]);
        assert_eq!(read_xyz_from(Cursor::new(text)).unwrap().len(), 6);

        let mut buf = Vec::new();
        let options = XyzOptions {
            separator: PartSeparator::Asterisk,
            header: false,
            ..XyzOptions::field("Z")
        };
        write_xyz_to(&fc, &mut buf, &options).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().filter(|l| *l == "*").count(), 3);
        assert!(text.starts_with("*\n0\t0\t5\n"));

        let back = read_xyz_from(Cursor::new(text)).unwrap();
        assert_eq!(back.len(), 6);
        assert_eq!(back.features[5].get_property("Z").and_then(|v| v.as_f64()), Some(6.0));
    }

    #[test]
    fn test_write_all_fields() {
        let fc: FeatureCollection = vec![
            Feature::point(0.0, 0.0)
                .with_property("Z", AttributeValue::Float(1.5))
                .with_property("CLASS", AttributeValue::Int(2)),
            Feature::point(1.0, 0.0).with_property("Z", AttributeValue::Float(2.5)),
        ]
        .into_iter()
        .collect();

        let mut buf = Vec::new();
        let options = XyzOptions {
            fields: XyzFields::All,
            header: true,
            separator: PartSeparator::None,
        };
        assert_eq!(write_xyz_to(&fc, &mut buf, &options).unwrap(), 2);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("X\tY\tCLASS\tZ\n"));

        let back = read_xyz_from(Cursor::new(text)).unwrap();
        assert_eq!(back.field_names(), vec!["CLASS".to_string(), "Z".to_string()]);
        assert_eq!(back.features[0].get_property("CLASS").and_then(|v| v.as_f64()), Some(2.0));
        assert!(back.features[1]
            .get_property("CLASS")
            .and_then(|v| v.as_f64())
            .is_some_and(f64::is_nan));
        assert_eq!(back.features[1].get_property("Z").and_then(|v| v.as_f64()), Some(2.5));
    }
}
