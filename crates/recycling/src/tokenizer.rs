//! Tokenizer for the line-oriented global-positions format.
//!
//! One record per line:
//!
//! ```text
//! file: <image-filename>;<metadata-field-1>;<metadata-field-2>;...
//! ```
//!
//! The metadata fields encode correlation/position data whose internal
//! structure is opaque here; they are carried verbatim.

use std::collections::HashMap;

/// One line of a stitching vector file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchingRecord {
    /// Filename of the tile this record positions
    pub image_name: String,
    /// All remaining `;`-delimited fields, copied verbatim
    pub metadata_fields: Vec<String>,
}

impl StitchingRecord {
    /// Parse a single line.
    ///
    /// Returns `None` for lines that do not carry a `"<label>: "` prefix in
    /// their first field (including empty lines); malformed lines are
    /// skipped rather than rejected.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split(';');
        let first = fields.next()?;
        let (_, image_name) = first.split_once(": ")?;
        if image_name.is_empty() {
            return None;
        }
        Some(Self {
            image_name: image_name.to_string(),
            metadata_fields: fields.map(str::to_string).collect(),
        })
    }

    /// Serialize back to the line format (without a line terminator)
    pub fn to_line(&self) -> String {
        let mut line = format!("file: {}", self.image_name);
        for field in &self.metadata_fields {
            line.push(';');
            line.push_str(field);
        }
        line
    }
}

/// Parse the whole vector text into a filename-keyed mapping.
///
/// Duplicate filenames overwrite: the last occurrence wins.
pub fn parse_positions(text: &str) -> HashMap<String, Vec<String>> {
    let mut positions = HashMap::new();
    for line in text.lines() {
        if let Some(record) = StitchingRecord::parse(line) {
            positions.insert(record.image_name, record.metadata_fields);
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let record = StitchingRecord::parse(
            "file: S1_R1_C1-C11_A1_y000_x000_c000.ome.tif;corr: 0.9;position: (0, 0)",
        )
        .unwrap();

        assert_eq!(record.image_name, "S1_R1_C1-C11_A1_y000_x000_c000.ome.tif");
        assert_eq!(
            record.metadata_fields,
            vec!["corr: 0.9".to_string(), "position: (0, 0)".to_string()]
        );
    }

    #[test]
    fn test_parse_record_without_metadata() {
        let record = StitchingRecord::parse("file: tile.ome.tif").unwrap();
        assert_eq!(record.image_name, "tile.ome.tif");
        assert!(record.metadata_fields.is_empty());
    }

    #[test]
    fn test_parse_skips_unlabelled_lines() {
        assert!(StitchingRecord::parse("").is_none());
        assert!(StitchingRecord::parse("no separator here").is_none());
        assert!(StitchingRecord::parse("file: ").is_none());
    }

    #[test]
    fn test_line_round_trip() {
        let line = "file: tile.ome.tif;100;200";
        let record = StitchingRecord::parse(line).unwrap();
        assert_eq!(record.to_line(), line);
    }

    #[test]
    fn test_parse_positions_last_wins() {
        let text = "file: a.ome.tif;1;2\nfile: b.ome.tif;3;4\nfile: a.ome.tif;5;6\n";
        let positions = parse_positions(text);

        assert_eq!(positions.len(), 2);
        assert_eq!(positions["a.ome.tif"], vec!["5", "6"]);
        assert_eq!(positions["b.ome.tif"], vec!["3", "4"]);
    }
}
