use crate::core::model::{Field, LogRecord};
use anyhow::{Context, Result, bail};
use memchr::memchr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub fn parse_file(path: &Path) -> Result<LogRecord> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_reader(BufReader::new(file)).with_context(|| format!("failed to parse {}", path.display()))
}

/// Reads `<label> | <value>` lines. Lines without `|` are skipped, unknown
/// labels are ignored, and a line with more than one `|` is an error.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<LogRecord> {
    let mut record = LogRecord::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read failed at line {}", idx + 1))?;
        let line = line.trim();
        let bytes = line.as_bytes();
        let Some(pos) = memchr(b'|', bytes) else {
            continue;
        };
        if memchr(b'|', &bytes[pos + 1..]).is_some() {
            bail!(
                "line {}: expected `<label> | <value>`, found {} fields",
                idx + 1,
                line.split('|').count()
            );
        }
        let key = line[..pos].trim();
        let value = line[pos + 1..].trim();
        if let Some(field) = Field::from_label(key) {
            record.set(field, value.to_string());
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const FULL_LOG: &str = "                                 Started job on |\tOct 01 10:00:00
                          Number of input reads |\t1000000
                      Average input read length |\t150
                                    UNIQUE READS:
                   Uniquely mapped reads number |\t901200
                        Uniquely mapped reads % |\t90.12%
                                 MULTI-MAPPING READS:
             % of reads mapped to multiple loci |\t5.00%
                                 UNMAPPED READS:
                 % of reads unmapped: too short |\t2.50%
                     % of reads unmapped: other |\t0.10%
";

    #[test]
    fn extracts_the_four_fields() {
        let rec = parse_reader(Cursor::new(FULL_LOG)).unwrap();
        assert_eq!(rec.len(), 4);
        assert_eq!(rec.get(Field::TotalReads), Some("1000000"));
        assert_eq!(rec.get(Field::Unique), Some("90.12%"));
        assert_eq!(rec.get(Field::Multi), Some("5.00%"));
        assert_eq!(rec.get(Field::UnmappedShort), Some("2.50%"));
    }

    #[test]
    fn order_does_not_matter() {
        let text = "% of reads unmapped: too short | 1%\nnoise\nNumber of input reads | 7\n\
                    % of reads mapped to multiple loci |2%\nUniquely mapped reads %|  3% \n";
        let rec = parse_reader(Cursor::new(text)).unwrap();
        assert_eq!(rec.get(Field::TotalReads), Some("7"));
        assert_eq!(rec.get(Field::Unique), Some("3%"));
        assert_eq!(rec.get(Field::Multi), Some("2%"));
        assert_eq!(rec.get(Field::UnmappedShort), Some("1%"));
    }

    #[test]
    fn unrelated_lines_give_empty_record() {
        let text = "UNIQUE READS:\nMapping speed, Million of reads per hour | 100.5\n\n";
        let rec = parse_reader(Cursor::new(text)).unwrap();
        assert!(rec.is_empty());
    }

    #[test]
    fn extra_delimiter_is_fatal() {
        let text = "Number of input reads | 10 | 20\n";
        let err = parse_reader(Cursor::new(text)).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", FULL_LOG).unwrap();
        let rec = parse_file(file.path()).unwrap();
        assert_eq!(rec.len(), 4);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(parse_file(&dir.path().join("absent_Log.final.out")).is_err());
    }
}
