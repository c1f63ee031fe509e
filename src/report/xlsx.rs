use crate::core::model::SummaryTable;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Style 1 is the bold header.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

/// Writes `table` as a single-sheet workbook. The file is staged next to
/// `path` and only renamed into place once complete.
pub fn write(path: &Path, table: &SummaryTable) -> Result<()> {
    let tmp_path = tmp_sibling(path);
    let file = File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let result = write_entries(&mut zip, table);

    match result.and_then(|_| {
        zip.finish()
            .map(|_| ())
            .with_context(|| "failed to finalize workbook")
    }) {
        Ok(()) => {
            fs::rename(&tmp_path, path)
                .with_context(|| format!("failed to move workbook to {}", path.display()))?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_entries(zip: &mut ZipWriter<File>, table: &SummaryTable) -> Result<()> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SHEET_NAME
    );
    let sheet = sheet_xml(table)?;

    let parts: [(&str, &str); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", &workbook),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/styles.xml", STYLES),
        ("xl/worksheets/sheet1.xml", &sheet),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)
            .with_context(|| format!("failed to add {} to workbook", name))?;
        zip.write_all(body.as_bytes())?;
    }
    Ok(())
}

fn sheet_xml(table: &SummaryTable) -> Result<String> {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    write!(out, "<row r=\"1\">")?;
    for (col, name) in SummaryTable::COLUMNS.iter().enumerate() {
        text_cell(&mut out, col, 1, name, true)?;
    }
    out.push_str("</row>");

    for (i, row) in table.rows.iter().enumerate() {
        let r = i + 2;
        write!(out, "<row r=\"{}\">", r)?;
        text_cell(&mut out, 0, r, &row.sample, false)?;
        if let Some(total) = &row.total_reads {
            text_cell(&mut out, 1, r, total, false)?;
        }
        number_cell(&mut out, 2, r, row.unique_pct)?;
        number_cell(&mut out, 3, r, row.multi_pct)?;
        number_cell(&mut out, 4, r, row.unmapped_short_pct)?;
        out.push_str("</row>");
    }

    out.push_str("</sheetData></worksheet>");
    Ok(out)
}

fn text_cell(out: &mut String, col: usize, row: usize, text: &str, header: bool) -> Result<()> {
    let style = if header { " s=\"1\"" } else { "" };
    write!(
        out,
        "<c r=\"{}{}\" t=\"inlineStr\"{}><is><t xml:space=\"preserve\">{}</t></is></c>",
        column_name(col),
        row,
        style,
        escape_xml(text)
    )?;
    Ok(())
}

fn number_cell(out: &mut String, col: usize, row: usize, v: f64) -> Result<()> {
    write!(
        out,
        "<c r=\"{}{}\"><v>{}</v></c>",
        column_name(col),
        row,
        v
    )?;
    Ok(())
}

/// 0 -> "A", 25 -> "Z", 26 -> "AA".
fn column_name(mut col: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::SummaryRow;
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use std::io::Read;

    fn sample_table() -> SummaryTable {
        SummaryTable {
            rows: vec![
                SummaryRow {
                    sample: "SampleA".to_string(),
                    total_reads: Some("1000000".to_string()),
                    unique_pct: 90.12,
                    multi_pct: 5.0,
                    unmapped_short_pct: 2.5,
                },
                SummaryRow {
                    sample: "B&C".to_string(),
                    total_reads: None,
                    unique_pct: 70.0,
                    multi_pct: 20.25,
                    unmapped_short_pct: 9.75,
                },
            ],
        }
    }

    fn read_entry(path: &Path, name: &str) -> String {
        let file = File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut s = String::new();
        entry.read_to_string(&mut s).unwrap();
        s
    }

    fn read_sheet(path: &Path) -> Vec<Vec<Data>> {
        let mut wb: Xlsx<_> = open_workbook(path).unwrap();
        let range = wb.worksheet_range(SHEET_NAME).unwrap();
        range.rows().map(|r| r.to_vec()).collect()
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn round_trip_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.xlsx");
        write(&path, &sample_table()).unwrap();
        assert!(!tmp_sibling(&path).exists());

        let rows = read_sheet(&path);
        assert_eq!(rows.len(), 3);
        let header: Vec<Data> = SummaryTable::COLUMNS.iter().map(|c| text(c)).collect();
        assert_eq!(rows[0], header);
        assert_eq!(
            rows[1],
            vec![
                text("SampleA"),
                text("1000000"),
                Data::Float(90.12),
                Data::Float(5.0),
                Data::Float(2.5),
            ]
        );
        assert_eq!(
            rows[2],
            vec![
                text("B&C"),
                Data::Empty,
                Data::Float(70.0),
                Data::Float(20.25),
                Data::Float(9.75),
            ]
        );
    }

    #[test]
    fn workbook_parts_are_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.xlsx");
        write(&path, &sample_table()).unwrap();
        assert!(read_entry(&path, "[Content_Types].xml").contains("sheet1.xml"));
        assert!(read_entry(&path, "xl/workbook.xml").contains("name=\"Sheet1\""));
    }

    #[test]
    fn empty_table_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        write(&path, &SummaryTable::default()).unwrap();
        let rows = read_sheet(&path);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), SummaryTable::COLUMNS.len());
        assert_eq!(rows[0][0], text("Sample"));
    }

    #[test]
    fn unwritable_target_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("s.xlsx");
        assert!(write(&path, &sample_table()).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(4), "E");
        assert_eq!(column_name(26), "AA");
    }
}
