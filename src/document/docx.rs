use crate::document::DocumentError;
use crate::document::DocumentSource;
use crate::document::Table;
use crate::error::AuditError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::ElementExt;
use crate::helpers::xml::TextSink;
use crate::helpers::xml::XmlReader;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::BufRead;
use std::io::Cursor;
use zip::ZipArchive;

/// Main document part of a WordprocessingML package
const DOCUMENT_PART: &str = "word/document.xml";

// XML tag names for parsing WordprocessingML
const TAG_TABLE: QName = QName(b"w:tbl");            // Table
const TAG_ROW: QName = QName(b"w:tr");               // Table row
const TAG_CELL: QName = QName(b"w:tc");              // Table cell
const TAG_GRID_SPAN: QName = QName(b"w:gridSpan");   // Horizontal merge width
const TAG_VERTICAL_MERGE: QName = QName(b"w:vMerge"); // Vertical merge marker
const TAG_PARAGRAPH: QName = QName(b"w:p");          // Paragraph
const TAG_RUN: QName = QName(b"w:r");                // Text run
const TAG_TEXT: QName = QName(b"w:t");               // Text content within runs
const TAG_TAB: QName = QName(b"w:tab");              // Tab character within runs
const TAG_BREAK: QName = QName(b"w:br");             // Line break
const TAG_CARRIAGE_RETURN: QName = QName(b"w:cr");   // Carriage return
const TAG_TEXT_BOX: QName = QName(b"w:txbxContent"); // Text box body anchored inside a run

/// Represents an Office Open XML word-processing document
pub struct DocxDocument {
    /// File name or URL of the document
    name: String,
    /// ZIP archive containing the package parts
    zip: ZipArchive<UnifiedReader>,
    /// Parsed body, filled on first access
    body: Option<DocumentBody>,
}

/// Tables and flattened text of a document body.
#[derive(Debug, Default)]
struct DocumentBody {
    tables: Vec<Table>,
    text: String,
}

impl DocxDocument {
    /// Opens a local `.docx` file or downloads one from an http(s) URL.
    pub fn open(file_name: &str) -> Result<DocxDocument, AuditError> {
        let reader = UnifiedReader::new(file_name)?;
        Self::from_reader(file_name, reader)
    }

    /// Reads a document that is already held in memory.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<DocxDocument, AuditError> {
        Self::from_reader(name, UnifiedReader::Memory(Cursor::new(bytes)))
    }

    fn from_reader(name: &str, reader: UnifiedReader) -> Result<DocxDocument, AuditError> {
        let mut zip = ZipArchive::new(reader)?;
        if zip.file(DOCUMENT_PART)?.is_none() {
            Err(DocumentError::MissingPart {
                name: name.to_owned(),
                part: DOCUMENT_PART.to_owned(),
            })?;
        }
        Ok(DocxDocument {
            name: name.to_owned(),
            zip,
            body: None,
        })
    }

    fn load(&mut self) -> Result<&DocumentBody, AuditError> {
        let body = match self.body.take() {
            Some(body) => body,
            None => {
                let mut reader = self.zip.xml_reader(DOCUMENT_PART)?.ok_or_else(|| DocumentError::MissingPart {
                    name: self.name.to_owned(),
                    part: DOCUMENT_PART.to_owned(),
                })?;
                let body = read_body(&mut reader)?;
                tracing::debug!(
                    document = %self.name,
                    tables = body.tables.len(),
                    "parsed document body"
                );
                body
            }
        };
        Ok(self.body.insert(body))
    }
}

impl DocumentSource for DocxDocument {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn read_tables(&mut self) -> Result<Vec<Table>, AuditError> {
        Ok(self.load()?.tables.clone())
    }

    fn read_text(&mut self) -> Result<String, AuditError> {
        Ok(self.load()?.text.clone())
    }
}

/// How a cell takes part in a vertical merge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum VerticalMerge {
    #[default]
    None,
    Restart,
    Continue,
}

/// Accumulates the grid of one top-level table.
#[derive(Default)]
struct TableBuilder {
    grid: Vec<Vec<String>>,
    row: Vec<String>,
    paragraphs: Vec<String>,
    span: usize,
    merge: VerticalMerge,
}

impl TableBuilder {
    fn start_cell(&mut self) {
        self.paragraphs.clear();
        self.span = 1;
        self.merge = VerticalMerge::None;
    }

    /// Closes the current cell, repeating its text over every grid column it spans.
    /// A vertical-merge continuation shows the text of the cell above it.
    fn finish_cell(&mut self) {
        let column = self.row.len();
        let text = if self.merge == VerticalMerge::Continue {
            self.grid
                .last()
                .and_then(|previous| previous.get(column))
                .cloned()
                .unwrap_or_default()
        } else {
            self.paragraphs.join("\n").trim().to_owned()
        };
        for _ in 0..self.span.max(1) {
            self.row.push(text.clone());
        }
    }

    fn finish_row(&mut self) {
        self.grid.push(std::mem::take(&mut self.row));
    }
}

/// Streams `word/document.xml`, collecting top-level tables and the text of every paragraph.
/// Text box content is skipped: its paragraphs sit inside a run of the enclosing paragraph.
fn read_body<R: BufRead>(reader: &mut XmlReader<R>) -> Result<DocumentBody, AuditError> {
    let mut body = DocumentBody::default();
    let mut lines = Vec::<String>::new();
    let mut depth = 0usize;
    let mut builder = TableBuilder::default();
    let mut paragraph = String::new();
    let mut is_run = false;
    let mut is_text = false;
    let mut text_box_depth = 0usize;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_TEXT_BOX => text_box_depth += 1,
        Event::End(event) if event.name() == TAG_TEXT_BOX => text_box_depth = text_box_depth.saturating_sub(1),
        _ if text_box_depth > 0 => (),
        Event::Start(event) if event.name() == TAG_TABLE => {
            depth += 1;
            if depth == 1 {
                builder = TableBuilder::default();
            }
        }
        Event::End(event) if event.name() == TAG_TABLE => {
            if depth == 1 {
                let grid = std::mem::take(&mut builder.grid);
                body.tables.push(Table::from_grid(body.tables.len(), grid));
            }
            depth = depth.saturating_sub(1);
        }
        Event::End(event) if depth == 1 && event.name() == TAG_ROW => builder.finish_row(),
        Event::Start(event) if depth == 1 && event.name() == TAG_CELL => builder.start_cell(),
        Event::End(event) if depth == 1 && event.name() == TAG_CELL => builder.finish_cell(),
        Event::Start(event) if depth == 1 && event.name() == TAG_GRID_SPAN => {
            builder.span = event.parse_attribute("w:val")?.unwrap_or(1);
        }
        Event::Start(event) if depth == 1 && event.name() == TAG_VERTICAL_MERGE => {
            builder.merge = match event.attribute("w:val")?.as_deref() {
                Some("restart") => VerticalMerge::Restart,
                _ => VerticalMerge::Continue,
            };
        }
        Event::Start(event) if event.name() == TAG_PARAGRAPH => paragraph.clear(),
        Event::End(event) if event.name() == TAG_PARAGRAPH => {
            if depth == 1 {
                builder.paragraphs.push(paragraph.clone());
            }
            lines.push(std::mem::take(&mut paragraph));
        }
        Event::Start(event) if event.name() == TAG_RUN => is_run = true,
        Event::End(event) if event.name() == TAG_RUN => is_run = false,
        Event::Start(event) if is_run && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if event.name() == TAG_TEXT => is_text = false,
        Event::Start(event) if is_run && event.name() == TAG_TAB => paragraph.push('\t'),
        Event::Start(event) if is_run && (event.name() == TAG_BREAK || event.name() == TAG_CARRIAGE_RETURN) => {
            paragraph.push('\n');
        }
        Event::Text(event) if is_text => paragraph.push_text(&event)?,
        Event::CData(event) if is_text => paragraph.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => paragraph.push_reference(&event)?,
    });
    body.text = lines.join("\n");
    Ok(body)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Packs a `word/document.xml` body into a minimal docx archive.
    pub(crate) fn docx_bytes(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(DOCUMENT_PART, SimpleFileOptions::default()).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// One paragraph holding `text` as a single run; markup characters are escaped.
    pub(crate) fn paragraph_xml(text: &str) -> String {
        let text = quick_xml::escape::escape(text);
        format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>")
    }

    /// Renders a simple table, one paragraph per cell.
    pub(crate) fn table_xml(rows: &[&[&str]]) -> String {
        let rows: String = rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|cell| format!("<w:tc>{}</w:tc>", paragraph_xml(cell)))
                    .collect();
                format!("<w:tr>{cells}</w:tr>")
            })
            .collect();
        format!("<w:tbl>{rows}</w:tbl>")
    }

    #[test]
    fn test_reads_tables_in_order() {
        let body = format!(
            "{}{}{}{}",
            paragraph_xml("Protocol 1.0.0.1 and 1.0.0.2"),
            table_xml(&[&["Step #", "Pass/Fail"], &["  a  ", "Pass"]]),
            paragraph_xml("between"),
            table_xml(&[&["Step #"], &["b"], &["c"]]),
        );
        let mut document = DocxDocument::from_bytes("memory.docx", docx_bytes(&body)).unwrap();
        let tables = document.read_tables().unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].index, 0);
        assert_eq!(tables[0].header, vec!["Step #", "Pass/Fail"]);
        assert_eq!(tables[0].rows, vec![vec!["a", "Pass"]]);
        assert_eq!(tables[1].index, 1);
        assert_eq!(tables[1].rows, vec![vec!["b"], vec!["c"]]);

        let text = document.read_text().unwrap();
        assert!(text.starts_with("Protocol 1.0.0.1 and 1.0.0.2\n"));
        assert!(text.contains("between"));
        assert!(text.contains("Pass/Fail"));
    }

    #[test]
    fn test_cell_paragraphs_runs_and_entities() {
        let cell = "<w:tc><w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
            <w:r><w:t>New Value</w:t></w:r><w:r><w:tab/><w:t>A &amp; B</w:t></w:r></w:p>\
            <w:p><w:r><w:t>second</w:t><w:br/><w:t>line</w:t></w:r></w:p></w:tc>";
        let body = format!("<w:tbl><w:tr><w:tc>{}</w:tc></w:tr><w:tr>{cell}</w:tr></w:tbl>", paragraph_xml("Notes"));
        let mut document = DocxDocument::from_bytes("memory.docx", docx_bytes(&body)).unwrap();
        let tables = document.read_tables().unwrap();
        assert_eq!(tables[0].rows[0][0], "New Value\tA & B\nsecond\nline");
    }

    #[test]
    fn test_escaped_cell_text() {
        let body = table_xml(&[&["Executed By & Date"], &["<none>"]]);
        let mut document = DocxDocument::from_bytes("memory.docx", docx_bytes(&body)).unwrap();
        let tables = document.read_tables().unwrap();
        assert_eq!(tables[0].header, vec!["Executed By & Date"]);
        assert_eq!(tables[0].rows, vec![vec!["<none>"]]);
    }

    #[test]
    fn test_text_box_does_not_split_cell_text() {
        let cell = "<w:tc><w:p><w:r><w:t>05-Jan-2024 09:00:00 AM (IST)</w:t></w:r>\
            <w:r><w:pict><w:txbxContent><w:p><w:r><w:t>note</w:t></w:r></w:p></w:txbxContent></w:pict></w:r>\
            <w:r><w:t xml:space=\"preserve\"> signed</w:t></w:r></w:p></w:tc>";
        let body = format!("<w:tbl><w:tr><w:tc>{}</w:tc></w:tr><w:tr>{cell}</w:tr></w:tbl>", paragraph_xml("Executed By & Date"));
        let mut document = DocxDocument::from_bytes("memory.docx", docx_bytes(&body)).unwrap();
        let tables = document.read_tables().unwrap();
        assert_eq!(tables[0].rows, vec![vec!["05-Jan-2024 09:00:00 AM (IST) signed"]]);
        assert!(!document.read_text().unwrap().contains("note"));
    }

    #[test]
    fn test_merged_cells_repeat_text() {
        let body = "<w:tbl>\
            <w:tr><w:tc><w:p><w:r><w:t>Step #</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr>\
            <w:tr><w:tc><w:tcPr><w:vMerge w:val=\"restart\"/></w:tcPr><w:p><w:r><w:t>1</w:t></w:r></w:p></w:tc>\
                  <w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr><w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc></w:tr>\
            <w:tr><w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc><w:tc><w:p><w:r><w:t>x</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>\
            </w:tbl>";
        let mut document = DocxDocument::from_bytes("memory.docx", docx_bytes(body)).unwrap();
        let tables = document.read_tables().unwrap();
        assert_eq!(tables[0].rows[0], vec!["1", "wide", "wide"]);
        assert_eq!(tables[0].rows[1], vec!["1", "x", ""]);
    }

    #[test]
    fn test_nested_tables_stay_out_of_cells() {
        let inner = table_xml(&[&["inner header"], &["inner 9.9.9.9"]]);
        let body = format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc></w:tr><w:tr><w:tc>{}{inner}</w:tc></w:tr></w:tbl>",
            paragraph_xml("Step #"),
            paragraph_xml("outer"),
        );
        let mut document = DocxDocument::from_bytes("memory.docx", docx_bytes(&body)).unwrap();
        let tables = document.read_tables().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows, vec![vec!["outer"]]);
        assert!(document.read_text().unwrap().contains("inner 9.9.9.9"));
    }

    #[test]
    fn test_missing_document_part() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("word/styles.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(matches!(
            DocxDocument::from_bytes("broken.docx", bytes),
            Err(AuditError::DocumentError(DocumentError::MissingPart { .. }))
        ));
    }

    #[test]
    fn test_open_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        file.write_all(&docx_bytes(&table_xml(&[&["Step #"], &["1"]]))).unwrap();
        let path = file.path().to_str().unwrap().to_owned();
        let mut document = crate::document::open_document(&path).unwrap();
        assert_eq!(document.name(), path);
        assert_eq!(document.read_tables().unwrap()[0].rows, vec![vec!["1"]]);
    }
}
