//! In-process word-processor writer (docx-rs).

use super::EngineError;
use docx_rs::{Docx, Paragraph, Run};
use std::io::{Cursor, Seek, Write};
use std::path::Path;

/// Split plain text into paragraph lines.
///
/// One paragraph per line; blank lines are kept as empty paragraphs so the
/// vertical rhythm of the source survives. A trailing newline does not
/// produce an extra paragraph.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.lines().map(|l| l.trim_end_matches('\r')).collect()
}

fn build(text: &str) -> Docx {
    paragraphs(text).into_iter().fold(Docx::new(), |doc, line| {
        let para = if line.is_empty() {
            Paragraph::new()
        } else {
            Paragraph::new().add_run(Run::new().add_text(line))
        };
        doc.add_paragraph(para)
    })
}

fn pack<W: Write + Seek>(doc: Docx, writer: W) -> Result<(), EngineError> {
    doc.build()
        .pack(writer)
        .map_err(|e| EngineError::Docx(e.to_string()))?;
    Ok(())
}

/// Write `text` as a `.docx` document at `output`. Blocking.
pub fn write_paragraphs(text: &str, output: &Path) -> Result<(), EngineError> {
    let file = std::fs::File::create(output).map_err(|e| EngineError::Io {
        engine: "docx-writer",
        source: e,
    })?;
    pack(build(text), file)
}

/// Build a one-paragraph document in memory to confirm the writer works.
pub fn probe() -> Result<(), EngineError> {
    let mut buf = Cursor::new(Vec::new());
    pack(build("probe"), &mut buf)?;
    if buf.get_ref().is_empty() {
        return Err(EngineError::InvalidOutput {
            engine: "docx-writer",
            detail: "empty archive".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_become_empty_paragraphs() {
        assert_eq!(paragraphs("a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(paragraphs("one\r\ntwo"), vec!["one", "two"]);
        assert!(paragraphs("").is_empty());
    }

    #[test]
    fn writes_a_zip_archive() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.docx");
        write_paragraphs("hello\nworld", &out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"PK"), "docx is a zip container");
    }

    #[test]
    fn probe_succeeds() {
        probe().unwrap();
    }
}
