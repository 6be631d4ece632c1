//! Word document output for analysis results

use anyhow::{Context, Result};
use docx_rs::{AlignmentType, BreakType, Docx, Paragraph, Pic, Run, Style, StyleType};
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

use super::AnalyzedImage;
use crate::imaging;
use crate::naming::question_number;

/// Embedded image width
const IMAGE_WIDTH_EMU: u32 = 6 * 914_400;
/// Left indent for the "why other answers" section, in twips (0.25 in)
const ANSWER_INDENT_TWIPS: i32 = 360;
const INDENTED_SECTION_MARKER: &str = "Why other answers";

/// A formatted piece of model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBlock {
    Heading { level: usize, text: String },
    Paragraph { text: String, indented: bool },
}

/// Split model output into headings and paragraphs.
///
/// `# ` lines become headings at `base_level`, `## ` lines one level deeper.
/// Blank lines are dropped.
pub fn parse_response(text: &str, base_level: usize) -> Vec<DocumentBlock> {
    let mut blocks = Vec::new();
    let mut current_heading: Option<String> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(heading) = line.strip_prefix("# ") {
            current_heading = Some(heading.to_string());
            blocks.push(DocumentBlock::Heading {
                level: base_level,
                text: heading.to_string(),
            });
        } else if let Some(heading) = line.strip_prefix("## ") {
            current_heading = Some(heading.to_string());
            blocks.push(DocumentBlock::Heading {
                level: base_level + 1,
                text: heading.to_string(),
            });
        } else {
            let indented = current_heading
                .as_deref()
                .is_some_and(|h| h.contains(INDENTED_SECTION_MARKER));
            blocks.push(DocumentBlock::Paragraph {
                text: line.to_string(),
                indented,
            });
        }
    }

    blocks
}

/// Write the single-image document
pub fn write_analysis_document(image_path: &Path, response: &str, output: &Path) -> Result<()> {
    let mut doc = base_document()
        .add_paragraph(heading("Gemini Analysis", 0).align(AlignmentType::Center))
        .add_paragraph(text_paragraph("Original Question:"));
    doc = add_image(doc, image_path);
    doc = doc.add_paragraph(heading("Gemini Analysis:", 1));
    doc = add_blocks(doc, &parse_response(response, 1));

    save(doc, output)?;
    info!("Analysis saved to {}", output.display());
    Ok(())
}

/// Sort results by the question number in their file names; unnumbered
/// files keep their relative order at the end
pub fn order_results(results: &mut [AnalyzedImage]) {
    results.sort_by_key(|r| file_name(&r.image_path).as_deref().and_then(question_number).unwrap_or(u64::MAX));
}

/// Write all batch results into one document, one section per image
pub fn write_combined_document(results: &[AnalyzedImage], output: &Path) -> Result<()> {
    let mut ordered = results.to_vec();
    order_results(&mut ordered);
    let total = ordered.len();

    let mut doc = base_document()
        .add_paragraph(heading("Combined Gemini Analysis", 0).align(AlignmentType::Center));

    for (i, result) in ordered.iter().enumerate() {
        let name = file_name(&result.image_path).unwrap_or_default();
        let number = question_number(&name)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("(Unknown {})", i + 1));

        doc = doc
            .add_paragraph(heading(&format!("Question {} of {}", number, total), 1))
            .add_paragraph(text_paragraph(&format!("Source Image: {}", name)));
        doc = add_image(doc, &result.image_path);
        doc = doc
            .add_paragraph(Paragraph::new())
            .add_paragraph(heading("Gemini Analysis:", 2));
        doc = add_blocks(doc, &parse_response(&result.response.text, 2));

        if i + 1 < total {
            doc = doc.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        }
    }

    save(doc, output)?;
    info!("Combined analysis of {} images saved to {}", total, output.display());
    Ok(())
}

fn base_document() -> Docx {
    Docx::new()
        .add_style(heading_style("Title", "Title", 52))
        .add_style(heading_style("Heading1", "Heading 1", 32))
        .add_style(heading_style("Heading2", "Heading 2", 26))
        .add_style(heading_style("Heading3", "Heading 3", 24))
}

fn heading_style(id: &str, name: &str, half_points: usize) -> Style {
    Style::new(id, StyleType::Paragraph)
        .name(name)
        .size(half_points)
        .bold()
}

/// Level 0 is the document title
fn heading(text: &str, level: usize) -> Paragraph {
    let style = match level {
        0 => "Title".to_string(),
        n => format!("Heading{}", n.min(3)),
    };
    text_paragraph(text).style(&style)
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn add_blocks(mut doc: Docx, blocks: &[DocumentBlock]) -> Docx {
    for block in blocks {
        let paragraph = match block {
            DocumentBlock::Heading { level, text } => heading(text, *level),
            DocumentBlock::Paragraph { text, indented: true } => {
                text_paragraph(text).indent(Some(ANSWER_INDENT_TWIPS), None, None, None)
            }
            DocumentBlock::Paragraph { text, indented: false } => text_paragraph(text),
        };
        doc = doc.add_paragraph(paragraph);
    }
    doc
}

/// Embed the image 6 in wide, or a note explaining why it is missing
fn add_image(doc: Docx, path: &Path) -> Docx {
    match image_picture(path) {
        Ok(pic) => doc.add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic))),
        Err(e) => {
            warn!("Could not embed {}: {:#}", path.display(), e);
            doc.add_paragraph(text_paragraph(&format!("[Error including image: {:#}]", e)))
        }
    }
}

fn image_picture(path: &Path) -> Result<Pic> {
    let image = imaging::load_image(path)?;
    let (width, height) = (image.width().max(1), image.height());
    let png = imaging::encode_png(&image)?;
    let height_emu = (u64::from(IMAGE_WIDTH_EMU) * u64::from(height) / u64::from(width)) as u32;
    Ok(Pic::new(&png).size(IMAGE_WIDTH_EMU, height_emu))
}

fn save(doc: Docx, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    doc.build()
        .pack(file)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResponse;
    use image::DynamicImage;
    use std::path::PathBuf;

    const RESPONSE: &str = "# Question\nWhat is 2+2?\n\n## Options\nA. 3\nB. 4\n# Why other answers are incorrect\nA is off by one.\n";

    fn result(path: PathBuf) -> AnalyzedImage {
        AnalyzedImage {
            image_path: path,
            response: AnalysisResponse {
                question: "Q".to_string(),
                text: RESPONSE.to_string(),
            },
        }
    }

    fn assert_docx(path: &Path) {
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_parse_response_levels_and_indent() {
        let blocks = parse_response(RESPONSE, 1);
        assert_eq!(blocks.len(), 7);
        assert_eq!(
            blocks[0],
            DocumentBlock::Heading { level: 1, text: "Question".to_string() }
        );
        assert_eq!(
            blocks[2],
            DocumentBlock::Heading { level: 2, text: "Options".to_string() }
        );
        assert_eq!(
            blocks[3],
            DocumentBlock::Paragraph { text: "A. 3".to_string(), indented: false }
        );
        assert_eq!(
            blocks[6],
            DocumentBlock::Paragraph { text: "A is off by one.".to_string(), indented: true }
        );
    }

    #[test]
    fn test_parse_response_combined_levels() {
        let blocks = parse_response("# Top\n## Sub\ntext", 2);
        assert!(matches!(blocks[0], DocumentBlock::Heading { level: 2, .. }));
        assert!(matches!(blocks[1], DocumentBlock::Heading { level: 3, .. }));
    }

    #[test]
    fn test_parse_response_hash_without_space_is_text() {
        let blocks = parse_response("#hashtag", 1);
        assert!(matches!(blocks[0], DocumentBlock::Paragraph { .. }));
    }

    #[test]
    fn test_order_results_by_question_number() {
        let mut results = vec![
            result(PathBuf::from("x.png")),
            result(PathBuf::from("q_p1240.png")),
            result(PathBuf::from("q_p3.png")),
        ];
        order_results(&mut results);
        let names: Vec<_> = results
            .iter()
            .map(|r| r.image_path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["q_p3.png", "q_p1240.png", "x.png"]);
    }

    #[test]
    fn test_write_analysis_document() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("q.png");
        DynamicImage::new_rgb8(64, 32).save(&image).unwrap();
        let out = dir.path().join("q_analysis.docx");

        write_analysis_document(&image, RESPONSE, &out).unwrap();
        assert_docx(&out);
    }

    #[test]
    fn test_missing_image_still_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.docx");

        write_analysis_document(&dir.path().join("gone.png"), RESPONSE, &out).unwrap();
        assert_docx(&out);
    }

    #[test]
    fn test_write_combined_document() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a_p2.png");
        let b = dir.path().join("b_p1.jpg");
        DynamicImage::new_rgb8(20, 20).save(&a).unwrap();
        DynamicImage::new_rgb8(20, 40).save(&b).unwrap();
        let out = dir.path().join("nested/Combined_Analysis.docx");

        write_combined_document(&[result(a), result(b)], &out).unwrap();
        assert_docx(&out);
    }
}
