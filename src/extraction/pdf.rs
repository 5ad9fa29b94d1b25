//! Primary extraction path backed by `lopdf`.

use super::ExtractionError;
use lopdf::Document;

/// Parse `bytes` and join the text of every page with newlines.
///
/// Pages whose content cannot be decoded contribute an empty string; only a document that
/// cannot be opened at all is an error.
pub(super) fn extract_pages(bytes: &[u8]) -> Result<String, ExtractionError> {
    let document = Document::load_mem(bytes)
        .map_err(|error| ExtractionError::ParseFailed(error.to_string()))?;

    let pages = document.get_pages();
    let mut texts = Vec::with_capacity(pages.len());
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => texts.push(text),
            Err(error) => {
                tracing::debug!(page = page_number, error = %error, "Page text undecodable");
                texts.push(String::new());
            }
        }
    }
    tracing::debug!(pages = pages.len(), "Parsed PDF pages");
    Ok(texts.join("\n"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Build a minimal PDF whose pages each show one line of Courier text.
    pub(crate) fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let encoded = content.encode().expect("encode content");
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("serialize pdf");
        buffer
    }

    pub(crate) fn single_page_pdf(line: &str) -> Vec<u8> {
        pdf_with_pages(&[line])
    }

    #[test]
    fn pages_are_joined_in_order() {
        let bytes = pdf_with_pages(&["First page", "Second page"]);
        let text = extract_pages(&bytes).expect("extract");
        let normalized = super::super::normalize_whitespace(&text);
        assert_eq!(normalized, "First page Second page");
    }

    #[test]
    fn garbage_bytes_fail_to_open() {
        let error = extract_pages(b"%PDF-1.4 truncated").unwrap_err();
        assert!(matches!(error, ExtractionError::ParseFailed(_)));
    }
}
