//! Input dispatch: classify a verification request by declared file kind and
//! decode its payload into something the model can consume.

use crate::model_client::PromptPart;
use crate::table;
use base64::Engine;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use thiserror::Error;
use verifai_shared::VerificationRequest;

pub const PDF_MIME: &str = "application/pdf";
pub const CSV_MIME: &str = "text/csv";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_MIME: &str = "application/vnd.ms-excel";

/// Client-input failures. Messages are returned to the caller verbatim.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("No valid input data or file type provided.")]
    Unsupported,

    #[error("Invalid image data: {0}")]
    Image(String),

    #[error("Invalid media data: {0}")]
    Media(String),

    #[error("Invalid PDF data: {0}")]
    Pdf(String),

    #[error("Invalid Excel data: {0}")]
    Spreadsheet(String),

    #[error("Invalid CSV data: {0}")]
    Csv(String),
}

/// Supported payload kinds, borrowed from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind<'a> {
    Image { data_url: &'a str },
    Media { mime_type: &'a str, data_url: &'a str },
    Text { content: &'a str },
    Pdf { data_url: &'a str },
    Spreadsheet { data_url: &'a str },
    Csv { data_url: &'a str },
    Unsupported,
}

impl<'a> InputKind<'a> {
    /// Pick the payload branch. Order matters: the first matching rule wins,
    /// so `text/csv` with inline text is treated as plain text.
    pub fn classify(req: &'a VerificationRequest) -> Self {
        let Some(file_type) = present(&req.file_type) else {
            return InputKind::Unsupported;
        };
        let image = present(&req.image_data_url);
        let media = present(&req.media_data_url);
        let text = present(&req.text_content);

        if file_type.starts_with("image/") {
            if let Some(data_url) = image {
                return InputKind::Image { data_url };
            }
        }
        if file_type.starts_with("video/") || file_type.starts_with("audio/") {
            if let Some(data_url) = media {
                return InputKind::Media {
                    mime_type: file_type,
                    data_url,
                };
            }
        }
        if file_type.starts_with("text/") {
            if let Some(content) = text {
                return InputKind::Text { content };
            }
        }
        let Some(data_url) = media else {
            return InputKind::Unsupported;
        };
        match file_type {
            PDF_MIME => InputKind::Pdf { data_url },
            XLSX_MIME | XLS_MIME => InputKind::Spreadsheet { data_url },
            CSV_MIME => InputKind::Csv { data_url },
            _ => InputKind::Unsupported,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InputKind::Image { .. } => "image",
            InputKind::Media { .. } => "media",
            InputKind::Text { .. } => "text",
            InputKind::Pdf { .. } => "pdf",
            InputKind::Spreadsheet { .. } => "spreadsheet",
            InputKind::Csv { .. } => "csv",
            InputKind::Unsupported => "unsupported",
        }
    }
}

/// Decoded payload content
#[derive(Debug, Clone)]
pub enum InputContent {
    /// Raster image, encoded for transport only when the request is built
    Image(DynamicImage),
    /// Opaque base64 blob tagged with its MIME type
    Blob { mime_type: String, data: String },
    Text(String),
}

/// A decoded payload plus the short label substituted into prompts.
#[derive(Debug, Clone)]
pub struct DecodedInput {
    pub label: String,
    pub content: InputContent,
}

impl DecodedInput {
    fn text(label: &str, text: String) -> Self {
        Self {
            label: label.to_string(),
            content: InputContent::Text(text),
        }
    }

    /// Convert into a model request part. Images are re-encoded as PNG.
    pub fn into_part(self) -> Result<PromptPart, image::ImageError> {
        match self.content {
            InputContent::Image(img) => {
                let mut buf = Vec::new();
                img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
                Ok(PromptPart::Blob {
                    mime_type: "image/png".to_string(),
                    data: base64::engine::general_purpose::STANDARD.encode(buf),
                })
            }
            InputContent::Blob { mime_type, data } => Ok(PromptPart::Blob { mime_type, data }),
            InputContent::Text(text) => Ok(PromptPart::Text(text)),
        }
    }
}

/// Decode the payload selected by [`InputKind::classify`].
pub fn decode(kind: InputKind<'_>) -> Result<DecodedInput, InputError> {
    match kind {
        InputKind::Image { data_url } => {
            let bytes = decode_data_url(data_url).map_err(InputError::Image)?;
            let img =
                image::load_from_memory(&bytes).map_err(|e| InputError::Image(e.to_string()))?;
            Ok(DecodedInput {
                label: "image".to_string(),
                content: InputContent::Image(img),
            })
        }
        InputKind::Media {
            mime_type,
            data_url,
        } => {
            let data = data_url_body(data_url).map_err(InputError::Media)?;
            let label = mime_type.split('/').next().unwrap_or(mime_type);
            Ok(DecodedInput {
                label: label.to_string(),
                content: InputContent::Blob {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                },
            })
        }
        InputKind::Text { content } => Ok(DecodedInput::text("text content", content.to_string())),
        InputKind::Pdf { data_url } => {
            let bytes = decode_data_url(data_url).map_err(InputError::Pdf)?;
            let text = extract_pdf_text(&bytes).map_err(|e| InputError::Pdf(e.to_string()))?;
            Ok(DecodedInput::text("PDF document", text))
        }
        InputKind::Spreadsheet { data_url } => {
            let bytes = decode_data_url(data_url).map_err(InputError::Spreadsheet)?;
            let text = render_workbook(bytes).map_err(|e| InputError::Spreadsheet(e.to_string()))?;
            Ok(DecodedInput::text("spreadsheet document", text))
        }
        InputKind::Csv { data_url } => {
            let bytes = decode_data_url(data_url).map_err(InputError::Csv)?;
            let text = render_csv(&bytes).map_err(InputError::Csv)?;
            Ok(DecodedInput::text("CSV document", text))
        }
        InputKind::Unsupported => Err(InputError::Unsupported),
    }
}

/// Empty strings count as absent.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Return the base64 body of `<header>,<body>`; the header is discarded.
fn data_url_body(data_url: &str) -> Result<&str, String> {
    data_url
        .split_once(',')
        .map(|(_, body)| body.trim())
        .ok_or_else(|| "data URL is missing the ',' separator".to_string())
}

/// Line breaks and other ASCII whitespace inside the body are ignored, so
/// MIME-wrapped base64 decodes. Any other non-alphabet byte is an error.
fn decode_data_url(data_url: &str) -> Result<Vec<u8>, String> {
    let body: String = data_url_body(data_url)?
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(body)
        .map_err(|e| format!("invalid base64: {}", e))
}

/// Page text in page order, one trailing newline per page.
fn extract_pdf_text(bytes: &[u8]) -> Result<String, lopdf::Error> {
    let doc = lopdf::Document::load_mem(bytes)?;
    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        text.push_str(&doc.extract_text(&[*page_number])?);
        text.push('\n');
    }
    Ok(text)
}

fn render_workbook(bytes: Vec<u8>) -> Result<String, calamine::Error> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let mut text = String::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        text.push_str(&format!("\n--- Sheet: {} ---\n", name));
        text.push_str(&render_range(&range));
        text.push('\n');
    }
    Ok(text)
}

/// First row is the header.
fn render_range(range: &Range<Data>) -> String {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
    let header = rows.next().unwrap_or_default();
    let body: Vec<Vec<String>> = rows.collect();
    table::render(&header, &body)
}

/// Rows shorter than the header are padded; longer rows are rejected.
fn render_csv(bytes: &[u8]) -> Result<String, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let header: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_string)
        .collect();
    if header.is_empty() {
        return Err("No columns to parse from file".to_string());
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() > header.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(format!(
                "Expected {} fields in line {}, saw {}",
                header.len(),
                line,
                record.len()
            ));
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(table::render(&header, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn request(file_type: &str) -> VerificationRequest {
        VerificationRequest {
            object_class: "watch".to_string(),
            file_type: Some(file_type.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_priority_text_before_csv() {
        let mut req = request("text/csv");
        req.text_content = Some("a,b".to_string());
        req.media_data_url = Some("data:text/csv;base64,YSxi".to_string());
        assert!(matches!(InputKind::classify(&req), InputKind::Text { .. }));

        req.text_content = None;
        assert!(matches!(InputKind::classify(&req), InputKind::Csv { .. }));
    }

    #[test]
    fn test_classify_requires_matching_payload_field() {
        let mut req = request("image/png");
        req.media_data_url = Some("data:image/png;base64,AAAA".to_string());
        assert_eq!(InputKind::classify(&req), InputKind::Unsupported);

        let mut req = request("video/mp4");
        req.image_data_url = Some("data:video/mp4;base64,AAAA".to_string());
        assert_eq!(InputKind::classify(&req), InputKind::Unsupported);
    }

    #[test]
    fn test_classify_unsupported_kinds() {
        let mut req = request("application/zip");
        req.media_data_url = Some("data:application/zip;base64,UEsDBA==".to_string());
        assert_eq!(InputKind::classify(&req), InputKind::Unsupported);

        let mut req = VerificationRequest::default();
        req.text_content = Some("hello".to_string());
        assert_eq!(InputKind::classify(&req), InputKind::Unsupported);

        let mut req = request("text/plain");
        req.text_content = Some(String::new());
        assert_eq!(InputKind::classify(&req), InputKind::Unsupported);
    }

    #[test]
    fn test_classify_spreadsheet_mimes() {
        for mime in [XLSX_MIME, XLS_MIME] {
            let mut req = request(mime);
            req.media_data_url = Some("data:x;base64,AAAA".to_string());
            assert!(matches!(InputKind::classify(&req), InputKind::Spreadsheet { .. }));
        }
    }

    #[test]
    fn test_decode_unsupported() {
        let err = decode(InputKind::Unsupported).unwrap_err();
        assert_eq!(err.to_string(), "No valid input data or file type provided.");
    }

    #[test]
    fn test_decode_media_passes_base64_through() {
        let decoded = decode(InputKind::Media {
            mime_type: "audio/mpeg",
            data_url: "data:audio/mpeg;base64,SUQzBAAAAAAA",
        })
        .unwrap();
        assert_eq!(decoded.label, "audio");
        match decoded.content {
            InputContent::Blob { mime_type, data } => {
                assert_eq!(mime_type, "audio/mpeg");
                assert_eq!(data, "SUQzBAAAAAAA");
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_decode_media_without_separator() {
        let err = decode(InputKind::Media {
            mime_type: "video/mp4",
            data_url: "AAAA",
        })
        .unwrap_err();
        assert!(matches!(err, InputError::Media(_)));
    }

    #[test]
    fn test_decode_image_png() {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 10, 10]));
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let data_url = format!("data:image/png;base64,{}", b64(&png));

        let decoded = decode(InputKind::Image { data_url: &data_url }).unwrap();
        assert_eq!(decoded.label, "image");
        match decoded.into_part().unwrap() {
            PromptPart::Blob { mime_type, data } => {
                assert_eq!(mime_type, "image/png");
                assert!(!data.is_empty());
            }
            other => panic!("unexpected part: {:?}", other),
        }
    }

    #[test]
    fn test_decode_image_garbage_names_branch() {
        let data_url = format!("data:image/jpeg;base64,{}", b64(b"definitely not a jpeg"));
        let err = decode(InputKind::Image { data_url: &data_url }).unwrap_err();
        assert!(err.to_string().starts_with("Invalid image data: "));
    }

    #[test]
    fn test_decode_bad_base64() {
        let err = decode(InputKind::Pdf {
            data_url: "data:application/pdf;base64,@@@",
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid PDF data: invalid base64"));
    }

    #[test]
    fn test_decode_corrupt_pdf() {
        let data_url = format!("data:application/pdf;base64,{}", b64(b"%PDF-1.4 garbage"));
        let err = decode(InputKind::Pdf { data_url: &data_url }).unwrap_err();
        assert!(matches!(err, InputError::Pdf(_)));
    }

    #[test]
    fn test_decode_corrupt_spreadsheet() {
        let data_url = format!("data:{};base64,{}", XLSX_MIME, b64(b"not a workbook"));
        let err = decode(InputKind::Spreadsheet { data_url: &data_url }).unwrap_err();
        assert!(err.to_string().starts_with("Invalid Excel data: "));
    }

    #[test]
    fn test_decode_csv() {
        let csv = "item,batch\nParacetamol,B-77\nIbuprofen,C-1\n";
        let data_url = format!("data:text/csv;base64,{}", b64(csv.as_bytes()));
        let decoded = decode(InputKind::Csv { data_url: &data_url }).unwrap();
        assert_eq!(decoded.label, "CSV document");
        match decoded.content {
            InputContent::Text(text) => {
                assert!(text.contains("Paracetamol"));
                assert!(text.lines().next().unwrap().contains("batch"));
                assert_eq!(text.lines().count(), 3);
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_decode_empty_csv_fails() {
        let data_url = "data:text/csv;base64,";
        let err = decode(InputKind::Csv { data_url }).unwrap_err();
        assert_eq!(err.to_string(), "Invalid CSV data: No columns to parse from file");
    }

    #[test]
    fn test_decode_csv_ragged_rows_fail() {
        let csv = "a,b\n1,2,3\n";
        let data_url = format!("data:text/csv;base64,{}", b64(csv.as_bytes()));
        let err = decode(InputKind::Csv { data_url: &data_url }).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid CSV data: Expected 2 fields in line 2, saw 3"
        );
    }

    #[test]
    fn test_decode_csv_short_rows_are_padded() {
        let csv = "item,batch,qty\nParacetamol,B-77\nIbuprofen,C-1,12\n";
        let data_url = format!("data:text/csv;base64,{}", b64(csv.as_bytes()));
        let decoded = decode(InputKind::Csv { data_url: &data_url }).unwrap();
        match decoded.content {
            InputContent::Text(text) => {
                let lines: Vec<&str> = text.lines().collect();
                assert_eq!(
                    lines,
                    vec![
                        "       item  batch  qty",
                        "Paracetamol   B-77",
                        "  Ibuprofen    C-1   12",
                    ]
                );
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_decode_wrapped_base64() {
        let encoded = b64(b"item,batch\nParacetamol,B-77\n");
        let (head, tail) = encoded.split_at(8);
        let data_url = format!("data:text/csv;base64,{}\r\n{}\n", head, tail);
        let decoded = decode(InputKind::Csv { data_url: &data_url }).unwrap();
        assert_eq!(decoded.label, "CSV document");

        let err = decode(InputKind::Csv {
            data_url: "data:text/csv;base64,YSxi*YSxi",
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid CSV data: invalid base64"));
    }

    fn workbook_bytes() -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let zeta = workbook.add_worksheet().set_name("Zeta").unwrap();
        zeta.write_string(0, 0, "lot").unwrap();
        zeta.write_string(0, 1, "qty").unwrap();
        zeta.write_string(1, 0, "A1").unwrap();
        zeta.write_number(1, 1, 40).unwrap();
        let alpha = workbook.add_worksheet().set_name("Alpha").unwrap();
        alpha.write_string(0, 0, "offset").unwrap();
        workbook.add_worksheet();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_decode_workbook_keeps_sheet_order() {
        let data_url = format!("data:{};base64,{}", XLSX_MIME, b64(&workbook_bytes()));
        let decoded = decode(InputKind::Spreadsheet { data_url: &data_url }).unwrap();
        assert_eq!(decoded.label, "spreadsheet document");
        let text = match decoded.content {
            InputContent::Text(text) => text,
            other => panic!("unexpected content: {:?}", other),
        };

        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(
            lines,
            vec![
                "--- Sheet: Zeta ---",
                "lot  qty",
                " A1   40",
                "--- Sheet: Alpha ---",
                "offset",
                "--- Sheet: Sheet3 ---",
                table::EMPTY_TABLE,
            ]
        );
    }

    #[test]
    fn test_render_range_uses_first_row_as_header() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 1));
        range.set_value((0, 0), Data::String("lot".to_string()));
        range.set_value((0, 1), Data::String("count".to_string()));
        range.set_value((1, 0), Data::String("A1".to_string()));
        range.set_value((1, 1), Data::Int(40));
        range.set_value((2, 0), Data::String("B2".to_string()));
        range.set_value((2, 1), Data::Int(5));

        let text = render_range(&range);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["lot  count", " A1     40", " B2      5"]);
    }
}
