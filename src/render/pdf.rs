// Single-page PDF output: the rendered certificate embedded as a full-page
// JPEG image XObject. Page size equals the pixel dimensions in points, the
// same convention the PNG preview uses at 72 dpi.

use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use super::RenderError;

pub fn encode_single_page_pdf(image: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let (width, height) = image.dimensions();

    let mut jpeg_bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, 90)
        .encode(
            image.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| RenderError::EncodeFailure(format!("JPEG encoding failed: {}", e)))?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg_bytes,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    (width as f32).into(),
                    0.into(),
                    0.into(),
                    (height as f32).into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded_content = content
        .encode()
        .map_err(|e| RenderError::EncodeFailure(format!("content stream encoding failed: {}", e)))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded_content));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), (width as f32).into(), (height as f32).into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| RenderError::EncodeFailure(format!("PDF serialization failed: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn produces_a_pdf_header_and_embeds_the_image() {
        let img = RgbImage::from_pixel(8, 4, Rgb([200, 10, 10]));
        let pdf = encode_single_page_pdf(&img).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        // The image dictionary must be present with the right dimensions.
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains("DCTDecode"));
    }
}
