use std::collections::HashMap;

use axum::extract::Multipart;

use crate::api::ImagePart;

/// Result type used by the multipart form helpers.
pub type UploadResult<T> = Result<T, UploadError>;

/// Error returned while parsing or validating a multipart form. The message
/// is user-facing and ends up in a flash banner.
#[derive(Debug)]
pub struct UploadError {
    message: String,
}

impl UploadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UploadError {}

/// Parsed multipart form: plain text fields plus at most one image, held in
/// memory so it can be relayed straight to the backend API.
#[derive(Debug, Default)]
pub struct FormOutcome {
    pub image: Option<ImagePart>,
    text_fields: HashMap<String, String>,
}

impl FormOutcome {
    pub fn text(&self, field_name: &str) -> &str {
        self.text_fields
            .get(field_name)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Extensions accepted for cover and portrait uploads.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Reads a multipart form, collecting text fields and the single image field
/// named `image_field`.
///
/// The image's extension must be on the `jpg`/`jpeg`/`png` allow-list, and
/// the content type the browser declared for the part must be a jpeg or png
/// type when present. The outgoing content type is still derived from the
/// extension. A form without the image yields `image: None` so the handler
/// can flash its own "cover is required" message.
pub async fn read_form(mut multipart: Multipart, image_field: &str) -> UploadResult<FormOutcome> {
    let mut outcome = FormOutcome::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::new(format!("The form could not be read: {err}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let original_name = field.file_name().map(str::to_string);
        match original_name {
            Some(filename) if name == image_field => {
                if filename.is_empty() {
                    continue;
                }
                let Some(extension) = extension_of(&filename) else {
                    return Err(UploadError::new(
                        "The image file has no extension; jpg, jpeg or png is required.",
                    ));
                };
                if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
                    return Err(UploadError::new(
                        "The file must be a jpg, jpeg or png image.",
                    ));
                }
                if let Some(declared) = field.content_type() {
                    if !is_allowed_image_mime(declared) {
                        return Err(UploadError::new(
                            "The file must be a jpeg or png image.",
                        ));
                    }
                }

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| UploadError::new(format!("The upload was interrupted: {err}")))?;
                if bytes.is_empty() {
                    return Err(UploadError::new("The uploaded image is empty."));
                }

                outcome.image = Some(ImagePart {
                    filename,
                    content_type: content_type_for(&extension).to_string(),
                    bytes: bytes.to_vec(),
                });
            }
            Some(_) => {
                // A file under an unexpected field name is dropped rather
                // than relayed.
            }
            _ => {
                let value = field.text().await.map_err(|err| {
                    UploadError::new(format!("The form could not be read: {err}"))
                })?;
                outcome.text_fields.insert(name, value);
            }
        }
    }

    Ok(outcome)
}

fn extension_of(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

fn content_type_for(extension: &str) -> mime::Mime {
    match extension {
        "png" => mime::IMAGE_PNG,
        _ => mime::IMAGE_JPEG,
    }
}

/// Content types a browser may declare for an uploaded image.
fn is_allowed_image_mime(content_type: &str) -> bool {
    matches!(content_type, "image/jpeg" | "image/jpg" | "image/png")
}

/// Removes HTML tags from a form value before it is relayed to the backend.
/// Rendering still escapes everything; this keeps markup out of the stored
/// catalog data.
pub fn strip_html_tags(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut inside_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => inside_tag = true,
            '>' if inside_tag => inside_tag = false,
            _ if !inside_tag => cleaned.push(ch),
            _ => {}
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("Cover.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension_of("archive.tar.png").as_deref(), Some("png"));
        assert_eq!(extension_of("noextension"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn content_types_follow_the_extension() {
        assert_eq!(content_type_for("png"), mime::IMAGE_PNG);
        assert_eq!(content_type_for("jpg"), mime::IMAGE_JPEG);
        assert_eq!(content_type_for("jpeg"), mime::IMAGE_JPEG);
    }

    #[test]
    fn missing_text_fields_read_as_empty() {
        let outcome = FormOutcome::default();
        assert_eq!(outcome.text("title"), "");
    }

    #[test]
    fn declared_content_types_are_restricted_to_images() {
        assert!(is_allowed_image_mime("image/jpeg"));
        assert!(is_allowed_image_mime("image/jpg"));
        assert!(is_allowed_image_mime("image/png"));
        assert!(!is_allowed_image_mime("application/pdf"));
        assert!(!is_allowed_image_mime("text/html"));
        assert!(!is_allowed_image_mime("image/gif"));
    }

    #[test]
    fn image_can_be_taken_while_text_fields_stay_readable() {
        let mut outcome = FormOutcome::default();
        outcome
            .text_fields
            .insert("title".to_string(), "Watchmen".to_string());
        outcome.image = Some(ImagePart {
            filename: "cover.png".to_string(),
            content_type: mime::IMAGE_PNG.to_string(),
            bytes: vec![1, 2, 3],
        });

        let image = outcome.image.take().expect("the image was just set");
        assert_eq!(image.filename, "cover.png");
        assert_eq!(outcome.text("title"), "Watchmen");
    }

    #[test]
    fn strip_html_tags_drops_markup_and_keeps_text() {
        assert_eq!(
            strip_html_tags("A <b>bold</b> claim <script>x()</script>"),
            "A bold claim x()"
        );
        assert_eq!(strip_html_tags("no markup"), "no markup");
        assert_eq!(strip_html_tags("<br/>"), "");
    }
}
