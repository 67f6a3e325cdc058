use image::ImageFormat;

/// Content type and file extension of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageKind {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

const PNG: ImageKind = ImageKind {
    mime_type: "image/png",
    extension: "png",
};

pub fn detect_image_format(bytes: &[u8]) -> ImageKind {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => PNG,
        Ok(ImageFormat::Jpeg) => ImageKind {
            mime_type: "image/jpeg",
            extension: "jpg",
        },
        Ok(ImageFormat::WebP) => ImageKind {
            mime_type: "image/webp",
            extension: "webp",
        },
        Ok(ImageFormat::Gif) => ImageKind {
            mime_type: "image/gif",
            extension: "gif",
        },
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            PNG
        }
    }
}
