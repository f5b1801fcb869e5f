use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use eframe::egui::ColorImage;
use image::ImageFormat;
use thiserror::Error;

pub const PICTURE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

#[derive(Debug, Error)]
pub enum PictureError {
    #[error("unsupported picture type {}, expected jpg, jpeg, png or bmp", .0.display())]
    Unsupported(PathBuf),
    #[error("failed to open picture {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode picture {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub fn is_supported_picture(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PICTURE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Decodes a picture file into an egui image.
pub fn load_picture(path: &Path) -> Result<ColorImage, PictureError> {
    if !is_supported_picture(path) {
        return Err(PictureError::Unsupported(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|source| PictureError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = ImageFormat::from_path(path)
        .and_then(|format| image::load_from_memory_with_format(&bytes, format))
        .map_err(|source| PictureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn recognises_extensions_case_insensitively() {
        assert!(is_supported_picture(Path::new("cat.PNG")));
        assert!(is_supported_picture(Path::new("dir/dog.jpeg")));
        assert!(!is_supported_picture(Path::new("notes.txt")));
        assert!(!is_supported_picture(Path::new("no_extension")));
    }

    #[test]
    fn loads_png_into_color_image() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("dot.png");
        RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 255]))
            .save(&path)
            .expect("write png");

        let image = load_picture(&path).expect("decode");
        assert_eq!(image.size, [3, 2]);
        assert_eq!(image.pixels.len(), 6);
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").expect("write");
        assert!(matches!(
            load_picture(&path),
            Err(PictureError::Decode { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("gone.jpg");
        match load_picture(&path) {
            Err(PictureError::Open { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected open error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_extension_is_rejected_before_reading() {
        let err = load_picture(Path::new("missing.gif")).expect_err("unsupported");
        assert!(matches!(err, PictureError::Unsupported(_)));
    }
}
