use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("failed to read attachment {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Image MIME type for a file name, judged by its extension.
pub fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Reads an image into a `data:` URL. Files that are not images yield `Ok(None)` without being
/// read.
#[instrument]
pub async fn read_image(path: &Path) -> Result<Option<String>, AttachmentError> {
    let Some(mime) = image_mime(path) else {
        debug!("Ignoring non-image attachment");
        return Ok(None);
    };
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| AttachmentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(len = bytes.len(), mime, "Read attachment");
    Ok(Some(data_url(mime, &bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_image_extensions() {
        assert_eq!(image_mime(Path::new("a/photo.JPG")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("icon.svg")), Some("image/svg+xml"));
        assert_eq!(image_mime(Path::new("notes.txt")), None);
        assert_eq!(image_mime(Path::new("README")), None);
    }

    #[tokio::test]
    async fn encodes_images_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("dot.png");
        std::fs::write(&png, [0x89, b'P', b'N', b'G']).unwrap();
        assert_eq!(
            read_image(&png).await.unwrap().as_deref(),
            Some("data:image/png;base64,iVBORw==")
        );

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, "hello").unwrap();
        assert_eq!(read_image(&txt).await.unwrap(), None);

        let missing = dir.path().join("gone.gif");
        assert!(matches!(
            read_image(&missing).await,
            Err(AttachmentError::Read { .. })
        ));
    }
}
