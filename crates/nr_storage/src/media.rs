use nr_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Directory, relative to the media root, that article images go into.
pub const IMAGE_DIR: &str = "article_images";

/// Writes uploaded article images below a media root and hands back the
/// relative path that gets stored on the article.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save_image(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let extension = image_extension(file_name)?;
        if bytes.is_empty() {
            return Err(Error::validation("image", "The submitted file is empty."));
        }

        let relative = format!("{}/{}.{}", IMAGE_DIR, Uuid::new_v4(), extension);
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        debug!("Saved upload {} as {}", file_name, path.display());
        Ok(relative)
    }
}

/// Lowercased extension of `file_name` if it is an accepted image type.
pub fn image_extension(file_name: &str) -> Result<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(Error::validation(
            "image",
            format!(
                "File extension \"{}\" is not allowed. Allowed extensions are: {}.",
                extension,
                ALLOWED_IMAGE_EXTENSIONS.join(", ")
            ),
        ))
    }
}
