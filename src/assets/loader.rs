use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};

use crate::assets::image::{ImageHandle, RasterImage};
use crate::foundation::error::AssetError;

/// Future resolving to a loaded image.
pub type LoadFuture = BoxFuture<'static, Result<ImageHandle, AssetError>>;

/// Where image bytes come from. Implementations do no caching of their own.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, url: &str) -> LoadFuture;
}

/// Reads images from the local filesystem.
///
/// `file://` prefixes are stripped; relative paths resolve against `root`
/// when one is set.
#[derive(Clone, Debug, Default)]
pub struct FileImageSource {
    root: Option<PathBuf>,
}

impl FileImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageSource for FileImageSource {
    fn fetch(&self, url: &str) -> LoadFuture {
        let path = self.resolve(url);
        let url = url.to_owned();
        async move {
            let bytes =
                std::fs::read(&path).map_err(|e| AssetError::load(&url, format!("{}: {e}", path.display())))?;
            let image = RasterImage::decode(&bytes).map_err(|e| AssetError::decode(&url, e.to_string()))?;
            Ok(Arc::new(image))
        }
        .boxed()
    }
}

/// Fixed set of images keyed by URL.
#[derive(Clone, Debug, Default)]
pub struct MemoryImageSource {
    images: HashMap<String, ImageHandle>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: impl Into<String>, image: impl Into<ImageHandle>) -> Self {
        self.insert(url, image);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, image: impl Into<ImageHandle>) {
        self.images.insert(url.into(), image.into());
    }
}

impl ImageSource for MemoryImageSource {
    fn fetch(&self, url: &str) -> LoadFuture {
        let res = self
            .images
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::load(url, "no such image"));
        futures::future::ready(res).boxed()
    }
}

type Entries = HashMap<String, Shared<LoadFuture>>;

/// URL-keyed image cache in front of an [`ImageSource`].
///
/// Concurrent requests for one URL share a single in-flight fetch. Failed
/// loads are evicted once they settle, so a later request retries. Clones
/// share the same cache.
#[derive(Clone)]
pub struct ImageLoader {
    source: Arc<dyn ImageSource>,
    entries: Arc<Mutex<Entries>>,
}

impl ImageLoader {
    pub fn new(source: impl ImageSource + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<dyn ImageSource>) -> Self {
        Self {
            source,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load `url`, reusing a cached or in-flight result.
    pub fn load(&self, url: &str) -> LoadFuture {
        let shared = {
            let mut entries = self.entries();
            match entries.get(url) {
                Some(shared) => {
                    tracing::trace!(url, "image cache hit");
                    shared.clone()
                }
                None => {
                    tracing::debug!(url, "image cache miss");
                    let shared = self.source.fetch(url).shared();
                    entries.insert(url.to_owned(), shared.clone());
                    shared
                }
            }
        };

        let entries = Arc::clone(&self.entries);
        let url = url.to_owned();
        async move {
            let res = shared.clone().await;
            if res.is_err() {
                let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
                if entries.get(&url).is_some_and(|s| s.ptr_eq(&shared)) {
                    entries.remove(&url);
                }
            }
            res
        }
        .boxed()
    }

    /// Seed the cache with an already decoded image.
    pub fn insert(&self, url: impl Into<String>, image: ImageHandle) {
        let ready: LoadFuture = futures::future::ready(Ok(image)).boxed();
        self.entries().insert(url.into(), ready.shared());
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("cached", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
