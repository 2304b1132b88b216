use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[derive(Default)]
struct CountingSource {
    calls: Arc<AtomicUsize>,
}

impl ImageSource for CountingSource {
    fn fetch(&self, url: &str) -> LoadFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = url.to_owned();
        async move {
            if url.starts_with("bad") {
                Err(AssetError::load(url, "refused"))
            } else {
                Ok(Arc::new(RasterImage::solid(2, 1, [1, 2, 3, 255])))
            }
        }
        .boxed()
    }
}

fn counting() -> (ImageLoader, Arc<AtomicUsize>) {
    let source = CountingSource::default();
    let calls = Arc::clone(&source.calls);
    (ImageLoader::new(source), calls)
}

#[test]
fn concurrent_requests_share_one_fetch() {
    let (loader, calls) = counting();
    let a = loader.load("a.png");
    let b = loader.load("a.png");
    let (a, b) = pollster::block_on(futures::future::join(a, b));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    pollster::block_on(loader.load("a.png")).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(loader.len(), 1);
}

#[test]
fn clones_share_the_cache() {
    let (loader, calls) = counting();
    let other = loader.clone();
    pollster::block_on(loader.load("x")).unwrap();
    pollster::block_on(other.load("x")).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_loads_are_evicted_and_retried() {
    let (loader, calls) = counting();
    let err = pollster::block_on(loader.load("bad.png")).unwrap_err();
    assert_eq!(err.url(), "bad.png");
    assert!(!loader.contains("bad.png"));

    pollster::block_on(loader.load("bad.png")).unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn inserted_images_skip_the_source() {
    let (loader, calls) = counting();
    let img = Arc::new(RasterImage::solid(1, 1, [0, 0, 0, 255]));
    loader.insert("seeded", Arc::clone(&img));
    let got = pollster::block_on(loader.load("seeded")).unwrap();
    assert!(Arc::ptr_eq(&got, &img));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    loader.clear();
    assert!(loader.is_empty());
}

#[test]
fn memory_source_reports_missing_urls() {
    let loader = ImageLoader::new(MemoryImageSource::new().with_image("k", RasterImage::solid(1, 1, [9, 9, 9, 9])));
    assert!(pollster::block_on(loader.load("k")).is_ok());
    let err = pollster::block_on(loader.load("missing")).unwrap_err();
    assert!(matches!(err, AssetError::Load { .. }));
}

#[test]
fn file_source_reads_and_decodes() {
    let dir = std::env::temp_dir().join(format!("laminate-loader-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let png = ::image::RgbaImage::from_raw(2, 2, vec![255; 16]).unwrap();
    png.save(dir.join("white.png")).unwrap();
    std::fs::write(dir.join("junk.png"), b"not an image").unwrap();

    let loader = ImageLoader::new(FileImageSource::with_root(&dir));
    let img = pollster::block_on(loader.load("white.png")).unwrap();
    assert_eq!((img.width(), img.height()), (2, 2));

    let err = pollster::block_on(loader.load("junk.png")).unwrap_err();
    assert!(matches!(err, AssetError::Decode { .. }));
    let err = pollster::block_on(loader.load("absent.png")).unwrap_err();
    assert!(matches!(err, AssetError::Load { .. }));

    std::fs::remove_dir_all(&dir).ok();
}
