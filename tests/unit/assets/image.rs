use super::*;

#[test]
fn straight_bytes_are_kept_exactly() {
    let bytes = [200, 100, 50, 255, 10, 20, 30, 0, 255, 0, 0, 128];
    let img = RasterImage::from_rgba8(3, 1, &bytes).unwrap();
    assert_eq!(img.to_pixels().data(), &bytes);
    assert_eq!(img.size(), Size::new(3.0, 1.0));
}

#[test]
fn wrong_length_is_rejected() {
    assert!(RasterImage::from_rgba8(2, 2, &[0; 15]).is_err());
    assert!(RasterImage::from_rgba8(MAX_IMAGE_SIDE + 1, 1, &[]).is_err());
}

#[test]
fn pixmap_is_premultiplied() {
    let img = RasterImage::from_rgba8(2, 1, &[255, 0, 0, 128, 0, 0, 255, 255]).unwrap();
    let texels: Vec<[u8; 4]> = img.pixmap.data().iter().map(|p| p.to_u8_array()).collect();
    assert_eq!(texels, vec![[128, 0, 0, 128], [0, 0, 255, 255]]);
    assert!(img.paint().is_some());
}

#[test]
fn empty_images_have_no_paint() {
    assert!(RasterImage::solid(0, 3, [1, 2, 3, 4]).paint().is_none());
}

#[test]
fn canvas_texels_unpremultiply() {
    let img = RasterImage::from_premul(2, 1, &[[0.5, 0.25, 0.0, 0.5], [0.0; 4]]);
    assert_eq!(img.to_pixels().data(), &[255, 128, 0, 128, 0, 0, 0, 0]);
}

#[test]
fn decode_png() {
    let src = ::image::RgbaImage::from_raw(1, 1, vec![100, 50, 200, 255]).unwrap();
    let mut bytes = Vec::new();
    ::image::DynamicImage::ImageRgba8(src)
        .write_to(&mut std::io::Cursor::new(&mut bytes), ::image::ImageFormat::Png)
        .unwrap();
    let img = RasterImage::decode(&bytes).unwrap();
    assert_eq!(img.size(), Size::new(1.0, 1.0));
    assert_eq!(img.to_pixels().data(), &[100, 50, 200, 255]);
    assert!(RasterImage::decode(b"nope").is_err());
}
