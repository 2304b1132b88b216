use super::*;

fn gradient_buffer(w: u32, h: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let px = [(x * 40) as u8, (y * 40) as u8, ((x + y) * 10) as u8, 255];
            set_pixel(&mut buf, i64::from(x), i64::from(y), px);
        }
    }
    buf
}

#[test]
fn from_raw_checks_length() {
    assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
    assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_err());
}

#[test]
fn get_pixel_out_of_bounds_is_transparent() {
    let buf = PixelBuffer::filled(3, 2, [9, 9, 9, 9]);
    for (x, y) in [(-1, 0), (0, -1), (3, 0), (0, 2), (i64::MIN, i64::MAX), (100, 100)] {
        assert_eq!(get_pixel(&buf, x, y), [0, 0, 0, 0], "({x},{y})");
    }
    assert_eq!(get_pixel(&buf, 2, 1), [9, 9, 9, 9]);
}

#[test]
fn set_pixel_writes_row_major_and_ignores_outside() {
    let mut buf = PixelBuffer::new(2, 2);
    set_pixel(&mut buf, 1, 1, [1, 2, 3, 4]);
    set_pixel(&mut buf, 5, 5, [9, 9, 9, 9]);
    assert_eq!(&buf.data()[12..16], &[1, 2, 3, 4]);
    assert_eq!(buf.data().iter().filter(|&&b| b == 9).count(), 0);
}

#[test]
fn sample_at_integer_coordinates_is_exact() {
    let buf = gradient_buffer(5, 4);
    for y in 0..4 {
        for x in 0..5 {
            let s = sample_pixel(&buf, f64::from(x), f64::from(y));
            let p = get_pixel(&buf, i64::from(x), i64::from(y));
            assert_eq!(s, p.map(f64::from));
        }
    }
}

#[test]
fn sample_between_pixels_interpolates() {
    let mut buf = PixelBuffer::new(2, 1);
    set_pixel(&mut buf, 0, 0, [0, 0, 0, 255]);
    set_pixel(&mut buf, 1, 0, [200, 100, 50, 255]);
    assert_eq!(sample_pixel(&buf, 0.5, 0.0), [100.0, 50.0, 25.0, 255.0]);
    assert_eq!(sample_pixel(&buf, 0.25, 0.0), [50.0, 25.0, 12.5, 255.0]);
}

#[test]
fn sample_fraction_wraps_for_negative_coordinates() {
    let buf = PixelBuffer::filled(2, 2, [100, 100, 100, 255]);
    let s = sample_pixel(&buf, -0.25, 0.0);
    // 75% of the in-bounds pixel at x=0, 25% of transparent x=-1.
    assert_eq!(s, [75.0, 75.0, 75.0, 191.25]);
}
