//! Integration tests for image decoding and mesh construction.

use glam::Vec3;
use renderer_resources::{ImageData, MeshData, ResourceError};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("renderer_resources_{}_{}", std::process::id(), name))
}

#[test]
fn test_load_png_converts_to_rgba8() {
    let path = temp_path("rgb.png");

    let mut source = image::RgbImage::new(3, 2);
    source.put_pixel(0, 0, image::Rgb([10, 20, 30]));
    source.put_pixel(2, 1, image::Rgb([200, 100, 50]));
    source.save(&path).expect("Failed to write test image");

    let loaded = ImageData::load(&path).expect("Failed to load test image");
    std::fs::remove_file(&path).ok();

    assert_eq!((loaded.width, loaded.height), (3, 2));
    assert_eq!(loaded.byte_len(), 3 * 2 * 4);
    assert_eq!(&loaded.pixels[0..4], &[10, 20, 30, 255]);
    // row 1, column 2
    let last = (3 + 2) * 4;
    assert_eq!(&loaded.pixels[last..last + 4], &[200, 100, 50, 255]);
}

#[test]
fn test_load_garbage_is_image_error() {
    let path = temp_path("garbage.png");
    std::fs::write(&path, b"definitely not a png").expect("Failed to write test file");

    let result = ImageData::load(&path);
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(ResourceError::Image(_))));
}

#[test]
fn test_demo_scene_meshes() {
    let first = MeshData::quad(-2.5, Vec3::new(1.0, 0.0, 0.0));
    let second = MeshData::quad(-3.0, Vec3::new(0.0, 0.0, 1.0));

    for mesh in [&first, &second] {
        let rebuilt = MeshData::new(mesh.vertices().to_vec(), mesh.indices().to_vec())
            .expect("Quad should pass validation");
        assert_eq!(&rebuilt, mesh);
        assert_eq!(mesh.triangle_count(), 2);
    }

    let bytes: &[u8] = bytemuck::cast_slice(first.vertices());
    assert_eq!(bytes.len(), 4 * 32);
}
