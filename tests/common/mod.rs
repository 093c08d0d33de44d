#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// A 24-bit uncompressed BMP of the given size (decodes as `RGB`).
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// An 8-bit grayscale image in whatever format the extension names.
pub fn write_gray(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    image::GrayImage::new(width, height)
        .save(path)
        .expect("write grayscale image");
}

/// Arbitrary bytes; converters copy images without decoding them.
pub fn write_bytes(path: &Path, bytes: &[u8]) {
    ensure_parent(path);
    fs::write(path, bytes).expect("write file");
}

/// A per-object annotation document.
pub fn annotation_xml(width: u32, height: u32, objects: &[(&str, [f64; 4])]) -> String {
    let mut xml = format!(
        "<annotation>\n  <size>\n    <width>{width}</width>\n    <height>{height}</height>\n    <depth>1</depth>\n  </size>\n"
    );
    for (name, [xmin, ymin, xmax, ymax]) in objects {
        xml.push_str(&format!(
            "  <object>\n    <name>{name}</name>\n    <bndbox>\n      <xmin>{xmin}</xmin>\n      <ymin>{ymin}</ymin>\n      <xmax>{xmax}</xmax>\n      <ymax>{ymax}</ymax>\n    </bndbox>\n  </object>\n"
        ));
    }
    xml.push_str("</annotation>\n");
    xml
}

/// Writes `<dir>/<stem>.jpg` and its sibling `<stem>.xml`.
pub fn write_annotated_image(
    dir: &Path,
    stem: &str,
    width: u32,
    height: u32,
    objects: &[(&str, [f64; 4])],
) -> PathBuf {
    let image = dir.join(format!("{stem}.jpg"));
    write_bytes(&image, stem.as_bytes());
    fs::write(
        dir.join(format!("{stem}.xml")),
        annotation_xml(width, height, objects),
    )
    .expect("write annotation");
    image
}

/// Sorted file names directly inside `dir`; empty when it does not exist.
pub fn file_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| {
            entry
                .expect("read dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

pub fn stems(dir: &Path) -> Vec<String> {
    let mut stems: Vec<String> = file_names(dir)
        .into_iter()
        .map(|name| match name.rsplit_once('.') {
            Some((stem, _)) => stem.to_string(),
            None => name,
        })
        .collect();
    stems.sort();
    stems
}
