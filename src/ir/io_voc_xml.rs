//! Reader for per-image VOC-style annotation XML.
//!
//! GC10-DET ships one document per image, next to the image and sharing its
//! stem. Only the parts the converter needs are read: `size/width`,
//! `size/height` and every `object` with its `name` and `bndbox`.

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;

use super::{BBoxXYXY, Pixel};
use crate::error::DefectPrepError;

pub const ANNOTATION_EXTENSION: &str = "xml";

/// A parsed annotation document.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationDocument {
    pub width: u32,
    pub height: u32,
    pub objects: Vec<ObjectEntry>,
}

/// One labelled object inside an annotation document.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectEntry {
    pub name: String,
    pub bbox: BBoxXYXY<Pixel>,
}

/// Returns the annotation path that pairs with `image_path` (same stem, `.xml`).
pub fn annotation_path_for(image_path: &Path) -> PathBuf {
    image_path.with_extension(ANNOTATION_EXTENSION)
}

pub fn read_annotation_file(path: &Path) -> Result<AnnotationDocument, DefectPrepError> {
    let xml = fs::read_to_string(path).map_err(DefectPrepError::io_at(path))?;
    parse_annotation_str(&xml, path)
}

/// Parses annotation XML from bytes; the input must be valid UTF-8.
///
/// Mostly useful for fuzzing the parser in memory.
pub fn from_annotation_xml_slice(bytes: &[u8]) -> Result<AnnotationDocument, DefectPrepError> {
    let path = Path::new("<memory>");
    let xml = std::str::from_utf8(bytes).map_err(|source| DefectPrepError::AnnotationParse {
        path: path.to_path_buf(),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    parse_annotation_str(xml, path)
}

pub fn parse_annotation_str(xml: &str, path: &Path) -> Result<AnnotationDocument, DefectPrepError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| DefectPrepError::AnnotationParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let root = document.root_element();
    let size = required_child_element(root, "size", path, "document root")?;
    let width = parse_required_dimension(size, "width", path)?;
    let height = parse_required_dimension(size, "height", path)?;

    let mut objects = Vec::new();
    for object in root
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        let name = required_child_text(object, "name", path, "<object>")?;
        let bndbox = required_child_element(object, "bndbox", path, "<object>")?;

        let xmin = parse_required_f64(bndbox, "xmin", path)?;
        let ymin = parse_required_f64(bndbox, "ymin", path)?;
        let xmax = parse_required_f64(bndbox, "xmax", path)?;
        let ymax = parse_required_f64(bndbox, "ymax", path)?;

        objects.push(ObjectEntry {
            name,
            bbox: BBoxXYXY::from_xyxy(xmin, ymin, xmax, ymax),
        });
    }

    Ok(AnnotationDocument {
        width,
        height,
        objects,
    })
}

fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, DefectPrepError> {
    child_element(node, tag).ok_or_else(|| DefectPrepError::AnnotationParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, DefectPrepError> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| DefectPrepError::AnnotationParse {
            path: path.to_path_buf(),
            message: format!("missing <{tag}> in {context}"),
        })
}

// Zero would make every normalized coordinate infinite.
fn parse_required_dimension(
    size: Node<'_, '_>,
    tag: &str,
    path: &Path,
) -> Result<u32, DefectPrepError> {
    let raw = required_child_text(size, tag, path, "<size>")?;
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(DefectPrepError::AnnotationParse {
            path: path.to_path_buf(),
            message: format!("invalid <{tag}> value '{raw}' in <size>; expected positive integer"),
        }),
    }
}

fn parse_required_f64(node: Node<'_, '_>, tag: &str, path: &Path) -> Result<f64, DefectPrepError> {
    let raw = required_child_text(node, tag, path, "<bndbox>")?;
    raw.parse::<f64>()
        .map_err(|_| DefectPrepError::AnnotationParse {
            path: path.to_path_buf(),
            message: format!(
                "invalid <{tag}> value '{raw}' in <bndbox>; expected floating-point number"
            ),
        })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}
