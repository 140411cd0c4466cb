//! Burns a computed layout into one page of an existing PDF.
//!
//! Images become FlateDecode image XObjects drawn with `cm` + `Do` at their
//! bottom-up rectangles; captions are set in a base-14 font with `Tj`, centered
//! on the caption rect. The page's original content is wrapped in `q`/`Q` so its
//! graphics state cannot leak into the overlay.

use std::collections::BTreeMap;
use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::{LayoutConfig, PageGeometry};
use crate::error::{PageGridError, Result};
use crate::fonts::{StandardFont, encode_win_ansi};
use crate::intake::{InputImage, layout_images};
use crate::model::Layout;

/// Page of a loaded document selected for embedding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPage {
    /// 1-based page number.
    pub number: u32,
    pub id: ObjectId,
    /// Lower-left corner of the MediaBox; usually (0, 0).
    pub origin: (f64, f64),
    pub geometry: PageGeometry,
}

/// Counts of what was drawn onto the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmbedSummary {
    pub images: usize,
    pub captions: usize,
    /// Items not drawn because their image rect had no area.
    pub skipped: usize,
}

/// Image XObject payload: 8-bit RGB or gray samples, zlib-compressed.
#[derive(Debug, Clone)]
struct ImageXObject {
    width: u32,
    height: u32,
    color_space: &'static str,
    data: Vec<u8>,
}

impl ImageXObject {
    /// Alpha is blended over white; PDF image XObjects carry no alpha without an SMask.
    fn from_image(image: &DynamicImage) -> Result<Self> {
        let (raw, color_space) = if image.color().has_color() {
            let rgba = image.to_rgba8();
            let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
            for p in rgba.pixels() {
                let a = p[3] as f32 / 255.0;
                for c in &p.0[..3] {
                    rgb.push((*c as f32 * a + 255.0 * (1.0 - a)).round() as u8);
                }
            }
            (rgb, "DeviceRGB")
        } else {
            let la = image.to_luma_alpha8();
            let gray = la
                .pixels()
                .map(|p| {
                    let a = p[1] as f32 / 255.0;
                    (p[0] as f32 * a + 255.0 * (1.0 - a)).round() as u8
                })
                .collect();
            (gray, "DeviceGray")
        };

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw)?;
        let data = encoder.finish()?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            color_space,
            data,
        })
    }

    fn to_pdf_stream(&self) -> Stream {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => self.color_space,
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        Stream::new(dict, self.data.clone())
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> Result<&'a Object> {
    while let Object::Reference(id) = obj {
        obj = doc.get_object(*id)?;
    }
    Ok(obj)
}

/// Looks `key` up on the page and then up its `Parent` chain.
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
    let mut node = doc.get_object(page_id)?.as_dict()?;
    loop {
        if let Ok(value) = node.get(key) {
            return Ok(Some(resolve(doc, value)?.clone()));
        }
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = doc.get_object(parent)?.as_dict()?,
            Err(_) => return Ok(None),
        }
    }
}

/// Finds page `number` (1-based) and reads its size from the MediaBox.
pub fn target_page(doc: &Document, page_number: u32) -> Result<TargetPage> {
    let pages = doc.get_pages();
    let id = *pages.get(&page_number).ok_or_else(|| {
        PageGridError::InvalidInput(format!(
            "page {} does not exist; the document has {} pages",
            page_number,
            pages.len()
        ))
    })?;

    let media_box = inherited(doc, id, b"MediaBox")?.ok_or_else(|| {
        PageGridError::InvalidInput(format!("page {} has no MediaBox", page_number))
    })?;
    let values = media_box
        .as_array()?
        .iter()
        .map(|v| resolve(doc, v).ok().and_then(number))
        .collect::<Option<Vec<f64>>>()
        .filter(|v| v.len() == 4)
        .ok_or_else(|| {
            PageGridError::InvalidInput(format!("page {} has a malformed MediaBox", page_number))
        })?;

    let (x0, x1) = (values[0].min(values[2]), values[0].max(values[2]));
    let (y0, y1) = (values[1].min(values[3]), values[1].max(values[3]));
    Ok(TargetPage {
        number: page_number,
        id,
        origin: (x0, y0),
        geometry: PageGeometry::new(x1 - x0, y1 - y0),
    })
}

/// Gives the page its own Resources dictionary, copying an inherited one.
fn own_resources(doc: &mut Document, page_id: ObjectId) -> Result<ObjectId> {
    let page = doc.get_object(page_id)?.as_dict()?;
    if let Ok(Object::Reference(id)) = page.get(b"Resources") {
        return Ok(*id);
    }
    let resources = match inherited(doc, page_id, b"Resources")? {
        Some(Object::Dictionary(d)) => d,
        _ => Dictionary::new(),
    };
    let id = doc.add_object(resources);
    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Reference(id));
    Ok(id)
}

/// Adds `name -> id` to the `category` sub-dictionary (`XObject`, `Font`) of the resources.
fn register_resource(
    doc: &mut Document,
    resources_id: ObjectId,
    category: &str,
    name: &str,
    id: ObjectId,
) -> Result<()> {
    let indirect = {
        let resources = doc.get_object_mut(resources_id)?.as_dict_mut()?;
        if !resources.has(category.as_bytes()) {
            resources.set(category, Dictionary::new());
        }
        match resources.get(category.as_bytes())? {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    };
    let entries = match indirect {
        Some(r) => doc.get_object_mut(r)?.as_dict_mut()?,
        None => doc
            .get_object_mut(resources_id)?
            .as_dict_mut()?
            .get_mut(category.as_bytes())?
            .as_dict_mut()?,
    };
    entries.set(name, Object::Reference(id));
    Ok(())
}

/// Wraps the existing content in `q`/`Q` and appends `operations` after it.
fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<()> {
    let mut overlay = b"Q\n".to_vec();
    overlay.extend(Content { operations }.encode()?);

    let mut contents = match doc.get_object(page_id)?.as_dict()?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    let save = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore = doc.add_object(Stream::new(Dictionary::new(), overlay));
    contents.insert(0, Object::Reference(save));
    contents.push(Object::Reference(restore));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}

fn real(v: f64) -> Object {
    Object::Real(v as _)
}

/// Draws every placement of `layout` onto `page`.
///
/// `inputs` must be the images the layout was computed for, in the same order.
/// Items whose image rect has no area are skipped with a warning.
#[instrument(skip_all, fields(page = page.number, images = inputs.len()))]
pub fn embed_layout(
    doc: &mut Document,
    page: &TargetPage,
    inputs: &[InputImage],
    layout: &Layout,
) -> Result<EmbedSummary> {
    if inputs.len() != layout.placements.len() {
        return Err(PageGridError::InvalidInput(format!(
            "{} images but {} placements",
            inputs.len(),
            layout.placements.len()
        )));
    }

    let resources_id = own_resources(doc, page.id)?;
    let (ox, oy) = page.origin;
    let mut fonts: BTreeMap<StandardFont, String> = BTreeMap::new();
    let mut ops = Vec::new();
    let mut summary = EmbedSummary::default();

    for (i, (input, placement)) in inputs.iter().zip(&layout.placements).enumerate() {
        let rect = placement.image.bottom_up();
        if rect.w <= 0.0 || rect.h <= 0.0 {
            warn!(index = i, key = %input.key, "image rect has no area, not embedded");
            summary.skipped += 1;
            continue;
        }

        let xobject = ImageXObject::from_image(&input.image)?;
        let xobject_id = doc.add_object(xobject.to_pdf_stream());
        let name = format!("PgGridIm{}", i);
        register_resource(doc, resources_id, "XObject", &name, xobject_id)?;
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                real(rect.w),
                real(0.0),
                real(0.0),
                real(rect.h),
                real(ox + rect.x),
                real(oy + rect.y),
            ],
        ));
        ops.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        ops.push(Operation::new("Q", vec![]));
        summary.images += 1;

        let Some(caption) = input.caption.as_ref().filter(|c| !c.text.is_empty()) else {
            continue;
        };
        let font = StandardFont::from_family(&caption.font_family);
        let font_name = match fonts.get(&font) {
            Some(n) => n.clone(),
            None => {
                let font_id = doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => font.base_font(),
                    "Encoding" => "WinAnsiEncoding",
                });
                let n = format!("PgGridF{}", fonts.len());
                register_resource(doc, resources_id, "Font", &n, font_id)?;
                fonts.insert(font, n.clone());
                n
            }
        };

        let text_width = font.text_width(&caption.text, caption.font_size);
        let x = ox + placement.caption_text_x(text_width);
        let y = oy + placement.caption.y_bottom;
        let [r, g, b] = caption.color;
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font_name.into_bytes()), real(caption.font_size)],
        ));
        ops.push(Operation::new(
            "rg",
            vec![
                real(r as f64 / 255.0),
                real(g as f64 / 255.0),
                real(b as f64 / 255.0),
            ],
        ));
        ops.push(Operation::new("Td", vec![real(x), real(y)]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(&caption.text))],
        ));
        ops.push(Operation::new("ET", vec![]));
        ops.push(Operation::new("Q", vec![]));
        summary.captions += 1;
    }

    append_content(doc, page.id, ops)?;
    Ok(summary)
}

/// Lays `inputs` out on page `page_number` of `doc` and draws them.
///
/// The page size comes from the page's MediaBox; `cfg.page` is ignored. On a
/// layout failure the document is left untouched.
pub fn embed_into_document(
    doc: &mut Document,
    page_number: u32,
    inputs: &[InputImage],
    cfg: &LayoutConfig,
) -> Result<(Layout, EmbedSummary)> {
    let page = target_page(doc, page_number)?;
    let cfg = LayoutConfig {
        page: page.geometry,
        ..cfg.clone()
    };
    let layout = layout_images(inputs, &cfg)?;
    let summary = embed_layout(doc, &page, inputs, &layout)?;
    Ok((layout, summary))
}

/// Byte-level variant of [`embed_into_document`]: parses `pdf`, embeds, and
/// returns the saved document. Nothing is produced on failure.
#[instrument(skip_all, fields(page = page_number, bytes = pdf.len()))]
pub fn embed_pdf_bytes(
    pdf: &[u8],
    page_number: u32,
    inputs: &[InputImage],
    cfg: &LayoutConfig,
) -> Result<(Vec<u8>, Layout, EmbedSummary)> {
    let mut doc = Document::load_mem(pdf)?;
    let (layout, summary) = embed_into_document(&mut doc, page_number, inputs, cfg)?;
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    info!(
        images = summary.images,
        captions = summary.captions,
        bytes = out.len(),
        "pdf embedded"
    );
    Ok((out, layout, summary))
}
