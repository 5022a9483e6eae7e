//! Output assembly: one full-bleed image per page in a fresh PDF.

use crate::error::DocstampError;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

/// Name of the page image in every page's resource dictionary.
const IMAGE_NAME: &str = "Im0";

/// Builds the output document page by page.
///
/// Pages are appended in call order. Nothing is written until
/// [`PdfAssembler::finish`].
pub struct PdfAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfAssembler {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page of `width` × `height` points whose only content is
    /// `image` stretched over the whole page.
    pub fn add_image_page(
        &mut self,
        image: Stream,
        width: f32,
        height: f32,
    ) -> Result<(), DocstampError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(DocstampError::AssemblyFailed(format!(
                "invalid page size {width}x{height}"
            )));
        }

        let image_id = self.doc.add_object(image);
        let content = format!("q {width} 0 0 {height} 0 0 cm /{IMAGE_NAME} Do Q\n").into_bytes();
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
        });
        self.kids.push(Object::Reference(page_id));
        debug!("Added page {} ({}x{} pt)", self.kids.len(), width, height);
        Ok(())
    }

    /// Close the page tree and serialise the document.
    pub fn finish(mut self) -> Result<Vec<u8>, DocstampError> {
        if self.kids.is_empty() {
            return Err(DocstampError::AssemblyFailed(
                "no pages to write".to_string(),
            ));
        }

        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| DocstampError::AssemblyFailed(e.to_string()))?;
        Ok(out)
    }
}
