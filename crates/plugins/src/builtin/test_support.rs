use crate::RenderContext;
use stencil_layout::{FontSet, LayoutCache};
use stencil_template_core::{FieldValue, PageGeometry, Schema};
use stencil_types::Padding;

/// Owns everything a [`RenderContext`] borrows.
pub(crate) struct Fixture {
    pub schema: Schema,
    pub value: FieldValue,
    pub page: PageGeometry,
    pub fonts: FontSet,
    pub cache: LayoutCache,
}

impl Fixture {
    pub fn new(schema: Schema, value: impl Into<FieldValue>) -> Self {
        Self {
            schema,
            value: value.into(),
            page: PageGeometry {
                width: 210.0,
                height: 297.0,
                padding: Padding::uniform(10.0),
            },
            fonts: FontSet::new(),
            cache: LayoutCache::new(),
        }
    }

    pub fn ctx(&self) -> RenderContext<'_> {
        RenderContext {
            schema: &self.schema,
            value: &self.value,
            page: &self.page,
            fonts: &self.fonts,
            cache: &self.cache,
        }
    }
}
