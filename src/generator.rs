//! The generation pipeline.
//!
//! One call walks `validate → resolve pages → per record, per page, per schema
//! (resolve value → render) → finalize`. Every page of every record is
//! rendered before the sink sees anything, so a failing schema never leaves a
//! half-written document behind.

use crate::config::{GeneratorOptions, PaginationMode};
use crate::error::GenerateError;
use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;
use stencil_layout::{FontSet, LayoutCache, PlannedSchema, paginate};
use stencil_plugins::{Plugin, PluginError, PluginRegistry, RenderContext};
use stencil_render_core::{DocumentSink, DrawOp};
use stencil_render_lopdf::LopdfSink;
use stencil_template_core::{
    FieldValue, InputRecord, PageGeometry, PlaceholderVars, Schema, Template, ValidationReport,
    Validator, replace_placeholders,
};
use stencil_types::mm2pt;

/// Draw operations of one schema instance, in points.
#[derive(Debug, Clone)]
pub struct RenderedSchema {
    pub name: String,
    pub kind: String,
    pub ops: Vec<DrawOp>,
}

/// One physical output page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Index of the input record this page belongs to.
    pub record: usize,
    /// Template page the schemas come from.
    pub template_page: usize,
    /// Points.
    pub width: f64,
    /// Points.
    pub height: f64,
    pub schemas: Vec<RenderedSchema>,
}

impl RenderedPage {
    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.name.as_str())
    }
}

/// A template page after pagination: the instances one physical page carries.
struct ResolvedPage {
    template_page: usize,
    geometry: PageGeometry,
    schemas: Vec<Schema>,
}

/// Parses input records from JSON: an array of objects, or a single object.
pub fn inputs_from_json(source: &str) -> Result<Vec<InputRecord>, GenerateError> {
    let value: Value = serde_json::from_str(source)?;
    let records = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        Value::Object(_) => vec![serde_json::from_value(value)?],
        other => {
            return Err(GenerateError::Config(format!(
                "inputs must be an array of records, got {other}"
            )));
        }
    };
    Ok(records)
}

/// A builder for creating a [`Generator`].
pub struct GeneratorBuilder {
    template: Option<Template>,
    plugins: PluginRegistry,
    options: GeneratorOptions,
}

impl Default for GeneratorBuilder {
    fn default() -> Self {
        Self {
            template: None,
            plugins: PluginRegistry::builtin(),
            options: GeneratorOptions::default(),
        }
    }
}

impl GeneratorBuilder {
    /// Creates a builder with the built-in plugins and default options.
    pub fn new() -> Self {
        Default::default()
    }

    /// Loads the template from a JSON file.
    pub fn with_template_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, GenerateError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            GenerateError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read template from '{}': {}", path.display(), e),
            ))
        })?;
        self.template = Some(Template::from_json(&source)?);
        Ok(self)
    }

    pub fn with_template_source(mut self, source: &str) -> Result<Self, GenerateError> {
        self.template = Some(Template::from_json(source)?);
        Ok(self)
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    /// Replaces the plugin registry. Templates may only use the types it knows.
    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_fonts(mut self, fonts: FontSet) -> Self {
        self.options.fonts = fonts;
        self
    }

    /// Registers one TrueType/OpenType face under `name`.
    pub fn with_font(mut self, name: &str, data: Vec<u8>) -> Result<Self, GenerateError> {
        self.options.fonts.add_font(name, data)?;
        Ok(self)
    }

    pub fn with_pagination(mut self, pagination: PaginationMode) -> Self {
        self.options.pagination = pagination;
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.options.title = title;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.options.author = author;
        self
    }

    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.options.now = Some(now);
        self
    }

    pub fn build(self) -> Result<Generator, GenerateError> {
        let template = self.template.ok_or_else(|| {
            GenerateError::Config(
                "No template has been configured. Use `with_template_file` or `with_template`."
                    .to_string(),
            )
        })?;
        Ok(Generator::new(template, self.plugins, self.options))
    }
}

/// Renders one template against input records. Read-only after construction,
/// so one generator can serve concurrent calls.
pub struct Generator {
    template: Template,
    plugins: PluginRegistry,
    options: GeneratorOptions,
}

impl Generator {
    pub fn new(template: Template, plugins: PluginRegistry, options: GeneratorOptions) -> Self {
        Self {
            template,
            plugins,
            options,
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Runs the template check and the input check and returns every
    /// violation, without rendering anything.
    pub fn validate(&self, inputs: &[InputRecord]) -> ValidationReport {
        let validator = Validator::new(&self.plugins).with_fonts(&self.options.fonts);
        let mut report = validator.check_template(&self.template);
        report.extend(validator.check_inputs(&self.template, inputs));
        report
    }

    /// Renders every page of every record into the sink and returns its bytes.
    pub fn generate(
        &self,
        inputs: &[InputRecord],
        sink: Box<dyn DocumentSink>,
    ) -> Result<Vec<u8>, GenerateError> {
        let pages = self.render_pages(inputs)?;
        let mut sink = sink;
        for page in &pages {
            sink.begin_page(page.width, page.height)?;
            for op in page.schemas.iter().flat_map(|s| &s.ops) {
                sink.draw(op)?;
            }
            sink.end_page()?;
        }
        Ok(sink.finish()?)
    }

    /// [`Generator::generate`] into a PDF.
    pub fn generate_pdf(&self, inputs: &[InputRecord]) -> Result<Vec<u8>, GenerateError> {
        let sink = LopdfSink::new(self.options.fonts.clone())
            .with_title(self.options.title.clone())
            .with_author(self.options.author.clone());
        self.generate(inputs, Box::new(sink))
    }

    pub fn generate_to_file<P: AsRef<Path>>(
        &self,
        inputs: &[InputRecord],
        path: P,
    ) -> Result<(), GenerateError> {
        let pdf = self.generate_pdf(inputs)?;
        fs::write(path, pdf)?;
        Ok(())
    }

    /// Generates one PDF per batch in parallel. Each batch is an independent
    /// call with its own cache.
    #[cfg(feature = "rayon-executor")]
    pub fn generate_batches(
        &self,
        batches: &[Vec<InputRecord>],
    ) -> Vec<Result<Vec<u8>, GenerateError>> {
        use rayon::prelude::*;
        batches
            .par_iter()
            .map(|batch| self.generate_pdf(batch))
            .collect()
    }

    /// Everything up to the sink: the ordered output pages with draw
    /// operations in points.
    pub fn render_pages(&self, inputs: &[InputRecord]) -> Result<Vec<RenderedPage>, GenerateError> {
        let started = Instant::now();
        let template = self.prepare()?;

        let report = self.validate(inputs);
        if report.has_errors() {
            return Err(GenerateError::Validation(report));
        }
        for warning in report.warnings() {
            log::warn!("{}", warning);
        }

        let now = self
            .options
            .now
            .unwrap_or_else(|| Local::now().naive_local());
        let mut pages = Vec::new();

        for (index, record) in inputs.iter().enumerate() {
            let cache = LayoutCache::new();
            let resolved = self.resolve_pages(&template, record, now, &cache)?;
            let total = resolved.len();
            for (number, page) in resolved.into_iter().enumerate() {
                let vars = PlaceholderVars::for_page(record, now, number + 1, total);
                pages.push(self.render_page(index, page, record, &vars, &cache)?);
            }
            let stats = cache.stats();
            log::debug!(
                "Record {}: {} page(s), cache {} hit(s) / {} miss(es)",
                index,
                total,
                stats.hits,
                stats.misses
            );
        }

        log::info!(
            "Rendered {} page(s) for {} record(s) in {:.2}ms",
            pages.len(),
            inputs.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(pages)
    }

    /// A copy of the template with each plugin's default properties filled in.
    /// Fails on the first unknown type.
    fn prepare(&self) -> Result<Template, GenerateError> {
        let mut prepared = self.template.clone();
        for (page, schemas) in prepared.schemas.iter_mut().enumerate() {
            for schema in schemas.iter_mut() {
                let defaults = self.plugin_for(schema, page)?.default_schema();
                *schema = schema.merged_with_defaults(&defaults);
            }
        }
        Ok(prepared)
    }

    fn plugin_for(&self, schema: &Schema, page: usize) -> Result<&dyn Plugin, GenerateError> {
        self.plugins
            .get(&schema.kind)
            .map(|plugin| plugin.as_ref())
            .map_err(|_| GenerateError::UnknownSchemaType {
                kind: schema.kind.clone(),
                schema: schema.name.clone(),
                page,
            })
    }

    /// Measures every schema and breaks each template page into physical
    /// pages. Base documents with fixed pages keep the template layout.
    fn resolve_pages(
        &self,
        template: &Template,
        record: &InputRecord,
        now: NaiveDateTime,
        cache: &LayoutCache,
    ) -> Result<Vec<ResolvedPage>, GenerateError> {
        let paginate_pages =
            self.options.pagination == PaginationMode::Auto && template.base_pdf.is_blank();
        let mut resolved = Vec::with_capacity(template.page_count());

        for (page_index, schemas) in template.schemas.iter().enumerate() {
            let geometry = template.base_pdf.page_geometry(page_index).ok_or_else(|| {
                GenerateError::Config(format!("base document has no page {page_index}"))
            })?;

            if !paginate_pages {
                resolved.push(ResolvedPage {
                    template_page: page_index,
                    geometry,
                    schemas: schemas.clone(),
                });
                continue;
            }

            // Page numbers are provisional until pagination is done.
            let vars = PlaceholderVars::for_page(record, now, page_index + 1, template.page_count());
            let mut planned = Vec::with_capacity(schemas.len());
            for schema in schemas {
                let plugin = self.plugin_for(schema, page_index)?;
                let value = resolve_value(schema, record, &vars);
                let ctx = RenderContext {
                    schema,
                    value: &value,
                    page: &geometry,
                    fonts: &self.options.fonts,
                    cache,
                };
                let fail = |source| schema_error(schema, page_index, source);
                planned.push(match plugin.dynamic_heights(&ctx).map_err(fail)? {
                    Some(heights) => PlannedSchema {
                        schema,
                        heights,
                        rows: plugin.row_split(schema).map_err(fail)?,
                    },
                    None => PlannedSchema::fixed(schema),
                });
            }

            for schemas in paginate(&planned, &geometry) {
                resolved.push(ResolvedPage {
                    template_page: page_index,
                    geometry,
                    schemas,
                });
            }
        }
        Ok(resolved)
    }

    fn render_page(
        &self,
        record_index: usize,
        page: ResolvedPage,
        record: &InputRecord,
        vars: &PlaceholderVars,
        cache: &LayoutCache,
    ) -> Result<RenderedPage, GenerateError> {
        let scale = mm2pt(1.0);
        let mut rendered = Vec::with_capacity(page.schemas.len());

        for schema in &page.schemas {
            let plugin = self.plugin_for(schema, page.template_page)?;
            let value = resolve_value(schema, record, vars);
            let ctx = RenderContext {
                schema,
                value: &value,
                page: &page.geometry,
                fonts: &self.options.fonts,
                cache,
            };
            let ops = plugin
                .render(&ctx)
                .map_err(|source| schema_error(schema, page.template_page, source))?;
            log::debug!(
                "Rendered '{}' ({}) with {} op(s)",
                schema.name,
                schema.kind,
                ops.len()
            );
            rendered.push(RenderedSchema {
                name: schema.name.clone(),
                kind: schema.kind.clone(),
                ops: ops.iter().map(|op| op.scaled(scale)).collect(),
            });
        }

        Ok(RenderedPage {
            record: record_index,
            template_page: page.template_page,
            width: mm2pt(page.geometry.width),
            height: mm2pt(page.geometry.height),
            schemas: rendered,
        })
    }
}

fn schema_error(schema: &Schema, page: usize, source: PluginError) -> GenerateError {
    GenerateError::Schema {
        schema: schema.name.clone(),
        page,
        source,
    }
}

/// Read-only schemas draw their own content with placeholders replaced;
/// everything else draws the record's value, or nothing.
fn resolve_value<'a>(
    schema: &Schema,
    record: &'a InputRecord,
    vars: &PlaceholderVars,
) -> Cow<'a, FieldValue> {
    if schema.read_only {
        let content = schema.content.as_deref().unwrap_or_default();
        return Cow::Owned(FieldValue::Text(replace_placeholders(content, vars)));
    }
    record
        .get(&schema.name)
        .map(Cow::Borrowed)
        .unwrap_or_default()
}
