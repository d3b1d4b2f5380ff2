use chrono::NaiveDateTime;
use stencil_layout::FontSet;

/// Whether data-dependent heights may spill schemas onto extra pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaginationMode {
    /// Paginate template pages on a blank base whenever some height changed.
    #[default]
    Auto,
    /// Keep every schema where the template puts it.
    Off,
}

/// Per-generator settings.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    pub fonts: FontSet,
    pub pagination: PaginationMode,
    pub title: Option<String>,
    pub author: Option<String>,
    /// Clock behind the `{date}` and `{dateTime}` placeholders. `None` reads
    /// the local time once per call.
    pub now: Option<NaiveDateTime>,
}
