use crate::error::RenderError;
use crate::types::DrawOp;

/// A document backend. Pages are opened, filled and closed strictly in order;
/// all geometry arrives in points with a top-left origin.
pub trait DocumentSink {
    fn begin_page(&mut self, width: f64, height: f64) -> Result<(), RenderError>;

    fn draw(&mut self, op: &DrawOp) -> Result<(), RenderError>;

    fn end_page(&mut self) -> Result<(), RenderError>;

    /// Serializes the finished document.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, RenderError>;
}
