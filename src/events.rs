//! Output Event Stream
//!
//! Tagged events produced by an interpreter engine and consumed exactly once,
//! in production order, by the session loop. The stream is lazy, unbounded and
//! not rewindable; `Closed` is terminal.

use image::RgbaImage;
use std::sync::Arc;

/// A single event emitted by an engine
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// A line of normal console output
    Stdout(String),
    /// A line of error console output (rendered highlighted)
    Stderr(String),
    /// The engine is ready for one line of input; carries the prompt text
    Prompt(String),
    /// A graphics device event destined for the plot surface
    Graphics(GraphicsEvent),
    /// The engine communication channel has closed; no further events follow
    Closed,
}

/// Graphics-device events within the output stream
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsEvent {
    /// The engine opened a new graphics page
    NewPage,
    /// The engine drew a bitmap onto the current page
    Image(Bitmap),
}

/// An opaque rendered bitmap handed from the engine to the plot surface.
///
/// Bitmaps are shared, not copied: the engine produces them once and the plot
/// manager blits them into the selected page.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    image: Arc<RgbaImage>,
}

impl Bitmap {
    /// Wrap a rendered image
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Create a solid-color bitmap (useful for tests and placeholders)
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let image = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        Self::new(image)
    }

    /// Bitmap width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Bitmap height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Access the underlying pixel buffer
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl OutputEvent {
    /// Whether this event terminates the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutputEvent::Closed)
    }

    /// Short tag for logging
    pub fn tag(&self) -> &'static str {
        match self {
            OutputEvent::Stdout(_) => "stdout",
            OutputEvent::Stderr(_) => "stderr",
            OutputEvent::Prompt(_) => "prompt",
            OutputEvent::Graphics(GraphicsEvent::NewPage) => "graphics/new-page",
            OutputEvent::Graphics(GraphicsEvent::Image(_)) => "graphics/image",
            OutputEvent::Closed => "closed",
        }
    }
}
