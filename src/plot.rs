//! Plot Surface Manager
//!
//! Tracks the graphics pages produced during a session and which one is
//! currently displayed. The page list is append-only with a single mutable
//! selection cursor; resizing never touches existing pages, only the
//! dimensions used for future ones.

use image::RgbaImage;
use std::sync::{Arc, Mutex};

use crate::engine::EngineAdapter;
use crate::events::Bitmap;

/// UI-facing capability for rendering graphics pages
pub trait PlotSink: Send + Sync {
    /// A new page was created and selected
    fn new_plot(&self);

    /// A bitmap was drawn onto the currently selected page
    fn draw_image(&self, bitmap: &Bitmap);
}

/// One rendered graphics page; size is fixed at creation
pub struct PlotPage {
    width: u32,
    height: u32,
    surface: RgbaImage,
}

impl PlotPage {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            surface: RgbaImage::new(width, height),
        }
    }

    /// Page width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Page height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The rendered surface
    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    fn blit(&mut self, bitmap: &Bitmap) {
        image::imageops::replace(&mut self.surface, bitmap.image(), 0, 0);
    }
}

struct PageList {
    pages: Vec<PlotPage>,
    selected: Option<usize>,
}

/// Tracks graphics pages and the display selection for one session
pub struct PlotSurfaceManager {
    state: Mutex<PageList>,
    /// Dimensions applied to pages created from now on
    next_size: Mutex<(u32, u32)>,
    /// Engine notified when the graphics device size changes
    engine: Mutex<Option<Arc<dyn EngineAdapter>>>,
    /// Optional rendering sink installed by the plot UI
    sink: Mutex<Option<Arc<dyn PlotSink>>>,
}

impl PlotSurfaceManager {
    /// Create a manager with the given initial page size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Mutex::new(PageList {
                pages: Vec::new(),
                selected: None,
            }),
            next_size: Mutex::new((width, height)),
            engine: Mutex::new(None),
            sink: Mutex::new(None),
        }
    }

    /// Attach the engine whose graphics device should follow resizes
    pub fn attach_engine(&self, engine: Arc<dyn EngineAdapter>) {
        *self.engine.lock().unwrap() = Some(engine);
    }

    /// Attach a rendering sink (installed by the plot UI)
    pub fn attach_sink(&self, sink: Arc<dyn PlotSink>) {
        *self.sink.lock().unwrap() = Some(sink);
    }

    /// Append a new page at the current future-page size and select it.
    /// Returns the index of the new page.
    pub fn new_page(&self) -> usize {
        let (width, height) = *self.next_size.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        state.pages.push(PlotPage::new(width, height));
        let index = state.pages.len() - 1;
        state.selected = Some(index);
        debug!("Created plot page {} ({}x{})", index, width, height);
        drop(state);

        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.new_plot();
        }
        index
    }

    /// Blit a bitmap into the currently selected page.
    ///
    /// A draw with no page selected is a silent no-op: the engine emitted a
    /// draw before any page event, a non-fatal ordering anomaly.
    pub fn draw(&self, bitmap: &Bitmap) {
        let mut state = self.state.lock().unwrap();
        match state.selected {
            Some(index) => {
                state.pages[index].blit(bitmap);
            }
            None => {
                debug!("Dropping draw event: no plot page selected");
                return;
            }
        }
        drop(state);

        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.draw_image(bitmap);
        }
    }

    /// Change the dimensions used for future pages and ask the engine to
    /// reconfigure its graphics device. Existing pages are never resized,
    /// and output delivery for the current page is not blocked.
    pub fn resize(&self, width: u32, height: u32) {
        *self.next_size.lock().unwrap() = (width, height);
        if let Some(engine) = self.engine.lock().unwrap().as_ref() {
            engine.set_plot_size(width, height);
        }
    }

    /// Select an existing page for display
    pub fn select(&self, index: usize) -> bool {
        let mut state = self.state.lock().unwrap();
        if index < state.pages.len() {
            state.selected = Some(index);
            true
        } else {
            false
        }
    }

    /// Index of the currently displayed page, `None` when empty
    pub fn selected(&self) -> Option<usize> {
        self.state.lock().unwrap().selected
    }

    /// Number of pages created so far
    pub fn page_count(&self) -> usize {
        self.state.lock().unwrap().pages.len()
    }

    /// Dimensions of the page at `index`
    pub fn page_size(&self, index: usize) -> Option<(u32, u32)> {
        let state = self.state.lock().unwrap();
        state.pages.get(index).map(|p| (p.width(), p.height()))
    }

    /// Copy of the surface of the page at `index`
    pub fn page_surface(&self, index: usize) -> Option<RgbaImage> {
        let state = self.state.lock().unwrap();
        state.pages.get(index).map(|p| p.surface().clone())
    }
}
