//! Unit Tests for the Plot Surface Manager
//!
//! Page-list semantics: append-only creation order, selection cursor moves,
//! resize applying only to future pages, and UI sink notifications.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use replbridge::{Bitmap, PlotSurfaceManager};
use test_utils::CountingPlotSink;

#[test]
fn test_pages_are_appended_in_creation_order() {
    let plots = PlotSurfaceManager::new(504, 504);
    assert_eq!(plots.page_count(), 0);
    assert_eq!(plots.selected(), None);

    assert_eq!(plots.new_page(), 0);
    assert_eq!(plots.new_page(), 1);
    assert_eq!(plots.new_page(), 2);

    assert_eq!(plots.page_count(), 3);
    assert_eq!(plots.selected(), Some(2), "newest page is auto-selected");
}

#[test]
fn test_resize_affects_only_future_pages() {
    let plots = PlotSurfaceManager::new(400, 300);
    plots.new_page();

    plots.resize(800, 600);
    assert_eq!(
        plots.page_size(0),
        Some((400, 300)),
        "existing page keeps its creation size"
    );

    plots.new_page();
    assert_eq!(plots.page_size(1), Some((800, 600)));
}

#[test]
fn test_draw_without_a_page_is_a_no_op() {
    let plots = PlotSurfaceManager::new(100, 100);
    let sink = CountingPlotSink::new();
    plots.attach_sink(sink.clone());

    plots.draw(&Bitmap::solid(10, 10, [0, 255, 0, 255]));
    assert_eq!(plots.page_count(), 0);
    assert_eq!(sink.draws(), 0, "dropped draws never reach the UI sink");
}

#[test]
fn test_draw_blits_into_the_selected_page() {
    let plots = PlotSurfaceManager::new(20, 20);
    plots.new_page();
    plots.draw(&Bitmap::solid(20, 20, [255, 0, 0, 255]));

    let surface = plots.page_surface(0).unwrap();
    assert_eq!(surface.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(surface.get_pixel(19, 19).0, [255, 0, 0, 255]);
}

#[test]
fn test_selecting_an_older_page_routes_draws_to_it() {
    let plots = PlotSurfaceManager::new(10, 10);
    plots.new_page();
    plots.new_page();

    assert!(plots.select(0));
    plots.draw(&Bitmap::solid(10, 10, [0, 0, 255, 255]));

    let first = plots.page_surface(0).unwrap();
    assert_eq!(first.get_pixel(5, 5).0, [0, 0, 255, 255]);

    // Page 1 stays untouched
    let second = plots.page_surface(1).unwrap();
    assert_eq!(second.get_pixel(5, 5).0, [0, 0, 0, 0]);
}

#[test]
fn test_out_of_range_selection_is_rejected() {
    let plots = PlotSurfaceManager::new(10, 10);
    plots.new_page();

    assert!(!plots.select(5));
    assert_eq!(plots.selected(), Some(0), "selection cursor is unchanged");
}

#[test]
fn test_sink_is_notified_of_pages_and_draws() {
    let plots = PlotSurfaceManager::new(10, 10);
    let sink = CountingPlotSink::new();
    plots.attach_sink(sink.clone());

    plots.new_page();
    plots.new_page();
    plots.draw(&Bitmap::solid(10, 10, [1, 2, 3, 255]));

    assert_eq!(sink.new_plots(), 2);
    assert_eq!(sink.draws(), 1);
}
