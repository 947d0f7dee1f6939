// Components module - reusable UI building blocks
//
// Shell components are rendered every frame:
// - Title bar: app name, dataset, phase, spinner
// - Logs panel: tail of the tracing log
// - Status bar: key hints for the current state
// - Toast: transient confirmation overlay

pub mod logs_panel;
pub mod status_bar;
pub mod title_bar;
pub mod toast;
