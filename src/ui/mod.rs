// UI module - everything between background work and whatever renders state
//
// This module contains:
// - MainContext: the single thread allowed to mutate observable state
// - View models: trigger work and publish outcomes through the main context
// - Console presenter: renders state change events as text

pub mod bridge;
pub mod console;
pub mod image_model;
pub mod timeline_model;
pub mod title_model;

pub use bridge::{BridgeError, MAIN_CONTEXT_NAME, MainContext, MainContextHandle};
pub use console::{render_change, spawn_console_presenter};
pub use image_model::ImageViewModel;
pub use timeline_model::TimelineViewModel;
pub use title_model::TitleViewModel;
