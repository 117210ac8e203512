//! Panels, the panel arena and reference geometries

pub mod generators;
pub mod panel;
pub mod panel_mesh;

pub use panel::{Panel, Segment};
pub use panel_mesh::{PanelMesh, WakeChain};
