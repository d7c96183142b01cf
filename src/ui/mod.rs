pub mod click_mode;
pub mod color;
pub mod density_graph;
pub mod life_graph;
pub mod mesh;
pub mod notefield;
pub mod scene;
pub mod segment_nav;
pub mod view_state;
