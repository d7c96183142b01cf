pub mod annotation;
pub mod chart;
pub mod layout;
pub mod life;
pub mod timing_windows;
