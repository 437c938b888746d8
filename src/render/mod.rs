// Icon and tooltip generation for tracked entities

mod icon;
mod tooltip;

pub use icon::{plane_icon, Icon};
pub use tooltip::{flight_tooltip, format_thousands};
