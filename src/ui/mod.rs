pub mod star;
pub mod theme;
pub mod transport;

pub use star::{render_star, star_block};
pub use theme::Theme;
pub use transport::{button_label, render_transport, TransportInfo};
