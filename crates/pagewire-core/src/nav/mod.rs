mod menu;
mod mobile;

pub use menu::MenuController;
pub use mobile::MobileNav;
