pub mod composer;
pub mod crashes_screen;
pub mod error;
pub mod main_screen;
pub mod notify;
