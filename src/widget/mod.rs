pub mod alert_popup;
pub mod command_bar;
pub mod drop_zone;
pub mod hud_message;
pub mod pdf_view;
pub mod sidebar;
