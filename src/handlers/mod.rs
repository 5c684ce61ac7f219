mod command_handler;
mod display_event_handler;
mod focus_handler;
mod window_handler;
