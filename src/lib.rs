pub mod backup;
pub mod commands;
pub mod doctor;
pub mod error;
pub mod fs_utils;
pub mod logging;
pub mod paths;
pub mod presets;
pub mod profile;
pub mod profiles;
pub mod settings;
pub mod state;
pub mod switch;
pub mod ui;
pub mod validate;

#[cfg(test)]
pub mod test_utils;
