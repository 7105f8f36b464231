//! `claudeswap doctor`: read-only diagnostics.
//!
//! Checks directories, the state file, the live settings and every stored
//! profile, and reports each with a pass/warn/fail icon. Returns whether any
//! check failed; nothing is modified.

use anstyle::AnsiColor;

use crate::paths::Paths;
use crate::profile::CredentialSource;
use crate::profiles::{list_profiles, load_profile};
use crate::state::State;
use crate::switch::LiveStatus;
use crate::ui::Ui;
use crate::validate::validate;

/// Run the doctor diagnostics; `true` when no check failed
pub fn run_doctor(paths: &Paths, ui: &Ui) -> bool {
    ui.section("claudeswap doctor");
    ui.newline();

    let mut healthy = true;

    healthy &= check_step(ui, "Directories", || {
        let mut ok = true;
        if paths.profiles_dir.is_dir() {
            ui.println(format!(
                "  {} Profiles directory: {}",
                ui.icon_ok(),
                paths.profiles_dir.display()
            ));
        } else {
            ui.println(format!(
                "  {} Profiles directory missing: {} (created on first 'add')",
                ui.icon_warn(),
                paths.profiles_dir.display()
            ));
        }

        if paths.claude_dir.is_dir() {
            ui.println(format!(
                "  {} Claude directory: {}",
                ui.icon_ok(),
                paths.claude_dir.display()
            ));
        } else if paths.claude_dir.exists() {
            ui.println(format!(
                "  {} Claude path is not a directory: {}",
                ui.icon_err(),
                paths.claude_dir.display()
            ));
            ok = false;
        } else {
            ui.println(format!(
                "  {} Claude directory missing: {} (created on first 'use')",
                ui.icon_warn(),
                paths.claude_dir.display()
            ));
        }
        ok
    });

    let state = State::read(&paths.state_file).ok();

    healthy &= check_step(ui, "State File", || match &state {
        Some(state) => {
            match &state.active_profile {
                Some(profile) => ui.println(format!(
                    "  {} Active profile: {}",
                    ui.icon_info(),
                    profile
                )),
                None => ui.println(format!(
                    "  {} No active profile (unconfigured)",
                    ui.icon_info()
                )),
            }
            true
        }
        None => {
            ui.println(format!(
                "  {} State file corrupt: {} (the next 'use' rewrites it)",
                ui.icon_err(),
                paths.state_file.display()
            ));
            false
        }
    });

    healthy &= check_step(ui, "Live Settings", || {
        let state = state.clone().unwrap_or_default();
        match LiveStatus::detect(paths, &state) {
            LiveStatus::Missing => {
                ui.println(format!(
                    "  {} {} does not exist yet",
                    ui.icon_warn(),
                    paths.claude_settings.display()
                ));
                true
            }
            LiveStatus::Unreadable(reason) => {
                ui.println(format!("  {} {}", ui.icon_err(), reason));
                false
            }
            LiveStatus::Unconfigured => {
                ui.println(format!(
                    "  {} Settings not managed by claudeswap",
                    ui.icon_info()
                ));
                true
            }
            LiveStatus::ProfileMissing(name) => {
                ui.println(format!(
                    "  {} Active profile '{}' no longer exists",
                    ui.icon_err(),
                    name
                ));
                false
            }
            LiveStatus::InSync(name) => {
                ui.println(format!("  {} Settings match profile '{}'", ui.icon_ok(), name));
                true
            }
            LiveStatus::Drifted { profile, keys } => {
                ui.println(format!(
                    "  {} Settings differ from profile '{}': {}",
                    ui.icon_warn(),
                    profile,
                    keys.join(", ")
                ));
                ui.println(format!("    Run 'claudeswap use {profile}' to reapply"));
                true
            }
        }
    });

    healthy &= check_step(ui, "Profiles", || {
        let profiles = match list_profiles(paths) {
            Ok(p) => p,
            Err(e) => {
                ui.println(format!(
                    "  {} Failed to list profiles: {}",
                    ui.icon_err(),
                    e.with_causes()
                ));
                return false;
            }
        };

        if profiles.is_empty() {
            ui.println(format!("  {} No profiles found", ui.icon_warn()));
            return true;
        }

        ui.println(format!("  Found {} profile(s):", profiles.len()));
        let mut all_valid = true;

        for name in profiles {
            let profile = match load_profile(paths, &name) {
                Ok(profile) => profile,
                Err(e) => {
                    ui.println(format!("    {} {} ({})", ui.icon_err(), name, e.with_causes()));
                    all_valid = false;
                    continue;
                }
            };

            match validate(&profile) {
                Ok(()) => {
                    if let CredentialSource::Env(var) = profile.credential.source() {
                        if profile.credential.resolve().is_err() {
                            ui.println(format!(
                                "    {} {} (credential variable {} is not set)",
                                ui.icon_warn(),
                                name,
                                var
                            ));
                            continue;
                        }
                    }
                    ui.println(format!("    {} {}", ui.icon_ok(), name));
                }
                Err(errors) => {
                    let summary: Vec<String> = errors.iter().map(ToString::to_string).collect();
                    ui.println(format!(
                        "    {} {} ({})",
                        ui.icon_err(),
                        name,
                        summary.join("; ")
                    ));
                    all_valid = false;
                }
            }
        }
        all_valid
    });

    healthy
}

fn check_step<F>(ui: &Ui, name: &str, check_fn: F) -> bool
where
    F: FnOnce() -> bool,
{
    ui.println(ui.bold(format!("Checking {}...", name)));
    let success = check_fn();
    if !success {
        ui.println(ui.colored("  Issues detected!", AnsiColor::Red));
    }
    ui.newline();
    success
}
