//! High-level command orchestration for the CLI.
//!
//! One handler per subcommand in `main.rs`. Handlers coordinate the store
//! (`crate::profiles`), the writer (`crate::switch`) and output (`crate::ui`),
//! and turn library errors into messages with hints.

use anstyle::AnsiColor;
use anyhow::{Context, Result, anyhow, bail};
use std::io::IsTerminal;
use std::path::Path;
use std::process::Command;

use crate::backup::list_backups;
use crate::doctor::run_doctor;
use crate::error::SwapError;
use crate::paths::Paths;
use crate::presets::{PRESETS, find_preset, preset_ids};
use crate::profile::{Credential, ModelSlot, Profile, parse_env_arg, parse_model_arg};
use crate::profiles::{
    create_profile, list_profiles, load_profile, profile_exists, remove_profile, rename_profile,
    save_profile, touch_and_save,
};
use crate::state::{State, SwapLock};
use crate::switch::{LiveStatus, activate, deactivate, restore_backup};
use crate::ui::Ui;
use crate::validate::{validate, validate_profile_name};

/// Turn a store error into a CLI error, adding a hint for unknown profiles
fn with_hint(err: SwapError) -> anyhow::Error {
    match err {
        SwapError::NotFound(name) => anyhow!(
            "Profile '{}' does not exist.\nHint: Use 'claudeswap list' to see available profiles.",
            name
        ),
        SwapError::AlreadyExists(name) => anyhow!(
            "Profile '{}' already exists.\nHint: Pass --force to overwrite it, or choose a different name.",
            name
        ),
        other => other.into(),
    }
}

fn read_state(paths: &Paths) -> Result<State> {
    State::read(&paths.state_file).context("Failed to read the active profile")
}

/// List all available profiles
pub fn list(paths: &Paths, ui: &Ui) -> Result<()> {
    let profiles = list_profiles(paths)?;

    if profiles.is_empty() {
        ui.warn("No profiles found.");
        ui.newline();
        ui.println("Create one with:");
        ui.println(format!(
            "  {} add <name> --preset {}",
            ui.bold("claudeswap"),
            preset_ids().join("|")
        ));
        return Ok(());
    }

    let state = State::read(&paths.state_file).unwrap_or_default();
    let current = state.active_profile.as_deref();

    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell(""),
        ui.header_cell("Profile"),
        ui.header_cell("Base URL"),
        ui.header_cell("Models"),
        ui.header_cell("Status"),
    ]);

    for name in &profiles {
        let is_active = current == Some(name.as_str());
        let icon = if is_active { ui.icon_ok() } else { " " };

        let (base_url, models, status) = match load_profile(paths, name) {
            Ok(profile) => {
                let status = match validate(&profile) {
                    Err(_) => ui.colored_cell("invalid", AnsiColor::Red),
                    Ok(()) if is_active => ui.colored_cell("active", AnsiColor::Green),
                    Ok(()) => ui.cell("-"),
                };
                (profile.base_url.clone(), profile.models_summary(), status)
            }
            Err(_) => (
                "?".to_string(),
                "?".to_string(),
                ui.colored_cell("unreadable", AnsiColor::Red),
            ),
        };

        table.add_row(vec![
            ui.cell(icon),
            ui.cell(name),
            ui.cell(base_url),
            ui.cell(models),
            status,
        ]);
    }

    ui.section("Profiles");
    ui.println(table.to_string());

    Ok(())
}

/// Print the active profile name, or `unconfigured`
///
/// With `long`, also show when it was switched and whether the live settings
/// still match it.
pub fn current(paths: &Paths, ui: &Ui, long: bool) -> Result<()> {
    let state = read_state(paths)?;

    if !long {
        ui.println(state.active_profile.as_deref().unwrap_or("unconfigured"));
        return Ok(());
    }

    ui.section("Current Profile");
    ui.newline();

    let mut table = ui.simple_table();
    match &state.active_profile {
        Some(profile) => {
            table.add_row(vec![ui.cell("Active profile:"), ui.header_cell(profile)]);
            if let Some(updated) = &state.updated_at {
                table.add_row(vec![
                    ui.cell("Last switched:"),
                    ui.cell(updated.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
                ]);
            }
        }
        None => {
            table.add_row(vec![ui.cell("Active profile:"), ui.cell("unconfigured")]);
        }
    }

    let status_cell = match LiveStatus::detect(paths, &state) {
        LiveStatus::Missing => ui.colored_cell("missing", AnsiColor::Yellow),
        LiveStatus::Unreadable(reason) => ui.colored_cell(reason, AnsiColor::Red),
        LiveStatus::Unconfigured => ui.cell("not managed by claudeswap"),
        LiveStatus::ProfileMissing(name) => {
            ui.colored_cell(format!("profile '{name}' was removed"), AnsiColor::Red)
        }
        LiveStatus::InSync(_) => ui.colored_cell("in sync", AnsiColor::Green),
        LiveStatus::Drifted { keys, .. } => ui.colored_cell(
            format!("modified outside claudeswap ({})", keys.join(", ")),
            AnsiColor::Yellow,
        ),
    };
    table.add_row(vec![
        ui.cell("Settings file:"),
        ui.cell(paths.claude_settings.display().to_string()),
    ]);
    table.add_row(vec![ui.cell("Status:"), status_cell]);

    ui.println(table.to_string());
    Ok(())
}

/// Show detailed information about a profile
pub fn show(paths: &Paths, name: &str, ui: &Ui) -> Result<()> {
    let profile = load_profile(paths, name).map_err(with_hint)?;
    let state = State::read(&paths.state_file).unwrap_or_default();
    let is_active = state.active_profile.as_deref() == Some(name);

    ui.section(format!("Profile: {}", name));
    ui.newline();

    let mut table = ui.simple_table();
    if let Some(description) = &profile.description {
        table.add_row(vec![ui.cell("Description:"), ui.cell(description)]);
    }
    table.add_row(vec![ui.cell("Base URL:"), ui.cell(&profile.base_url)]);
    table.add_row(vec![
        ui.cell("Credential:"),
        ui.cell(profile.credential.masked()),
    ]);
    if let Some(timeout) = profile.timeout_ms {
        table.add_row(vec![ui.cell("Timeout:"), ui.cell(format!("{timeout} ms"))]);
    }
    table.add_row(vec![
        ui.cell("Created:"),
        ui.cell(profile.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
    ]);
    table.add_row(vec![
        ui.cell("Updated:"),
        ui.cell(profile.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
    ]);
    table.add_row(vec![
        ui.cell("Status:"),
        if is_active {
            ui.colored_cell("active", AnsiColor::Green)
        } else {
            ui.cell("inactive")
        },
    ]);
    ui.println(table.to_string());

    if !profile.models.is_empty() {
        ui.newline();
        ui.section("Model Mapping");
        let mut models = ui.simple_table();
        models.set_header(vec![
            ui.header_cell("Slot"),
            ui.header_cell("Model"),
            ui.header_cell("Variable"),
        ]);
        for (slot, model) in &profile.models {
            models.add_row(vec![
                ui.cell(slot.as_str()),
                ui.cell(model),
                ui.cell(ui.dim(slot.env_key())),
            ]);
        }
        ui.println(models.to_string());
    }

    if !profile.env.is_empty() {
        ui.newline();
        ui.section("Extra Environment");
        let mut env = ui.simple_table();
        for (key, value) in &profile.env {
            env.add_row(vec![ui.cell(key), ui.cell(value)]);
        }
        ui.println(env.to_string());
    }

    if let Err(errors) = validate(&profile) {
        ui.newline();
        for error in errors {
            ui.warn(error.to_string());
        }
    }

    Ok(())
}

/// Inputs for `claudeswap add`
#[derive(Debug, Default)]
pub struct AddOptions {
    pub name: String,
    pub preset: Option<String>,
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub models: Vec<String>,
    pub env: Vec<String>,
    pub timeout_ms: Option<u64>,
    pub description: Option<String>,
    pub force: bool,
}

/// Build a profile from preset and flags, without saving it
pub fn build_profile(options: &AddOptions, credential: Credential) -> Result<Profile> {
    let mut profile = match &options.preset {
        Some(id) => find_preset(id)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown preset: '{}'\nHint: Valid presets are {}",
                    id,
                    preset_ids().join(", ")
                )
            })?
            .to_profile(&options.name, credential),
        None => Profile::new(options.name.as_str(), String::new(), credential),
    };

    if let Some(base_url) = &options.base_url {
        profile.base_url = base_url.trim().to_string();
    }
    if profile.base_url.is_empty() {
        bail!("A base URL is required.\nHint: Pass --base-url <URL> or --preset <name>.");
    }

    for arg in &options.models {
        let (slot, model) = parse_model_arg(arg).map_err(|e| anyhow!(e))?;
        profile.models.insert(slot, model);
    }
    for arg in &options.env {
        let (key, value) = parse_env_arg(arg).map_err(|e| anyhow!(e))?;
        profile.env.insert(key, value);
    }
    if options.timeout_ms.is_some() {
        profile.timeout_ms = options.timeout_ms;
    }
    if options.description.is_some() {
        profile.description = options.description.clone();
    }

    Ok(profile)
}

/// Add a new profile from a preset and/or flags
pub fn add(paths: &Paths, options: AddOptions, ui: &Ui) -> Result<()> {
    validate_profile_name(&options.name)?;

    let existing = profile_exists(paths, &options.name);
    if existing && !options.force {
        return Err(with_hint(SwapError::AlreadyExists(options.name.clone())));
    }

    let token = match &options.token {
        Some(token) => token.clone(),
        None => prompt_token(&options.name)?,
    };
    let mut profile = build_profile(&options, Credential::new(token))?;

    if existing {
        if let Ok(previous) = load_profile(paths, &options.name) {
            profile.created_at = previous.created_at;
        }
        save_profile(paths, &profile)?;
    } else {
        create_profile(paths, &profile).map_err(with_hint)?;
    }

    let verb = if existing { "Updated" } else { "Created" };
    ui.ok(format!("{} profile '{}'", verb, profile.name));
    ui.println(format!("  Base URL:   {}", profile.base_url));
    ui.println(format!("  Credential: {}", profile.credential.masked()));
    ui.println(format!("  Models:     {}", profile.models_summary()));
    ui.newline();

    let state = State::read(&paths.state_file).unwrap_or_default();
    if existing && state.active_profile.as_deref() == Some(profile.name.as_str()) {
        ui.println("This profile is active. Reapply it with:");
    } else {
        ui.println("To activate it:");
    }
    ui.println(format!("  claudeswap use {}", profile.name));

    Ok(())
}

fn prompt_token(name: &str) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        bail!("No API token given.\nHint: Pass --token <TOKEN> or --token env:<VARIABLE>.");
    }

    let token = inquire::Password::new(&format!("API token for '{}':", name))
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .with_help_message("Stored in the profile file; use env:<VARIABLE> to keep it out of it")
        .prompt()
        .context("Token entry cancelled")?;
    Ok(token)
}

/// Switch to a profile
pub fn use_profile(paths: &Paths, name: &str, ui: &Ui) -> Result<()> {
    let spinner = ui.spinner(format!("Switching to profile '{}'...", name));

    match activate(paths, name) {
        Ok(activation) => {
            let suffix = if activation.changed {
                String::new()
            } else {
                format!(" {}", ui.dim("(already applied)"))
            };
            ui.spinner_finish_ok(&spinner, format!("Active profile: {}{}", name, suffix));
            if let Some(backup) = activation.backup {
                ui.println(ui.dim(format!("Previous settings saved to {}", backup.display())));
            }
            Ok(())
        }
        Err(e) => {
            ui.spinner_abandon(&spinner);
            Err(with_hint(e))
        }
    }
}

/// Remove the managed entries from Claude Code's settings
pub fn reset(paths: &Paths, ui: &Ui) -> Result<()> {
    let deactivation = deactivate(paths)?;

    match (&deactivation.previous, deactivation.changed) {
        (_, true) => ui.ok("Claude Code is back on its default Anthropic configuration"),
        (Some(previous), false) => ui.ok(format!("Deactivated '{}'", previous)),
        (None, false) => ui.ok("Nothing to reset"),
    }
    if let Some(backup) = deactivation.backup {
        ui.println(ui.dim(format!("Previous settings saved to {}", backup.display())));
    }
    if deactivation.state_unreadable {
        ui.warn(format!(
            "{} was unreadable; extra env keys set by the last profile may remain in {}",
            paths.state_file.display(),
            paths.claude_settings.display()
        ));
    }
    Ok(())
}

/// Open a profile file in the user's editor, then re-validate it
pub fn edit(paths: &Paths, name: &str, ui: &Ui) -> Result<()> {
    if !profile_exists(paths, name) {
        return Err(with_hint(SwapError::NotFound(name.to_string())));
    }

    let path = paths.profile_file(name);
    open_in_editor(&path)?;

    let mut profile = load_profile(paths, name)?;
    if let Err(errors) = validate(&profile) {
        for error in &errors {
            ui.warn(error.to_string());
        }
        bail!(
            "Profile '{}' is invalid after editing.\nHint: Run 'claudeswap edit {}' again to fix it.",
            name,
            name
        );
    }
    touch_and_save(paths, &mut profile)?;

    ui.ok(format!("Saved profile '{}'", name));
    let state = State::read(&paths.state_file).unwrap_or_default();
    if state.active_profile.as_deref() == Some(name) {
        ui.println(format!("Reapply it with: claudeswap use {}", name));
    }
    Ok(())
}

fn open_in_editor(path: &Path) -> Result<()> {
    let (program, args): (String, Vec<&str>) = match std::env::var("EDITOR") {
        Ok(editor) if !editor.trim().is_empty() => (editor, Vec::new()),
        _ if cfg!(target_os = "macos") => ("open".to_string(), vec!["-W", "-t"]),
        _ => ("vi".to_string(), Vec::new()),
    };

    let status = Command::new(&program)
        .args(&args)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", program))?;

    if !status.success() {
        bail!("Editor exited with non-zero status");
    }
    Ok(())
}

/// Remove a profile
pub fn remove(paths: &Paths, name: &str, ui: &Ui, force: bool) -> Result<()> {
    if !profile_exists(paths, name) {
        return Err(with_hint(SwapError::NotFound(name.to_string())));
    }

    let state = State::read(&paths.state_file).unwrap_or_default();
    if state.active_profile.as_deref() == Some(name) {
        bail!(
            "Cannot remove '{}' because it is the currently active profile.\nHint: Switch to another profile with 'claudeswap use <other>' or run 'claudeswap reset' first.",
            name
        );
    }

    if !force
        && !confirm(
            &format!("Are you sure you want to remove profile '{}'?", name),
            "This permanently deletes the profile and its credential",
        )?
    {
        ui.warn("Removal cancelled.");
        return Ok(());
    }

    remove_profile(paths, name)?;
    ui.ok(format!("Removed profile '{}'", name));
    Ok(())
}

/// Rename a profile, following it with the active pointer
pub fn rename(paths: &Paths, old_name: &str, new_name: &str, ui: &Ui) -> Result<()> {
    let _lock = SwapLock::acquire(&paths.lock_file)?;
    rename_profile(paths, old_name, new_name).map_err(with_hint)?;

    let mut state = read_state(paths)?;
    if state.active_profile.as_deref() == Some(old_name) {
        state.active_profile = Some(new_name.to_string());
        state.write(&paths.state_file)?;
        ui.ok(format!(
            "Renamed profile '{}' to '{}' (still active)",
            old_name, new_name
        ));
    } else {
        ui.ok(format!("Renamed profile '{}' to '{}'", old_name, new_name));
    }
    Ok(())
}

/// List built-in provider presets
pub fn presets(ui: &Ui) -> Result<()> {
    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell("Preset"),
        ui.header_cell("Provider"),
        ui.header_cell("Base URL"),
        ui.header_cell("Models"),
    ]);

    for preset in PRESETS {
        let models = if preset.models.is_empty() {
            "-".to_string()
        } else {
            preset
                .models
                .iter()
                .map(|(slot, model)| format!("{}={}", slot, model))
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.add_row(vec![
            ui.cell(preset.id),
            ui.cell(preset.provider),
            ui.cell(preset.base_url),
            ui.cell(models),
        ]);
    }

    ui.section("Presets");
    ui.println(table.to_string());
    ui.newline();
    ui.println(format!(
        "Model slots: {}",
        ModelSlot::all().map(|s| s.as_str()).join(", ")
    ));
    Ok(())
}

/// List all backups
pub fn backup_list(paths: &Paths, ui: &Ui) -> Result<()> {
    let backups = list_backups(paths)?;

    if backups.is_empty() {
        ui.warn("No backups found.");
        ui.newline();
        ui.println("Backups are created automatically when switching profiles.");
        return Ok(());
    }

    ui.section("Backups");
    ui.newline();

    let mut table = ui.table();
    table.set_header(vec![
        ui.header_cell("ID"),
        ui.header_cell("Date"),
        ui.header_cell("Size"),
    ]);

    for backup in &backups {
        let date = backup
            .created_at
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "?".to_string());
        table.add_row(vec![
            ui.cell(&backup.id),
            ui.cell(date),
            ui.cell(format_bytes(backup.size)),
        ]);
    }

    ui.println(table.to_string());
    ui.newline();
    ui.info(format!("{} backup(s) found", backups.len()));

    Ok(())
}

/// Restore a backup over the live settings
pub fn backup_restore(paths: &Paths, id: &str, ui: &Ui, yes: bool) -> Result<()> {
    if !yes {
        let prompt = format!("Restore '{}' to {}?", id, paths.claude_settings.display());
        if !confirm(&prompt, "This overwrites the current settings file")? {
            ui.warn("Restore cancelled.");
            return Ok(());
        }
    }

    let safety_copy = restore_backup(paths, id).map_err(|e| match e {
        SwapError::BackupNotFound(_) => anyhow!(
            "Backup '{}' not found.\nHint: Use 'claudeswap backup list' to see available backups.",
            id
        ),
        other => other.into(),
    })?;

    ui.ok(format!("Restored '{}' to {}", id, paths.claude_settings.display()));
    if let Some(copy) = safety_copy {
        ui.println(ui.dim(format!("Replaced settings saved to {}", copy.display())));
    }
    ui.println("No profile is active now; run 'claudeswap use <name>' to switch again.");
    Ok(())
}

/// Run diagnostics
pub fn doctor(paths: &Paths, ui: &Ui) -> Result<()> {
    if run_doctor(paths, ui) {
        Ok(())
    } else {
        bail!("Doctor found problems (see above)")
    }
}

fn confirm(message: &str, help: &str) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        bail!("Confirmation required.\nHint: Re-run with --force / --yes in non-interactive use.");
    }

    inquire::Confirm::new(message)
        .with_default(false)
        .with_help_message(help)
        .prompt()
        .context("Confirmation cancelled")
}

/// Format bytes as human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
