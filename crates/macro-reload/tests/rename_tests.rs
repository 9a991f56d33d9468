//! `rename_existing` handling across startup and reloads.

mod common;

use common::{run, ConfigBuilder, MacroBuilder, TestHarness};
use macro_reload::gcode::Handler;

fn g28(rename: Option<&str>) -> String {
    let mut builder = MacroBuilder::new("g28").description("Homing wrapper");
    if let Some(target) = rename {
        builder = builder.rename_existing(target).line(&format!("{} X", target));
    } else {
        builder = builder.line("M400");
    }
    ConfigBuilder::new().with_macro(builder).build()
}

fn native(name: &str) -> Option<Handler> {
    Some(Handler::Native(name.to_string()))
}

fn lookup(printer: &macro_reload::Printer, command: &str) -> Option<Handler> {
    printer.host().gcode.lookup(command).cloned()
}

#[test]
fn test_rename_wraps_builtin() {
    let harness = TestHarness::with_config(&g28(Some("G28.1")));
    let mut printer = harness.start();

    assert_eq!(lookup(&printer, "G28.1"), native("G28"));
    assert_eq!(
        lookup(&printer, "G28"),
        Some(Handler::Macro("macro g28".to_string()))
    );
    assert_eq!(printer.host().gcode.help("G28"), Some("Homing wrapper"));

    // The macro calls the renamed native command.
    assert_eq!(run(&mut printer, "G28").executed, vec!["G28 X"]);
}

#[test]
fn test_rename_target_change_moves_original() {
    let harness = TestHarness::with_config(&g28(Some("G28.1")));
    let mut printer = harness.start();

    harness.write_config(&g28(Some("G28.2")));
    assert_eq!(
        run(&mut printer, "MACRO_RELOAD").responses,
        vec!["// Updated macro g28", "// Reload complete"]
    );
    assert_eq!(lookup(&printer, "G28.2"), native("G28"));
    assert!(!printer.host().gcode.is_registered("G28.1"));
    assert_eq!(run(&mut printer, "G28").executed, vec!["G28 X"]);
}

#[test]
fn test_rename_added_on_reload() {
    let harness = TestHarness::with_config(
        &ConfigBuilder::new()
            .with_macro(MacroBuilder::new("park").line("G1 X0"))
            .build(),
    );
    let mut printer = harness.start();

    harness.write_config(
        &ConfigBuilder::new()
            .with_macro(
                MacroBuilder::new("park")
                    .rename_existing("PARK_BASE")
                    .line("G1 X0"),
            )
            .build(),
    );
    assert_eq!(
        run(&mut printer, "MACRO_RELOAD").responses,
        vec!["// Updated macro park", "// Reload complete"]
    );

    let handler = Some(Handler::Macro("macro park".to_string()));
    assert_eq!(lookup(&printer, "PARK"), handler);
    assert_eq!(lookup(&printer, "PARK_BASE"), handler);
}

#[test]
fn test_macro_readded_after_removing_reload_rename() {
    let park = |rename: Option<&str>| {
        let mut builder = MacroBuilder::new("park");
        if let Some(target) = rename {
            builder = builder.rename_existing(target);
        }
        ConfigBuilder::new().with_macro(builder.line("G1 X0")).build()
    };
    let harness = TestHarness::with_config(&park(None));
    let mut printer = harness.start();
    harness.write_config(&park(Some("PARK_BASE")));
    run(&mut printer, "MACRO_RELOAD");

    harness.write_config("");
    assert_eq!(
        run(&mut printer, "MACRO_RELOAD").responses,
        vec!["// Removed macro park", "// Reload complete"]
    );
    assert!(!printer.host().gcode.is_known("PARK"));
    assert!(!printer.host().gcode.is_known("PARK_BASE"));

    harness.write_config(&park(None));
    assert_eq!(
        run(&mut printer, "MACRO_RELOAD").responses,
        vec!["// Added macro park", "// Reload complete"]
    );
    assert_eq!(run(&mut printer, "PARK").executed, vec!["G1 X0"]);
}

#[test]
fn test_rename_removal_is_refused() {
    let harness = TestHarness::with_config(&g28(Some("G28.1")));
    let mut printer = harness.start();

    harness.write_config(
        &ConfigBuilder::new()
            .with_macro(
                MacroBuilder::new("g28")
                    .description("Homing wrapper")
                    .line("G28.1 X"),
            )
            .build(),
    );
    assert_eq!(
        run(&mut printer, "MACRO_RELOAD").responses,
        vec![
            "// Cannot remove rename_existing 'G28.1' from macro g28 without a restart; keeping it",
            "// Reload complete"
        ]
    );
    assert_eq!(lookup(&printer, "G28.1"), native("G28"));
    let entity = printer.host().objects.lookup_macro("macro g28").unwrap();
    assert_eq!(entity.rename_existing.as_deref(), Some("G28.1"));
}

#[test]
fn test_removing_macro_restores_renamed_command() {
    let harness = TestHarness::with_config(&g28(Some("G28.1")));
    let mut printer = harness.start();

    harness.write_config("");
    assert_eq!(
        run(&mut printer, "MACRO_RELOAD").responses,
        vec!["// Removed macro g28", "// Reload complete"]
    );
    assert_eq!(lookup(&printer, "G28"), native("G28"));
    assert!(!printer.host().gcode.is_known("G28.1"));
    assert!(printer.host().gcode.help("G28").is_none());
    assert_eq!(run(&mut printer, "G28").executed, vec!["G28"]);
}

#[test]
fn test_rename_kind_mismatch_is_rejected() {
    let harness = TestHarness::with_config(&g28(Some("BASE_G28")));
    let mut printer = harness.start();

    let lines = printer.startup_report().messages();
    assert!(lines[0].starts_with("Failed to add macro g28:"));
    assert_eq!(lookup(&printer, "G28"), native("G28"));
    assert!(!printer.host().gcode.is_known("BASE_G28"));
    assert_eq!(run(&mut printer, "G28").executed, vec!["G28"]);
}

#[test]
fn test_rename_onto_taken_command_is_rejected() {
    let harness = TestHarness::with_config(&g28(Some("G1")));
    let printer = harness.start();

    let lines = printer.startup_report().messages();
    assert!(lines[0].starts_with("Failed to add macro g28:"));
    assert_eq!(lookup(&printer, "G1"), native("G1"));
    assert_eq!(lookup(&printer, "G28"), native("G28"));
}

#[test]
fn test_macro_shadowing_builtin_without_rename_fails() {
    let harness = TestHarness::with_config(&g28(None));
    let printer = harness.start();

    let lines = printer.startup_report().messages();
    assert!(lines[0].starts_with("Failed to add macro g28:"));
    assert!(printer.host().objects.is_empty());
}
