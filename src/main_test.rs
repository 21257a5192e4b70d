#![allow(clippy::float_cmp)]

use super::*;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("drillbook-{}-{name}", uuid::Uuid::new_v4()))
}

// =============================================================================
// Arguments
// =============================================================================

#[test]
fn init_prefs_runs_without_a_show() {
    let prefs = temp_path("prefs.json");
    let arg = prefs.display().to_string();
    let cli = Cli::try_parse_from(["drillbook", "--prefs", arg.as_str(), "init-prefs"]).unwrap();
    assert!(matches!(cli.command, Command::InitPrefs));

    run(cli).unwrap();
    assert!(prefs.exists());
    fs::remove_file(&prefs).unwrap();
}

#[test]
fn init_prefs_needs_a_prefs_path() {
    let mut cli = Cli::try_parse_from(["drillbook", "init-prefs"]).unwrap();
    cli.prefs = None;
    assert!(matches!(run(cli).unwrap_err(), CliError::NoPrefsPath));
}

#[test]
fn show_commands_need_a_show_path() {
    let mut cli = Cli::try_parse_from(["drillbook", "pages"]).unwrap();
    cli.show = None;
    assert!(matches!(run(cli).unwrap_err(), CliError::NoShowPath));
}

#[test]
fn move_parses_marcher_list_and_negative_steps() {
    let cli = Cli::try_parse_from(["drillbook", "--show", "s.json", "move", "--marchers", "3,4", "--dx", "-2", "--dry-run"])
        .unwrap();
    let Command::Move { marchers, dx, dy, dry_run, page } = cli.command else {
        panic!("expected move");
    };
    assert_eq!(marchers, vec![3, 4]);
    assert_eq!((dx, dy), (-2.0, 0.0));
    assert!(dry_run);
    assert_eq!(page, None);
}
