use scrollplay::{Command, Config, InputRouter, ScrollplayError};
use std::io::Write;

#[test]
fn toml_file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
trigger_selector = "button.play"
trace_level = "debug"

[keys]
toggle_playback = " "
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.trigger_selector, "button.play");
    assert_eq!(config.trace_level.as_deref(), Some("debug"));
    assert_eq!(config.keys.toggle_playback, " ");
    assert_eq!(config.keys.next, "ArrowRight");
    config.validate().unwrap();
    assert_eq!(
        InputRouter::new(config.keys.clone()).route(" "),
        Some(Command::TogglePlayback)
    );
}

#[test]
fn json_extension_selects_json() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"keys": {{"next": "n", "previous": "p"}}}}"#).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.keys.next, "n");
    assert_eq!(config.keys.previous, "p");
    config.validate().unwrap();
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ScrollplayError::Io(_)));
}

#[test]
fn config_round_trips_through_toml() {
    let config = Config {
        card_selector: "li.track".to_string(),
        trace_level: Some("warn".to_string()),
        ..Config::default()
    };
    let text = toml::to_string(&config).unwrap();
    assert_eq!(Config::from_toml_str(&text).unwrap(), config);
}
