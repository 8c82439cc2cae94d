use std::fs;
use std::path::Path;

use modcheck::{PatchPhase, RecordingSink, RunConfig, SettingsError};
use serde_json::json;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

const CONFIG: &str = r#"
[settings]
verbose = true

[[mods]]
name = "Core"
target_version = "1.0.0"

[[mods]]
name = "Combat Extended"
target_version = "1.3.0"

[[packages]]
name = "MyMod"
patches = ["patches/main.json"]

[[documents]]
package = "Core"
name = "Weapons.xml"
path = "defs/weapons.json"
"#;

fn setup() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "run.toml", CONFIG);
    let patch = json!([
        {
            "op": "ModCheck.IfElse",
            "name": "ce",
            "test": {"op": "ModCheck.IsVersion", "modName": "Combat Extended", "yourMod": "MyMod", "version": "1.2.0"},
            "passed": {
                "op": "search",
                "path": "/Defs/ThingDef",
                "operations": [
                    {"op": "add", "path": "/Defs/SearchResult/ThingDef", "value": ["ammoSet", "Rifle"]}
                ]
            }
        },
        {"op": "logWrite", "verboseMessageSuccess": "patched {1}"}
    ]);
    write(dir.path(), "patches/main.json", &patch.to_string());
    let defs = json!(["Defs", ["ThingDef", ["defName", "Gun_Rifle"]], ["ThingDef", ["defName", "Gun_Pistol"]]]);
    write(dir.path(), "defs/weapons.json", &defs.to_string());
    dir
}

#[test]
fn loads_and_runs_a_configuration() {
    let dir = setup();
    let config = RunConfig::load(&dir.path().join("run.toml")).unwrap();
    assert_eq!(config.base_dir, dir.path());
    assert!(config.settings.verbose);

    let mut packages = config.load_packages().unwrap();
    let mut documents = config.load_documents().unwrap();
    assert_eq!(packages[0].operations.len(), 2);
    assert_eq!(packages[0].operations[0].name, "ce");

    let mut sink = RecordingSink::new();
    let summary = PatchPhase::new(config.settings, &config.mods, &mut sink).run(&mut packages, &mut documents);

    assert_eq!(summary.applied, 2);
    assert_eq!(sink.texts(), vec!["patched Weapons.xml"]);
    let doc = &documents[0].document;
    assert_eq!(doc.select_str("/Defs/ThingDef/ammoSet").unwrap().len(), 2);
    let first = doc.select_str("/Defs/ThingDef[1]/defName").unwrap()[0];
    assert_eq!(doc.text_content(first), "Gun_Rifle");
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RunConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn malformed_toml_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "run.toml", "[settings\nverbose = true");
    let err = RunConfig::load(&dir.path().join("run.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::Toml { .. }));
}

#[test]
fn undecodable_patch_names_the_file() {
    let dir = setup();
    write(dir.path(), "patches/main.json", r#"{"op": "teleport"}"#);
    let config = RunConfig::load(&dir.path().join("run.toml")).unwrap();
    let err = config.load_packages().unwrap_err();
    match &err {
        SettingsError::Patch { path, .. } => assert!(path.ends_with("patches/main.json")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("unknown operation \"teleport\""));
}

#[test]
fn invalid_documents_are_rejected() {
    let dir = setup();
    write(dir.path(), "defs/weapons.json", "[\"Defs\", ");
    let config = RunConfig::load(&dir.path().join("run.toml")).unwrap();
    assert!(matches!(config.load_documents(), Err(SettingsError::Json { .. })));

    write(dir.path(), "defs/weapons.json", r#"{"Defs": []}"#);
    assert!(matches!(config.load_documents(), Err(SettingsError::Document { .. })));
}
