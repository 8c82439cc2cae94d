use modcheck::ops::{ModCheck, ModCheckKind};
use modcheck::{
    EngineSettings, ExecutionContext, LogMessages, ModInfo, ModList, Operation, RecordingSink, Severity,
};
use modcheck_xml::Document;

fn mods() -> ModList {
    vec![
        ModInfo::new("Core", "1.0.0"),
        ModInfo::new("HugsLib", "6.1.0").with_sync_version("6.1.1"),
        ModInfo::new("Combat Extended", "1.3.0"),
        ModInfo::new("Old Mod", "1.1.9"),
        ModInfo::new("Short", "1.2"),
    ]
    .into()
}

fn check(check: ModCheck) -> (bool, RecordingSink) {
    let mods = mods();
    let mut op = Operation::new(check).named("check");
    let mut doc = Document::new("Defs");
    let mut sink = RecordingSink::new();
    let mut ctx = ExecutionContext::new(&mods, &mut sink, EngineSettings::default());
    let result = op.apply(&mut doc, &mut ctx);
    drop(ctx);
    (result, sink)
}

fn errors(sink: &RecordingSink) -> Vec<&str> {
    sink.with_severity(Severity::Error).collect()
}

#[test]
fn version_at_or_above_minimum_passes() {
    assert!(check(ModCheck::is_version("Combat Extended", "Me", "1.2.0")).0);
    assert!(check(ModCheck::is_version("Combat Extended", "Me", "1.3.0")).0);
    assert!(check(ModCheck::is_version("Core", "Me", "0.0.0")).0);
}

#[test]
fn each_version_part_must_reach_the_wanted_part() {
    // 1.3.0 is newer than 1.2.5 but its last part is lower.
    let (result, sink) = check(ModCheck::is_version("Combat Extended", "Me", "1.2.5").error_on_fail(true));
    assert!(!result);
    assert_eq!(errors(&sink), vec!["Me requires Combat Extended 1.2.5 but version 1.3.0 is used"]);
    assert!(!check(ModCheck::is_version("Core", "Me", "0.19.2")).0);
}

#[test]
fn version_below_minimum_fails() {
    let (result, sink) = check(ModCheck::is_version("Old Mod", "Me", "1.2.0"));
    assert!(!result);
    assert!(sink.is_empty());

    let (result, sink) = check(ModCheck::is_version("Old Mod", "Me", "1.2.0").error_on_fail(true));
    assert!(!result);
    assert_eq!(errors(&sink), vec!["Me requires Old Mod 1.2.0 but version 1.1.9 is used"]);
}

#[test]
fn malformed_version_is_a_configuration_error() {
    let (result, sink) = check(ModCheck::is_version("Combat Extended", "Me", "1.x.0"));
    assert!(!result);
    assert_eq!(
        errors(&sink),
        vec![
            "[ModCheck] Mod   - check: modCheck.isVersion failed to understand version string \"1.x.0\" while testing Combat Extended"
        ]
    );
}

#[test]
fn absent_mod_fails_before_the_version_is_read() {
    let (result, sink) = check(ModCheck::is_version("Missing", "Me", "one"));
    assert!(!result);
    assert!(sink.is_empty());
}

#[test]
fn version_segment_count_must_match() {
    let (result, sink) = check(ModCheck::is_version("Short", "Me", "1.2.0"));
    assert!(!result);
    assert_eq!(errors(&sink).len(), 1);
    assert!(errors(&sink)[0].contains("failed to compare version tags 1.2.0 and 1.2 for mod Short"));
}

#[test]
fn version_of_absent_mod_fails_quietly() {
    let (result, sink) = check(ModCheck::is_version("Missing", "Me", "1.0.0"));
    assert!(!result);
    assert!(sink.is_empty());
}

#[test]
fn sync_version_reads_mod_sync_metadata() {
    let sync = |mod_name: &str, version: &str| {
        ModCheck::new(
            ModCheckKind::IsModSyncVersion {
                version: Some(version.to_string()),
            },
            mod_name,
            "Me",
        )
    };
    assert!(check(sync("HugsLib", "6.1.1")).0);
    assert!(!check(sync("HugsLib", "6.2.0")).0);
    // No ModSync metadata.
    assert!(!check(sync("Core", "1.0.0")).0);
    let (result, sink) = check(sync("Core", "1.0.0").error_on_fail(true));
    assert!(!result);
    assert_eq!(errors(&sink), vec!["Me requires Core 1.0.0 but no version could be read"]);
}

#[test]
fn is_mod_loaded_and_incompatible() {
    assert!(check(ModCheck::is_mod_loaded("HugsLib", "Me")).0);

    let (result, sink) = check(ModCheck::is_mod_loaded("Missing", "Me").error_on_fail(true));
    assert!(!result);
    assert_eq!(errors(&sink), vec![r#"Missing mod: "Missing", needed by "Me""#]);

    let incompatible = |name: &str| ModCheck::new(ModCheckKind::IsModLoaded { incompatible: true }, name, "Me");
    assert!(check(incompatible("Missing")).0);
    let (result, sink) = check(incompatible("Core").error_on_fail(true));
    assert!(!result);
    assert_eq!(errors(&sink), vec![r#"Incompatible mods in use: "Core" can't be used with "Me""#]);
}

#[test]
fn load_order_is_vacuous_when_a_mod_is_absent() {
    assert!(check(ModCheck::load_order("Missing", "Core")).0);
    assert!(check(ModCheck::load_order("Missing", "Also Missing")).0);
    assert!(check(ModCheck::load_order("Core", "Missing")).0);
}

#[test]
fn load_order_compares_positions() {
    assert!(check(ModCheck::load_order("Core", "HugsLib")).0);

    let (result, sink) = check(ModCheck::load_order("HugsLib", "Core").error_on_fail(true));
    assert!(!result);
    assert_eq!(
        errors(&sink),
        vec![r#"Mod load order: "HugsLib" needs to be loaded before "Core""#]
    );

    let mine_first = ModCheck::new(ModCheckKind::LoadOrder { your_mod_first: true }, "HugsLib", "Core");
    assert!(check(mine_first).0);
}

#[test]
fn missing_names_are_configuration_errors() {
    let (result, sink) = check(ModCheck::with_fields(
        ModCheckKind::IsModLoaded { incompatible: false },
        None,
        Some("Me".into()),
    ));
    assert!(!result);
    assert_eq!(
        errors(&sink),
        vec!["[ModCheck] Mod   - check: modCheck.isModLoaded used with an empty/missing modName"]
    );

    let (result, sink) = check(ModCheck::with_fields(
        ModCheckKind::LoadOrder { your_mod_first: false },
        Some("Core".into()),
        Some(String::new()),
    ));
    assert!(!result);
    assert!(errors(&sink)[0].ends_with("modCheck.loadOrder used with an empty/missing yourMod"));

    let (result, sink) = check(ModCheck::new(ModCheckKind::IsVersion { version: None }, "Core", "Me"));
    assert!(!result);
    assert!(errors(&sink)[0].ends_with("modCheck.isVersion used with an empty/missing version"));
}

#[test]
fn result_is_cached_for_the_node_lifetime() {
    let mods_before = mods();
    let mut op = Operation::new(ModCheck::is_mod_loaded("Late", "Me").messages(LogMessages {
        message_fail: Some("missing {4}".into()),
        ..LogMessages::default()
    }))
    .named("late");
    let mut doc = Document::new("Defs");
    let mut sink = RecordingSink::new();
    {
        let mut ctx = ExecutionContext::new(&mods_before, &mut sink, EngineSettings::default());
        assert!(!op.apply(&mut doc, &mut ctx));
    }

    // Loading the mod afterwards does not change the cached answer.
    let mut mods_after = mods();
    mods_after.push(ModInfo::new("Late", "1.0"));
    {
        let mut ctx = ExecutionContext::new(&mods_after, &mut sink, EngineSettings::default());
        assert!(!op.apply(&mut doc, &mut ctx));
    }
    assert_eq!(sink.texts(), vec!["missing late"]);
}

#[test]
fn legacy_messages_follow_error_on_fail() {
    let legacy = LogMessages {
        custom_message_success: Some("yay {4}".into()),
        custom_message_fail: Some("nay {4}".into()),
        ..LogMessages::default()
    };

    let (_, sink) = check(ModCheck::is_mod_loaded("Core", "Me").messages(legacy.clone()).error_on_fail(true));
    assert_eq!(sink.diagnostics[0].severity, Severity::Message);
    assert_eq!(sink.texts(), vec!["yay check"]);

    let (_, sink) = check(ModCheck::is_mod_loaded("Missing", "Me").messages(legacy.clone()));
    assert_eq!(sink.diagnostics[0].severity, Severity::Message);
    assert_eq!(sink.texts(), vec!["nay check"]);

    let (_, sink) = check(ModCheck::is_mod_loaded("Missing", "Me").messages(legacy).error_on_fail(true));
    assert_eq!(errors(&sink), vec!["nay check"]);
}

#[test]
fn messages_fire_for_matching_outcome_only() {
    let messages = LogMessages {
        message_success: Some("ok".into()),
        warning_fail: Some("warn".into()),
        error_fail: Some("err".into()),
        ..LogMessages::default()
    };
    let (_, sink) = check(ModCheck::is_mod_loaded("Core", "Me").messages(messages.clone()));
    assert_eq!(sink.texts(), vec!["ok"]);

    let (_, sink) = check(ModCheck::is_mod_loaded("Missing", "Me").messages(messages));
    let severities: Vec<_> = sink.diagnostics.iter().map(|d| d.severity).collect();
    assert_eq!(sink.texts(), vec!["warn", "err"]);
    assert_eq!(severities, vec![Severity::Warning, Severity::Error]);
}
