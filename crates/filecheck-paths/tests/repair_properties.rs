use filecheck_domain::{RepairRules, Replacement, ReplacementTable};
use filecheck_paths::PathRepairer;
use proptest::prelude::*;

fn repairer_with_table() -> PathRepairer {
    let replacements = ReplacementTable::new(vec![
        Replacement {
            from: "C:\\legacy\\app.exe".to_string(),
            to: "C:\\apps\\app.exe".to_string(),
        },
        Replacement {
            from: "/opt/old lib.jar".to_string(),
            to: "/opt/lib/new.jar".to_string(),
        },
    ])
    .expect("valid table");
    PathRepairer::new(RepairRules {
        replacements,
        ..RepairRules::default()
    })
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ._:/\\\\=()-]{0,48}",
        "[A-Z]:\\\\[a-z ]{1,8}\\\\[a-z]{1,8}\\.(exe|jar)( [a-z_=.]{1,12})?",
        "/opt/[a-z]{1,8}/[a-z]{1,8}\\.jar( result\\.filename=[a-z/]{0,10})?",
        Just("C:\\legacy\\app.exe".to_string()),
        Just("/opt/old lib.jar".to_string()),
        Just("N/A".to_string()),
    ]
}

proptest! {
    #[test]
    fn repair_is_idempotent(raw in path_strategy(), is_windows in any::<bool>()) {
        let repairer = repairer_with_table();
        let once = repairer.repair(&raw, is_windows);
        let twice = repairer.repair(&once.repaired_path, is_windows);
        prop_assert_eq!(&twice.repaired_path, &once.repaired_path);
        prop_assert!(!twice.was_repaired);
        prop_assert_eq!(twice.is_invalid(), once.is_invalid());
    }

    #[test]
    fn repaired_paths_never_grow_without_a_replacement(raw in "[a-zA-Z0-9 ._/\\\\]{1,48}", is_windows in any::<bool>()) {
        let out = PathRepairer::default().repair(&raw, is_windows);
        prop_assert!(out.repaired_path.len() <= raw.len());
    }
}

#[test]
fn replacement_output_is_stable() {
    let repairer = repairer_with_table();
    let out = repairer.repair("/opt/old lib.jar", false);
    assert_eq!(out.repaired_path, "/opt/lib/new.jar");
    assert!(out.was_repaired);
}

fn repairer_with_cycle() -> PathRepairer {
    let replacements = ReplacementTable::new(vec![Replacement {
        from: "C:\\a.exe".to_string(),
        to: "C:\\a.exe x result.filename=q".to_string(),
    }])
    .expect("valid table");
    PathRepairer::new(RepairRules {
        replacements,
        ..RepairRules::default()
    })
}

proptest! {
    #[test]
    fn repair_is_idempotent_when_rules_cycle(
        raw in prop_oneof![
            Just("C:\\a.exe".to_string()),
            Just("c:\\A.EXE".to_string()),
            Just("C:\\a.exe x".to_string()),
            Just("C:\\a.exe x result.filename=q".to_string()),
            "C:\\\\a\\.exe( [a-z]{1,4})?( result\\.filename=[a-z]{0,4})?",
        ],
        is_windows in any::<bool>(),
    ) {
        let repairer = repairer_with_cycle();
        let once = repairer.repair(&raw, is_windows);
        let twice = repairer.repair(&once.repaired_path, is_windows);
        prop_assert_eq!(&twice.repaired_path, &once.repaired_path);
        prop_assert_eq!(twice.is_invalid(), once.is_invalid());
    }
}
