mod common;

use std::fs;
use std::sync::Arc;

use chain_contracts::{ContractsEngine, RunReport};
use chain_core::DeployError;
use common::{contracts, list, FakeTruffle, Sandbox};
use serde_json::json;

const NET: &str = "dev";

fn engine(sb: &Sandbox, cfg: serde_json::Value, truffle: Arc<FakeTruffle>) -> ContractsEngine<Arc<FakeTruffle>> {
    ContractsEngine::new(contracts(cfg), NET, sb.layout.clone(), truffle).unwrap()
}

fn single_core_migration() -> serde_json::Value {
    json!({
        "modules": [{ "name": "core" }],
        "migrations": [{ "name": "init", "serie": [{ "type": "truffle", "name": "core", "range": [1, 1] }] }]
    })
}

#[tokio::test]
async fn first_run_records_migration_and_publishes_artifacts() {
    let sb = Sandbox::new(&["core"]);
    let truffle = Arc::new(FakeTruffle::new(&sb.layout));
    let report = engine(&sb, single_core_migration(), truffle.clone()).run().await.unwrap();

    assert_eq!(report,
               RunReport { executed: vec!["init".into()],
                           skipped: vec![] });
    assert_eq!(truffle.lines(), vec!["truffle migrate --network dev"]);
    assert_eq!(truffle.calls()[0].inv.cwd, sb.layout.module_dir("core"));

    assert_eq!(sb.migration_json(NET),
               json!([{ "name": "init", "status": true, "history": [{ "name": "core", "migrationNumber": 1 }] }]));
    assert_eq!(sb.portal_entry("core")["CoreToken"]["contractName"], "CoreToken");
    assert!(sb.layout.archived_build("core", NET).join("contracts").join("CoreToken.json").is_file());
}

#[tokio::test]
async fn completed_migrations_are_skipped_on_rerun() {
    let sb = Sandbox::new(&["core"]);
    engine(&sb, single_core_migration(), Arc::new(FakeTruffle::new(&sb.layout))).run().await.unwrap();
    let before = sb.migration_json(NET);

    let second = Arc::new(FakeTruffle::new(&sb.layout));
    let report = engine(&sb, single_core_migration(), second.clone()).run().await.unwrap();

    assert_eq!(report.skipped, vec!["init".to_string()]);
    assert!(report.executed.is_empty());
    assert!(second.calls().is_empty(), "no module should be processed");
    assert_eq!(sb.migration_json(NET), before);
}

#[tokio::test]
async fn history_covers_every_number_of_the_range_with_args() {
    let sb = Sandbox::new(&["core"]);
    let cfg = json!({
        "modules": [{ "name": "core" }],
        "migrations": [{ "name": "init", "serie": [
            { "type": "truffle", "name": "core", "range": [2, 4], "args": { "owner": "0xabc" } }
        ] }]
    });
    engine(&sb, cfg, Arc::new(FakeTruffle::new(&sb.layout))).run().await.unwrap();

    let history = &sb.migration_json(NET)[0]["history"];
    let numbers: Vec<u64> = history.as_array().unwrap().iter().map(|h| h["migrationNumber"].as_u64().unwrap()).collect();
    assert_eq!(numbers, vec![2, 3, 4]);
    assert!(history.as_array().unwrap().iter().all(|h| h["args"] == json!({ "owner": "0xabc" }) && h["name"] == "core"));
}

#[tokio::test]
async fn failure_keeps_only_completed_migrations() {
    let sb = Sandbox::new(&["core", "token"]);
    let cfg = json!({
        "modules": [{ "name": "core" }, { "name": "token" }],
        "migrations": [
            { "name": "init", "serie": [{ "type": "truffle", "name": "core", "range": [1, 1] }] },
            { "name": "tokens", "serie": [{ "type": "truffle", "name": "token", "range": [1, 2] }] },
            { "name": "never", "serie": [{ "type": "truffle", "name": "core", "range": [2, 2] }] }
        ]
    });
    let truffle = Arc::new(FakeTruffle::failing_on(&sb.layout, "token"));
    let err = engine(&sb, cfg, truffle.clone()).run().await.unwrap_err();

    assert!(matches!(err, DeployError::ProcessExit { code: 1, .. }), "{err:?}");
    let recorded = sb.migration_json(NET);
    assert_eq!(recorded.as_array().unwrap().len(), 1);
    assert_eq!(recorded[0]["name"], "init");
    // La tercera migración nunca se intenta.
    assert_eq!(truffle.calls().len(), 2);
    assert!(!sb.layout.contracts_portal.join("token.json").exists());
}

#[tokio::test]
async fn steps_follow_migration_order_not_module_declaration_order() {
    let sb = Sandbox::new(&["a1", "a2", "b1"]);
    let cfg = json!({
        "modules": [{ "name": "b1" }, { "name": "a2" }, { "name": "a1" }],
        "migrations": [
            { "name": "A", "serie": [
                { "type": "truffle", "name": "a1", "range": [1, 1] },
                { "type": "truffle", "name": "a2", "range": [1, 1] }
            ] },
            { "name": "B", "serie": [
                { "type": "truffle", "name": "b1", "range": [1, 1] },
                { "type": "truffle", "name": "a1", "range": [2, 2] }
            ] }
        ]
    });
    let truffle = Arc::new(FakeTruffle::new(&sb.layout));
    let report = engine(&sb, cfg, truffle.clone()).run().await.unwrap();

    let order: Vec<String> = truffle.calls().iter().map(|c| c.module()).collect();
    assert_eq!(order, vec!["a1", "a2", "b1", "a1"]);
    assert_eq!(report.executed, vec!["A".to_string(), "B".to_string()]);
    let recorded = sb.migration_json(NET);
    assert_eq!(recorded[0]["name"], "A");
    assert_eq!(recorded[1]["history"], json!([{ "name": "b1", "migrationNumber": 1 }, { "name": "a1", "migrationNumber": 2 }]));
}

#[tokio::test]
async fn missing_network_entry_stops_before_any_work() {
    let sb = Sandbox::new(&["core"]);
    fs::remove_file(sb.layout.contracts_portal.join("network.json")).unwrap();
    // Publicada sólo en el portal de red no basta.
    fs::write(sb.layout.network_portal.join("network.json"), "{}").unwrap();
    let truffle = Arc::new(FakeTruffle::new(&sb.layout));
    let err = engine(&sb, single_core_migration(), truffle.clone()).run().await.unwrap_err();

    assert!(matches!(err, DeployError::PortalMissing { ref key, .. } if key == "network.json"), "{err:?}");
    assert!(truffle.calls().is_empty());
    assert!(!sb.layout.migration_file(NET).exists());
}

#[test]
fn missing_contracts_portal_fails_construction() {
    let sb = Sandbox::new(&["core"]);
    fs::remove_dir_all(&sb.layout.contracts_portal).unwrap();
    let res = ContractsEngine::new(contracts(single_core_migration()), NET, sb.layout.clone(), FakeTruffle::new(&sb.layout));
    assert!(matches!(res, Err(DeployError::PortalMissing { .. })));
}

#[test]
fn unknown_module_in_serie_is_rejected_by_validation() {
    let sb = Sandbox::new(&["core"]);
    let cfg = json!({
        "modules": [{ "name": "core" }],
        "migrations": [{ "name": "init", "serie": [{ "type": "truffle", "name": "ghost", "range": [1, 1] }] }]
    });
    let res = ContractsEngine::new(contracts(cfg), NET, sb.layout.clone(), FakeTruffle::new(&sb.layout));
    assert!(matches!(res, Err(DeployError::ConfigValidation { .. })));
}

#[tokio::test]
async fn tests_run_before_migrate_when_requested() {
    let sb = Sandbox::new(&["core"]);
    let cfg = json!({
        "modules": [{ "name": "core" }],
        "migrations": [{ "name": "init", "serie": [{ "type": "truffle", "name": "core", "test": true, "range": [1, 1] }] }]
    });
    let truffle = Arc::new(FakeTruffle::new(&sb.layout));
    engine(&sb, cfg, truffle.clone()).run().await.unwrap();
    assert_eq!(truffle.lines(), vec!["truffle test", "truffle migrate --network dev"]);
}

#[tokio::test]
async fn script_steps_exec_the_method_without_history() {
    let sb = Sandbox::new(&["core"]);
    let cfg = json!({
        "modules": [{ "name": "core" }],
        "migrations": [{ "name": "ops", "serie": [
            { "type": "script", "name": "core", "method": "scripts/set_fees.js", "args": { "fee": 3 } }
        ] }]
    });
    let truffle = Arc::new(FakeTruffle::new(&sb.layout));
    engine(&sb, cfg, truffle.clone()).run().await.unwrap();

    assert_eq!(truffle.lines(), vec!["truffle exec scripts/set_fees.js --network dev"]);
    assert_eq!(sb.migration_json(NET), json!([{ "name": "ops", "status": true, "history": [] }]));
    let run_args = truffle.calls()[0].run_args.clone().unwrap();
    assert!(run_args.starts_with("module.exports = "));
    assert!(run_args.contains("\"fee\": 3"));
}

#[tokio::test]
async fn run_args_do_not_leak_between_steps() {
    let sb = Sandbox::new(&["core", "token"]);
    let cfg = json!({
        "modules": [{ "name": "core" }, { "name": "token" }],
        "migrations": [{ "name": "init", "serie": [
            { "type": "truffle", "name": "core", "range": [1, 1], "args": { "supply": 100 } },
            { "type": "truffle", "name": "token", "range": [1, 1] }
        ] }]
    });
    let truffle = Arc::new(FakeTruffle::new(&sb.layout));
    engine(&sb, cfg, truffle.clone()).run().await.unwrap();

    let calls = truffle.calls();
    assert!(calls[0].run_args.is_some());
    assert!(calls[1].run_args.is_none());
    let history = &sb.migration_json(NET)[0]["history"];
    assert_eq!(history[0], json!({ "name": "core", "args": { "supply": 100 }, "migrationNumber": 1 }));
    assert_eq!(history[1], json!({ "name": "token", "migrationNumber": 1 }));
}

#[tokio::test]
async fn archived_build_is_recovered_before_the_next_step() {
    let sb = Sandbox::new(&["core"]);
    let cfg = json!({
        "modules": [{ "name": "core" }],
        "migrations": [
            { "name": "init", "serie": [{ "type": "truffle", "name": "core", "range": [1, 1] }] },
            { "name": "upgrade", "serie": [{ "type": "truffle", "name": "core", "range": [2, 2] }] }
        ]
    });
    // Basura previa en el workspace: debe desaparecer antes del primer paso.
    let stale = sb.layout.module_build("core").join("contracts");
    fs::create_dir_all(&stale).unwrap();
    fs::write(stale.join("Stale.json"), "{}").unwrap();

    let truffle = Arc::new(FakeTruffle::new(&sb.layout));
    engine(&sb, cfg, truffle.clone()).run().await.unwrap();

    let calls = truffle.calls();
    assert!(calls[0].build_files.is_empty(), "{:?}", calls[0].build_files);
    assert_eq!(calls[1].build_files, vec!["CoreToken.json".to_string()]);
    // El portal refleja el último despliegue.
    assert_eq!(sb.portal_entry("core")["CoreToken"]["deployment"], 2);
    assert_eq!(list(&sb.layout.archived_build("core", NET).join("contracts")), vec!["CoreToken.json".to_string()]);
}

#[tokio::test]
async fn upgradeable_metadata_is_archived_and_project_file_survives() {
    let sb = Sandbox::new(&["proxy"]);
    let oz = sb.layout.module_upgradeable("proxy");
    fs::create_dir_all(&oz).unwrap();
    fs::write(oz.join("project.json"), r#"{"manifestVersion":"3"}"#).unwrap();
    fs::write(oz.join("old.json"), "{}").unwrap();

    let cfg = json!({
        "modules": [{ "name": "proxy", "upgradeable": true }],
        "migrations": [{ "name": "init", "serie": [{ "type": "truffle", "name": "proxy", "range": [1, 1] }] }]
    });
    engine(&sb, cfg, Arc::new(FakeTruffle::new(&sb.layout))).run().await.unwrap();

    assert_eq!(list(&oz), vec!["dev.json".to_string(), "project.json".to_string()]);
    let archived = sb.layout.archived_upgradeable("proxy", NET);
    assert_eq!(list(&archived), vec!["dev.json".to_string(), "project.json".to_string()]);
}

#[tokio::test]
async fn missing_module_directory_is_a_filesystem_error() {
    let sb = Sandbox::new(&[]);
    let truffle = Arc::new(FakeTruffle::new(&sb.layout));
    let err = engine(&sb, single_core_migration(), truffle.clone()).run().await.unwrap_err();
    assert!(matches!(err, DeployError::Filesystem { .. }), "{err:?}");
    assert!(truffle.calls().is_empty());
    assert_eq!(sb.migration_json(NET), json!([]));
}

#[tokio::test]
async fn clean_empties_the_contracts_portal() {
    let sb = Sandbox::new(&["core"]);
    let engine = engine(&sb, single_core_migration(), Arc::new(FakeTruffle::new(&sb.layout)));
    engine.run().await.unwrap();
    assert!(sb.layout.contracts_portal.join("core.json").is_file());

    assert_eq!(engine.clean().unwrap(), 1);
    assert_eq!(engine.clean().unwrap(), 0);
    assert!(sb.layout.contracts_portal.join("network.json").is_file());
    // El archivo de migraciones no es parte del portal.
    assert!(sb.layout.migration_file(NET).is_file());
}
