//! Unit tests for the fetch orchestrator

use repofleet::config::{HOME_ENV, StorePaths};
use repofleet::operations::admin;
use repofleet::operations::fetch::{FetchRequest, fetch};
use repofleet::process::FakeRunner;
use repofleet::registry::Registry;
use repofleet::system::{MockSystem, System as _};
use std::path::Path;

const WORKERS: &str = "\
alpha:
  host: alpha.fleet
  base_path: /srv/repos
";

fn fleet_system() -> MockSystem {
    let system = MockSystem::new()
        .with_env(HOME_ENV, "/store")
        .with_current_dir("/home/u/proj")
        .with_dir("/home/u/proj")
        .with_file("/store/workers.yaml", WORKERS.as_bytes());
    admin::init(&system).unwrap();

    let paths = StorePaths::resolve(&system).unwrap();
    let mut registry = Registry::load(&system, &paths.registry_file()).unwrap();
    registry.register("alpha", "proj", Path::new("/home/u/proj"));
    registry.save(&system, &paths.registry_file()).unwrap();

    system
}

fn request(refspec: &str) -> FetchRequest {
    FetchRequest {
        worker: "alpha".to_owned(),
        refspec: refspec.to_owned(),
    }
}

#[test]
fn fetch_builds_remotely_and_applies_into_registered_path() {
    let system = fleet_system();
    let runner = FakeRunner::new();

    fetch(&system, &runner, &request("main")).unwrap();

    // The builder runs on the worker, with its base path
    assert!(runner.ran("ssh alpha.fleet repofleet bundle proj main"));
    assert!(runner.ran("--output /tmp/repofleet-"));
    assert!(runner.ran("--base-path /srv/repos"));

    // The bundle comes back and is applied locally at the registered path
    assert!(runner.ran("scp alpha.fleet:/tmp/repofleet-"));
    assert!(runner.ran("fetch"));
    assert!(runner.ran("main:main"));

    // Worker-side staging removed
    assert!(runner.ran("rm -rf /tmp/repofleet-"));
}

#[test]
fn fetch_maps_remote_branch_into_local_branch() {
    let system = fleet_system();
    let runner = FakeRunner::new();

    fetch(&system, &runner, &request("work:proj@main")).unwrap();

    // Worker bundles its 'main'; locally it lands as 'work'
    assert!(runner.ran("repofleet bundle proj main"));
    assert!(runner.ran("main:work"));
}

#[test]
fn fetch_of_unregistered_repo_is_a_configuration_error() {
    let system = fleet_system();
    let runner = FakeRunner::new();

    let err = fetch(&system, &runner, &request("main:ghost")).unwrap_err();

    assert!(err.to_string().contains("Configuration error"));
    assert!(err.to_string().contains("ghost"));
    assert!(!runner.ran("ssh"));
}

#[test]
fn fetch_cleans_up_remote_staging_after_transport_failure() {
    let system = fleet_system();
    let runner = FakeRunner::new().on("scp", 1, "", "scp: connection reset\n");

    let err = fetch(&system, &runner, &request("main")).unwrap_err();

    assert!(err.to_string().contains("Transport error"));
    assert!(runner.ran("rm -rf /tmp/repofleet-"));
}

#[test]
fn fetch_records_no_transfer_state() {
    let system = fleet_system();
    let runner = FakeRunner::new();

    fetch(&system, &runner, &request("main")).unwrap();

    let paths = StorePaths::resolve(&system).unwrap();
    assert!(!system.exists(&paths.state_file()));
}
