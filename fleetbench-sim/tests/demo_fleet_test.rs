use fleetbench_core::UnitRef;
use fleetbench_interfaces::FleetSession;
use fleetbench_sim::{FleetSpec, Outcome, SimulatedFleet};
use std::io::Write;
use std::time::Duration;

const DEMO_FLEET: &str = include_str!("../../demos/fleet.yaml");

#[test]
fn test_demo_fleet_parses() {
    let spec = FleetSpec::from_yaml_str(DEMO_FLEET).unwrap();
    let magpie = &spec.models["woodpecker"].applications["magpie"];

    assert_eq!(magpie.units, 120);
    assert_eq!(magpie.actions["fio"].completes_after, Duration::from_secs(40));
    assert_eq!(magpie.actions["iperf"].outcome, Outcome::Succeeded);
    assert!(spec.models["heron"].applications["egret"].actions["fio"].hang);
}

#[tokio::test]
async fn test_fleet_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DEMO_FLEET.as_bytes()).unwrap();

    let fleet = SimulatedFleet::from_file(file.path()).unwrap();
    assert_eq!(fleet.active_model(), "woodpecker");

    let magpie = fleet.get_application("magpie").await.unwrap();
    assert_eq!(magpie.units.len(), 120);
    assert_eq!(magpie.units[119], UnitRef::from("magpie/119"));
    assert_eq!(
        magpie.actions["fio"].required_parameters(),
        vec!["operation"]
    );
}

#[test]
fn test_missing_fleet_file() {
    assert!(SimulatedFleet::from_file("/nonexistent/fleet.yaml").is_err());
}
