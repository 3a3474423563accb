//! Integration tests for token resolution, distance queries and system
//! summaries against a mock EDSM server.

mod common;

use edtrack_lib::{distance_between, locate, resolve_coordinates, system_summary};
use mockito::Matcher;

#[test]
fn locate_reports_the_commanders_system() {
    let mut ctx = common::setup();
    ctx.store.bind("42", "CMDR Alpha", None).unwrap();
    ctx.server
        .mock("GET", "/api-logs-v1/get-position")
        .match_query(Matcher::UrlEncoded(
            "commanderName".into(),
            "CMDR Alpha".into(),
        ))
        .with_status(200)
        .with_body(r#"{"msgnum":100,"msg":"OK","system":"Shinrarta Dezhra"}"#)
        .create();

    // The chat identity works as well as the commander name.
    let reply = locate(&ctx.store, &ctx.client, "42").unwrap();
    assert_eq!(reply, "CMDR Alpha is at Shinrarta Dezhra");
}

#[test]
fn locate_falls_back_to_a_not_located_message() {
    let mut ctx = common::setup();
    ctx.server
        .mock("GET", "/api-logs-v1/get-position")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"msgnum":203,"msg":"Commander name/API Key not found"}"#)
        .create();

    let reply = locate(&ctx.store, &ctx.client, "CMDR Ghost").unwrap();
    assert_eq!(reply, "CMDR Ghost could not be located");
}

#[test]
fn poi_wins_over_a_system_lookup() {
    let mut ctx = common::setup();
    ctx.server
        .mock("GET", "/api-v1/system")
        .match_query(Matcher::UrlEncoded("systemName".into(), "Sol".into()))
        .with_status(200)
        .with_body(r#"{"name":"Sol","coords":{"x":0.0,"y":0.0,"z":0.0}}"#)
        .expect(1)
        .create();
    ctx.store.add_poi(&ctx.client, "HomeBase", "Sol").unwrap();

    // Token resolution finds the stored POI without another API call.
    let no_more_calls = ctx
        .server
        .mock("GET", "/api-v1/system")
        .match_query(Matcher::Any)
        .expect(0)
        .create();
    let coords = resolve_coordinates(&ctx.store, &ctx.client, "HomeBase")
        .unwrap()
        .unwrap();
    assert_eq!((coords.x, coords.y, coords.z), (0.0, 0.0, 0.0));
    no_more_calls.assert();
}

#[test]
fn registered_commander_resolves_through_their_position() {
    let mut ctx = common::setup();
    ctx.store.bind("42", "CMDR Alpha", None).unwrap();
    ctx.server
        .mock("GET", "/api-logs-v1/get-position")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("commanderName".into(), "CMDR Alpha".into()),
            Matcher::UrlEncoded("showCoordinates".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"msgnum":100,"msg":"OK","system":"Wolf 359","coordinates":{"x":3.0,"y":4.0,"z":12.0}}"#,
        )
        .create();

    let coords = resolve_coordinates(&ctx.store, &ctx.client, "CMDR Alpha")
        .unwrap()
        .unwrap();
    assert_eq!(coords.z, 12.0);
}

#[test]
fn registered_poi_distance_to_itself_is_zero() {
    let mut ctx = common::setup();
    ctx.server
        .mock("GET", "/api-v1/system")
        .match_query(Matcher::UrlEncoded("systemName".into(), "Sol".into()))
        .with_status(200)
        .with_body(r#"{"name":"Sol","coords":{"x":0.0,"y":0.0,"z":0.0}}"#)
        .create();

    ctx.store.bind("42", "CMDR Alpha", None).unwrap();
    ctx.store.add_poi(&ctx.client, "HomeBase", "Sol").unwrap();

    let distance = distance_between(&ctx.store, &ctx.client, "HomeBase", "HomeBase").unwrap();
    assert_eq!(distance, 0.0);
}

#[test]
fn unresolvable_endpoint_yields_the_sentinel() {
    let mut ctx = common::setup();
    ctx.server
        .mock("GET", "/api-v1/system")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create();

    let distance =
        distance_between(&ctx.store, &ctx.client, "Nowhere At All", "Also Nowhere").unwrap();
    assert_eq!(distance, -1.0);
}

#[test]
fn summary_renders_only_the_sections_with_data() {
    let mut ctx = common::setup();
    ctx.server
        .mock("GET", "/api-v1/system")
        .match_query(Matcher::UrlEncoded("systemName".into(), "Sol".into()))
        .with_status(200)
        .with_body(
            r#"{"name":"Sol","coords":{"x":0.0,"y":0.0,"z":0.0},
                "information":{"allegiance":"Federation","government":"Democracy","population":22780871769},
                "primaryStar":{"type":"G (White-Yellow) Star","name":"Sol","isScoopable":true},
                "requirePermit":true,"permitName":"Sol"}"#,
        )
        .create();
    ctx.server
        .mock("GET", "/api-system-v1/bodies")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"name":"Sol","bodies":[{"name":"Sol","type":"Star","isMainStar":true,"isScoopable":true}]}"#)
        .create();
    ctx.server
        .mock("GET", "/api-system-v1/stations")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"name":"Sol","stations":[
                {"name":"Abraham Lincoln","type":"Orbis Starport","distanceToArrival":496.8},
                {"name":"Galileo","type":"Ocellus Starport","distanceToArrival":505.4},
                {"name":"V2T-N7Z","type":"Fleet Carrier","distanceToArrival":202.1}
            ]}"#,
        )
        .create();
    // Traffic and deaths are reachable but empty.
    ctx.server
        .mock("GET", "/api-system-v1/traffic")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"name":"Sol","traffic":{}}"#)
        .create();
    ctx.server
        .mock("GET", "/api-system-v1/deaths")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"name":"Sol","deaths":{}}"#)
        .create();
    ctx.server
        .mock("GET", "/api-system-v1/estimated-value")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"name":"Sol","estimatedValue":2413,"estimatedValueMapped":4503}"#)
        .create();

    let summary = system_summary(&ctx.store, &ctx.client, "Sol").unwrap();
    assert!(summary.contains("Information for Sol:"));
    assert!(summary.contains("Democracy - Federation"));
    assert!(summary.contains("Entry requires the Sol permit."));
    assert!(summary.contains("Primary Star: G (White-Yellow) Star (scoopable)"));
    assert!(summary.contains("2 stations in system. Closest is Abraham Lincoln (496.8 ls)"));
    assert!(summary.contains("1 fleet carriers in system."));
    assert!(summary.contains("Estimated scan value: 2413 cr (mapped: 4503 cr)"));
    assert!(summary.contains("Location: 0 LY from Sol"));
    // No usable traffic or death tallies: the line is omitted entirely.
    assert!(!summary.contains("died in the system"));
}

#[test]
fn summary_follows_a_poi_to_its_backing_system() {
    let mut ctx = common::setup();
    let sol_mock = ctx
        .server
        .mock("GET", "/api-v1/system")
        .match_query(Matcher::UrlEncoded("systemName".into(), "Sol".into()))
        .with_status(200)
        .with_body(r#"{"name":"Sol","coords":{"x":0.0,"y":0.0,"z":0.0}}"#)
        .expect(2)
        .create();
    for endpoint in ["bodies", "stations", "traffic", "deaths", "estimated-value"] {
        ctx.server
            .mock("GET", format!("/api-system-v1/{endpoint}").as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create();
    }
    ctx.store.add_poi(&ctx.client, "HomeBase", "Sol").unwrap();

    let summary = system_summary(&ctx.store, &ctx.client, "homebase").unwrap();
    assert!(summary.contains("Information for Sol:"));
    assert!(!summary.contains("permit"));
    sol_mock.assert();
}

#[test]
fn summary_reports_unknown_systems() {
    let mut ctx = common::setup();
    ctx.server
        .mock("GET", "/api-v1/system")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create();

    let summary = system_summary(&ctx.store, &ctx.client, "Nowhere At All").unwrap();
    assert_eq!(
        summary,
        "Could not find information for system \"Nowhere At All\""
    );
}
