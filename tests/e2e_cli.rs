use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use std::{fs, process::Command};
use tempfile::TempDir;

const FIXTURE: &str = "tests/data/sample_statement.txt";

fn setup_temp_home() -> TempDir {
    TempDir::new().expect("failed to create temp home")
}

/// Command with an isolated HOME so no user config file is picked up
fn cams_xirr(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("cams-xirr"));
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn text_statement_prints_table_without_color() {
    let home = setup_temp_home();

    let mut cmd = cams_xirr(&home);
    cmd.arg("--text").arg(FIXTURE).arg("--no-color");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Total Market Value: INR 51,800.00"))
        .stdout(predicate::str::contains("Total XIRR: 13.85%"))
        .stdout(predicate::str::contains("Fund-wise XIRR:"))
        .stdout(predicate::str::contains("K100G-Kotak Liquid Fund"))
        .stdout(predicate::str::contains("6.50%"))
        .stdout(predicate::str::contains("8.04%"))
        .stdout(predicate::str::contains("20.55%"))
        .stdout(predicate::str::contains("FAILED").not())
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn json_output_is_machine_readable() {
    let home = setup_temp_home();

    let output = cams_xirr(&home)
        .arg("--text")
        .arg(FIXTURE)
        .arg("--json")
        .output()
        .expect("failed to run cams-xirr");
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["valuation_date"], "2024-03-29");
    assert_eq!(value["total_market_value"], "51800.00");
    assert_eq!(value["total_xirr_pct"], 13.85);
    assert_eq!(value["cash_flows"], 7);
    assert_eq!(value["funds"][0]["cash_flows"], 3);
    assert_eq!(value["funds"].as_array().map(|f| f.len()), Some(3));
    assert_eq!(value["funds"][2]["fund"], "P8029-Parag Parikh Flexi Cap Fund");
    assert_eq!(value["funds"][2]["xirr_pct"], 20.55);
    assert!(value["funds"][2]["error"].is_null());
}

#[test]
fn config_file_changes_display() {
    let home = setup_temp_home();
    let config = home.path().join("custom.toml");
    fs::write(&config, "[display]\ncurrency = \"Rs.\"\ndecimals = 1\n").unwrap();

    cams_xirr(&home)
        .arg("--text")
        .arg(FIXTURE)
        .arg("--config")
        .arg(&config)
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Market Value: Rs. 51,800.0"))
        .stdout(predicate::str::contains("Total XIRR: 13.9%"));
}

#[test]
fn invalid_config_file_fails() {
    let home = setup_temp_home();
    let config = home.path().join("bad.toml");
    fs::write(&config, "[solver]\nmax_iterations = 0\n").unwrap();

    cams_xirr(&home)
        .arg("--text")
        .arg(FIXTURE)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_iterations"));
}

#[test]
fn fund_without_market_value_fails() {
    let home = setup_temp_home();
    let statement = home.path().join("statement.txt");
    fs::write(
        &statement,
        "\
Folio No: 1111 / 0 PAN: ABCDE1234F
AAA11-Alpha Equity Fund - Growth - ISIN: INF000000001(Advisor: DIRECT) Registrar : CAMS
15-Jan-2020 Purchase 10,000.00 400.000 25.0000 400.000
Market Value on 29-Mar-2024: INR 12,000.00
Folio No: 2222 / 0 PAN: ABCDE1234F
BBB22-Beta Debt Fund - Growth - ISIN: INF000000002(Advisor: DIRECT) Registrar : CAMS
15-Jan-2021 Purchase 5,000.00 100.000 50.0000 100.000
",
    )
    .unwrap();

    cams_xirr(&home)
        .arg("--text")
        .arg(&statement)
        .arg("--no-color")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "no valuation found for fund 'BBB22-Beta Debt Fund'",
        ));
}

#[test]
fn pdf_requires_password() {
    let home = setup_temp_home();

    cams_xirr(&home)
        .arg("--pdf")
        .arg("statement.pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--password"));
}

#[test]
fn missing_statement_file_fails() {
    let home = setup_temp_home();

    cams_xirr(&home)
        .arg("--text")
        .arg("tests/data/no_such_statement.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Statement file not found"));
}
