/// CLI integration tests for cadence
///
/// These tests run the binary as a black box against a temporary task file.
use predicates::prelude::*;

mod helpers;
use helpers::{assertions, extract_task_id, CliTestHarness, TestFixtures};

/// Test basic CLI help and version commands
#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("Cadence"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("edit"));

    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("cadence"));

    harness
        .run_failure(&["invalid-command"])
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_add_and_show() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["add", "Buy milk", "--date", "2024-05-06", "--priority", "high"])
        .stdout(assertions::task_created_successfully());
    assert!(harness.store_path().exists());

    let id = harness.add_task(&["Call mom", "--date", "2024-05-06", "-d", "Sunday call"]);
    harness
        .run_success(&["show", &id[..8]])
        .stdout(predicate::str::contains("Call mom"))
        .stdout(predicate::str::contains("Sunday call"))
        .stdout(predicate::str::contains("2024-05-06"))
        .stdout(predicate::str::contains("Does not repeat"));
}

#[test]
fn test_add_rejects_bad_input() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&["add", "Bad", "--priority", "whenever"])
        .stderr(predicate::str::contains("error"));
    harness
        .run_failure(&["add", "Bad", "--date", "not a date at all"])
        .stderr(assertions::has_error());
    harness
        .run_failure(&["add", "Bad", "--every", "daily", "--on", "mon"])
        .stderr(predicate::str::contains("Invalid input"));
    harness
        .run_failure(&["add", "   "])
        .stderr(predicate::str::contains("title cannot be empty"));
}

#[test]
fn test_preview_every_other_monday() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&TestFixtures::biweekly_series_args());

    harness
        .run_success(&["preview", &id, "--count", "5"])
        .stdout(predicate::str::contains("Repeats every 2 weeks"))
        .stdout(predicate::str::contains("2024-01-01"))
        .stdout(predicate::str::contains("2024-01-15"))
        .stdout(predicate::str::contains("2024-01-29"))
        .stdout(predicate::str::contains("2024-02-12"))
        .stdout(predicate::str::contains("2024-02-26"))
        .stdout(predicate::str::contains("2024-01-08").not());
}

#[test]
fn test_preview_of_plain_task_fails() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&["Once", "--date", "2024-01-01"]);

    harness
        .run_failure(&["preview", &id])
        .stderr(predicate::str::contains("not a recurring series"));
}

#[test]
fn test_list_expands_series_into_week() {
    let harness = CliTestHarness::new();
    harness.add_task(&[
        "Gym",
        "--date",
        "2024-03-04",
        "--every",
        "weekly",
        "--on",
        "mon,wed,fri",
    ]);

    harness
        .run_success(&["list", "--view", "week", "--date", "2024-03-13"])
        .stdout(assertions::has_agenda_headers())
        .stdout(predicate::str::contains("Mon 2024-03-11"))
        .stdout(predicate::str::contains("Wed 2024-03-13"))
        .stdout(predicate::str::contains("Fri 2024-03-15"))
        .stdout(predicate::str::contains("Tue 2024-03-12").not());
}

#[test]
fn test_list_empty_week() {
    let harness = CliTestHarness::new();
    harness
        .run_success(&["list", "--date", "2024-03-13"])
        .stdout(predicate::str::contains("No tasks found"));
}

#[test]
fn test_count_limits_series_in_month_view() {
    let harness = CliTestHarness::new();
    harness.add_task(&[
        "Pills",
        "--date",
        "2024-02-27",
        "--every",
        "daily",
        "--count",
        "3",
    ]);

    harness
        .run_success(&["list", "--view", "month", "--date", "2024-02-10"])
        .stdout(predicate::str::contains("Tue 2024-02-27"))
        .stdout(predicate::str::contains("Thu 2024-02-29"))
        .stdout(predicate::str::contains("Fri 2024-03-01").not());
}

#[test]
fn test_done_on_virtual_occurrence_materializes_it() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&TestFixtures::biweekly_series_args());

    harness
        .run_success(&["done", &id, "--date", "2024-01-15"])
        .stdout(predicate::str::contains("Completed"))
        .stdout(predicate::str::contains("2024-01-15"));

    let stored = std::fs::read_to_string(harness.store_path()).unwrap();
    assert!(stored.contains(&format!("\"parentTaskId\": \"{}\"", id)));
    assert!(stored.contains("\"date\": \"2024-01-15\""));

    harness
        .run_failure(&["done", &id, "--date", "2024-01-16"])
        .stderr(predicate::str::contains("not an occurrence"));
}

#[test]
fn test_move_within_and_across_days() {
    let harness = CliTestHarness::new();
    let first = harness.add_task(&["first", "--date", "2024-04-01"]);
    harness.add_task(&["second", "--date", "2024-04-01"]);
    harness.add_task(&["other", "--date", "2024-04-02"]);

    harness
        .run_success(&["move", &first, "--position", "0"])
        .stdout(predicate::str::contains("already at that position"));

    harness
        .run_success(&["move", &first, "--position", "5"])
        .stdout(predicate::str::contains("Moved"));
    harness
        .run_success(&["show", &first])
        .stdout(predicate::str::contains("Order"))
        .stdout(predicate::str::contains("2024-04-01"));

    harness
        .run_success(&["move", &first, "--date", "2024-04-02", "--position", "0"])
        .stdout(predicate::str::contains("2024-04-02"));
    harness
        .run_success(&["show", &first])
        .stdout(predicate::str::contains("2024-04-02"));
}

#[test]
fn test_delete_series_removes_instances() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&TestFixtures::biweekly_series_args());
    harness.run_success(&["done", &id, "--date", "2024-01-29"]);

    harness
        .run_success(&["delete", &id, "--force"])
        .stdout(predicate::str::contains("Deleted task"));

    let stored = std::fs::read_to_string(harness.store_path()).unwrap();
    assert_eq!(stored.trim(), "[]");

    harness
        .run_failure(&["show", &id])
        .stderr(predicate::str::contains("No task found"));
}

#[test]
fn test_edit_series_rule_changes_expansion() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&TestFixtures::biweekly_series_args());

    harness
        .run_success(&["edit", &id, "--scope", "all", "--every", "daily", "--count", "3"])
        .stdout(predicate::str::contains("Updated series"))
        .stdout(predicate::str::contains("Repeats every day, 3 times"));

    harness
        .run_success(&["list", "--view", "week", "--date", "2024-01-01"])
        .stdout(predicate::str::contains("Mon 2024-01-01"))
        .stdout(predicate::str::contains("Tue 2024-01-02"))
        .stdout(predicate::str::contains("Wed 2024-01-03"))
        .stdout(predicate::str::contains("Thu 2024-01-04").not());
}

#[test]
fn test_edit_future_splits_series() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&TestFixtures::biweekly_series_args());

    harness
        .run_success(&[
            "edit",
            &id,
            "--occurrence",
            "2024-01-15",
            "--scope",
            "future",
            "--title",
            "Retro",
        ])
        .stdout(predicate::str::contains("Split series"))
        .stdout(predicate::str::contains("Starts: 2024-01-15"));

    harness
        .run_success(&["list", "--view", "month", "--date", "2024-01-10"])
        .stdout(predicate::str::contains("Sprint review"))
        .stdout(predicate::str::contains("Retro"))
        .stdout(predicate::str::contains("Mon 2024-01-29"));

    harness
        .run_success(&["preview", &id])
        .stdout(predicate::str::contains("until 2024-01-14"))
        .stdout(predicate::str::contains("2024-01-15").not());
}

#[test]
fn test_edit_can_stop_a_series() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&TestFixtures::biweekly_series_args());

    harness
        .run_success(&["edit", &id, "--force-scope", "--recurrence-clear"])
        .stdout(predicate::str::contains("Does not repeat"));
    harness
        .run_failure(&["preview", &id])
        .stderr(predicate::str::contains("not a recurring series"));
}

#[test]
fn test_edit_plain_task() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&["Buy milk", "--date", "2024-05-06", "-d", "2 liters"]);

    harness
        .run_success(&["edit", &id, "--title", "Buy oat milk", "-p", "urgent", "--description-clear"])
        .stdout(predicate::str::contains("Updated task: "));
    harness
        .run_success(&["show", &id])
        .stdout(predicate::str::contains("Buy oat milk"))
        .stdout(predicate::str::contains("urgent"))
        .stdout(predicate::str::contains("2 liters").not());

    harness
        .run_failure(&["edit", &id])
        .stderr(predicate::str::contains("Nothing to change"));
    harness
        .run_failure(&["edit", &id, "--occurrence", "2024-05-07", "--title", "x"])
        .stderr(predicate::str::contains("not a recurring series"));
}

#[test]
fn test_delete_single_occurrence() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&TestFixtures::biweekly_series_args());

    harness
        .run_success(&[
            "delete",
            &id,
            "--occurrence",
            "2024-01-15",
            "--scope",
            "this",
            "--force",
        ])
        .stdout(predicate::str::contains("Deleted occurrence"));

    harness
        .run_success(&["preview", &id])
        .stdout(predicate::str::contains("until 2024-01-14"))
        .stdout(predicate::str::contains("2024-01-29").not());

    harness
        .run_success(&["list", "--view", "month", "--date", "2024-01-10"])
        .stdout(predicate::str::contains("Mon 2024-01-01"))
        .stdout(predicate::str::contains("Mon 2024-01-15").not())
        .stdout(predicate::str::contains("Mon 2024-01-29"));

    harness
        .run_failure(&["done", &id, "--date", "2024-01-15"])
        .stderr(predicate::str::contains("not an occurrence"));
}

#[test]
fn test_delete_this_and_future_occurrences() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&TestFixtures::biweekly_series_args());
    harness.run_success(&["done", &id, "--date", "2024-02-12"]);

    harness
        .run_success(&[
            "delete",
            &id,
            "--occurrence",
            "2024-01-29",
            "--scope",
            "future",
            "--force",
        ])
        .stdout(predicate::str::contains("Ended series"));

    harness
        .run_success(&["preview", &id])
        .stdout(predicate::str::contains("until 2024-01-28"))
        .stdout(predicate::str::contains("2024-01-15"))
        .stdout(predicate::str::contains("2024-01-29").not());

    let stored = std::fs::read_to_string(harness.store_path()).unwrap();
    assert!(!stored.contains("2024-02-12"));
}

#[test]
fn test_short_id_must_be_long_enough() {
    let harness = CliTestHarness::new();
    harness.add_task(&["Anything"]);

    harness
        .run_failure(&["show", "a"])
        .stderr(predicate::str::contains("at least 2 characters"));
}

#[test]
fn test_config_file_sets_default_view() {
    let harness = CliTestHarness::new();
    std::fs::write(
        harness.dir().join("cadence.toml"),
        "default_view = \"month\"\nweek_start = \"sunday\"\n",
    )
    .unwrap();
    harness.add_task(&["Payday", "--date", "2024-06-28"]);

    // Sunday-started month grid for June 2024 runs from May 26 to July 6
    harness
        .run_success(&["list", "--date", "2024-06-03"])
        .stdout(predicate::str::contains("Agenda 2024-05-26 to 2024-07-06"))
        .stdout(predicate::str::contains("Payday"));
}

#[test]
fn test_extract_task_id_from_colored_output() {
    let output = "✓ Created task: x\n  → Task ID: \u{1b}[33m7f4c6a4e-2f1b-4a55-9a3e-0e5b1d6f9c21\u{1b}[39m\n";
    assert_eq!(
        extract_task_id(output).as_deref(),
        Some("7f4c6a4e-2f1b-4a55-9a3e-0e5b1d6f9c21")
    );
}
