//! Integration tests for the restow command.
#![cfg(unix)]

mod common;

use common::{FarmBuilder, assert_links_to, assert_real_dir, install, restow};
use stowage_cli::commands::Outcome;

#[test]
fn restow_of_an_installed_package_ends_in_the_same_state() {
    let farm = FarmBuilder::new()
        .with_file("app", ".config/app/x", "x")
        .with_file("app", ".zshrc", "zsh")
        .build();

    install(&farm, &["app"]);
    let outcome = restow(&farm, &["app"]);

    assert_eq!(outcome, Outcome::Clean);
    assert_real_dir(&farm.target(".config/app"));
    assert_links_to(
        &farm.target(".config/app/x"),
        &farm.package_path("app", ".config/app/x"),
    );
    assert_links_to(&farm.target(".zshrc"), &farm.package_path("app", ".zshrc"));
    assert_eq!(farm.target_entries(""), vec![".config", ".zshrc"]);
}

#[test]
fn restow_installs_a_package_that_was_never_installed() {
    let farm = FarmBuilder::new()
        .with_file("app", ".vimrc", "vim")
        .build();

    let outcome = restow(&farm, &["app"]);

    assert_eq!(outcome, Outcome::Clean);
    assert_links_to(&farm.target(".vimrc"), &farm.package_path("app", ".vimrc"));
}

#[test]
fn restow_picks_up_files_added_to_the_package() {
    let farm = FarmBuilder::new()
        .with_file("app", ".config/app/x", "x")
        .build();

    install(&farm, &["app"]);
    std::fs::write(farm.package_path("app", ".config/app/y"), "new").unwrap();

    let outcome = restow(&farm, &["app"]);

    assert_eq!(outcome, Outcome::Clean);
    assert_links_to(
        &farm.target(".config/app/y"),
        &farm.package_path("app", ".config/app/y"),
    );
}

#[test]
fn restow_all_processes_every_package_independently() {
    let farm = FarmBuilder::new()
        .with_file("good", ".vimrc", "vim")
        .with_file("bad", ".zshrc", "pkg")
        .with_target_file(".zshrc", "user")
        .build();

    let outcome = restow(&farm, &[]);

    // The conflicting package degrades the run but the good one restows.
    assert_eq!(outcome, Outcome::Degraded);
    assert_links_to(&farm.target(".vimrc"), &farm.package_path("good", ".vimrc"));
    assert_eq!(
        std::fs::read_to_string(farm.target(".zshrc")).unwrap(),
        "user"
    );
}

#[test]
fn restow_does_not_disturb_a_sibling_package() {
    let farm = FarmBuilder::new()
        .with_file("a", ".config/app/x", "x")
        .with_file("b", ".config/app/y", "y")
        .build();

    install(&farm, &[]);
    let outcome = restow(&farm, &["a"]);

    assert_eq!(outcome, Outcome::Clean);
    assert_eq!(
        std::fs::read_to_string(farm.target(".config/app/x")).unwrap(),
        "x"
    );
    assert_eq!(
        std::fs::read_to_string(farm.target(".config/app/y")).unwrap(),
        "y"
    );
}
