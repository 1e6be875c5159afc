mod support;

use subdeck::config::UpdateConfig;
use subdeck::traits::{GitIntent, PromptKind};
use subdeck::{RefreshRequest, RefreshScope, ViewKind, WorkingFile};
use support::{docs_submodule, lib_submodule, Harness};

const URL: &str = "https://example.com/foo/bar.git";

fn seeded(files: Vec<WorkingFile>) -> Harness {
    let mut h = Harness::new(UpdateConfig::default());
    h.seed(vec![lib_submodule(), docs_submodule()], files);
    h
}

fn input_initial(h: &Harness) -> String {
    match h.last_prompt().kind {
        PromptKind::Input { initial } => initial,
        other => panic!("expected input prompt, got {other:?}"),
    }
}

fn submodules_sync() -> RefreshRequest {
    RefreshRequest::sync(RefreshScope::of(ViewKind::Submodules))
}

#[tokio::test]
async fn cancelling_add_at_any_step_has_no_effect() {
    for answered in 0..3 {
        let mut h = seeded(vec![]);
        h.session.add_submodule();
        for answer in [URL, "bar", "bar"].into_iter().take(answered) {
            h.session.submit_prompt(answer);
        }
        assert_eq!(h.prompt_count(), answered + 1);
        h.session.cancel_prompt();

        assert!(!h.session.has_modal());
        assert!(!h.session.has_work_in_flight());
        assert!(h.executor.runs().is_empty(), "cancelled after {answered} answers");
        assert!(h.refresher.requests().is_empty());
        assert_eq!(h.session.status_text(), "");
    }
}

#[tokio::test]
async fn add_suggests_name_from_url_and_path_from_name() {
    let mut h = seeded(vec![]);
    h.session.add_submodule();
    assert_eq!(h.last_prompt().title, "New submodule URL:");
    assert_eq!(input_initial(&h), "");

    h.session.submit_prompt(URL);
    assert_eq!(input_initial(&h), "bar");

    h.session.submit_prompt("baz");
    assert_eq!(input_initial(&h), "baz");

    h.session.submit_prompt("deps/baz");
    assert!(!h.session.has_modal());
    assert_eq!(h.session.status_text(), "adding submodule");

    h.settle().await;
    assert_eq!(
        h.executor.runs(),
        vec![GitIntent::AddSubmodule {
            name: "baz".into(),
            path: "deps/baz".into(),
            url: URL.into(),
        }]
    );
    assert_eq!(h.refresher.requests(), vec![submodules_sync()]);
    assert_eq!(h.log.actions(), vec!["Add submodule".to_string()]);
    assert_eq!(h.session.status_text(), "");
}

#[tokio::test]
async fn empty_url_is_rejected_in_place() {
    let mut h = seeded(vec![]);
    h.session.add_submodule();
    h.session.submit_prompt("   ");

    let prompt = h.last_prompt();
    assert_eq!(prompt.title, "New submodule URL:");
    assert_eq!(prompt.rejection.as_deref(), Some("Submodule URL cannot be empty"));
    assert!(h.session.has_modal());
    assert!(h.executor.runs().is_empty());
}

#[tokio::test]
async fn edit_url_is_prefilled_with_current_url() {
    let mut h = seeded(vec![]);
    h.session.edit_submodule_url();
    assert_eq!(h.last_prompt().title, "Update URL for submodule 'lib'");
    assert_eq!(input_initial(&h), "https://example.com/lib.git");

    h.session.submit_prompt("https://mirror.example.com/lib.git");
    h.settle().await;
    assert_eq!(
        h.executor.runs(),
        vec![GitIntent::UpdateSubmoduleUrl {
            name: "lib".into(),
            path: "vendor/lib".into(),
            url: "https://mirror.example.com/lib.git".into(),
        }]
    );
    assert_eq!(h.refresher.requests(), vec![submodules_sync()]);
}

#[tokio::test]
async fn reset_unstages_matching_file_then_refreshes_in_background() {
    let mut h = seeded(vec![
        WorkingFile::new("README.md", true),
        WorkingFile::new("vendor/lib", true),
    ]);
    h.session.open_reset_menu();
    {
        let shown = h.shown.borrow();
        let menu = shown.menus.last().expect("menu shown");
        assert_eq!(menu.title, "lib");
        assert_eq!(menu.items.len(), 2);
    }

    h.session.select_menu_item(0);
    assert_eq!(h.session.status_text(), "resetting submodule");
    h.settle().await;

    assert_eq!(
        h.executor.runs(),
        vec![
            GitIntent::UnstageFile {
                names: vec!["vendor/lib".into()],
                tracked: true,
            },
            GitIntent::StashSubmodule { path: "vendor/lib".into() },
            GitIntent::ResetSubmodule { path: "vendor/lib".into() },
        ]
    );
    assert_eq!(
        h.refresher.requests(),
        vec![RefreshRequest::background(
            RefreshScope::of(ViewKind::Files).with(ViewKind::Submodules)
        )]
    );
    assert_eq!(h.log.actions(), vec!["Reset submodule".to_string()]);
}

#[tokio::test]
async fn reset_without_matching_file_still_refreshes_both_views() {
    let mut h = seeded(vec![WorkingFile::new("src/lib.rs", false)]);
    h.session.open_reset_menu();
    h.session.select_menu_item(0);
    h.settle().await;

    assert_eq!(
        h.executor.runs(),
        vec![
            GitIntent::StashSubmodule { path: "vendor/lib".into() },
            GitIntent::ResetSubmodule { path: "vendor/lib".into() },
        ]
    );
    assert_eq!(
        h.refresher.requests(),
        vec![RefreshRequest::background(
            RefreshScope::of(ViewKind::Submodules).with(ViewKind::Files)
        )]
    );
}

#[tokio::test]
async fn remove_asks_with_name_then_refreshes_both_views() {
    let mut h = seeded(vec![]);
    h.session.open_reset_menu();
    h.session.select_menu_item(1);

    let prompt = h.last_prompt();
    assert_eq!(prompt.title, "Remove submodule");
    match prompt.kind {
        PromptKind::Confirm { prompt } => assert!(prompt.contains("'lib'")),
        other => panic!("expected confirmation, got {other:?}"),
    }
    assert!(h.executor.runs().is_empty());

    h.session.submit_prompt("");
    assert_eq!(h.session.status_text(), "removing submodule");
    h.settle().await;

    assert_eq!(
        h.executor.runs(),
        vec![GitIntent::DeleteSubmodule {
            name: "lib".into(),
            path: "vendor/lib".into(),
        }]
    );
    assert_eq!(
        h.refresher.requests(),
        vec![RefreshRequest::sync(
            RefreshScope::of(ViewKind::Submodules).with(ViewKind::Files)
        )]
    );
}

#[tokio::test]
async fn failed_remove_is_surfaced_and_not_refreshed() {
    let mut h = seeded(vec![]);
    h.executor.fail_on(GitIntent::DeleteSubmodule {
        name: "lib".into(),
        path: "vendor/lib".into(),
    });
    h.session.open_reset_menu();
    h.session.select_menu_item(1);
    h.session.submit_prompt("");
    h.settle().await;

    assert_eq!(h.sink.surfaced(), vec!["fatal: exit status 128".to_string()]);
    assert!(h.refresher.requests().is_empty());
    assert_eq!(h.session.status_text(), "");
}

#[tokio::test]
async fn declining_remove_runs_nothing() {
    let mut h = seeded(vec![]);
    h.session.open_reset_menu();
    h.session.select_menu_item(1);
    h.session.cancel_prompt();

    assert!(!h.session.has_work_in_flight());
    assert!(h.executor.runs().is_empty());
    assert!(h.refresher.requests().is_empty());
}

#[tokio::test]
async fn bulk_menu_shows_commands_and_stops_on_failure() {
    let mut h = seeded(vec![]);
    h.executor.fail_on(GitIntent::BulkInit);
    h.session.open_bulk_menu();
    {
        let shown = h.shown.borrow();
        let menu = shown.menus.last().expect("menu shown");
        assert_eq!(menu.title, "bulk submodule options");
        assert_eq!(menu.items[0].labels, vec!["bulk init submodules", "git submodule init"]);
        assert_eq!(
            menu.items[3].labels,
            vec!["bulk deinit submodules", "git submodule deinit --all --force"]
        );
    }

    h.session.select_menu_item(0);
    assert_eq!(h.session.status_text(), "running command");
    h.settle().await;

    assert_eq!(h.executor.runs(), vec![GitIntent::BulkInit]);
    assert_eq!(h.sink.surfaced().len(), 1);
    assert!(h.refresher.requests().is_empty());
    assert_eq!(h.log.actions(), vec!["Bulk initialise submodules".to_string()]);
}

#[tokio::test]
async fn bulk_stash_and_reset_stops_at_first_failing_submodule() {
    let mut h = seeded(vec![]);
    h.executor.fail_on(GitIntent::StashSubmodule { path: "vendor/lib".into() });
    h.session.open_bulk_menu();
    assert_eq!(
        h.shown.borrow().menus[0].items[2].labels[1],
        "git stash in each submodule && git submodule update --force"
    );

    h.session.select_menu_item(2);
    h.settle().await;

    assert_eq!(h.executor.runs(), vec![GitIntent::StashSubmodule { path: "vendor/lib".into() }]);
    assert!(h.refresher.requests().is_empty());
}

#[tokio::test]
async fn failed_update_is_surfaced_and_still_refreshed() {
    let mut h = seeded(vec![]);
    h.executor.fail_on(GitIntent::UpdateSubmodule { path: "vendor/lib".into() });
    h.session.update_submodule();
    h.settle().await;

    assert_eq!(h.sink.surfaced(), vec!["fatal: exit status 128".to_string()]);
    assert_eq!(h.refresher.requests(), vec![submodules_sync()]);
}

#[tokio::test]
async fn sync_refresh_failure_is_surfaced() {
    let mut h = seeded(vec![]);
    h.refresher.fail_view(ViewKind::Submodules);
    h.session.init_submodule();
    h.settle().await;

    assert_eq!(
        h.sink.surfaced(),
        vec!["refresh failed: Submodules: index.lock exists".to_string()]
    );
    assert_eq!(h.session.status_text(), "");
}

#[tokio::test]
async fn selection_dependent_commands_are_no_ops_without_selection() {
    let mut h = Harness::new(UpdateConfig::default());
    h.session.init_submodule();
    h.session.update_submodule();
    h.session.edit_submodule_url();
    h.session.open_reset_menu();
    assert!(!h.session.enter_submodule().unwrap());

    assert!(!h.session.has_modal());
    assert!(!h.session.has_work_in_flight());
    assert_eq!(h.prompt_count(), 0);
    assert!(h.shown.borrow().menus.is_empty());
    assert!(h.entered.borrow().is_empty());
    assert!(h.sink.surfaced().is_empty());
}

#[tokio::test]
async fn enter_switches_into_selected_submodule() {
    let mut h = seeded(vec![]);
    assert!(h.session.select(1));
    assert!(h.session.enter_submodule().unwrap());
    assert_eq!(*h.entered.borrow(), vec!["docs".to_string()]);
    assert!(!h.session.select(7));
}

#[tokio::test]
async fn most_recent_action_status_is_shown() {
    let mut h = seeded(vec![]);
    h.session.init_submodule();
    assert_eq!(h.session.status_text(), "initializing submodule");
    h.session.select(1);
    h.session.update_submodule();
    assert_eq!(h.session.status_text(), "updating submodule");

    h.settle().await;
    assert_eq!(h.session.status_text(), "");
    let runs = h.executor.runs();
    assert!(runs.contains(&GitIntent::InitSubmodule { path: "vendor/lib".into() }));
    assert!(runs.contains(&GitIntent::UpdateSubmodule { path: "docs".into() }));
}

#[tokio::test]
async fn commands_are_ignored_while_a_prompt_is_open() {
    let mut h = seeded(vec![]);
    h.session.add_submodule();
    h.session.init_submodule();
    h.session.open_bulk_menu();

    assert_eq!(h.prompt_count(), 1);
    assert!(h.shown.borrow().menus.is_empty());
    assert!(!h.session.has_work_in_flight());
}

#[tokio::test]
async fn selection_follows_submodule_across_refresh() {
    let mut h = seeded(vec![]);
    h.session.select(1);
    h.seed(vec![docs_submodule()], vec![]);
    assert_eq!(h.session.selected_submodule().map(|s| s.name.as_str()), Some("docs"));

    h.seed(vec![], vec![]);
    assert!(h.session.selected_submodule().is_none());
}
