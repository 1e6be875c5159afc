//! Submodule operations built on the action pipeline.
//!
//! Every method here only describes an operation, as an [`Action`] or a [`Menu`] of
//! actions. Running it is the coordinator's job.

use super::coordinator::{Action, Menu, MenuItem};
use super::prompt::{PromptChain, PromptStep};
use crate::i18n::{fill, ActionTexts, SubmoduleTexts, Translations};
use crate::model::{RefreshRequest, RefreshScope, Submodule, ViewKind, WorkingFile};
use crate::traits::{CommandExecutor, FileIndex, GitIntent, SubmoduleNavigator};
use std::sync::Arc;

/// Name suggested for a submodule cloned from `url`: the last path segment with
/// its extension stripped.
pub fn suggest_name(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    match last.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => last.to_string(),
    }
}

/// First file in the index that is the gitlink of `submodule`.
pub fn file_for_submodule<'a>(
    files: &'a dyn FileIndex,
    submodule: &Submodule,
) -> Option<&'a WorkingFile> {
    files
        .all_files()
        .iter()
        .find(|f| f.is_submodule(std::slice::from_ref(submodule)))
}

fn submodules_sync() -> RefreshRequest {
    RefreshRequest::sync(RefreshScope::of(ViewKind::Submodules))
}

pub struct SubmoduleLifecycleController {
    texts: &'static SubmoduleTexts,
    actions: &'static ActionTexts,
    executor: Arc<dyn CommandExecutor>,
}

impl SubmoduleLifecycleController {
    pub fn new(translations: &'static Translations, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            texts: &translations.submodules,
            actions: &translations.actions,
            executor,
        }
    }

    /// Switches into the selected submodule. Returns `false` when nothing is selected.
    pub fn enter(
        &self,
        selected: Option<&Submodule>,
        navigator: &mut dyn SubmoduleNavigator,
    ) -> anyhow::Result<bool> {
        let Some(submodule) = selected else {
            return Ok(false);
        };
        navigator.enter_submodule(submodule)?;
        Ok(true)
    }

    /// URL, then name (suggested from the URL), then path (suggested from the name).
    pub fn add(&self) -> Action {
        let url_required = self.texts.url_required;
        let chain = PromptChain::new()
            .then(
                PromptStep::input(self.texts.new_submodule_url).validate(move |url| {
                    if url.trim().is_empty() {
                        Err(url_required.to_string())
                    } else {
                        Ok(())
                    }
                }),
            )
            .then(
                PromptStep::input(self.texts.new_submodule_name).suggest(|answers| {
                    answers.first().map(|u| suggest_name(u)).unwrap_or_default()
                }),
            )
            .then(
                PromptStep::input(self.texts.new_submodule_path)
                    .suggest(|answers| answers.get(1).cloned().unwrap_or_default()),
            );

        Action::from_answers(
            self.actions.add_submodule,
            self.texts.adding_submodule_status,
            |answers| match answers {
                [url, name, path] => Some(vec![GitIntent::AddSubmodule {
                    name: name.clone(),
                    path: path.clone(),
                    url: url.clone(),
                }]),
                _ => None,
            },
        )
        .prompts(chain)
        .refresh(submodules_sync())
    }

    pub fn edit_url(&self, selected: Option<&Submodule>) -> Option<Action> {
        let submodule = selected?.clone();
        let chain = PromptChain::new().then(
            PromptStep::input(fill(self.texts.update_submodule_url, &submodule.name))
                .prefilled(submodule.url.clone()),
        );
        let action = Action::from_answers(
            self.actions.update_submodule_url,
            self.texts.updating_submodule_url_status,
            move |answers| match answers {
                [url] => Some(vec![GitIntent::UpdateSubmoduleUrl {
                    name: submodule.name,
                    path: submodule.path,
                    url: url.clone(),
                }]),
                _ => None,
            },
        )
        .prompts(chain)
        .refresh(submodules_sync());
        Some(action)
    }

    pub fn init(&self, selected: Option<&Submodule>) -> Option<Action> {
        let path = selected?.path.clone();
        let action = Action::new(
            self.actions.initialise_submodule,
            self.texts.initializing_submodule_status,
            vec![GitIntent::InitSubmodule { path }],
        )
        .refresh(submodules_sync());
        Some(action)
    }

    pub fn update(&self, selected: Option<&Submodule>) -> Option<Action> {
        let path = selected?.path.clone();
        let action = Action::new(
            self.actions.update_submodule,
            self.texts.updating_submodule_status,
            vec![GitIntent::UpdateSubmodule { path }],
        )
        .refresh(submodules_sync());
        Some(action)
    }

    /// Unstages the submodule's gitlink if the index has one, then stashes and
    /// resets. The views are refreshed in the background.
    pub fn reset(&self, submodule: &Submodule, files: &dyn FileIndex) -> Action {
        let mut steps: Vec<GitIntent> = file_for_submodule(files, submodule)
            .map(|f| GitIntent::UnstageFile {
                names: f.names(),
                tracked: f.tracked,
            })
            .into_iter()
            .collect();
        steps.push(GitIntent::StashSubmodule {
            path: submodule.path.clone(),
        });
        steps.push(GitIntent::ResetSubmodule {
            path: submodule.path.clone(),
        });
        let scope = RefreshScope::of(ViewKind::Files).with(ViewKind::Submodules);

        Action::new(
            self.actions.reset_submodule,
            self.texts.resetting_submodule_status,
            steps,
        )
        .abort_on_failure()
        .refresh(RefreshRequest::background(scope))
    }

    /// Asks for confirmation, then deletes the submodule and its directory.
    pub fn remove(&self, submodule: &Submodule) -> Action {
        let chain = PromptChain::new().then(PromptStep::confirm(
            self.texts.remove_submodule_title,
            fill(self.texts.remove_submodule_prompt, &submodule.name),
        ));
        let scope = RefreshScope::of(ViewKind::Submodules).with(ViewKind::Files);

        Action::new(
            self.actions.remove_submodule,
            self.texts.removing_submodule_status,
            vec![GitIntent::DeleteSubmodule {
                name: submodule.name.clone(),
                path: submodule.path.clone(),
            }],
        )
        .prompts(chain)
        .abort_on_failure()
        .refresh(RefreshRequest::sync(scope))
    }

    /// Reset and remove options for the selected submodule.
    pub fn reset_menu(&self, selected: Option<&Submodule>, files: &dyn FileIndex) -> Option<Menu> {
        let submodule = selected?;
        Some(Menu {
            title: submodule.name.clone(),
            items: vec![
                MenuItem::new(
                    vec![self.texts.stash_and_reset.to_string()],
                    self.reset(submodule, files),
                ),
                MenuItem::new(
                    vec![self.texts.remove_submodule.to_string()],
                    self.remove(submodule),
                ),
            ],
        })
    }

    /// Bulk commands over every submodule. Each item shows the command it runs.
    pub fn bulk_menu(&self, submodules: &[Submodule]) -> Menu {
        let mut steps: Vec<GitIntent> = submodules
            .iter()
            .map(|s| GitIntent::StashSubmodule {
                path: s.path.clone(),
            })
            .collect();
        steps.push(GitIntent::ForceBulkUpdate);
        let stash_and_reset = Action::new(
            self.actions.bulk_stash_and_reset_submodules,
            self.texts.running_command,
            steps,
        )
        .abort_on_failure()
        .refresh(submodules_sync());

        Menu {
            title: self.texts.bulk_submodule_options.to_string(),
            items: vec![
                self.bulk_item(
                    self.texts.bulk_init,
                    self.actions.bulk_initialise_submodules,
                    GitIntent::BulkInit,
                ),
                self.bulk_item(
                    self.texts.bulk_update,
                    self.actions.bulk_update_submodules,
                    GitIntent::BulkUpdate,
                ),
                MenuItem::new(
                    vec![
                        self.texts.stash_and_reset.to_string(),
                        fill(
                            self.texts.bulk_stash_and_reset_command,
                            &self.executor.command_string(&GitIntent::ForceBulkUpdate),
                        ),
                    ],
                    stash_and_reset,
                ),
                self.bulk_item(
                    self.texts.bulk_deinit,
                    self.actions.bulk_deinitialise_submodules,
                    GitIntent::BulkDeinit,
                ),
            ],
        }
    }

    fn bulk_item(&self, label: &str, log_label: &str, intent: GitIntent) -> MenuItem {
        let labels = vec![label.to_string(), self.executor.command_string(&intent)];
        let action = Action::new(log_label, self.texts.running_command, vec![intent])
            .abort_on_failure()
            .refresh(submodules_sync());
        MenuItem::new(labels, action)
    }
}
