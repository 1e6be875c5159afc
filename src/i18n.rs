//! User-facing strings.
//!
//! Plain struct tables checked at compile time. Templates carry a single `{}`
//! placeholder that [`fill`] substitutes.

pub struct Translations {
    pub submodules: SubmoduleTexts,
    pub actions: ActionTexts,
    pub update: UpdateTexts,
}

/// Prompt titles, menu labels and status labels for submodule operations.
pub struct SubmoduleTexts {
    pub new_submodule_url: &'static str,
    pub new_submodule_name: &'static str,
    pub new_submodule_path: &'static str,
    pub url_required: &'static str,
    /// Template: submodule name.
    pub update_submodule_url: &'static str,
    pub adding_submodule_status: &'static str,
    pub updating_submodule_url_status: &'static str,
    pub initializing_submodule_status: &'static str,
    pub updating_submodule_status: &'static str,
    pub resetting_submodule_status: &'static str,
    pub removing_submodule_status: &'static str,
    pub running_command: &'static str,
    pub stash_and_reset: &'static str,
    pub remove_submodule: &'static str,
    pub remove_submodule_title: &'static str,
    /// Template: submodule name.
    pub remove_submodule_prompt: &'static str,
    pub bulk_submodule_options: &'static str,
    pub bulk_init: &'static str,
    pub bulk_update: &'static str,
    pub bulk_deinit: &'static str,
    /// Template: force bulk update command.
    pub bulk_stash_and_reset_command: &'static str,
}

/// Labels written to the command log.
pub struct ActionTexts {
    pub add_submodule: &'static str,
    pub update_submodule_url: &'static str,
    pub initialise_submodule: &'static str,
    pub update_submodule: &'static str,
    pub reset_submodule: &'static str,
    pub remove_submodule: &'static str,
    pub bulk_initialise_submodules: &'static str,
    pub bulk_update_submodules: &'static str,
    pub bulk_stash_and_reset_submodules: &'static str,
    pub bulk_deinitialise_submodules: &'static str,
}

pub struct UpdateTexts {
    pub new_version_title: &'static str,
    /// Template: version.
    pub download_prompt: &'static str,
    pub not_found: &'static str,
    pub updating_status: &'static str,
    /// Template: underlying error.
    pub update_failed: &'static str,
    pub quit_title: &'static str,
    pub quit_prompt: &'static str,
}

pub static EN_US: Translations = Translations {
    submodules: SubmoduleTexts {
        new_submodule_url: "New submodule URL:",
        new_submodule_name: "New submodule name:",
        new_submodule_path: "New submodule path:",
        url_required: "Submodule URL cannot be empty",
        update_submodule_url: "Update URL for submodule '{}'",
        adding_submodule_status: "adding submodule",
        updating_submodule_url_status: "updating URL",
        initializing_submodule_status: "initializing submodule",
        updating_submodule_status: "updating submodule",
        resetting_submodule_status: "resetting submodule",
        removing_submodule_status: "removing submodule",
        running_command: "running command",
        stash_and_reset: "stash uncommitted submodule changes and update",
        remove_submodule: "remove submodule",
        remove_submodule_title: "Remove submodule",
        remove_submodule_prompt: "Are you sure you want to remove submodule '{}' and its \
            corresponding directory? This is irreversible.",
        bulk_submodule_options: "bulk submodule options",
        bulk_init: "bulk init submodules",
        bulk_update: "bulk update submodules",
        bulk_deinit: "bulk deinit submodules",
        bulk_stash_and_reset_command: "git stash in each submodule && {}",
    },
    actions: ActionTexts {
        add_submodule: "Add submodule",
        update_submodule_url: "Update submodule URL",
        initialise_submodule: "Initialise submodule",
        update_submodule: "Update submodule",
        reset_submodule: "Reset submodule",
        remove_submodule: "Remove submodule",
        bulk_initialise_submodules: "Bulk initialise submodules",
        bulk_update_submodules: "Bulk update submodules",
        bulk_stash_and_reset_submodules: "Bulk stash and reset submodules",
        bulk_deinitialise_submodules: "Bulk deinitialise submodules",
    },
    update: UpdateTexts {
        new_version_title: "New version available!",
        download_prompt: "Download version {}? (enter/esc)",
        not_found: "New version not found",
        updating_status: "updating",
        update_failed: "Update failed: {}",
        quit_title: "Currently Updating",
        quit_prompt: "An update is in progress. Are you sure you want to quit?",
    },
};

pub fn t() -> &'static Translations {
    &EN_US
}

/// Substitutes the first `{}` in `template` with `value`.
pub fn fill(template: &str, value: &str) -> String {
    template.replacen("{}", value, 1)
}
