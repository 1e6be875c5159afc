#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// Free-text input, pre-filled with `initial`.
    Input { initial: String },
    /// Yes/no question.
    Confirm { prompt: String },
}

/// A single prompt as handed to the presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptView {
    pub title: String,
    pub kind: PromptKind,
    /// Set when the previous submission for this step was rejected.
    pub rejection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemView {
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuView {
    pub title: String,
    pub items: Vec<MenuItemView>,
}

/// Renders modals. Answers come back to the session as separate calls
/// (`submit_prompt`, `cancel_prompt`, `select_menu_item`); cancelling invokes nothing.
pub trait Presenter {
    fn show_prompt(&mut self, view: &PromptView);
    fn show_menu(&mut self, view: &MenuView);
    /// Close whatever prompt or menu is showing.
    fn close(&mut self);
    /// Dismissible error panel.
    fn error_panel(&mut self, message: &str);
}
