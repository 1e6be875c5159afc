//! Composable prompt chains.
//!
//! A chain is an ordered list of steps; a [`ChainDriver`] presents them one at a
//! time and threads every accepted answer into the steps after it. Cancelling at
//! any step is terminal: the driver never resumes and the answers are discarded.

use crate::traits::{PromptKind, PromptView};

type Suggest = Box<dyn Fn(&[String]) -> String>;
type Validate = Box<dyn Fn(&str) -> Result<(), String>>;

enum StepKind {
    Input,
    Confirm(String),
}

pub struct PromptStep {
    title: String,
    kind: StepKind,
    initial: Option<Suggest>,
    validator: Option<Validate>,
}

impl PromptStep {
    pub fn input(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: StepKind::Input,
            initial: None,
            validator: None,
        }
    }

    /// Yes/no step; it records an empty answer when accepted.
    pub fn confirm(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: StepKind::Confirm(prompt.into()),
            initial: None,
            validator: None,
        }
    }

    #[must_use]
    pub fn prefilled(self, content: impl Into<String>) -> Self {
        let content = content.into();
        self.suggest(move |_| content.clone())
    }

    /// Pre-fill computed from the answers given so far.
    #[must_use]
    pub fn suggest(mut self, f: impl Fn(&[String]) -> String + 'static) -> Self {
        self.initial = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn validate(mut self, f: impl Fn(&str) -> Result<(), String> + 'static) -> Self {
        self.validator = Some(Box::new(f));
        self
    }

    fn view(&self, answers: &[String], rejection: Option<String>) -> PromptView {
        let kind = match &self.kind {
            StepKind::Input => PromptKind::Input {
                initial: self.initial.as_ref().map(|f| f(answers)).unwrap_or_default(),
            },
            StepKind::Confirm(prompt) => PromptKind::Confirm {
                prompt: prompt.clone(),
            },
        };
        PromptView {
            title: self.title.clone(),
            kind,
            rejection,
        }
    }
}

#[derive(Default)]
pub struct PromptChain {
    steps: Vec<PromptStep>,
}

impl PromptChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, step: PromptStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainProgress {
    /// Present this step and wait for the user.
    Prompt(PromptView),
    /// Every step answered, in order.
    Complete(Vec<String>),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Running,
    Finished,
}

pub struct ChainDriver {
    steps: Vec<PromptStep>,
    answers: Vec<String>,
    state: DriverState,
}

impl ChainDriver {
    /// Starts the chain. An empty chain completes immediately.
    pub fn start(chain: PromptChain) -> (Self, ChainProgress) {
        let mut driver = Self {
            steps: chain.steps,
            answers: Vec::new(),
            state: DriverState::Running,
        };
        let progress = driver.advance();
        (driver, progress)
    }

    /// Accepts an answer for the current step. Once the chain has completed or been
    /// cancelled every further call returns [`ChainProgress::Cancelled`].
    pub fn submit(&mut self, input: &str) -> ChainProgress {
        if self.state == DriverState::Finished {
            return ChainProgress::Cancelled;
        }
        let Some(step) = self.steps.get(self.answers.len()) else {
            return ChainProgress::Cancelled;
        };
        let answer = match step.kind {
            StepKind::Input => input.to_string(),
            StepKind::Confirm(_) => String::new(),
        };
        if let Some(validator) = &step.validator {
            if let Err(reason) = validator(&answer) {
                return ChainProgress::Prompt(step.view(&self.answers, Some(reason)));
            }
        }
        self.answers.push(answer);
        self.advance()
    }

    pub fn cancel(&mut self) -> ChainProgress {
        self.state = DriverState::Finished;
        self.answers.clear();
        ChainProgress::Cancelled
    }

    /// Index of the step awaiting an answer.
    pub fn position(&self) -> usize {
        self.answers.len()
    }

    fn advance(&mut self) -> ChainProgress {
        match self.steps.get(self.answers.len()) {
            Some(step) => ChainProgress::Prompt(step.view(&self.answers, None)),
            None => {
                self.state = DriverState::Finished;
                ChainProgress::Complete(std::mem::take(&mut self.answers))
            }
        }
    }
}
