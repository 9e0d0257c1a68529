use std::sync::mpsc;

use console_core::{update, AppState, AppViewModel, Msg};
use console_engine::{ApiError, ConsoleConfig, EngineConfig};

use crate::effects::EffectRunner;

/// A complete headless console: reducer state, effect runner, and the
/// message channel UI adapters feed. The embedding shell forwards its input
/// events as [`Msg`]s and calls [`ConsoleSession::pump`] from its frame or
/// tick loop, re-rendering whenever a view model is returned.
pub struct ConsoleSession {
    state: AppState,
    runner: EffectRunner,
    msg_tx: mpsc::Sender<Msg>,
    msg_rx: mpsc::Receiver<Msg>,
}

impl ConsoleSession {
    pub fn new(config: EngineConfig) -> Result<Self, ApiError> {
        let (msg_tx, msg_rx) = mpsc::channel();
        let runner = EffectRunner::new(config, msg_tx.clone())?;
        Ok(Self {
            state: AppState::new(),
            runner,
            msg_tx,
            msg_rx,
        })
    }

    /// Sender for UI adapters; cloned freely.
    pub fn sender(&self) -> mpsc::Sender<Msg> {
        self.msg_tx.clone()
    }

    /// Apply one message immediately, running any resulting effects.
    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.run(effects);
    }

    /// Drain queued messages; returns a fresh view model if anything
    /// visible changed.
    pub fn pump(&mut self) -> Option<AppViewModel> {
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg);
        }
        if self.state.consume_dirty() {
            Some(self.state.view())
        } else {
            None
        }
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    /// The config document being edited, if one is loaded.
    pub fn config_draft(&self) -> Option<ConsoleConfig> {
        self.runner.config_draft()
    }

    /// Replace the edited config document; the form layer calls this before
    /// dispatching a save.
    pub fn set_config_draft(&self, document: ConsoleConfig) {
        self.runner.set_config_draft(document);
    }
}
