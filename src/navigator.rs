//! Idempotent procedures for reaching and leaving the known screens

use crate::config::Settings;
use crate::error::{HaggleError, Result};
use crate::types::{Key, MouseButton, Window};
use crate::ui::{InputDriver, ModifierGuard, UiState};
use crate::wait::{await_condition, settle};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// How a ground marker is activated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OpenGesture {
    Click,
    ModifierClick,
}

#[derive(Clone)]
pub struct WindowNavigator {
    ui: Arc<dyn UiState>,
    input: Arc<dyn InputDriver>,
    settings: Arc<Settings>,
}

impl WindowNavigator {
    pub fn new(ui: Arc<dyn UiState>, input: Arc<dyn InputDriver>, settings: Arc<Settings>) -> Self {
        Self {
            ui,
            input,
            settings,
        }
    }

    /// Dismiss every open overlay, nested dialogs before their parents
    #[instrument(level = "debug", skip(self))]
    pub async fn close_all_overlays(&self) {
        for window in Window::CLOSE_ORDER {
            if self.ui.is_visible(window) {
                self.dismiss(window).await;
            }
        }
    }

    /// Open the negotiation window, or confirm it is already open.
    ///
    /// Each matching label is tried in turn; the first one that opens the
    /// window wins. An invisible match fails immediately.
    #[instrument(level = "debug", skip(self))]
    pub async fn navigate_to_negotiation_target(&self) -> Result<()> {
        if self.ui.is_visible(Window::NegotiationWindow) {
            if self.ui.is_visible(Window::NegotiationSubDialog) {
                self.dismiss(Window::NegotiationSubDialog).await;
            }
            debug!("Negotiation window already open");
            return Ok(());
        }

        self.close_all_overlays().await;
        self.open_marker(
            &self.settings.negotiation_marker,
            Window::NegotiationWindow,
            OpenGesture::ModifierClick,
        )
        .await
    }

    /// Open the storage window, or confirm it is already open
    #[instrument(level = "debug", skip(self))]
    pub async fn navigate_to_storage_target(&self) -> Result<()> {
        if self.ui.is_visible(Window::StorageWindow) {
            debug!("Storage window already open");
            return Ok(());
        }

        self.open_marker(
            &self.settings.storage_marker,
            Window::StorageWindow,
            OpenGesture::Click,
        )
        .await
    }

    async fn dismiss(&self, window: Window) {
        self.input.key_press(Key::Escape);
        settle(self.settings.settle_delay()).await;
        debug!("Dismissed {}", window);
    }

    async fn open_marker(&self, marker: &str, target: Window, gesture: OpenGesture) -> Result<()> {
        let labels: Vec<_> = self
            .ui
            .ground_labels()
            .into_iter()
            .filter(|label| label.path.contains(marker))
            .collect();

        if labels.is_empty() {
            error!("No ground label matching {} for the {}", marker, target);
            return Err(HaggleError::Navigation(format!(
                "no ground label matching {}",
                marker
            )));
        }

        for label in labels {
            if !label.visible {
                error!("Ground label {} is not visible", label.path);
                return Err(HaggleError::Navigation(format!(
                    "label {} not visible",
                    label.path
                )));
            }

            self.input.move_pointer(label.rect.center());
            settle(self.settings.hover_delay()).await;
            match gesture {
                OpenGesture::Click => self.input.click(MouseButton::Left),
                OpenGesture::ModifierClick => {
                    let _held = ModifierGuard::hold(self.input.clone(), Key::Control);
                    settle(self.settings.hover_delay()).await;
                    self.input.click(MouseButton::Left);
                }
            }

            let ui = self.ui.clone();
            let opened = await_condition(
                || ui.is_visible(target),
                self.settings.poll_interval(),
                self.settings.navigation_timeout(),
                &format!("{} not reached in time", target),
            )
            .await;
            if opened {
                debug!("Reached the {}", target);
                return Ok(());
            }
        }

        Err(HaggleError::Navigation(format!(
            "{} did not open after clicking {}",
            target, marker
        )))
    }
}
