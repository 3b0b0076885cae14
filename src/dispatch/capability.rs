//! Capability descriptors
//!
//! Every handler a target can implement is named by one [`Capability`]. Selection is
//! a total function over (scope, button, channel, edge): Daydream identities are
//! folded onto the shared ones so the same handler serves every device.
//!
//! ```text
//! Click     -> Touchpad (same channel)
//! Touch     -> Touchpad (same channel)
//! AppButton -> Menu     (same channel)
//! ```

use crate::input::{ButtonChannel, ButtonEdge, LogicalButton};
use std::fmt;

/// Pointer handlers run on the raycast target, global handlers on registered receivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Pointer,
    Global,
}

impl Scope {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pointer => "Pointer",
            Self::Global => "Global",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HoverPhase {
    Enter,
    Stay,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Button {
        scope: Scope,
        button: LogicalButton,
        channel: ButtonChannel,
        edge: ButtonEdge,
    },
    Click {
        scope: Scope,
        button: LogicalButton,
    },
    Hover(HoverPhase),
}

/// Folds device-specific identities onto the shared handler set
pub fn canonical(button: LogicalButton) -> LogicalButton {
    match button {
        LogicalButton::Click | LogicalButton::Touch => LogicalButton::Touchpad,
        LogicalButton::AppButton => LogicalButton::Menu,
        other => other,
    }
}

impl Capability {
    pub fn for_button(
        scope: Scope,
        button: LogicalButton,
        channel: ButtonChannel,
        edge: ButtonEdge,
    ) -> Self {
        Self::Button {
            scope,
            button: canonical(button),
            channel,
            edge,
        }
    }

    pub fn for_click(scope: Scope, button: LogicalButton) -> Self {
        Self::Click {
            scope,
            button: canonical(button),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Self::Button { scope, .. } | Self::Click { scope, .. } => *scope,
            Self::Hover(_) => Scope::Pointer,
        }
    }

    /// Conventional handler name, e.g. `OnPointerTriggerPressDown`
    pub fn handler_name(&self) -> String {
        match self {
            Self::Button {
                scope,
                button,
                channel,
                edge,
            } => {
                // Directions only exist on the press channel and drop the channel word
                let channel = if button.is_direction() {
                    ""
                } else {
                    channel.as_str()
                };
                format!(
                    "On{}{}{}{}",
                    scope.as_str(),
                    button.as_str(),
                    channel,
                    edge.handler_suffix()
                )
            }
            Self::Click { scope, button } => format!("On{}{}Click", scope.as_str(), button),
            Self::Hover(phase) => format!("OnPointer{:?}", phase),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.handler_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_names() {
        let cases = [
            (
                Capability::for_button(
                    Scope::Pointer,
                    LogicalButton::Trigger,
                    ButtonChannel::Press,
                    ButtonEdge::Down,
                ),
                "OnPointerTriggerPressDown",
            ),
            (
                Capability::for_button(
                    Scope::Global,
                    LogicalButton::Grip,
                    ButtonChannel::Touch,
                    ButtonEdge::Held,
                ),
                "OnGlobalGripTouch",
            ),
            (
                Capability::for_button(
                    Scope::Global,
                    LogicalButton::Forward,
                    ButtonChannel::Press,
                    ButtonEdge::Up,
                ),
                "OnGlobalForwardUp",
            ),
            (
                Capability::for_click(Scope::Pointer, LogicalButton::Grip),
                "OnPointerGripClick",
            ),
            (Capability::Hover(HoverPhase::Enter), "OnPointerEnter"),
        ];
        for (cap, name) in cases {
            assert_eq!(cap.handler_name(), name);
        }
    }

    #[test]
    fn daydream_identities_share_handlers() {
        let click = Capability::for_button(
            Scope::Pointer,
            LogicalButton::Click,
            ButtonChannel::Press,
            ButtonEdge::Down,
        );
        let touchpad = Capability::for_button(
            Scope::Pointer,
            LogicalButton::Touchpad,
            ButtonChannel::Press,
            ButtonEdge::Down,
        );
        assert_eq!(click, touchpad);

        let app = Capability::for_button(
            Scope::Global,
            LogicalButton::AppButton,
            ButtonChannel::Press,
            ButtonEdge::Up,
        );
        assert_eq!(app.handler_name(), "OnGlobalMenuPressUp");
    }

    #[test]
    fn table_is_total_and_distinct_per_scope() {
        use std::collections::HashSet;
        let mut names = HashSet::new();
        for scope in [Scope::Pointer, Scope::Global] {
            for button in LogicalButton::ALL {
                for channel in ButtonChannel::ALL {
                    for edge in [ButtonEdge::Down, ButtonEdge::Held, ButtonEdge::Up] {
                        let cap = Capability::for_button(scope, button, channel, edge);
                        assert_eq!(cap.scope(), scope);
                        names.insert(cap.handler_name());
                    }
                }
            }
        }
        // 13 canonical buttons, directions collapse their channel names
        assert_eq!(names.len(), 2 * (9 * 2 * 3 + 4 * 3));
    }
}
