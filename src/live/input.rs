use crossterm::event::{KeyCode, KeyModifiers};

/// Performance actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveAction {
    Previous,
    Next,
    ToggleAutoScroll,
    ResetScroll,
}

impl LiveAction {
    /// Whether the key's default terminal behaviour should be swallowed.
    /// Space would otherwise page the view.
    pub fn suppresses_default(self) -> bool {
        matches!(self, LiveAction::ToggleAutoScroll)
    }
}

/// Maps raw keys to [`LiveAction`]s while the live view is mounted. Once
/// unmounted it routes nothing, so stray key events after leaving the view
/// have no effect.
#[derive(Debug, Default)]
pub struct InputRouter {
    mounted: bool,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self) {
        self.mounted = true;
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn route(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<LiveAction> {
        if !self.mounted || modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return None;
        }
        match code {
            KeyCode::Left => Some(LiveAction::Previous),
            KeyCode::Right => Some(LiveAction::Next),
            KeyCode::Char(' ') => Some(LiveAction::ToggleAutoScroll),
            KeyCode::Char('r') => Some(LiveAction::ResetScroll),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounted() -> InputRouter {
        let mut router = InputRouter::new();
        router.mount();
        router
    }

    #[test]
    fn maps_performance_keys() {
        let router = mounted();
        let none = KeyModifiers::NONE;
        assert_eq!(router.route(KeyCode::Left, none), Some(LiveAction::Previous));
        assert_eq!(router.route(KeyCode::Right, none), Some(LiveAction::Next));
        assert_eq!(
            router.route(KeyCode::Char(' '), none),
            Some(LiveAction::ToggleAutoScroll)
        );
        assert_eq!(
            router.route(KeyCode::Char('r'), none),
            Some(LiveAction::ResetScroll)
        );
        assert_eq!(router.route(KeyCode::Char('x'), none), None);
        assert_eq!(router.route(KeyCode::Up, none), None);
    }

    #[test]
    fn only_space_suppresses_default() {
        assert!(LiveAction::ToggleAutoScroll.suppresses_default());
        assert!(!LiveAction::Previous.suppresses_default());
        assert!(!LiveAction::Next.suppresses_default());
        assert!(!LiveAction::ResetScroll.suppresses_default());
    }

    #[test]
    fn unmounted_router_ignores_everything() {
        let mut router = mounted();
        router.unmount();
        assert_eq!(router.route(KeyCode::Right, KeyModifiers::NONE), None);
        assert_eq!(router.route(KeyCode::Char(' '), KeyModifiers::NONE), None);
    }

    #[test]
    fn chorded_keys_are_not_routed() {
        let router = mounted();
        assert_eq!(router.route(KeyCode::Char('r'), KeyModifiers::CONTROL), None);
        assert_eq!(router.route(KeyCode::Right, KeyModifiers::ALT), None);
        assert_eq!(
            router.route(KeyCode::Right, KeyModifiers::SHIFT),
            Some(LiveAction::Next)
        );
    }
}
