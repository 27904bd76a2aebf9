use winit::event::{DeviceEvent, ElementState, MouseButton, WindowEvent};

/// Pointer input the dispatcher cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down,
    Move,
    Up,
}

impl PointerEvent {
    /// Left button presses/releases and cursor motion; anything else is `None`.
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::MouseInput { state, button, .. } => Self::from_mouse_input(*state, *button),
            WindowEvent::CursorMoved { .. } => Some(PointerEvent::Move),
            _ => None,
        }
    }

    /// Left button only.
    pub fn from_mouse_input(state: ElementState, button: MouseButton) -> Option<Self> {
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => Some(PointerEvent::Down),
            (MouseButton::Left, ElementState::Released) => Some(PointerEvent::Up),
            _ => None,
        }
    }

    /// Raw mouse motion, as delivered while the cursor is grabbed.
    pub fn from_device_event(event: &DeviceEvent) -> Option<Self> {
        match event {
            DeviceEvent::MouseMotion { .. } => Some(PointerEvent::Move),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_button_maps_to_down_and_up() {
        assert_eq!(
            PointerEvent::from_mouse_input(ElementState::Pressed, MouseButton::Left),
            Some(PointerEvent::Down)
        );
        assert_eq!(
            PointerEvent::from_mouse_input(ElementState::Released, MouseButton::Left),
            Some(PointerEvent::Up)
        );
        assert_eq!(
            PointerEvent::from_mouse_input(ElementState::Pressed, MouseButton::Right),
            None
        );
        assert_eq!(
            PointerEvent::from_mouse_input(ElementState::Released, MouseButton::Middle),
            None
        );
    }

    #[test]
    fn unrelated_window_events_are_ignored() {
        assert_eq!(PointerEvent::from_window_event(&WindowEvent::Focused(true)), None);
        assert_eq!(PointerEvent::from_window_event(&WindowEvent::CloseRequested), None);
    }

    #[test]
    fn mouse_motion_is_a_move() {
        let event = DeviceEvent::MouseMotion { delta: (1.0, 0.0) };
        assert_eq!(PointerEvent::from_device_event(&event), Some(PointerEvent::Move));
        let added = DeviceEvent::Added;
        assert_eq!(PointerEvent::from_device_event(&added), None);
    }
}
