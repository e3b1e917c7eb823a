//! Window properties and the engine-facing event type.
//!
//! Native `winit` events are translated into [`Event`]s by [`translate`] before
//! they reach the registered callback, so application code never matches on
//! winit types directly.

use serde::{Deserialize, Serialize};
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowProps {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowProps {
    fn default() -> Self {
        Self {
            title: "GameWorld".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    WindowClose,
    WindowResize { width: u32, height: u32 },
    WindowFocus(bool),
    KeyPressed { key: KeyCode, repeat: bool },
    KeyReleased { key: KeyCode },
    MouseButtonPressed(MouseButton),
    MouseButtonReleased(MouseButton),
    MouseMoved { x: f64, y: f64 },
    /// Scroll amount in lines; pixel deltas are converted with
    /// [`PIXELS_PER_LINE`].
    MouseScrolled { x: f32, y: f32 },
}

/// Pixel scroll deltas (touchpads) are reported in lines of this height.
pub const PIXELS_PER_LINE: f64 = 20.0;

/// Translates a native window event. Events the engine has no counterpart for
/// yield `None`.
pub fn translate(event: &WindowEvent) -> Option<Event> {
    match event {
        WindowEvent::CloseRequested => Some(Event::WindowClose),
        WindowEvent::Resized(size) => Some(Event::WindowResize {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::Focused(focused) => Some(Event::WindowFocus(*focused)),
        WindowEvent::KeyboardInput { event, .. } => {
            let PhysicalKey::Code(key) = event.physical_key else {
                return None;
            };
            Some(match event.state {
                ElementState::Pressed => Event::KeyPressed {
                    key,
                    repeat: event.repeat,
                },
                ElementState::Released => Event::KeyReleased { key },
            })
        }
        WindowEvent::MouseInput { state, button, .. } => Some(match state {
            ElementState::Pressed => Event::MouseButtonPressed(*button),
            ElementState::Released => Event::MouseButtonReleased(*button),
        }),
        WindowEvent::CursorMoved { position, .. } => Some(Event::MouseMoved {
            x: position.x,
            y: position.y,
        }),
        WindowEvent::MouseWheel { delta, .. } => Some(match delta {
            MouseScrollDelta::LineDelta(x, y) => Event::MouseScrolled { x: *x, y: *y },
            MouseScrollDelta::PixelDelta(pos) => Event::MouseScrolled {
                x: (pos.x / PIXELS_PER_LINE) as f32,
                y: (pos.y / PIXELS_PER_LINE) as f32,
            },
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use winit::{
        dpi::{PhysicalPosition, PhysicalSize},
        event::{DeviceId, TouchPhase},
    };

    use super::*;

    fn device() -> DeviceId {
        // SAFETY: only used as an opaque value in synthetic events.
        unsafe { DeviceId::dummy() }
    }

    #[test]
    fn translates_window_events() {
        assert_eq!(translate(&WindowEvent::CloseRequested), Some(Event::WindowClose));
        assert_eq!(
            translate(&WindowEvent::Resized(PhysicalSize::new(640, 480))),
            Some(Event::WindowResize {
                width: 640,
                height: 480
            })
        );
        assert_eq!(
            translate(&WindowEvent::Focused(false)),
            Some(Event::WindowFocus(false))
        );
    }

    #[test]
    fn translates_mouse_events() {
        let moved = WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(12.5, 40.0),
        };
        assert_eq!(translate(&moved), Some(Event::MouseMoved { x: 12.5, y: 40.0 }));

        let pressed = WindowEvent::MouseInput {
            device_id: device(),
            state: ElementState::Pressed,
            button: MouseButton::Right,
        };
        assert_eq!(
            translate(&pressed),
            Some(Event::MouseButtonPressed(MouseButton::Right))
        );
    }

    #[test]
    fn pixel_scrolling_is_reported_in_lines() {
        let wheel = WindowEvent::MouseWheel {
            device_id: device(),
            delta: MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -40.0)),
            phase: TouchPhase::Moved,
        };
        assert_eq!(translate(&wheel), Some(Event::MouseScrolled { x: 0.0, y: -2.0 }));
    }

    #[test]
    fn ignores_events_without_a_counterpart() {
        assert_eq!(translate(&WindowEvent::RedrawRequested), None);
        assert_eq!(translate(&WindowEvent::Destroyed), None);
    }
}
