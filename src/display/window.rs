use anyhow::{anyhow, Result};
use image::RgbImage;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use super::{Display, InputEvent, ESCAPE};

/// Desktop window backed by minifb.
///
/// The window is created lazily on the first frame so it matches the capture size.
/// Clicks are detected on the press edge of the left mouse button.
pub struct WindowDisplay {
    window: Option<Window>,
    buffer: Vec<u32>,
    size: (usize, usize),
    mouse_down_prev: bool,
    closed_reported: bool,
}

impl WindowDisplay {
    pub fn new() -> Self {
        Self {
            window: None,
            buffer: Vec::new(),
            size: (0, 0),
            mouse_down_prev: false,
            closed_reported: false,
        }
    }

    fn ensure_window(&mut self, name: &str, width: usize, height: usize) -> Result<&mut Window> {
        if self.window.is_none() || self.size != (width, height) {
            let window = Window::new(name, width, height, WindowOptions::default())
                .map_err(|e| anyhow!("failed to open window '{}': {}", name, e))?;
            log::info!("WindowDisplay: opened '{}' ({}x{})", name, width, height);
            self.window = Some(window);
            self.size = (width, height);
        }
        self.window
            .as_mut()
            .ok_or_else(|| anyhow!("window unavailable"))
    }
}

impl Default for WindowDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// Keys the window reports, lowercased. Anything a configured quit key can be is covered.
fn key_char(key: Key) -> Option<char> {
    let ch = match key {
        Key::A => 'a',
        Key::B => 'b',
        Key::C => 'c',
        Key::D => 'd',
        Key::E => 'e',
        Key::F => 'f',
        Key::G => 'g',
        Key::H => 'h',
        Key::I => 'i',
        Key::J => 'j',
        Key::K => 'k',
        Key::L => 'l',
        Key::M => 'm',
        Key::N => 'n',
        Key::O => 'o',
        Key::P => 'p',
        Key::Q => 'q',
        Key::R => 'r',
        Key::S => 's',
        Key::T => 't',
        Key::U => 'u',
        Key::V => 'v',
        Key::W => 'w',
        Key::X => 'x',
        Key::Y => 'y',
        Key::Z => 'z',
        Key::Key0 | Key::NumPad0 => '0',
        Key::Key1 | Key::NumPad1 => '1',
        Key::Key2 | Key::NumPad2 => '2',
        Key::Key3 | Key::NumPad3 => '3',
        Key::Key4 | Key::NumPad4 => '4',
        Key::Key5 | Key::NumPad5 => '5',
        Key::Key6 | Key::NumPad6 => '6',
        Key::Key7 | Key::NumPad7 => '7',
        Key::Key8 | Key::NumPad8 => '8',
        Key::Key9 | Key::NumPad9 => '9',
        Key::Escape => ESCAPE,
        Key::Space => ' ',
        _ => return None,
    };
    Some(ch)
}

impl Display for WindowDisplay {
    fn show(&mut self, name: &str, frame: &RgbImage) -> Result<()> {
        let (width, height) = (frame.width() as usize, frame.height() as usize);
        self.buffer.clear();
        self.buffer.extend(
            frame
                .pixels()
                .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32),
        );
        let buffer = std::mem::take(&mut self.buffer);
        let window = self.ensure_window(name, width, height)?;
        let result = window
            .update_with_buffer(&buffer, width, height)
            .map_err(|e| anyhow!("failed to present frame: {}", e));
        self.buffer = buffer;
        result
    }

    fn refresh(&mut self) {
        // minifb only samples mouse and keys inside `update*`.
        if let Some(window) = self.window.as_mut() {
            window.update();
        }
    }

    fn poll_input(&mut self) -> Vec<InputEvent> {
        let Some(window) = self.window.as_ref() else {
            return Vec::new();
        };
        let mut events = Vec::new();
        if !window.is_open() {
            if !self.closed_reported {
                self.closed_reported = true;
                events.push(InputEvent::Closed);
            }
            return events;
        }

        let mouse_down = window.get_mouse_down(MouseButton::Left);
        if mouse_down && !self.mouse_down_prev {
            if let Some((x, y)) = window.get_mouse_pos(MouseMode::Discard) {
                events.push(InputEvent::Click {
                    x: x as i32,
                    y: y as i32,
                });
            }
        }
        self.mouse_down_prev = mouse_down;

        events.extend(
            window
                .get_keys_pressed(KeyRepeat::No)
                .into_iter()
                .filter_map(key_char)
                .map(InputEvent::Key),
        );
        events
    }

    fn release(&mut self) {
        if self.window.take().is_some() {
            log::info!("WindowDisplay: closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_accepted_quit_key_is_reported() {
        let keys = [Key::Q, Key::X, Key::Z, Key::Key0, Key::NumPad7, Key::Escape, Key::Space];
        let chars: Vec<char> = keys.into_iter().filter_map(key_char).collect();
        assert_eq!(chars, vec!['q', 'x', 'z', '0', '7', ESCAPE, ' ']);
        for ch in chars {
            assert!(crate::display::is_reportable_key(ch));
        }
        assert_eq!(key_char(Key::F1), None);
    }
}
