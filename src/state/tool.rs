/// Drawing tool state
///
/// Ephemeral and process-local. The defaults are usable as-is, so nothing
/// ever has to reset it.

/// Smallest allowed stroke width in pixels
pub const MIN_WIDTH: u32 = 1;

/// Largest allowed stroke width in pixels
pub const MAX_WIDTH: u32 = 20;

/// Which tool pointer strokes apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Black anti-aliased round-joined line
    #[default]
    Pen,
    /// Clears a square the size of the stroke width
    Eraser,
}

/// Active tool and stroke width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolState {
    pub tool: Tool,
    /// Always within [`MIN_WIDTH`, `MAX_WIDTH`]
    pub width: u32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            tool: Tool::Pen,
            width: 3,
        }
    }
}

impl ToolState {
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Set the stroke width, clamped to the allowed range
    pub fn set_width(&mut self, width: u32) {
        self.width = width.clamp(MIN_WIDTH, MAX_WIDTH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ToolState::default();
        assert_eq!(state.tool, Tool::Pen);
        assert_eq!(state.width, 3);
    }

    #[test]
    fn test_width_is_clamped() {
        let mut state = ToolState::default();

        state.set_width(0);
        assert_eq!(state.width, 1);

        state.set_width(25);
        assert_eq!(state.width, 20);

        state.set_width(7);
        assert_eq!(state.width, 7);
    }
}
