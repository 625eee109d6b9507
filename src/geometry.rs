use crate::config::Position;
use crate::display::Orientation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub origin: Position,
    pub size: Size,
}

/// Window size that fits the longest countdown text for the layout.
pub fn window_size(orientation: Orientation, show_seconds: bool, font_size: f32) -> Size {
    let fields = if show_seconds { 3.0 } else { 2.0 };
    match orientation {
        Orientation::Horizontal => {
            // widest text is "H:MM:SS" or "H:MM"
            let chars = fields * 2.0 + (fields - 1.0);
            Size {
                width: (font_size * 0.65 * chars + 16.0).round(),
                height: (font_size * 1.6 + 12.0).round(),
            }
        }
        Orientation::Vertical => Size {
            width: (font_size * 1.4 + 16.0).round(),
            height: (font_size * 1.4 * fields + 12.0).round(),
        },
    }
}

/// Keeps the whole window on screen.
pub fn clamp_to_screen(position: Position, size: Size, screen: Screen) -> Position {
    let max_x = screen.origin.x + (screen.size.width - size.width).max(0.0);
    let max_y = screen.origin.y + (screen.size.height - size.height).max(0.0);
    Position {
        x: position.x.clamp(screen.origin.x, max_x),
        y: position.y.clamp(screen.origin.y, max_y),
    }
}

/// Pulls the window flush against an edge it is within `snap_distance` of.
pub fn snap_to_edges(position: Position, size: Size, screen: Screen, snap_distance: f32) -> Position {
    let snap = |value: f32, low: f32, high: f32, extent: f32| {
        if (value - low).abs() < snap_distance {
            low
        } else if (value + extent - high).abs() < snap_distance {
            high - extent
        } else {
            value
        }
    };

    let right = screen.origin.x + screen.size.width;
    let bottom = screen.origin.y + screen.size.height;
    Position {
        x: snap(position.x, screen.origin.x, right, size.width),
        y: snap(position.y, screen.origin.y, bottom, size.height),
    }
}

pub fn place_window(position: Position, size: Size, screen: Screen, snap_distance: f32) -> Position {
    snap_to_edges(clamp_to_screen(position, size, screen), size, screen, snap_distance)
}
