//! Screen layout helpers

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Areas shared by every screen
pub struct AppLayout {
    pub title_area: Rect,
    pub body_area: Rect,
    pub status_bar: Rect,
    pub hotkey_bar: Rect,
}

impl AppLayout {
    pub fn calculate(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            title_area: chunks[0],
            body_area: chunks[1],
            status_bar: chunks[2],
            hotkey_bar: chunks[3],
        }
    }
}

/// A `width` x `height` rectangle centered in `area`, clamped to fit.
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Split `area` into rows of the given heights, top to bottom.
pub fn stack(area: Rect, heights: &[u16]) -> Vec<Rect> {
    let mut constraints: Vec<Constraint> = heights.iter().map(|h| Constraint::Length(*h)).collect();
    constraints.push(Constraint::Min(0));
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_clamps() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered_rect_fixed(60, 6, area);
        assert_eq!(rect.width, 40);
        assert_eq!(rect.height, 6);
        assert_eq!(rect.y, 2);
    }

    #[test]
    fn test_stack_heights() {
        let rows = stack(Rect::new(0, 0, 20, 20), &[3, 3]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].y, 3);
        assert_eq!(rows[2].height, 14);
    }
}
