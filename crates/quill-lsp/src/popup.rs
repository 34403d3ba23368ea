//! Popup placement geometry.
//!
//! Pure math over editor-local pixel coordinates: the host measures content
//! and supplies the cursor anchor; this module decides where the window goes,
//! or reports that it can't. Callers treat placement failure as "dismiss",
//! never as a crash.

use std::fmt;

/// The cursor anchor a popup attaches to, in editor-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupAnchor {
    /// Cursor x coordinate.
    pub x: f32,
    /// Top of the text row the cursor is on.
    pub y: f32,
    /// Height of one text row.
    pub row_height: f32,
}

/// The visible editor area, in editor-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Visible width.
    pub width: f32,
    /// Visible height.
    pub height: f32,
}

/// Measured popup content size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupSize {
    /// Content width.
    pub width: f32,
    /// Content height.
    pub height: f32,
}

/// Which side of the anchor row the popup ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorEdge {
    /// Popup sits above the anchor row.
    Above,
    /// Popup sits below the anchor row.
    Below,
}

/// A computed popup position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupPlacement {
    /// Left edge, clamped into the viewport.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Side of the anchor row.
    pub edge: AnchorEdge,
}

/// Why a popup could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    /// The anchor lies outside the viewport (e.g. the cursor scrolled away
    /// mid-layout).
    AnchorOutOfBounds,
    /// Neither side of the anchor row has room for the popup.
    NoVerticalRoom,
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::AnchorOutOfBounds => write!(f, "popup anchor is outside the viewport"),
            PlacementError::NoVerticalRoom => {
                write!(f, "no room above or below the anchor row for the popup")
            }
        }
    }
}

impl std::error::Error for PlacementError {}

/// Gap between the anchor row and a below-placed popup, in row heights.
const BELOW_GAP_ROWS: f32 = 0.5;

/// Place a popup against a cursor anchor.
///
/// Preference order: below the anchor row; above it when the space above is
/// larger than the space below; horizontal centering on the cursor x, clamped
/// into the viewport. A top edge that would land off-screen is an error - the
/// popup should be dismissed, not drawn clipped.
pub fn place(
    anchor: PopupAnchor,
    viewport: Viewport,
    size: PopupSize,
) -> Result<PopupPlacement, PlacementError> {
    if anchor.x < 0.0
        || anchor.x > viewport.width
        || anchor.y < 0.0
        || anchor.y > viewport.height
    {
        return Err(PlacementError::AnchorOutOfBounds);
    }

    let space_above = anchor.y;
    let space_below = viewport.height - anchor.y - anchor.row_height;

    let (y, edge) = if space_above > space_below {
        (anchor.y - size.height, AnchorEdge::Above)
    } else {
        (
            anchor.y + anchor.row_height * (1.0 + BELOW_GAP_ROWS),
            AnchorEdge::Below,
        )
    };

    if y < 0.0 {
        return Err(PlacementError::NoVerticalRoom);
    }

    let max_x = (viewport.width - size.width).max(0.0);
    let x = (anchor.x - size.width / 2.0).clamp(0.0, max_x);

    Ok(PopupPlacement { x, y, edge })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800.0,
        height: 600.0,
    };

    fn anchor(x: f32, y: f32) -> PopupAnchor {
        PopupAnchor {
            x,
            y,
            row_height: 20.0,
        }
    }

    #[test]
    fn test_prefers_below_when_room() {
        let placement = place(
            anchor(400.0, 100.0),
            VIEWPORT,
            PopupSize {
                width: 200.0,
                height: 150.0,
            },
        )
        .unwrap();

        assert_eq!(placement.edge, AnchorEdge::Below);
        assert_eq!(placement.y, 130.0);
        assert_eq!(placement.x, 300.0);
    }

    #[test]
    fn test_flips_above_when_below_is_smaller() {
        let placement = place(
            anchor(400.0, 500.0),
            VIEWPORT,
            PopupSize {
                width: 200.0,
                height: 150.0,
            },
        )
        .unwrap();

        assert_eq!(placement.edge, AnchorEdge::Above);
        assert_eq!(placement.y, 350.0);
    }

    #[test]
    fn test_clamps_horizontally() {
        let placement = place(
            anchor(10.0, 100.0),
            VIEWPORT,
            PopupSize {
                width: 200.0,
                height: 100.0,
            },
        )
        .unwrap();
        assert_eq!(placement.x, 0.0);

        let placement = place(
            anchor(795.0, 100.0),
            VIEWPORT,
            PopupSize {
                width: 200.0,
                height: 100.0,
            },
        )
        .unwrap();
        assert_eq!(placement.x, 600.0);
    }

    #[test]
    fn test_no_room_at_all_is_an_error() {
        // Tall popup, anchor near the bottom: above wins but doesn't fit.
        let result = place(
            anchor(400.0, 550.0),
            VIEWPORT,
            PopupSize {
                width: 200.0,
                height: 580.0,
            },
        );
        assert_eq!(result.unwrap_err(), PlacementError::NoVerticalRoom);
    }

    #[test]
    fn test_offscreen_anchor_is_an_error() {
        let result = place(
            anchor(400.0, 700.0),
            VIEWPORT,
            PopupSize {
                width: 10.0,
                height: 10.0,
            },
        );
        assert_eq!(result.unwrap_err(), PlacementError::AnchorOutOfBounds);
    }
}
