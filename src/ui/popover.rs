//! Placement of floating panels (emoji picker, reaction tooltip, action menu) around the cell
//! that triggered them, kept inside the scrolling comment list.
use ratatui::layout::{Rect, Size};

/// Margin, in cells, kept between a popover and its trigger or container edges.
pub const POPOVER_MARGIN: u16 = 1;

/// Side of the trigger tried first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Bias {
    #[default]
    Below,
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Position of the panel's top-left corner relative to the trigger's.
    pub offset: (i32, i32),
    /// Absolute area, saturated at the buffer origin.
    pub area: Rect,
}

/// Places a panel of `size` next to `trigger` inside `container`.
///
/// Vertically the biased side is tried first, then the other one; a side fits when it has room
/// for the panel plus `margin`. When neither does, the panel is pinned to the container's top
/// edge. Horizontally the panel is centered on the trigger and then shifted, never resized, so
/// that it stays `margin` cells clear of the container's left edge and of its right edge minus
/// the `scrollbar` width. The right clamp is applied before the left one.
pub fn place(
    trigger: Rect,
    size: Size,
    container: Rect,
    margin: u16,
    scrollbar: u16,
    bias: Bias,
) -> Placement {
    let (margin, scrollbar) = (i32::from(margin), i32::from(scrollbar));
    let (width, height) = (i32::from(size.width), i32::from(size.height));
    let (trigger_x, trigger_y) = (i32::from(trigger.x), i32::from(trigger.y));

    let space_above = trigger_y - i32::from(container.top());
    let space_below = i32::from(container.bottom()) - i32::from(trigger.bottom());
    let above = (space_above >= height + margin).then_some(-height - margin);
    let below = (space_below >= height + margin).then_some(i32::from(trigger.height) + margin);
    let top = match bias {
        Bias::Below => below.or(above),
        Bias::Above => above.or(below),
    }
    .unwrap_or(i32::from(container.top()) - trigger_y + margin);

    let mut left = (i32::from(trigger.width) - width).div_euclid(2);
    let right_edge = i32::from(container.right()) - margin - scrollbar;
    let overflow = trigger_x + left + width - right_edge;
    if overflow > 0 {
        left -= overflow;
    }
    let left_edge = i32::from(container.left()) + margin;
    let underflow = left_edge - (trigger_x + left);
    if underflow > 0 {
        left += underflow;
    }

    Placement {
        offset: (left, top),
        area: Rect {
            x: saturate(trigger_x + left),
            y: saturate(trigger_y + top),
            width: size.width,
            height: size.height,
        },
    }
}

fn saturate(v: i32) -> u16 {
    u16::try_from(v.max(0)).unwrap_or(u16::MAX)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Closed,
    Pending,
    Placed(Placement),
}

/// Open/close lifecycle of one floating panel.
///
/// Opening only marks the panel as pending. The placement is computed by
/// [`Popover::layout`] on the next render, once the panel's real size is known, and cached until
/// a scroll or resize invalidates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Popover {
    bias: Bias,
    phase: Phase,
}

impl Popover {
    pub fn new(bias: Bias) -> Self {
        Self {
            bias,
            phase: Phase::Closed,
        }
    }

    pub fn open(&mut self) {
        self.phase = Phase::Pending;
    }

    pub fn close(&mut self) {
        self.phase = Phase::Closed;
    }

    pub fn is_open(&self) -> bool {
        self.phase != Phase::Closed
    }

    /// Forces the next [`Popover::layout`] to recompute. Ignored while closed.
    pub fn invalidate(&mut self) {
        if let Phase::Placed(_) = self.phase {
            self.phase = Phase::Pending;
        }
    }

    pub fn placement(&self) -> Option<Placement> {
        match self.phase {
            Phase::Placed(placement) => Some(placement),
            _ => None,
        }
    }

    /// Places the panel if it is pending and `size` is known (non-zero width).
    pub fn layout(
        &mut self,
        trigger: Rect,
        size: Size,
        container: Rect,
        scrollbar: u16,
    ) -> Option<Placement> {
        match self.phase {
            Phase::Closed => None,
            Phase::Placed(placement) => Some(placement),
            Phase::Pending if size.width == 0 => None,
            Phase::Pending => {
                let placement = place(trigger, size, container, POPOVER_MARGIN, scrollbar, self.bias);
                self.phase = Phase::Placed(placement);
                Some(placement)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARGIN: u16 = 8;

    fn container() -> Rect {
        Rect::new(0, 0, 400, 600)
    }

    #[test]
    fn below_bias_prefers_below() {
        let trigger = Rect::new(180, 100, 40, 20);
        let p = place(trigger, Size::new(100, 50), container(), MARGIN, 0, Bias::Below);
        assert_eq!(p.offset, (-30, 28));
        assert_eq!(p.area, Rect::new(150, 128, 100, 50));
    }

    #[test]
    fn above_bias_prefers_above() {
        let trigger = Rect::new(180, 100, 40, 20);
        let p = place(trigger, Size::new(100, 50), container(), MARGIN, 0, Bias::Above);
        assert_eq!(p.offset, (-30, -58));
        assert_eq!(p.area.y, 42);
    }

    #[test]
    fn falls_back_to_the_other_side() {
        let trigger = Rect::new(180, 560, 40, 20);
        let p = place(trigger, Size::new(100, 50), container(), MARGIN, 0, Bias::Below);
        assert_eq!(p.offset.1, -58);

        let trigger = Rect::new(180, 20, 40, 20);
        let p = place(trigger, Size::new(100, 50), container(), MARGIN, 0, Bias::Above);
        assert_eq!(p.offset.1, 28);
    }

    #[test]
    fn pins_to_the_container_top_when_neither_side_fits() {
        let container = Rect::new(0, 50, 400, 100);
        let trigger = Rect::new(180, 90, 40, 20);
        let p = place(trigger, Size::new(100, 80), container, MARGIN, 0, Bias::Below);
        assert_eq!(p.offset.1, 50 - 90 + 8);
        assert_eq!(p.area.y, 58);
    }

    #[test]
    fn clamps_against_the_right_edge_and_scrollbar() {
        let trigger = Rect::new(370, 100, 20, 20);
        let p = place(trigger, Size::new(100, 50), container(), MARGIN, 6, Bias::Below);
        // right edge is 400 - 8 - 6
        assert_eq!(p.area.right(), 386);
        assert_eq!(p.area.width, 100);
    }

    #[test]
    fn clamps_against_the_left_edge() {
        let trigger = Rect::new(5, 100, 20, 20);
        let p = place(trigger, Size::new(100, 50), container(), MARGIN, 0, Bias::Below);
        assert_eq!(p.area.x, 8);
        assert_eq!(p.offset.0, 3);
    }

    #[test]
    fn left_clamp_wins_for_oversized_panels() {
        let container = Rect::new(0, 0, 60, 600);
        let trigger = Rect::new(20, 100, 20, 20);
        let p = place(trigger, Size::new(100, 50), container, MARGIN, 0, Bias::Below);
        assert_eq!(p.area.x, 8);
        assert_eq!(p.area.width, 100);
    }

    #[test]
    fn lifecycle_waits_for_a_measured_size() {
        let mut popover = Popover::new(Bias::Below);
        let trigger = Rect::new(10, 10, 4, 1);
        let area = Rect::new(0, 0, 80, 40);

        popover.invalidate();
        assert!(!popover.is_open());
        assert_eq!(popover.layout(trigger, Size::new(20, 3), area, 0), None);

        popover.open();
        assert_eq!(popover.layout(trigger, Size::new(0, 3), area, 0), None);
        assert_eq!(popover.placement(), None);

        let placed = popover.layout(trigger, Size::new(20, 3), area, 0).unwrap();
        assert_eq!(placed.area, Rect::new(2, 12, 20, 3));
        // cached until invalidated
        let moved = Rect::new(40, 10, 4, 1);
        assert_eq!(popover.layout(moved, Size::new(20, 3), area, 0), Some(placed));

        popover.invalidate();
        let replaced = popover.layout(moved, Size::new(20, 3), area, 0).unwrap();
        assert_eq!(replaced.area.x, 32);

        popover.close();
        assert_eq!(popover.placement(), None);
    }
}
