use gpui::*;
use crate::app::ClockApp;

/// The countdown label. Left drag moves the window, right click opens the menu.
pub struct ClockFace {
    text: String,
    background: u32,
    foreground: u32,
    font_size: f32,
    view: Entity<ClockApp>,
}

impl ClockFace {
    pub fn new(
        text: String,
        background: u32,
        foreground: u32,
        font_size: f32,
        view: Entity<ClockApp>,
    ) -> Self {
        Self {
            text,
            background,
            foreground,
            font_size,
            view,
        }
    }

    fn render_lines(&self) -> Vec<Div> {
        // Vertical layouts arrive newline-separated
        self.text
            .lines()
            .map(|line| {
                div()
                    .text_size(px(self.font_size))
                    .font_weight(FontWeight::BOLD)
                    .line_height(px(self.font_size * 1.4))
                    .text_color(rgb(self.foreground))
                    .child(line.to_string())
            })
            .collect()
    }
}

impl IntoElement for ClockFace {
    type Element = Div;

    fn into_element(self) -> Self::Element {
        let view_for_drag = self.view.clone();
        let view_for_menu = self.view.clone();
        let lines = self.render_lines();

        div()
            .w_full()
            .flex_1()
            .flex()
            .flex_col()
            .items_center()
            .justify_center()
            .px_2()
            .bg(rgb(self.background))
            .cursor_pointer()
            .on_mouse_down(MouseButton::Left, move |_event, window, cx| {
                cx.update_entity(&view_for_drag, |app, _cx| {
                    app.handle_drag_start(window);
                });
            })
            .on_mouse_down(MouseButton::Right, move |_event, window, cx| {
                cx.update_entity(&view_for_menu, |app, cx| {
                    app.handle_toggle_menu(window, cx);
                });
            })
            .children(lines)
    }
}
