use gpui::*;
use prayer_clock::display::Orientation;
use prayer_clock::location::LocationPicker;
use prayer_clock::urgency::{TierSettings, UrgencyTier};

use crate::app::ClockApp;
use crate::theme::MenuTheme;

pub enum MenuStatus {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPage {
    Main,
    Location,
    Tiers,
}

#[derive(Debug, Clone, Copy)]
pub enum MenuAction {
    Refresh,
    ToggleOrientation,
    ToggleSeconds,
    Open(MenuPage),
    StepCity(isize),
    StepDistrict(isize),
    ApplyLocation,
    AdjustTrigger(UrgencyTier, i64),
    CycleColor(UrgencyTier),
    Quit,
}

pub struct ContextMenu {
    theme: MenuTheme,
    page: MenuPage,
    location: String,
    status: MenuStatus,
    orientation: Orientation,
    show_seconds: bool,
    picker: LocationPicker,
    tiers: TierSettings,
    view: Entity<ClockApp>,
}

impl ContextMenu {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        theme: MenuTheme,
        page: MenuPage,
        location: String,
        status: MenuStatus,
        orientation: Orientation,
        show_seconds: bool,
        picker: LocationPicker,
        tiers: TierSettings,
        view: Entity<ClockApp>,
    ) -> Self {
        Self {
            theme,
            page,
            location,
            status,
            orientation,
            show_seconds,
            picker,
            tiers,
            view,
        }
    }

    fn clickable(&self, action: MenuAction) -> Div {
        let view = self.view.clone();
        let hover = self.theme.hover;

        div()
            .cursor_pointer()
            .hover(move |style| style.bg(hover))
            .on_mouse_down(MouseButton::Left, move |_event, window, cx| match action {
                MenuAction::Quit => cx.quit(),
                action => cx.update_entity(&view, |app, cx| {
                    app.handle_menu_action(action, window, cx);
                }),
            })
    }

    fn render_item(&self, label: &str, action: MenuAction) -> Div {
        self.clickable(action)
            .px_3()
            .py_1()
            .text_sm()
            .text_color(self.theme.foreground)
            .child(label.to_string())
    }

    fn render_button(&self, label: &str, action: MenuAction) -> Div {
        self.clickable(action)
            .px_1()
            .text_sm()
            .font_weight(FontWeight::BOLD)
            .text_color(self.theme.foreground)
            .child(label.to_string())
    }

    /// `caption   ‹ value ›`
    fn render_stepper(&self, caption: &str, value: String, back: MenuAction, forward: MenuAction) -> Div {
        div()
            .px_3()
            .py_1()
            .flex()
            .flex_row()
            .items_center()
            .justify_between()
            .text_sm()
            .child(div().text_color(self.theme.muted).child(caption.to_string()))
            .child(
                div()
                    .flex()
                    .flex_row()
                    .items_center()
                    .gap_1()
                    .child(self.render_button("‹", back))
                    .child(div().text_color(self.theme.foreground).child(value))
                    .child(self.render_button("›", forward)),
            )
    }

    fn render_header(&self) -> impl IntoElement {
        let (status, color) = match &self.status {
            MenuStatus::Info(text) => (text.clone(), self.theme.muted),
            MenuStatus::Error(text) => (text.clone(), self.theme.error),
        };

        div()
            .px_3()
            .py_2()
            .border_b_1()
            .border_color(self.theme.border)
            .flex()
            .flex_col()
            .gap_1()
            .child(
                div()
                    .text_xs()
                    .font_weight(FontWeight::BOLD)
                    .text_color(self.theme.foreground)
                    .child(self.location.clone()),
            )
            .child(div().text_xs().text_color(color).child(status))
    }

    fn render_main(&self) -> Vec<Div> {
        let orientation_label = match self.orientation {
            Orientation::Horizontal => "Vertical layout",
            Orientation::Vertical => "Horizontal layout",
        };
        let seconds_label = if self.show_seconds {
            "Hide seconds"
        } else {
            "Show seconds"
        };

        vec![
            self.render_item("Refresh times", MenuAction::Refresh),
            self.render_item("Location…", MenuAction::Open(MenuPage::Location)),
            self.render_item("Colors and alerts…", MenuAction::Open(MenuPage::Tiers)),
            self.render_item(orientation_label, MenuAction::ToggleOrientation),
            self.render_item(seconds_label, MenuAction::ToggleSeconds),
            self.render_item("Quit", MenuAction::Quit),
        ]
    }

    fn render_location(&self) -> Vec<Div> {
        let city = self.picker.city();
        let district = if self.picker.is_loading() {
            "loading…".to_string()
        } else {
            self.picker
                .district()
                .map(|district| district.name.clone())
                .unwrap_or_else(|| "none".to_string())
        };

        let mut rows = vec![
            self.render_stepper(
                "City",
                format!("{} {}", city.plate, city.name),
                MenuAction::StepCity(-1),
                MenuAction::StepCity(1),
            ),
            self.render_stepper(
                "District",
                district,
                MenuAction::StepDistrict(-1),
                MenuAction::StepDistrict(1),
            ),
        ];
        if let Some(error) = self.picker.error() {
            rows.push(
                div()
                    .px_3()
                    .text_xs()
                    .text_color(self.theme.error)
                    .child(error.to_string()),
            );
        }
        rows.push(self.render_item("Use this location", MenuAction::ApplyLocation));
        rows.push(self.render_item("‹ Back", MenuAction::Open(MenuPage::Main)));
        rows
    }

    fn render_tier(&self, tier: UrgencyTier) -> Div {
        let swatch = self
            .tiers
            .colors(tier)
            .background_rgb()
            .unwrap_or(0x000000);
        let step = if tier == UrgencyTier::Imminent { 1 } else { 5 };

        let mut row = div()
            .px_3()
            .py_1()
            .flex()
            .flex_row()
            .items_center()
            .gap_2()
            .text_sm()
            .child(
                self.clickable(MenuAction::CycleColor(tier))
                    .size_4()
                    .border_1()
                    .border_color(self.theme.border)
                    .bg(rgb(swatch)),
            )
            .child(
                div()
                    .flex_1()
                    .text_color(self.theme.foreground)
                    .child(tier.display_name().to_string()),
            );

        if let Some(trigger) = self.tiers.trigger(tier) {
            let label = if trigger == 0 {
                "off".to_string()
            } else {
                format!("< {trigger} min")
            };
            row = row
                .child(self.render_button("−", MenuAction::AdjustTrigger(tier, -step)))
                .child(div().text_color(self.theme.muted).child(label))
                .child(self.render_button("+", MenuAction::AdjustTrigger(tier, step)));
        }
        row
    }

    fn render_tiers(&self) -> Vec<Div> {
        let mut rows: Vec<Div> = UrgencyTier::ALL
            .into_iter()
            .map(|tier| self.render_tier(tier))
            .collect();
        rows.push(self.render_item("‹ Back", MenuAction::Open(MenuPage::Main)));
        rows
    }
}

impl IntoElement for ContextMenu {
    type Element = Div;

    fn into_element(self) -> Self::Element {
        let rows = match self.page {
            MenuPage::Main => self.render_main(),
            MenuPage::Location => self.render_location(),
            MenuPage::Tiers => self.render_tiers(),
        };

        div()
            .w_full()
            .flex()
            .flex_col()
            .bg(self.theme.background)
            .border_1()
            .border_color(self.theme.border)
            .child(self.render_header())
            .children(rows)
    }
}
