use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use chrono::Timelike;
use egui::{Align, Align2, Color32, Layout, RichText};
use streak_core::{
    category::{categories, CategoryColor},
    celebration::{Celebration, CELEBRATION_DURATION, CELEBRATION_EMOJIS},
    clock::{Clock, SystemClock},
    filter::CategoryFilter,
    form::HabitForm,
    habit::{Habit, HabitId, TargetDays},
    scheduler::{DailyResetScheduler, RESET_INTERVAL},
    storage::FileStorage,
    store::ToggleOutcome,
    HabitStore,
};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) reset_interval: Duration,
    pub(crate) celebration_duration: Duration,
    pub(crate) greeting_name: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            data_dir: default_data_dir(&lookup),
            ..Self::default()
        };
        if let Some(dir) = lookup("STREAKLY_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Some(secs) = lookup("STREAKLY_RESET_INTERVAL_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(value) if value > 0 => config.reset_interval = Duration::from_secs(value),
                _ => warn!(value = %secs, "ignoring invalid STREAKLY_RESET_INTERVAL_SECS"),
            }
        }
        if let Some(millis) = lookup("STREAKLY_CELEBRATION_MS") {
            match millis.trim().parse::<u64>() {
                Ok(value) if value > 0 => {
                    config.celebration_duration = Duration::from_millis(value)
                }
                _ => warn!(value = %millis, "ignoring invalid STREAKLY_CELEBRATION_MS"),
            }
        }
        if let Some(name) = lookup("STREAKLY_GREETING_NAME") {
            let name = name.trim();
            if !name.is_empty() {
                config.greeting_name = Some(name.to_string());
            }
        }
        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".streakly"),
            reset_interval: RESET_INTERVAL,
            celebration_duration: CELEBRATION_DURATION,
            greeting_name: None,
        }
    }
}

fn default_data_dir(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(xdg) = lookup("XDG_DATA_HOME").filter(|value| !value.is_empty()) {
        return PathBuf::from(xdg).join("streakly");
    }
    if let Some(home) = lookup("HOME").filter(|value| !value.is_empty()) {
        return PathBuf::from(home).join(".local/share/streakly");
    }
    PathBuf::from(".streakly")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HabitAction {
    Toggle(HabitId),
    AskDelete(HabitId),
    ConfirmDelete(HabitId),
    CancelDelete,
    Move { id: HabitId, to: usize },
}

struct StreaklyApp {
    store: HabitStore,
    config: AppConfig,
    scheduler: DailyResetScheduler,
    celebration: Celebration,
    filter: CategoryFilter,
    form: HabitForm,
    pending_delete: Option<HabitId>,
    status: String,
}

impl StreaklyApp {
    fn new(config: AppConfig) -> Result<Self> {
        info!(data_dir = %config.data_dir.display(), "initializing habit store");
        let store = HabitStore::builder()
            .with_storage(Box::new(FileStorage::new(&config.data_dir)))
            .with_clock(Arc::new(SystemClock))
            .build()
            .context("failed to initialize habit store")?;
        Ok(Self {
            store,
            scheduler: DailyResetScheduler::new(config.reset_interval),
            celebration: Celebration::new(config.celebration_duration),
            config,
            filter: CategoryFilter::default(),
            form: HabitForm::default(),
            pending_delete: None,
            status: String::from("Ready"),
        })
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn apply(&mut self, action: HabitAction) {
        match action {
            HabitAction::Toggle(id) => match self.store.toggle(id) {
                Some(ToggleOutcome::Completed(event)) => {
                    self.celebration.trigger(&event, Instant::now());
                    self.set_status(format!("{} done for today", event.habit_name));
                }
                Some(ToggleOutcome::Uncompleted { .. }) => {}
                None => debug!(habit_id = id, "toggle ignored for unknown habit"),
            },
            HabitAction::AskDelete(id) => self.pending_delete = Some(id),
            HabitAction::CancelDelete => self.pending_delete = None,
            HabitAction::ConfirmDelete(id) => {
                self.pending_delete = None;
                let name = self.store.get(id).map(|habit| habit.name.clone());
                if self.store.remove(id) {
                    self.set_status(format!("Deleted {}", name.unwrap_or_default()));
                }
            }
            HabitAction::Move { id, to } => {
                self.store.reorder(id, to, self.filter.selected());
            }
        }
    }

    fn header_ui(&mut self, ui: &mut egui::Ui) {
        let hour = self.store.clock().now().hour();
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.heading(
                RichText::new(greeting(hour, self.config.greeting_name.as_deref())).size(28.0),
            );
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("➕ Add Habit").clicked() {
                    self.form.open();
                }
            });
        });
        ui.label(
            RichText::new("Track your daily habits and build a better routine")
                .color(Color32::GRAY),
        );
        ui.add_space(8.0);
    }

    fn categories_ui(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Categories").strong());
        ui.horizontal_wrapped(|ui| {
            if ui
                .selectable_label(self.filter.selected().is_none(), "All Habits")
                .clicked()
            {
                self.filter.clear();
            }
            for category in categories() {
                let text = RichText::new(format!("{} {}", category.icon, category.name))
                    .color(category_color(category.color));
                if ui
                    .selectable_label(self.filter.is_selected(category), text)
                    .clicked()
                {
                    self.filter.toggle(category.id);
                }
            }
        });
    }

    fn habit_list_ui(&mut self, ui: &mut egui::Ui) {
        let rows: Vec<Habit> = self
            .filter
            .apply(self.store.habits())
            .into_iter()
            .cloned()
            .collect();
        if rows.is_empty() {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(self.filter.empty_message()).color(Color32::GRAY));
            });
            return;
        }

        let mut action = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (index, habit) in rows.iter().enumerate() {
                let confirming = self.pending_delete == Some(habit.id);
                if let Some(row_action) = habit_card_ui(ui, index, habit, confirming) {
                    action = Some(row_action);
                }
                ui.add_space(6.0);
            }
        });
        if let Some(action) = action {
            self.apply(action);
        }
    }

    fn add_dialog_ui(&mut self, ctx: &egui::Context) {
        if !self.form.is_open() {
            return;
        }
        let mut open = true;
        let mut submitted = false;
        let mut cancelled = false;
        let form = &mut self.form;
        egui::Window::new("Add New Habit")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Habit Name *");
                ui.add(
                    egui::TextEdit::singleline(&mut form.name).hint_text("e.g., Morning Exercise"),
                );
                ui.add_space(6.0);
                ui.label("Category *");
                egui::Grid::new("habit-form-categories")
                    .num_columns(2)
                    .show(ui, |ui| {
                        for (idx, category) in categories().iter().enumerate() {
                            let selected = form.category_id.as_deref() == Some(category.id);
                            let label = format!("{} {}", category.icon, category.name);
                            if ui.selectable_label(selected, label).clicked() {
                                form.select_category(category.id);
                            }
                            if idx % 2 == 1 {
                                ui.end_row();
                            }
                        }
                    });
                ui.add_space(6.0);
                ui.label("Goal (optional)");
                ui.add(
                    egui::TextEdit::singleline(&mut form.goal)
                        .hint_text("e.g., Exercise for 30 minutes"),
                );
                ui.add_space(6.0);
                ui.label("Target Days to Build Habit");
                egui::ComboBox::from_id_salt("habit-form-target")
                    .selected_text(target_label(form.target_days))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut form.target_days, None, target_label(None));
                        for target in TargetDays::ALL {
                            ui.selectable_value(
                                &mut form.target_days,
                                Some(target),
                                target_label(Some(target)),
                            );
                        }
                    });
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancelled = true;
                    }
                    if ui
                        .add_enabled(form.can_submit(), egui::Button::new("Add Habit"))
                        .clicked()
                    {
                        submitted = true;
                    }
                });
            });

        if submitted {
            match self.form.submit(&mut self.store) {
                Ok(id) => {
                    info!(habit_id = id, "habit created from form");
                    self.set_status("Habit added");
                }
                Err(err) => self.set_status(err.to_string()),
            }
        }
        if cancelled || !open {
            self.form.cancel();
        }
    }

    fn celebration_ui(&self, ctx: &egui::Context) {
        if !self.celebration.is_showing() {
            return;
        }
        let signal = self.celebration.signal();
        egui::Area::new(egui::Id::new("streak-celebration"))
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(CELEBRATION_EMOJIS.join(" ")).size(32.0));
                    ui.label(
                        RichText::new(signal.headline())
                            .size(36.0)
                            .strong()
                            .color(Color32::from_rgb(250, 204, 21)),
                    );
                    ui.label(RichText::new(&signal.habit_name).size(18.0));
                });
            });
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let wake = [
            self.scheduler.time_until_due(now),
            self.celebration.remaining(now),
        ]
        .into_iter()
        .flatten()
        .min();
        if let Some(after) = wake {
            ctx.request_repaint_after(after);
        }
    }
}

impl eframe::App for StreaklyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        if let Some(summary) = self.scheduler.poll(now, &mut self.store) {
            if summary.streaks_broken > 0 {
                self.set_status(format!("{} streak(s) reset", summary.streaks_broken));
            }
        }
        self.celebration.tick(now);

        egui::TopBottomPanel::top("streakly-header").show(ctx, |ui| self.header_ui(ui));
        egui::TopBottomPanel::bottom("streakly-status").show(ctx, |ui| {
            ui.label(RichText::new(&self.status).small());
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.categories_ui(ui);
            ui.separator();
            self.habit_list_ui(ui);
        });
        self.add_dialog_ui(ctx);
        self.celebration_ui(ctx);
        self.schedule_repaint(ctx, now);
    }
}

fn habit_card_ui(
    ui: &mut egui::Ui,
    index: usize,
    habit: &Habit,
    confirming: bool,
) -> Option<HabitAction> {
    let mut action = None;
    let response = egui::Frame::group(ui.style())
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.dnd_drag_source(egui::Id::new(("habit-drag", habit.id)), habit.id, |ui| {
                    ui.label(RichText::new("⠿").color(Color32::GRAY));
                });
                let mut completed = habit.completed;
                if ui.checkbox(&mut completed, "").changed() {
                    action = Some(HabitAction::Toggle(habit.id));
                }
                ui.vertical(|ui| {
                    let mut name = RichText::new(&habit.name).size(18.0);
                    if habit.completed {
                        name = name.strikethrough().color(Color32::GRAY);
                    }
                    ui.label(name);
                    if let Some(category) = habit.category() {
                        ui.label(
                            RichText::new(format!("{} {}", category.icon, category.name))
                                .small()
                                .color(category_color(category.color)),
                        );
                    }
                    if let Some(details) = card_details(habit) {
                        ui.label(RichText::new(details).small());
                    }
                });
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("🗑").on_hover_text("Delete habit").clicked() {
                        action = Some(HabitAction::AskDelete(habit.id));
                    }
                    let badge = RichText::new(format!("🔥 {}", habit.streak)).strong();
                    ui.label(if habit.completed {
                        badge.color(Color32::from_rgb(74, 222, 128))
                    } else {
                        badge
                    });
                });
            });
            if confirming {
                ui.horizontal(|ui| {
                    ui.label("Delete this habit?");
                    if ui.button("Cancel").clicked() {
                        action = Some(HabitAction::CancelDelete);
                    }
                    if ui
                        .button(RichText::new("Delete").color(Color32::from_rgb(239, 68, 68)))
                        .clicked()
                    {
                        action = Some(HabitAction::ConfirmDelete(habit.id));
                    }
                });
            }
        })
        .response;

    if let Some(dragged) = response.dnd_release_payload::<HabitId>() {
        action = Some(HabitAction::Move {
            id: *dragged,
            to: index,
        });
    }
    action
}

pub(crate) fn greeting(hour: u32, name: Option<&str>) -> String {
    let part_of_day = match hour {
        5..=11 => "Good Morning",
        12..=17 => "Good Afternoon",
        _ => "Good Evening",
    };
    match name {
        Some(name) => format!("{part_of_day}, {name} 👋"),
        None => format!("{part_of_day} 👋"),
    }
}

pub(crate) fn card_details(habit: &Habit) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(goal) = habit.goal.as_deref().filter(|goal| !goal.is_empty()) {
        parts.push(format!("🎯 Goal: {goal}"));
    }
    if let Some(target) = habit.target_days {
        parts.push(format!("📅 Target: {} days", target.days()));
    }
    (!parts.is_empty()).then(|| parts.join(" • "))
}

fn target_label(target: Option<TargetDays>) -> String {
    match target {
        Some(target) => format!("{} days", target.days()),
        None => String::from("Select target"),
    }
}

fn category_color(color: CategoryColor) -> Color32 {
    match color {
        CategoryColor::Green => Color32::from_rgb(74, 222, 128),
        CategoryColor::Blue => Color32::from_rgb(96, 165, 250),
        CategoryColor::Purple => Color32::from_rgb(192, 132, 252),
        CategoryColor::Yellow => Color32::from_rgb(250, 204, 21),
        CategoryColor::Pink => Color32::from_rgb(244, 114, 182),
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    info!("starting egui runtime");
    let app = StreaklyApp::new(config)?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Streakly")
            .with_inner_size([520.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Streakly",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|err| anyhow!("egui runtime terminated: {err}"))?;
    info!("egui runtime exited");
    Ok(())
}
