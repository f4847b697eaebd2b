//! Control Panel Widget
//! Left side panel with the data source, filters and download buttons.

use crate::data::{DateRange, FilterParams};
use chrono::NaiveDate;
use egui::{Color32, RichText, ScrollArea};
use std::collections::BTreeSet;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Left side control panel with source, filter and export controls.
pub struct ControlPanel {
    pub source_label: String,
    pub category_options: Vec<String>,
    pub selected_categories: BTreeSet<String>,
    pub has_timestamp: bool,
    pub date_filter_enabled: bool,
    pub start_text: String,
    pub end_text: String,
    pub status: String,
    pub is_loading: bool,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            source_label: String::new(),
            category_options: Vec::new(),
            selected_categories: BTreeSet::new(),
            has_timestamp: false,
            date_filter_enabled: false,
            start_text: String::new(),
            end_text: String::new(),
            status: "Ready".to_string(),
            is_loading: false,
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new(source_label: String) -> Self {
        Self {
            source_label,
            ..Self::default()
        }
    }

    /// Replace the category choices, dropping selections that no longer exist.
    pub fn update_categories(&mut self, options: Vec<String>) {
        self.selected_categories.retain(|c| options.contains(c));
        self.category_options = options;
    }

    /// Current filter parameters.
    ///
    /// The date range only applies once both ends parse.
    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            categories: self.selected_categories.clone(),
            date_range: self.date_range(),
        }
    }

    fn date_range(&self) -> Option<DateRange> {
        if !self.date_filter_enabled || !self.has_timestamp {
            return None;
        }
        let start = NaiveDate::parse_from_str(self.start_text.trim(), DATE_FORMAT).ok()?;
        let end = NaiveDate::parse_from_str(self.end_text.trim(), DATE_FORMAT).ok()?;
        Some(DateRange::new(start, end))
    }

    fn date_hint(&self) -> Option<&'static str> {
        if !self.date_filter_enabled {
            return None;
        }
        let parses = |s: &str| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).is_ok();
        if parses(&self.start_text) && parses(&self.end_text) {
            None
        } else {
            Some("Enter both dates as YYYY-MM-DD")
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Mobilization")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(RichText::new("Data Dashboard").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&self.source_label).size(12.0));
                ui.horizontal(|ui| {
                    ui.add_enabled_ui(!self.is_loading, |ui| {
                        if ui.button("🔄 Reload").clicked() {
                            action = ControlPanelAction::Reload;
                        }
                        if ui.button("📂 Open CSV").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                        if ui.button("🌐 Sheet").clicked() {
                            action = ControlPanelAction::UseRemote;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filters Section =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(8.0);

        ui.label("Select County:");
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical().max_height(180.0).show(ui, |ui| {
                    if self.category_options.is_empty() {
                        ui.label(RichText::new("No counties loaded").color(Color32::GRAY));
                    }
                    for option in &self.category_options {
                        let mut checked = self.selected_categories.contains(option);
                        if ui.checkbox(&mut checked, option).changed() {
                            if checked {
                                self.selected_categories.insert(option.clone());
                            } else {
                                self.selected_categories.remove(option);
                            }
                            action = ControlPanelAction::FiltersChanged;
                        }
                    }
                });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.selected_categories = self.category_options.iter().cloned().collect();
                action = ControlPanelAction::FiltersChanged;
            }
            if ui.small_button("Clear All").clicked() {
                self.selected_categories.clear();
                action = ControlPanelAction::FiltersChanged;
            }
        });

        ui.add_space(10.0);

        ui.add_enabled_ui(self.has_timestamp, |ui| {
            if ui
                .checkbox(&mut self.date_filter_enabled, "Filter by date range")
                .changed()
            {
                action = ControlPanelAction::FiltersChanged;
            }

            ui.add_enabled_ui(self.date_filter_enabled, |ui| {
                let label_width = 45.0;
                ui.horizontal(|ui| {
                    ui.add_sized([label_width, 20.0], egui::Label::new("From:"));
                    let edit = egui::TextEdit::singleline(&mut self.start_text)
                        .hint_text("YYYY-MM-DD")
                        .desired_width(110.0);
                    if ui.add(edit).changed() {
                        action = ControlPanelAction::FiltersChanged;
                    }
                });
                ui.horizontal(|ui| {
                    ui.add_sized([label_width, 20.0], egui::Label::new("To:"));
                    let edit = egui::TextEdit::singleline(&mut self.end_text)
                        .hint_text("YYYY-MM-DD")
                        .desired_width(110.0);
                    if ui.add(edit).changed() {
                        action = ControlPanelAction::FiltersChanged;
                    }
                });
            });
        });

        if !self.has_timestamp {
            ui.label(
                RichText::new("No timestamp column in this dataset")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        } else if let Some(hint) = self.date_hint() {
            ui.label(RichText::new(hint).size(11.0).color(Color32::GRAY));
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Download Buttons =====
        ui.label(RichText::new("⬇ Downloads").size(14.0).strong());
        ui.add_space(5.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let buttons = [
                    ("Clean Data (CSV)", ControlPanelAction::ExportCleanCsv),
                    ("Filtered Data (CSV)", ControlPanelAction::ExportFilteredCsv),
                    ("County Breakdown (XLSX)", ControlPanelAction::ExportBreakdownXlsx),
                    ("County Chart (PNG)", ControlPanelAction::ExportChartPng),
                ];
                for (label, button_action) in buttons {
                    let button = egui::Button::new(RichText::new(label).size(13.0))
                        .min_size(egui::vec2(200.0, 28.0));
                    if ui.add(button).clicked() {
                        action = button_action;
                    }
                    ui.add_space(4.0);
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        if self.is_loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading data...");
            });
        }

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Saved") || self.status.contains("Loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlPanelAction {
    None,
    Reload,
    BrowseCsv,
    UseRemote,
    FiltersChanged,
    ExportCleanCsv,
    ExportFilteredCsv,
    ExportBreakdownXlsx,
    ExportChartPng,
}
