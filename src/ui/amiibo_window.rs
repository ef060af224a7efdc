use eframe::egui::{self, ComboBox};

use crate::amiibo::{characters, series, AmiiboEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmiiboOutcome {
    /// Scan the figurine with this id
    Scan(String),
    Cancel,
}

#[derive(Debug, Default)]
pub struct AmiiboWindow {
    entries: Vec<AmiiboEntry>,
    loading: bool,
    series: Option<String>,
    selected: Option<String>,
}

impl AmiiboWindow {
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Default::default()
        }
    }

    /// Installs the catalog and selects the first series.
    pub fn set_entries(&mut self, entries: Vec<AmiiboEntry>) {
        self.entries = entries;
        self.loading = false;
        let first = series(&self.entries).first().map(|s| s.to_string());
        match first {
            Some(first) => self.select_series(&first),
            None => {
                self.series = None;
                self.selected = None;
            }
        }
    }

    pub fn select_series(&mut self, name: &str) {
        self.series = Some(name.to_string());
        self.selected = characters(&self.entries, name)
            .first()
            .map(|entry| entry.id());
    }

    pub fn selected(&self) -> Option<&AmiiboEntry> {
        let id = self.selected.as_deref()?;
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn render(&mut self, ctx: &egui::Context) -> Option<AmiiboOutcome> {
        let mut outcome = None;
        let mut open = true;

        egui::Window::new("Amiibo")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                if self.loading {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading amiibo catalog...");
                    });
                    return;
                }
                if self.entries.is_empty() {
                    ui.label("No amiibo available. Check your network connection.");
                    return;
                }

                let mut chosen_series = None;
                ComboBox::from_label("Series")
                    .selected_text(self.series.clone().unwrap_or_default())
                    .show_ui(ui, |ui| {
                        for name in series(&self.entries) {
                            if ui
                                .selectable_label(self.series.as_deref() == Some(name), name)
                                .clicked()
                            {
                                chosen_series = Some(name.to_string());
                            }
                        }
                    });
                if let Some(name) = chosen_series {
                    self.select_series(&name);
                }

                let current = self.series.clone().unwrap_or_default();
                let selected_name = self
                    .selected()
                    .map(|entry| entry.character.clone())
                    .unwrap_or_default();
                ComboBox::from_label("Character")
                    .selected_text(selected_name)
                    .show_ui(ui, |ui| {
                        for entry in characters(&self.entries, &current) {
                            ui.selectable_value(&mut self.selected, Some(entry.id()), entry.character.as_str());
                        }
                    });

                if let Some(entry) = self.selected() {
                    ui.hyperlink_to("Preview image", &entry.image);
                }

                ui.horizontal(|ui| {
                    if ui.button("Scan it!").clicked() {
                        outcome = self.selected.clone().map(AmiiboOutcome::Scan);
                    }
                    if ui.button("Cancel").clicked() {
                        outcome = Some(AmiiboOutcome::Cancel);
                    }
                });
            });

        if !open {
            outcome = Some(AmiiboOutcome::Cancel);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amiibo(character: &str, series: &str, tail: &str) -> AmiiboEntry {
        AmiiboEntry {
            character: character.to_string(),
            head: "00000000".to_string(),
            tail: tail.to_string(),
            image: String::new(),
            amiibo_series: series.to_string(),
        }
    }

    #[test]
    fn catalog_selects_first_series_and_character() {
        let mut window = AmiiboWindow::loading();
        window.set_entries(vec![
            amiibo("Mario", "Mario", "00000001"),
            amiibo("Link", "Zelda", "00000002"),
            amiibo("Zelda", "Zelda", "00000003"),
        ]);
        assert_eq!(window.selected().unwrap().character, "Mario");

        window.select_series("Zelda");
        assert_eq!(window.selected().unwrap().id(), "0000000000000002");
    }

    #[test]
    fn empty_catalog_selects_nothing() {
        let mut window = AmiiboWindow::loading();
        window.set_entries(Vec::new());
        assert!(window.selected().is_none());
    }
}
