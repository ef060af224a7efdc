use std::path::{Path, PathBuf};

use eframe::egui::{Grid, Label, ScrollArea, Sense, Ui};
use strum::IntoEnumIterator;

use crate::library::{sort_entries, GameEntry, GameMetadata};
use crate::persistence::{ColumnSort, GuiColumns, SortColumn};

#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    Launch(PathBuf),
    SetFavorite(PathBuf, bool),
    Sort(ColumnSort),
}

/// Clicking the active column flips the direction, another column starts
/// ascending.
pub fn next_sort(current: ColumnSort, clicked: SortColumn) -> ColumnSort {
    if current.column == clicked {
        ColumnSort {
            column: clicked,
            ascending: !current.ascending,
        }
    } else {
        ColumnSort {
            column: clicked,
            ascending: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct GameTable {
    entries: Vec<GameEntry>,
    loading: bool,
}

impl GameTable {
    pub fn set_loading(&mut self) {
        self.loading = true;
    }

    pub fn set_entries(&mut self, mut entries: Vec<GameEntry>, sort: ColumnSort) {
        sort_entries(&mut entries, sort);
        self.entries = entries;
        self.loading = false;
    }

    pub fn resort(&mut self, sort: ColumnSort) {
        sort_entries(&mut self.entries, sort);
    }

    pub fn entries(&self) -> &[GameEntry] {
        &self.entries
    }

    /// Applies fresh metadata to the row of `path`, if it is listed.
    pub fn apply_metadata(&mut self, path: &Path, meta: &GameMetadata) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.path == path) {
            entry.favorite = meta.favorite;
            entry.time_played = meta.time_played();
            entry.last_played = meta.last_played;
        }
    }

    pub fn render(&self, ui: &mut Ui, columns: &GuiColumns, sort: ColumnSort) -> Option<TableEvent> {
        if self.loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading games...");
            });
            return None;
        }
        if self.entries.is_empty() {
            ui.label("No games found. Add a game directory in the settings.");
            return None;
        }

        let visible: Vec<SortColumn> = SortColumn::iter()
            .filter(|column| columns.is_visible(*column))
            .collect();
        let mut event = None;

        ScrollArea::both().auto_shrink(false).show(ui, |ui| {
            Grid::new("game_table")
                .striped(true)
                .num_columns(visible.len())
                .show(ui, |ui| {
                    for column in &visible {
                        let arrow = match (sort.column == *column, sort.ascending) {
                            (true, true) => " ⏶",
                            (true, false) => " ⏷",
                            (false, _) => "",
                        };
                        if ui.button(format!("{}{}", column.header(), arrow)).clicked() {
                            event = Some(TableEvent::Sort(next_sort(sort, *column)));
                        }
                    }
                    ui.end_row();

                    for entry in &self.entries {
                        for column in &visible {
                            match column {
                                SortColumn::Favorite => {
                                    let mut favorite = entry.favorite;
                                    if ui.checkbox(&mut favorite, "").changed() {
                                        event = Some(TableEvent::SetFavorite(
                                            entry.path.clone(),
                                            favorite,
                                        ));
                                    }
                                }
                                column => {
                                    let response = ui.add(
                                        Label::new(entry.cell(*column))
                                            .sense(Sense::click())
                                            .truncate(),
                                    );
                                    if response.double_clicked() {
                                        event = Some(TableEvent::Launch(entry.path.clone()));
                                    }
                                    response.on_hover_text(entry.path.display().to_string());
                                }
                            }
                        }
                        ui.end_row();
                    }
                });
        });

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn header_click_cycles_direction() {
        let start = ColumnSort::default();
        let flipped = next_sort(start, SortColumn::Favorite);
        assert_eq!(flipped.column, SortColumn::Favorite);
        assert_eq!(flipped.ascending, !start.ascending);

        let other = next_sort(flipped, SortColumn::FileSize);
        assert_eq!(
            other,
            ColumnSort {
                column: SortColumn::FileSize,
                ascending: true
            }
        );
    }

    #[test]
    fn metadata_updates_matching_row() {
        let mut table = GameTable::default();
        table.set_loading();
        let entry = GameEntry {
            title: "game".into(),
            path: PathBuf::from("/games/game.nsp"),
            extension: "nsp".into(),
            size: 1,
            favorite: false,
            time_played: Duration::ZERO,
            last_played: None,
        };
        table.set_entries(vec![entry], ColumnSort::default());

        let meta = GameMetadata {
            favorite: true,
            time_played_secs: 90,
            last_played: None,
        };
        table.apply_metadata(Path::new("/games/game.nsp"), &meta);
        table.apply_metadata(Path::new("/games/other.nsp"), &GameMetadata::default());

        assert!(table.entries()[0].favorite);
        assert_eq!(table.entries()[0].time_played_label(), "1.50 mins");
    }
}
