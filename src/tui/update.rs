//! TEA Update Function
//!
//! ```text
//! update : Msg -> Model -> (Model, Cmd)
//! ```
//!
//! The model only holds cursor and panel state. Changes to the filter
//! selection and reloads are returned as [`Cmd`]s for the runtime to run,
//! which keeps this function free of I/O and easy to test.

use super::msg::{Focus, Msg};
use super::state;

/// Commands that need to be executed by the runtime (imperative shell)
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    None,
    Batch(Vec<Cmd>),
    Quit,
    /// Flip one option of one filter, then recompute
    ToggleOption { filter: usize, option: usize },
    /// Select every option of a filter, then recompute
    SelectAll(usize),
    /// Deselect every option of a filter, then recompute
    ClearFilter(usize),
    /// Restore all filters, then recompute
    ResetFilters,
    /// Re-prepare the dataset if the raw file changed
    Reload,
    SetStatus(String),
}

impl Cmd {
    /// Create a batch of commands
    pub fn batch(cmds: Vec<Cmd>) -> Cmd {
        let mut cmds: Vec<Cmd> = cmds.into_iter().filter(|c| !matches!(c, Cmd::None)).collect();
        match cmds.len() {
            0 => Cmd::None,
            1 => cmds.pop().unwrap_or(Cmd::None),
            _ => Cmd::Batch(cmds),
        }
    }

    pub fn is_quit(&self) -> bool {
        matches!(self, Cmd::Quit)
    }
}

/// Cursor and panel state, mirrored from the app without its data
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub focus: Focus,
    /// Current field in the filter picker
    pub filter_index: usize,
    /// Cursor within the current field's options
    pub option_index: usize,
    /// Option count per field, in picker order
    pub option_counts: Vec<usize>,
    /// First preview row on screen
    pub preview_offset: usize,
    /// Rows available in the preview
    pub preview_rows: usize,
    /// Rows that fit on screen, used as page size
    pub visible_rows: usize,
    pub help_open: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            focus: Focus::Filters,
            filter_index: 0,
            option_index: 0,
            option_counts: Vec::new(),
            preview_offset: 0,
            preview_rows: 0,
            visible_rows: 10,
            help_open: false,
        }
    }
}

impl Model {
    fn option_count(&self) -> usize {
        self.option_counts.get(self.filter_index).copied().unwrap_or(0)
    }

    /// Largest useful preview offset
    fn max_offset(&self) -> usize {
        self.preview_rows.saturating_sub(self.visible_rows)
    }

    fn has_filters(&self) -> bool {
        !self.option_counts.is_empty()
    }
}

/// Process a message and return the new model plus any command
pub fn update(msg: Msg, model: Model) -> (Model, Cmd) {
    match msg {
        // === Lifecycle ===
        Msg::Quit => (model, Cmd::Quit),
        Msg::Tick | Msg::Resize(_, _) | Msg::Noop => (model, Cmd::None),

        // === Navigation ===
        Msg::MoveUp => match model.focus {
            Focus::Filters => (
                Model {
                    option_index: state::move_selection_up(model.option_index),
                    ..model
                },
                Cmd::None,
            ),
            Focus::Preview => (
                Model {
                    preview_offset: state::move_selection_up(model.preview_offset),
                    ..model
                },
                Cmd::None,
            ),
        },

        Msg::MoveDown => match model.focus {
            Focus::Filters => {
                let option_index = state::move_selection_down(model.option_index, model.option_count());
                (Model { option_index, ..model }, Cmd::None)
            }
            Focus::Preview => {
                let preview_offset = state::move_selection_down(model.preview_offset, model.max_offset() + 1);
                (Model { preview_offset, ..model }, Cmd::None)
            }
        },

        Msg::PageUp => match model.focus {
            Focus::Filters => (
                Model {
                    option_index: state::page_up(model.option_index, model.visible_rows),
                    ..model
                },
                Cmd::None,
            ),
            Focus::Preview => (
                Model {
                    preview_offset: state::page_up(model.preview_offset, model.visible_rows),
                    ..model
                },
                Cmd::None,
            ),
        },

        Msg::PageDown => match model.focus {
            Focus::Filters => {
                let option_index = state::page_down(model.option_index, model.visible_rows, model.option_count());
                (Model { option_index, ..model }, Cmd::None)
            }
            Focus::Preview => {
                let preview_offset = state::page_down(model.preview_offset, model.visible_rows, model.max_offset() + 1);
                (Model { preview_offset, ..model }, Cmd::None)
            }
        },

        Msg::JumpToTop => match model.focus {
            Focus::Filters => (Model { option_index: 0, ..model }, Cmd::None),
            Focus::Preview => (Model { preview_offset: 0, ..model }, Cmd::None),
        },

        Msg::JumpToBottom => match model.focus {
            Focus::Filters => {
                let option_index = model.option_count().saturating_sub(1);
                (Model { option_index, ..model }, Cmd::None)
            }
            Focus::Preview => {
                let preview_offset = model.max_offset();
                (Model { preview_offset, ..model }, Cmd::None)
            }
        },

        // === Filter picker ===
        Msg::NextFilter | Msg::PrevFilter => {
            let forward = msg == Msg::NextFilter;
            let filter_index = state::cycle_index(model.filter_index, model.option_counts.len(), forward);
            (
                Model {
                    focus: Focus::Filters,
                    filter_index,
                    option_index: 0,
                    ..model
                },
                Cmd::None,
            )
        }

        Msg::ToggleOption => {
            if model.focus != Focus::Filters || model.option_count() == 0 {
                return (model, Cmd::None);
            }
            let cmd = Cmd::ToggleOption {
                filter: model.filter_index,
                option: model.option_index,
            };
            (model, cmd)
        }

        Msg::SelectAllOptions if model.has_filters() => {
            let cmd = Cmd::SelectAll(model.filter_index);
            (model, cmd)
        }

        Msg::ClearOptions if model.has_filters() => {
            let cmd = Cmd::ClearFilter(model.filter_index);
            (model, cmd)
        }

        Msg::SelectAllOptions | Msg::ClearOptions => (model, Cmd::None),

        Msg::ResetFilters => (
            Model {
                option_index: 0,
                preview_offset: 0,
                ..model
            },
            Cmd::batch(vec![Cmd::ResetFilters, Cmd::SetStatus("Filters reset".to_string())]),
        ),

        // === Panels ===
        Msg::NextPanel => (
            Model {
                focus: model.focus.next(),
                ..model
            },
            Cmd::None,
        ),
        Msg::PrevPanel => (
            Model {
                focus: model.focus.prev(),
                ..model
            },
            Cmd::None,
        ),

        // === Modals ===
        Msg::ToggleHelp => (
            Model {
                help_open: !model.help_open,
                ..model
            },
            Cmd::None,
        ),
        Msg::CloseModal => (
            Model {
                help_open: false,
                ..model
            },
            Cmd::None,
        ),

        // === Data ===
        Msg::Reload | Msg::RawChanged => (model, Cmd::Reload),
    }
}
