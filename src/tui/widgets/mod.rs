pub mod filter_picker;
