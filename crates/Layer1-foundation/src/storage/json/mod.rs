mod store;

pub use store::{JsonStore, CONFIG_DIR_NAME};
